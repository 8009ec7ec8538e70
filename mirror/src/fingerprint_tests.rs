//! Property tests for the snapshot fingerprint

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::entry::{FileEntry, Snapshot};
use crate::fingerprint;

/// Randomized snapshots: unique paths mapped to (size, mtime) pairs
fn arb_tree() -> impl Strategy<Value = BTreeMap<String, (u64, i64)>> {
    prop::collection::btree_map(
        "/[a-z]{1,12}(/[a-z]{1,12}){0,3}",
        (0u64..10_000_000, 0i64..2_000_000_000),
        0..32,
    )
}

fn to_snapshot(tree: &BTreeMap<String, (u64, i64)>) -> Snapshot {
    tree.iter()
        .map(|(path, &(size, epoch))| {
            (
                path.clone(),
                FileEntry::new(path.clone(), size, Utc.timestamp_opt(epoch, 0).unwrap(), false),
            )
        })
        .collect()
}

proptest! {
    /// The fingerprint is a function of the entry set, not of fold order
    #[test]
    fn fingerprint_is_order_independent(tree in arb_tree(), seed in any::<u64>()) {
        let snapshot = to_snapshot(&tree);
        let baseline = fingerprint::compute(&snapshot);

        // Fold the entry hashes in a seed-shuffled order by hand; the result
        // must match the snapshot-order fold
        let mut entries: Vec<&FileEntry> = snapshot.values().collect();
        let len = entries.len();
        if len > 1 {
            for i in 0..len {
                let j = (seed as usize).wrapping_mul(31).wrapping_add(i * 7) % len;
                entries.swap(i, j);
            }
        }
        let folded = entries
            .iter()
            .copied()
            .fold(0u64, |acc, entry| acc ^ fingerprint::entry_hash(entry));
        let reordered = format!("{}_{}", len, folded);

        prop_assert_eq!(baseline, reordered);
    }

    /// Changing one entry's size changes the fingerprint
    #[test]
    fn size_change_is_detected(tree in arb_tree(), delta in 1u64..1000) {
        prop_assume!(!tree.is_empty());
        let before = fingerprint::compute(&to_snapshot(&tree));

        let mut changed = tree.clone();
        if let Some((_, value)) = changed.iter_mut().next() {
            value.0 += delta;
        }
        let after = fingerprint::compute(&to_snapshot(&changed));

        prop_assert_ne!(before, after);
    }

    /// Changing one entry's mtime changes the fingerprint
    #[test]
    fn mtime_change_is_detected(tree in arb_tree(), delta in 1i64..100_000) {
        prop_assume!(!tree.is_empty());
        let before = fingerprint::compute(&to_snapshot(&tree));

        let mut changed = tree.clone();
        if let Some((_, value)) = changed.iter_mut().next() {
            value.1 += delta;
        }
        let after = fingerprint::compute(&to_snapshot(&changed));

        prop_assert_ne!(before, after);
    }

    /// Removing an entry changes the fingerprint
    #[test]
    fn removed_entry_is_detected(tree in arb_tree()) {
        prop_assume!(!tree.is_empty());
        let before = fingerprint::compute(&to_snapshot(&tree));

        let mut shrunk = tree.clone();
        let first = shrunk.keys().next().cloned().unwrap();
        shrunk.remove(&first);
        let after = fingerprint::compute(&to_snapshot(&shrunk));

        prop_assert_ne!(before, after);
    }

    /// The rendered form is always `count_value`
    #[test]
    fn fingerprint_shape(tree in arb_tree()) {
        let snapshot = to_snapshot(&tree);
        let rendered = fingerprint::compute(&snapshot);

        let (count, value) = rendered.split_once('_').expect("missing separator");
        prop_assert_eq!(count.parse::<usize>().unwrap(), snapshot.len());
        value.parse::<u64>().unwrap();
    }
}
