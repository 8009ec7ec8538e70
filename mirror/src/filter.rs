//! Glob-based path exclusion using globset

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{Result, SyncError};

/// Ordered set of glob patterns excluding matching relative paths.
///
/// Patterns use shell-glob semantics: `*` matches any run of characters,
/// including `/`. A path is excluded as soon as any pattern matches.
#[derive(Debug)]
pub struct IgnoreFilter {
    set: GlobSet,
    patterns: Vec<String>,
}

impl IgnoreFilter {
    pub fn new(patterns: Vec<String>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                SyncError::FilterPattern(format!("failed to compile glob '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }

        let set = builder
            .build()
            .map_err(|e| SyncError::FilterPattern(format!("failed to build globset: {}", e)))?;

        Ok(Self { set, patterns })
    }

    /// True when any pattern matches the relative path
    pub fn is_ignored(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
