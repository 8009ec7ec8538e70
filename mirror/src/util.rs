//! Formatting helpers for the run narrative

use std::time::Duration;

/// Render a byte count as a short human-readable size
pub fn human_readable_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = size as f64;
    let mut unit = UNITS[0];
    for candidate in UNITS {
        unit = candidate;
        if value < 1024.0 {
            break;
        }
        if candidate != UNITS[UNITS.len() - 1] {
            value /= 1024.0;
        }
    }

    format!("{:.1}{}", value, unit)
}

/// Render an elapsed duration in seconds, switching to minutes past one
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs > 60.0 {
        format!("{:.1} min", secs / 60.0)
    } else {
        format!("{:.1} sec", secs)
    }
}
