//! Crash point injection for durability testing
//!
//! When `FLASHTABLE_CRASH_POINT` names a point that execution reaches, the
//! process terminates via `std::process::abort()`. There is no cleanup and
//! no unwinding. This simulates power loss at that step.
//!
//! ```bash
//! FLASHTABLE_CRASH_POINT=rebuild_before_swap flashtable insert t 0 00ff
//! ```

use std::sync::OnceLock;

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn configured_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var("FLASHTABLE_CRASH_POINT").ok())
        .as_deref()
}

/// Returns true if `FLASHTABLE_CRASH_POINT` equals `name`.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    configured_point().map(|p| p == name).unwrap_or(false)
}

/// Aborts the process if the named crash point is enabled.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    pub const HEADER_BEFORE_WRITE: &str = "header_before_write";
    pub const RECORD_AFTER_WRITE: &str = "record_after_write";

    // Rebuild
    pub const REBUILD_AFTER_COPY: &str = "rebuild_after_copy";
    pub const REBUILD_BEFORE_SWAP: &str = "rebuild_before_swap";
    pub const REBUILD_AFTER_SWAP: &str = "rebuild_after_swap";

    pub fn all() -> &'static [&'static str] {
        &[
            HEADER_BEFORE_WRITE,
            RECORD_AFTER_WRITE,
            REBUILD_AFTER_COPY,
            REBUILD_BEFORE_SWAP,
            REBUILD_AFTER_SWAP,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crash_point_disabled_by_default() {
        assert!(!crash_point_enabled("test_point"));
    }

    #[test]
    fn test_crash_point_names_are_lowercase_with_underscores() {
        for point in points::all() {
            assert!(
                point.chars().all(|c| c.is_lowercase() || c == '_'),
                "Crash point '{}' should be lowercase with underscores",
                point
            );
        }
    }
}
