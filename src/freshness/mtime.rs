//! Modification times.
//!
//! Snapshots record mtimes as nanoseconds since the Unix epoch so they
//! survive serialization without losing the precision the filesystem
//! reports.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Nanoseconds since the Unix epoch. Pre-epoch times clamp to zero.
pub fn to_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Inverse of [`to_nanos`].
pub fn from_nanos(nanos: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(nanos)
}

/// Round a time down to what [`to_nanos`] can represent, so a snapshot
/// compares identically before and after a record round-trip.
pub fn truncate(time: SystemTime) -> SystemTime {
    from_nanos(to_nanos(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_get_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.js");
        assert!(get_mtime(&path).is_none());

        fs::write(&path, "x").unwrap();
        assert!(get_mtime(&path).is_some());
    }

    #[test]
    fn test_nanos_roundtrip() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        assert_eq!(from_nanos(to_nanos(time)), time);
        assert_eq!(truncate(time), time);
    }

    #[test]
    fn test_pre_epoch_clamps() {
        let before = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(to_nanos(before), 0);
    }
}
