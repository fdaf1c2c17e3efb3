//! Time utilities for cache records
//!
//! A cache record encodes its expiry instant in the file's modification
//! time (not the last-write time). These helpers are the only place that
//! reads or writes that field; read and write paths must agree on it.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Current wall-clock time.
pub fn now() -> SystemTime {
    SystemTime::now()
}

/// Read the expiry instant of a record file.
pub fn expiry_of(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Write the expiry instant of a record file.
pub fn set_expiry(path: &Path, expires_at: SystemTime) -> io::Result<()> {
    let file = File::options().write(true).open(path)?;
    file.set_modified(expires_at)
}

/// A record file is fresh iff it exists and its expiry lies in the future.
pub fn is_fresh(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => {
            meta.is_file()
                && meta
                    .modified()
                    .map(|expiry| expiry > SystemTime::now())
                    .unwrap_or(false)
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_set_expiry_roundtrip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("record");
        fs::write(&path, "a\nb").unwrap();

        let expires = now() + Duration::from_secs(600);
        set_expiry(&path, expires).unwrap();

        let read_back = expiry_of(&path).unwrap();
        let delta = read_back
            .duration_since(expires)
            .unwrap_or_else(|e| e.duration());
        assert!(delta < Duration::from_secs(1));
    }

    #[test]
    fn test_is_fresh_future_expiry() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("record");
        fs::write(&path, "a").unwrap();
        set_expiry(&path, now() + Duration::from_secs(60)).unwrap();
        assert!(is_fresh(&path));
    }

    #[test]
    fn test_is_fresh_past_expiry() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("record");
        fs::write(&path, "a").unwrap();
        set_expiry(&path, now() - Duration::from_secs(1)).unwrap();
        assert!(!is_fresh(&path));
    }

    #[test]
    fn test_is_fresh_missing_file() {
        let temp = tempdir().unwrap();
        assert!(!is_fresh(&temp.path().join("nope")));
    }

    #[test]
    fn test_is_fresh_directory() {
        let temp = tempdir().unwrap();
        assert!(!is_fresh(temp.path()));
    }
}
