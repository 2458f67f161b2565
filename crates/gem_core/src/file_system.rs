//! File modification dates
//!
//! Both the config caches and export planning decide freshness by comparing
//! modification times. A missing file has no date and is older than any
//! existing file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Modification time of a file, `None` if it does not exist or the platform
/// cannot report it.
pub fn file_date(path: impl AsRef<Path>) -> Option<SystemTime> {
    std::fs::metadata(path.as_ref())
        .and_then(|m| m.modified())
        .ok()
}

/// True when `a` is strictly newer than `b`. `None` is the oldest date.
pub fn is_newer(a: Option<SystemTime>, b: Option<SystemTime>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Absolute form of `path`, joined onto the working directory when relative.
/// The path is not required to exist and is not canonicalized.
pub fn absolute_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Source of file dates. Lets planners run against something other than the
/// real file system.
pub trait FileClock: Send + Sync {
    /// Modification time of `path`, if it exists
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}

/// File clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileClock;

impl FileClock for OsFileClock {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        file_date(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_file_has_no_date() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_date(dir.path().join("missing.ini")).is_none());
    }

    #[test]
    fn test_existing_file_has_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("present.ini");
        std::fs::write(&path, "[Configuration]\n").unwrap();
        assert!(file_date(&path).is_some());
        assert!(OsFileClock.modified(&path).is_some());
    }

    #[test]
    fn test_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(absolute_path(dir.path()), dir.path());
        assert!(absolute_path("relative/model.ini").is_absolute());
    }

    #[test]
    fn test_is_newer() {
        let now = SystemTime::now();
        let later = now + Duration::from_secs(5);
        assert!(is_newer(Some(later), Some(now)));
        assert!(!is_newer(Some(now), Some(now)));
        assert!(is_newer(Some(now), None));
        assert!(!is_newer(None, Some(now)));
        assert!(!is_newer(None, None));
    }
}
