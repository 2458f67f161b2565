//! Virtual file systems
//!
//! Config files can be served from somewhere other than the OS file system
//! (packed archives, test fixtures). [`VfsConfigCache`](crate::VfsConfigCache)
//! reads through this trait.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use gem_core::FileClock;
use parking_lot::RwLock;

/// Read-only file access with modification dates
pub trait VirtualFileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Modification date, `None` when the file does not exist
    fn modified(&self, path: &Path) -> Option<SystemTime>;

    fn exists(&self, path: &Path) -> bool {
        self.modified(path).is_some()
    }
}

/// The operating system's file system
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl VirtualFileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        gem_core::file_date(path)
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: String,
    modified: SystemTime,
}

/// In-memory file system.
///
/// Every write advances a logical clock by one second, so a rewritten file
/// is always strictly newer than before regardless of wall-clock resolution.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<HashMap<PathBuf, MemoryFile>>,
    ticks: AtomicU64,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> SystemTime {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(tick)
    }

    /// Create or replace a file
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        let modified = self.tick();
        self.files.write().insert(
            path.into(),
            MemoryFile {
                contents: contents.into(),
                modified,
            },
        );
    }

    /// Bump a file's modification date without changing it
    pub fn touch(&self, path: impl AsRef<Path>) -> bool {
        let modified = self.tick();
        match self.files.write().get_mut(path.as_ref()) {
            Some(file) => {
                file.modified = modified;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files.write().remove(path.as_ref()).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .get(path)
            .map(|f| f.contents.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.files.read().get(path).map(|f| f.modified)
    }
}

impl FileClock for MemoryFileSystem {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        VirtualFileSystem::modified(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_read() {
        let fs = MemoryFileSystem::new();
        fs.insert("a.ini", "[S]\n");
        assert_eq!(fs.read_to_string(Path::new("a.ini")).unwrap(), "[S]\n");
        assert!(fs.exists(Path::new("a.ini")));
        assert_eq!(
            fs.read_to_string(Path::new("b.ini")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_touch_advances_date() {
        let fs = MemoryFileSystem::new();
        fs.insert("a.ini", "");
        let before = VirtualFileSystem::modified(&fs, Path::new("a.ini"));
        assert!(fs.touch("a.ini"));
        let after = VirtualFileSystem::modified(&fs, Path::new("a.ini"));
        assert!(gem_core::is_newer(after, before));
        assert!(!fs.touch("missing.ini"));
    }

    #[test]
    fn test_remove() {
        let fs = MemoryFileSystem::new();
        fs.insert("a.ini", "");
        assert!(fs.remove("a.ini"));
        assert!(fs.is_empty());
    }
}
