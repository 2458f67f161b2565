//! Config file caches
//!
//! A cache hands out parsed [`IniDocument`]s keyed by path and re-reads a
//! file only when its modification date moves past the date recorded at the
//! last parse. Each cache holds a single lock around the check-and-populate
//! path, so concurrent readers never observe a half-replaced entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use gem_core::{absolute_path, file_date, is_newer, Settings};
use parking_lot::Mutex;

use crate::error::{ConfigError, Result};
use crate::ini::IniDocument;
use crate::vfs::VirtualFileSystem;

/// A read-through cache of parsed config files
pub trait ConfigCache: Send + Sync {
    /// Parsed contents of `path`
    fn read(&self, path: &Path) -> Result<Arc<IniDocument>>;

    /// Number of times a source file was read and parsed
    fn read_count(&self) -> usize;

    /// Drop the entry for `path`
    fn invalidate(&self, path: &Path);

    /// Drop every entry
    fn clear(&self);
}

/// Build the default cache for the given settings
pub fn default_cache(settings: &Settings) -> Arc<dyn ConfigCache> {
    Arc::new(OsConfigCache::new(settings.use_dat_cache))
}

struct CacheEntry {
    document: Arc<IniDocument>,
    source_date: Option<SystemTime>,
}

type Entries = Mutex<HashMap<PathBuf, CacheEntry>>;

/// Parse text, logging every skipped line
fn parse_document(path: &Path, text: &str) -> IniDocument {
    let (document, issues) = IniDocument::parse(text);
    for issue in issues {
        let error = ConfigError::Parse {
            path: path.to_path_buf(),
            line: issue.line,
            message: issue.message,
        };
        log::warn!("{}", error);
    }
    document
}

/// Return the cached document unless the source moved on; otherwise run
/// `load` (told whether the cache was cold) and store its result.
///
/// A source that has disappeared is never newer than its entry, so a
/// deleted file keeps serving its last parse until invalidated.
fn read_through(
    entries: &Entries,
    key: PathBuf,
    source_date: Option<SystemTime>,
    load: impl FnOnce(bool) -> Result<IniDocument>,
) -> Result<Arc<IniDocument>> {
    let mut entries = entries.lock();

    let cold = match entries.get(&key) {
        Some(entry) if !is_newer(source_date, entry.source_date) => {
            return Ok(Arc::clone(&entry.document));
        }
        Some(_) => {
            log::debug!("{} changed on disk; re-reading", key.display());
            false
        }
        None => true,
    };

    let document = Arc::new(load(cold)?);
    entries.insert(
        key,
        CacheEntry {
            document: Arc::clone(&document),
            source_date,
        },
    );
    Ok(document)
}

/// Cache over the OS file system, keyed by absolute path.
///
/// With `use_dat_cache` every parse is also written as a `bincode` blob next
/// to the source (`model.ini` -> `model.dat`), and a cold cache reads the
/// blob instead of the source when the blob is newer.
pub struct OsConfigCache {
    entries: Entries,
    use_dat_cache: bool,
    reads: AtomicUsize,
}

impl OsConfigCache {
    pub fn new(use_dat_cache: bool) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            use_dat_cache,
            reads: AtomicUsize::new(0),
        }
    }

    /// Blob file name for a config path
    pub fn cache_filename(path: &Path) -> PathBuf {
        path.with_extension("dat")
    }

    fn read_source(&self, path: &Path) -> Result<IniDocument> {
        log::info!("Reading config: {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(parse_document(path, &text))
    }

    fn read_blob(&self, path: &Path) -> Result<IniDocument> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        bincode::deserialize(&bytes).map_err(|e| ConfigError::Cache {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn write_blob(&self, path: &Path, document: &IniDocument) {
        let result = bincode::serialize(document)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(path, bytes).map_err(|e| e.to_string()));

        if let Err(message) = result {
            log::warn!("{}", ConfigError::Cache { path: path.to_path_buf(), message });
        }
    }

    fn load(&self, path: &Path, source_date: Option<SystemTime>, cold: bool) -> Result<IniDocument> {
        if !self.use_dat_cache {
            return self.read_source(path);
        }

        let blob = Self::cache_filename(path);
        if cold && is_newer(file_date(&blob), source_date) {
            match self.read_blob(&blob) {
                Ok(document) => {
                    log::debug!("Using cached blob {}", blob.display());
                    return Ok(document);
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        let document = self.read_source(path)?;
        self.write_blob(&blob, &document);
        Ok(document)
    }
}

impl Default for OsConfigCache {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConfigCache for OsConfigCache {
    fn read(&self, path: &Path) -> Result<Arc<IniDocument>> {
        let key = absolute_path(path);
        let source_date = file_date(&key);
        read_through(&self.entries, key.clone(), source_date, |cold| {
            self.load(&key, source_date, cold)
        })
    }

    fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn invalidate(&self, path: &Path) {
        self.entries.lock().remove(&absolute_path(path));
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Cache that parses each file once and never checks for changes
#[derive(Default)]
pub struct RawConfigCache {
    entries: Mutex<HashMap<PathBuf, Arc<IniDocument>>>,
    reads: AtomicUsize,
}

impl RawConfigCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigCache for RawConfigCache {
    fn read(&self, path: &Path) -> Result<Arc<IniDocument>> {
        let key = absolute_path(path);
        let mut entries = self.entries.lock();
        if let Some(document) = entries.get(&key) {
            return Ok(Arc::clone(document));
        }

        log::info!("Reading config: {}", key.display());
        let text = std::fs::read_to_string(&key).map_err(|source| ConfigError::Io {
            path: key.clone(),
            source,
        })?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let document = Arc::new(parse_document(&key, &text));
        entries.insert(key, Arc::clone(&document));
        Ok(document)
    }

    fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn invalidate(&self, path: &Path) {
        self.entries.lock().remove(&absolute_path(path));
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Cache reading through a [`VirtualFileSystem`]. Paths are used as given.
pub struct VfsConfigCache {
    fs: Arc<dyn VirtualFileSystem>,
    entries: Entries,
    reads: AtomicUsize,
}

impl VfsConfigCache {
    pub fn new(fs: Arc<dyn VirtualFileSystem>) -> Self {
        Self {
            fs,
            entries: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn file_system(&self) -> &Arc<dyn VirtualFileSystem> {
        &self.fs
    }
}

impl ConfigCache for VfsConfigCache {
    fn read(&self, path: &Path) -> Result<Arc<IniDocument>> {
        let source_date = self.fs.modified(path);
        read_through(&self.entries, path.to_path_buf(), source_date, |_| {
            let text = self.fs.read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            self.reads.fetch_add(1, Ordering::Relaxed);
            Ok(parse_document(path, &text))
        })
    }

    fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn invalidate(&self, path: &Path) {
        self.entries.lock().remove(path);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemoryFileSystem;
    use std::fs::File;
    use std::time::Duration;

    fn touch_forward(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_os_cache_reuses_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ini");
        std::fs::write(&path, "[Configuration]\nspeed: 1\n").unwrap();

        let cache = OsConfigCache::new(false);
        let first = cache.read(&path).unwrap();
        let second = cache.read(&path).unwrap();

        assert_eq!(cache.read_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_os_cache_reparses_touched_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ini");
        std::fs::write(&path, "[Configuration]\nspeed: 1\n").unwrap();

        let cache = OsConfigCache::new(false);
        cache.read(&path).unwrap();

        std::fs::write(&path, "[Configuration]\nspeed: 2\n").unwrap();
        touch_forward(&path, 10);

        let document = cache.read(&path).unwrap();
        assert_eq!(cache.read_count(), 2);
        assert_eq!(document.get("Configuration", "speed"), Some("2"));
    }

    #[test]
    fn test_os_cache_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = OsConfigCache::new(false);
        let result = cache.read(&dir.path().join("missing.ini"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
        assert_eq!(cache.read_count(), 0);
    }

    #[test]
    fn test_os_cache_serves_deleted_file_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ini");
        std::fs::write(&path, "[Configuration]\nspeed: 1\n").unwrap();

        let cache = OsConfigCache::new(false);
        cache.read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let document = cache.read(&path).unwrap();
        assert_eq!(document.get("Configuration", "speed"), Some("1"));
        assert_eq!(cache.read_count(), 1);

        cache.invalidate(&path);
        assert!(matches!(cache.read(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_os_cache_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ini");
        std::fs::write(&path, "[Configuration]\n").unwrap();

        let cache = OsConfigCache::new(false);
        cache.read(&path).unwrap();
        cache.invalidate(&path);
        cache.read(&path).unwrap();
        assert_eq!(cache.read_count(), 2);
    }

    #[test]
    fn test_dat_blob_written_and_used_cold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ini");
        std::fs::write(&path, "[Configuration]\nname: 'Hero'\n").unwrap();

        let writer = OsConfigCache::new(true);
        writer.read(&path).unwrap();
        let blob = OsConfigCache::cache_filename(&path);
        assert!(blob.exists());
        touch_forward(&blob, 10);

        let reader = OsConfigCache::new(true);
        let document = reader.read(&path).unwrap();
        assert_eq!(reader.read_count(), 0);
        assert_eq!(document.get("Configuration", "name"), Some("'Hero'"));
    }

    #[test]
    fn test_stale_dat_blob_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ini");
        std::fs::write(&path, "[Configuration]\nname: 'Old'\n").unwrap();
        OsConfigCache::new(true).read(&path).unwrap();

        std::fs::write(&path, "[Configuration]\nname: 'New'\n").unwrap();
        touch_forward(&path, 10);

        let reader = OsConfigCache::new(true);
        let document = reader.read(&path).unwrap();
        assert_eq!(reader.read_count(), 1);
        assert_eq!(document.get("Configuration", "name"), Some("'New'"));
    }

    #[test]
    fn test_raw_cache_never_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ini");
        std::fs::write(&path, "[Configuration]\nspeed: 1\n").unwrap();

        let cache = RawConfigCache::new();
        cache.read(&path).unwrap();
        std::fs::write(&path, "[Configuration]\nspeed: 2\n").unwrap();
        touch_forward(&path, 10);

        let document = cache.read(&path).unwrap();
        assert_eq!(cache.read_count(), 1);
        assert_eq!(document.get("Configuration", "speed"), Some("1"));
    }

    #[test]
    fn test_vfs_cache_tracks_touch() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("hero.ini", "[Configuration]\nspeed: 1\n");

        let cache = VfsConfigCache::new(fs.clone());
        cache.read(Path::new("hero.ini")).unwrap();
        cache.read(Path::new("hero.ini")).unwrap();
        assert_eq!(cache.read_count(), 1);

        fs.touch("hero.ini");
        cache.read(Path::new("hero.ini")).unwrap();
        assert_eq!(cache.read_count(), 2);
    }

    #[test]
    fn test_concurrent_readers_share_one_parse() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.insert("hero.ini", "[Configuration]\nspeed: 1\n");
        let cache = Arc::new(VfsConfigCache::new(fs));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.read(Path::new("hero.ini")).unwrap())
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.read_count(), 1);
    }
}
