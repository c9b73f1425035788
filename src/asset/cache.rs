//! In-memory asset cache validated by modification time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;

struct CachedAsset {
    modified: SystemTime,
    bytes: Arc<[u8]>,
}

/// Asset bytes keyed by resolved path (thread-safe).
///
/// When disabled every read goes straight to disk.
pub struct AssetCache {
    enabled: bool,
    entries: DashMap<PathBuf, CachedAsset>,
}

impl AssetCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Read a file, reusing cached bytes while its mtime is unchanged.
    pub fn read(&self, path: &Path) -> io::Result<Arc<[u8]>> {
        if !self.enabled {
            return fs::read(path).map(Arc::from);
        }

        let modified = fs::metadata(path)?.modified()?;
        if let Some(entry) = self.entries.get(path)
            && entry.modified == modified
        {
            return Ok(Arc::clone(&entry.bytes));
        }

        let bytes: Arc<[u8]> = fs::read(path)?.into();
        self.entries.insert(
            path.to_path_buf(),
            CachedAsset {
                modified,
                bytes: Arc::clone(&bytes),
            },
        );
        Ok(bytes)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_cache_reads_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flow.bpmn");
        fs::write(&path, "one").unwrap();

        let cache = AssetCache::new(false);
        assert_eq!(&*cache.read(&path).unwrap(), b"one");
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cache_revalidates_on_mtime_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flow.bpmn");
        fs::write(&path, "one").unwrap();

        let cache = AssetCache::new(true);
        assert_eq!(&*cache.read(&path).unwrap(), b"one");
        assert_eq!(cache.len(), 1);

        fs::write(&path, "two").unwrap();
        let later = SystemTime::now() + Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert_eq!(&*cache.read(&path).unwrap(), b"two");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_missing_file_errors() {
        let cache = AssetCache::new(true);
        assert!(cache.read(Path::new("/definitely/missing.bpmn")).is_err());
    }
}
