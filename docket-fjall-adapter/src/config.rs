use fjall::Config;
use std::path::{Path, PathBuf};

const DEFAULT_CACHE_SIZE: u64 = 32 * 1024 * 1024;
const DEFAULT_MAX_WRITE_BUFFER_SIZE: u64 = 64 * 1024 * 1024;

/// Configuration of the fjall substrate.
///
/// The database lives in the directory `<db_dir>/<name>.<extension>`, where
/// name and extension come from the database configuration. Build it through
/// [crate::FjallModule::with_config].
#[derive(Debug, Clone, PartialEq)]
pub struct FjallConfig {
    db_dir: PathBuf,
    sync_on_commit: bool,
    cache_size: u64,
    max_write_buffer_size: u64,
    flush_workers: usize,
    compaction_workers: usize,
}

impl Default for FjallConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        FjallConfig {
            db_dir: PathBuf::from("."),
            sync_on_commit: true,
            cache_size: DEFAULT_CACHE_SIZE,
            max_write_buffer_size: DEFAULT_MAX_WRITE_BUFFER_SIZE,
            flush_workers: cpus.min(4),
            compaction_workers: (cpus / 2).clamp(1, 4),
        }
    }
}

impl FjallConfig {
    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig::default()
    }

    #[inline]
    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    /// Whether every commit syncs the journal to disk before returning.
    #[inline]
    pub fn sync_on_commit(&self) -> bool {
        self.sync_on_commit
    }

    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    #[inline]
    pub fn max_write_buffer_size(&self) -> u64 {
        self.max_write_buffer_size
    }

    #[inline]
    pub fn flush_workers(&self) -> usize {
        self.flush_workers
    }

    #[inline]
    pub fn compaction_workers(&self) -> usize {
        self.compaction_workers
    }

    /// Directory holding the keyspace of the database file `file_name`.
    #[inline]
    pub fn db_path(&self, file_name: &str) -> PathBuf {
        self.db_dir.join(file_name)
    }

    pub(crate) fn keyspace_config(&self, path: &Path) -> Config {
        Config::new(path)
            .cache_size(self.cache_size)
            .max_write_buffer_size(self.max_write_buffer_size)
            .flush_workers(self.flush_workers)
            .compaction_workers(self.compaction_workers)
    }

    pub(crate) fn set_db_dir(&mut self, db_dir: PathBuf) {
        self.db_dir = db_dir;
    }

    pub(crate) fn set_sync_on_commit(&mut self, sync_on_commit: bool) {
        self.sync_on_commit = sync_on_commit;
    }

    pub(crate) fn set_cache_size(&mut self, cache_size: u64) {
        self.cache_size = cache_size;
    }

    pub(crate) fn set_max_write_buffer_size(&mut self, size: u64) {
        self.max_write_buffer_size = size;
    }

    pub(crate) fn set_flush_workers(&mut self, count: usize) {
        self.flush_workers = count.max(1);
    }

    pub(crate) fn set_compaction_workers(&mut self, count: usize) {
        self.compaction_workers = count.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FjallConfig::new();
        assert_eq!(config.db_dir(), Path::new("."));
        assert!(config.sync_on_commit());
        assert_eq!(config.cache_size(), DEFAULT_CACHE_SIZE);
        assert!(config.flush_workers() >= 1);
        assert!(config.compaction_workers() >= 1);
    }

    #[test]
    fn test_db_path() {
        let mut config = FjallConfig::new();
        config.set_db_dir(PathBuf::from("/var/lib/webbr"));
        assert_eq!(config.db_path("webbr.db"), PathBuf::from("/var/lib/webbr/webbr.db"));
    }

    #[test]
    fn test_workers_never_zero() {
        let mut config = FjallConfig::new();
        config.set_flush_workers(0);
        config.set_compaction_workers(0);
        assert_eq!(config.flush_workers(), 1);
        assert_eq!(config.compaction_workers(), 1);
    }
}
