use crate::config::FjallConfig;
use crate::store::FjallStore;
use docket::errors::DocketResult;
use docket::store::{DocketStore, StoreModule};
use std::path::PathBuf;

/// Store module providing the fjall substrate.
///
/// # Examples
///
/// ```rust,ignore
/// let db = Docket::builder()
///     .name("webbr")
///     .extension("db")
///     .codec(CodecKind::TypedField)
///     .load_module(FjallModule::with_config().db_dir("/var/lib/webbr").build())
///     .open_or_create()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FjallModule {
    store_config: FjallConfig,
}

impl FjallModule {
    #[inline]
    pub fn new() -> FjallModule {
        FjallModule::default()
    }

    #[inline]
    pub fn with_config() -> FjallModuleBuilder {
        FjallModuleBuilder::new()
    }

    pub fn config(&self) -> &FjallConfig {
        &self.store_config
    }
}

impl StoreModule for FjallModule {
    fn get_store(&self) -> DocketResult<DocketStore> {
        let store = FjallStore::new(self.store_config.clone());
        Ok(DocketStore::new(store))
    }
}

#[derive(Debug, Default)]
pub struct FjallModuleBuilder {
    store_config: FjallConfig,
}

impl FjallModuleBuilder {
    #[inline]
    pub fn new() -> FjallModuleBuilder {
        FjallModuleBuilder::default()
    }

    #[inline]
    pub fn low_memory_preset(self) -> Self {
        self.cache_size(8 * 1024 * 1024)
            .max_write_buffer_size(16 * 1024 * 1024)
            .flush_workers(1)
            .compaction_workers(1)
    }

    #[inline]
    pub fn db_dir(mut self, db_dir: impl Into<PathBuf>) -> Self {
        self.store_config.set_db_dir(db_dir.into());
        self
    }

    #[inline]
    pub fn sync_on_commit(mut self, sync_on_commit: bool) -> Self {
        self.store_config.set_sync_on_commit(sync_on_commit);
        self
    }

    #[inline]
    pub fn cache_size(mut self, cache_size: u64) -> Self {
        self.store_config.set_cache_size(cache_size);
        self
    }

    #[inline]
    pub fn max_write_buffer_size(mut self, size: u64) -> Self {
        self.store_config.set_max_write_buffer_size(size);
        self
    }

    #[inline]
    pub fn flush_workers(mut self, count: usize) -> Self {
        self.store_config.set_flush_workers(count);
        self
    }

    #[inline]
    pub fn compaction_workers(mut self, count: usize) -> Self {
        self.store_config.set_compaction_workers(count);
        self
    }

    pub fn build(self) -> FjallModule {
        FjallModule {
            store_config: self.store_config,
        }
    }
}
