use crate::errors::DocketResult;
use crate::store::memory::InMemoryStore;
use crate::store::{DocketStore, StoreModule};

/// Store module for the in-memory substrate.
///
/// This is the module a database uses when no other store module is loaded.
/// Every call to [StoreModule::get_store] returns a fresh, empty store.
#[derive(Default)]
pub struct InMemoryModule;

impl InMemoryModule {
    pub fn new() -> InMemoryModule {
        InMemoryModule
    }
}

impl StoreModule for InMemoryModule {
    fn get_store(&self) -> DocketResult<DocketStore> {
        Ok(DocketStore::new(InMemoryStore::new()))
    }
}
