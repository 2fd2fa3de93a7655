use crate::errors::DocketResult;
use crate::store::DocketStore;

/// Supplies the substrate a database runs on.
pub trait StoreModule {
    fn get_store(&self) -> DocketResult<DocketStore>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DocketError, ErrorKind};
    use crate::store::memory::InMemoryStore;

    struct MockStoreModule {
        store: Option<DocketStore>,
    }

    impl StoreModule for MockStoreModule {
        fn get_store(&self) -> DocketResult<DocketStore> {
            match &self.store {
                Some(store) => Ok(store.clone()),
                None => Err(DocketError::new("Store is closed", ErrorKind::IOError)),
            }
        }
    }

    #[test]
    fn test_get_store_positive() {
        let store = DocketStore::new(InMemoryStore::new());
        let module = MockStoreModule {
            store: Some(store),
        };
        assert!(module.get_store().is_ok());
    }

    #[test]
    fn test_get_store_negative() {
        let module = MockStoreModule { store: None };
        assert!(module.get_store().is_err());
    }
}
