use crate::codec::RecordCodec;
use crate::collection::{validate_collection_name, CollectionOperations, DocketCollection, Record};
use crate::docket_builder::DocketBuilder;
use crate::docket_config::DocketConfig;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::filter::Filter;
use crate::metadata::{load_or_init, DocketMetadata};
use crate::store::DocketStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An embedded document database.
///
/// # Purpose
/// `Docket` groups schemaless records into named collections stored on a
/// transactional key-value substrate. Records get sequential ids on insert
/// and are retrieved and patched through equality filters.
///
/// # Characteristics
/// - **Explicit configuration**: name, extension and codec are fixed at open
///   time through [DocketBuilder]
/// - **One transaction per operation**: every insert, find and update either
///   commits completely or leaves no trace
/// - **Thread-safe**: clones share the same database; the substrate
///   serializes writers
///
/// # Usage
/// ```text
/// let db = Docket::builder()
///     .name("webbr")
///     .extension("db")
///     .codec(CodecKind::TypedField)
///     .open_or_create()?;
///
/// let id = db.insert("users", record! { "name": "Foo", "age": 10 })?;
/// let users = db.find("users", &all())?;
/// db.update("users", &Filter::new().eq("name", "Foo"), &record! { "age": 11 })?;
/// db.close()?;
/// ```
///
/// Dropping the last clone closes the store.
#[derive(Clone)]
pub struct Docket {
    inner: Arc<DocketInner>,
}

impl Docket {
    pub fn builder() -> DocketBuilder {
        DocketBuilder::new()
    }

    pub(crate) fn open(config: DocketConfig, store: DocketStore) -> DocketResult<Docket> {
        store.open_or_create(&config)?;

        let metadata = match load_or_init(&store, &config) {
            Ok(metadata) => metadata,
            Err(err) => {
                if let Err(close_err) = store.close() {
                    log::warn!("Failed to close store after open failure: {}", close_err);
                }
                return Err(err);
            }
        };

        let operations =
            CollectionOperations::new(store.clone(), RecordCodec::for_kind(config.codec()));
        log::debug!(
            "Opened {} with codec {} on {}",
            config.file_name(),
            config.codec(),
            metadata.store_version
        );

        Ok(Docket {
            inner: Arc::new(DocketInner {
                config,
                store,
                operations,
                metadata,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Returns a handle to the collection `name`. The collection itself is
    /// created lazily by the first insert.
    pub fn collection(&self, name: &str) -> DocketResult<DocketCollection> {
        validate_collection_name(name)?;
        self.inner.check_opened()?;
        Ok(DocketCollection::new(name, self.inner.operations.clone()))
    }

    /// Inserts `record` into `collection` and returns its assigned id.
    pub fn insert(&self, collection: &str, record: Record) -> DocketResult<u64> {
        self.inner.check_opened()?;
        self.inner.operations.insert(collection, record)
    }

    /// Returns the records of `collection` matching `filter`.
    ///
    /// Fails with [ErrorKind::CollectionNotFound] if the collection does not
    /// exist.
    pub fn find(&self, collection: &str, filter: &Filter) -> DocketResult<Vec<Record>> {
        self.inner.check_opened()?;
        self.inner.operations.find(collection, filter)
    }

    /// Patches the records of `collection` matching `filter` and returns
    /// them.
    ///
    /// Fails with [ErrorKind::CollectionNotFound] if the collection does not
    /// exist.
    pub fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Record,
    ) -> DocketResult<Vec<Record>> {
        self.inner.check_opened()?;
        self.inner.operations.update(collection, filter, patch)
    }

    pub fn create_collection(&self, name: &str) -> DocketResult<()> {
        self.inner.check_opened()?;
        self.inner.operations.create_collection(name)
    }

    pub fn has_collection(&self, name: &str) -> DocketResult<bool> {
        self.inner.check_opened()?;
        self.inner.operations.has_collection(name)
    }

    pub fn list_collection_names(&self) -> DocketResult<Vec<String>> {
        self.inner.check_opened()?;
        self.inner.operations.list_collection_names()
    }

    pub fn config(&self) -> DocketConfig {
        self.inner.config.clone()
    }

    pub fn metadata(&self) -> DocketMetadata {
        self.inner.metadata.clone()
    }

    pub fn store(&self) -> DocketStore {
        self.inner.store.clone()
    }

    /// Flushes committed state of the substrate to durable media.
    pub fn commit(&self) -> DocketResult<()> {
        self.inner.check_opened()?;
        self.inner.store.commit()
    }

    /// Closes the database. Closing twice is a no-op.
    pub fn close(&self) -> DocketResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> DocketResult<bool> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Ok(true);
        }
        self.inner.store.is_closed()
    }
}

struct DocketInner {
    config: DocketConfig,
    store: DocketStore,
    operations: CollectionOperations,
    metadata: DocketMetadata,
    closed: AtomicBool,
}

impl DocketInner {
    fn check_opened(&self) -> DocketResult<()> {
        if self.closed.load(Ordering::Acquire) || self.store.is_closed()? {
            log::error!("Docket database {} is closed", self.config.file_name());
            return Err(DocketError::new(
                "Docket database is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    fn close(&self) -> DocketResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(err) = self.store.commit().and_then(|_| self.store.close()) {
            // the store is still open, keep the database usable
            self.closed.store(false, Ordering::Release);
            return Err(err);
        }
        log::debug!("Closed {}", self.config.file_name());
        Ok(())
    }
}

impl Drop for DocketInner {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("Failed to close {}: {}", self.config.file_name(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecKind;
    use crate::filter::all;
    use crate::record;
    use crate::store::memory::InMemoryModule;
    use crate::store::StoreModule;

    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    fn open(codec: CodecKind) -> Docket {
        Docket::builder()
            .name("webbr")
            .extension("db")
            .codec(codec)
            .open_or_create()
            .unwrap()
    }

    #[test]
    fn test_insert_find_update() {
        for codec in [CodecKind::WholeRecord, CodecKind::TypedField] {
            let db = open(codec);
            assert_eq!(db.insert("users", record! { "name": "Foo", "age": 10 }).unwrap(), 1);
            assert_eq!(db.insert("users", record! { "name": "Bar", "age": 88.3 }).unwrap(), 2);

            let found = db.find("users", &Filter::new().eq("age", 88.3)).unwrap();
            assert_eq!(found, vec![record! { "id": 2, "name": "Bar", "age": 88.3 }]);

            let updated = db
                .update("users", &Filter::new().eq("name", "Foo"), &record! { "age": 11 })
                .unwrap();
            assert_eq!(updated, vec![record! { "id": 1, "name": "Foo", "age": 11 }]);
        }
    }

    #[test]
    fn test_collection_handle() {
        let db = open(CodecKind::TypedField);
        let users = db.collection("users").unwrap();
        users.insert(record! { "name": "Foo" }).unwrap();
        assert_eq!(db.find("users", &all()).unwrap().len(), 1);
        assert!(db.has_collection("users").unwrap());
    }

    #[test]
    fn test_collection_name_validation() {
        let db = open(CodecKind::WholeRecord);
        assert_eq!(db.collection("").err().unwrap().kind(), &ErrorKind::ValidationError);
        assert_eq!(
            db.collection("$docket_meta").err().unwrap().kind(),
            &ErrorKind::ValidationError
        );
    }

    #[test]
    fn test_registry() {
        let db = open(CodecKind::WholeRecord);
        assert!(db.list_collection_names().unwrap().is_empty());
        db.create_collection("users").unwrap();
        db.insert("auth", record! { "token": "abc" }).unwrap();
        assert_eq!(
            db.list_collection_names().unwrap(),
            vec!["auth".to_string(), "users".to_string()]
        );
        assert!(!db.has_collection("orders").unwrap());
    }

    #[test]
    fn test_metadata() {
        let db = open(CodecKind::TypedField);
        let metadata = db.metadata();
        assert_eq!(metadata.codec, CodecKind::TypedField);
        assert_eq!(metadata.docket_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_close_is_idempotent_and_final() {
        let db = open(CodecKind::WholeRecord);
        db.insert("users", record! { "name": "Foo" }).unwrap();
        assert!(!db.is_closed().unwrap());
        db.close().unwrap();
        db.close().unwrap();
        assert!(db.is_closed().unwrap());

        let err = db.find("users", &all()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
        let err = db.insert("users", record! { "name": "Bar" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
        assert!(db.collection("users").is_err());
    }

    #[test]
    fn test_drop_closes_store() {
        let db = open(CodecKind::WholeRecord);
        let store = db.store();
        let clone = db.clone();
        drop(db);
        assert!(!store.is_closed().unwrap());
        drop(clone);
        assert!(store.is_closed().unwrap());
    }

    #[test]
    fn test_codec_mismatch_on_shared_store() {
        let shared = InMemoryModule::new().get_store().unwrap();
        let typed = DocketConfig::new("webbr", "db", CodecKind::TypedField).unwrap();
        let db = Docket::open(typed, shared.clone()).unwrap();
        db.insert("users", record! { "name": "Foo" }).unwrap();

        let whole = DocketConfig::new("webbr", "db", CodecKind::WholeRecord).unwrap();
        let err = Docket::open(whole, shared).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_unsupported_value_from_json() {
        let db = open(CodecKind::WholeRecord);
        let rec = Record::from_json(serde_json::json!({"data": [1, 2, 3]})).unwrap();
        let err = db.insert("users", rec).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
        assert!(err.message().contains("array"));
        // the collection was never created
        assert!(!db.has_collection("users").unwrap());
        assert_eq!(db.find("users", &all()).unwrap_err().kind(), &ErrorKind::CollectionNotFound);
    }
}
