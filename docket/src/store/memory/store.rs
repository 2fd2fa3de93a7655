use crate::docket_config::DocketConfig;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::{
    DocketStoreProvider, EntryVisitor, KeySpace, Transaction, TransactionProvider, WriterGate,
    WriterPermit,
};
use im::OrdMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type KeyValues = OrdMap<Vec<u8>, Vec<u8>>;

#[derive(Clone, Default)]
struct BucketState {
    sequence: u64,
    records: KeyValues,
    fields: KeyValues,
}

impl BucketState {
    fn space(&self, space: KeySpace) -> &KeyValues {
        match space {
            KeySpace::Records => &self.records,
            KeySpace::Fields => &self.fields,
        }
    }

    fn space_mut(&mut self, space: KeySpace) -> &mut KeyValues {
        match space {
            KeySpace::Records => &mut self.records,
            KeySpace::Fields => &mut self.fields,
        }
    }
}

type StoreState = OrdMap<String, BucketState>;

/// In-memory substrate.
///
/// # Purpose
/// `InMemoryStore` implements the full substrate contract without
/// persistence. It is the default store of a database and the substrate the
/// unit tests run on. All data is lost when the store is dropped.
///
/// # Characteristics
/// - Committed state is a persistent ordered map; beginning a transaction
///   snapshots it in O(1).
/// - A writable transaction holds the writer permit for its whole life and
///   publishes its snapshot on commit. Rollback simply drops the snapshot.
/// - Read-only transactions never block, not even on an active writer.
///
/// # Usage
/// ```text
/// let store = DocketStore::new(InMemoryStore::new());
/// store.open_or_create(&config)?;
/// let mut tx = store.begin(true)?;
/// let mut bucket = tx.create_bucket_if_not_exists("users")?;
/// let id = bucket.next_sequence()?;
/// tx.commit()?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }
}

impl DocketStoreProvider for InMemoryStore {
    fn open_or_create(&self, config: &DocketConfig) -> DocketResult<()> {
        self.inner.open_or_create(config)
    }

    fn is_closed(&self) -> DocketResult<bool> {
        Ok(self.inner.closed.load(Ordering::Relaxed))
    }

    fn begin(&self, writable: bool) -> DocketResult<Transaction> {
        self.inner.begin(self.inner.clone(), writable)
    }

    fn commit(&self) -> DocketResult<()> {
        Ok(())
    }

    fn close(&self) -> DocketResult<()> {
        self.inner.closed.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn store_version(&self) -> DocketResult<String> {
        Ok(format!("InMemory/{}", env!("CARGO_PKG_VERSION")))
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    opened: AtomicBool,
    closed: AtomicBool,
    state: RwLock<StoreState>,
    writer: WriterGate,
}

impl InMemoryStoreInner {
    fn open_or_create(&self, config: &DocketConfig) -> DocketResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("In-memory store for {} is already closed", config.file_name());
            return Err(DocketError::new(
                "store is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        self.opened.store(true, Ordering::Relaxed);
        log::debug!("Opened in-memory store for {}", config.file_name());
        Ok(())
    }

    fn begin(&self, this: Arc<InMemoryStoreInner>, writable: bool) -> DocketResult<Transaction> {
        self.check_open()?;

        let permit = if writable {
            let permit = self.writer.acquire();
            // the store may have been closed while waiting for the writer
            self.check_open()?;
            Some(permit)
        } else {
            None
        };

        let snapshot = self.state.read().clone();
        Ok(Transaction::new(InMemoryTransaction {
            store: this,
            snapshot,
            permit,
        }))
    }

    fn check_open(&self) -> DocketResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("In-memory store is already closed");
            return Err(DocketError::new(
                "store is already closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        if !self.opened.load(Ordering::Relaxed) {
            log::error!("In-memory store is not opened");
            return Err(DocketError::new(
                "store is not initialized",
                ErrorKind::StoreNotInitialized,
            ));
        }
        Ok(())
    }
}

struct InMemoryTransaction {
    store: Arc<InMemoryStoreInner>,
    snapshot: StoreState,
    permit: Option<WriterPermit>,
}

impl InMemoryTransaction {
    fn check_writable(&self, operation: &str) -> DocketResult<()> {
        if self.permit.is_none() {
            log::error!("Cannot {} in a read-only transaction", operation);
            return Err(DocketError::new(
                &format!("cannot {} in a read-only transaction", operation),
                ErrorKind::TransactionError,
            ));
        }
        Ok(())
    }

    fn bucket_mut(&mut self, name: &str) -> DocketResult<&mut BucketState> {
        match self.snapshot.get_mut(name) {
            Some(bucket) => Ok(bucket),
            None => Err(missing_bucket(name)),
        }
    }

    fn bucket(&self, name: &str) -> DocketResult<&BucketState> {
        match self.snapshot.get(name) {
            Some(bucket) => Ok(bucket),
            None => Err(missing_bucket(name)),
        }
    }
}

impl TransactionProvider for InMemoryTransaction {
    fn is_writable(&self) -> bool {
        self.permit.is_some()
    }

    fn bucket_names(&self) -> DocketResult<Vec<String>> {
        Ok(self.snapshot.keys().cloned().collect())
    }

    fn has_bucket(&self, name: &str) -> DocketResult<bool> {
        Ok(self.snapshot.contains_key(name))
    }

    fn create_bucket_if_not_exists(&mut self, name: &str) -> DocketResult<()> {
        self.check_writable("create a bucket")?;
        if !self.snapshot.contains_key(name) {
            self.snapshot.insert(name.to_string(), BucketState::default());
        }
        Ok(())
    }

    fn next_sequence(&mut self, bucket: &str) -> DocketResult<u64> {
        self.check_writable("advance a sequence")?;
        let state = self.bucket_mut(bucket)?;
        state.sequence += 1;
        Ok(state.sequence)
    }

    fn put(&mut self, bucket: &str, space: KeySpace, key: &[u8], value: &[u8]) -> DocketResult<()> {
        self.check_writable("write")?;
        let state = self.bucket_mut(bucket)?;
        state.space_mut(space).insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, bucket: &str, space: KeySpace, key: &[u8]) -> DocketResult<Option<Vec<u8>>> {
        let state = self.bucket(bucket)?;
        Ok(state.space(space).get(key).cloned())
    }

    fn for_each(&self, bucket: &str, space: KeySpace, visit: &mut EntryVisitor) -> DocketResult<()> {
        let state = self.bucket(bucket)?;
        for (key, value) in state.space(space).iter() {
            visit(key, value)?;
        }
        Ok(())
    }

    fn commit(self: Box<Self>) -> DocketResult<()> {
        let this = *self;
        if this.permit.is_some() {
            if this.store.closed.load(Ordering::Relaxed) {
                log::error!("Cannot commit, in-memory store is closed");
                return Err(DocketError::new(
                    "cannot commit, store is already closed",
                    ErrorKind::TransactionError,
                ));
            }
            *this.store.state.write() = this.snapshot;
        }
        // permit released here
        Ok(())
    }

    fn rollback(self: Box<Self>) -> DocketResult<()> {
        Ok(())
    }
}

fn missing_bucket(name: &str) -> DocketError {
    log::error!("Bucket {} does not exist", name);
    DocketError::new(
        &format!("bucket ({}) does not exist", name),
        ErrorKind::InvalidOperation,
    )
}
