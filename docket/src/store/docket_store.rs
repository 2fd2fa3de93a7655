use crate::docket_config::DocketConfig;
use crate::errors::DocketResult;
use crate::store::Transaction;
use std::ops::Deref;
use std::sync::Arc;

/// Low-level interface for the transactional key-value substrate.
///
/// # Purpose
/// Defines the contract every substrate implementation must follow. The
/// document layer only ever talks to the substrate through transactions;
/// the provider itself handles lifecycle.
///
/// # Implementations
/// - `InMemoryStore`: in-memory substrate for tests and temporary data
/// - `FjallStore`: persistent substrate on the fjall LSM keyspace
///
/// # Guarantees
/// - At most one writable transaction is active at any instant; `begin(true)`
///   blocks while another writer is active.
/// - Read-only transactions see a consistent committed state and never block
///   on the writer.
/// - Commit is atomic; rollback leaves committed state unchanged.
pub trait DocketStoreProvider: Send + Sync {
    /// Opens or creates the store for the given database configuration.
    ///
    /// This must be called before any other store operation.
    fn open_or_create(&self, config: &DocketConfig) -> DocketResult<()>;

    fn is_closed(&self) -> DocketResult<bool>;

    /// Begins a transaction. `writable` transactions are serialized.
    fn begin(&self, writable: bool) -> DocketResult<Transaction>;

    /// Flushes committed state to durable media. A no-op for memory.
    fn commit(&self) -> DocketResult<()>;

    /// Closes the store. Further calls to `begin` fail.
    fn close(&self) -> DocketResult<()>;

    /// Returns the store identifier and version, e.g. `InMemory/0.1.0`.
    fn store_version(&self) -> DocketResult<String>;
}

/// High-level handle to a substrate.
///
/// Wraps a concrete [DocketStoreProvider] in an `Arc`; cloning is cheap and
/// every clone talks to the same substrate.
#[derive(Clone)]
pub struct DocketStore {
    inner: Arc<dyn DocketStoreProvider>,
}

impl DocketStore {
    pub fn new<T: DocketStoreProvider + 'static>(inner: T) -> Self {
        DocketStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for DocketStore {
    type Target = Arc<dyn DocketStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
