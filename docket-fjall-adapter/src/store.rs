use crate::config::FjallConfig;
use crate::error::{to_docket_error, FjallStoreError};
use crate::transaction::FjallTransaction;
use dashmap::DashMap;
use docket::docket_config::DocketConfig;
use docket::errors::DocketResult;
use docket::store::{DocketStoreProvider, KeySpace, Transaction, WriterGate};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Partition holding one `bucket/<name>` entry per committed bucket. The
/// value is the bucket's current sequence as 8 little-endian bytes.
pub(crate) const META_PARTITION: &str = "docket#buckets";
pub(crate) const BUCKET_KEY_PREFIX: &str = "bucket/";

/// Largest key fjall accepts.
pub(crate) const MAX_KEY_LEN: usize = u16::MAX as usize;

// fjall rejects partition names longer than this
const MAX_PARTITION_NAME_LEN: usize = 255;
// escaped bytes kept in front of the digest of a long bucket name
const HASHED_NAME_STEM_LEN: usize = 200;

/// Persistent substrate on a fjall keyspace.
///
/// # Purpose
/// `FjallStore` keeps every bucket of a database in one fjall keyspace
/// located at `<db_dir>/<name>.<extension>`. Each bucket owns a records
/// partition and a fields partition; bucket existence and sequences are kept
/// in a metadata partition so they survive restarts.
///
/// # Characteristics
/// - A writable transaction holds the writer permit, stages its writes in
///   memory and commits them with a single atomic fjall batch.
/// - Every transaction reads committed data at the instant it began.
/// - With `sync_on_commit` the journal is synced to disk on every commit.
/// - Closing waits for the active writer, persists the journal and releases
///   the keyspace. Closing from a thread that still holds a writable
///   transaction fails instead of waiting on itself.
#[derive(Clone)]
pub struct FjallStore {
    inner: Arc<FjallStoreInner>,
}

impl FjallStore {
    pub fn new(config: FjallConfig) -> FjallStore {
        FjallStore {
            inner: Arc::new(FjallStoreInner::new(config)),
        }
    }

    pub fn config(&self) -> &FjallConfig {
        &self.inner.config
    }

    /// Directory of the opened keyspace, `None` before the store is opened.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.inner.db_path.read().clone()
    }
}

impl DocketStoreProvider for FjallStore {
    fn open_or_create(&self, config: &DocketConfig) -> DocketResult<()> {
        self.inner.open_or_create(config)
    }

    fn is_closed(&self) -> DocketResult<bool> {
        Ok(self.inner.is_closed())
    }

    fn begin(&self, writable: bool) -> DocketResult<Transaction> {
        self.inner.begin(self.inner.clone(), writable)
    }

    fn commit(&self) -> DocketResult<()> {
        self.inner.persist()
    }

    fn close(&self) -> DocketResult<()> {
        self.inner.close()
    }

    fn store_version(&self) -> DocketResult<String> {
        Ok(format!("Fjall/{}", env!("CARGO_PKG_VERSION")))
    }
}

pub(crate) struct FjallStoreInner {
    config: FjallConfig,
    keyspace: RwLock<Option<Keyspace>>,
    db_path: RwLock<Option<PathBuf>>,
    partitions: DashMap<String, PartitionHandle>,
    closed: AtomicBool,
    writer: WriterGate,
}

impl FjallStoreInner {
    fn new(config: FjallConfig) -> FjallStoreInner {
        FjallStoreInner {
            config,
            keyspace: RwLock::new(None),
            db_path: RwLock::new(None),
            partitions: DashMap::new(),
            closed: AtomicBool::new(false),
            writer: WriterGate::new(),
        }
    }

    pub(crate) fn config(&self) -> &FjallConfig {
        &self.config
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn open_or_create(&self, config: &DocketConfig) -> DocketResult<()> {
        if self.is_closed() {
            return Err(FjallStoreError::KeyspaceClosed.into());
        }

        let mut keyspace = self.keyspace.write();
        if keyspace.is_some() {
            return Ok(());
        }

        let path = self.config.db_path(&config.file_name());
        let opened = Keyspace::open(self.config.keyspace_config(&path)).map_err(|err| {
            log::error!("Failed to open keyspace at {}: {}", path.display(), err);
            to_docket_error(err)
        })?;

        self.partition(&opened, META_PARTITION)?;
        *keyspace = Some(opened);
        log::debug!("Opened fjall keyspace at {}", path.display());
        *self.db_path.write() = Some(path);
        Ok(())
    }

    pub(crate) fn keyspace(&self) -> DocketResult<Keyspace> {
        if self.is_closed() {
            return Err(FjallStoreError::KeyspaceClosed.into());
        }
        match self.keyspace.read().as_ref() {
            Some(keyspace) => Ok(keyspace.clone()),
            None => Err(FjallStoreError::KeyspaceNotOpened.into()),
        }
    }

    fn begin(&self, this: Arc<FjallStoreInner>, writable: bool) -> DocketResult<Transaction> {
        self.keyspace()?;

        let permit = if writable {
            Some(self.writer.acquire())
        } else {
            None
        };

        // the store may have been closed while waiting for the writer
        let keyspace = self.keyspace()?;
        let meta = self.partition(&keyspace, META_PARTITION)?;
        Ok(Transaction::new(FjallTransaction::new(
            this, keyspace, meta, permit,
        )))
    }

    /// Returns the handle of partition `name`, opening (and creating) it on
    /// first use.
    pub(crate) fn partition(&self, keyspace: &Keyspace, name: &str) -> DocketResult<PartitionHandle> {
        if let Some(handle) = self.partitions.get(name) {
            return Ok(handle.clone());
        }

        let handle = keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .map_err(|err| {
                log::error!("Failed to open partition {}: {}", name, err);
                to_docket_error(err)
            })?;
        self.partitions.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    fn persist(&self) -> DocketResult<()> {
        let keyspace = self.keyspace()?;
        keyspace.persist(PersistMode::SyncAll).map_err(|err| {
            log::error!("Failed to persist keyspace: {}", err);
            to_docket_error(err)
        })
    }

    fn close(&self) -> DocketResult<()> {
        if self.is_closed() {
            return Ok(());
        }

        if self.writer.is_held_by_current_thread() {
            return Err(FjallStoreError::WriterHeldByCaller.into());
        }
        let _permit = self.writer.acquire();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.partitions.clear();
        let keyspace = self.keyspace.write().take();
        if let Some(keyspace) = keyspace {
            keyspace.persist(PersistMode::SyncAll).map_err(|err| {
                log::error!("Failed to persist keyspace on close: {}", err);
                to_docket_error(err)
            })?;
        }
        log::debug!("Closed fjall store");
        Ok(())
    }
}

/// Name of the fjall partition backing key space `space` of `bucket`.
///
/// Bytes outside `[A-Za-z0-9_-]` are written as `$XX`, so distinct buckets
/// never share a partition. An escaped name too long for fjall keeps its
/// first bytes followed by `#` and the hex SHA-256 prefix of the bucket name;
/// plain escaped names never contain `#`, so the two forms cannot collide.
pub(crate) fn partition_name(space: KeySpace, bucket: &str) -> String {
    let prefix = match space {
        KeySpace::Records => "r#",
        KeySpace::Fields => "f#",
    };

    let mut name = String::with_capacity(prefix.len() + bucket.len());
    name.push_str(prefix);
    for byte in bucket.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("${:02X}", byte));
        }
    }
    if name.len() <= MAX_PARTITION_NAME_LEN {
        return name;
    }

    // escaped names are ASCII, any byte offset is a char boundary
    name.truncate(prefix.len() + HASHED_NAME_STEM_LEN);
    name.push('#');
    let digest = Sha256::digest(bucket.as_bytes());
    for byte in &digest[..16] {
        name.push_str(&format!("{:02x}", byte));
    }
    name
}

pub(crate) fn bucket_key(bucket: &str) -> Vec<u8> {
    format!("{}{}", BUCKET_KEY_PREFIX, bucket).into_bytes()
}

pub(crate) fn bucket_name(key: &[u8]) -> DocketResult<String> {
    let name = key
        .strip_prefix(BUCKET_KEY_PREFIX.as_bytes())
        .ok_or_else(|| FjallStoreError::InvalidBucketEntry(String::from_utf8_lossy(key).into_owned()))?;
    String::from_utf8(name.to_vec()).map_err(|_| {
        FjallStoreError::InvalidBucketEntry(String::from_utf8_lossy(key).into_owned()).into()
    })
}

pub(crate) fn decode_sequence(bucket: &str, bytes: &[u8]) -> DocketResult<u64> {
    match <[u8; 8]>::try_from(bytes) {
        Ok(bytes) => Ok(u64::from_le_bytes(bytes)),
        Err(_) => Err(FjallStoreError::InvalidSequence(bucket.to_string()).into()),
    }
}
