use crate::error::{to_docket_error, FjallStoreError};
use crate::store::{
    bucket_key, bucket_name, decode_sequence, partition_name, FjallStoreInner, BUCKET_KEY_PREFIX,
    MAX_KEY_LEN,
};
use docket::errors::DocketResult;
use docket::store::{EntryVisitor, KeySpace, TransactionProvider, WriterPermit};
use fjall::{Instant, Keyspace, PartitionHandle, PersistMode};
use itertools::{EitherOrBoth, Itertools};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

type StagedEntries = BTreeMap<Vec<u8>, Vec<u8>>;

/// Uncommitted state of one bucket.
#[derive(Default)]
struct StagedBucket {
    created: bool,
    sequence: Option<u64>,
    records: StagedEntries,
    fields: StagedEntries,
}

impl StagedBucket {
    fn space(&self, space: KeySpace) -> &StagedEntries {
        match space {
            KeySpace::Records => &self.records,
            KeySpace::Fields => &self.fields,
        }
    }

    fn space_mut(&mut self, space: KeySpace) -> &mut StagedEntries {
        match space {
            KeySpace::Records => &mut self.records,
            KeySpace::Fields => &mut self.fields,
        }
    }
}

/// Transaction on a [crate::FjallStore].
///
/// Committed data is read at the instant the transaction began. Writes are
/// staged per bucket and merged over committed data on reads; commit writes
/// them with one fjall batch.
pub(crate) struct FjallTransaction {
    store: Arc<FjallStoreInner>,
    keyspace: Keyspace,
    meta: PartitionHandle,
    instant: Instant,
    staged: BTreeMap<String, StagedBucket>,
    permit: Option<WriterPermit>,
}

impl FjallTransaction {
    pub(crate) fn new(
        store: Arc<FjallStoreInner>,
        keyspace: Keyspace,
        meta: PartitionHandle,
        permit: Option<WriterPermit>,
    ) -> FjallTransaction {
        let instant = keyspace.instant();
        FjallTransaction {
            store,
            keyspace,
            meta,
            instant,
            staged: BTreeMap::new(),
            permit,
        }
    }

    fn check_writable(&self, operation: &str) -> DocketResult<()> {
        if self.permit.is_none() {
            return Err(FjallStoreError::ReadOnlyTransaction(operation.to_string()).into());
        }
        Ok(())
    }

    fn committed_sequence(&self, bucket: &str) -> DocketResult<Option<u64>> {
        let value = self
            .meta
            .snapshot_at(self.instant)
            .get(bucket_key(bucket))
            .map_err(to_docket_error)?;
        match value {
            Some(bytes) => decode_sequence(bucket, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn check_key_len(len: usize) -> DocketResult<()> {
        if len > MAX_KEY_LEN {
            return Err(FjallStoreError::KeyTooLong(len).into());
        }
        Ok(())
    }

    fn is_staged_creation(&self, bucket: &str) -> bool {
        self.staged
            .get(bucket)
            .map(|staged| staged.created)
            .unwrap_or(false)
    }

    /// Fails if `bucket` does not exist; otherwise returns whether it has
    /// committed data.
    fn check_bucket(&self, bucket: &str) -> DocketResult<bool> {
        if self.is_staged_creation(bucket) {
            return Ok(false);
        }
        if self.committed_sequence(bucket)?.is_some() {
            return Ok(true);
        }
        Err(FjallStoreError::MissingBucket(bucket.to_string()).into())
    }

    fn partition(&self, space: KeySpace, bucket: &str) -> DocketResult<PartitionHandle> {
        self.store
            .partition(&self.keyspace, &partition_name(space, bucket))
    }
}

impl TransactionProvider for FjallTransaction {
    fn is_writable(&self) -> bool {
        self.permit.is_some()
    }

    fn bucket_names(&self) -> DocketResult<Vec<String>> {
        let mut names = BTreeSet::new();
        for entry in self.meta.snapshot_at(self.instant).prefix(BUCKET_KEY_PREFIX) {
            let (key, _) = entry.map_err(to_docket_error)?;
            names.insert(bucket_name(&key)?);
        }
        for (name, staged) in &self.staged {
            if staged.created {
                names.insert(name.clone());
            }
        }
        Ok(names.into_iter().collect())
    }

    fn has_bucket(&self, name: &str) -> DocketResult<bool> {
        if self.is_staged_creation(name) {
            return Ok(true);
        }
        Ok(self.committed_sequence(name)?.is_some())
    }

    fn create_bucket_if_not_exists(&mut self, name: &str) -> DocketResult<()> {
        self.check_writable("create a bucket")?;
        Self::check_key_len(bucket_key(name).len())?;
        if !self.has_bucket(name)? {
            let staged = self.staged.entry(name.to_string()).or_default();
            staged.created = true;
            staged.sequence = Some(0);
            log::debug!("Staged creation of bucket {}", name);
        }
        Ok(())
    }

    fn next_sequence(&mut self, bucket: &str) -> DocketResult<u64> {
        self.check_writable("advance a sequence")?;

        let staged = self.staged.get(bucket).and_then(|staged| staged.sequence);
        let current = match staged {
            Some(sequence) => sequence,
            None => match self.committed_sequence(bucket)? {
                Some(sequence) => sequence,
                None => return Err(FjallStoreError::MissingBucket(bucket.to_string()).into()),
            },
        };

        let next = current + 1;
        self.staged.entry(bucket.to_string()).or_default().sequence = Some(next);
        Ok(next)
    }

    fn put(&mut self, bucket: &str, space: KeySpace, key: &[u8], value: &[u8]) -> DocketResult<()> {
        self.check_writable("write")?;
        Self::check_key_len(key.len())?;
        self.check_bucket(bucket)?;
        self.staged
            .entry(bucket.to_string())
            .or_default()
            .space_mut(space)
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, bucket: &str, space: KeySpace, key: &[u8]) -> DocketResult<Option<Vec<u8>>> {
        let committed = self.check_bucket(bucket)?;
        if let Some(value) = self
            .staged
            .get(bucket)
            .and_then(|staged| staged.space(space).get(key))
        {
            return Ok(Some(value.clone()));
        }
        if !committed {
            return Ok(None);
        }

        let value = self
            .partition(space, bucket)?
            .snapshot_at(self.instant)
            .get(key)
            .map_err(to_docket_error)?;
        Ok(value.map(|value| value.to_vec()))
    }

    fn for_each(&self, bucket: &str, space: KeySpace, visit: &mut EntryVisitor) -> DocketResult<()> {
        let committed = self.check_bucket(bucket)?;
        let empty = StagedEntries::new();
        let staged = self
            .staged
            .get(bucket)
            .map(|staged| staged.space(space))
            .unwrap_or(&empty);

        if !committed {
            for (key, value) in staged {
                visit(key, value)?;
            }
            return Ok(());
        }

        let snapshot = self.partition(space, bucket)?.snapshot_at(self.instant);
        let merged = snapshot
            .iter()
            .merge_join_by(staged.iter(), |committed, (staged_key, _)| match committed {
                Ok((key, _)) => {
                    let key: &[u8] = key;
                    key.cmp(staged_key.as_slice())
                }
                // surface read errors before anything else
                Err(_) => Ordering::Less,
            });

        for entry in merged {
            match entry {
                EitherOrBoth::Left(Ok((key, value))) => {
                    let key: &[u8] = &key;
                    let value: &[u8] = &value;
                    visit(key, value)?;
                }
                EitherOrBoth::Left(Err(err)) => return Err(to_docket_error(err)),
                EitherOrBoth::Right((key, value)) | EitherOrBoth::Both(_, (key, value)) => {
                    visit(key, value)?;
                }
            }
        }
        Ok(())
    }

    fn commit(self: Box<Self>) -> DocketResult<()> {
        let this = *self;
        if this.permit.is_none() || this.staged.is_empty() {
            return Ok(());
        }

        let mut batch = this.keyspace.batch();
        for (name, staged) in &this.staged {
            if let Some(sequence) = staged.sequence {
                batch.insert(&this.meta, bucket_key(name), sequence.to_le_bytes().to_vec());
            }
            for space in [KeySpace::Records, KeySpace::Fields] {
                let entries = staged.space(space);
                if entries.is_empty() {
                    continue;
                }
                let partition = this.partition(space, name)?;
                for (key, value) in entries {
                    batch.insert(&partition, key.clone(), value.clone());
                }
            }
        }

        batch.commit().map_err(|err| {
            log::error!("Failed to commit fjall batch: {}", err);
            to_docket_error(err)
        })?;

        if this.store.config().sync_on_commit() {
            this.keyspace.persist(PersistMode::SyncAll).map_err(|err| {
                log::error!("Failed to sync journal after commit: {}", err);
                to_docket_error(err)
            })?;
        }
        // permit released here
        Ok(())
    }

    fn rollback(self: Box<Self>) -> DocketResult<()> {
        if !self.staged.is_empty() {
            log::debug!("Discarded staged writes of {} bucket(s)", self.staged.len());
        }
        Ok(())
    }
}
