use crate::codec::RecordCodec;
use crate::collection::Record;
use crate::common::META_BUCKET_NAME;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::filter::{arrange, matches, project, Filter};
use crate::store::{Bucket, DocketStore, RecordKey};

/// Insert, find and update against the substrate.
///
/// Every operation runs in exactly one substrate transaction. The
/// transaction is committed on success; on any error it is dropped, which
/// rolls it back, so callers never observe a partial write.
#[derive(Clone)]
pub(crate) struct CollectionOperations {
    store: DocketStore,
    codec: RecordCodec,
}

impl CollectionOperations {
    pub(crate) fn new(store: DocketStore, codec: RecordCodec) -> Self {
        CollectionOperations { store, codec }
    }

    /// Stores `record` under a fresh sequence id and returns the id.
    ///
    /// Creates the collection if needed. Any `id` supplied by the caller is
    /// replaced by the assigned one.
    pub(crate) fn insert(&self, name: &str, mut record: Record) -> DocketResult<u64> {
        validate_collection_name(name)?;

        let mut tx = self.store.begin(true)?;
        let mut bucket = tx.create_bucket_if_not_exists(name)?;
        let id = bucket.next_sequence()?;
        record.set_id(id)?;
        self.codec
            .write_record(&mut bucket, RecordKey::from_id(id), &record)?;
        tx.commit()?;

        log::debug!("Inserted record {} into {}", id, name);
        Ok(id)
    }

    /// Returns the projected records matching `filter` in ascending id
    /// order, then sorted and limited as the filter asks.
    pub(crate) fn find(&self, name: &str, filter: &Filter) -> DocketResult<Vec<Record>> {
        validate_collection_name(name)?;

        let mut tx = self.store.begin(false)?;
        let matched = match tx.bucket(name)? {
            Some(bucket) => self.scan_matching(&bucket, filter)?,
            None => return Err(collection_not_found(name)),
        };
        tx.commit()?;

        log::debug!("Found {} records in {} for {}", matched.len(), name, filter);
        let records = arrange(matched.into_iter().map(|(_, record)| record).collect(), filter);
        Ok(records
            .into_iter()
            .map(|record| project(record, filter))
            .collect())
    }

    /// Applies `patch` to every record matching `filter` and returns the
    /// updated records in ascending id order.
    ///
    /// Only fields a record already has are overwritten, and `id` never is.
    /// The filter's projection, limit and sort are not used.
    pub(crate) fn update(
        &self,
        name: &str,
        filter: &Filter,
        patch: &Record,
    ) -> DocketResult<Vec<Record>> {
        validate_collection_name(name)?;

        let mut tx = self.store.begin(true)?;
        let mut updated = Vec::new();
        match tx.bucket(name)? {
            Some(mut bucket) => {
                let matched = self.scan_matching(&bucket, filter)?;
                for (key, mut record) in matched {
                    record.apply_patch(patch);
                    self.codec.write_record(&mut bucket, key, &record)?;
                    updated.push(record);
                }
            }
            None => return Err(collection_not_found(name)),
        }
        tx.commit()?;

        log::debug!("Updated {} records in {}", updated.len(), name);
        Ok(updated)
    }

    /// Creates the collection if it does not exist yet.
    pub(crate) fn create_collection(&self, name: &str) -> DocketResult<()> {
        validate_collection_name(name)?;

        let mut tx = self.store.begin(true)?;
        tx.create_bucket_if_not_exists(name)?;
        tx.commit()
    }

    pub(crate) fn has_collection(&self, name: &str) -> DocketResult<bool> {
        validate_collection_name(name)?;

        let tx = self.store.begin(false)?;
        let exists = tx.has_bucket(name)?;
        tx.commit()?;
        Ok(exists)
    }

    pub(crate) fn list_collection_names(&self) -> DocketResult<Vec<String>> {
        let tx = self.store.begin(false)?;
        let names = tx.bucket_names()?;
        tx.commit()?;
        Ok(names
            .into_iter()
            .filter(|name| name != META_BUCKET_NAME)
            .collect())
    }

    fn scan_matching(
        &self,
        bucket: &Bucket<'_>,
        filter: &Filter,
    ) -> DocketResult<Vec<(RecordKey, Record)>> {
        let mut matched = Vec::new();
        self.codec.scan_records(bucket, &mut |key, mut record| {
            if !record.has_id() {
                record.set_id(key.id())?;
            }
            if matches(&record, filter) {
                matched.push((key, record));
            }
            Ok(())
        })?;
        // keys are little-endian, so byte order differs from id order past 255
        matched.sort_by_key(|(key, _)| key.id());
        Ok(matched)
    }
}

pub(crate) fn validate_collection_name(name: &str) -> DocketResult<()> {
    if name.is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(DocketError::new(
            "Collection name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }
    if name.eq_ignore_ascii_case(META_BUCKET_NAME) {
        log::error!("Collection name '{}' is reserved", name);
        return Err(DocketError::new(
            &format!("Collection name '{}' is reserved", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

fn collection_not_found(name: &str) -> DocketError {
    log::error!("Collection {} not found", name);
    DocketError::new(
        &format!("collection ({}) not found", name),
        ErrorKind::CollectionNotFound,
    )
}
