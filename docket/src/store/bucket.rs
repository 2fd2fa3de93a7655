use crate::common::RECORD_KEY_WIDTH;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::{EntryVisitor, KeySpace, RecordKey, Transaction};

/// A bucket (collection namespace) seen through an open [Transaction].
///
/// The plain `put`/`get`/`for_each` surface works on the bucket's records key
/// space. Record codecs reach the bucket through one of two capabilities:
/// [RecordStore] for whole-record values and [FieldStore] for per-field keys
/// inside a record's sub-namespace.
pub struct Bucket<'tx> {
    tx: &'tx mut Transaction,
    name: String,
}

impl<'tx> Bucket<'tx> {
    pub(crate) fn new(tx: &'tx mut Transaction, name: &str) -> Self {
        Bucket {
            tx,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn next_sequence(&mut self) -> DocketResult<u64> {
        self.tx.provider_mut()?.next_sequence(&self.name)
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> DocketResult<()> {
        self.tx
            .provider_mut()?
            .put(&self.name, KeySpace::Records, key, value)
    }

    pub fn get(&self, key: &[u8]) -> DocketResult<Option<Vec<u8>>> {
        self.tx.provider()?.get(&self.name, KeySpace::Records, key)
    }

    /// Visits every entry of the records key space in ascending key order.
    pub fn for_each(&self, visit: &mut EntryVisitor) -> DocketResult<()> {
        self.tx
            .provider()?
            .for_each(&self.name, KeySpace::Records, visit)
    }
}

/// Whole-record capability: one value per record key.
pub trait RecordStore {
    fn put_record(&mut self, key: RecordKey, value: &[u8]) -> DocketResult<()>;

    /// Visits every record in ascending key order.
    fn for_each_record(
        &self,
        visit: &mut dyn FnMut(RecordKey, &[u8]) -> DocketResult<()>,
    ) -> DocketResult<()>;
}

/// Per-field capability: each record owns a sub-namespace of field keys.
pub trait FieldStore {
    /// Marks the sub-namespace of `key` as existing, so records without
    /// stored fields are still visited.
    fn create_sub_namespace(&mut self, key: RecordKey) -> DocketResult<()>;

    fn put_field(&mut self, key: RecordKey, field: &str, value: &[u8]) -> DocketResult<()>;

    /// Visits every sub-namespace in ascending key order with its fields in
    /// field-name order.
    fn for_each_sub_namespace(
        &self,
        visit: &mut dyn FnMut(RecordKey, Vec<(String, Vec<u8>)>) -> DocketResult<()>,
    ) -> DocketResult<()>;
}

impl RecordStore for Bucket<'_> {
    fn put_record(&mut self, key: RecordKey, value: &[u8]) -> DocketResult<()> {
        self.put(key.as_bytes(), value)
    }

    fn for_each_record(
        &self,
        visit: &mut dyn FnMut(RecordKey, &[u8]) -> DocketResult<()>,
    ) -> DocketResult<()> {
        self.for_each(&mut |key, value| {
            let key = RecordKey::try_from(key)?;
            visit(key, value)
        })
    }
}

impl FieldStore for Bucket<'_> {
    fn create_sub_namespace(&mut self, key: RecordKey) -> DocketResult<()> {
        self.tx
            .provider_mut()?
            .put(&self.name, KeySpace::Fields, key.as_bytes(), &[])
    }

    fn put_field(&mut self, key: RecordKey, field: &str, value: &[u8]) -> DocketResult<()> {
        if field.is_empty() {
            log::error!("Empty field name in record {} of {}", key, self.name);
            return Err(DocketError::new(
                "field name cannot be empty",
                ErrorKind::EncodingError,
            ));
        }
        let mut field_key = Vec::with_capacity(RECORD_KEY_WIDTH + field.len());
        field_key.extend_from_slice(key.as_bytes());
        field_key.extend_from_slice(field.as_bytes());
        self.tx
            .provider_mut()?
            .put(&self.name, KeySpace::Fields, &field_key, value)
    }

    fn for_each_sub_namespace(
        &self,
        visit: &mut dyn FnMut(RecordKey, Vec<(String, Vec<u8>)>) -> DocketResult<()>,
    ) -> DocketResult<()> {
        let mut current: Option<(RecordKey, Vec<(String, Vec<u8>)>)> = None;

        self.tx
            .provider()?
            .for_each(&self.name, KeySpace::Fields, &mut |key, value| {
                if key.len() < RECORD_KEY_WIDTH {
                    log::error!("Truncated field key of width {}", key.len());
                    return Err(DocketError::new(
                        &format!("truncated field key of width {}", key.len()),
                        ErrorKind::DecodingError,
                    ));
                }
                let (prefix, field) = key.split_at(RECORD_KEY_WIDTH);
                let record_key = RecordKey::try_from(prefix)?;

                let starts_new = match &current {
                    Some((open, _)) => *open != record_key,
                    None => true,
                };
                if starts_new {
                    if let Some((done, fields)) = current.take() {
                        visit(done, fields)?;
                    }
                    current = Some((record_key, Vec::new()));
                }

                if !field.is_empty() {
                    let name = String::from_utf8(field.to_vec())?;
                    if let Some((_, fields)) = current.as_mut() {
                        fields.push((name, value.to_vec()));
                    }
                }
                Ok(())
            })?;

        if let Some((done, fields)) = current.take() {
            visit(done, fields)?;
        }
        Ok(())
    }
}
