use im::OrdMap;

use crate::common::{Value, RECORD_ID};
use crate::errors::{DocketError, DocketResult, ErrorKind};
use std::fmt::{Debug, Display};

/// A schemaless record: a mapping from field name to [Value].
///
/// Once persisted a record always carries its synthetic `id` field, the
/// sequence id assigned by the collection at insert time. Records read back
/// from a collection are snapshots; changing one does not change the stored
/// entry. Stored entries change only through an update.
///
/// Fields are kept in a persistent ordered map, so cloning a record is O(1)
/// and iteration is in field-name order.
#[derive(Clone, PartialEq, Default)]
pub struct Record {
    data: OrdMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Record {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, replacing any previous value.
    pub fn put<T: Into<Value>>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Field names in ascending order.
    pub fn fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Returns the record's sequence id, if it carries a valid one.
    pub fn id(&self) -> Option<u64> {
        match self.data.get(RECORD_ID) {
            Some(Value::Int(id)) if *id >= 0 => Some(*id as u64),
            _ => None,
        }
    }

    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    /// Stores `id` in the record's `id` field.
    ///
    /// Fails with [ErrorKind::InvalidId] when the id does not fit the
    /// integer range of [Value::Int].
    pub fn set_id(&mut self, id: u64) -> DocketResult<()> {
        match i64::try_from(id) {
            Ok(id) => {
                self.data.insert(RECORD_ID.to_string(), Value::Int(id));
                Ok(())
            }
            Err(_) => {
                log::error!("Record id {} is out of range", id);
                Err(DocketError::new(
                    &format!("record id {} is out of range", id),
                    ErrorKind::InvalidId,
                ))
            }
        }
    }

    /// Overwrites the fields of this record that also appear in `patch`.
    ///
    /// Fields present only in `patch` are ignored and `id` is never touched.
    /// Returns the number of fields overwritten.
    pub fn apply_patch(&mut self, patch: &Record) -> usize {
        let mut applied = 0;
        for (key, value) in patch.iter() {
            if key == RECORD_ID {
                continue;
            }
            if let Some(existing) = self.data.get_mut(key) {
                *existing = value.clone();
                applied += 1;
            }
        }
        applied
    }

    /// Builds a record from a JSON object decoded by a request layer.
    ///
    /// Values are converted with [Value::from_json], so payloads the codecs
    /// cannot store still produce a record; they are rejected on insert.
    pub fn from_json(json: serde_json::Value) -> DocketResult<Record> {
        match json {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(key, value)| (key, Value::from_json(value)))
                .collect()),
            other => {
                let kind = Value::from_json(other).type_name();
                log::error!("Cannot build a record from a JSON {}", kind);
                Err(DocketError::new(
                    &format!("expected a JSON object, found {}", kind),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    /// Converts the record to a JSON object for a request layer.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.data
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            data: iter.into_iter().collect(),
        }
    }
}

impl Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// Builds a [Record] from `"field": value` pairs.
///
/// ```text
/// let rec = record! { "name": "Foo", "age": 10 };
/// let empty = record! {};
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::collection::Record::new()
    };

    ($($key:literal : $value:expr),+ $(,)?) => {
        {
            let mut record = $crate::collection::Record::new();
            $(
                record.put($key, $crate::common::Value::from($value));
            )+
            record
        }
    };
}
