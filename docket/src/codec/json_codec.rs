use crate::codec::{non_finite, unsupported_type, CodecKind, RecordCodecProvider};
use crate::collection::Record;
use crate::common::Value;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::{Bucket, RecordKey, RecordStore};

/// Whole-record strategy: the record is serialized as one JSON object and
/// stored under its record key.
///
/// The `id` field travels inside the object. Integral JSON numbers decode as
/// [Value::Int] and the rest as [Value::Float]; since floats are always
/// written with a fractional part or exponent, the int/float distinction
/// survives a round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn encode(&self, record: &Record) -> DocketResult<Vec<u8>> {
        let mut object = serde_json::Map::with_capacity(record.len());
        for (field, value) in record.iter() {
            let json = match value {
                Value::String(s) => serde_json::Value::String(s.clone()),
                Value::Int(i) => serde_json::Value::from(*i),
                Value::Bool(b) => serde_json::Value::Bool(*b),
                Value::Float(f) => match serde_json::Number::from_f64(*f) {
                    Some(n) => serde_json::Value::Number(n),
                    None => return Err(non_finite(field, *f)),
                },
                other => return Err(unsupported_type(field, other)),
            };
            object.insert(field.clone(), json);
        }

        serde_json::to_vec(&serde_json::Value::Object(object)).map_err(|err| {
            log::error!("Failed to serialize record: {}", err);
            DocketError::new(
                &format!("failed to serialize record: {}", err),
                ErrorKind::EncodingError,
            )
        })
    }

    pub fn decode(&self, bytes: &[u8]) -> DocketResult<Record> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        let object = match json {
            serde_json::Value::Object(object) => object,
            other => {
                log::error!("Stored record is not a JSON object: {}", other);
                return Err(DocketError::new(
                    "stored record is not a JSON object",
                    ErrorKind::DecodingError,
                ));
            }
        };

        let mut record = Record::new();
        for (field, json) in object {
            let value = match json {
                serde_json::Value::String(s) => Value::String(s),
                serde_json::Value::Bool(b) => Value::Bool(b),
                serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => Value::Int(i),
                    (None, Some(f)) => Value::Float(f),
                    (None, None) => return Err(undecodable(&field, "number")),
                },
                serde_json::Value::Null => return Err(undecodable(&field, "null")),
                serde_json::Value::Array(_) => return Err(undecodable(&field, "array")),
                serde_json::Value::Object(_) => return Err(undecodable(&field, "object")),
            };
            record.put(field, value);
        }
        Ok(record)
    }
}

impl RecordCodecProvider for JsonCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::WholeRecord
    }

    fn write_record(
        &self,
        bucket: &mut Bucket<'_>,
        key: RecordKey,
        record: &Record,
    ) -> DocketResult<()> {
        let bytes = self.encode(record)?;
        bucket.put_record(key, &bytes)
    }

    fn scan_records(
        &self,
        bucket: &Bucket<'_>,
        visit: &mut dyn FnMut(RecordKey, Record) -> DocketResult<()>,
    ) -> DocketResult<()> {
        bucket.for_each_record(&mut |key, bytes| {
            let record = self.decode(bytes)?;
            visit(key, record)
        })
    }
}

fn undecodable(field: &str, kind: &str) -> DocketError {
    log::error!("Stored field {} holds an unsupported JSON {}", field, kind);
    DocketError::new(
        &format!("stored field {} holds an unsupported JSON {}", field, kind),
        ErrorKind::DecodingError,
    )
}
