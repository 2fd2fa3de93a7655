use crate::codec::{non_finite, unsupported_type, CodecKind, RecordCodecProvider, ValueType};
use crate::collection::Record;
use crate::common::{Value, RECORD_ID, VALUE_TAG_WIDTH};
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::{Bucket, FieldStore, RecordKey};

/// Typed-field strategy: each field is stored under its own key inside the
/// record's sub-namespace.
///
/// A stored value is a 4-byte little-endian [ValueType] tag followed by the
/// payload:
///
/// | tag | payload |
/// |---|---|
/// | `String` | raw UTF-8 bytes |
/// | `Int` | 4-byte little-endian signed integer |
/// | `Float` | 8-byte little-endian IEEE-754 double |
/// | `Bool` | one byte, `0x00` or `0x01` |
///
/// The `id` field is not stored; it is derived from the record key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedFieldCodec;

impl TypedFieldCodec {
    /// Encodes one field value as tag plus payload.
    pub fn encode_value(&self, field: &str, value: &Value) -> DocketResult<Vec<u8>> {
        let value_type = ValueType::of(value);
        let mut bytes = Vec::with_capacity(VALUE_TAG_WIDTH + 8);
        bytes.extend_from_slice(&value_type.tag().to_le_bytes());

        match value {
            Value::String(s) => bytes.extend_from_slice(s.as_bytes()),
            Value::Int(i) => match i32::try_from(*i) {
                Ok(small) => bytes.extend_from_slice(&small.to_le_bytes()),
                Err(_) => {
                    log::error!("Integer {} of field {} exceeds 32 bits", i, field);
                    return Err(DocketError::new(
                        &format!("integer {} of field {} does not fit in 32 bits", i, field),
                        ErrorKind::EncodingError,
                    ));
                }
            },
            Value::Float(f) => {
                if !f.is_finite() {
                    return Err(non_finite(field, *f));
                }
                bytes.extend_from_slice(&f.to_le_bytes());
            }
            Value::Bool(b) => bytes.push(u8::from(*b)),
            other => return Err(unsupported_type(field, other)),
        }
        Ok(bytes)
    }

    /// Decodes a tag-prefixed value, dispatching on the tag.
    pub fn decode_value(&self, field: &str, bytes: &[u8]) -> DocketResult<Value> {
        if bytes.len() < VALUE_TAG_WIDTH {
            return Err(malformed(field, "missing type tag"));
        }
        let (tag, payload) = bytes.split_at(VALUE_TAG_WIDTH);
        let mut raw_tag = [0u8; VALUE_TAG_WIDTH];
        raw_tag.copy_from_slice(tag);
        let tag = u32::from_le_bytes(raw_tag);

        match ValueType::from_tag(tag) {
            Some(ValueType::String) => {
                let s = String::from_utf8(payload.to_vec())?;
                Ok(Value::String(s))
            }
            Some(ValueType::Int) => match <[u8; 4]>::try_from(payload) {
                Ok(raw) => Ok(Value::Int(i32::from_le_bytes(raw) as i64)),
                Err(_) => Err(malformed(field, "int payload must be 4 bytes")),
            },
            Some(ValueType::Float) => match <[u8; 8]>::try_from(payload) {
                Ok(raw) => Ok(Value::Float(f64::from_le_bytes(raw))),
                Err(_) => Err(malformed(field, "float payload must be 8 bytes")),
            },
            Some(ValueType::Bool) => match payload {
                [0] => Ok(Value::Bool(false)),
                [1] => Ok(Value::Bool(true)),
                _ => Err(malformed(field, "bool payload must be 0x00 or 0x01")),
            },
            Some(ValueType::Unknown) | None => {
                log::error!("Unrecognized type tag {} for field {}", tag, field);
                Err(DocketError::new(
                    &format!("unrecognized type tag {} for field {}", tag, field),
                    ErrorKind::DecodingError,
                ))
            }
        }
    }
}

impl RecordCodecProvider for TypedFieldCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::TypedField
    }

    fn write_record(
        &self,
        bucket: &mut Bucket<'_>,
        key: RecordKey,
        record: &Record,
    ) -> DocketResult<()> {
        // encode everything before the first write
        let mut encoded = Vec::with_capacity(record.len());
        for (field, value) in record.iter() {
            if field == RECORD_ID {
                continue;
            }
            if field.is_empty() {
                log::error!("Empty field name in record {}", key);
                return Err(DocketError::new(
                    "field name cannot be empty",
                    ErrorKind::EncodingError,
                ));
            }
            encoded.push((field.as_str(), self.encode_value(field, value)?));
        }

        bucket.create_sub_namespace(key)?;
        for (field, bytes) in encoded {
            bucket.put_field(key, field, &bytes)?;
        }
        Ok(())
    }

    fn scan_records(
        &self,
        bucket: &Bucket<'_>,
        visit: &mut dyn FnMut(RecordKey, Record) -> DocketResult<()>,
    ) -> DocketResult<()> {
        bucket.for_each_sub_namespace(&mut |key, fields| {
            let mut record = Record::new();
            for (field, bytes) in fields {
                let value = self.decode_value(&field, &bytes)?;
                record.put(field, value);
            }
            record.set_id(key.id())?;
            visit(key, record)
        })
    }
}

fn malformed(field: &str, reason: &str) -> DocketError {
    log::error!("Malformed value for field {}: {}", field, reason);
    DocketError::new(
        &format!("malformed value for field {}: {}", field, reason),
        ErrorKind::DecodingError,
    )
}
