//! Record codecs.
//!
//! A codec turns a [Record] into bytes stored in a bucket and back. Docket
//! ships two strategies, chosen once per database through
//! [crate::docket_config::DocketConfig]:
//!
//! - [JsonCodec] (`whole-record`): the record is one JSON object stored under
//!   its record key through the [crate::store::RecordStore] capability.
//! - [TypedFieldCodec] (`typed-field`): every field is stored under its own
//!   key in the record's sub-namespace through the
//!   [crate::store::FieldStore] capability, as a 4-byte [ValueType] tag
//!   followed by a type-specific payload.
//!
//! Both accept exactly string, int, float and bool values and reject
//! anything else with [crate::errors::ErrorKind::EncodingError].

mod json_codec;
mod typed_codec;
mod value_type;

pub use json_codec::*;
pub use typed_codec::*;
pub use value_type::*;

use crate::collection::Record;
use crate::common::Value;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use crate::store::{Bucket, RecordKey};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// Selects the record encoding strategy of a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecKind {
    WholeRecord,
    TypedField,
}

impl Display for CodecKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecKind::WholeRecord => write!(f, "whole-record"),
            CodecKind::TypedField => write!(f, "typed-field"),
        }
    }
}

impl FromStr for CodecKind {
    type Err = DocketError;

    fn from_str(s: &str) -> DocketResult<Self> {
        match s {
            "whole-record" => Ok(CodecKind::WholeRecord),
            "typed-field" => Ok(CodecKind::TypedField),
            other => {
                log::error!("Unknown codec {}", other);
                Err(DocketError::new(
                    &format!("unknown codec ({})", other),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }
}

/// Capability every record codec implements.
pub trait RecordCodecProvider: Send + Sync {
    fn kind(&self) -> CodecKind;

    /// Encodes `record` completely, then writes it under `key`.
    ///
    /// An encoding failure leaves the bucket untouched.
    fn write_record(&self, bucket: &mut Bucket<'_>, key: RecordKey, record: &Record)
        -> DocketResult<()>;

    /// Decodes every record of the bucket in ascending key order.
    fn scan_records(
        &self,
        bucket: &Bucket<'_>,
        visit: &mut dyn FnMut(RecordKey, Record) -> DocketResult<()>,
    ) -> DocketResult<()>;
}

/// Shared handle to the codec a database was configured with.
#[derive(Clone)]
pub struct RecordCodec {
    inner: Arc<dyn RecordCodecProvider>,
}

impl RecordCodec {
    pub fn new<T: RecordCodecProvider + 'static>(inner: T) -> Self {
        RecordCodec {
            inner: Arc::new(inner),
        }
    }

    /// Returns the codec implementing `kind`.
    pub fn for_kind(kind: CodecKind) -> Self {
        match kind {
            CodecKind::WholeRecord => RecordCodec::new(JsonCodec),
            CodecKind::TypedField => RecordCodec::new(TypedFieldCodec),
        }
    }
}

impl Deref for RecordCodec {
    type Target = Arc<dyn RecordCodecProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub(crate) fn unsupported_type(field: &str, value: &Value) -> DocketError {
    log::error!("Unsupported type {} for field {}", value.type_name(), field);
    DocketError::new(
        &format!("unsupported type ({}) for field {}", value.type_name(), field),
        ErrorKind::EncodingError,
    )
}

pub(crate) fn non_finite(field: &str, value: f64) -> DocketError {
    log::error!("Non-finite float {} for field {}", value, field);
    DocketError::new(
        &format!("unsupported type (non-finite float {}) for field {}", value, field),
        ErrorKind::EncodingError,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_kind_parses_and_displays() {
        assert_eq!("whole-record".parse::<CodecKind>().unwrap(), CodecKind::WholeRecord);
        assert_eq!("typed-field".parse::<CodecKind>().unwrap(), CodecKind::TypedField);
        assert_eq!(CodecKind::TypedField.to_string(), "typed-field");
        let err = "gob".parse::<CodecKind>().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn codec_kind_serde_names() {
        let json = serde_json::to_string(&CodecKind::WholeRecord).unwrap();
        assert_eq!(json, "\"whole-record\"");
        let kind: CodecKind = serde_json::from_str("\"typed-field\"").unwrap();
        assert_eq!(kind, CodecKind::TypedField);
    }

    #[test]
    fn for_kind_selects_strategy() {
        assert_eq!(RecordCodec::for_kind(CodecKind::WholeRecord).kind(), CodecKind::WholeRecord);
        assert_eq!(RecordCodec::for_kind(CodecKind::TypedField).kind(), CodecKind::TypedField);
    }

    #[test]
    fn unsupported_type_names_the_type() {
        let err = unsupported_type("data", &Value::Array(vec![]));
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
        assert!(err.message().contains("(array)"));
    }
}
