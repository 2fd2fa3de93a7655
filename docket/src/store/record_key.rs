use crate::common::RECORD_KEY_WIDTH;
use crate::errors::{DocketError, DocketResult, ErrorKind};
use std::fmt::{Debug, Display, Formatter};

/// Storage key of a record: the 8-byte little-endian encoding of its
/// sequence id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey([u8; RECORD_KEY_WIDTH]);

impl RecordKey {
    pub fn from_id(id: u64) -> Self {
        RecordKey(id.to_le_bytes())
    }

    pub fn id(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_KEY_WIDTH] {
        &self.0
    }
}

impl TryFrom<&[u8]> for RecordKey {
    type Error = DocketError;

    fn try_from(bytes: &[u8]) -> DocketResult<Self> {
        match <[u8; RECORD_KEY_WIDTH]>::try_from(bytes) {
            Ok(raw) => Ok(RecordKey(raw)),
            Err(_) => {
                log::error!("Invalid record key width {}", bytes.len());
                Err(DocketError::new(
                    &format!(
                        "record key must be {} bytes, found {}",
                        RECORD_KEY_WIDTH,
                        bytes.len()
                    ),
                    ErrorKind::DecodingError,
                ))
            }
        }
    }
}

impl From<u64> for RecordKey {
    fn from(id: u64) -> Self {
        RecordKey::from_id(id)
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl Debug for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecordKey({})", self.id())
    }
}
