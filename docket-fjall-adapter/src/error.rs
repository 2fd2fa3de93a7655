use docket::errors::{DocketError, ErrorKind};
use std::error::Error;
use thiserror::Error;

/// Failures raised by the fjall substrate itself, before they reach the
/// document layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FjallStoreError {
    #[error("Keyspace is not opened")]
    KeyspaceNotOpened,
    #[error("Keyspace is already closed")]
    KeyspaceClosed,
    #[error("Invalid sequence entry for bucket {0}")]
    InvalidSequence(String),
    #[error("Invalid bucket entry: {0}")]
    InvalidBucketEntry(String),
    #[error("Cannot {0} in a read-only transaction")]
    ReadOnlyTransaction(String),
    #[error("Bucket ({0}) does not exist")]
    MissingBucket(String),
    #[error("Key of {0} bytes exceeds the fjall key size limit")]
    KeyTooLong(usize),
    #[error("Cannot close the store while this thread holds a writable transaction")]
    WriterHeldByCaller,
}

impl From<FjallStoreError> for DocketError {
    fn from(err: FjallStoreError) -> Self {
        let kind = match &err {
            FjallStoreError::KeyspaceNotOpened => ErrorKind::StoreNotInitialized,
            FjallStoreError::KeyspaceClosed => ErrorKind::StoreAlreadyClosed,
            FjallStoreError::InvalidSequence(_) | FjallStoreError::InvalidBucketEntry(_) => {
                ErrorKind::DecodingError
            }
            FjallStoreError::ReadOnlyTransaction(_) | FjallStoreError::WriterHeldByCaller => {
                ErrorKind::TransactionError
            }
            FjallStoreError::KeyTooLong(_) => ErrorKind::ValidationError,
            FjallStoreError::MissingBucket(_) => ErrorKind::InvalidOperation,
        };
        log::error!("{}", err);
        DocketError::new(&err.to_string(), kind)
    }
}

/// Converts a fjall failure into a [DocketError].
///
/// Errors mentioning a closed or poisoned keyspace map to
/// [ErrorKind::StoreAlreadyClosed]; everything else is a backend failure.
pub(crate) fn to_docket_error(error: impl Error) -> DocketError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    let kind = if lower.contains("closed") || lower.contains("poisoned") {
        ErrorKind::StoreAlreadyClosed
    } else {
        ErrorKind::BackendError
    };
    log::error!("Fjall error: {}", message);
    DocketError::new(&format!("fjall error: {}", message), kind)
}
