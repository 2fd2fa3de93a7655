use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for Docket operations.
///
/// The first four variants form the document-layer taxonomy every caller is
/// expected to inspect; the rest describe configuration, lifecycle and
/// backend failures.
///
/// # Examples
///
/// ```rust,ignore
/// use docket::errors::{DocketError, ErrorKind, DocketResult};
///
/// fn example() -> DocketResult<()> {
///     Err(DocketError::new("collection (users) not found", ErrorKind::CollectionNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The substrate failed to begin, commit or roll back a transaction
    TransactionError,
    /// The named collection does not exist
    CollectionNotFound,
    /// A record could not be encoded by the active codec
    EncodingError,
    /// A stored byte sequence could not be decoded by the active codec
    DecodingError,

    /// Invalid configuration, collection name or input payload
    ValidationError,
    /// A record key or id is out of range
    InvalidId,
    /// The operation is not valid in the current context
    InvalidOperation,

    /// Store has not been initialized
    StoreNotInitialized,
    /// Store has already been closed
    StoreAlreadyClosed,
    /// Error from a storage backend
    BackendError,
    /// Generic IO error
    IOError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::TransactionError => write!(f, "Transaction error"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::DecodingError => write!(f, "Decoding error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Docket error type.
///
/// `DocketError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust,ignore
/// use docket::errors::{DocketError, ErrorKind};
///
/// let cause = DocketError::new("journal write failed", ErrorKind::IOError);
/// let err = DocketError::new_with_cause("commit failed", ErrorKind::TransactionError, cause);
/// assert_eq!(err.kind(), &ErrorKind::TransactionError);
/// ```
#[derive(Clone)]
pub struct DocketError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocketError>>,
    backtrace: Arc<Backtrace>,
}

impl DocketError {
    /// Creates a new `DocketError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocketError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `DocketError` that keeps `cause` in its error chain.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocketError) -> Self {
        DocketError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocketError> {
        self.cause.as_deref()
    }
}

impl Display for DocketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for DocketError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Docket operations.
pub type DocketResult<T> = Result<T, DocketError>;

impl From<std::io::Error> for DocketError {
    fn from(err: std::io::Error) -> Self {
        DocketError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::string::FromUtf8Error> for DocketError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        DocketError::new(
            &format!("UTF-8 decoding error: {}", err),
            ErrorKind::DecodingError,
        )
    }
}

impl From<serde_json::Error> for DocketError {
    fn from(err: serde_json::Error) -> Self {
        DocketError::new(
            &format!("JSON decoding error: {}", err),
            ErrorKind::DecodingError,
        )
    }
}
