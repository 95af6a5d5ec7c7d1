use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for mongokit operations
///
/// Each kind describes one category of failure so callers can branch on it
/// without parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::errors::{MongoKitError, ErrorKind, MongoKitResult};
///
/// fn example() -> MongoKitResult<()> {
///     Err(MongoKitError::new("field name cannot be blank", ErrorKind::InvalidArgument))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A caller supplied argument failed validation before any I/O
    InvalidArgument,
    /// The operation is not valid for the receiver in its current state
    InvalidOperation,
    /// The requested element or resource does not exist
    NotFound,
    /// The cursor has already been closed
    CursorClosed,
    /// A descriptor or option tree is not usable
    ConfigurationError,
    /// The store connection is unavailable or has been closed
    ConnectionError,
    /// The store rejected or failed an operation
    StoreError,
    /// A unique index rejected a write
    DuplicateKey,
    /// Error encoding or decoding data
    EncodingError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::CursorClosed => write!(f, "Cursor closed"),
            ErrorKind::ConfigurationError => write!(f, "Configuration error"),
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::StoreError => write!(f, "Store error"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom mongokit error type.
///
/// `MongoKitError` carries a message, a kind, an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::errors::{MongoKitError, ErrorKind};
///
/// let err = MongoKitError::new("cursor is closed", ErrorKind::CursorClosed);
///
/// let cause = MongoKitError::new("socket reset", ErrorKind::ConnectionError);
/// let err = MongoKitError::new_with_cause("find failed", ErrorKind::StoreError, cause);
/// ```
#[derive(Clone)]
pub struct MongoKitError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MongoKitError>>,
    backtrace: Atomic<Backtrace>,
}

impl MongoKitError {
    /// Creates a new `MongoKitError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MongoKitError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `MongoKitError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MongoKitError) -> Self {
        MongoKitError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&MongoKitError> {
        self.cause.as_deref()
    }
}

impl Display for MongoKitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MongoKitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // message with stack trace, or the cause chain
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for MongoKitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for mongokit operations.
pub type MongoKitResult<T> = Result<T, MongoKitError>;

#[cfg(feature = "serde")]
impl serde::de::Error for MongoKitError {
    fn custom<T: Display>(msg: T) -> Self {
        MongoKitError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for MongoKitError {
    fn custom<T: Display>(msg: T) -> Self {
        MongoKitError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<std::io::Error> for MongoKitError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::TimedOut => ErrorKind::ConnectionError,
            _ => ErrorKind::StoreError,
        };
        MongoKitError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<std::num::ParseIntError> for MongoKitError {
    fn from(err: std::num::ParseIntError) -> Self {
        MongoKitError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidArgument,
        )
    }
}

impl From<std::num::ParseFloatError> for MongoKitError {
    fn from(err: std::num::ParseFloatError) -> Self {
        MongoKitError::new(
            &format!("Float parsing error: {}", err),
            ErrorKind::InvalidArgument,
        )
    }
}

impl From<regex::Error> for MongoKitError {
    fn from(err: regex::Error) -> Self {
        MongoKitError::new(
            &format!("Invalid regular expression: {}", err),
            ErrorKind::InvalidArgument,
        )
    }
}

impl From<String> for MongoKitError {
    fn from(msg: String) -> Self {
        MongoKitError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for MongoKitError {
    fn from(msg: &str) -> Self {
        MongoKitError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_new_creates_error() {
        let error = MongoKitError::new("An error occurred", ErrorKind::StoreError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::StoreError);
        assert!(error.cause().is_none());
        assert!(error.source().is_none());
    }

    #[test]
    fn error_new_with_cause_keeps_chain() {
        let cause = MongoKitError::new("socket reset", ErrorKind::ConnectionError);
        let error = MongoKitError::new_with_cause("find failed", ErrorKind::StoreError, cause);
        assert_eq!(error.cause().map(|c| c.kind()), Some(&ErrorKind::ConnectionError));
        assert!(error.source().is_some());

        let formatted = format!("{:?}", error);
        assert!(formatted.contains("find failed"));
        assert!(formatted.contains("Caused by:"));
        assert!(formatted.contains("socket reset"));
    }

    #[test]
    fn error_display_is_message() {
        let error = MongoKitError::new("cursor is closed", ErrorKind::CursorClosed);
        assert_eq!(format!("{}", error), "cursor is closed");
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidArgument.to_string(), "Invalid argument");
        assert_eq!(ErrorKind::DuplicateKey.to_string(), "Duplicate key");
        assert_eq!(ErrorKind::CursorClosed.to_string(), "Cursor closed");
    }

    #[test]
    fn io_error_conversion_maps_connection_failures() {
        let err: MongoKitError =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);

        let err: MongoKitError = std::io::Error::other("disk").into();
        assert_eq!(err.kind(), &ErrorKind::StoreError);
    }

    #[test]
    fn parse_error_conversion() {
        let err: MongoKitError = "abc".parse::<i64>().unwrap_err().into();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        assert!(err.message().contains("Integer parsing error"));
    }

    #[test]
    fn string_conversion_is_internal() {
        let err: MongoKitError = "boom".into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
        let err: MongoKitError = String::from("bang").into();
        assert_eq!(err.message(), "bang");
    }
}
