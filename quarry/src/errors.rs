use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for quarry operations.
///
/// Every failure surfaced to a caller carries exactly one of these kinds so
/// that callers can branch on the category without parsing messages.
///
/// Type mismatches during comparison and duplicate index definitions are
/// deliberately absent: the first evaluates to `false`, the second is a no-op.
///
/// # Examples
///
/// ```rust
/// use quarry::errors::{ErrorKind, QuarryError, QuarryResult};
///
/// fn example() -> QuarryResult<()> {
///     Err(QuarryError::new("unknown stage $foo", ErrorKind::UnknownStage))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::UnknownStage);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Malformed filter, projection, sort, update, index or pipeline specification
    InvalidSpecification,
    /// Unrecognized aggregation stage tag
    UnknownStage,
    /// The record identity is missing, malformed or was supplied by the caller
    InvalidId,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Invalid names or values outside of query specifications
    ValidationError,
    /// The requested resource was not found
    NotFound,
    /// Index maintenance or lookup failed
    IndexingError,
    /// A running scan was interrupted by its caller
    Interrupted,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidSpecification => write!(f, "Invalid specification"),
            ErrorKind::UnknownStage => write!(f, "Unknown stage"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::Interrupted => write!(f, "Interrupted"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom quarry error type.
///
/// `QuarryError` carries a message, a kind, an optional cause and a backtrace
/// captured where the error was created.
///
/// # Examples
///
/// ```rust
/// use quarry::errors::{ErrorKind, QuarryError};
///
/// let cause = QuarryError::new("bad operator $foo", ErrorKind::InvalidSpecification);
/// let err = QuarryError::new_with_cause("cannot parse stage", ErrorKind::InvalidSpecification, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct QuarryError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<QuarryError>>,
    backtrace: Arc<Backtrace>,
}

impl QuarryError {
    /// Creates a new `QuarryError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        QuarryError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `QuarryError` wrapping the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: QuarryError) -> Self {
        QuarryError {
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

    pub fn cause(&self) -> Option<&QuarryError> {
        self.cause.as_deref()
    }
}

impl Display for QuarryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for QuarryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}: {}\nCaused by: {:?}", self.error_kind, self.message, cause),
            None => write!(f, "{}: {}\n{:?}", self.error_kind, self.message, self.backtrace),
        }
    }
}

impl Error for QuarryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for quarry operations.
pub type QuarryResult<T> = Result<T, QuarryError>;

impl From<regex::Error> for QuarryError {
    fn from(err: regex::Error) -> Self {
        QuarryError::new(
            &format!("Invalid regular expression: {}", err),
            ErrorKind::InvalidSpecification,
        )
    }
}

impl From<std::fmt::Error> for QuarryError {
    fn from(err: std::fmt::Error) -> Self {
        QuarryError::new(&format!("Formatting error: {}", err), ErrorKind::InternalError)
    }
}

/// Logs and builds an [ErrorKind::InvalidSpecification] error.
pub(crate) fn invalid_spec(message: &str) -> QuarryError {
    log::error!("{}", message);
    QuarryError::new(message, ErrorKind::InvalidSpecification)
}
