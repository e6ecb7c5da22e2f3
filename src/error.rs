//! Error types shared by the form state, the HTTP client and the savers.

use std::fmt;
use std::path::PathBuf;

/// Message shown when a ticker-based action is started with a blank ticker.
pub const TICKER_REQUIRED: &str = "Please enter a ticker symbol";

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by the controller.
#[derive(Debug)]
pub enum Error {
    /// The request never started: bad input or another action in flight
    Form(FormError),
    /// The backend call failed
    Api(ApiError),
    /// The response arrived but could not be saved
    Save(SaveError),
}

impl Error {
    /// Message supplied by the server in its `error` field, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Api(e) => e.server_message(),
            _ => None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Form(e) => Some(e),
            Error::Api(e) => Some(e),
            Error::Save(e) => Some(e),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Form(e) => write!(f, "{e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Save(e) => write!(f, "Save error: {e}"),
        }
    }
}

impl From<FormError> for Error {
    fn from(err: FormError) -> Self {
        Error::Form(err)
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(err)
    }
}

impl From<SaveError> for Error {
    fn from(err: SaveError) -> Self {
        Error::Save(err)
    }
}

/// Rejected edits and actions. None of these send a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Row index outside the current table
    RowIndex { index: usize, len: usize },
    /// Field name other than name, email or age
    UnknownField(String),
    /// Ticker empty after trimming
    EmptyTicker,
    /// An action is already loading
    Busy,
}

impl std::error::Error for FormError {}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::RowIndex { index, len } => {
                write!(f, "Row index {index} out of range for {len} rows")
            }
            FormError::UnknownField(name) => write!(f, "Unknown field: {name}"),
            FormError::EmptyTicker => f.write_str(TICKER_REQUIRED),
            FormError::Busy => f.write_str("Another request is still in progress"),
        }
    }
}

/// Failures talking to the backend.
#[derive(Debug)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, bad body
    Http(reqwest::Error),
    /// Non-2xx response, with the body's `error` field when it had one
    Status { status: u16, message: Option<String> },
    /// 2xx response whose JSON body carried an `error` field
    Server(String),
    /// 2xx ratio response with neither data nor an error message
    MissingData,
    /// JSON response that did not match the expected shape
    Json(serde_json::Error),
}

impl ApiError {
    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => Some(message),
            ApiError::Server(message) => Some(message),
            _ => None,
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Http(e) => Some(e),
            ApiError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Http(e) => write!(f, "HTTP error: {e}"),
            ApiError::Status {
                status,
                message: Some(message),
            } => write!(f, "server returned {status}: {message}"),
            ApiError::Status {
                status,
                message: None,
            } => write!(f, "server returned {status}"),
            ApiError::Server(message) => write!(f, "server error: {message}"),
            ApiError::MissingData => write!(f, "response had no data"),
            ApiError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Json(err)
    }
}

/// A downloaded file could not be written.
#[derive(Debug)]
pub struct SaveError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to write {}: {}", self.path.display(), self.source)
    }
}
