use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error kind that represents failures reported by the [`crate::Client`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ErrorKind {
    /// No error occurred.
    NoError,
    /// Initialization of the internal HTTP client failed.
    HttpClientInitFailure,
    /// The evaluation failed because the config JSON was not available locally.
    ConfigJsonNotAvailable = 1000,
    /// The evaluation failed because the key of the evaluated setting was not found in the config JSON.
    SettingKeyMissing = 1001,
    /// The evaluation failed for a reason other than a missing key or type mismatch.
    EvaluationFailure = 1002,
    /// An HTTP response indicating an invalid SDK Key was received (403 Forbidden or 404 Not Found).
    InvalidSdkKey = 1100,
    /// Invalid HTTP response was received (unexpected HTTP status code).
    UnexpectedHttpResponse = 1101,
    /// The HTTP request timed out.
    HttpRequestTimeout = 1102,
    /// The HTTP request failed (most likely, due to a local network issue).
    HttpRequestFailure = 1103,
    /// Redirection loop encountered while trying to fetch config JSON.
    RedirectLoop = 1104,
    /// An invalid HTTP response was received (200 OK with an invalid content).
    InvalidHttpResponseContent = 1105,
    /// An invalid HTTP response was received (304 Not Modified when no config JSON was cached locally).
    InvalidHttpResponseWhenLocalCacheIsEmpty = 1106,
    /// Reading the external cache failed.
    CacheReadFailure = 2200,
    /// Writing the external cache failed.
    CacheWriteFailure = 2201,
    /// The evaluation failed because of a type mismatch between the evaluated setting value and the specified default value.
    SettingValueTypeMismatch = 2002,
    /// The client is in offline mode, it cannot initiate HTTP requests.
    OfflineClient = 3200,
    /// `Client::wait_for_ready` timed out before the initial config acquisition finished.
    ClientInitTimedOut = 3201,
}

impl ErrorKind {
    pub(crate) fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Error struct that holds the [`ErrorKind`] and message of the reported failure.
#[derive(Debug, PartialEq)]
pub struct ClientError {
    /// Error kind that represents failures reported by the [`crate::Client`].
    pub kind: ErrorKind,
    /// The text representation of the failure.
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: ErrorKind, message: String) -> Self {
        Self { message, kind }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_str())
    }
}

impl Error for ClientError {}

/// Internal parse/decode failure, confined to the config-model and cache layers.
/// Always surfaces to callers wrapped in a [`ClientError`] (see [`ErrorKind::ConfigJsonNotAvailable`]
/// and [`ErrorKind::InvalidHttpResponseContent`]), never directly.
#[derive(Debug)]
pub(crate) enum InternalError {
    Parse(String),
}

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InternalError::Parse(msg) => write!(f, "JSON parsing failed. ({msg})"),
        }
    }
}

impl Error for InternalError {}
