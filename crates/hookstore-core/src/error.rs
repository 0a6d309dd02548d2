//! Error types for hookstore
//!
//! Every failure a caller can observe is a variant of [`Error`]. Lower-layer
//! causes are kept as `#[source]` so the chain can be walked, and the
//! predicates on [`Error`] answer the common "which kind was it" questions.

use std::fmt;
use thiserror::Error;

/// Boxed cause for errors raised by collaborators (HTTP stack, auth decorators)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for hookstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hookstore
#[derive(Error, Debug)]
pub enum Error {
    /// An item (or removal request) had an empty identifier
    #[error("item ID cannot be empty")]
    ItemIdEmpty,

    /// An item had no data
    #[error("item data cannot be empty")]
    ItemDataEmpty,

    /// Construction-time configuration was rejected
    #[error("invalid configuration: {}", join_violations(.0))]
    InvalidConfig(Vec<ConfigViolation>),

    /// The outgoing request could not be built (bad method or URL)
    #[error("failed to build store request: {0}")]
    RequestBuild(#[source] BoxError),

    /// The configured auth decorator refused to decorate the request
    #[error("auth decoration failed: {0}")]
    AuthDecoration(#[source] BoxError),

    /// The request could not be executed (connect, DNS, timeout)
    #[error("store request execution failed: {0}")]
    Transport(#[source] BoxError),

    /// The response arrived but its body could not be drained
    #[error("failed to read store response body: {0}")]
    ReadBody(#[source] BoxError),

    /// The store answered with a non-success status code
    #[error("store responded with status {status}: {class}")]
    Status {
        /// Numeric HTTP status
        status: u16,
        /// Classification of the status
        class: StatusClass,
    },

    /// An item could not be serialized for the store
    #[error("failed to encode item: {0}")]
    Encode(#[source] serde_json::Error),

    /// The store's response body could not be decoded
    #[error("failed to decode store response: {0}")]
    Decode(#[source] serde_json::Error),

    /// `start` was called on a poller that is not stopped
    #[error("listener is not stopped")]
    ListenerNotStopped,

    /// `stop` was called on a poller that is not running
    #[error("listener is not running")]
    ListenerNotRunning,

    /// `start` was called outside of a tokio runtime
    #[error("no tokio runtime available to run the poll loop")]
    RuntimeUnavailable,
}

impl Error {
    /// Create a request construction error
    pub fn request_build(err: impl Into<BoxError>) -> Self {
        Self::RequestBuild(err.into())
    }

    /// Create an auth decoration error
    pub fn auth_decoration(err: impl Into<BoxError>) -> Self {
        Self::AuthDecoration(err.into())
    }

    /// Create a transport execution error
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Create a body read error
    pub fn read_body(err: impl Into<BoxError>) -> Self {
        Self::ReadBody(err.into())
    }

    /// Create a status error, classifying the code
    pub fn status(status: u16) -> Self {
        Self::Status {
            status,
            class: StatusClass::from_status(status),
        }
    }

    /// Create a configuration error from a single violation
    pub fn config(violation: ConfigViolation) -> Self {
        Self::InvalidConfig(vec![violation])
    }

    /// HTTP status carried by this error, if it came from the store
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Status classification carried by this error, if any
    pub fn status_class(&self) -> Option<StatusClass> {
        match self {
            Self::Status { class, .. } => Some(*class),
            _ => None,
        }
    }

    /// True if the store rejected the caller's credentials (401/403)
    pub fn is_authentication_failed(&self) -> bool {
        self.status_class() == Some(StatusClass::AuthenticationFailed)
    }

    /// True if the store rejected the request as malformed (400)
    pub fn is_bad_request(&self) -> bool {
        self.status_class() == Some(StatusClass::BadRequest)
    }

    /// True for input checks that fail before any network call
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::ItemIdEmpty | Self::ItemDataEmpty)
    }

    /// True if the store could not be reached or its answer not read
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::ReadBody(_))
    }

    /// True for JSON encode/decode failures
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Encode(_) | Self::Decode(_))
    }

    /// Configuration violations, if this is a configuration error
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            Self::InvalidConfig(violations) => violations,
            _ => &[],
        }
    }
}

/// Classification of a non-success store status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// 400
    BadRequest,
    /// 401 or 403
    AuthenticationFailed,
    /// Any other non-2xx code
    NonSuccess,
}

impl StatusClass {
    /// Classify a status code. Callers only route non-2xx codes here.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 | 403 => Self::AuthenticationFailed,
            _ => Self::NonSuccess,
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => f.write_str("bad request"),
            Self::AuthenticationFailed => f.write_str("failed to authenticate"),
            Self::NonSuccess => f.write_str("non-success response"),
        }
    }
}

/// One reason a configuration was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    /// The poller has no listener to notify
    MissingListener,
    /// The poller has no source to fetch items from
    MissingFetcher,
    /// Store address is empty
    EmptyAddress,
    /// Store address is not an absolute http(s) URL
    InvalidAddress(String),
    /// Store bucket is empty
    EmptyBucket,
    /// Request timeout is zero
    ZeroTimeout,
    /// Poll counter name is empty
    EmptyMetricName,
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingListener => f.write_str("no listener provided"),
            Self::MissingFetcher => f.write_str("no item fetcher provided"),
            Self::EmptyAddress => f.write_str("store address cannot be empty"),
            Self::InvalidAddress(addr) => write!(f, "store address is not a valid http(s) URL: {addr}"),
            Self::EmptyBucket => f.write_str("store bucket cannot be empty"),
            Self::ZeroTimeout => f.write_str("request timeout must be > 0"),
            Self::EmptyMetricName => f.write_str("poll counter name cannot be empty"),
        }
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
