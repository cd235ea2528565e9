use thiserror::Error;

/// Error reported by the API for a status outside the acceptable set.
///
/// `messages` is either the server's `__all__` list, in order, or a single
/// synthesized `"unexpected error response: <body>"` entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status: {status}, messages: {}", .messages.join(", "))]
pub struct ApiError {
    /// HTTP status code of the response
    pub status: u16,
    /// Human readable messages
    pub messages: Vec<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: u16, messages: Vec<String>) -> Self {
        ApiError { status, messages }
    }

    /// All messages joined into a single line
    pub fn message(&self) -> String {
        self.messages.join(", ")
    }
}

/// Failure while exchanging credentials for a bearer token
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token request never produced a response
    #[error("token request failed: {0}")]
    Transport(#[source] Box<AwxError>),

    /// The token endpoint answered with a non-success status
    #[error("token request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint answered with something that is not a token document
    #[error("error obtaining auth token: {body}")]
    InvalidResponse { body: String },

    /// The token endpoint answered successfully but without a token
    #[error("error obtaining auth token: empty token in response: {body}")]
    EmptyToken { body: String },
}

/// Main error type for AWX API operations
#[derive(Debug, Error)]
pub enum AwxError {
    /// Invalid or incomplete client configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token acquisition failed
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Status code outside the acceptable set
    #[error("{0}")]
    Request(#[from] ApiError),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    /// IO error raised by a transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The call context deadline elapsed before the call completed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl AwxError {
    /// Get the HTTP status code if the server produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AwxError::Request(err) => Some(err.status),
            AwxError::Auth(AuthError::Rejected { status, .. }) => Some(*status),
            AwxError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Messages reported by the server, empty for non-API errors
    pub fn messages(&self) -> &[String] {
        match self {
            AwxError::Request(err) => &err.messages,
            _ => &[],
        }
    }

    /// Check if this error is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwxError::Request(ApiError { status: 404, .. }))
    }

    /// Check if this error is an unauthorized error (401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AwxError::Request(ApiError { status: 401, .. }))
    }

    /// Check if this error comes from token acquisition
    pub fn is_auth(&self) -> bool {
        matches!(self, AwxError::Auth(_))
    }
}

/// Result type for AWX operations
pub type Result<T> = std::result::Result<T, AwxError>;
