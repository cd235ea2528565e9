use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// Prefix of the synthesized message used when an error body is not a
/// usable error envelope.
pub const UNEXPECTED_ERROR_PREFIX: &str = "unexpected error response: ";

/// Paged list response returned by collection endpoints.
///
/// Generic over the item type; decode a `GET` on a collection straight into
/// `ListEnvelope<YourType>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    /// Total number of items matching the query
    #[serde(default)]
    pub count: u64,

    /// Link to the next page, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// Link to the previous page, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,

    /// Items on this page
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Default for ListEnvelope<T> {
    fn default() -> Self {
        ListEnvelope {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

impl<T> ListEnvelope<T> {
    /// Whether the server reported a following page
    pub fn has_next(&self) -> bool {
        self.next.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Output of the ping endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PingOutput {
    pub version: String,
    pub active_node: String,
    pub install_uuid: String,
}

/// Structured error body: `{"__all__": ["message", ...]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "__all__", default)]
    pub all: Option<Vec<String>>,
}

/// Turn a rejected response into an [`ApiError`].
///
/// The server's `__all__` messages are used verbatim when present and
/// non-empty; otherwise the raw body is wrapped in a single message.
pub fn normalize_error(status: u16, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            all: Some(messages),
        }) if !messages.is_empty() => ApiError::new(status, messages),
        _ => ApiError::new(
            status,
            vec![format!(
                "{}{}",
                UNEXPECTED_ERROR_PREFIX,
                String::from_utf8_lossy(body)
            )],
        ),
    }
}
