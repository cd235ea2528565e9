use crate::error::{AwxError, Result};
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::fmt;
use std::time::Duration;
use url::Url;

/// A fully built HTTP request handed to a [`Transport`]
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Time left before the caller's deadline, if it set one
    pub timeout: Option<Duration>,
}

/// Response returned by a [`Transport`], with the body fully read
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        TransportResponse {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Anything able to execute an HTTP request.
///
/// Implementations must honour `request.timeout` and read the whole body
/// before returning. The client ships with [`ReqwestTransport`]; tests and
/// embedders can supply their own.
pub trait Transport: Send + Sync {
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Blocking transport backed by `reqwest`
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wrap an existing `reqwest` blocking client
    pub fn new(client: Client) -> Self {
        ReqwestTransport { client }
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(map_timeout(request.timeout))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(map_timeout(request.timeout))?;

        Ok(TransportResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

// A timeout only means the caller's deadline ran out when the caller set one.
fn map_timeout(timeout: Option<Duration>) -> impl Fn(reqwest::Error) -> AwxError {
    move |err| {
        if timeout.is_some() && err.is_timeout() {
            AwxError::DeadlineExceeded
        } else {
            AwxError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_response_helpers() {
        let response = TransportResponse::new(204, Vec::new());
        assert!(response.is_success());
        assert_eq!(response.text(), "");

        let response = TransportResponse::new(404, "missing");
        assert!(!response.is_success());
        assert_eq!(response.text(), "missing");
    }
}
