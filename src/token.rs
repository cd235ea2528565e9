use crate::context::CallContext;
use crate::error::{AuthError, AwxError, Result};
use crate::transport::{Transport, TransportRequest};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Bearer token issued by the tokens endpoint.
///
/// `expires` is kept for callers; the client does not refresh tokens ahead
/// of expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(default)]
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Create a token without expiry information
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken {
            token: token.into(),
            expires: None,
        }
    }

    /// Whether the server-reported expiry is in the past
    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|expires| expires <= Utc::now())
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// Keeps the token value out of logs and panics.
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("expires", &self.expires)
            .finish()
    }
}

/// Username and password used for the token exchange
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Value for a basic `Authorization` header
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Lazily exchanges credentials for a bearer token and caches it for the
/// lifetime of the owning client.
///
/// The cache lock is held across the exchange, so concurrent first calls
/// wait for a single token request instead of racing.
pub struct Authenticator {
    token: Mutex<Option<AuthToken>>,
    credentials: Credentials,
    tokens_url: Url,
    agent: String,
}

impl Authenticator {
    /// Create an authenticator posting to `tokens_url`, optionally seeded
    /// with an existing token
    pub fn new(
        tokens_url: Url,
        credentials: Credentials,
        agent: String,
        token: Option<AuthToken>,
    ) -> Self {
        Authenticator {
            token: Mutex::new(token.filter(|t| !t.token.is_empty())),
            credentials,
            tokens_url,
            agent,
        }
    }

    /// Currently cached token, if any
    pub fn current(&self) -> Option<AuthToken> {
        self.lock().clone()
    }

    /// Return the cached token, fetching one first if none is held.
    ///
    /// Waiting for the lock is bounded by the exchange already in flight;
    /// the caller's deadline is checked again once the lock is held.
    pub fn ensure_token(&self, ctx: &CallContext, transport: &dyn Transport) -> Result<AuthToken> {
        let mut cached = self.lock();
        ctx.remaining()?;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.fetch(ctx, transport)?;
        *cached = Some(token.clone());
        Ok(token)
    }

    fn fetch(&self, ctx: &CallContext, transport: &dyn Transport) -> Result<AuthToken> {
        let timeout = ctx.remaining()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, header_value(&self.credentials.basic_auth())?);
        headers.insert(USER_AGENT, header_value(&self.agent)?);

        let request = TransportRequest {
            method: Method::POST,
            url: self.tokens_url.clone(),
            headers,
            body: None,
            timeout,
        };

        let response = match transport.execute(request) {
            Ok(response) => response,
            Err(AwxError::DeadlineExceeded) => return Err(AwxError::DeadlineExceeded),
            Err(err) => return Err(AuthError::Transport(Box::new(err)).into()),
        };

        if !response.is_success() {
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.text(),
            }
            .into());
        }

        let token: AuthToken = serde_json::from_slice(&response.body).map_err(|_| {
            AuthError::InvalidResponse {
                body: response.text(),
            }
        })?;
        if token.token.is_empty() {
            return Err(AuthError::EmptyToken {
                body: response.text(),
            }
            .into());
        }

        tracing::debug!(
            url = %self.tokens_url,
            expires = ?token.expires,
            "Obtained auth token"
        );
        Ok(token)
    }

    fn lock(&self) -> MutexGuard<'_, Option<AuthToken>> {
        // A poisoned cache still holds either nothing or a complete token.
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens_url", &self.tokens_url.as_str())
            .field("credentials", &self.credentials)
            .field("has_token", &self.lock().is_some())
            .finish()
    }
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AwxError::Configuration(format!("invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct FixedTransport {
        status: u16,
        body: &'static str,
        calls: AtomicUsize,
    }

    impl FixedTransport {
        fn new(status: u16, body: &'static str) -> Self {
            FixedTransport {
                status,
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Transport for FixedTransport {
        fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.method, Method::POST);
            assert_eq!(request.url.path(), "/api/v2/tokens/");
            assert_eq!(request.headers[AUTHORIZATION], "Basic YWRtaW46c2VjcmV0");
            assert_eq!(request.headers[CONTENT_TYPE], "application/json");
            assert!(request.body.is_none());
            Ok(TransportResponse::new(self.status, self.body))
        }
    }

    fn authenticator(token: Option<AuthToken>) -> Authenticator {
        Authenticator::new(
            Url::parse("http://awx.local/api/v2/tokens/").unwrap(),
            Credentials {
                username: "admin".to_string(),
                password: "secret".to_string(),
            },
            "test-agent".to_string(),
            token,
        )
    }

    #[test]
    fn test_basic_auth_header() {
        let credentials = Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };
        assert_eq!(credentials.basic_auth(), "Basic YWRtaW46c2VjcmV0");
    }

    #[test]
    fn test_token_fetched_once() {
        let transport = FixedTransport::new(
            201,
            r#"{"token":"abc","expires":"2099-01-01T00:00:00Z"}"#,
        );
        let auth = authenticator(None);
        let ctx = CallContext::background();

        let first = auth.ensure_token(&ctx, &transport).unwrap();
        let second = auth.ensure_token(&ctx, &transport).unwrap();

        assert_eq!(first.token, "abc");
        assert!(!first.is_expired());
        assert_eq!(first, second);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_seeded_token_skips_exchange() {
        let transport = FixedTransport::new(201, r#"{"token":"abc"}"#);
        let auth = authenticator(Some(AuthToken::new("seeded")));

        let token = auth.ensure_token(&CallContext::background(), &transport).unwrap();
        assert_eq!(token.bearer(), "Bearer seeded");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_token_is_auth_error() {
        let transport = FixedTransport::new(200, r#"{"token":""}"#);
        let auth = authenticator(None);

        let err = auth
            .ensure_token(&CallContext::background(), &transport)
            .unwrap_err();
        assert!(matches!(err, AwxError::Auth(AuthError::EmptyToken { .. })));
        assert!(auth.current().is_none());
    }

    #[test]
    fn test_invalid_token_body() {
        let transport = FixedTransport::new(200, "<html>");
        let err = authenticator(None)
            .ensure_token(&CallContext::background(), &transport)
            .unwrap_err();
        assert!(matches!(err, AwxError::Auth(AuthError::InvalidResponse { .. })));
    }

    #[test]
    fn test_rejected_credentials() {
        let transport = FixedTransport::new(401, r#"{"detail":"Invalid username/password."}"#);
        let err = authenticator(None)
            .ensure_token(&CallContext::background(), &transport)
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(err.is_auth());
    }

    #[test]
    fn test_expired_deadline_skips_exchange() {
        let transport = FixedTransport::new(201, r#"{"token":"abc"}"#);
        let ctx = CallContext::with_deadline(std::time::Instant::now());
        let err = authenticator(None).ensure_token(&ctx, &transport).unwrap_err();
        assert!(matches!(err, AwxError::DeadlineExceeded));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transport_failure_keeps_source() {
        struct RefusingTransport;

        impl Transport for RefusingTransport {
            fn execute(&self, _request: TransportRequest) -> Result<TransportResponse> {
                Err(AwxError::Other("connection refused".to_string()))
            }
        }

        let err = authenticator(None)
            .ensure_token(&CallContext::background(), &RefusingTransport)
            .unwrap_err();
        let AwxError::Auth(auth_err) = &err else {
            panic!("expected an auth error, got {:?}", err);
        };
        let AuthError::Transport(source) = auth_err else {
            panic!("expected a transport failure, got {:?}", auth_err);
        };
        assert!(matches!(source.as_ref(), AwxError::Other(msg) if msg == "connection refused"));
        assert!(std::error::Error::source(auth_err).is_some());
    }

    #[test]
    fn test_waiting_caller_honours_own_deadline() {
        struct SlowTransport {
            calls: AtomicUsize,
        }

        impl Transport for SlowTransport {
            fn execute(&self, _request: TransportRequest) -> Result<TransportResponse> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(300));
                Ok(TransportResponse::new(201, r#"{"token":"abc"}"#))
            }
        }

        let auth = Arc::new(authenticator(None));
        let transport = Arc::new(SlowTransport {
            calls: AtomicUsize::new(0),
        });

        let first = {
            let auth = Arc::clone(&auth);
            let transport = Arc::clone(&transport);
            thread::spawn(move || {
                auth.ensure_token(&CallContext::background(), transport.as_ref())
            })
        };

        thread::sleep(Duration::from_millis(50));
        let ctx = CallContext::with_timeout(Duration::from_millis(50));
        let err = auth.ensure_token(&ctx, transport.as_ref()).unwrap_err();
        assert!(matches!(err, AwxError::DeadlineExceeded));

        let token = first.join().unwrap().unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(auth.current(), Some(token));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AuthToken::new("super-secret");
        assert!(!format!("{:?}", token).contains("super-secret"));
    }
}
