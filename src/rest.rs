use crate::client::{create_transport, Config};
use crate::context::CallContext;
use crate::error::{AwxError, Result};
use crate::key::ResourceKey;
use crate::query;
use crate::response::{normalize_error, PingOutput};
use crate::token::{header_value, AuthToken, Authenticator, Credentials};
use crate::transport::{Transport, TransportRequest};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

const PING_PATH: &str = "ping/";
const TOKENS_PATH: &str = "tokens/";

const DEFAULT_GET_STATUSES: &[u16] = &[200];
const DEFAULT_CREATE_STATUSES: &[u16] = &[201];
const DEFAULT_UPDATE_STATUSES: &[u16] = &[200];
const DEFAULT_DELETE_STATUSES: &[u16] = &[204];

/// Client for the AWX REST API.
///
/// Every operation takes a [`CallContext`] and a set of acceptable status
/// codes; an empty slice selects the operation's default. The client is
/// `Send + Sync` and can be shared behind an `Arc`.
pub struct Client {
    base_url: Url,
    transport: Arc<dyn Transport>,
    auth: Authenticator,
    agent: String,
    version: Option<String>,
    timeout: Option<std::time::Duration>,
}

impl Client {
    /// Create a client, validating the endpoint eagerly
    pub fn new(config: Config) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(AwxError::Configuration("the endpoint is mandatory".to_string()));
        }
        let base_url = Url::parse(&config.endpoint).map_err(|e| {
            AwxError::Configuration(format!("the URL '{}' isn't valid: {}", config.endpoint, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AwxError::Configuration(format!(
                "the URL '{}' cannot be used as a base URL",
                config.endpoint
            )));
        }

        let transport: Arc<dyn Transport> = match config.transport {
            Some(transport) => transport,
            None => Arc::new(create_transport(config.insecure_skip_verify)?),
        };

        let agent = if config.agent.is_empty() {
            crate::client::DEFAULT_AGENT.to_string()
        } else {
            config.agent
        };
        // Reject agents that can never be sent before the first call.
        header_value(&agent)?;

        let credentials = Credentials {
            username: config.username.unwrap_or_default(),
            password: config.password.unwrap_or_default(),
        };
        let auth = Authenticator::new(
            join(&base_url, TOKENS_PATH, None),
            credentials,
            agent.clone(),
            config.token.map(AuthToken::new),
        );

        Ok(Client {
            base_url,
            transport,
            auth,
            agent,
            version: config.version,
            timeout: config.timeout,
        })
    }

    /// Base URL requests are resolved against
    pub fn endpoint(&self) -> &Url {
        &self.base_url
    }

    /// Configured API version, if any
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Token currently held by the client
    pub fn token(&self) -> Option<AuthToken> {
        self.auth.current()
    }

    /// Obtain a token now instead of on the first resource call
    pub fn authenticate(&self, ctx: &CallContext) -> Result<AuthToken> {
        let ctx = self.effective(ctx);
        self.auth.ensure_token(&ctx, self.transport.as_ref())
    }

    /// Execute a request against `path` and return the raw body when the
    /// status is acceptable.
    ///
    /// `path` is always resolved below the configured base URL; a leading
    /// slash is ignored. Acquires a token first if none is held. Headers are
    /// set by the dispatcher only. Non-acceptable statuses are turned into
    /// [`AwxError::Request`].
    pub fn dispatch(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        statuses: &[u16],
    ) -> Result<Vec<u8>> {
        let url = join(&self.base_url, path.trim_start_matches('/'), None);
        self.execute(ctx, method, url, body, statuses)
    }

    fn execute(
        &self,
        ctx: &CallContext,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        statuses: &[u16],
    ) -> Result<Vec<u8>> {
        let ctx = self.effective(ctx);
        let token = self.auth.ensure_token(&ctx, self.transport.as_ref())?;
        self.send(&ctx, method, url, body, statuses, Some(&token))
    }

    fn send(
        &self,
        ctx: &CallContext,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        statuses: &[u16],
        token: Option<&AuthToken>,
    ) -> Result<Vec<u8>> {
        let timeout = ctx.remaining()?;

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(AUTHORIZATION, header_value(&token.bearer())?);
        }
        headers.insert(USER_AGENT, header_value(&self.agent)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = TransportRequest {
            method: method.clone(),
            url: url.clone(),
            headers,
            body,
            timeout,
        };

        let start = Instant::now();
        let response = self.transport.execute(request)?;

        tracing::debug!(
            method = %method,
            url = %url,
            status = response.status,
            latency_ms = start.elapsed().as_millis() as u64,
            "AWX request completed"
        );

        if !statuses.contains(&response.status) {
            return Err(normalize_error(response.status, &response.body).into());
        }
        Ok(response.body)
    }

    /// Retrieve server information from the ping endpoint.
    ///
    /// Does not acquire a token; one is sent only if already held.
    pub fn ping(&self, ctx: &CallContext) -> Result<PingOutput> {
        let ctx = self.effective(ctx);
        let token = self.auth.current();
        let body = self.send(
            &ctx,
            Method::GET,
            join(&self.base_url, PING_PATH, None),
            None,
            DEFAULT_GET_STATUSES,
            token.as_ref(),
        )?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch a single object
    pub fn get<T>(&self, ctx: &CallContext, key: &ResourceKey, statuses: &[u16]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(key, None);
        let body = self.execute(
            ctx,
            Method::GET,
            url,
            None,
            or_default(statuses, DEFAULT_GET_STATUSES),
        )?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch a collection, filtered by `options`.
    ///
    /// `options` is encoded with [`query::encode`]; pass `&()` for none.
    /// `T` is usually a [`ListEnvelope`](crate::ListEnvelope).
    pub fn list<T, O>(
        &self,
        ctx: &CallContext,
        key: &ResourceKey,
        options: &O,
        statuses: &[u16],
    ) -> Result<T>
    where
        T: DeserializeOwned,
        O: Serialize + ?Sized,
    {
        let pairs = query::encode(options)?;
        let url = self.url_for(key, Some(&pairs));
        let body = self.execute(
            ctx,
            Method::GET,
            url,
            None,
            or_default(statuses, DEFAULT_GET_STATUSES),
        )?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Create an object, replacing `obj` with the server's representation
    pub fn create<T>(
        &self,
        ctx: &CallContext,
        key: &ResourceKey,
        obj: &mut T,
        statuses: &[u16],
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.write(ctx, Method::POST, key, obj, or_default(statuses, DEFAULT_CREATE_STATUSES))
    }

    /// Partially update an object, replacing `obj` with the server's
    /// representation
    pub fn update<T>(
        &self,
        ctx: &CallContext,
        key: &ResourceKey,
        obj: &mut T,
        statuses: &[u16],
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.write(ctx, Method::PATCH, key, obj, or_default(statuses, DEFAULT_UPDATE_STATUSES))
    }

    /// Delete an object
    pub fn delete(&self, ctx: &CallContext, key: &ResourceKey, statuses: &[u16]) -> Result<()> {
        let url = self.url_for(key, None);
        self.execute(
            ctx,
            Method::DELETE,
            url,
            None,
            or_default(statuses, DEFAULT_DELETE_STATUSES),
        )?;
        Ok(())
    }

    fn write<T>(
        &self,
        ctx: &CallContext,
        method: Method,
        key: &ResourceKey,
        obj: &mut T,
        statuses: &[u16],
    ) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let payload = serde_json::to_vec(obj)?;
        let url = self.url_for(key, None);
        let body = self.execute(ctx, method, url, Some(payload), statuses)?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
        *obj = serde_json::from_slice(&body)?;
        Ok(())
    }

    fn url_for(&self, key: &ResourceKey, query: Option<&[(String, String)]>) -> Url {
        join(&self.base_url, &key.path(), query)
    }

    fn effective(&self, ctx: &CallContext) -> CallContext {
        match (ctx.deadline(), self.timeout) {
            (None, Some(timeout)) => CallContext::with_timeout(timeout),
            _ => *ctx,
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .field("agent", &self.agent)
            .field("version", &self.version)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn or_default<'a>(statuses: &'a [u16], default: &'a [u16]) -> &'a [u16] {
    if statuses.is_empty() {
        default
    } else {
        statuses
    }
}

/// Append a relative path to the base URL's path.
fn join(base: &Url, path: &str, query: Option<&[(String, String)]>) -> Url {
    let mut url = base.clone();
    let joined = format!("{}/{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_query(None);
    url.set_fragment(None);
    if let Some(pairs) = query.filter(|p| !p.is_empty()) {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}
