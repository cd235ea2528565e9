use crate::error::{AwxError, Result};
use crate::transport::{ReqwestTransport, Transport};
use reqwest::blocking::ClientBuilder;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_AGENT: &str = "awx-rust-client";

pub const ENDPOINT_ENV: &str = "AWX_ENDPOINT";
pub const TOKEN_ENV: &str = "AWX_TOKEN";
pub const USERNAME_ENV: &str = "AWX_USERNAME";
pub const PASSWORD_ENV: &str = "AWX_PASSWORD";
pub const AGENT_ENV: &str = "AWX_USER_AGENT";
pub const INSECURE_ENV: &str = "AWX_INSECURE";
pub const VERSION_ENV: &str = "AWX_VERSION";

/// Create the default blocking transport.
///
/// The builder's default 30 second overall timeout is disabled; per-call
/// deadlines come from the [`CallContext`](crate::CallContext) only.
pub fn create_transport(insecure_skip_verify: bool) -> Result<ReqwestTransport> {
    let client = ClientBuilder::new()
        .timeout(None)
        .connect_timeout(Duration::from_secs(10))
        .danger_accept_invalid_certs(insecure_skip_verify)
        .build()
        .map_err(|e| AwxError::Configuration(format!("failed to create HTTP client: {}", e)))?;
    Ok(ReqwestTransport::new(client))
}

/// Configuration for the AWX client
#[derive(Clone)]
pub struct Config {
    /// Base URL of the API, e.g. `https://awx.example.com/api/v2/`
    pub endpoint: String,
    /// Transport override; a `reqwest` transport is built when absent
    pub transport: Option<Arc<dyn Transport>>,
    /// Pre-issued bearer token
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// User agent header value
    pub agent: String,
    /// Skip TLS certificate verification for the default transport
    pub insecure_skip_verify: bool,
    /// Informational API version
    pub version: Option<String>,
    /// Deadline applied to calls made with a context that has none
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: String::new(),
            transport: None,
            token: None,
            username: None,
            password: None,
            agent: DEFAULT_AGENT.to_string(),
            insecure_skip_verify: false,
            version: None,
            timeout: None,
        }
    }
}

impl Config {
    /// Create a new configuration for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Config {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Build a configuration from `AWX_*` environment variables.
    ///
    /// `AWX_ENDPOINT` is required; `AWX_TOKEN`, `AWX_USERNAME`,
    /// `AWX_PASSWORD`, `AWX_USER_AGENT`, `AWX_INSECURE` and `AWX_VERSION`
    /// are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let endpoint = get(ENDPOINT_ENV).ok_or_else(|| {
            AwxError::Configuration(format!("{} is not set", ENDPOINT_ENV))
        })?;

        let mut config = Config::new(endpoint);
        config.token = get(TOKEN_ENV);
        config.username = get(USERNAME_ENV);
        config.password = get(PASSWORD_ENV);
        config.version = get(VERSION_ENV);
        if let Some(agent) = get(AGENT_ENV) {
            config.agent = agent;
        }
        config.insecure_skip_verify = get(INSECURE_ENV)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(config)
    }

    /// Use a custom transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a pre-issued bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the credentials used to obtain a token
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the user agent
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    /// Skip TLS certificate verification
    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Set the informational API version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the default per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("custom_transport", &self.transport.is_some())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("agent", &self.agent)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("version", &self.version)
            .field("timeout", &self.timeout)
            .finish()
    }
}
