//! Configuration management for the DrChrono client.
//!
//! Supports configuration via:
//! - Explicit values
//! - Environment variables
//! - Builder pattern
//!
//! OAuth2 token state lives in a [`TokenStore`] shared between the
//! transport (reader) and the OAuth2 manager (writer).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::{ChronoResult, ConfigurationError};

/// Seconds before the recorded expiry at which a token is treated as
/// expired, so requests never ride a token into its final moments.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

/// Current OAuth2 token material.
#[derive(Default)]
struct TokenState {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

/// Shared handle over the client's token state.
///
/// Cloning is cheap and every clone refers to the same state. Reads and
/// writes go through an internal lock; a refresh racing another refresh
/// is last-writer-wins, which is harmless since both writers hold
/// freshly issued tokens.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<TokenState>>,
}

impl TokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current access token
    pub fn access_token(&self) -> Option<SecretString> {
        self.inner.read().access_token.clone()
    }

    /// Get the current refresh token
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.inner.read().refresh_token.clone()
    }

    /// Get the recorded token expiry
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().expires_at
    }

    /// Whether an access token is present
    pub fn has_access_token(&self) -> bool {
        self.inner.read().access_token.is_some()
    }

    /// Whether the token is past its expiry minus the safety buffer.
    ///
    /// A token with no recorded expiry never reports expired.
    pub fn is_expired(&self) -> bool {
        match self.inner.read().expires_at {
            Some(expires_at) => {
                Utc::now() >= expires_at - chrono::Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS)
            }
            None => false,
        }
    }

    /// Apply a token endpoint response.
    ///
    /// The stored refresh token is preserved when the response omits one;
    /// likewise the recorded expiry when no `expires_in` is given.
    pub fn apply_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_in: Option<u64>,
    ) {
        let mut state = self.inner.write();
        state.access_token = Some(SecretString::new(access_token.to_string()));
        if let Some(refresh) = refresh_token {
            state.refresh_token = Some(SecretString::new(refresh.to_string()));
        }
        if let Some(secs) = expires_in {
            state.expires_at = Some(Utc::now() + chrono::Duration::seconds(secs as i64));
        }
    }

    /// Set the access token, e.g. when restoring a persisted session
    pub fn set_access_token(&self, token: &str) {
        self.inner.write().access_token = Some(SecretString::new(token.to_string()));
    }

    /// Set the refresh token
    pub fn set_refresh_token(&self, token: &str) {
        self.inner.write().refresh_token = Some(SecretString::new(token.to_string()));
    }

    /// Set the recorded expiry
    pub fn set_expires_at(&self, expires_at: Option<DateTime<Utc>>) {
        self.inner.write().expires_at = expires_at;
    }

    /// Drop all token material
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.access_token = None;
        state.refresh_token = None;
        state.expires_at = None;
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read();
        f.debug_struct("TokenStore")
            .field("access_token", &state.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &state.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &state.expires_at)
            .finish()
    }
}

/// Configuration for the DrChrono client
#[derive(Clone)]
pub struct ChronoConfig {
    /// Base URL for API and OAuth endpoints
    pub base_url: String,
    /// OAuth2 client ID
    pub(crate) client_id: Option<String>,
    /// OAuth2 client secret
    pub(crate) client_secret: Option<SecretString>,
    /// OAuth2 redirect URI
    pub(crate) redirect_uri: Option<String>,
    /// Shared token state
    pub(crate) tokens: TokenStore,
    /// Webhook signing secret
    pub(crate) webhook_secret: Option<SecretString>,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum retries on HTTP 429
    pub max_retries: u32,
    /// Sleep before a retry when the response carries no usable `Retry-After`
    pub retry_delay: Duration,
    /// Value for the `X-DRC-API-Version` header, omitted when unset
    pub api_version: Option<String>,
    /// User agent sent with every request
    pub user_agent: String,
    /// Emit debug-level request/response traces
    pub debug: bool,
}

impl std::fmt::Debug for ChronoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChronoConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.is_some())
            .field("redirect_uri", &self.redirect_uri)
            .field("tokens", &self.tokens)
            .field("webhook_secret", &self.webhook_secret.is_some())
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("api_version", &self.api_version)
            .field("user_agent", &self.user_agent)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Default for ChronoConfig {
    fn default() -> Self {
        Self {
            base_url: crate::DEFAULT_BASE_URL.to_string(),
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            tokens: TokenStore::new(),
            webhook_secret: None,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(crate::DEFAULT_CONNECT_TIMEOUT_SECS),
            max_retries: crate::DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(crate::DEFAULT_RETRY_DELAY_SECS),
            api_version: None,
            user_agent: format!("drchrono-client-rust/{}", env!("CARGO_PKG_VERSION")),
            debug: false,
        }
    }
}

impl ChronoConfig {
    /// Create a new configuration builder
    pub fn builder() -> ChronoConfigBuilder {
        ChronoConfigBuilder::new()
    }

    /// Create configuration from `DRCHRONO_*` environment variables
    pub fn from_env() -> ChronoResult<Self> {
        let mut builder = ChronoConfigBuilder::new();

        if let Ok(url) = std::env::var("DRCHRONO_BASE_URL") {
            builder = builder.base_url(&url);
        }
        if let Ok(id) = std::env::var("DRCHRONO_CLIENT_ID") {
            builder = builder.client_id(&id);
        }
        if let Ok(secret) = std::env::var("DRCHRONO_CLIENT_SECRET") {
            builder = builder.client_secret(&secret);
        }
        if let Ok(uri) = std::env::var("DRCHRONO_REDIRECT_URI") {
            builder = builder.redirect_uri(&uri);
        }
        if let Ok(token) = std::env::var("DRCHRONO_ACCESS_TOKEN") {
            builder = builder.access_token(&token);
        }
        if let Ok(token) = std::env::var("DRCHRONO_REFRESH_TOKEN") {
            builder = builder.refresh_token(&token);
        }
        if let Ok(secret) = std::env::var("DRCHRONO_WEBHOOK_SECRET") {
            builder = builder.webhook_secret(&secret);
        }
        if let Ok(version) = std::env::var("DRCHRONO_API_VERSION") {
            builder = builder.api_version(&version);
        }
        if let Ok(timeout) = std::env::var("DRCHRONO_TIMEOUT") {
            if let Ok(secs) = timeout.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(secs));
            }
        }
        if let Ok(retries) = std::env::var("DRCHRONO_MAX_RETRIES") {
            if let Ok(n) = retries.parse::<u32>() {
                builder = builder.max_retries(n);
            }
        }

        builder.build()
    }

    /// Get the OAuth2 client ID if configured
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Get the OAuth2 redirect URI if configured
    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// Get the OAuth2 client secret if configured
    pub(crate) fn client_secret(&self) -> Option<&SecretString> {
        self.client_secret.as_ref()
    }

    /// Get the webhook signing secret if configured
    pub(crate) fn webhook_secret(&self) -> Option<&SecretString> {
        self.webhook_secret.as_ref()
    }

    /// Get the shared token store
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Get the current access token, exposed for persistence
    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .access_token()
            .map(|t| t.expose_secret().to_string())
    }

    /// Get the recorded token expiry
    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.tokens.expires_at()
    }

    /// Whether the current token is past expiry minus the safety buffer
    pub fn is_token_expired(&self) -> bool {
        self.tokens.is_expired()
    }

    /// Build the full URL for an endpoint path
    pub fn build_url(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ChronoResult<()> {
        if self.base_url.is_empty() {
            return Err(ConfigurationError::InvalidBaseUrl("base URL is empty".to_string()).into());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(
                ConfigurationError::InvalidBaseUrl(format!("not an http(s) URL: {}", self.base_url))
                    .into(),
            );
        }
        if self.timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfiguration {
                message: "timeouts must be non-zero".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Builder for [`ChronoConfig`]
#[derive(Default)]
pub struct ChronoConfigBuilder {
    config: ChronoConfig,
}

impl ChronoConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: ChronoConfig::default(),
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, url: &str) -> Self {
        self.config.base_url = url.to_string();
        self
    }

    /// Set the OAuth2 client ID
    pub fn client_id(mut self, id: &str) -> Self {
        self.config.client_id = Some(id.to_string());
        self
    }

    /// Set the OAuth2 client secret
    pub fn client_secret(mut self, secret: &str) -> Self {
        self.config.client_secret = Some(SecretString::new(secret.to_string()));
        self
    }

    /// Set the OAuth2 redirect URI
    pub fn redirect_uri(mut self, uri: &str) -> Self {
        self.config.redirect_uri = Some(uri.to_string());
        self
    }

    /// Set an initial access token, e.g. restored from storage
    pub fn access_token(self, token: &str) -> Self {
        self.config.tokens.set_access_token(token);
        self
    }

    /// Set an initial refresh token
    pub fn refresh_token(self, token: &str) -> Self {
        self.config.tokens.set_refresh_token(token);
        self
    }

    /// Set the recorded expiry for a restored access token
    pub fn token_expires_at(self, expires_at: DateTime<Utc>) -> Self {
        self.config.tokens.set_expires_at(Some(expires_at));
        self
    }

    /// Set the webhook signing secret
    pub fn webhook_secret(mut self, secret: &str) -> Self {
        self.config.webhook_secret = Some(SecretString::new(secret.to_string()));
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the maximum retries on HTTP 429
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the fallback sleep used when a 429 has no usable `Retry-After`
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set the `X-DRC-API-Version` header value
    pub fn api_version(mut self, version: &str) -> Self {
        self.config.api_version = Some(version.to_string());
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.config.user_agent = user_agent.to_string();
        self
    }

    /// Enable debug-level request/response traces
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ChronoResult<ChronoConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the configuration without validation (for testing)
    pub fn build_unchecked(self) -> ChronoConfig {
        self.config
    }
}
