//! OAuth2 token lifecycle management.
//!
//! Builds authorization URLs, exchanges authorization codes, refreshes
//! and revokes tokens, and keeps the shared token store current. Token
//! endpoint calls go through an unauthenticated transport clone so a
//! stale Authorization header is never sent on the token request itself.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ChronoConfig;
use crate::errors::{AuthenticationError, ChronoError, ChronoResult, ConfigurationError};
use crate::observability::redact_token;
use crate::transport::ChronoTransport;

const AUTHORIZE_PATH: &str = "/o/authorize/";
const TOKEN_PATH: &str = "/o/token/";
const REVOKE_PATH: &str = "/o/revoke_token/";

/// Response from the provider's token endpoint.
///
/// Consumed immediately to update the token store; callers get the raw
/// values for their own persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token
    pub access_token: String,
    /// Refresh token, on grants that issue one
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Token type, `Bearer` in practice
    #[serde(default)]
    pub token_type: Option<String>,
    /// Space-separated scopes granted
    #[serde(default)]
    pub scope: Option<String>,
}

/// Manages the OAuth2 authorization-code flow against the provider.
#[derive(Debug, Clone)]
pub struct OAuth2Manager {
    config: Arc<ChronoConfig>,
    transport: ChronoTransport,
}

impl OAuth2Manager {
    /// Create a manager sharing the client's configuration.
    ///
    /// The given transport is downgraded to an unauthenticated clone for
    /// token endpoint calls.
    pub fn new(config: Arc<ChronoConfig>, transport: &ChronoTransport) -> Self {
        Self {
            config,
            transport: transport.unauthenticated(),
        }
    }

    /// Build the URL to send a user to for authorization.
    ///
    /// Pure URL construction, no network call. `scope` is the
    /// space-joined list, included only when non-empty; likewise `state`.
    pub fn authorization_url(&self, scopes: &[&str], state: Option<&str>) -> ChronoResult<String> {
        let (client_id, redirect_uri) =
            match (self.config.client_id(), self.config.redirect_uri()) {
                (Some(id), Some(uri)) => (id, uri),
                _ => {
                    return Err(AuthenticationError::MissingCredentials(
                        "client_id and redirect_uri are required".to_string(),
                    )
                    .into())
                }
            };

        let mut url = Url::parse(&self.config.build_url(AUTHORIZE_PATH))
            .map_err(|e| ConfigurationError::InvalidBaseUrl(e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("client_id", client_id);
            pairs.append_pair("redirect_uri", redirect_uri);
            pairs.append_pair("response_type", "code");
            if !scopes.is_empty() {
                pairs.append_pair("scope", &scopes.join(" "));
            }
            if let Some(state) = state.filter(|s| !s.is_empty()) {
                pairs.append_pair("state", state);
            }
        }

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens and store them.
    #[instrument(skip(self, code))]
    pub async fn exchange_authorization_code(&self, code: &str) -> ChronoResult<TokenResponse> {
        let (client_id, client_secret) = self.client_credentials()?;
        let redirect_uri = self
            .config
            .redirect_uri()
            .ok_or_else(|| {
                AuthenticationError::MissingCredentials("redirect_uri is required".to_string())
            })?
            .to_string();

        let fields = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            ("redirect_uri".to_string(), redirect_uri),
            ("client_id".to_string(), client_id),
            ("client_secret".to_string(), client_secret),
        ];

        self.request_token(fields).await
    }

    /// Obtain a fresh access token from a refresh token.
    ///
    /// Falls back to the stored refresh token when none is given.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(
        &self,
        refresh_token: Option<&str>,
    ) -> ChronoResult<TokenResponse> {
        let refresh = match refresh_token {
            Some(token) => token.to_string(),
            None => self
                .config
                .tokens()
                .refresh_token()
                .map(|t| t.expose_secret().to_string())
                .ok_or(AuthenticationError::MissingRefreshToken)?,
        };
        let (client_id, client_secret) = self.client_credentials()?;

        let fields = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh),
            ("client_id".to_string(), client_id),
            ("client_secret".to_string(), client_secret),
        ];

        self.request_token(fields).await
    }

    /// Revoke a token and clear the stored token state.
    ///
    /// Falls back to the stored access token when none is given. The
    /// provider's response body is ignored; any 2xx counts as revoked.
    #[instrument(skip(self, token))]
    pub async fn revoke_token(&self, token: Option<&str>) -> ChronoResult<()> {
        let token = match token {
            Some(t) => t.to_string(),
            None => self
                .config
                .tokens()
                .access_token()
                .map(|t| t.expose_secret().to_string())
                .ok_or(AuthenticationError::MissingToken)?,
        };
        let (client_id, client_secret) = self.client_credentials()?;

        let fields = vec![
            ("token".to_string(), token),
            ("client_id".to_string(), client_id),
            ("client_secret".to_string(), client_secret),
        ];

        self.transport
            .send_form_ignoring_body(REVOKE_PATH, fields)
            .await
            .map_err(wrap_token_failure)?;

        self.config.tokens().clear();
        debug!("Token revoked and cleared");
        Ok(())
    }

    /// Check that a usable access token is present, refreshing if needed.
    ///
    /// Returns `Ok(false)` when no access token is stored, or when an
    /// expired token's refresh fails with an authentication error (the
    /// failure is swallowed). Returns `Ok(true)` otherwise, without any
    /// network call when the stored token is still valid.
    #[instrument(skip(self))]
    pub async fn ensure_valid_token(&self) -> ChronoResult<bool> {
        let tokens = self.config.tokens();

        if !tokens.has_access_token() {
            return Ok(false);
        }

        if tokens.is_expired() && tokens.refresh_token().is_some() {
            return match self.refresh_access_token(None).await {
                Ok(_) => Ok(true),
                Err(ChronoError::Authentication(e)) => {
                    warn!(reason = %e, "Token refresh failed");
                    Ok(false)
                }
                Err(other) => Err(other),
            };
        }

        Ok(true)
    }

    fn client_credentials(&self) -> ChronoResult<(String, String)> {
        match (self.config.client_id(), self.config.client_secret()) {
            (Some(id), Some(secret)) => Ok((id.to_string(), secret.expose_secret().to_string())),
            _ => Err(AuthenticationError::MissingCredentials(
                "client_id and client_secret are required".to_string(),
            )
            .into()),
        }
    }

    async fn request_token(&self, fields: Vec<(String, String)>) -> ChronoResult<TokenResponse> {
        let value = self
            .transport
            .send_form(TOKEN_PATH, fields)
            .await
            .map_err(wrap_token_failure)?;

        let response = TokenResponse::deserialize(&value).map_err(|e| {
            wrap_token_failure(ChronoError::JsonParse {
                message: e.to_string(),
                body: value.to_string(),
            })
        })?;

        self.config.tokens().apply_tokens(
            &response.access_token,
            response.refresh_token.as_deref(),
            response.expires_in,
        );
        debug!(
            access_token = %redact_token(&response.access_token),
            expires_in = response.expires_in,
            "Token state updated"
        );

        Ok(response)
    }
}

/// Token endpoint failures surface uniformly, with the original error
/// kept as the source.
fn wrap_token_failure(source: ChronoError) -> ChronoError {
    AuthenticationError::TokenRequestFailed {
        message: source.to_string(),
        source: Box::new(source),
    }
    .into()
}
