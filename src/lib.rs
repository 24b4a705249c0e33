//! DrChrono API Client
//!
//! Production-ready DrChrono API client with:
//! - OAuth2 authorization-code flow (exchange, refresh, revoke)
//! - Rate-limit aware retries honoring `Retry-After`
//! - Typed error taxonomy covering the provider's failure modes
//! - Webhook HMAC and JWT verification
//! - Resource services (patients, appointments, billing, documents, etc.)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use drchrono_client::pagination::ListParams;
//! use drchrono_client::services::PatientsServiceTrait;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client from environment
//!     let client = drchrono_client::create_client_from_env()?;
//!
//!     // Refresh the access token if it is about to expire
//!     client.oauth().ensure_valid_token().await?;
//!
//!     // List patients
//!     let page = client.patients().list(ListParams::new().page_size(20)).await?;
//!     for patient in &page {
//!         println!("{}", patient["id"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `rustls-tls` - TLS via rustls (default)
//! - `native-tls` - TLS via the platform's native stack

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Core modules
pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod transport;

// Services
pub mod pagination;
pub mod services;

// Webhooks
pub mod webhooks;

// Observability
pub mod observability;

// Re-exports for convenience
pub use client::DrChronoClient;
pub use config::{ChronoConfig, ChronoConfigBuilder};
pub use errors::{ChronoError, ChronoResult};
pub use webhooks::{WebhookEvent, WebhookVerifier};

/// Default base URL for the DrChrono API
pub const DEFAULT_BASE_URL: &str = "https://drchrono.com";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default maximum retries for rate-limited requests
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default retry delay in seconds when `Retry-After` is absent
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 1;

/// Create a DrChrono client with the given configuration
pub fn create_client(config: ChronoConfig) -> ChronoResult<DrChronoClient> {
    DrChronoClient::new(config)
}

/// Create a DrChrono client from environment variables
///
/// Reads:
/// - `DRCHRONO_BASE_URL` - API base URL (defaults to production)
/// - `DRCHRONO_CLIENT_ID` - OAuth2 client ID
/// - `DRCHRONO_CLIENT_SECRET` - OAuth2 client secret
/// - `DRCHRONO_REDIRECT_URI` - OAuth2 redirect URI
/// - `DRCHRONO_ACCESS_TOKEN` - Existing access token
/// - `DRCHRONO_REFRESH_TOKEN` - Existing refresh token
/// - `DRCHRONO_WEBHOOK_SECRET` - Webhook verification secret
/// - `DRCHRONO_API_VERSION` - Pinned API version header value
/// - `DRCHRONO_TIMEOUT` - Request timeout in seconds
/// - `DRCHRONO_MAX_RETRIES` - Maximum rate-limit retries
pub fn create_client_from_env() -> ChronoResult<DrChronoClient> {
    let config = ChronoConfig::from_env()?;
    create_client(config)
}
