//! Error types for the DrChrono client.
//!
//! Maps HTTP responses and token-flow failures onto a flat kind taxonomy
//! so callers can catch by kind and branch (surface 400 field errors,
//! re-authenticate on 401, back off on 429).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Result type for DrChrono operations
pub type ChronoResult<T> = Result<T, ChronoError>;

/// Root error type for the DrChrono client
#[derive(Error, Debug)]
pub enum ChronoError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Authentication or token-flow error
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Rate limited after exhausting retries
    #[error("Rate limited (HTTP 429), retry after {}s", retry_after.as_secs())]
    RateLimit {
        /// Last `Retry-After` value the provider sent
        retry_after: Duration,
        /// Raw response body, if any
        body: Option<Value>,
    },

    /// Request rejected with HTTP 400
    #[error("Validation failed: {message}")]
    Validation {
        /// Error message from the response body
        message: String,
        /// Per-field validation errors from the body's `errors` object
        field_errors: HashMap<String, Vec<String>>,
        /// Raw response body
        body: Option<Value>,
    },

    /// Other non-2xx API response
    #[error("[{kind}] {message}")]
    Api {
        /// Kind derived from the HTTP status
        kind: ApiErrorKind,
        /// Error message
        message: String,
        /// HTTP status code
        status_code: u16,
        /// Raw response body, if any
        body: Option<Value>,
    },

    /// Transport-level failure, no response received
    #[error("HTTP request failed: {message}")]
    Http {
        /// Description of the failure
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 2xx response whose body was not valid JSON
    #[error("Failed to parse response JSON: {message}")]
    JsonParse {
        /// Parser message
        message: String,
        /// Raw response body text
        body: String,
    },

    /// Webhook signature or JWT verification failure
    #[error(transparent)]
    WebhookVerification(#[from] WebhookVerificationError),
}

impl ChronoError {
    /// Get the stable kind string for this error
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Authentication(e) => e.kind(),
            Self::RateLimit { .. } => "rate_limit",
            Self::Validation { .. } => "validation_error",
            Self::Api { kind, .. } => kind.as_str(),
            Self::Http { .. } => "http_error",
            Self::JsonParse { .. } => "json_parse_error",
            Self::WebhookVerification(_) => "webhook_verification_error",
        }
    }

    /// Get the HTTP status code if this error came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RateLimit { .. } => Some(429),
            Self::Validation { .. } => Some(400),
            Self::Api { status_code, .. } => Some(*status_code),
            Self::Authentication(AuthenticationError::Unauthorized { .. }) => Some(401),
            _ => None,
        }
    }

    /// Get the raw response body if one was captured
    pub fn response_body(&self) -> Option<&Value> {
        match self {
            Self::RateLimit { body, .. }
            | Self::Validation { body, .. }
            | Self::Api { body, .. } => body.as_ref(),
            Self::Authentication(AuthenticationError::Unauthorized { body, .. }) => body.as_ref(),
            _ => None,
        }
    }

    /// Get per-field validation errors from a 400 response
    pub fn validation_errors(&self) -> Option<&HashMap<String, Vec<String>>> {
        match self {
            Self::Validation { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }

    /// Get the retry-after duration if applicable
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Check if this error is worth retrying at the caller's level
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit { .. }
                | Self::Api {
                    kind: ApiErrorKind::ServerError,
                    ..
                }
        )
    }
}

/// Kinds for non-2xx responses outside the 400/401/429 special cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Resource not found (404)
    NotFound,
    /// Access forbidden (403)
    Forbidden,
    /// Payment required (402)
    PaymentRequired,
    /// Other 4xx client error
    ClientError,
    /// 5xx server error
    ServerError,
    /// Status outside the known ranges
    UnknownError,
}

impl ApiErrorKind {
    /// Maps an HTTP status code to an error kind
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            403 => Self::Forbidden,
            402 => Self::PaymentRequired,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::UnknownError,
        }
    }

    /// The stable kind string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::PaymentRequired => "payment_required",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Base URL is missing or not http(s)
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Some other constraint on the configuration failed
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Required environment variable missing or unreadable
    #[error("Environment variable error: {0}")]
    EnvVar(String),

    /// Webhook secret was not configured
    #[error("Webhook secret is missing")]
    MissingWebhookSecret,
}

/// Authentication and token-flow errors
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// Required OAuth2 client credentials are absent from the configuration
    #[error("Missing OAuth2 credentials: {0}")]
    MissingCredentials(String),

    /// No refresh token supplied or stored
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// No token supplied or stored to revoke
    #[error("No access token available")]
    MissingToken,

    /// A token endpoint request failed
    #[error("Token request failed: {message}")]
    TokenRequestFailed {
        /// Description of the failure
        message: String,
        /// The original error
        #[source]
        source: Box<ChronoError>,
    },

    /// The provider rejected the request with HTTP 401
    #[error("{message}")]
    Unauthorized {
        /// Message from the body's `error_description` or `detail`, or a fallback
        message: String,
        /// Raw response body, if any
        body: Option<Value>,
    },
}

impl AuthenticationError {
    /// The stable kind string
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials(_) => "missing_credentials",
            Self::MissingRefreshToken => "missing_refresh_token",
            Self::MissingToken => "missing_token",
            Self::TokenRequestFailed { .. } => "token_request_failed",
            Self::Unauthorized { .. } => "authentication_error",
        }
    }
}

/// Webhook signature and JWT verification errors
#[derive(Error, Debug)]
pub enum WebhookVerificationError {
    /// HMAC signature did not match the payload
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Signature was required but no recognized header carried one
    #[error("Missing webhook signature")]
    MissingSignature,

    /// Payload was not valid JSON
    #[error("Invalid webhook payload: {message}")]
    InvalidPayload {
        /// Parser message
        message: String,
    },

    /// Token did not have the header.payload.signature shape
    #[error("Invalid JWT format")]
    InvalidJwtFormat,

    /// JWT signature segment did not match
    #[error("Invalid JWT signature")]
    InvalidJwtSignature,

    /// JWT payload segment was not base64url-encoded JSON
    #[error("Invalid JWT payload")]
    InvalidJwtPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(402, ApiErrorKind::PaymentRequired; "payment required")]
    #[test_case(403, ApiErrorKind::Forbidden; "forbidden")]
    #[test_case(404, ApiErrorKind::NotFound; "not found")]
    #[test_case(409, ApiErrorKind::ClientError; "other client error")]
    #[test_case(500, ApiErrorKind::ServerError; "internal error")]
    #[test_case(503, ApiErrorKind::ServerError; "unavailable")]
    #[test_case(300, ApiErrorKind::UnknownError; "redirect")]
    fn test_kind_from_status(status: u16, expected: ApiErrorKind) {
        assert_eq!(ApiErrorKind::from_status(status), expected);
    }

    #[test]
    fn test_error_kind_strings() {
        let err = ChronoError::RateLimit {
            retry_after: Duration::from_secs(2),
            body: None,
        };
        assert_eq!(err.error_kind(), "rate_limit");
        assert_eq!(err.status_code(), Some(429));

        let err = ChronoError::Authentication(AuthenticationError::MissingRefreshToken);
        assert_eq!(err.error_kind(), "missing_refresh_token");
        assert_eq!(err.status_code(), None);

        let err = ChronoError::Api {
            kind: ApiErrorKind::NotFound,
            message: "Not found.".into(),
            status_code: 404,
            body: None,
        };
        assert_eq!(err.error_kind(), "not_found");
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_validation_errors_accessor() {
        let mut field_errors = HashMap::new();
        field_errors.insert("email".to_string(), vec!["invalid".to_string()]);
        let err = ChronoError::Validation {
            message: "bad input".into(),
            field_errors,
            body: None,
        };
        assert_eq!(
            err.validation_errors().and_then(|e| e.get("email")),
            Some(&vec!["invalid".to_string()])
        );
        assert_eq!(err.error_kind(), "validation_error");
    }

    #[test]
    fn test_retryability() {
        let rate_limited = ChronoError::RateLimit {
            retry_after: Duration::from_secs(1),
            body: None,
        };
        assert!(rate_limited.is_retryable());
        assert_eq!(rate_limited.retry_after(), Some(Duration::from_secs(1)));

        let server = ChronoError::Api {
            kind: ApiErrorKind::ServerError,
            message: "boom".into(),
            status_code: 502,
            body: None,
        };
        assert!(server.is_retryable());

        let not_found = ChronoError::Api {
            kind: ApiErrorKind::NotFound,
            message: "missing".into(),
            status_code: 404,
            body: None,
        };
        assert!(!not_found.is_retryable());
        assert!(!ChronoError::Authentication(AuthenticationError::MissingToken).is_retryable());
    }

    #[test]
    fn test_token_request_failed_wraps_source() {
        let inner = ChronoError::Http {
            message: "connection refused".into(),
            source: None,
        };
        let err = ChronoError::Authentication(AuthenticationError::TokenRequestFailed {
            message: "connection refused".into(),
            source: Box::new(inner),
        });
        assert_eq!(err.error_kind(), "token_request_failed");
        assert!(format!("{err}").contains("Token request failed"));

        let auth = std::error::Error::source(&err).expect("auth source");
        let http = auth.source().expect("http source");
        assert!(http.to_string().contains("connection refused"));
    }

    #[test]
    fn test_webhook_error_messages() {
        assert_eq!(
            WebhookVerificationError::InvalidSignature.to_string(),
            "Invalid webhook signature"
        );
        assert_eq!(
            WebhookVerificationError::MissingSignature.to_string(),
            "Missing webhook signature"
        );
        assert_eq!(
            WebhookVerificationError::InvalidJwtSignature.to_string(),
            "Invalid JWT signature"
        );
        assert_eq!(
            WebhookVerificationError::InvalidJwtPayload.to_string(),
            "Invalid JWT payload"
        );
    }
}
