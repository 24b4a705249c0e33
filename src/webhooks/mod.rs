//! Webhook verification and parsing.
//!
//! Provides HMAC signature verification for inbound webhook payloads and
//! verification of the provider's HMAC-SHA256 signed JWTs. Everything here
//! is local computation, no outbound network calls.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::{Sha256, Sha512};
use tracing::{debug, warn};

use crate::errors::{ChronoResult, WebhookVerificationError};

/// Header names checked for a webhook signature, in priority order.
/// The last entry covers CGI-style frameworks that rewrite header names.
const SIGNATURE_HEADERS: [&str; 4] = [
    "x-drchrono-signature",
    "x-signature",
    "signature",
    "http_x_drchrono_signature",
];

/// HMAC algorithm for webhook signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// HMAC-SHA256, the provider's default
    #[default]
    Sha256,
    /// HMAC-SHA512
    Sha512,
}

/// A verified, parsed webhook delivery.
///
/// Immutable once constructed; `received_at` is stamped at parse time.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event name, such as `PATIENT_CREATE`
    pub event: String,
    /// Resource type the event concerns, when the payload names one
    pub object: Option<String>,
    /// Event payload; the whole body when no `data` key is present
    pub data: Value,
    /// When this event was parsed
    pub received_at: DateTime<Utc>,
}

/// Verifies inbound webhook payloads against a shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    /// Create a verifier with the webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Verify a payload against a hex HMAC-SHA256 signature.
    ///
    /// Returns a boolean and never fails; use [`verify_and_parse`] when a
    /// mismatch should surface as an error.
    ///
    /// [`verify_and_parse`]: WebhookVerifier::verify_and_parse
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        self.verify_with_algorithm(payload, signature, SignatureAlgorithm::default())
    }

    /// Verify a payload with an explicit HMAC algorithm.
    pub fn verify_with_algorithm(
        &self,
        payload: &[u8],
        signature: &str,
        algorithm: SignatureAlgorithm,
    ) -> bool {
        let expected = self.generate_signature_with_algorithm(payload, algorithm);
        let valid = constant_time_eq(expected.as_bytes(), signature.as_bytes());
        if valid {
            debug!("Webhook signature verified");
        } else {
            warn!("Webhook signature mismatch");
        }
        valid
    }

    /// Compute the hex HMAC-SHA256 signature for a payload.
    ///
    /// Exposed for generating test and debug tokens.
    pub fn generate_signature(&self, payload: &[u8]) -> String {
        self.generate_signature_with_algorithm(payload, SignatureAlgorithm::default())
    }

    /// Compute the hex HMAC signature with an explicit algorithm.
    pub fn generate_signature_with_algorithm(
        &self,
        payload: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> String {
        hex::encode(self.compute_hmac(payload, algorithm))
    }

    /// Verify a signature (when supplied) and parse the payload.
    ///
    /// A signature mismatch or malformed JSON fails; a missing signature
    /// skips verification entirely.
    pub fn verify_and_parse(
        &self,
        payload: &str,
        signature: Option<&str>,
    ) -> ChronoResult<WebhookEvent> {
        if let Some(signature) = signature {
            if !self.verify(payload.as_bytes(), signature) {
                return Err(WebhookVerificationError::InvalidSignature.into());
            }
        }

        let parsed: Value = serde_json::from_str(payload).map_err(|e| {
            WebhookVerificationError::InvalidPayload {
                message: e.to_string(),
            }
        })?;

        Ok(build_event(parsed))
    }

    /// Verify and parse a payload using the signature found in request
    /// headers.
    ///
    /// Checks the known signature header names in order and uses the first
    /// match. With `require_signature` set, a request carrying no signature
    /// header fails; otherwise it is parsed unverified.
    pub fn verify_from_request(
        &self,
        payload: &str,
        headers: &HeaderMap,
        require_signature: bool,
    ) -> ChronoResult<WebhookEvent> {
        let signature = extract_signature(headers);
        if require_signature && signature.is_none() {
            return Err(WebhookVerificationError::MissingSignature.into());
        }
        self.verify_and_parse(payload, signature.as_deref())
    }

    /// Verify an HMAC-SHA256 signed JWT and return its claims.
    ///
    /// Only the HMAC-SHA256 family is supported: the `alg` header claim is
    /// never inspected, so tokens signed any other way fail the signature
    /// comparison.
    pub fn verify_jwt(&self, token: &str) -> ChronoResult<serde_json::Map<String, Value>> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(WebhookVerificationError::InvalidJwtFormat.into());
        }

        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let digest = self.compute_hmac(signing_input.as_bytes(), SignatureAlgorithm::Sha256);
        let expected = URL_SAFE_NO_PAD.encode(digest);
        if !constant_time_eq(expected.as_bytes(), parts[2].as_bytes()) {
            warn!("JWT signature mismatch");
            return Err(WebhookVerificationError::InvalidJwtSignature.into());
        }

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| WebhookVerificationError::InvalidJwtPayload)?;
        let claims: Value = serde_json::from_slice(&claims_bytes)
            .map_err(|_| WebhookVerificationError::InvalidJwtPayload)?;

        match claims {
            Value::Object(map) => Ok(map),
            _ => Err(WebhookVerificationError::InvalidJwtPayload.into()),
        }
    }

    fn compute_hmac(&self, payload: &[u8], algorithm: SignatureAlgorithm) -> Vec<u8> {
        let key = self.secret.expose_secret().as_bytes();
        match algorithm {
            SignatureAlgorithm::Sha256 => {
                let mut mac =
                    Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
                mac.update(payload);
                mac.finalize().into_bytes().to_vec()
            }
            SignatureAlgorithm::Sha512 => {
                let mut mac =
                    Hmac::<Sha512>::new_from_slice(key).expect("HMAC can take key of any size");
                mac.update(payload);
                mac.finalize().into_bytes().to_vec()
            }
        }
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn extract_signature(headers: &HeaderMap) -> Option<String> {
    SIGNATURE_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .map(String::from)
    })
}

fn build_event(mut payload: Value) -> WebhookEvent {
    let event = payload
        .get("event")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let object = payload
        .get("object")
        .and_then(Value::as_str)
        .map(String::from);
    let data = if payload.get("data").is_some() {
        payload["data"].take()
    } else {
        payload
    };

    WebhookEvent {
        event,
        object,
        data,
        received_at: Utc::now(),
    }
}
