//! Logging utilities with sensitive data redaction.
//!
//! Everything logged by the transport and OAuth2 manager passes through
//! these helpers so tokens and client secrets never reach log output.

use once_cell::sync::Lazy;

/// Query parameters whose values are scrubbed from logged URLs.
static SENSITIVE_PARAMS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "token",
        "access_token",
        "refresh_token",
        "client_secret",
        "code",
        "secret",
        "key",
        "api_key",
        "password",
    ]
});

/// Redact a token, preserving a short prefix for debugging
pub fn redact_token(token: &str) -> String {
    match token.get(..8) {
        Some(prefix) if token.len() > 8 => format!("{}...[REDACTED]", prefix),
        _ => "[REDACTED]".to_string(),
    }
}

/// Redact a URL, hiding credential-bearing query parameters
pub fn redact_url(url: &str) -> String {
    if let Some(query_start) = url.find('?') {
        let (base, query) = url.split_at(query_start);
        let redacted_query = redact_query_params(query);
        format!("{}{}", base, redacted_query)
    } else {
        url.to_string()
    }
}

fn redact_query_params(query: &str) -> String {
    let mut result = String::from("?");
    let params = query.trim_start_matches('?');

    for (i, pair) in params.split('&').enumerate() {
        if i > 0 {
            result.push('&');
        }

        if let Some(eq_pos) = pair.find('=') {
            let (key, _value) = pair.split_at(eq_pos);
            if SENSITIVE_PARAMS.iter().any(|&s| key.eq_ignore_ascii_case(s)) {
                result.push_str(key);
                result.push_str("=[REDACTED]");
            } else {
                result.push_str(pair);
            }
        } else {
            result.push_str(pair);
        }
    }

    result
}
