//! HTTP transport layer for the DrChrono client.
//!
//! Provides the uniform `request(method, path, options)` primitive the
//! resource services are built on: auth header injection, JSON parsing,
//! status-to-error mapping, and a bounded retry loop on HTTP 429 that
//! honors the provider's `Retry-After` hint.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, ACCEPT, AUTHORIZATION};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::{Client, ClientBuilder, Response};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::ChronoConfig;
use crate::errors::{
    ApiErrorKind, AuthenticationError, ChronoError, ChronoResult, ConfigurationError,
};
use crate::observability::redact_url;
use crate::pagination::Page;

const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-drc-api-version");

/// Per-request options for the transport primitive
#[derive(Debug, Default)]
pub struct RequestOptions {
    /// Query parameters appended to the URL
    pub query: Vec<(String, String)>,
    /// JSON request body
    pub body: Option<Value>,
    /// Extra headers merged over the defaults
    pub headers: HeaderMap,
    /// Per-call timeout override
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add several query parameters
    pub fn queries(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Set the JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header, silently ignoring invalid names or values
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Ok(header_name) = name.parse::<HeaderName>() {
            if let Ok(header_value) = value.parse::<HeaderValue>() {
                self.headers.insert(header_name, header_value);
            }
        }
        self
    }

    /// Override the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// File data for multipart uploads
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Form field name
    pub field_name: String,
    /// File name sent to the provider
    pub file_name: String,
    /// File content
    pub content: Bytes,
    /// MIME type
    pub mime_type: String,
}

impl FileUpload {
    /// Create a file upload from in-memory content
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let file_name_str = file_name.into();
        let mime_type = mime_guess::from_path(&file_name_str)
            .first_or_octet_stream()
            .to_string();

        Self {
            field_name: field_name.into(),
            file_name: file_name_str,
            content: content.into(),
            mime_type,
        }
    }

    /// Create a file upload by reading a file, named after its base name
    pub async fn from_path(
        field_name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> ChronoResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| ChronoError::Http {
            message: format!("failed to read {}: {}", path.display(), e),
            source: Some(Box::new(e)),
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(field_name, file_name, content))
    }

    /// Override the guessed MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }
}

enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FileUpload>,
    },
}

/// HTTP transport over reqwest.
///
/// Cloning shares the underlying connection pool and request counter;
/// [`ChronoTransport::unauthenticated`] hands out a clone that never
/// attaches the Authorization header, used for token endpoints.
#[derive(Clone)]
pub struct ChronoTransport {
    client: Client,
    config: Arc<ChronoConfig>,
    attach_auth: bool,
    request_count: Arc<AtomicU64>,
}

impl ChronoTransport {
    /// Create a new transport from the configuration
    pub fn new(config: Arc<ChronoConfig>) -> ChronoResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ChronoError::Http {
                message: format!("failed to build HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            config,
            attach_auth: true,
            request_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Create a transport with a pre-built client
    pub fn with_client(client: Client, config: Arc<ChronoConfig>) -> Self {
        Self {
            client,
            config,
            attach_auth: true,
            request_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A clone of this transport that never sends the Authorization
    /// header, for token endpoint calls
    pub fn unauthenticated(&self) -> Self {
        Self {
            attach_auth: false,
            ..self.clone()
        }
    }

    /// Number of HTTP attempts issued so far, retries included
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Perform a request and decode the JSON response.
    ///
    /// `path` is resolved against the configured base URL; an absolute
    /// `http(s)` URL is used unchanged, which is how pagination `next`
    /// links are followed.
    #[instrument(skip(self, options), fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        mut options: RequestOptions,
    ) -> ChronoResult<Value> {
        let body = match options.body.take() {
            Some(json) => RequestBody::Json(json),
            None => RequestBody::Empty,
        };
        self.execute(method, path, options, body).await
    }

    /// GET a path
    pub async fn get(&self, path: &str, options: RequestOptions) -> ChronoResult<Value> {
        self.request(Method::GET, path, options).await
    }

    /// POST a path
    pub async fn post(&self, path: &str, options: RequestOptions) -> ChronoResult<Value> {
        self.request(Method::POST, path, options).await
    }

    /// PUT a path
    pub async fn put(&self, path: &str, options: RequestOptions) -> ChronoResult<Value> {
        self.request(Method::PUT, path, options).await
    }

    /// PATCH a path
    pub async fn patch(&self, path: &str, options: RequestOptions) -> ChronoResult<Value> {
        self.request(Method::PATCH, path, options).await
    }

    /// DELETE a path
    pub async fn delete(&self, path: &str, options: RequestOptions) -> ChronoResult<Value> {
        self.request(Method::DELETE, path, options).await
    }

    /// POST a form-encoded body, as the OAuth2 token endpoints expect
    #[instrument(skip(self, fields), fields(path = %path))]
    pub async fn send_form(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> ChronoResult<Value> {
        self.execute(
            Method::POST,
            path,
            RequestOptions::new(),
            RequestBody::Form(fields),
        )
        .await
    }

    /// POST a form-encoded body where only the response status matters.
    ///
    /// Failures map exactly like [`send_form`], but any 2xx succeeds
    /// without its body being read as JSON. The token revoke endpoint
    /// answers 200 with a non-JSON body.
    ///
    /// [`send_form`]: ChronoTransport::send_form
    #[instrument(skip(self, fields), fields(path = %path))]
    pub async fn send_form_ignoring_body(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> ChronoResult<()> {
        let (status, response) = self
            .execute_raw(
                Method::POST,
                path,
                RequestOptions::new(),
                RequestBody::Form(fields),
            )
            .await?;
        success_text(status, response).await?;
        Ok(())
    }

    /// Send a multipart request.
    ///
    /// JSON-typed field values are serialized to a JSON string; string
    /// values pass through unquoted. Files go out under their base
    /// filename with a guessed MIME type.
    #[instrument(skip(self, options, fields, files), fields(method = %method, path = %path, file_count = files.len()))]
    pub async fn upload(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
        fields: Vec<(String, Value)>,
        files: Vec<FileUpload>,
    ) -> ChronoResult<Value> {
        let fields = fields
            .into_iter()
            .map(|(name, value)| {
                let rendered = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, rendered)
            })
            .collect();
        self.execute(method, path, options, RequestBody::Multipart { fields, files })
            .await
    }

    /// GET a list endpoint and decode its pagination envelope
    pub async fn get_page(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ChronoResult<Page<Value>> {
        let value = self.get(path, options).await?;
        deserialize_page(value)
    }

    /// GET a list endpoint and follow `next` links until exhausted
    pub async fn fetch_all(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ChronoResult<Vec<Value>> {
        let mut items = Vec::new();
        let mut page = self.get_page(path, options).await?;

        loop {
            items.append(&mut page.results);
            match page.next.take() {
                Some(url) => page = self.get_page(&url, RequestOptions::new()).await?,
                None => return Ok(items),
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
        body: RequestBody,
    ) -> ChronoResult<Value> {
        let (status, response) = self.execute_raw(method, path, options, body).await?;
        handle_response(status, response).await
    }

    async fn execute_raw(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
        body: RequestBody,
    ) -> ChronoResult<(StatusCode, Response)> {
        let url = self.resolve_url(path);
        let headers = self.build_headers(&options)?;
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let request_id = Uuid::new_v4();
        let mut attempt: u32 = 0;

        loop {
            self.request_count.fetch_add(1, Ordering::Relaxed);

            let mut builder = self
                .client
                .request(method.clone(), &url)
                .headers(headers.clone())
                .timeout(timeout);

            if !options.query.is_empty() {
                builder = builder.query(&options.query);
            }

            builder = match &body {
                RequestBody::Empty => builder,
                RequestBody::Json(json) => builder.json(json),
                RequestBody::Form(fields) => builder.form(fields),
                RequestBody::Multipart { fields, files } => {
                    builder.multipart(build_multipart_form(fields, files)?)
                }
            };

            if self.config.debug {
                debug!(
                    request_id = %request_id,
                    url = %redact_url(&url),
                    attempt,
                    "Sending request"
                );
            }

            let response = builder.send().await.map_err(|e| ChronoError::Http {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })?;

            let status = response.status();

            if self.config.debug {
                debug!(request_id = %request_id, status = %status, "Received response");
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after =
                    retry_after_from_headers(response.headers()).unwrap_or(self.config.retry_delay);

                if attempt < self.config.max_retries {
                    attempt += 1;
                    warn!(
                        request_id = %request_id,
                        attempt,
                        delay_secs = retry_after.as_secs(),
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(retry_after).await;
                    continue;
                }

                let body = read_json_body(response).await;
                return Err(ChronoError::RateLimit { retry_after, body });
            }

            return Ok((status, response));
        }
    }

    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            self.config.build_url(path)
        }
    }

    fn build_headers(&self, options: &RequestOptions) -> ChronoResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(version) = &self.config.api_version {
            let value = HeaderValue::from_str(version).map_err(|_| {
                ConfigurationError::InvalidConfiguration {
                    message: format!("api_version is not a valid header value: {}", version),
                }
            })?;
            headers.insert(API_VERSION_HEADER, value);
        }

        if self.attach_auth {
            if let Some(token) = self.config.tokens().access_token() {
                let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|_| ConfigurationError::InvalidConfiguration {
                        message: "access token is not a valid header value".to_string(),
                    })?;
                headers.insert(AUTHORIZATION, value);
            }
        }

        for (name, value) in options.headers.iter() {
            headers.insert(name, value.clone());
        }

        Ok(headers)
    }
}

impl std::fmt::Debug for ChronoTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChronoTransport")
            .field("base_url", &self.config.base_url)
            .field("attach_auth", &self.attach_auth)
            .field("request_count", &self.request_count())
            .finish()
    }
}

async fn handle_response(status: StatusCode, response: Response) -> ChronoResult<Value> {
    let text = success_text(status, response).await?;

    if text.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(&text).map_err(|e| ChronoError::JsonParse {
        message: e.to_string(),
        body: text,
    })
}

/// Reads the body, mapping a non-2xx status onto the error taxonomy
async fn success_text(status: StatusCode, response: Response) -> ChronoResult<String> {
    let text = response.text().await.map_err(|e| ChronoError::Http {
        message: e.to_string(),
        source: Some(Box::new(e)),
    })?;

    if status.is_success() {
        return Ok(text);
    }

    let body: Option<Value> = serde_json::from_str(&text).ok();
    Err(map_error_response(status.as_u16(), body))
}

/// Maps a non-2xx, non-429 response onto the error taxonomy
fn map_error_response(status: u16, body: Option<Value>) -> ChronoError {
    match status {
        401 => {
            let message = extract_message(body.as_ref(), &["error_description", "detail"])
                .unwrap_or_else(|| "Authentication failed".to_string());
            AuthenticationError::Unauthorized { message, body }.into()
        }
        400 => {
            let message = extract_message(body.as_ref(), &["detail", "error_description", "message"])
                .unwrap_or_else(|| "Validation failed".to_string());
            let field_errors = body
                .as_ref()
                .and_then(|b| b.get("errors"))
                .map(parse_field_errors)
                .unwrap_or_default();
            ChronoError::Validation {
                message,
                field_errors,
                body,
            }
        }
        _ => {
            let kind = ApiErrorKind::from_status(status);
            let message = extract_message(body.as_ref(), &["detail", "message", "error"])
                .unwrap_or_else(|| format!("HTTP {} error", status));
            ChronoError::Api {
                kind,
                message,
                status_code: status,
                body,
            }
        }
    }
}

fn extract_message(body: Option<&Value>, keys: &[&str]) -> Option<String> {
    let body = body?;
    keys.iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
}

/// Flattens a 400 body's `errors` object into per-field message lists
fn parse_field_errors(errors: &Value) -> HashMap<String, Vec<String>> {
    let mut field_errors = HashMap::new();

    if let Some(map) = errors.as_object() {
        for (field, messages) in map {
            let list = match messages {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            field_errors.insert(field.clone(), list);
        }
    }

    field_errors
}

fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn read_json_body(response: Response) -> Option<Value> {
    let text = response.text().await.ok()?;
    serde_json::from_str(&text).ok()
}

fn build_multipart_form(
    fields: &[(String, String)],
    files: &[FileUpload],
) -> ChronoResult<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();

    for (name, value) in fields {
        form = form.text(name.clone(), value.clone());
    }

    for file in files {
        let part = reqwest::multipart::Part::bytes(file.content.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| ChronoError::Http {
                message: format!("invalid MIME type {}: {}", file.mime_type, e),
                source: Some(Box::new(e)),
            })?;
        form = form.part(file.field_name.clone(), part);
    }

    Ok(form)
}

fn deserialize_page(value: Value) -> ChronoResult<Page<Value>> {
    use serde::Deserialize;

    Page::<Value>::deserialize(&value).map_err(|e| ChronoError::JsonParse {
        message: e.to_string(),
        body: value.to_string(),
    })
}
