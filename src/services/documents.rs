//! Documents service.
//!
//! Wraps `/api/documents`, including multipart upload of files from disk.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde_json::{json, Value};
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, FileUpload, RequestOptions};

const DOCUMENTS_PATH: &str = "/api/documents";

/// Form field the provider expects the file under
const DOCUMENT_FIELD: &str = "document";

/// Trait for documents service operations
#[async_trait]
pub trait DocumentsServiceTrait: Send + Sync {
    /// List documents, one page at a time
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// Fetch a single document's metadata
    async fn get(&self, id: u64) -> ChronoResult<Value>;

    /// Upload a file from disk as a new document.
    ///
    /// The file goes out under its base filename. `metadata` fields ride
    /// along in the same multipart form; JSON-typed values are serialized
    /// to JSON strings.
    async fn upload(
        &self,
        patient: u64,
        doctor: u64,
        file_path: &Path,
        metadata: Vec<(String, Value)>,
    ) -> ChronoResult<Value>;

    /// Delete a document
    async fn delete(&self, id: u64) -> ChronoResult<()>;
}

/// Documents service implementation
#[derive(Debug, Clone)]
pub struct DocumentsService {
    transport: Arc<ChronoTransport>,
}

impl DocumentsService {
    /// Create a new documents service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl DocumentsServiceTrait for DocumentsService {
    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(DOCUMENTS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{DOCUMENTS_PATH}/{id}"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self, metadata), fields(file = %file_path.display()))]
    async fn upload(
        &self,
        patient: u64,
        doctor: u64,
        file_path: &Path,
        metadata: Vec<(String, Value)>,
    ) -> ChronoResult<Value> {
        let file = FileUpload::from_path(DOCUMENT_FIELD, file_path).await?;

        let mut fields = vec![
            ("patient".to_string(), json!(patient)),
            ("doctor".to_string(), json!(doctor)),
        ];
        fields.extend(metadata);

        self.transport
            .upload(
                Method::POST,
                DOCUMENTS_PATH,
                RequestOptions::new(),
                fields,
                vec![file],
            )
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: u64) -> ChronoResult<()> {
        self.transport
            .delete(&format!("{DOCUMENTS_PATH}/{id}"), RequestOptions::new())
            .await
            .map(|_| ())
    }
}
