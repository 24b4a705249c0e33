//! Patients service.
//!
//! Wraps `/api/patients` and the read-only `/api/patients_summary`
//! endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const PATIENTS_PATH: &str = "/api/patients";
const PATIENTS_SUMMARY_PATH: &str = "/api/patients_summary";

/// Trait for patients service operations
#[async_trait]
pub trait PatientsServiceTrait: Send + Sync {
    /// List patients, one page at a time
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// List patients across all pages
    async fn list_all(&self, params: ListParams) -> ChronoResult<Vec<Value>>;

    /// Fetch a single patient
    async fn get(&self, id: u64) -> ChronoResult<Value>;

    /// Create a patient
    async fn create(&self, body: Value) -> ChronoResult<Value>;

    /// Partially update a patient
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value>;

    /// Delete a patient
    async fn delete(&self, id: u64) -> ChronoResult<()>;

    /// Fetch the flattened summary view of a patient
    async fn summary(&self, id: u64) -> ChronoResult<Value>;
}

/// Patients service implementation
#[derive(Debug, Clone)]
pub struct PatientsService {
    transport: Arc<ChronoTransport>,
}

impl PatientsService {
    /// Create a new patients service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl PatientsServiceTrait for PatientsService {
    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(PATIENTS_PATH, options).await
    }

    #[instrument(skip(self, params))]
    async fn list_all(&self, params: ListParams) -> ChronoResult<Vec<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.fetch_all(PATIENTS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{PATIENTS_PATH}/{id}"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self, body))]
    async fn create(&self, body: Value) -> ChronoResult<Value> {
        self.transport
            .post(PATIENTS_PATH, RequestOptions::new().json(body))
            .await
    }

    #[instrument(skip(self, body))]
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value> {
        self.transport
            .patch(
                &format!("{PATIENTS_PATH}/{id}"),
                RequestOptions::new().json(body),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: u64) -> ChronoResult<()> {
        self.transport
            .delete(&format!("{PATIENTS_PATH}/{id}"), RequestOptions::new())
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn summary(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(
                &format!("{PATIENTS_SUMMARY_PATH}/{id}"),
                RequestOptions::new(),
            )
            .await
    }
}
