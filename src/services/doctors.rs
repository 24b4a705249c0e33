//! Doctors service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const DOCTORS_PATH: &str = "/api/doctors";

/// Trait for doctors service operations
#[async_trait]
pub trait DoctorsServiceTrait: Send + Sync {
    /// List doctors visible to the current token
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// Fetch a single doctor
    async fn get(&self, id: u64) -> ChronoResult<Value>;

    /// Fetch the doctor the current token acts as, when one is listed
    async fn current(&self) -> ChronoResult<Option<Value>>;
}

/// Doctors service implementation
#[derive(Debug, Clone)]
pub struct DoctorsService {
    transport: Arc<ChronoTransport>,
}

impl DoctorsService {
    /// Create a new doctors service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl DoctorsServiceTrait for DoctorsService {
    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(DOCTORS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{DOCTORS_PATH}/{id}"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self))]
    async fn current(&self) -> ChronoResult<Option<Value>> {
        let page = self
            .transport
            .get_page(DOCTORS_PATH, RequestOptions::new().query("page_size", "1"))
            .await?;
        Ok(page.into_results().into_iter().next())
    }
}
