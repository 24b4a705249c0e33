//! Offices service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const OFFICES_PATH: &str = "/api/offices";

/// Trait for offices service operations
#[async_trait]
pub trait OfficesServiceTrait: Send + Sync {
    /// List offices, one page at a time
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// Fetch a single office, including exam rooms
    async fn get(&self, id: u64) -> ChronoResult<Value>;

    /// Partially update an office
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value>;
}

/// Offices service implementation
#[derive(Debug, Clone)]
pub struct OfficesService {
    transport: Arc<ChronoTransport>,
}

impl OfficesService {
    /// Create a new offices service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl OfficesServiceTrait for OfficesService {
    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(OFFICES_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{OFFICES_PATH}/{id}"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self, body))]
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value> {
        self.transport
            .patch(
                &format!("{OFFICES_PATH}/{id}"),
                RequestOptions::new().json(body),
            )
            .await
    }
}
