//! Care plans service.
//!
//! Read-only wrapper over `/api/care_plans`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const CARE_PLANS_PATH: &str = "/api/care_plans";

/// Trait for care plans service operations
#[async_trait]
pub trait CarePlansServiceTrait: Send + Sync {
    /// List care plans, one page at a time
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// Fetch a single care plan
    async fn get(&self, id: u64) -> ChronoResult<Value>;
}

/// Care plans service implementation
#[derive(Debug, Clone)]
pub struct CarePlansService {
    transport: Arc<ChronoTransport>,
}

impl CarePlansService {
    /// Create a new care plans service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl CarePlansServiceTrait for CarePlansService {
    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(CARE_PLANS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{CARE_PLANS_PATH}/{id}"), RequestOptions::new())
            .await
    }
}
