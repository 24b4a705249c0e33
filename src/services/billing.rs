//! Billing service.
//!
//! Wraps `/api/line_items`, the billing codes attached to appointments.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const LINE_ITEMS_PATH: &str = "/api/line_items";

/// Trait for billing service operations
#[async_trait]
pub trait BillingServiceTrait: Send + Sync {
    /// List billing line items, one page at a time
    async fn list_line_items(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// Fetch a single line item
    async fn get_line_item(&self, id: u64) -> ChronoResult<Value>;

    /// Create a line item
    async fn create_line_item(&self, body: Value) -> ChronoResult<Value>;

    /// Partially update a line item
    async fn update_line_item(&self, id: u64, body: Value) -> ChronoResult<Value>;
}

/// Billing service implementation
#[derive(Debug, Clone)]
pub struct BillingService {
    transport: Arc<ChronoTransport>,
}

impl BillingService {
    /// Create a new billing service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl BillingServiceTrait for BillingService {
    #[instrument(skip(self, params))]
    async fn list_line_items(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(LINE_ITEMS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get_line_item(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{LINE_ITEMS_PATH}/{id}"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self, body))]
    async fn create_line_item(&self, body: Value) -> ChronoResult<Value> {
        self.transport
            .post(LINE_ITEMS_PATH, RequestOptions::new().json(body))
            .await
    }

    #[instrument(skip(self, body))]
    async fn update_line_item(&self, id: u64, body: Value) -> ChronoResult<Value> {
        self.transport
            .patch(
                &format!("{LINE_ITEMS_PATH}/{id}"),
                RequestOptions::new().json(body),
            )
            .await
    }
}
