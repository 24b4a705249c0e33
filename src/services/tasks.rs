//! Tasks service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const TASKS_PATH: &str = "/api/tasks";

/// Trait for tasks service operations
#[async_trait]
pub trait TasksServiceTrait: Send + Sync {
    /// List tasks, one page at a time
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// Fetch a single task
    async fn get(&self, id: u64) -> ChronoResult<Value>;

    /// Create a task
    async fn create(&self, body: Value) -> ChronoResult<Value>;

    /// Partially update a task
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value>;

    /// Delete a task
    async fn delete(&self, id: u64) -> ChronoResult<()>;
}

/// Tasks service implementation
#[derive(Debug, Clone)]
pub struct TasksService {
    transport: Arc<ChronoTransport>,
}

impl TasksService {
    /// Create a new tasks service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TasksServiceTrait for TasksService {
    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(TASKS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{TASKS_PATH}/{id}"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self, body))]
    async fn create(&self, body: Value) -> ChronoResult<Value> {
        self.transport
            .post(TASKS_PATH, RequestOptions::new().json(body))
            .await
    }

    #[instrument(skip(self, body))]
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value> {
        self.transport
            .patch(
                &format!("{TASKS_PATH}/{id}"),
                RequestOptions::new().json(body),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: u64) -> ChronoResult<()> {
        self.transport
            .delete(&format!("{TASKS_PATH}/{id}"), RequestOptions::new())
            .await
            .map(|_| ())
    }
}
