//! Users service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const USERS_PATH: &str = "/api/users";

/// Trait for users service operations
#[async_trait]
pub trait UsersServiceTrait: Send + Sync {
    /// Fetch the user the current token belongs to
    async fn current(&self) -> ChronoResult<Value>;

    /// List users in the practice group
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// Fetch a single user
    async fn get(&self, id: u64) -> ChronoResult<Value>;
}

/// Users service implementation
#[derive(Debug, Clone)]
pub struct UsersService {
    transport: Arc<ChronoTransport>,
}

impl UsersService {
    /// Create a new users service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl UsersServiceTrait for UsersService {
    #[instrument(skip(self))]
    async fn current(&self) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{USERS_PATH}/current"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(USERS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{USERS_PATH}/{id}"), RequestOptions::new())
            .await
    }
}
