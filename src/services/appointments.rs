//! Appointments service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::errors::ChronoResult;
use crate::pagination::{ListParams, Page};
use crate::transport::{ChronoTransport, RequestOptions};

const APPOINTMENTS_PATH: &str = "/api/appointments";

/// Trait for appointments service operations
#[async_trait]
pub trait AppointmentsServiceTrait: Send + Sync {
    /// List appointments, one page at a time.
    ///
    /// The provider requires a date window (`date`, `date_range`, or
    /// `since` parameter); passed through as given, not enforced here.
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>>;

    /// List appointments across all pages
    async fn list_all(&self, params: ListParams) -> ChronoResult<Vec<Value>>;

    /// Fetch a single appointment
    async fn get(&self, id: u64) -> ChronoResult<Value>;

    /// Create an appointment
    async fn create(&self, body: Value) -> ChronoResult<Value>;

    /// Partially update an appointment
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value>;

    /// Delete an appointment
    async fn delete(&self, id: u64) -> ChronoResult<()>;
}

/// Appointments service implementation
#[derive(Debug, Clone)]
pub struct AppointmentsService {
    transport: Arc<ChronoTransport>,
}

impl AppointmentsService {
    /// Create a new appointments service
    pub fn new(transport: Arc<ChronoTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AppointmentsServiceTrait for AppointmentsService {
    #[instrument(skip(self, params))]
    async fn list(&self, params: ListParams) -> ChronoResult<Page<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.get_page(APPOINTMENTS_PATH, options).await
    }

    #[instrument(skip(self, params))]
    async fn list_all(&self, params: ListParams) -> ChronoResult<Vec<Value>> {
        let options = RequestOptions::new().queries(params.into_query());
        self.transport.fetch_all(APPOINTMENTS_PATH, options).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: u64) -> ChronoResult<Value> {
        self.transport
            .get(&format!("{APPOINTMENTS_PATH}/{id}"), RequestOptions::new())
            .await
    }

    #[instrument(skip(self, body))]
    async fn create(&self, body: Value) -> ChronoResult<Value> {
        self.transport
            .post(APPOINTMENTS_PATH, RequestOptions::new().json(body))
            .await
    }

    #[instrument(skip(self, body))]
    async fn update(&self, id: u64, body: Value) -> ChronoResult<Value> {
        self.transport
            .patch(
                &format!("{APPOINTMENTS_PATH}/{id}"),
                RequestOptions::new().json(body),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: u64) -> ChronoResult<()> {
        self.transport
            .delete(&format!("{APPOINTMENTS_PATH}/{id}"), RequestOptions::new())
            .await
            .map(|_| ())
    }
}
