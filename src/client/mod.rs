//! DrChrono client implementation.
//!
//! The main entry point, wiring configuration, transport, OAuth2 and the
//! resource services together.

use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::auth::OAuth2Manager;
use crate::config::ChronoConfig;
use crate::errors::{ChronoResult, ConfigurationError};
use crate::services::{
    AppointmentsService, BillingService, CarePlansService, DoctorsService, DocumentsService,
    OfficesService, PatientsService, TasksService, UsersService,
};
use crate::transport::ChronoTransport;
use crate::webhooks::WebhookVerifier;

/// Main DrChrono API client.
///
/// Cheap to clone; all clones share the same connection pool, token
/// store, and request counter.
#[derive(Debug, Clone)]
pub struct DrChronoClient {
    config: Arc<ChronoConfig>,
    transport: Arc<ChronoTransport>,
    oauth: OAuth2Manager,
    patients_service: PatientsService,
    appointments_service: AppointmentsService,
    doctors_service: DoctorsService,
    offices_service: OfficesService,
    billing_service: BillingService,
    tasks_service: TasksService,
    care_plans_service: CarePlansService,
    documents_service: DocumentsService,
    users_service: UsersService,
}

impl DrChronoClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ChronoConfig) -> ChronoResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let transport = Arc::new(ChronoTransport::new(config.clone())?);
        let oauth = OAuth2Manager::new(config.clone(), &transport);

        Ok(Self {
            config,
            oauth,
            patients_service: PatientsService::new(transport.clone()),
            appointments_service: AppointmentsService::new(transport.clone()),
            doctors_service: DoctorsService::new(transport.clone()),
            offices_service: OfficesService::new(transport.clone()),
            billing_service: BillingService::new(transport.clone()),
            tasks_service: TasksService::new(transport.clone()),
            care_plans_service: CarePlansService::new(transport.clone()),
            documents_service: DocumentsService::new(transport.clone()),
            users_service: UsersService::new(transport.clone()),
            transport,
        })
    }

    /// Create a new client from `DRCHRONO_*` environment variables.
    pub fn from_env() -> ChronoResult<Self> {
        Self::new(ChronoConfig::from_env()?)
    }

    /// Get the configuration
    pub fn config(&self) -> &ChronoConfig {
        &self.config
    }

    /// Get the OAuth2 manager
    pub fn oauth(&self) -> &OAuth2Manager {
        &self.oauth
    }

    /// Get the underlying transport, for raw calls to endpoints without
    /// a service wrapper
    pub fn transport(&self) -> &Arc<ChronoTransport> {
        &self.transport
    }

    /// Number of HTTP requests issued so far, retries included
    pub fn request_count(&self) -> u64 {
        self.transport.request_count()
    }

    /// Build a webhook verifier from the configured webhook secret.
    pub fn webhook_verifier(&self) -> ChronoResult<WebhookVerifier> {
        let secret = self
            .config
            .webhook_secret()
            .ok_or(ConfigurationError::MissingWebhookSecret)?;
        Ok(WebhookVerifier::new(secret.expose_secret().clone()))
    }

    /// Get the patients service
    pub fn patients(&self) -> &PatientsService {
        &self.patients_service
    }

    /// Get the appointments service
    pub fn appointments(&self) -> &AppointmentsService {
        &self.appointments_service
    }

    /// Get the doctors service
    pub fn doctors(&self) -> &DoctorsService {
        &self.doctors_service
    }

    /// Get the offices service
    pub fn offices(&self) -> &OfficesService {
        &self.offices_service
    }

    /// Get the billing service
    pub fn billing(&self) -> &BillingService {
        &self.billing_service
    }

    /// Get the tasks service
    pub fn tasks(&self) -> &TasksService {
        &self.tasks_service
    }

    /// Get the care plans service
    pub fn care_plans(&self) -> &CarePlansService {
        &self.care_plans_service
    }

    /// Get the documents service
    pub fn documents(&self) -> &DocumentsService {
        &self.documents_service
    }

    /// Get the users service
    pub fn users(&self) -> &UsersService {
        &self.users_service
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChronoConfig {
        ChronoConfig::builder()
            .client_id("client-id")
            .client_secret("client-secret")
            .access_token("access-token")
            .build_unchecked()
    }

    #[test]
    fn test_client_creation() {
        let client = DrChronoClient::new(test_config()).unwrap();
        assert_eq!(client.config().client_id(), Some("client-id"));
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = ChronoConfig::builder()
            .base_url("ftp://drchrono.com")
            .build_unchecked();

        let err = DrChronoClient::new(config).unwrap_err();
        assert_eq!(err.error_kind(), "configuration_error");
    }

    #[test]
    fn test_webhook_verifier_requires_secret() {
        let client = DrChronoClient::new(test_config()).unwrap();
        assert!(client.webhook_verifier().is_err());

        let client = DrChronoClient::new(
            ChronoConfig::builder()
                .webhook_secret("whsec_test")
                .build_unchecked(),
        )
        .unwrap();
        assert!(client.webhook_verifier().is_ok());
    }

    #[test]
    fn test_service_accessors() {
        let client = DrChronoClient::new(test_config()).unwrap();

        let _ = client.patients();
        let _ = client.appointments();
        let _ = client.doctors();
        let _ = client.offices();
        let _ = client.billing();
        let _ = client.tasks();
        let _ = client.care_plans();
        let _ = client.documents();
        let _ = client.users();
    }

    #[test]
    fn test_clones_share_request_counter() {
        let client = DrChronoClient::new(test_config()).unwrap();
        let cloned = client.clone();
        assert!(Arc::ptr_eq(client.transport(), cloned.transport()));
    }
}
