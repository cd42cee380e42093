use super::client::AuthenticatedHttpClient;
use super::refresher::TokenRefresher;
use super::services::auth::AuthService;
use super::services::payment::PaymentService;
use super::services::processing::ProcessingService;
use super::services::quota::QuotaService;
use super::services::segmentation::SegmentationService;
use super::services::subscription::SubscriptionService;
use crate::config::ClientConfig;
use crate::domain::ports::SharedSessionStore;
use std::sync::Arc;

/// One authenticated client per backend, all sharing a session.
#[derive(Clone)]
pub struct ApiClients {
    config: ClientConfig,
    refresher: Arc<TokenRefresher>,
    auth: AuthenticatedHttpClient,
    payment: AuthenticatedHttpClient,
    idoctor: AuthenticatedHttpClient,
}

impl ApiClients {
    pub fn new(config: ClientConfig, session: SharedSessionStore) -> Self {
        let http = reqwest::Client::new();
        let refresher = Arc::new(TokenRefresher::with_http_client(
            http.clone(),
            &config,
            session,
        ));
        let auth = AuthenticatedHttpClient::with_http_client(
            http.clone(),
            &config.auth_base_url,
            config.default_timeout,
            refresher.clone(),
        );
        let payment = AuthenticatedHttpClient::with_http_client(
            http.clone(),
            &config.payment_base_url,
            config.default_timeout,
            refresher.clone(),
        );
        let idoctor = AuthenticatedHttpClient::with_http_client(
            http,
            &config.idoctor_base_url,
            config.processing_timeout,
            refresher.clone(),
        );
        Self {
            config,
            refresher,
            auth,
            payment,
            idoctor,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn refresher(&self) -> &Arc<TokenRefresher> {
        &self.refresher
    }

    pub fn auth_client(&self) -> &AuthenticatedHttpClient {
        &self.auth
    }

    pub fn payment_client(&self) -> &AuthenticatedHttpClient {
        &self.payment
    }

    pub fn idoctor_client(&self) -> &AuthenticatedHttpClient {
        &self.idoctor
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.auth.clone())
    }

    pub fn quota(&self) -> QuotaService {
        QuotaService::new(self.auth.clone())
    }

    pub fn payments(&self) -> PaymentService {
        PaymentService::new(self.payment.clone())
    }

    pub fn subscriptions(&self) -> SubscriptionService {
        SubscriptionService::new(self.payment.clone())
    }

    pub fn processing(&self) -> ProcessingService {
        ProcessingService::new(self.idoctor.clone())
    }

    pub fn segmentation(&self) -> SegmentationService {
        SegmentationService::new(
            self.idoctor.clone(),
            self.config.segmentation_timeout,
            self.config.health_timeout,
        )
    }
}
