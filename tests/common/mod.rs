#![allow(dead_code)]

use idoctor_client::domain::ports::SharedSessionStore;
use idoctor_client::domain::session::Session;
use idoctor_client::infrastructure::in_memory::InMemorySessionStore;
use idoctor_client::{ApiClients, ClientConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::MockServer;

/// A mock backend serving all three services, and clients pointed at it.
pub struct Harness {
    pub server: MockServer,
    pub session: InMemorySessionStore,
    pub clients: ApiClients,
}

impl Harness {
    pub async fn with_session(access_token: &str, refresh_token: &str) -> Self {
        Self::with_store(InMemorySessionStore::with_session(Session::new(
            access_token,
            refresh_token,
        )))
        .await
    }

    pub async fn anonymous() -> Self {
        Self::with_store(InMemorySessionStore::new()).await
    }

    pub async fn with_store(session: InMemorySessionStore) -> Self {
        let server = MockServer::start().await;
        let shared: SharedSessionStore = Arc::new(session.clone());
        let clients = ApiClients::new(config_for(&server), shared);
        Self {
            server,
            session,
            clients,
        }
    }
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_auth_base_url(server.uri())
        .with_payment_base_url(server.uri())
        .with_idoctor_base_url(server.uri())
}

pub fn token_pair(access_token: &str, refresh_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "token_type": "bearer",
    })
}

pub fn payment_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": "user-1",
        "subscription_id": null,
        "amount": "99.00",
        "currency": "CNY",
        "payment_method": "alipay",
        "status": status,
        "payment_url": "https://pay.example.com/qr/1",
        "qr_code": null,
        "created_at": "2024-05-01T10:00:00",
        "updated_at": null,
    })
}

pub fn quota_summary_json(name: &str, used: f64) -> Value {
    json!({
        "quota_type": {
            "id": format!("qt-{name}"),
            "application_id": "idoctor",
            "name": name,
            "description": null,
            "unit": "calls",
            "time_window": "month",
            "created_at": "2024-01-01T00:00:00",
        },
        "limit": 100.0,
        "used": used,
        "remaining": 100.0 - used,
        "percentage": used,
        "time_window": "month",
        "window_start": "2024-05-01T00:00:00",
        "window_end": "2024-06-01T00:00:00",
    })
}
