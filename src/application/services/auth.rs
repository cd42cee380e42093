use crate::application::client::AuthenticatedHttpClient;
use crate::application::request::PendingRequest;
use crate::domain::session::{Session, TokenResponse};
use crate::domain::user::{
    Acknowledgement, ApiKey, CreateApiKeyRequest, LoginRequest, RegisterRequest,
    UpdateUserRequest, User,
};
use crate::error::Result;
use serde_json::json;
use tracing::info;

use super::encode_segment;

/// Accounts, sessions and API keys on the auth service.
#[derive(Clone)]
pub struct AuthService {
    client: AuthenticatedHttpClient,
}

impl AuthService {
    pub fn new(client: AuthenticatedHttpClient) -> Self {
        Self { client }
    }

    pub async fn send_verification_code(&self, email: &str) -> Result<Acknowledgement> {
        let request = PendingRequest::post("/auth/send-verification-code")
            .anonymous()
            .json(&json!({ "email": email }))?;
        self.client.send_json(request).await
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<Acknowledgement> {
        let request = PendingRequest::post("/auth/verify-email")
            .anonymous()
            .json(&json!({ "email": email, "code": code }))?;
        self.client.send_json(request).await
    }

    pub async fn register(&self, data: &RegisterRequest) -> Result<User> {
        let request = PendingRequest::post("/auth/register").anonymous().json(data)?;
        self.client.send_json(request).await
    }

    /// Logs in and stores the returned token pair.
    pub async fn login(&self, data: &LoginRequest) -> Result<TokenResponse> {
        let request = PendingRequest::post("/auth/login").anonymous().json(data)?;
        let tokens: TokenResponse = self.client.send_json(request).await?;
        self.client
            .session()
            .set(Session::from(tokens.clone()))
            .await?;
        info!(user = %data.username_or_email, "logged in");
        Ok(tokens)
    }

    /// Exchanges the stored refresh token now, regardless of the access
    /// token's state.
    pub async fn refresh_token(&self) -> Result<Session> {
        self.client.refresher().refresh().await
    }

    pub async fn logout(&self) -> Result<()> {
        self.client.session().clear().await?;
        info!("logged out");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.client.session().access_token().await?.is_some())
    }

    pub async fn current_user(&self) -> Result<User> {
        self.client.send_json(PendingRequest::get("/users/me")).await
    }

    pub async fn update_current_user(&self, data: &UpdateUserRequest) -> Result<User> {
        let request = PendingRequest::put("/users/me").json(data)?;
        self.client.send_json(request).await
    }

    pub async fn user_by_id(&self, user_id: &str) -> Result<User> {
        let path = format!("/users/{}", encode_segment(user_id));
        self.client.send_json(PendingRequest::get(path)).await
    }

    pub async fn create_api_key(&self, data: &CreateApiKeyRequest) -> Result<ApiKey> {
        let request = PendingRequest::post("/api-keys/").json(data)?;
        self.client.send_json(request).await
    }

    pub async fn api_keys(&self) -> Result<Vec<ApiKey>> {
        self.client.send_json(PendingRequest::get("/api-keys/")).await
    }

    pub async fn delete_api_key(&self, key_id: &str) -> Result<()> {
        let path = format!("/api-keys/{}", encode_segment(key_id));
        self.client.send_unit(PendingRequest::delete(path)).await
    }

    pub async fn deactivate_api_key(&self, key_id: &str) -> Result<ApiKey> {
        let path = format!("/api-keys/{}/deactivate", encode_segment(key_id));
        self.client.send_json(PendingRequest::patch(path)).await
    }
}
