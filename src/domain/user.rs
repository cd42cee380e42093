use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub verification_code: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq, Clone)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Generic `{message, success}` acknowledgement.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct Acknowledgement {
    pub message: String,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct ApiKey {
    pub id: String,
    pub key_prefix: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    /// Only present in the response to key creation.
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct CreateApiKeyRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}
