use serde::{Deserialize, Serialize};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// The credential pair held by the client between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Body returned by the login and refresh endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl From<TokenResponse> for Session {
    fn from(tokens: TokenResponse) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

/// Lifecycle notifications for whoever owns navigation (a CLI, a UI shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh replaced the token pair.
    Refreshed,
    /// The session could not be renewed and was cleared.
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_defaults_token_type() {
        let json = r#"{"access_token":"a","refresh_token":"r"}"#;
        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.token_type, "bearer");

        let session = Session::from(tokens);
        assert_eq!(session, Session::new("a", "r"));
    }
}
