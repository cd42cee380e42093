use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:9001";
pub const DEFAULT_PAYMENT_BASE_URL: &str = "http://localhost:9002";
pub const DEFAULT_IDOCTOR_BASE_URL: &str = "http://localhost:4200";

/// How the refresh token is presented to the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// `POST /auth/refresh?refresh_token=<token>`
    #[default]
    QueryParam,
    /// `POST /auth/refresh` with `Authorization: Bearer <token>`
    BearerHeader,
}

impl FromStr for RefreshMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(RefreshMode::QueryParam),
            "header" => Ok(RefreshMode::BearerHeader),
            other => Err(ClientError::ValidationError(format!(
                "unknown refresh mode '{other}', expected 'query' or 'header'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub auth_base_url: String,
    pub payment_base_url: String,
    pub idoctor_base_url: String,
    pub refresh_mode: RefreshMode,
    pub default_timeout: Duration,
    pub processing_timeout: Duration,
    pub segmentation_timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            payment_base_url: DEFAULT_PAYMENT_BASE_URL.to_string(),
            idoctor_base_url: DEFAULT_IDOCTOR_BASE_URL.to_string(),
            refresh_mode: RefreshMode::default(),
            default_timeout: Duration::from_secs(10),
            processing_timeout: Duration::from_secs(30),
            // server side limit is 120s
            segmentation_timeout: Duration::from_secs(125),
            health_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `IDOCTOR_AUTH_API_URL`, `IDOCTOR_PAYMENT_API_URL`,
    /// `IDOCTOR_API_URL` and `IDOCTOR_REFRESH_MODE`, keeping defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("IDOCTOR_AUTH_API_URL") {
            config = config.with_auth_base_url(url);
        }
        if let Ok(url) = std::env::var("IDOCTOR_PAYMENT_API_URL") {
            config = config.with_payment_base_url(url);
        }
        if let Ok(url) = std::env::var("IDOCTOR_API_URL") {
            config = config.with_idoctor_base_url(url);
        }
        if let Ok(mode) = std::env::var("IDOCTOR_REFRESH_MODE") {
            config.refresh_mode = mode.parse()?;
        }
        Ok(config)
    }

    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = normalize_base_url(url.into());
        self
    }

    pub fn with_payment_base_url(mut self, url: impl Into<String>) -> Self {
        self.payment_base_url = normalize_base_url(url.into());
        self
    }

    pub fn with_idoctor_base_url(mut self, url: impl Into<String>) -> Self {
        self.idoctor_base_url = normalize_base_url(url.into());
        self
    }

    pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.refresh_mode = mode;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    pub fn with_segmentation_timeout(mut self, timeout: Duration) -> Self {
        self.segmentation_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new();
        assert_eq!(config.auth_base_url, "http://localhost:9001");
        assert_eq!(config.payment_base_url, "http://localhost:9002");
        assert_eq!(config.idoctor_base_url, "http://localhost:4200");
        assert_eq!(config.refresh_mode, RefreshMode::QueryParam);
        assert_eq!(config.default_timeout, Duration::from_secs(10));
        assert_eq!(config.processing_timeout, Duration::from_secs(30));
        assert_eq!(config.segmentation_timeout, Duration::from_secs(125));
    }

    #[test]
    fn test_base_urls_lose_trailing_slash() {
        let config = ClientConfig::new()
            .with_auth_base_url("http://auth.local/")
            .with_payment_base_url("http://pay.local//");
        assert_eq!(config.auth_base_url, "http://auth.local");
        assert_eq!(config.payment_base_url, "http://pay.local");
    }

    #[test]
    fn test_refresh_mode_parsing() {
        assert_eq!("query".parse::<RefreshMode>().unwrap(), RefreshMode::QueryParam);
        assert_eq!(" Header ".parse::<RefreshMode>().unwrap(), RefreshMode::BearerHeader);
        assert!(matches!(
            "cookie".parse::<RefreshMode>(),
            Err(ClientError::ValidationError(_))
        ));
    }
}
