use thiserror::Error;

/// Why a request failed after the client gave up on it.
#[derive(Error, Debug)]
pub enum RequestFailure {
    #[error("HTTP {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("session expired, please log in again")]
    AuthExpired,
    #[error("{message} (remaining quota: {remaining})")]
    QuotaExceeded { message: String, remaining: f64 },
    #[error("access denied: {0}")]
    Forbidden(String),
    #[error("request failed: {0}")]
    RequestFailed(#[from] RequestFailure),
    #[error("operation cancelled")]
    Cancelled,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Session store error: {0}")]
    StoreError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status of a failed request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::AuthExpired => Some(401),
            ClientError::QuotaExceeded { .. } => Some(402),
            ClientError::Forbidden(_) => Some(403),
            ClientError::RequestFailed(RequestFailure::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Failures worth another attempt later: network blips and server errors.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::RequestFailed(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::RequestFailed(RequestFailure::Transport(err))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ClientError {
    fn from(err: rocksdb::Error) -> Self {
        ClientError::StoreError(err.to_string())
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ClientError>;
