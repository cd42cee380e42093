use super::refresher::TokenRefresher;
use super::request::{PendingRequest, RequestBody};
use crate::domain::ports::SharedSessionStore;
use crate::domain::quota::QuotaExhaustedBody;
use crate::error::{ClientError, RequestFailure, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_QUOTA_MESSAGE: &str = "quota exhausted";

/// HTTP client for one backend that injects the bearer token and renews it
/// once per request on a 401.
///
/// Clones are cheap and share the connection pool, the session store and the
/// refresher.
#[derive(Clone)]
pub struct AuthenticatedHttpClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: SharedSessionStore,
    refresher: Arc<TokenRefresher>,
}

impl AuthenticatedHttpClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        refresher: Arc<TokenRefresher>,
    ) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, timeout, refresher)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        timeout: Duration,
        refresher: Arc<TokenRefresher>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            session: refresher.session().clone(),
            refresher,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SharedSessionStore {
        &self.session
    }

    pub fn refresher(&self) -> &Arc<TokenRefresher> {
        &self.refresher
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `request` and returns the successful response.
    ///
    /// A 401 triggers one refresh and one resend; the resend's outcome is
    /// final. 402, 403 and every other failure are returned without retrying.
    pub async fn execute(&self, request: PendingRequest) -> Result<Response> {
        let cancel = request.cancel.clone().unwrap_or_default();
        let mut request = request;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = self.execute_with_refresh(&mut request) => result,
        }
    }

    /// Sends `request` and decodes the JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RequestFailure::Decode(e.to_string()).into())
    }

    /// Sends `request` and discards the body.
    pub async fn send_unit(&self, request: PendingRequest) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute_with_refresh(&self, request: &mut PendingRequest) -> Result<Response> {
        if request.anonymous {
            let response = self.dispatch(request, None).await?;
            return classify(response, false).await;
        }

        let access_token = self.session.access_token().await?;
        let response = self.dispatch(request, access_token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.retried {
            return classify(response, true).await;
        }

        request.retried = true;
        debug!(path = %request.path, "access token rejected, refreshing");
        let session = self
            .refresher
            .refresh_after_rejection(access_token.as_deref())
            .await?;

        let retry = self.dispatch(request, Some(&session.access_token)).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            warn!(path = %request.path, "request rejected again after token refresh");
        }
        classify(retry, true).await
    }

    async fn dispatch(&self, request: &PendingRequest, token: Option<&str>) -> Result<Response> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, retried = request.retried, "sending request");

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .timeout(request.timeout.unwrap_or(self.timeout))
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(request.build_form(fields)),
        };

        Ok(builder.send().await?)
    }
}

/// Maps a response onto the client's failure taxonomy. Without a session in
/// play a 401 is reported like any other status.
async fn classify(response: Response, authenticated: bool) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED if authenticated => Err(ClientError::AuthExpired),
        StatusCode::PAYMENT_REQUIRED => {
            let quota = QuotaExhaustedBody::from_slice(&body);
            Err(ClientError::QuotaExceeded {
                message: quota
                    .message
                    .unwrap_or_else(|| DEFAULT_QUOTA_MESSAGE.to_string()),
                remaining: quota.remaining.unwrap_or(0.0),
            })
        }
        StatusCode::FORBIDDEN => Err(ClientError::Forbidden(
            extract_detail(&body).unwrap_or_else(|| "forbidden".to_string()),
        )),
        _ => Err(RequestFailure::Status {
            status: status.as_u16(),
            detail: extract_detail(&body),
        }
        .into()),
    }
}

/// Human-readable error text from a response body: the JSON `detail`,
/// `message` or `error` field, else the raw text.
pub(crate) fn extract_detail(body: &[u8]) -> Option<String> {
    if let Ok(json) = serde_json::from_slice::<Value>(body) {
        return ["detail", "message", "error"]
            .iter()
            .find_map(|key| match json.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::String(_)) | Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            });
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_prefers_detail_field() {
        let body = br#"{"detail":"not enough credits","message":"other"}"#;
        assert_eq!(extract_detail(body).as_deref(), Some("not enough credits"));
    }

    #[test]
    fn test_extract_detail_falls_back_to_message_and_error() {
        assert_eq!(
            extract_detail(br#"{"message":"bad image"}"#).as_deref(),
            Some("bad image")
        );
        assert_eq!(
            extract_detail(br#"{"error":"mask missing"}"#).as_deref(),
            Some("mask missing")
        );
        assert_eq!(extract_detail(br#"{"other":1}"#), None);
    }

    #[test]
    fn test_extract_detail_serializes_structured_detail() {
        let body = br#"{"detail":[{"loc":["body","email"],"msg":"field required"}]}"#;
        let detail = extract_detail(body).unwrap();
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_extract_detail_plain_text() {
        assert_eq!(
            extract_detail(b"Internal Server Error\n").as_deref(),
            Some("Internal Server Error")
        );
        assert_eq!(extract_detail(b""), None);
    }
}
