use crate::config::{ClientConfig, RefreshMode};
use crate::domain::ports::SharedSessionStore;
use crate::domain::session::{Session, SessionEvent, TokenResponse};
use crate::error::{ClientError, RequestFailure, Result};
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, warn};

const REFRESH_PATH: &str = "/auth/refresh";

/// Exchanges the refresh token for a new token pair, at most one exchange at
/// a time.
///
/// Every client sharing a session should share one refresher. Requests that
/// hit a 401 while another request is already refreshing wait for that
/// refresh and reuse its result instead of calling the endpoint again.
pub struct TokenRefresher {
    http: reqwest::Client,
    refresh_url: String,
    mode: RefreshMode,
    timeout: Duration,
    session: SharedSessionStore,
    gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl TokenRefresher {
    pub fn new(config: &ClientConfig, session: SharedSessionStore) -> Self {
        Self::with_http_client(reqwest::Client::new(), config, session)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        config: &ClientConfig,
        session: SharedSessionStore,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            http,
            refresh_url: format!("{}{}", config.auth_base_url, REFRESH_PATH),
            mode: config.refresh_mode,
            timeout: config.default_timeout,
            session,
            gate: Mutex::new(()),
            events,
        }
    }

    /// Receives `Refreshed` and `Expired` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn session(&self) -> &SharedSessionStore {
        &self.session
    }

    /// Renews the session after a request sent with `rejected_token` came
    /// back 401.
    ///
    /// If the stored access token already differs from the rejected one, a
    /// concurrent request refreshed first and its pair is returned as is. If
    /// the store was emptied meanwhile, the session already expired and no
    /// second `Expired` event is sent.
    pub async fn refresh_after_rejection(&self, rejected_token: Option<&str>) -> Result<Session> {
        let _gate = self.gate.lock().await;

        match self.session.access_token().await? {
            Some(current) if rejected_token != Some(current.as_str()) => {
                if let Some(refresh_token) = self.session.refresh_token().await? {
                    debug!("session already renewed by a concurrent request");
                    return Ok(Session::new(current, refresh_token));
                }
            }
            None if rejected_token.is_some() => {
                debug!("session already expired by a concurrent request");
                return Err(ClientError::AuthExpired);
            }
            _ => {}
        }

        self.refresh_locked().await
    }

    /// Unconditionally exchanges the stored refresh token.
    pub async fn refresh(&self) -> Result<Session> {
        let _gate = self.gate.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Session> {
        let Some(refresh_token) = self.session.refresh_token().await? else {
            warn!("no refresh token stored, session expired");
            self.expire().await?;
            return Err(ClientError::AuthExpired);
        };

        match self.exchange(&refresh_token).await {
            Ok(tokens) => {
                let session = Session::from(tokens);
                self.session.set(session.clone()).await?;
                info!("access token refreshed");
                let _ = self.events.send(SessionEvent::Refreshed);
                Ok(session)
            }
            Err(e) => {
                error!(error = %e, "token refresh failed, clearing session");
                self.expire().await?;
                Err(ClientError::AuthExpired)
            }
        }
    }

    async fn exchange(&self, refresh_token: &str) -> std::result::Result<TokenResponse, RequestFailure> {
        let request = self.http.post(&self.refresh_url).timeout(self.timeout);
        let request = match self.mode {
            RefreshMode::QueryParam => request.query(&[("refresh_token", refresh_token)]),
            RefreshMode::BearerHeader => request.bearer_auth(refresh_token),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(RequestFailure::Status {
                status: status.as_u16(),
                detail: super::client::extract_detail(&body),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| RequestFailure::Decode(e.to_string()))
    }

    async fn expire(&self) -> Result<()> {
        self.session.clear().await?;
        let _ = self.events.send(SessionEvent::Expired);
        Ok(())
    }
}
