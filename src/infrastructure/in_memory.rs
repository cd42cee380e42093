use crate::domain::ports::SessionStore;
use crate::domain::session::Session;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Slots {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// A thread-safe in-memory session store.
///
/// Nothing survives the process. Ideal for tests and short-lived tools.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    slots: Arc<RwLock<Slots>>,
}

impl InMemorySessionStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots {
                access_token: Some(session.access_token),
                refresh_token: Some(session.refresh_token),
            })),
        }
    }

    /// Creates a store holding only an access token, as left behind by a
    /// client that never received a refresh token.
    pub fn with_access_token_only(access_token: impl Into<String>) -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots {
                access_token: Some(access_token.into()),
                refresh_token: None,
            })),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.slots.read().await.access_token.clone())
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.slots.read().await.refresh_token.clone())
    }

    async fn set(&self, session: Session) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.access_token = Some(session.access_token);
        slots.refresh_token = Some(session.refresh_token);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.access_token = None;
        slots.refresh_token = None;
        Ok(())
    }
}
