use super::payment::PaymentTransaction;
use super::session::Session;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable home of the access/refresh token pair.
///
/// Implementations must be internally synchronized: the same store is shared
/// by every client and by the token refresher. Writes are last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn access_token(&self) -> Result<Option<String>>;
    async fn refresh_token(&self) -> Result<Option<String>>;
    /// Replaces both tokens.
    async fn set(&self, session: Session) -> Result<()>;
    /// Removes both tokens.
    async fn clear(&self) -> Result<()>;
}

pub type SharedSessionStore = Arc<dyn SessionStore>;

/// Anything that can report the current state of a payment.
#[async_trait]
pub trait PaymentStatusSource: Send + Sync {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentTransaction>;
}
