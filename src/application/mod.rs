//! Application layer: the authenticated HTTP client, the token refresher, the
//! payment poller and the per-backend service wrappers built on them.
//!
//! All backends share one session store and one `TokenRefresher`, so a token
//! renewed while talking to the payment service is used by the next call to
//! the processing service as well.

pub mod client;
pub mod clients;
pub mod poller;
pub mod refresher;
pub mod request;
pub mod services;
