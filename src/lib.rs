//! Authenticated HTTP client for the iDoctor auth, payment and processing
//! backends.
//!
//! [`ApiClients`] wires one [`AuthenticatedHttpClient`] per backend around a
//! shared [`SessionStore`](domain::ports::SessionStore). Every request carries
//! the stored access token; a 401 triggers a single-flight refresh and one
//! resend.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

pub use application::client::AuthenticatedHttpClient;
pub use application::clients::ApiClients;
pub use application::poller::{PaymentStatusPoller, PollOptions, PollOutcome};
pub use config::{ClientConfig, RefreshMode};
pub use error::{ClientError, RequestFailure, Result};
