use crate::domain::payment::PaymentTransaction;
use crate::domain::ports::PaymentStatusSource;
use crate::error::{ClientError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The payment reached `completed` or `failed`.
    Terminal(PaymentTransaction),
    /// Every attempt ran without a terminal status. `last` is the most recent
    /// payment actually fetched, if any fetch succeeded.
    Exhausted {
        attempts: u32,
        last: Option<PaymentTransaction>,
    },
    /// The caller cancelled after `attempts` fetches.
    Cancelled { attempts: u32 },
}

/// Re-fetches a payment until it settles, the attempt budget runs out, or the
/// caller cancels.
pub struct PaymentStatusPoller<S> {
    source: S,
    options: PollOptions,
}

impl<S: PaymentStatusSource> PaymentStatusPoller<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: PollOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PollOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> PollOptions {
        self.options
    }

    /// Polls `payment_id`, calling `on_status_change` with the 1-based
    /// attempt number and every payment fetched.
    ///
    /// The first fetch happens immediately. Transient request failures are
    /// logged and consume an attempt; authentication, permission and quota
    /// failures end the poll with an error.
    pub async fn poll<F>(
        &self,
        payment_id: &str,
        cancel: &CancellationToken,
        mut on_status_change: F,
    ) -> Result<PollOutcome>
    where
        F: FnMut(u32, &PaymentTransaction),
    {
        if payment_id.trim().is_empty() {
            return Err(ClientError::ValidationError(
                "payment id must not be empty".to_string(),
            ));
        }
        if self.options.max_attempts == 0 {
            return Err(ClientError::ValidationError(
                "max attempts must be at least 1".to_string(),
            ));
        }

        let mut attempt: u32 = 0;
        let mut last = None;
        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled { attempts: attempt }),
                fetched = self.source.fetch_payment(payment_id) => fetched,
            };

            match fetched {
                Ok(payment) => {
                    debug!(payment_id, attempt, status = payment.status.as_str(), "payment status fetched");
                    on_status_change(attempt + 1, &payment);
                    if payment.status.is_terminal() {
                        info!(payment_id, status = payment.status.as_str(), "payment settled");
                        return Ok(PollOutcome::Terminal(payment));
                    }
                    last = Some(payment);
                }
                Err(e) if e.is_transient() => {
                    warn!(payment_id, attempt, error = %e, "payment status poll failed, continuing");
                }
                Err(e) => return Err(e),
            }

            attempt += 1;
            if attempt >= self.options.max_attempts {
                info!(payment_id, attempts = attempt, "payment poll budget exhausted");
                return Ok(PollOutcome::Exhausted {
                    attempts: attempt,
                    last,
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled { attempts: attempt }),
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }
    }
}
