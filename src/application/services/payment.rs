use crate::application::client::AuthenticatedHttpClient;
use crate::application::poller::{PaymentStatusPoller, PollOptions, PollOutcome};
use crate::application::request::PendingRequest;
use crate::domain::payment::{
    CreatePaymentRequest, PaymentStatus, PaymentTransaction, RefundRequest,
};
use crate::domain::ports::PaymentStatusSource;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::encode_segment;

/// Payment orders on the payment service.
#[derive(Clone)]
pub struct PaymentService {
    client: AuthenticatedHttpClient,
}

impl PaymentService {
    pub fn new(client: AuthenticatedHttpClient) -> Self {
        Self { client }
    }

    pub async fn create_payment(&self, data: &CreatePaymentRequest) -> Result<PaymentTransaction> {
        let request = PendingRequest::post("/payments/").json(data)?;
        let payment: PaymentTransaction = self.client.send_json(request).await?;
        info!(payment_id = %payment.id, amount = %payment.amount, "payment order created");
        Ok(payment)
    }

    pub async fn payment_status(&self, payment_id: &str) -> Result<PaymentTransaction> {
        if payment_id.trim().is_empty() {
            return Err(ClientError::ValidationError(
                "payment id must not be empty".to_string(),
            ));
        }
        let path = format!("/payments/{}", encode_segment(payment_id));
        self.client.send_json(PendingRequest::get(path)).await
    }

    pub async fn request_refund(
        &self,
        payment_id: &str,
        data: &RefundRequest,
    ) -> Result<PaymentTransaction> {
        let path = format!("/payments/{}/refund", encode_segment(payment_id));
        let request = PendingRequest::post(path).json(data)?;
        self.client.send_json(request).await
    }

    pub async fn payment_history(
        &self,
        status_filter: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentTransaction>> {
        let mut request = PendingRequest::get("/payments/");
        if let Some(status) = status_filter {
            request = request.query("status_filter", status.as_str());
        }
        self.client.send_json(request).await
    }

    /// Polls the payment until it settles. See [`PaymentStatusPoller::poll`].
    pub async fn poll_payment_status<F>(
        &self,
        payment_id: &str,
        options: PollOptions,
        cancel: &CancellationToken,
        on_status_change: F,
    ) -> Result<PollOutcome>
    where
        F: FnMut(u32, &PaymentTransaction),
    {
        PaymentStatusPoller::new(self.clone())
            .with_options(options)
            .poll(payment_id, cancel, on_status_change)
            .await
    }
}

#[async_trait]
impl PaymentStatusSource for PaymentService {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentTransaction> {
        self.payment_status(payment_id).await
    }
}
