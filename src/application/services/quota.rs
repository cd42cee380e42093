use crate::application::client::AuthenticatedHttpClient;
use crate::application::request::PendingRequest;
use crate::domain::quota::{QuotaLimit, QuotaSummary, QuotaUsage, UsageFilter, UsageTrend};
use crate::error::{ClientError, RequestFailure, Result};
use tracing::debug;

use super::encode_segment;

pub const DEFAULT_TREND_DAYS: u32 = 30;

/// Quota figures served by the auth service.
///
/// Some deployments do not expose every quota endpoint; a 404 on a list
/// endpoint reads as an empty list.
#[derive(Clone)]
pub struct QuotaService {
    client: AuthenticatedHttpClient,
}

impl QuotaService {
    pub fn new(client: AuthenticatedHttpClient) -> Self {
        Self { client }
    }

    pub async fn summary(&self) -> Result<Vec<QuotaSummary>> {
        empty_on_not_found(self.client.send_json(PendingRequest::get("/quota/summary")).await)
    }

    pub async fn usage_history(&self, filter: &UsageFilter) -> Result<Vec<QuotaUsage>> {
        let request = filter
            .query_pairs()
            .into_iter()
            .fold(PendingRequest::get("/quota/usage"), |request, (key, value)| {
                request.query(key, value)
            });
        empty_on_not_found(self.client.send_json(request).await)
    }

    pub async fn usage_trend(&self, quota_type_id: &str, days: Option<u32>) -> Result<UsageTrend> {
        let path = format!("/quota/trend/{}", encode_segment(quota_type_id));
        let request =
            PendingRequest::get(path).query("days", days.unwrap_or(DEFAULT_TREND_DAYS));
        self.client.send_json(request).await
    }

    pub async fn limits(&self) -> Result<Vec<QuotaLimit>> {
        empty_on_not_found(self.client.send_json(PendingRequest::get("/quota/limits")).await)
    }
}

fn empty_on_not_found<T>(result: Result<Vec<T>>) -> Result<Vec<T>> {
    match result {
        Err(ClientError::RequestFailed(RequestFailure::Status { status: 404, .. })) => {
            debug!("quota endpoint not available, treating as empty");
            Ok(Vec::new())
        }
        other => other,
    }
}
