use crate::application::client::AuthenticatedHttpClient;
use crate::application::request::PendingRequest;
use crate::domain::subscription::{
    PlanRequest, SubscriptionPlan, SubscriptionStatus, UserSubscription,
};
use crate::error::Result;

use super::encode_segment;

/// Plans and user subscriptions on the payment service.
#[derive(Clone)]
pub struct SubscriptionService {
    client: AuthenticatedHttpClient,
}

impl SubscriptionService {
    pub fn new(client: AuthenticatedHttpClient) -> Self {
        Self { client }
    }

    pub async fn plans(&self, active_only: bool) -> Result<Vec<SubscriptionPlan>> {
        let request = PendingRequest::get("/plans/").query("active_only", active_only);
        self.client.send_json(request).await
    }

    pub async fn plan(&self, plan_id: &str) -> Result<SubscriptionPlan> {
        let path = format!("/plans/{}", encode_segment(plan_id));
        self.client.send_json(PendingRequest::get(path)).await
    }

    pub async fn create_plan(&self, data: &PlanRequest) -> Result<SubscriptionPlan> {
        let request = PendingRequest::post("/plans/").json(data)?;
        self.client.send_json(request).await
    }

    pub async fn update_plan(&self, plan_id: &str, data: &PlanRequest) -> Result<SubscriptionPlan> {
        let path = format!("/plans/{}", encode_segment(plan_id));
        let request = PendingRequest::put(path).json(data)?;
        self.client.send_json(request).await
    }

    pub async fn delete_plan(&self, plan_id: &str) -> Result<()> {
        let path = format!("/plans/{}", encode_segment(plan_id));
        self.client.send_unit(PendingRequest::delete(path)).await
    }

    pub async fn user_subscriptions(&self) -> Result<Vec<UserSubscription>> {
        self.client
            .send_json(PendingRequest::get("/subscriptions/"))
            .await
    }

    /// The first subscription in `active` state, if any.
    pub async fn active_subscription(&self) -> Result<Option<UserSubscription>> {
        let subscriptions = self.user_subscriptions().await?;
        Ok(subscriptions
            .into_iter()
            .find(|s| s.status == SubscriptionStatus::Active))
    }
}
