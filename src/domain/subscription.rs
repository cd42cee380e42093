use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    OneTime,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PlanQuotaType {
    ProcessingCount,
    StorageGb,
    ApiCalls,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub billing_cycle: BillingCycle,
    pub quota_type: PlanQuotaType,
    pub quota_limit: f64,
    #[serde(default)]
    pub features: Map<String, Value>,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UserSubscription {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub auto_renew: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub plan: Option<SubscriptionPlan>,
}

/// Plan definition for the admin endpoints. Every field is optional so the
/// same type serves partial updates.
#[derive(Debug, Serialize, Default, PartialEq, Clone)]
pub struct PlanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_type: Option<PlanQuotaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Map<String, Value>>,
}
