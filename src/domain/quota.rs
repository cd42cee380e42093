use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Minute,
    Hour,
    Day,
    Month,
    Year,
    Lifetime,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct QuotaType {
    pub id: String,
    pub application_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit: String,
    pub time_window: TimeWindow,
    pub created_at: String,
}

/// Usage of one quota type within its current window.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct QuotaSummary {
    pub quota_type: QuotaType,
    pub limit: f64,
    pub used: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub time_window: TimeWindow,
    pub window_start: String,
    pub window_end: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct QuotaUsage {
    pub id: String,
    pub user_id: String,
    pub quota_type_id: String,
    pub usage_value: f64,
    pub window_start: String,
    pub window_end: String,
    pub created_at: String,
    #[serde(default)]
    pub quota_type: Option<QuotaType>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct QuotaLimit {
    pub id: String,
    pub user_id: String,
    pub quota_type_id: String,
    pub limit_value: f64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub quota_type: Option<QuotaType>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UsageDataPoint {
    pub timestamp: String,
    pub value: f64,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UsageTrend {
    pub quota_type: QuotaType,
    pub time_window: TimeWindow,
    pub data_points: Vec<UsageDataPoint>,
    pub total_usage: f64,
    pub average_usage: f64,
    pub peak_usage: f64,
}

/// Optional filters for the usage history endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsageFilter {
    pub quota_type_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl UsageFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("quota_type_id", &self.quota_type_id),
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }
}

/// The parts of a 402 response body the client surfaces.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct QuotaExhaustedBody {
    pub message: Option<String>,
    pub remaining: Option<f64>,
}

impl QuotaExhaustedBody {
    /// Reads `message` (else a string `detail`) and `remaining` each on its
    /// own, so a field of an unexpected shape does not hide the others.
    pub fn from_slice(body: &[u8]) -> Self {
        let Ok(json) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };
        let text = |key: &str| {
            json.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let remaining = json.get("remaining").and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        });
        Self {
            message: text("message").or_else(|| text("detail")),
            remaining,
        }
    }
}
