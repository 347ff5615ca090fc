use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Pricing decision joined with its zone.
#[derive(Debug, Clone, FromRow)]
pub struct PricingEntity {
    pub zone_id: i64,
    pub bucket_start_ts: DateTime<Utc>,
    pub pricing_run_key: String,
    pub run_id: String,
    pub forecast_run_id: Option<String>,
    pub zone_name: Option<String>,
    pub borough: Option<String>,
    pub service_zone: Option<String>,
    pub final_multiplier: f64,
    pub raw_multiplier: Option<f64>,
    pub pre_cap_multiplier: Option<f64>,
    pub post_cap_multiplier: Option<f64>,
    pub confidence_score: Option<f64>,
    pub uncertainty_band: Option<String>,
    pub y_pred: Option<f64>,
    pub y_pred_lower: Option<f64>,
    pub y_pred_upper: Option<f64>,
    pub cap_applied: Option<bool>,
    pub cap_type: Option<String>,
    pub cap_reason: Option<String>,
    pub rate_limit_applied: Option<bool>,
    pub rate_limit_direction: Option<String>,
    pub smoothing_applied: Option<bool>,
    pub primary_reason_code: Option<String>,
    /// JSON array as text, or a bare JSON string.
    pub reason_codes_json: Option<String>,
    pub reason_summary: Option<String>,
    pub pricing_policy_version: Option<String>,
}

/// Demand forecast joined with its zone.
#[derive(Debug, Clone, FromRow)]
pub struct ForecastEntity {
    pub zone_id: i64,
    pub bucket_start_ts: DateTime<Utc>,
    pub forecast_run_key: String,
    pub run_id: String,
    pub horizon_index: Option<i64>,
    pub zone_name: Option<String>,
    pub borough: Option<String>,
    pub service_zone: Option<String>,
    pub y_pred: f64,
    pub y_pred_lower: Option<f64>,
    pub y_pred_upper: Option<f64>,
    pub confidence_score: Option<f64>,
    pub uncertainty_band: Option<String>,
    pub used_recursive_features: Option<bool>,
    pub model_name: Option<String>,
    pub model_version: Option<String>,
    pub model_stage: Option<String>,
    pub feature_version: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PricingRunEntity {
    pub run_id: String,
    pub status: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub pricing_policy_version: Option<String>,
    pub forecast_run_id: Option<String>,
    pub target_bucket_start: Option<DateTime<Utc>>,
    pub target_bucket_end: Option<DateTime<Utc>>,
    pub zone_count: Option<i64>,
    pub row_count: Option<i64>,
    pub cap_applied_count: Option<i64>,
    pub rate_limited_count: Option<i64>,
    pub low_confidence_count: Option<i64>,
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ForecastRunEntity {
    pub run_id: String,
    pub status: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub model_name: Option<String>,
    pub model_version: Option<String>,
    pub model_stage: Option<String>,
    pub feature_version: Option<String>,
    pub forecast_run_key: Option<String>,
    pub forecast_start_ts: Option<DateTime<Utc>>,
    pub forecast_end_ts: Option<DateTime<Utc>>,
    pub horizon_buckets: Option<i64>,
    pub bucket_minutes: Option<i64>,
    pub zone_count: Option<i64>,
    pub row_count: Option<i64>,
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ZoneEntity {
    pub zone_id: i64,
    pub zone_name: Option<String>,
    pub borough: Option<String>,
    pub service_zone: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReasonCodeEntity {
    pub reason_code: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub active_flag: Option<bool>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PolicyEntity {
    pub policy_version: Option<String>,
    pub effective_from: Option<DateTime<Utc>>,
    pub active_flag: Option<bool>,
    pub policy_summary: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ConfidenceBandEntity {
    pub uncertainty_band: String,
    pub row_count: i64,
    pub avg_confidence_score: f64,
}
