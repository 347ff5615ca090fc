use serde_json::Value;

use crate::contract::model::{
    ConfidenceBand, ForecastRow, ForecastRunSummary, PolicySummary, PricingRow,
    PricingRunSummary, ReasonCode, Zone,
};
use crate::infra::storage::entity::{
    ConfidenceBandEntity, ForecastEntity, ForecastRunEntity, PolicyEntity, PricingEntity,
    PricingRunEntity, ReasonCodeEntity, ZoneEntity,
};

const UNKNOWN_BAND: &str = "unknown";

/// Reason codes are stored as a JSON array, sometimes double-encoded as a
/// JSON string. Anything else yields an empty list.
pub fn normalize_reason_codes(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(value) => value,
            Err(_) => return Vec::new(),
        },
        Ok(value) => value,
        Err(_) => return Vec::new(),
    };
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Policy config is JSON when it parses, otherwise kept as a plain string.
pub fn policy_value(raw: Option<String>) -> Option<Value> {
    raw.map(|text| serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Convert a database entity to a contract model
pub fn pricing_to_contract(e: PricingEntity) -> PricingRow {
    let final_multiplier = e.final_multiplier;
    PricingRow {
        zone_id: e.zone_id,
        bucket_start_ts: e.bucket_start_ts,
        pricing_run_key: e.pricing_run_key,
        run_id: e.run_id,
        forecast_run_id: e.forecast_run_id.unwrap_or_default(),
        zone_name: e.zone_name,
        borough: e.borough,
        service_zone: e.service_zone,
        final_multiplier,
        raw_multiplier: e.raw_multiplier.unwrap_or(final_multiplier),
        pre_cap_multiplier: e.pre_cap_multiplier.unwrap_or(final_multiplier),
        post_cap_multiplier: e.post_cap_multiplier.unwrap_or(final_multiplier),
        confidence_score: e.confidence_score.unwrap_or(0.0),
        uncertainty_band: e
            .uncertainty_band
            .unwrap_or_else(|| UNKNOWN_BAND.to_string()),
        y_pred: e.y_pred.unwrap_or(0.0),
        y_pred_lower: e.y_pred_lower.unwrap_or(0.0),
        y_pred_upper: e.y_pred_upper.unwrap_or(0.0),
        cap_applied: e.cap_applied.unwrap_or(false),
        cap_type: e.cap_type,
        cap_reason: e.cap_reason,
        rate_limit_applied: e.rate_limit_applied.unwrap_or(false),
        rate_limit_direction: e.rate_limit_direction.unwrap_or_else(|| "none".to_string()),
        smoothing_applied: e.smoothing_applied.unwrap_or(false),
        primary_reason_code: e.primary_reason_code.unwrap_or_default(),
        reason_codes: normalize_reason_codes(e.reason_codes_json.as_deref()),
        reason_summary: e.reason_summary.unwrap_or_default(),
        pricing_policy_version: e.pricing_policy_version.unwrap_or_default(),
    }
}

pub fn forecast_to_contract(e: ForecastEntity) -> ForecastRow {
    ForecastRow {
        zone_id: e.zone_id,
        bucket_start_ts: e.bucket_start_ts,
        forecast_run_key: e.forecast_run_key,
        run_id: e.run_id,
        horizon_index: e.horizon_index.unwrap_or(0),
        zone_name: e.zone_name,
        borough: e.borough,
        service_zone: e.service_zone,
        y_pred: e.y_pred,
        y_pred_lower: e.y_pred_lower.unwrap_or(e.y_pred),
        y_pred_upper: e.y_pred_upper.unwrap_or(e.y_pred),
        confidence_score: e.confidence_score.unwrap_or(0.0),
        uncertainty_band: e
            .uncertainty_band
            .unwrap_or_else(|| UNKNOWN_BAND.to_string()),
        used_recursive_features: e.used_recursive_features.unwrap_or(false),
        model_name: e.model_name.unwrap_or_default(),
        model_version: e.model_version.unwrap_or_default(),
        model_stage: e.model_stage.unwrap_or_default(),
        feature_version: e.feature_version.unwrap_or_default(),
    }
}

pub fn pricing_run_to_contract(e: PricingRunEntity) -> PricingRunSummary {
    PricingRunSummary {
        run_id: e.run_id,
        status: e.status.unwrap_or_default(),
        started_at: e.started_at,
        ended_at: e.ended_at,
        failure_reason: e.failure_reason,
        pricing_policy_version: e.pricing_policy_version,
        forecast_run_id: e.forecast_run_id,
        target_bucket_start: e.target_bucket_start,
        target_bucket_end: e.target_bucket_end,
        zone_count: e.zone_count,
        row_count: e.row_count,
        cap_applied_count: e.cap_applied_count,
        rate_limited_count: e.rate_limited_count,
        low_confidence_count: e.low_confidence_count,
        latency_ms: e.latency_ms,
    }
}

pub fn forecast_run_to_contract(e: ForecastRunEntity) -> ForecastRunSummary {
    ForecastRunSummary {
        run_id: e.run_id,
        status: e.status.unwrap_or_default(),
        started_at: e.started_at,
        ended_at: e.ended_at,
        failure_reason: e.failure_reason,
        model_name: e.model_name,
        model_version: e.model_version,
        model_stage: e.model_stage,
        feature_version: e.feature_version,
        forecast_run_key: e.forecast_run_key,
        forecast_start_ts: e.forecast_start_ts,
        forecast_end_ts: e.forecast_end_ts,
        horizon_buckets: e.horizon_buckets,
        bucket_minutes: e.bucket_minutes,
        zone_count: e.zone_count,
        row_count: e.row_count,
        latency_ms: e.latency_ms,
    }
}

pub fn zone_to_contract(e: ZoneEntity) -> Zone {
    Zone {
        zone_id: e.zone_id,
        zone_name: e.zone_name.unwrap_or_default(),
        borough: e.borough.unwrap_or_default(),
        service_zone: e.service_zone,
    }
}

pub fn reason_code_to_contract(e: ReasonCodeEntity) -> ReasonCode {
    ReasonCode {
        reason_code: e.reason_code,
        category: e.category.unwrap_or_default(),
        description: e.description.unwrap_or_default(),
        active_flag: e.active_flag.unwrap_or(false),
    }
}

pub fn policy_to_contract(e: PolicyEntity) -> PolicySummary {
    PolicySummary {
        policy_version: e.policy_version,
        effective_from: e.effective_from,
        active_flag: e.active_flag,
        policy_summary: policy_value(e.policy_summary),
    }
}

pub fn confidence_band_to_contract(e: ConfidenceBandEntity) -> ConfidenceBand {
    ConfidenceBand {
        uncertainty_band: e.uncertainty_band,
        row_count: u64::try_from(e.row_count).unwrap_or(0),
        avg_confidence_score: e.avg_confidence_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_from_array() {
        assert_eq!(
            normalize_reason_codes(Some(r#"["DEMAND_UP","CAP_APPLIED"]"#)),
            vec!["DEMAND_UP", "CAP_APPLIED"]
        );
    }

    #[test]
    fn reason_codes_from_double_encoded_string() {
        assert_eq!(
            normalize_reason_codes(Some(r#""[\"DEMAND_UP\"]""#)),
            vec!["DEMAND_UP"]
        );
    }

    #[test]
    fn reason_codes_garbage_is_empty() {
        assert!(normalize_reason_codes(Some("not json")).is_empty());
        assert!(normalize_reason_codes(Some(r#"{"a":1}"#)).is_empty());
        assert!(normalize_reason_codes(None).is_empty());
    }

    #[test]
    fn non_string_codes_are_stringified() {
        assert_eq!(normalize_reason_codes(Some("[1, \"X\"]")), vec!["1", "X"]);
    }

    #[test]
    fn policy_summary_keeps_unparseable_text() {
        assert_eq!(
            policy_value(Some("{\"max\": 1.5}".into())),
            Some(serde_json::json!({"max": 1.5}))
        );
        assert_eq!(
            policy_value(Some("legacy".into())),
            Some(Value::String("legacy".into()))
        );
    }
}
