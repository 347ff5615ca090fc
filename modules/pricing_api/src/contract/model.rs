use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pricing decision for a zone and time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    pub zone_id: i64,
    pub bucket_start_ts: DateTime<Utc>,
    pub pricing_run_key: String,
    pub run_id: String,
    pub forecast_run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borough: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_zone: Option<String>,
    pub final_multiplier: f64,
    pub raw_multiplier: f64,
    pub pre_cap_multiplier: f64,
    pub post_cap_multiplier: f64,
    pub confidence_score: f64,
    pub uncertainty_band: String,
    pub y_pred: f64,
    pub y_pred_lower: f64,
    pub y_pred_upper: f64,
    pub cap_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_reason: Option<String>,
    pub rate_limit_applied: bool,
    pub rate_limit_direction: String,
    pub smoothing_applied: bool,
    pub primary_reason_code: String,
    pub reason_codes: Vec<String>,
    pub reason_summary: String,
    pub pricing_policy_version: String,
}

/// One demand forecast for a zone and time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub zone_id: i64,
    pub bucket_start_ts: DateTime<Utc>,
    pub forecast_run_key: String,
    pub run_id: String,
    pub horizon_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borough: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_zone: Option<String>,
    pub y_pred: f64,
    pub y_pred_lower: f64,
    pub y_pred_upper: f64,
    pub confidence_score: f64,
    pub uncertainty_band: String,
    pub used_recursive_features: bool,
    pub model_name: String,
    pub model_version: String,
    pub model_stage: String,
    pub feature_version: String,
}

/// Run-log entry of a pricing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRunSummary {
    pub run_id: String,
    pub status: String,
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

/// Run-log entry of a forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRunSummary {
    pub run_id: String,
    pub status: String,
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

/// Common view over both run-log kinds.
pub trait RunRecord {
    fn run_id(&self) -> &str;
    fn status(&self) -> &str;
    fn started_at(&self) -> Option<DateTime<Utc>>;

    fn succeeded(&self) -> bool {
        self.status().eq_ignore_ascii_case("success")
    }
}

impl RunRecord for PricingRunSummary {
    fn run_id(&self) -> &str {
        &self.run_id
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

impl RunRecord for ForecastRunSummary {
    fn run_id(&self) -> &str {
        &self.run_id
    }
    fn status(&self) -> &str {
        &self.status
    }
    fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: i64,
    pub zone_name: String,
    pub borough: String,
    pub service_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCode {
    pub reason_code: String,
    pub category: String,
    pub description: String,
    pub active_flag: bool,
}

/// Active pricing policy snapshot. All fields are null when no policy is active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub policy_version: Option<String>,
    pub effective_from: Option<DateTime<Utc>>,
    pub active_flag: Option<bool>,
    pub policy_summary: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub pricing_run_id: Option<String>,
    pub forecast_run_id: Option<String>,
    pub pricing_zone_count: u64,
    pub forecast_zone_count: u64,
    pub pricing_row_count: u64,
    pub forecast_row_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailSummary {
    pub pricing_run_id: Option<String>,
    pub total_rows: u64,
    pub cap_applied_rows: u64,
    pub rate_limited_rows: u64,
    pub smoothing_applied_rows: u64,
    pub cap_applied_rate: f64,
    pub rate_limited_rate: f64,
}

impl GuardrailSummary {
    /// Derives both rates from the counters; rates are 0.0 for an empty run.
    pub fn with_rates(mut self) -> Self {
        if self.total_rows > 0 {
            let total = self.total_rows as f64;
            self.cap_applied_rate = self.cap_applied_rows as f64 / total;
            self.rate_limited_rate = self.rate_limited_rows as f64 / total;
        } else {
            self.cap_applied_rate = 0.0;
            self.rate_limited_rate = 0.0;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub uncertainty_band: String,
    pub row_count: u64,
    pub avg_confidence_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub forecast_run_id: Option<String>,
    pub bands: Vec<ConfidenceBand>,
}

// ---- filters ----

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingFilter {
    pub zone_id: Option<i64>,
    pub borough: Option<String>,
    pub uncertainty_band: Option<String>,
    pub cap_applied: Option<bool>,
    pub rate_limit_applied: Option<bool>,
}

impl PricingFilter {
    pub fn matches(&self, row: &PricingRow) -> bool {
        self.zone_id.is_none_or(|z| row.zone_id == z)
            && text_matches(self.borough.as_deref(), row.borough.as_deref())
            && text_matches(
                self.uncertainty_band.as_deref(),
                Some(row.uncertainty_band.as_str()),
            )
            && self.cap_applied.is_none_or(|c| row.cap_applied == c)
            && self
                .rate_limit_applied
                .is_none_or(|r| row.rate_limit_applied == r)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastFilter {
    pub zone_id: Option<i64>,
    pub borough: Option<String>,
}

impl ForecastFilter {
    pub fn matches(&self, row: &ForecastRow) -> bool {
        self.zone_id.is_none_or(|z| row.zone_id == z)
            && text_matches(self.borough.as_deref(), row.borough.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneFilter {
    pub borough: Option<String>,
    pub service_zone: Option<String>,
}

impl ZoneFilter {
    pub fn matches(&self, zone: &Zone) -> bool {
        text_matches(self.borough.as_deref(), Some(zone.borough.as_str()))
            && text_matches(
                self.service_zone.as_deref(),
                Some(zone.service_zone.as_deref().unwrap_or("")),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonCodeFilter {
    pub category: Option<String>,
    pub active_only: bool,
}

impl Default for ReasonCodeFilter {
    fn default() -> Self {
        Self {
            category: None,
            active_only: true,
        }
    }
}

impl ReasonCodeFilter {
    pub fn matches(&self, code: &ReasonCode) -> bool {
        (!self.active_only || code.active_flag)
            && text_matches(self.category.as_deref(), Some(code.category.as_str()))
    }
}

/// Case-insensitive equality; an absent filter matches everything.
fn text_matches(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(wanted) => value.is_some_and(|v| v.to_lowercase() == wanted.to_lowercase()),
    }
}

/// Inclusive time range. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts <= e)
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn zone(borough: &str, service_zone: Option<&str>) -> Zone {
        Zone {
            zone_id: 1,
            zone_name: "Newark Airport".into(),
            borough: borough.into(),
            service_zone: service_zone.map(str::to_string),
        }
    }

    #[test]
    fn zone_filter_is_case_insensitive() {
        let filter = ZoneFilter {
            borough: Some("manhattan".into()),
            service_zone: None,
        };
        assert!(filter.matches(&zone("Manhattan", None)));
        assert!(!filter.matches(&zone("Queens", None)));
    }

    #[test]
    fn service_zone_filter_treats_missing_as_empty() {
        let filter = ZoneFilter {
            borough: None,
            service_zone: Some("".into()),
        };
        assert!(filter.matches(&zone("EWR", None)));
        assert!(!filter.matches(&zone("EWR", Some("Airports"))));
    }

    #[test]
    fn reason_code_filter_defaults_to_active_only() {
        let inactive = ReasonCode {
            reason_code: "LEGACY".into(),
            category: "misc".into(),
            description: "retired".into(),
            active_flag: false,
        };
        assert!(!ReasonCodeFilter::default().matches(&inactive));
        let all = ReasonCodeFilter {
            category: None,
            active_only: false,
        };
        assert!(all.matches(&inactive));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        let window = TimeWindow::between(start, end);
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));
        assert!(!window.is_inverted());
        assert!(TimeWindow::between(end, start).is_inverted());
        assert!(TimeWindow::default().contains(start));
    }

    #[test]
    fn guardrail_rates_are_zero_for_empty_run() {
        let summary = GuardrailSummary::default().with_rates();
        assert_eq!(summary.cap_applied_rate, 0.0);

        let summary = GuardrailSummary {
            total_rows: 4,
            cap_applied_rows: 1,
            rate_limited_rows: 2,
            ..Default::default()
        }
        .with_rates();
        assert_eq!(summary.cap_applied_rate, 0.25);
        assert_eq!(summary.rate_limited_rate, 0.5);
    }
}
