//! Plain-language annotations for pricing and forecast rows.
//!
//! Everything here is a pure function of the row and the policy, so two
//! requests for the same row always read the same way.

use serde::Serialize;

use crate::contract::model::{ForecastRow, PricingRow};

const DEFAULT_REASON_SUMMARY: &str = "Pricing decision followed policy defaults.";

/// Thresholds for the coarse demand outlook, lower-inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandOutlookPolicy {
    pub normal_from: f64,
    pub elevated_from: f64,
    pub high_from: f64,
}

impl Default for DemandOutlookPolicy {
    fn default() -> Self {
        Self {
            normal_from: 5.0,
            elevated_from: 15.0,
            high_from: 25.0,
        }
    }
}

impl DemandOutlookPolicy {
    pub fn from_thresholds([normal_from, elevated_from, high_from]: [f64; 3]) -> Self {
        Self {
            normal_from,
            elevated_from,
            high_from,
        }
    }

    pub fn label(&self, y_pred: f64) -> &'static str {
        if y_pred >= self.high_from {
            "high"
        } else if y_pred >= self.elevated_from {
            "elevated"
        } else if y_pred >= self.normal_from {
            "normal"
        } else {
            "low"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnnotationPolicy {
    /// Label negative deltas as decreases instead of "No price change".
    pub mirror_price_decreases: bool,
    pub demand: DemandOutlookPolicy,
}

impl AnnotationPolicy {
    pub fn price_action_label(&self, final_multiplier: f64) -> &'static str {
        let delta = final_multiplier - 1.0;
        if delta > 0.0 {
            match delta {
                d if d < 0.10 => "Small increase",
                d if d < 0.25 => "Moderate increase",
                _ => "Larger increase",
            }
        } else if self.mirror_price_decreases && delta < 0.0 {
            match -delta {
                d if d < 0.10 => "Small decrease",
                d if d < 0.25 => "Moderate decrease",
                _ => "Larger decrease",
            }
        } else {
            "No price change"
        }
    }

    pub fn pricing_fields(&self, row: &PricingRow) -> PricingPlainFields {
        let action = self.price_action_label(row.final_multiplier);
        let guardrails_fired = row.cap_applied || row.rate_limit_applied;
        PricingPlainFields {
            recommended_price_action: action.to_string(),
            why_this_price: why_this_price(action, guardrails_fired, &row.reason_summary),
            guardrail_note: guardrail_note(
                row.cap_applied,
                row.rate_limit_applied,
                row.cap_reason.as_deref(),
                row.cap_type.as_deref(),
            ),
            confidence_note: confidence_note(
                row.confidence_score,
                Some(row.uncertainty_band.as_str()),
            ),
        }
    }

    pub fn forecast_fields(&self, row: &ForecastRow) -> ForecastPlainFields {
        ForecastPlainFields {
            demand_outlook_label: self.demand.label(row.y_pred).to_string(),
            confidence_note: confidence_note(
                row.confidence_score,
                Some(row.uncertainty_band.as_str()),
            ),
            forecast_range_summary: forecast_range_summary(row.y_pred_lower, row.y_pred_upper),
        }
    }
}

/// Label under the default policy.
pub fn price_action_label(final_multiplier: f64) -> &'static str {
    AnnotationPolicy::default().price_action_label(final_multiplier)
}

/// Label under the default thresholds (5 / 15 / 25).
pub fn demand_outlook_label(y_pred: f64) -> &'static str {
    DemandOutlookPolicy::default().label(y_pred)
}

pub fn guardrail_note(
    cap_applied: bool,
    rate_limit_applied: bool,
    cap_reason: Option<&str>,
    cap_type: Option<&str>,
) -> String {
    let reason = || {
        cap_reason
            .filter(|r| !r.is_empty())
            .or(cap_type.filter(|t| !t.is_empty()))
            .unwrap_or("policy")
            .replace('_', " ")
    };
    match (cap_applied, rate_limit_applied) {
        (true, true) => format!(
            "Both cap and rate limiting were applied due to {}.",
            reason()
        ),
        (true, false) => format!("A pricing cap was applied due to {}.", reason()),
        (false, true) => {
            "Rate limiting smoothed the multiplier change between time buckets.".to_string()
        }
        (false, false) => "No cap or rate limit guardrail was applied.".to_string(),
    }
}

pub fn confidence_note(confidence_score: f64, uncertainty_band: Option<&str>) -> String {
    let band = uncertainty_band
        .filter(|b| !b.trim().is_empty())
        .unwrap_or("unknown")
        .to_lowercase();
    let tier = if confidence_score >= 0.8 {
        "High"
    } else if confidence_score >= 0.5 {
        "Medium"
    } else {
        "Low"
    };
    format!("{tier} confidence forecast with {band} uncertainty band.")
}

pub fn why_this_price(action: &str, guardrails_fired: bool, reason_summary: &str) -> String {
    let summary = match reason_summary.trim() {
        "" => DEFAULT_REASON_SUMMARY,
        s => s,
    };
    if guardrails_fired {
        format!("{action} was recommended and then adjusted by guardrails. {summary}")
    } else {
        format!("{action} was recommended from forecasted demand signals. {summary}")
    }
}

pub fn forecast_range_summary(y_pred_lower: f64, y_pred_upper: f64) -> String {
    format!("Expected demand range is {y_pred_lower:.2} to {y_pred_upper:.2}.")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingPlainFields {
    pub recommended_price_action: String,
    pub why_this_price: String,
    pub guardrail_note: String,
    pub confidence_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastPlainFields {
    pub demand_outlook_label: String,
    pub confidence_note: String,
    pub forecast_range_summary: String,
}

/// Rows that carry plain-language companions.
pub trait Annotate {
    type Notes: Serialize;

    fn notes(&self, policy: &AnnotationPolicy) -> Self::Notes;
}

impl Annotate for PricingRow {
    type Notes = PricingPlainFields;

    fn notes(&self, policy: &AnnotationPolicy) -> Self::Notes {
        policy.pricing_fields(self)
    }
}

impl Annotate for ForecastRow {
    type Notes = ForecastPlainFields;

    fn notes(&self, policy: &AnnotationPolicy) -> Self::Notes {
        policy.forecast_fields(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_action_bands() {
        assert_eq!(price_action_label(1.0), "No price change");
        assert_eq!(price_action_label(0.8), "No price change");
        assert_eq!(price_action_label(1.05), "Small increase");
        assert_eq!(price_action_label(1.15), "Moderate increase");
        assert_eq!(price_action_label(1.25), "Larger increase");
        assert_eq!(price_action_label(1.4), "Larger increase");
        assert_eq!(price_action_label(2.0), "Larger increase");
    }

    fn action_tier(label: &str) -> i32 {
        match label {
            "Larger decrease" => -3,
            "Moderate decrease" => -2,
            "Small decrease" => -1,
            "No price change" => 0,
            "Small increase" => 1,
            "Moderate increase" => 2,
            "Larger increase" => 3,
            other => panic!("unexpected label {other}"),
        }
    }

    #[test]
    fn price_action_tier_never_drops_as_multiplier_rises() {
        for mirror_price_decreases in [false, true] {
            let policy = AnnotationPolicy {
                mirror_price_decreases,
                ..Default::default()
            };
            let mut prev = i32::MIN;
            for step in 0..=2000 {
                let multiplier = step as f64 / 1000.0;
                let tier = action_tier(policy.price_action_label(multiplier));
                assert!(
                    tier >= prev,
                    "tier dropped at {multiplier} (mirror={mirror_price_decreases})"
                );
                prev = tier;
            }
        }
    }

    #[test]
    fn mirrored_decreases() {
        let policy = AnnotationPolicy {
            mirror_price_decreases: true,
            ..Default::default()
        };
        assert_eq!(policy.price_action_label(1.0), "No price change");
        assert_eq!(policy.price_action_label(0.95), "Small decrease");
        assert_eq!(policy.price_action_label(0.85), "Moderate decrease");
        assert_eq!(policy.price_action_label(0.5), "Larger decrease");
    }

    #[test]
    fn demand_outlook_reference_points() {
        assert_eq!(demand_outlook_label(2.0), "low");
        assert_eq!(demand_outlook_label(10.0), "normal");
        assert_eq!(demand_outlook_label(20.0), "elevated");
        assert_eq!(demand_outlook_label(35.0), "high");
    }

    #[test]
    fn demand_outlook_boundaries_are_lower_inclusive() {
        assert_eq!(demand_outlook_label(4.99), "low");
        assert_eq!(demand_outlook_label(5.0), "normal");
        assert_eq!(demand_outlook_label(14.99), "normal");
        assert_eq!(demand_outlook_label(15.0), "elevated");
        assert_eq!(demand_outlook_label(25.0), "high");
    }

    #[test]
    fn demand_outlook_thresholds_are_tunable() {
        let policy = DemandOutlookPolicy::from_thresholds([1.0, 2.0, 3.0]);
        assert_eq!(policy.label(2.5), "elevated");
        assert_eq!(policy.label(3.0), "high");
    }

    #[test]
    fn guardrail_note_mentions_cap_whenever_cap_applied() {
        for rate_limited in [false, true] {
            let note = guardrail_note(true, rate_limited, None, Some("max_cap"));
            assert!(note.to_lowercase().contains("cap"), "{note}");
        }
        assert_eq!(
            guardrail_note(true, false, Some("surge_ceiling"), None),
            "A pricing cap was applied due to surge ceiling."
        );
        assert_eq!(
            guardrail_note(true, true, None, None),
            "Both cap and rate limiting were applied due to policy."
        );
    }

    #[test]
    fn guardrail_note_without_guardrails() {
        assert_eq!(
            guardrail_note(false, false, Some("ignored"), None),
            "No cap or rate limit guardrail was applied."
        );
        assert_eq!(
            guardrail_note(false, true, None, None),
            "Rate limiting smoothed the multiplier change between time buckets."
        );
    }

    #[test]
    fn confidence_tiers() {
        assert_eq!(
            confidence_note(0.9, Some("LOW")),
            "High confidence forecast with low uncertainty band."
        );
        assert_eq!(
            confidence_note(0.5, Some("medium")),
            "Medium confidence forecast with medium uncertainty band."
        );
        assert_eq!(
            confidence_note(0.2, None),
            "Low confidence forecast with unknown uncertainty band."
        );
    }

    #[test]
    fn why_this_price_mentions_guardrails_when_fired() {
        let text = why_this_price("Moderate increase", true, "High demand.");
        assert!(text.to_lowercase().contains("guardrails"));
        assert!(text.starts_with("Moderate increase"));

        let text = why_this_price("No price change", false, "  ");
        assert_eq!(
            text,
            "No price change was recommended from forecasted demand signals. Pricing decision followed policy defaults."
        );
    }

    #[test]
    fn range_summary_uses_two_decimals() {
        assert_eq!(
            forecast_range_summary(3.0, 12.456),
            "Expected demand range is 3.00 to 12.46."
        );
    }
}
