use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Module configuration, read from `modules.pricing_api.config`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PricingApiConfig {
    #[serde(default)]
    pub tables: TableNames,
}

/// Physical table names of the pricing warehouse.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TableNames {
    pub pricing: String,
    pub pricing_run_log: String,
    pub forecast: String,
    pub forecast_run_log: String,
    pub zone: String,
    pub reason_code: String,
    pub policy_snapshot: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            pricing: "pricing_decisions".into(),
            pricing_run_log: "pricing_run_log".into(),
            forecast: "demand_forecast".into(),
            forecast_run_log: "scoring_run_log".into(),
            zone: "dim_zone".into(),
            reason_code: "reason_code_reference".into(),
            policy_snapshot: "pricing_policy_snapshot".into(),
        }
    }
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid identifier regex"))
}

impl TableNames {
    /// Table names are spliced into SQL, so each must be a bare identifier.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (key, name) in self.entries() {
            if !identifier_re().is_match(name) {
                anyhow::bail!("tables.{key}: '{name}' is not a valid SQL identifier");
            }
        }
        Ok(())
    }

    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("pricing", &self.pricing),
            ("pricing_run_log", &self.pricing_run_log),
            ("forecast", &self.forecast),
            ("forecast_run_log", &self.forecast_run_log),
            ("zone", &self.zone),
            ("reason_code", &self.reason_code),
            ("policy_snapshot", &self.policy_snapshot),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        TableNames::default().validate().unwrap();
    }

    #[test]
    fn rejects_injection_in_table_name() {
        let tables = TableNames {
            zone: "dim_zone; DROP TABLE x".into(),
            ..Default::default()
        };
        let err = tables.validate().unwrap_err().to_string();
        assert!(err.contains("tables.zone"));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg: PricingApiConfig =
            serde_yaml::from_str("tables:\n  pricing: pricing_v2\n").unwrap();
        assert_eq!(cfg.tables.pricing, "pricing_v2");
        assert_eq!(cfg.tables.zone, "dim_zone");
    }
}
