use serde::Serialize;

use apikit::VersionInfo;

/// Endpoint table: `(path, versioned, response model)`.
const ENDPOINTS: &[(&str, bool, &str)] = &[
    ("/health", false, "HealthResponse"),
    ("/ready", false, "ReadinessResponse"),
    ("/version", false, "VersionResponse"),
    ("/pricing/latest", true, "PricingDecisionListResponseV1"),
    ("/pricing/window", true, "PricingDecisionListResponseV1"),
    ("/pricing/zone/{zone_id}", true, "PricingDecisionListResponseV1"),
    ("/pricing/runs/latest", true, "PricingRunSummaryResponseV1"),
    ("/pricing/runs/{run_id}", true, "PricingRunSummaryResponseV1"),
    ("/forecast/latest", true, "ForecastListResponseV1"),
    ("/forecast/window", true, "ForecastListResponseV1"),
    ("/forecast/zone/{zone_id}", true, "ForecastListResponseV1"),
    ("/forecast/runs/latest", true, "ForecastRunSummaryResponseV1"),
    ("/forecast/runs/{run_id}", true, "ForecastRunSummaryResponseV1"),
    ("/metadata/zones", true, "ZoneMetadataListResponseV1"),
    ("/metadata/reason-codes", true, "ReasonCodeListResponseV1"),
    ("/metadata/policy/current", true, "PolicySummaryResponseV1"),
    ("/metadata/schema", true, "SchemaCatalogResponseV1"),
    ("/diagnostics/coverage/latest", true, "CoverageSummaryResponseV1"),
    ("/diagnostics/guardrails/latest", true, "GuardrailUsageSummaryResponseV1"),
    ("/diagnostics/confidence/latest", true, "ConfidenceSummaryResponseV1"),
];

const NON_BREAKING_CHANGES: &[&str] = &[
    "adding optional fields",
    "adding new endpoints",
    "adding reason codes",
];

const BREAKING_CHANGES: &[&str] = &[
    "renaming fields",
    "removing fields",
    "changing field types",
    "changing nesting shape",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaCatalog {
    pub api_version_path: String,
    pub schema_version: String,
    pub compatibility_policy: CompatibilityPolicy,
    pub endpoints: Vec<EndpointEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityPolicy {
    pub non_breaking_changes: Vec<String>,
    pub breaking_changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointEntry {
    pub endpoint_path: String,
    pub method: String,
    pub response_model_name: String,
}

pub fn schema_catalog(version: &VersionInfo) -> SchemaCatalog {
    let prefix = version.api_version_path.trim_end_matches('/');
    let endpoints = ENDPOINTS
        .iter()
        .map(|(path, versioned, model)| EndpointEntry {
            endpoint_path: if *versioned {
                format!("{prefix}{path}")
            } else {
                (*path).to_string()
            },
            method: "GET".to_string(),
            response_model_name: (*model).to_string(),
        })
        .collect();

    SchemaCatalog {
        api_version_path: version.api_version_path.clone(),
        schema_version: version.schema_version.clone(),
        compatibility_policy: CompatibilityPolicy {
            non_breaking_changes: NON_BREAKING_CHANGES.iter().map(|s| s.to_string()).collect(),
            breaking_changes: BREAKING_CHANGES.iter().map(|s| s.to_string()).collect(),
        },
        endpoints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_paths_carry_prefix() {
        let catalog = schema_catalog(&VersionInfo::from_path("/api/v2", "2.0.0"));
        assert_eq!(catalog.schema_version, "2.0.0");
        assert!(catalog
            .endpoints
            .iter()
            .any(|e| e.endpoint_path == "/api/v2/pricing/latest"));
        assert!(catalog.endpoints.iter().any(|e| e.endpoint_path == "/health"));
        assert!(catalog.endpoints.iter().all(|e| e.method == "GET"));
    }

    #[test]
    fn compatibility_policy_lists_both_kinds() {
        let catalog = schema_catalog(&VersionInfo::from_path("/api/v1", "1.0.0"));
        let value = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            value["compatibility_policy"]["breaking_changes"][0],
            "renaming fields"
        );
        assert_eq!(
            value["compatibility_policy"]["non_breaking_changes"]
                .as_array()
                .map(Vec::len),
            Some(3)
        );
    }
}
