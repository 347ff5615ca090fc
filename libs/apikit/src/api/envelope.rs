use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use query_core::{Page, PageRequest, PaginationMeta, SortSpec};
use serde::Serialize;

use crate::api::problem::rfc3339_utc;
use crate::api::request_id::XRequestId;

/// Process-wide version stamp carried by every envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionInfo {
    /// Short version label, e.g. `v1`.
    pub api_version: String,
    /// Versioned path prefix, e.g. `/api/v1`.
    pub api_version_path: String,
    pub schema_version: String,
}

impl VersionInfo {
    /// `api_version` is the last non-empty segment of `api_version_path`.
    pub fn from_path(api_version_path: &str, schema_version: impl Into<String>) -> Self {
        let api_version = api_version_path
            .trim_end_matches('/')
            .rsplit('/')
            .find(|seg| !seg.is_empty())
            .unwrap_or("v1")
            .to_string();
        Self {
            api_version,
            api_version_path: api_version_path.to_string(),
            schema_version: schema_version.into(),
        }
    }

    /// Envelope around a single object (or `null`).
    pub fn envelope<T>(&self, request_id: &XRequestId, data: T) -> Envelope<T> {
        Envelope {
            api_version: self.api_version.clone(),
            schema_version: self.schema_version.clone(),
            request_id: request_id.0.clone(),
            generated_at: Utc::now(),
            pagination: None,
            data,
            warnings: Vec::new(),
        }
    }

    /// Envelope around one page of rows with its pagination block.
    pub fn list<T>(
        &self,
        request_id: &XRequestId,
        page: Page<T>,
        request: &PageRequest,
        sort: &SortSpec,
    ) -> Envelope<Vec<T>> {
        let pagination = PaginationMeta::new(request, page.total_count, sort);
        self.envelope(request_id, page.items)
            .with_pagination(pagination)
            .with_warnings(page.warnings)
    }
}

/// Success envelope: `{api_version, schema_version, request_id, generated_at,
/// pagination?, data, warnings?}`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub api_version: String,
    pub schema_version: String,
    pub request_id: String,
    #[serde(serialize_with = "rfc3339_utc")]
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    pub data: T,
    /// Advisory only. Omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> Envelope<T> {
    pub fn with_pagination(mut self, pagination: PaginationMeta) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_core::SortOrder;
    use serde_json::json;

    fn version() -> VersionInfo {
        VersionInfo::from_path("/api/v1", "1.0.0")
    }

    #[test]
    fn api_version_is_last_path_segment() {
        assert_eq!(version().api_version, "v1");
        assert_eq!(VersionInfo::from_path("/api/v2/", "1").api_version, "v2");
    }

    #[test]
    fn empty_warnings_are_omitted() {
        let env = version().envelope(&XRequestId("r-1".into()), json!({"a": 1}));
        let value = serde_json::to_value(&env).unwrap();
        assert!(value.get("warnings").is_none());
        assert!(value.get("pagination").is_none());
        assert_eq!(value["api_version"], "v1");
        assert_eq!(value["schema_version"], "1.0.0");
        assert_eq!(value["request_id"], "r-1");
    }

    #[test]
    fn list_envelope_carries_pagination_and_warnings() {
        let req = PageRequest {
            page: 2,
            page_size: 2,
            offset: 2,
        };
        let page = Page::new(vec![3], 3).with_warning("partial data");
        let env = version().list(
            &XRequestId("r-2".into()),
            page,
            &req,
            &SortSpec::new("zone_id", SortOrder::Asc),
        );
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["data"], json!([3]));
        assert_eq!(value["pagination"]["total_pages"], 2);
        assert_eq!(value["pagination"]["sort"], "zone_id:asc");
        assert_eq!(value["warnings"], json!(["partial data"]));
    }

    #[test]
    fn null_data_is_serialized() {
        let env = version()
            .envelope(&XRequestId("r-3".into()), Option::<u8>::None)
            .with_warning("No pricing run found.");
        let value = serde_json::to_value(&env).unwrap();
        assert!(value["data"].is_null());
        assert_eq!(value["warnings"][0], "No pricing run found.");
    }
}
