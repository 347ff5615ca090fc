use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::api::catalog::{self, ErrDef};
use crate::api::problem::{ErrorBody, ErrorResponse};

/// Unified API error type that handles all failures at the API boundary.
///
/// Handlers return `ApiResult<T>` and use `?`; conversion into the JSON
/// error envelope happens once, in `into_response`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Malformed or out-of-range pagination, sort or filter input.
    #[error("{message}")]
    InvalidQueryParam {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Inverted, malformed or missing time window bounds.
    #[error("{0}")]
    InvalidTimeWindow(String),

    #[error("Unknown zone_id: {0}")]
    ZoneNotFound(i64),

    #[error("{0}")]
    RunNotFound(String),

    #[error("{0}")]
    NotFound(String),

    /// Anything unanticipated. Never rendered verbatim.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        ApiError::InvalidQueryParam {
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_parameter(parameter: &str, message: impl Into<String>) -> Self {
        ApiError::InvalidQueryParam {
            message: message.into(),
            details: Some(json!({ "parameter": parameter })),
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(err.into())
    }

    /// Catalog entry backing this error.
    pub fn def(&self) -> &'static ErrDef {
        match self {
            ApiError::InvalidQueryParam { .. } => &catalog::INVALID_QUERY_PARAM,
            ApiError::InvalidTimeWindow(_) => &catalog::INVALID_TIME_WINDOW,
            ApiError::ZoneNotFound(_) => &catalog::ZONE_NOT_FOUND,
            ApiError::RunNotFound(_) => &catalog::RUN_NOT_FOUND,
            ApiError::NotFound(_) => &catalog::NOT_FOUND,
            ApiError::Internal(_) => &catalog::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        self.def().code
    }

    /// Render the client-facing body. Internal errors get the generic message.
    pub fn to_body(&self) -> ErrorBody {
        let def = self.def();
        match self {
            ApiError::Internal(_) => def.to_default_body(),
            ApiError::InvalidQueryParam {
                message,
                details: Some(details),
            } => def.to_body(message.clone()).with_details(details.clone()),
            other => def.to_body(other.to_string()),
        }
    }
}

impl From<query_core::Error> for ApiError {
    fn from(e: query_core::Error) -> Self {
        ApiError::invalid_parameter(e.parameter(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let def = self.def();
        let status = def.status_code();

        match &self {
            ApiError::Internal(err) => tracing::error!(
                error_code = def.code,
                error = ?err,
                status = status.as_u16(),
                "request failed"
            ),
            other => tracing::warn!(
                error_code = def.code,
                error = %other,
                status = status.as_u16(),
                "request failed"
            ),
        }

        ErrorResponse::new(status, self.to_body()).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn kinds_map_to_status_and_code() {
        let cases = [
            (ApiError::invalid_query("bad"), 400, "INVALID_QUERY_PARAM"),
            (
                ApiError::InvalidTimeWindow("inverted".into()),
                400,
                "INVALID_TIME_WINDOW",
            ),
            (ApiError::ZoneNotFound(999), 404, "ZONE_NOT_FOUND"),
            (
                ApiError::RunNotFound("Pricing run_id not found: r1".into()),
                404,
                "RUN_NOT_FOUND",
            ),
            (ApiError::NotFound("gone".into()), 404, "NOT_FOUND"),
            (
                ApiError::internal(anyhow::anyhow!("pool timed out")),
                500,
                "INTERNAL_SERVER_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.def().status, status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn internal_error_never_leaks_source() {
        let err = ApiError::internal(anyhow::anyhow!("password authentication failed"));
        let body = err.to_body();
        assert_eq!(body.message, "The server encountered an unexpected error.");
        assert!(body.details.is_none());

        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn zone_not_found_message_names_zone() {
        let body = ApiError::ZoneNotFound(999).to_body();
        assert_eq!(body.message, "Unknown zone_id: 999");
    }

    #[test]
    fn query_core_errors_become_invalid_query_param() {
        let err: ApiError = query_core::Error::PageSizeTooLarge { max: 200 }.into();
        let body = err.to_body();
        assert_eq!(body.error_code, "INVALID_QUERY_PARAM");
        assert_eq!(body.message, "page_size must be <= 200");
        assert_eq!(body.details, Some(json!({ "parameter": "page_size" })));
    }
}
