use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Fixed-shape JSON error envelope returned for every failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code clients can switch on.
    pub error_code: String,
    /// Human-readable explanation.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Filled in by the boundary middleware.
    pub request_id: Option<String>,
    #[serde(serialize_with = "rfc3339_utc")]
    pub timestamp: DateTime<Utc>,
}

/// Serializes a UTC timestamp as RFC 3339 with millisecond precision.
pub fn rfc3339_utc<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl ErrorBody {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
            request_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Axum response wrapper that renders an [`ErrorBody`] with its status.
///
/// The body is also stored in the response extensions so the boundary
/// middleware can stamp the request id without re-parsing JSON.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, body: ErrorBody) -> Self {
        Self { status, body }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let mut resp = axum::Json(&self.body).into_response();
        *resp.status_mut() = self.status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        resp.extensions_mut().insert(self.body);
        resp
    }
}
