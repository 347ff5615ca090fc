use std::sync::Arc;

use api_ingress::{ApiIngress, ApiIngressConfig, HealthState};
use apikit::{async_trait, ReadinessProbe, ReadinessReport};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use runtime::ApiConfig;
use tower::util::ServiceExt;

struct FixedProbe(ReadinessReport);

#[async_trait]
impl ReadinessProbe for FixedProbe {
    async fn readiness(&self) -> ReadinessReport {
        self.0
    }
}

fn api_routes() -> Router {
    Router::new()
        .route("/api/v1/ping", get(|| async { "pong" }))
        .route("/api/v1/boom", get(boom))
        .route("/api/v1/slow", get(slow))
}

async fn slow() -> &'static str {
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    "late"
}

async fn boom() -> &'static str {
    panic!("handler exploded")
}

fn app_with(report: ReadinessReport, config: ApiIngressConfig) -> Router {
    let health = HealthState::new(ApiConfig::default(), Arc::new(FixedProbe(report)));
    ApiIngress::new(config, health)
        .build_router(api_routes())
        .unwrap()
}

fn ready_report() -> ReadinessReport {
    ReadinessReport {
        db_connected: true,
        pricing_source_ready: true,
        forecast_source_ready: true,
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("x-request-id", "health-rid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_service_identity() {
    let (status, body) = get_json(app_with(ready_report(), Default::default()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["environment"], "local");
    assert_eq!(body["service_name"], "Ride Demand Forecast and Pricing API");
    assert_eq!(body["api_version"], "v1");
    assert_eq!(body["schema_version"], "1.0.0");
    assert_eq!(body["request_id"], "health-rid");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn ready_when_everything_is_up() {
    let (status, body) = get_json(app_with(ready_report(), Default::default()), "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["db_connected"], true);
    assert_eq!(body["database"], "reachable");
}

#[tokio::test]
async fn not_ready_still_answers_200() {
    let (status, body) = get_json(
        app_with(ReadinessReport::default(), Default::default()),
        "/ready",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], false);
    assert_eq!(body["pricing_source_ready"], false);
    assert_eq!(body["forecast_source_ready"], false);
    assert_eq!(body["database"], "unreachable");
}

#[tokio::test]
async fn ready_is_false_when_one_table_is_missing() {
    let report = ReadinessReport {
        forecast_source_ready: false,
        ..ready_report()
    };
    let (_, body) = get_json(app_with(report, Default::default()), "/ready").await;
    assert_eq!(body["ready"], false);
    assert_eq!(body["database"], "reachable");
}

#[tokio::test]
async fn version_reports_build_info() {
    let (status, body) = get_json(app_with(ready_report(), Default::default()), "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_version_path"], "/api/v1");
    assert_eq!(body["project"], "Ride Demand Forecast and Pricing API");
    assert_eq!(body["version"], body["app_version"]);
    assert_eq!(body["request_id"], "health-rid");
}

#[tokio::test]
async fn api_routes_are_mounted() {
    let resp = app_with(ready_report(), Default::default())
        .oneshot(Request::builder().uri("/api/v1/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let (status, body) = get_json(app_with(ready_report(), Default::default()), "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");
    assert_eq!(body["request_id"], "health-rid");
}

#[tokio::test]
async fn panics_become_internal_error_envelope() {
    let (status, body) =
        get_json(app_with(ready_report(), Default::default()), "/api/v1/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["request_id"], "health-rid");
    assert!(!body["message"].as_str().unwrap().contains("exploded"));
}

#[tokio::test]
async fn oversized_body_is_rejected_with_envelope() {
    let config = ApiIngressConfig {
        body_limit_bytes: 8,
        ..Default::default()
    };
    let resp = app_with(ready_report(), config)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/ping")
                .header("content-length", "64")
                .body(Body::from(vec![b'x'; 64]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error_code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn slow_handler_times_out_with_envelope() {
    let config = ApiIngressConfig {
        request_timeout_sec: 1,
        ..Default::default()
    };
    let (status, body) = get_json(app_with(ready_report(), config), "/api/v1/slow").await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error_code"], "REQUEST_TIMEOUT");
    assert_eq!(body["request_id"], "health-rid");
}

#[test]
fn invalid_cors_origin_fails_router_build() {
    let config = ApiIngressConfig {
        cors_enabled: true,
        allowed_origins: vec!["bad\norigin".to_string()],
        ..Default::default()
    };
    let health = HealthState::new(ApiConfig::default(), Arc::new(FixedProbe(ready_report())));
    assert!(ApiIngress::new(config, health)
        .build_router(Router::new())
        .is_err());
}
