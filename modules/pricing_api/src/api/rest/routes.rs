use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Mounts every versioned endpoint under the service's `api_version_path`.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let prefix = service.version().api_version_path.clone();

    let api = Router::new()
        // pricing
        .route("/pricing/latest", get(handlers::pricing_latest))
        .route("/pricing/window", get(handlers::pricing_window))
        .route("/pricing/zone/{zone_id}", get(handlers::pricing_zone_timeline))
        .route("/pricing/runs/latest", get(handlers::pricing_latest_run))
        .route("/pricing/runs/{run_id}", get(handlers::pricing_run))
        // forecast
        .route("/forecast/latest", get(handlers::forecast_latest))
        .route("/forecast/window", get(handlers::forecast_window))
        .route("/forecast/zone/{zone_id}", get(handlers::forecast_zone_timeline))
        .route("/forecast/runs/latest", get(handlers::forecast_latest_run))
        .route("/forecast/runs/{run_id}", get(handlers::forecast_run))
        // metadata
        .route("/metadata/zones", get(handlers::zones))
        .route("/metadata/reason-codes", get(handlers::reason_codes))
        .route("/metadata/policy/current", get(handlers::current_policy))
        .route("/metadata/schema", get(handlers::schema_catalog))
        // diagnostics
        .route("/diagnostics/coverage/latest", get(handlers::coverage))
        .route("/diagnostics/guardrails/latest", get(handlers::guardrails))
        .route("/diagnostics/confidence/latest", get(handlers::confidence))
        .layer(Extension(service));

    router.nest(&prefix, api)
}
