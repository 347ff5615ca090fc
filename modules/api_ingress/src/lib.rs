//! HTTP host for the pricing API: the shared middleware stack, the
//! unversioned health endpoints and the serve loop.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{extract::Extension, middleware::from_fn, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

pub mod config;
pub mod request_id;
pub mod shutdown;
pub mod web;

pub use config::ApiIngressConfig;
pub use web::HealthState;

pub struct ApiIngress {
    config: ApiIngressConfig,
    health: Arc<HealthState>,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig, health: HealthState) -> Self {
        Self {
            config,
            health: Arc::new(health),
        }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Merge the health routes into `api` and wrap everything in the
    /// middleware stack. Layers are pushed innermost first.
    pub fn build_router(&self, api: Router) -> Result<Router> {
        tracing::debug!("Building router");
        let mut router = Router::new()
            .route("/health", get(web::health))
            .route("/ready", get(web::ready))
            .route("/version", get(web::version))
            .layer(Extension(self.health.clone()))
            .merge(api);

        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if let Some(cors) = self.cors_layer()? {
            router = router.layer(cors);
        }

        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(self.config.request_timeout_sec.max(1)),
        ));

        router = router.layer(CatchPanicLayer::new());

        // Sees every response produced above, including framework rejections.
        router = router.layer(from_fn(apikit::error_mapping_middleware));

        router = router.layer(from_fn(request_id::push_req_id_to_extensions));

        router = router.layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();

        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));

        router = router.layer(SetRequestIdLayer::new(
            x_request_id,
            request_id::MakeReqId,
        ));

        Ok(router)
    }

    fn cors_layer(&self) -> Result<Option<CorsLayer>> {
        if !self.config.cors_enabled {
            return Ok(None);
        }
        if self.config.allowed_origins.is_empty() {
            return Ok(Some(CorsLayer::permissive()));
        }
        let origins = self
            .config
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{o}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(Any),
        ))
    }
}

/// Bind `addr` and serve until `cancel` fires, then drain in-flight requests
/// for at most `grace` (zero waits indefinitely).
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    cancel: CancellationToken,
    grace: Duration,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    let shutdown = {
        let cancel = cancel.clone();
        async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        }
    };
    let deadline = async move {
        cancel.cancelled().await;
        if grace.is_zero() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .into_future();

    tokio::select! {
        res = server => res.map_err(|e| anyhow::anyhow!(e)),
        _ = deadline => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping connections"
            );
            Ok(())
        }
    }
}
