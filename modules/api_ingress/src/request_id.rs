use axum::http::Request;
use axum::{body::Body, middleware::Next, response::Response};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::field::Empty;

pub use apikit::api::request_id::header;
pub use apikit::XRequestId;

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

/// Middleware that stores request_id in Request.extensions and records it in the current span
pub async fn push_req_id_to_extensions(mut req: Request<Body>, next: Next) -> Response {
    let rid = req
        .headers()
        .get(header())
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| "n/a".to_string());

    req.extensions_mut().insert(XRequestId(rid.clone()));
    tracing::Span::current().record("request_id", tracing::field::display(&rid));

    next.run(req).await
}

#[allow(clippy::type_complexity)]
pub fn create_trace_layer() -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
    (),
    impl Fn(&Response, std::time::Duration, &tracing::Span) + Clone,
> {
    use tower_http::trace::TraceLayer;

    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let rid = req
                .headers()
                .get(header())
                .and_then(|v| v.to_str().ok())
                .unwrap_or("n/a");
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri().path(),
                version = ?req.version(),
                request_id = %rid,
                status = Empty,
                latency_ms = Empty
            )
        })
        .on_request(())
        .on_response(
            |res: &Response, latency: std::time::Duration, span: &tracing::Span| {
                span.record("status", res.status().as_u16());
                span.record("latency_ms", latency.as_millis() as u64);
                tracing::debug!(parent: span, "request completed");
            },
        )
}
