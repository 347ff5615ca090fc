//! Centralized error mapping for Axum.
//!
//! Every non-success response leaves the router in the error envelope shape:
//! bodies produced by [`ApiError`](crate::ApiError) get the request id
//! stamped in, and bare framework responses (unknown route, wrong method,
//! timeout, body limit, caught panic) are replaced by the catalog entry for
//! their status.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::catalog;
use crate::api::problem::{ErrorBody, ErrorResponse};
use crate::api::request_id::{header, XRequestId};

pub async fn error_mapping_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<XRequestId>()
        .map(|r| r.0.clone())
        .or_else(|| {
            request
                .headers()
                .get(header())
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        });
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let body = match parts.extensions.remove::<ErrorBody>() {
        Some(body) => body,
        None => {
            let def = catalog::for_status(status);
            if status.is_server_error() {
                tracing::error!(status = status.as_u16(), path = %path, "unhandled failure");
            } else {
                tracing::debug!(status = status.as_u16(), path = %path, "framework rejection");
            }
            def.to_default_body()
        }
    };
    let body = match request_id {
        Some(id) => body.with_request_id(id),
        None => body,
    };

    let mut rebuilt = ErrorResponse::new(status, body).into_response();
    for (name, value) in parts.headers.iter() {
        if name != axum::http::header::CONTENT_TYPE && name != axum::http::header::CONTENT_LENGTH {
            rebuilt.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use axum::http::StatusCode;
    use axum::{body::Body, http::Request as HttpRequest, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route(
                "/zone",
                get(|| async { Err::<(), _>(ApiError::ZoneNotFound(42)) }),
            )
            .layer(from_fn(error_mapping_middleware))
    }

    async fn json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_passes_through() {
        let resp = app()
            .oneshot(HttpRequest::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_errors_get_request_id() {
        let resp = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/zone")
                    .header("x-request-id", "rid-7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json(resp).await;
        assert_eq!(body["error_code"], "ZONE_NOT_FOUND");
        assert_eq!(body["message"], "Unknown zone_id: 42");
        assert_eq!(body["request_id"], "rid-7");
    }

    #[tokio::test]
    async fn unknown_route_becomes_not_found_envelope() {
        let resp = app()
            .oneshot(HttpRequest::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json(resp).await;
        assert_eq!(body["error_code"], "NOT_FOUND");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn wrong_method_becomes_envelope() {
        let resp = app()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/ok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = json(resp).await;
        assert_eq!(body["error_code"], "METHOD_NOT_ALLOWED");
    }
}
