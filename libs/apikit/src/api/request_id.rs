use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderName};

/// Request id of the current request, as stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XRequestId(pub String);

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

impl XRequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Prefers the extension set by the ingress middleware, then the raw header.
impl<S> FromRequestParts<S> for XRequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let rid = parts
            .extensions
            .get::<XRequestId>()
            .cloned()
            .or_else(|| {
                parts
                    .headers
                    .get(header())
                    .and_then(|v| v.to_str().ok())
                    .map(|s| XRequestId(s.to_owned()))
            })
            .unwrap_or_else(|| XRequestId("n/a".to_owned()));
        async move { Ok(rid) }
    }
}
