use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

/// `Query<T>` whose rejection is rendered as `INVALID_QUERY_PARAM`.
#[derive(Debug, Clone, Default)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            match Query::<T>::from_request_parts(parts, state).await {
                Ok(Query(value)) => Ok(ValidQuery(value)),
                Err(rejection) => Err(ApiError::InvalidQueryParam {
                    message: "Query string could not be parsed.".to_owned(),
                    details: Some(serde_json::json!({ "reason": rejection.body_text() })),
                }),
            }
        }
    }
}
