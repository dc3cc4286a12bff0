//! Request extractors that report malformed input in the service's error
//! envelope instead of axum's plain-text rejections.

use crate::errors::CmsError;
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body; a rejection becomes `CmsError::ValidationFailed`.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

/// Path parameters; a rejection becomes `CmsError::ValidationFailed`.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for CmsError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(target: "cms.handlers", error = %rejection, "Request body rejected");
        CmsError::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for CmsError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(target: "cms.handlers", error = %rejection, "Path parameter rejected");
        CmsError::invalid(rejection.body_text())
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CmsError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = CmsError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
