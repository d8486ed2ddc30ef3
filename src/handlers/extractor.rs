//! Extractors producing `{"detail": ...}` error responses
//!
//! Wrap Axum's `Json` and `Path` extractors so malformed bodies and
//! non-integer ids are answered in the same shape as the handlers' own errors.

use crate::error::AppError;
use crate::store::ItemId;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// JSON body rejection with a `detail` message
///
/// Status codes follow the kind of rejection:
/// - JSON syntax errors → 400 Bad Request
/// - Data errors (missing or mistyped fields) → 422 Unprocessable Entity
/// - Missing content type → 415 Unsupported Media Type
pub struct JsonBodyRejection(JsonRejection);

impl IntoResponse for JsonBodyRejection {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            JsonRejection::JsonSyntaxError(_) => (StatusCode::BAD_REQUEST, self.0.body_text()),
            JsonRejection::JsonDataError(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json".to_string(),
            ),
            _ => (StatusCode::BAD_REQUEST, self.0.body_text()),
        };

        tracing::debug!(status = %status, detail = %detail, "Rejected request body");
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

/// JSON body extractor, use instead of `axum::Json` in item handlers
pub struct ItemJson<T>(pub T);

impl<S, T> FromRequest<S> for ItemJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = JsonBodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ItemJson(value)),
            Err(rejection) => Err(JsonBodyRejection(rejection)),
        }
    }
}

/// `{id}` path segment parsed as an [`ItemId`]
///
/// Non-integer ids are rejected with 400 and a `detail` message.
pub struct ItemPath(pub ItemId);

impl<S> FromRequestParts<S> for ItemPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<ItemId>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(ItemPath(id)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}
