use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Json<T>` whose rejections come back as structured [`AppError`] bodies.
///
/// A missing or wrong `Content-Type` maps to `UNSUPPORTED_MEDIA_TYPE`;
/// malformed or mistyped JSON maps to `VALIDATION_ERROR`.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(JsonRejection::MissingJsonContentType(e)) => {
                Err(AppError::UnsupportedMediaType(e.body_text()))
            }
            Err(e) => Err(AppError::Validation(e.body_text())),
        }
    }
}
