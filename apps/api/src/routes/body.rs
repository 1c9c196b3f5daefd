use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderValue},
    Form, Json,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// Accepts either a JSON body or a url-encoded form, chosen by `Content-Type`.
/// A request without `Content-Type` is read as a form, so an empty body yields
/// `T` built from no fields. Rejections surface as `AppError::Validation` (400).
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(mut req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap_or_default().to_string());
        let is_json = content_type
            .as_deref()
            .map(|ct| ct.trim_start().starts_with("application/json"))
            .unwrap_or(false);

        if content_type.is_none() {
            req.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e.body_text())))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(format!("Invalid form body: {}", e.body_text())))?;
            Ok(Self(value))
        }
    }
}
