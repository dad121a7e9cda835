//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"error": {"code", "message", "field"?}}`
//! so callers can branch on the machine-readable code without parsing
//! messages.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. The domain taxonomy carries the
/// code; this type only adds the HTTP mapping.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub docket_core::Error);

/// Convert a store-level error into an [`ApiError`] via the domain
/// taxonomy.
pub fn store_err<E: Into<docket_core::Error>>(e: E) -> ApiError {
  ApiError(e.into())
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      docket_core::Error::Validation { .. } => StatusCode::BAD_REQUEST,
      docket_core::Error::NotFound(_) => StatusCode::NOT_FOUND,
      docket_core::Error::Conflict(_) => StatusCode::CONFLICT,
      docket_core::Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut error = json!({
      "code": self.0.code(),
      "message": self.0.to_string(),
    });
    if let Some(field) = self.0.field() {
      error["field"] = json!(field);
    }

    (status, Json(json!({ "error": error }))).into_response()
  }
}
