use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<String>,
}

impl ErrorResponse {
  pub fn new(error: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: None,
    }
  }

  pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      details: Some(details.into()),
    }
  }
}

/// Failure of a status or icon resolution.
///
/// Unreachable servers are not errors; they resolve to an offline document.
#[derive(Debug, Error)]
pub enum StatusError {
  #[error("cache error: {0}")]
  Cache(#[from] mcstatus_cache::CacheError),

  #[error("failed to serialize status: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("server icon is not valid base64: {0}")]
  IconDecode(#[from] base64::DecodeError),
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
  StatusError(StatusError),
  ValidationError(String),
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    match self {
      AppError::StatusError(status_err) => {
        let (status, response) = match &status_err {
          StatusError::IconDecode(decode_err) => {
            tracing::warn!(%decode_err, "Server sent an undecodable icon");
            (
              StatusCode::BAD_GATEWAY,
              ErrorResponse::with_details(
                "The server returned an invalid icon",
                decode_err.to_string(),
              ),
            )
          }
          StatusError::Cache(_) | StatusError::Serialize(_) => {
            // Don't expose internal errors
            tracing::error!(?status_err, "Status resolution failed");
            (
              StatusCode::INTERNAL_SERVER_ERROR,
              ErrorResponse::new("An internal error occurred. Please try again later."),
            )
          }
        };

        (status, Json(response)).into_response()
      }
      AppError::ValidationError(msg) => {
        tracing::warn!(validation_error = %msg, "Validation failed");
        let error_response = ErrorResponse::new(msg);
        (StatusCode::BAD_REQUEST, Json(error_response)).into_response()
      }
    }
  }
}

impl From<StatusError> for AppError {
  fn from(err: StatusError) -> Self {
    AppError::StatusError(err)
  }
}

impl From<crate::validation::ValidationError> for AppError {
  fn from(err: crate::validation::ValidationError) -> Self {
    AppError::ValidationError(err.to_string())
  }
}
