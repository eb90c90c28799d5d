use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Request failures, rendered as `{"error": "..."}` bodies
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No data provided")]
    NoData,
    #[error("Data preprocessing failed: {0}")]
    Preprocessing(String),
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoData | ApiError::Preprocessing(_) => StatusCode::BAD_REQUEST,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
