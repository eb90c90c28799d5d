//! HTTP inference service for VBAC success prediction.
//!
//! The router is built around an [`AppState`] holding the loaded
//! [`ModelArtifact`]. The artifact is loaded once before the listener is bound
//! and is never mutated afterwards, so handlers share it without locking.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tower_http::cors::{Any, CorsLayer};
use vbac_model::{Assessment, ModelArtifact};

pub mod error;

pub use error::ApiError;

/// Immutable per-process service context
#[derive(Debug, Clone)]
pub struct AppState {
    artifact: Arc<ModelArtifact>,
}

impl AppState {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
        }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub prediction: Assessment,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub schema_version: String,
    pub classifier: String,
    pub created_at: String,
    pub columns: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/features", get(features))
        .route("/predict", post(predict))
        .layer(cors)
        .with_state(state)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn features(State(state): State<AppState>) -> Json<FeaturesResponse> {
    let artifact = state.artifact();
    Json(FeaturesResponse {
        schema_version: artifact.manifest().schema_version().to_string(),
        classifier: artifact.metadata().classifier.clone(),
        created_at: artifact.metadata().created_at.clone(),
        columns: artifact.manifest().columns().to_vec(),
    })
}

/// Encode the posted record against the artifact's manifest and score it
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let record = parse_body(&body)?;
    let artifact = state.artifact();

    let encoded = artifact
        .encoder()
        .encode_json(&record)
        .map_err(|e| ApiError::Preprocessing(e.to_string()))?;
    if !encoded.absent.is_empty() {
        log::debug!("Absent fields defaulted: {}", encoded.absent.join(", "));
    }

    let prediction = artifact
        .assess(&encoded.vector)
        .map_err(|e| ApiError::Prediction(e.to_string()))?;
    log::info!(
        "Predicted {:.1}% ({}) with {} diagnostic(s)",
        prediction.probability,
        prediction.risk_level,
        encoded.diagnostics.len()
    );
    Ok(Json(PredictResponse {
        success: true,
        prediction,
    }))
}

/// Empty bodies, `null` and `{}` all count as no data
fn parse_body(body: &[u8]) -> Result<JsonValue, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::NoData);
    }
    let value: JsonValue = serde_json::from_slice(body)
        .map_err(|e| ApiError::Preprocessing(format!("invalid JSON: {e}")))?;
    match &value {
        JsonValue::Null => Err(ApiError::NoData),
        JsonValue::Object(map) if map.is_empty() => Err(ApiError::NoData),
        _ => Ok(value),
    }
}
