use axum::body::{to_bytes, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tests::{natality_batch, registry, request_for_row, trained_artifact};
use vbac_server::{features, health, predict, ApiError, AppState};

fn state() -> AppState {
    AppState::new(trained_artifact())
}

async fn error_body(err: ApiError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    assert_eq!(health().await, "ok");
}

#[tokio::test]
async fn features_lists_the_manifest() {
    let state = state();
    let expected = state.artifact().manifest().columns().to_vec();
    let body = features(State(state)).await.0;
    assert_eq!(body.columns, expected);
    assert_eq!(body.schema_version, vbac_schema::NATALITY_SCHEMA_VERSION);
}

#[tokio::test]
async fn predict_returns_a_percentage_and_tier() {
    let registry = registry();
    let table = natality_batch(3, 42);
    let body = request_for_row(&registry, &table, 0).to_string();

    let response = predict(State(state()), Bytes::from(body)).await.unwrap().0;
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["success"], true);
    let pct = value["prediction"]["probability"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&pct));
    let tier = value["prediction"]["risk_level"].as_str().unwrap();
    assert!(["Low", "Medium", "High"].contains(&tier));
    assert_eq!(
        value["prediction"]["message"],
        response.prediction.risk_level.recommendation()
    );
}

#[tokio::test]
async fn partial_record_still_predicts() {
    let body = json!({
        "Mother's Age": 30,
        "Previous Preterm Birth": "No",
        "Mother's Race": "White",
        "Mother's Education": "PhD-ish",
        "Unrelated": 1
    })
    .to_string();
    let response = predict(State(state()), Bytes::from(body)).await.unwrap().0;
    assert!(response.success);
}

#[tokio::test]
async fn empty_body_is_bad_request() {
    for body in ["", "null", "{}"] {
        let err = predict(State(state()), Bytes::from(body)).await.unwrap_err();
        let (status, value) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value, json!({ "error": "No data provided" }));
    }
}

#[tokio::test]
async fn malformed_record_is_a_preprocessing_failure() {
    let err = predict(State(state()), Bytes::from("[1, 2, 3]"))
        .await
        .unwrap_err();
    let (status, value) = error_body(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"]
        .as_str()
        .unwrap()
        .starts_with("Data preprocessing failed: "));
}

#[tokio::test]
async fn prediction_failure_maps_to_500() {
    let (status, value) = error_body(ApiError::Prediction("boom".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["error"], "Prediction failed: boom");
}
