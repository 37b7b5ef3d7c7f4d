//! HTTP surface: liveness at `/` and inference at `/predict`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::common::config::AppCfg;
use crate::common::error::{ErrorCode, ServeError, ServeResult};
use crate::inference::{service, PredictRequest, Prediction};
use crate::store::ModelStore;

/// Fixed body returned by the liveness route.
pub const LIVENESS: &str = "Water Potability Prediction API is running!";

/// Shared handler state, injected once at router construction.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ModelStore>,
}

impl AppState {
    pub fn new(store: ModelStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Transport status for each error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Ok => StatusCode::OK,
        ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCode::DimensionMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::ArtifactMissing
        | ErrorCode::ArtifactCorrupt
        | ErrorCode::ArtifactIncompatible
        | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        (status_for(self.code), Json(json!({ "error": self.msg }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .with_state(state)
}

pub async fn home() -> &'static str {
    LIVENESS
}

pub async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    match run_predict(&state.store, &body) {
        Ok(prediction) => {
            info!(
                ev = "predict",
                code = ErrorCode::Ok as u32,
                potability = prediction.potability,
                dur_us = prediction.latency_us,
                "prediction served"
            );
            Json(prediction).into_response()
        }
        Err(err) => {
            warn!(
                ev = "predict",
                code = err.code as u32,
                reason = %err.code,
                msg = %err.msg,
                "prediction rejected"
            );
            err.into_response()
        }
    }
}

fn run_predict(store: &ModelStore, body: &[u8]) -> ServeResult<Prediction> {
    let request = PredictRequest::from_slice(body)?;
    service::predict(store, &request.features)
}

/// Bind the listener and serve until Ctrl-C.
pub async fn serve(cfg: &AppCfg, store: ModelStore) -> std::io::Result<()> {
    let listener = TcpListener::bind(&cfg.bind_addr).await?;
    info!(ev = "listen", addr = %listener.local_addr()?, "serving predictions");

    axum::serve(listener, router(AppState::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(ev = "stopped", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // without a signal handler, run until the process is killed
        std::future::pending::<()>().await;
    }
    info!(ev = "shutdown", "shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Classifier, Scaler};
    use serde_json::Value;

    fn state() -> AppState {
        let scaler = Scaler::Standard {
            mean: vec![7.0, 300.0, 4.0],
            scale: vec![1.5, 40.0, 0.8],
        };
        let classifier = Classifier::Logistic {
            classes: vec![0, 1],
            coef: vec![-0.4, 0.6, -0.9],
            intercept: 0.05,
        };
        AppState::new(ModelStore::new(scaler, classifier).unwrap())
    }

    async fn call(body: &str) -> (StatusCode, Value) {
        let response = predict(State(state()), Bytes::from(body.to_owned())).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn home_reports_liveness() {
        assert_eq!(home().await, "Water Potability Prediction API is running!");
    }

    #[tokio::test]
    async fn predict_returns_binary_label() {
        let (status, body) = call(r#"{"features": [7.0, 330.0, 3.5]}"#).await;
        assert_eq!(status, StatusCode::OK);
        let label = body["potability"].as_i64().unwrap();
        assert!(label == 0 || label == 1);
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn predict_is_idempotent() {
        let body = r#"{"features": [6.5, 280.0, 4.4]}"#;
        let (_, first) = call(body).await;
        let (_, second) = call(body).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_features_key_is_bad_request() {
        let (status, body) = call(r#"{"ph": 7.0}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("features"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = call("{\"features\": [1.0,").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("error").is_some());

        let (status, _) = call("").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_dimension_is_unprocessable() {
        let (status, body) = call(r#"{"features": [7.0, 330.0]}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["error"],
            "feature vector has 2 values, but the model expects 3"
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(ErrorCode::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorCode::DimensionMismatch),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorCode::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
