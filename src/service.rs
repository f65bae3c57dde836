use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::error::DetectError;
use crate::pipeline::{Detection, Model, detect_objects};
use crate::preprocess::Processor;

/// Shared per-process state: one long-lived model handle behind a mutex so
/// at most one forward pass is in flight, plus the immutable preprocess
/// config. Injected into handlers via axum state, never looked up globally.
pub struct AppState<M> {
    detector: Arc<Mutex<M>>,
    processor: Arc<Processor>,
}

impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            detector: Arc::clone(&self.detector),
            processor: Arc::clone(&self.processor),
        }
    }
}

impl<M: Model> AppState<M> {
    pub fn new(detector: M, processor: Processor) -> Self {
        Self {
            detector: Arc::new(Mutex::new(detector)),
            processor: Arc::new(processor),
        }
    }
}

pub fn router<M: Model + 'static>(state: AppState<M>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/detect", post(detect_handler::<M>))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn serve<M: Model + 'static>(addr: SocketAddr, state: AppState<M>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("detection server listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `POST /detect`: JSON body with a base64 `image` field (optionally a data
/// URL). An unreadable body or a missing/non-string field is a 400 with the
/// fixed message; every failure past that point is a 500 carrying the error
/// text. Zero detections is a normal 200.
async fn detect_handler<M: Model + 'static>(
    State(state): State<AppState<M>>,
    body: Option<Json<Value>>,
) -> Response {
    let image_field = body
        .as_ref()
        .and_then(|Json(data)| data.get("image"))
        .and_then(Value::as_str);
    let Some(encoded) = image_field else {
        return error_response(StatusCode::BAD_REQUEST, "No image data provided");
    };

    match run_detection(&state, encoded).await {
        Ok(detections) => {
            tracing::debug!(count = detections.len(), "detect request served");
            (StatusCode::OK, Json(json!({ "detections": detections }))).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "detect request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn run_detection<M: Model>(
    state: &AppState<M>,
    encoded: &str,
) -> Result<Vec<Detection>, DetectError> {
    let bytes = decode_image_payload(encoded)?;
    let image = image::load_from_memory(&bytes)?;
    let detector = state.detector.lock().await;
    detect_objects(&image, &*detector, &state.processor)
}

/// Strips an optional `data:image/...;base64,` header (everything up to the
/// first comma) and base64-decodes the rest.
pub fn decode_image_payload(encoded: &str) -> Result<Vec<u8>, DetectError> {
    let payload = if encoded.starts_with("data:image") {
        encoded
            .split_once(',')
            .map(|(_, tail)| tail)
            .unwrap_or(encoded)
    } else {
        encoded
    };
    Ok(BASE64.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_base64_decodes() {
        let encoded = BASE64.encode(b"hello");
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn data_url_header_is_stripped() {
        let encoded = format!("data:image/png;base64,{}", BASE64.encode(b"hello"));
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"hello");
    }

    #[test]
    fn malformed_base64_is_an_error() {
        let err = decode_image_payload("not//valid==base64!").unwrap_err();
        assert!(matches!(err, DetectError::Base64(_)));
    }
}
