//! HTTP surface of the inference service.

use crate::preprocessing::EncodingError;
use crate::schema::CustomerRecord;
use crate::service::{InferenceService, Prediction, ServiceInfo};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    info: ServiceInfo,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<EncodingError> for ApiError {
    fn from(err: EncodingError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

pub fn build_router(service: InferenceService) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn handle_home() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Telco churn API is running. Use POST /predict",
    })
}

async fn handle_health(State(service): State<InferenceService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        info: service.info(),
    })
}

async fn handle_predict(
    State(service): State<InferenceService>,
    Json(record): Json<CustomerRecord>,
) -> Result<Json<Prediction>, ApiError> {
    match service.predict(&record) {
        Ok(prediction) => Ok(Json(prediction)),
        Err(err) => {
            tracing::warn!(error = %err, "rejected prediction request");
            Err(err.into())
        }
    }
}

/// Serve until Ctrl-C.
pub async fn serve(service: InferenceService, addr: SocketAddr) -> Result<()> {
    let app = build_router(service);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;
    tracing::info!(%addr, "churn service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("churn service terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
