//! HTTP ingest source — accepts captured messages posted by a companion app.
//!
//! `POST /api/messages` with `{"sender", "body", "timestamp"?}` enqueues a
//! message and answers 202 right away; forwarding happens later on the
//! dispatcher's workers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use super::channel::{MessageSource, MessageStream};
use crate::error::ChannelError;
use crate::pipeline::types::IncomingMessage;

/// Body of `POST /api/messages`.
#[derive(Debug, Deserialize)]
struct IngestRequest {
    sender: String,
    body: String,
    /// Epoch milliseconds at capture time.
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Axum handler state.
#[derive(Clone)]
struct IngestState {
    incoming_tx: mpsc::UnboundedSender<IncomingMessage>,
}

/// Message source fed by HTTP requests.
pub struct HttpSource {
    incoming_tx: mpsc::UnboundedSender<IncomingMessage>,
    /// Consumed once in `start()`.
    incoming_rx: Mutex<Option<mpsc::UnboundedReceiver<IncomingMessage>>>,
}

impl HttpSource {
    pub fn new() -> Self {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        Self {
            incoming_tx,
            incoming_rx: Mutex::new(Some(incoming_rx)),
        }
    }

    /// Build the ingest router. Merge it into the served app.
    pub fn router(&self) -> Router {
        let state = Arc::new(IngestState {
            incoming_tx: self.incoming_tx.clone(),
        });

        Router::new()
            .route("/health", get(health))
            .route("/api/messages", post(ingest))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let rx = self
            .incoming_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| ChannelError::StartupFailed {
                name: "http".to_string(),
                reason: "start() already called".to_string(),
            })?;

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sms-relay"
    }))
}

async fn ingest(
    State(state): State<Arc<IngestState>>,
    Json(request): Json<IngestRequest>,
) -> impl IntoResponse {
    let sender = request.sender.trim();
    if sender.is_empty() || request.body.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "sender and body are required" })),
        );
    }

    let mut message = IncomingMessage::new(sender, request.body);
    if let Some(ts) = request.timestamp {
        message = message.with_timestamp_millis(ts);
    }
    let id = message.id;

    if state.incoming_tx.send(message).is_err() {
        warn!("HTTP ingest channel closed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "relay is shutting down" })),
        );
    }

    debug!(message_id = %id, "Message accepted over HTTP");
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "accepted", "id": id })),
    )
}
