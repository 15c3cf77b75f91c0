//! HTTP surface of the bridge.
//!
//! One router serves the Evolution webhook receiver (fast-ack, queue-backed)
//! and the operator API: direct chat, session inspection, manual sends and
//! webhook registration.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::bus::{InboundEvent, Job, JobQueue};
use crate::channels::EvolutionClient;
use crate::errors::PonteError;
use crate::normalize;
use crate::pipeline::Pipeline;
use crate::providers::base::ChatMessage;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<JobQueue>,
    pub pipeline: Arc<Pipeline>,
    pub sessions: Arc<dyn SessionStore>,
    pub evolution: Arc<EvolutionClient>,
    /// Public URL of this service's `/webhook` route, for registration.
    pub webhook_url: Option<String>,
}

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub session_id: Option<String>,
}

/// Response body for POST /api/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
    /// Which provider answered ("cache" for a cache hit).
    pub provider: String,
    /// Echoed (or freshly minted) session id for follow-up requests.
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub number: String,
    pub text: String,
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SendMediaRequest {
    pub number: String,
    /// Media URL or base64 payload, forwarded verbatim.
    pub media: String,
    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SetupWebhookRequest {
    #[serde(default)]
    pub url: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .route("/api/sessions", get(sessions_handler))
        .route("/api/sessions/{key}", delete(delete_session_handler))
        .route("/api/send", post(send_handler))
        .route("/api/send-media", post(send_media_handler))
        .route(
            "/api/instances/{instance}/webhook",
            post(setup_webhook_handler),
        )
        .with_state(state)
}

/// POST /webhook — normalize and enqueue, then ack immediately. The ack never
/// waits on providers, and a bad payload is logged and dropped rather than
/// bounced: the sending gateway retries on non-2xx, which never helps here.
async fn webhook_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let instance = body
        .get("instance")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let data = body.get("data").cloned().unwrap_or(Value::Null);

    match normalize::normalize(&data) {
        Ok(message) => {
            debug!(
                "webhook accepted for {} (instance {})",
                message.conversation_key, instance
            );
            let job = Job::new(InboundEvent { instance, data }, message);
            if let Err(e) = state.queue.enqueue(job) {
                error!("failed to enqueue webhook job: {}", e);
            }
        }
        Err(e) if e.is_silent_drop() => {
            debug!("webhook dropped: {}", e);
        }
        Err(e) => {
            warn!("webhook payload rejected: {}", e);
        }
    }

    (StatusCode::ACCEPTED, Json(json!({"status": "received"})))
}

/// POST /api/chat — synchronous cache→dispatch, bypassing the queue.
async fn chat_handler(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> impl IntoResponse {
    let session_id = body
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    match state
        .pipeline
        .respond(&body.messages, Some(&session_id))
        .await
    {
        Ok(Some(reply)) => (
            StatusCode::OK,
            Json(json!(ChatResponse {
                content: reply.text,
                provider: reply.provider,
                session_id,
            })),
        ),
        Ok(None) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": PonteError::AllProvidersExhausted.to_string()})),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        ),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// GET /api/sessions — operator snapshot of all tracked conversations.
async fn sessions_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.sessions.all().await {
        Ok(sessions) => {
            let summaries: Vec<Value> = sessions
                .iter()
                .map(|s| {
                    json!({
                        "key": s.key,
                        "turns": s.turns.len(),
                        "created_at": s.created_at,
                        "updated_at": s.updated_at,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({"sessions": summaries})))
        }
        Err(e) => {
            error!("session listing failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "session store unavailable"})),
            )
        }
    }
}

/// DELETE /api/sessions/{key}
async fn delete_session_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match state.sessions.clear(&key).await {
        Ok(true) => (StatusCode::OK, Json(json!({"status": "deleted"}))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "session not found"})),
        ),
        Err(e) => {
            error!("session delete failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "session store unavailable"})),
            )
        }
    }
}

/// POST /api/send — operator passthrough to the delivery client.
async fn send_handler(
    State(state): State<AppState>,
    Json(body): Json<SendRequest>,
) -> impl IntoResponse {
    use crate::channels::DeliveryChannel;
    match state
        .evolution
        .send(&body.number, &body.text, body.options.as_ref())
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "sent"}))),
        Err(e) => {
            error!("manual send to {} failed: {}", body.number, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}

/// POST /api/send-media — operator media passthrough to the delivery client.
async fn send_media_handler(
    State(state): State<AppState>,
    Json(body): Json<SendMediaRequest>,
) -> impl IntoResponse {
    match state
        .evolution
        .send_media(
            &body.number,
            &body.media,
            body.file_name.as_deref(),
            body.caption.as_deref(),
            body.options.as_ref(),
        )
        .await
    {
        Ok(_) => (StatusCode::OK, Json(json!({"status": "sent"}))),
        Err(e) => {
            error!("manual media send to {} failed: {}", body.number, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}

/// POST /api/instances/{instance}/webhook — point an Evolution instance at
/// this service. The URL comes from the body or falls back to the configured
/// public webhook URL.
async fn setup_webhook_handler(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    body: Option<Json<SetupWebhookRequest>>,
) -> impl IntoResponse {
    let url = body
        .and_then(|Json(b)| b.url)
        .or_else(|| state.webhook_url.clone());
    let Some(url) = url else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "no webhook URL provided or configured"})),
        );
    };

    match state.evolution.set_webhook(&instance, &url).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            error!("webhook setup for instance {} failed: {}", instance, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}

/// Bind and serve in a background task.
pub async fn start(host: &str, port: u16, state: AppState) -> Result<tokio::task::JoinHandle<()>> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("gateway listening on {}", addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("gateway server error: {}", e);
        }
    });
    Ok(handle)
}
