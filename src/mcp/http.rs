//! SSE transport for the MCP server.
//!
//! Remote clients connect with `GET /sse`, receive an `endpoint` event
//! naming the POST endpoint for their session, and read responses off the
//! event stream. Requests arrive via `POST /messages?session_id=`.

use crate::mcp::protocol::JsonRpcMessage;
use crate::mcp::server::{McpServer, MessageHandler};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Sse},
    routing::{get, post},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

const SSE_CHANNEL_CAPACITY: usize = 32;
const KEEP_ALIVE_SECS: u64 = 30;

/// Shared state for the HTTP transport.
pub struct HttpTransportState {
    server: Arc<McpServer>,
    /// Active SSE sessions, keyed by session id.
    sessions: RwLock<HashMap<String, mpsc::Sender<JsonRpcMessage>>>,
}

/// Query parameters for the message endpoint.
#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Create the HTTP router.
#[inline]
pub fn create_router(state: Arc<HttpTransportState>) -> Router {
    Router::new()
        .route("/sse", get(handle_sse))
        .route("/messages", post(handle_message))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Open an SSE session. The first event names the message endpoint.
async fn handle_sse(State(state): State<Arc<HttpTransportState>>) -> impl IntoResponse {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (event_tx, mut event_rx) = mpsc::channel(SSE_CHANNEL_CAPACITY);

    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), event_tx);

    info!("SSE session opened: {}", session_id);

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(
            axum::response::sse::Event::default()
                .event("endpoint")
                .data(format!("/messages?session_id={session_id}")),
        );

        while let Some(message) = event_rx.recv().await {
            let data = serde_json::to_string(&message).unwrap_or_default();
            yield Ok(axum::response::sse::Event::default()
                .event("message")
                .data(data));
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(std::time::Duration::from_secs(KEEP_ALIVE_SECS))
            .text("ping"),
    )
}

/// Accept one JSON-RPC message for a session; the response goes out over
/// that session's SSE stream.
async fn handle_message(
    State(state): State<Arc<HttpTransportState>>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> impl IntoResponse {
    let sender = {
        let sessions = state.sessions.read().await;
        sessions.get(&query.session_id).cloned()
    };

    let Some(sender) = sender else {
        return (StatusCode::NOT_FOUND, "Unknown session");
    };

    debug!("Inbound message for session {}", query.session_id);

    let handler = MessageHandler::new(Arc::clone(&state.server));
    if let Some(response) = handler.handle_line(&body).await {
        if sender.send(response).await.is_err() {
            warn!("SSE session {} is gone; dropping it", query.session_id);
            state.sessions.write().await.remove(&query.session_id);
            return (StatusCode::GONE, "Session closed");
        }
    }

    (StatusCode::ACCEPTED, "Accepted")
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<HttpTransportState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "server": state.server.server_info.name,
        "version": state.server.server_info.version,
    }))
}

/// HTTP server carrying the SSE transport.
pub struct HttpServer {
    host: String,
    port: u16,
}

impl HttpServer {
    #[inline]
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    /// Bind and serve until the task is cancelled.
    #[inline]
    pub async fn run(self, server: Arc<McpServer>) -> Result<()> {
        let state = Arc::new(HttpTransportState {
            server,
            sessions: RwLock::new(HashMap::new()),
        });
        let app = create_router(state);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {addr}"))?;

        info!("MCP SSE transport listening on http://{}", addr);

        axum::serve(listener, app)
            .await
            .context("HTTP server failed")?;

        Ok(())
    }
}
