// ============================
// huddle-backend-lib/src/ws_router.rs
// ============================
//! HTTP surface and WebSocket connection handling.
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::HeaderValue,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use ::metrics::{counter, gauge};
use tokio::sync::mpsc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use huddle_common::{ClientEvent, ServerEvent};

use crate::error::AppError;
use crate::handlers;
use crate::metrics::{WS_ACTIVE, WS_CONNECTIONS};
use crate::room::{Departure, RoomSnapshot};
use crate::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state);
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/rooms/{room_id}", get(room_snapshot))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    if state.settings.cors_permissive() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = state
        .settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable allowed origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Liveness probe; static body, no side effects.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "rooms": state.rooms.room_count(),
        "connections": state.registry.connection_count(),
    }))
}

async fn room_snapshot(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    state
        .rooms
        .snapshot(&room_id)
        .map(Json)
        .ok_or(AppError::RoomNotFound)
}

/// Handler for WebSocket connections
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    counter!(WS_CONNECTIONS).increment(1);
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    gauge!(WS_ACTIVE).increment(1.0);
    let (mut sink, mut stream) = socket.split();

    // Outbound events queue here; the pump below owns the socket sink.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let conn = state.registry.register(tx.clone());
    info!(%conn, "connection established");

    // Tell the client its id so peers can address signaling to it.
    let _ = tx.send(ServerEvent::Welcome { id: conn });

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    debug!(error = %err, "skipping unserializable event");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handlers::live::handle_client_event(&state, conn, event).await,
                Err(err) => debug!(%conn, error = %err, "dropping malformed event"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Disconnect detection is the cleanup trigger when no explicit leave
    // arrived first; deregister reports the room at most once.
    if let Some(room_id) = state.registry.deregister(conn) {
        state
            .rooms
            .remove_participant(&room_id, conn, Departure::Disconnected);
    }

    send_task.abort();
    gauge!(WS_ACTIVE).decrement(1.0);
    info!(%conn, "connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::room::Participant;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Settings::default()))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_static_ok() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_room_count() {
        let state = test_state();
        let (tx, _rx) = mpsc::unbounded_channel();
        state.rooms.join(
            "ABC123",
            Participant {
                id: uuid::Uuid::new_v4(),
                name: Some("Alice".to_string()),
                sender: tx,
            },
        );

        let app = create_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let value = body_json(response).await;
        assert_eq!(value["rooms"], 1);
    }

    #[tokio::test]
    async fn unknown_room_snapshot_is_not_found() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/rooms/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn room_snapshot_lists_participants() {
        let state = test_state();
        let (tx, _rx) = mpsc::unbounded_channel();
        state.rooms.join(
            "ABC123",
            Participant {
                id: uuid::Uuid::new_v4(),
                name: Some("Alice".to_string()),
                sender: tx,
            },
        );

        let app = create_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/rooms/ABC123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["id"], "ABC123");
        assert_eq!(value["participants"][0]["name"], "Alice");
        assert_eq!(value["transcriptLen"], 0);
    }
}
