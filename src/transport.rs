//! Bundled HTTP + WebSocket transport adapter.
//!
//! The game core is transport-agnostic; this module is one thin adapter
//! over the orchestrator RPC surface plus the bus subscription, so the
//! binary is playable out of the box. Any other transport implements the
//! same two things: the RPC calls and `subscribe`.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::protocol::{GameError, PlayerId, RoomInfo, RoomSummary};
use crate::server::GameServer;

/// Build the adapter router for the given allowed origins (`*` for
/// permissive).
pub fn create_router(server: Arc<GameServer>, cors_origins: &str) -> Router {
    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();
        if origins.is_empty() {
            tracing::warn!("no valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/v1/rooms", post(create_room).get(list_rooms))
        .route("/v1/rooms/{code}", get(room_info))
        .route("/v1/rooms/{code}/join", post(join))
        .route("/v1/rooms/{code}/leave", post(leave))
        .route("/v1/rooms/{code}/message", post(send_message))
        .route("/v1/rooms/{code}/vote", post(vote))
        .route("/v1/rooms/{code}/ws", get(subscribe_ws))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(server)
}

/// `GameError` rendered as an HTTP response.
struct ApiError(GameError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GameError::NotFound => StatusCode::NOT_FOUND,
            GameError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            GameError::RoomFull
            | GameError::AlreadyStarted
            | GameError::PhaseMismatch { .. }
            | GameError::AlreadyVoted => StatusCode::CONFLICT,
            GameError::Terminated => StatusCode::GONE,
            GameError::CapacityExceeded | GameError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        }));
        (status, body).into_response()
    }
}

impl From<GameError> for ApiError {
    fn from(error: GameError) -> Self {
        Self(error)
    }
}

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    max_humans: u8,
    total_players: u8,
}

#[derive(Debug, Serialize)]
struct CreateRoomResponse {
    code: String,
}

async fn create_room(
    State(server): State<Arc<GameServer>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, ApiError> {
    let code = server.create_room(request.max_humans, request.total_players)?;
    Ok(Json(CreateRoomResponse { code }))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_per_page")]
    per_page: usize,
}

const fn default_page() -> usize {
    1
}

const fn default_per_page() -> usize {
    20
}

#[derive(Debug, Serialize)]
struct ListResponse {
    rooms: Vec<RoomSummary>,
    total_pages: usize,
}

async fn list_rooms(
    State(server): State<Arc<GameServer>>,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    let (rooms, total_pages) = server.list_rooms(query.page, query.per_page.min(100));
    Json(ListResponse { rooms, total_pages })
}

async fn room_info(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
) -> Result<Json<RoomInfo>, ApiError> {
    Ok(Json(server.get_room_info(&code)?))
}

#[derive(Debug, Serialize)]
struct JoinResponse {
    player_id: PlayerId,
}

async fn join(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
) -> Result<Json<JoinResponse>, ApiError> {
    let player_id = server.join(&code, Uuid::new_v4())?;
    Ok(Json(JoinResponse { player_id }))
}

#[derive(Debug, Deserialize)]
struct LeaveRequest {
    player_id: PlayerId,
}

async fn leave(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(request): Json<LeaveRequest>,
) -> Result<StatusCode, ApiError> {
    server.leave(&code, request.player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    player_id: PlayerId,
    text: String,
}

async fn send_message(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<StatusCode, ApiError> {
    server.send_message(&code, request.player_id, &request.text)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct VoteRequest {
    voter: PlayerId,
    target: PlayerId,
}

async fn vote(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<StatusCode, ApiError> {
    server.vote(&code, request.voter, request.target).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn subscribe_ws(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    // Validate the room before upgrading so bad codes get a clean 404.
    server.get_room_info(&code)?;
    Ok(ws.on_upgrade(move |socket| forward_events(server, code, socket)))
}

/// Pump bus envelopes to the socket until either side goes away. The
/// first frame is always the `Snapshot`.
async fn forward_events(server: Arc<GameServer>, code: String, mut socket: WebSocket) {
    let mut stream = match server.subscribe(&code) {
        Ok(stream) => stream,
        Err(_) => {
            let _ = socket
                .send(WsMessage::Close(None))
                .await;
            return;
        }
    };
    let subscriber_id = stream.id;
    tracing::debug!(room_code = %code, %subscriber_id, "websocket subscriber attached");

    loop {
        tokio::select! {
            envelope = stream.recv() => {
                let Some(envelope) = envelope else {
                    // Bus closed or this subscriber was dropped for lagging;
                    // the client reconnects for a fresh snapshot.
                    let _ = socket.send(WsMessage::Close(None)).await;
                    break;
                };
                let Ok(json) = serde_json::to_string(envelope.as_ref()) else {
                    continue;
                };
                if socket.send(WsMessage::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Inbound frames are not part of the contract; RPC goes
                    // over HTTP. Tolerate pings and ignore the rest.
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    server.unsubscribe(&code, subscriber_id);
    tracing::debug!(room_code = %code, %subscriber_id, "websocket subscriber detached");
}
