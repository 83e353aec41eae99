use actix_web::{web, HttpRequest, HttpResponse};
use actix_web::http::header::ContentType;
use actix_web_actors::ws;
use tracing::{error, info};

use crate::error::{AppError, WebSocketError};
use crate::websocket::WebSocketSession;
use crate::AppState;
use super::page::CHAT_PAGE;

/// Register every route of the relay. Shared by `main` and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check))
        .route("/ws", web::get().to(websocket_route));
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(CHAT_PAGE)
}

/// Health check endpoint handler
/// Returns a JSON response with server status, environment, timestamp and live connection count
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let connections = state.registry.connection_count().await;

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": connections,
    }))
}

/// Upgrades the request to a websocket and starts a session actor for it.
pub async fn websocket_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let peer_addr = req.peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!("New WebSocket connection request from: {}", peer_addr);

    ws::start(
        WebSocketSession::new(state.registry.clone(), peer_addr.clone()),
        &req,
        stream,
    )
    .map_err(|e| {
        error!("Error during WebSocket handshake with {}: {}", peer_addr, e);
        AppError::from(WebSocketError::Handshake(e.to_string()))
    })
}
