pub mod config;
pub mod error;
pub mod game;
pub mod websocket;

use std::sync::Arc;
use actix_web::{web, HttpResponse};
use url::Url;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use game::{BuzzRecord, Game, GameView, NamePolicy, Rejection};
pub use websocket::{BroadcastHub, ConnectionPool, WebSocketServer};

/// Health check endpoint handler
/// Returns server status plus a summary of the current round
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let view = state.game.view().await;

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "guests": view.guest_count,
        "roundActive": view.active,
    }))
}

/// Current records, guest count and round flag, for host views resyncing over HTTP
pub async fn state_snapshot(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.game.view().await)
}

/// Address participants connect to; what the onboarding code points at
pub async fn join_info(state: web::Data<AppState>) -> Result<HttpResponse> {
    let url = Url::parse(&state.config.join_url())
        .map_err(|e| AppError::ValidationError(format!("Invalid join url: {}", e)))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "url": url.as_str() })))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub game: Arc<Game>,
    pub ws_server: Arc<WebSocketServer>,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        let pool = Arc::new(ConnectionPool::new());
        let game = Arc::new(Game::new(config.game.name_policy, BroadcastHub::new(pool)));
        let ws_server = Arc::new(WebSocketServer::new(
            game.clone(),
            config.websocket.heartbeat(),
        ));

        Self {
            config: Arc::new(config),
            game,
            ws_server,
        }
    }
}
