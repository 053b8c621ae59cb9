pub mod api;
pub mod config;
pub mod health;
pub mod state;
pub mod universe_manager;
pub mod ws;

use axum::Router;
use tower_http::services::ServeDir;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
///
/// Anything that is not `/ws` or `/api/*` falls through to static file
/// serving from the configured web root.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    let state = AppState::new(config);

    let app = Router::new()
        .route("/ws", axum::routing::get(ws::ws_handler))
        .route("/api/ws", axum::routing::get(api::ws_endpoint))
        .route("/api/health", axum::routing::get(health::health_check))
        .fallback_service(ServeDir::new(&web_root))
        .with_state(state.clone());

    (app, state)
}
