//! Axum Router Configuration

use crate::{handlers, state::AppState, ws::ws_handler};
use axum::{
    Router,
    routing::{any, get},
};
use std::sync::Arc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // Twilio may fetch the descriptor with GET or POST depending on the
        // number's configuration.
        .route("/twiml", any(handlers::twiml))
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}
