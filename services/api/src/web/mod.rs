pub mod conversation;
pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the handlers to make them easily accessible
// to the binary that builds the web server.
pub use rest::{
    get_conversation_handler, health_handler, reset_conversation_handler,
    submit_message_handler, upload_resume_handler,
};
pub use ws_handler::ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the API router: REST endpoints plus the `/ws` conversation stream.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health_handler))
        .route("/conversation", get(get_conversation_handler))
        .route("/conversation/resume", post(upload_resume_handler))
        .route("/conversation/messages", post(submit_message_handler))
        .route("/conversation/reset", post(reset_conversation_handler))
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state)
}
