//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::conversation::ConversationHandle;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests and Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// There is exactly one conversation; every client drives and observes it.
    pub conversation: Arc<ConversationHandle>,
}
