//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the session
//! registry and the completion backend shared by all connections.

use crate::config::Config;
use std::sync::Arc;
use voicerelay_core::{llm_client::CompletionClient, store::SessionStore};

/// The shared application state, created once at startup and passed to all
/// handlers behind an `Arc`.
pub struct AppState {
    pub sessions: SessionStore,
    pub llm: Arc<dyn CompletionClient>,
    pub config: Arc<Config>,
}
