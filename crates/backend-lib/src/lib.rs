// ============================
// huddle-backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the huddle signaling server.

pub mod ai;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod room;
pub mod ws_router;

use std::sync::Arc;

use crate::ai::{AnswerProvider, FallbackAnswerer};
use crate::config::Settings;
use crate::registry::ConnectionRegistry;
use crate::room::RoomManager;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Live connections and their room bindings
    pub registry: Arc<ConnectionRegistry>,
    /// Active rooms
    pub rooms: Arc<RoomManager>,
    /// Settings manager
    pub settings: Arc<Settings>,
    /// Answer-producing collaborator for `ai:question`
    pub answerer: Arc<dyn AnswerProvider>,
}

impl AppState {
    /// Create application state with the default (fallback-only) answerer.
    pub fn new(settings: Settings) -> Self {
        Self::with_answerer(settings, Arc::new(FallbackAnswerer::default()))
    }

    /// Create application state with a specific answer collaborator.
    pub fn with_answerer(settings: Settings, answerer: Arc<dyn AnswerProvider>) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            rooms: Arc::new(RoomManager::new()),
            settings: Arc::new(settings),
            answerer,
        }
    }
}
