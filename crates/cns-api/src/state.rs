//! Shared application state.

use std::sync::Arc;

use cns_session::application::command_handlers::NavigationEngine;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The navigation engine and, through it, the session registry.
    pub engine: Arc<NavigationEngine>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(engine: Arc<NavigationEngine>) -> Self {
        Self { engine }
    }
}
