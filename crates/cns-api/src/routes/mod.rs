//! Route modules.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod navigation;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/navigation", navigation::router())
        .with_state(state)
}
