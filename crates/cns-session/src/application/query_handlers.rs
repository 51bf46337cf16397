//! Query handlers for navigation sessions.

use cns_core::error::NavigationError;
use cns_structure::domain::node::ContentNode;
use cns_structure::domain::structure::ContentStructure;

use super::registry::SessionRegistry;

/// Returns a snapshot of the structure registered for the key.
///
/// # Errors
///
/// Returns `NavigationError::NoActiveSession` if nothing is registered.
pub async fn get_structure(
    registry: &SessionRegistry,
    session_id: &str,
    process_id: &str,
) -> Result<ContentStructure, NavigationError> {
    let slot = registry
        .get(session_id, process_id)
        .ok_or_else(|| no_active_session(session_id, process_id))?;
    let guard = slot.lock().await;
    guard
        .clone()
        .ok_or_else(|| no_active_session(session_id, process_id))
}

/// Returns the node currently shown for the key.
///
/// # Errors
///
/// Returns `NavigationError::NoActiveSession` if nothing is registered and
/// `NavigationError::NotStarted` if the structure was never started.
pub async fn get_current_node(
    registry: &SessionRegistry,
    session_id: &str,
    process_id: &str,
) -> Result<ContentNode, NavigationError> {
    let slot = registry
        .get(session_id, process_id)
        .ok_or_else(|| no_active_session(session_id, process_id))?;
    let guard = slot.lock().await;
    guard
        .as_ref()
        .ok_or_else(|| no_active_session(session_id, process_id))?
        .current_node()
        .cloned()
}

pub(crate) fn no_active_session(session_id: &str, process_id: &str) -> NavigationError {
    NavigationError::NoActiveSession {
        session_id: session_id.to_owned(),
        process_id: process_id.to_owned(),
    }
}
