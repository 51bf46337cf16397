//! Outbound ports of the navigation engine.
//!
//! Both are fire-and-forget: adapters log their own failures instead of
//! failing the navigation step that produced the message.

use async_trait::async_trait;

use crate::domain::display::DisplayCommand;
use crate::domain::events::ContentSeenEvent;

/// Receives the node chosen for display.
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    /// Hands `command` to the renderer.
    async fn deliver(&self, command: DisplayCommand);
}

/// Receives content-seen notifications.
#[async_trait]
pub trait ContentSeenPublisher: Send + Sync {
    /// Publishes `event`. Called at most once per navigation step.
    async fn publish(&self, event: ContentSeenEvent);
}
