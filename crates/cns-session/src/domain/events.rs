//! Notifications emitted by navigation.

use cns_core::clock::Clock;
use cns_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type identifier for [`ContentSeenEvent`].
pub const CONTENT_SEEN_EVENT_TYPE: &str = "navigation.content_seen";

/// Wire payload of a content-seen notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSeen {
    /// The delivered content item.
    pub content_id: String,
    /// The session it was delivered to.
    pub session_id: String,
    /// The caller-supplied token of the request.
    pub token: String,
}

/// Emitted once for every navigation step that delivers a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSeenEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub payload: ContentSeen,
}

impl ContentSeenEvent {
    /// Creates the notification for `payload`, stamped by `clock`.
    #[must_use]
    pub fn new(payload: ContentSeen, correlation_id: Uuid, clock: &dyn Clock) -> Self {
        Self {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: CONTENT_SEEN_EVENT_TYPE.to_owned(),
                correlation_id,
                occurred_at: clock.now(),
            },
            payload,
        }
    }
}

impl DomainEvent for ContentSeenEvent {
    fn event_type(&self) -> &'static str {
        CONTENT_SEEN_EVENT_TYPE
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "contentId": self.payload.content_id,
            "sessionId": self.payload.session_id,
            "token": self.payload.token,
        })
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
