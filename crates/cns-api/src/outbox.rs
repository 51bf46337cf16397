//! In-process outbox for messages leaving the service.
//!
//! The engine's delivery and content-seen ports both publish here, tagged
//! with the address the receiving service listens on. Subscribers decide
//! what to do with them; the binary drains them into the log.

use async_trait::async_trait;
use cns_core::event::DomainEvent;
use cns_session::application::ports::{ContentSeenPublisher, DeliveryPort};
use cns_session::domain::display::DisplayCommand;
use cns_session::domain::events::ContentSeenEvent;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Address content-seen notifications are published on.
pub const CONTENT_SEEN_ADDRESS: &str = "appsist:content:contentSeen";

/// Address display commands are sent to.
pub const DISPLAY_ADDRESS: &str = "appsist:service:iid@updateDisplay";

/// Default number of messages buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// A message leaving the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    /// Destination address.
    pub address: &'static str,
    /// JSON body.
    pub body: serde_json::Value,
}

/// Broadcast outbox implementing both outbound ports.
///
/// Messages sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastOutbox {
    sender: broadcast::Sender<OutboundMessage>,
}

impl BroadcastOutbox {
    /// Creates an outbox buffering up to `capacity` messages per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to all messages sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.sender.subscribe()
    }

    fn send(&self, message: OutboundMessage) {
        let address = message.address;
        if self.sender.send(message).is_err() {
            debug!(address, "no outbox subscribers, message dropped");
        }
    }
}

impl Default for BroadcastOutbox {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl DeliveryPort for BroadcastOutbox {
    async fn deliver(&self, command: DisplayCommand) {
        match serde_json::to_value(&command) {
            Ok(body) => self.send(OutboundMessage {
                address: DISPLAY_ADDRESS,
                body,
            }),
            Err(e) => warn!(error = %e, "failed to serialize display command"),
        }
    }
}

#[async_trait]
impl ContentSeenPublisher for BroadcastOutbox {
    async fn publish(&self, event: ContentSeenEvent) {
        self.send(OutboundMessage {
            address: CONTENT_SEEN_ADDRESS,
            body: event.to_payload(),
        });
    }
}

/// Logs every message received on `receiver` until the outbox is dropped.
pub async fn drain_to_log(mut receiver: broadcast::Receiver<OutboundMessage>) {
    loop {
        match receiver.recv().await {
            Ok(message) => {
                info!(address = message.address, body = %message.body, "outbound message");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "outbox log subscriber lagged, messages skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
