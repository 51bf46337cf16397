//! Test ports — recording `DeliveryPort` and `ContentSeenPublisher`
//! implementations for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use cns_session::application::ports::{ContentSeenPublisher, DeliveryPort};
use cns_session::domain::display::DisplayCommand;
use cns_session::domain::events::ContentSeenEvent;

/// A delivery port that records every display command.
#[derive(Debug, Default)]
pub struct RecordingDeliveryPort {
    delivered: Mutex<Vec<DisplayCommand>>,
    delay: Option<Duration>,
}

impl RecordingDeliveryPort {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that takes `delay` to accept each command. The
    /// command is recorded once the delay has passed.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Returns a snapshot of all delivered display commands.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn delivered(&self) -> Vec<DisplayCommand> {
        self.delivered.lock().unwrap().clone()
    }

    /// Content IDs of all delivered commands, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn delivered_content_ids(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter_map(|command| command.content_id().map(str::to_owned))
            .collect()
    }
}

#[async_trait]
impl DeliveryPort for RecordingDeliveryPort {
    async fn deliver(&self, command: DisplayCommand) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.delivered.lock().unwrap().push(command);
    }
}

/// A publisher that records every content-seen notification.
#[derive(Debug, Default)]
pub struct RecordingContentSeenPublisher {
    published: Mutex<Vec<ContentSeenEvent>>,
}

impl RecordingContentSeenPublisher {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published notifications.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<ContentSeenEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSeenPublisher for RecordingContentSeenPublisher {
    async fn publish(&self, event: ContentSeenEvent) {
        self.published.lock().unwrap().push(event);
    }
}
