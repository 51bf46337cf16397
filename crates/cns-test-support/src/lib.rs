//! Shared test mocks and utilities for the content navigation service.

mod clock;
mod loader;
mod ports;

pub use clock::FixedClock;
pub use loader::{FailingStructureLoader, SlowStructureLoader, StaticStructureLoader};
pub use ports::{RecordingContentSeenPublisher, RecordingDeliveryPort};
