//! Content navigation service — HTTP surface.
//!
//! Exposes the navigation engine over JSON endpoints and forwards its
//! outbound messages to an in-process outbox.

pub mod config;
pub mod error;
pub mod outbox;
pub mod routes;
pub mod state;
pub mod telemetry;
