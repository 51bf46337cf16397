//! Application layer for navigation sessions.

pub mod command_handlers;
pub mod ports;
pub mod query_handlers;
pub mod registry;
