//! Domain layer for navigation sessions.

pub mod commands;
pub mod display;
pub mod events;
pub mod key;
