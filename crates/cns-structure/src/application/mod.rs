//! Application layer for content structures.

pub mod loader;
