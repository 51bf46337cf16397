//! Domain layer for content structures.

pub mod definition;
pub mod node;
pub mod policy;
pub mod structure;
