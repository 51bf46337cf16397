//! Content Navigation Core — shared domain abstractions.
//!
//! This crate defines the traits and error types that the structure,
//! session, and API crates depend on. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod event;
