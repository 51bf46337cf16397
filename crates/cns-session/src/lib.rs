//! Content Navigation — session bounded context.
//!
//! Responsible for keeping one content structure alive per active
//! (session, process) pair and for turning navigation requests into
//! delivered content.

pub mod application;
pub mod domain;
