//! Content Navigation — content structure bounded context.
//!
//! Responsible for the ordered node chain of a learning object, the
//! current-position state machine over it, and loading chains from
//! structure definitions.

pub mod application;
pub mod domain;
