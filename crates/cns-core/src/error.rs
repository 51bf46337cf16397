//! Domain error types.

use std::time::Duration;

use thiserror::Error;

/// Failure to turn a process identifier into a content structure.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The process identifier cannot name a structure definition.
    #[error("malformed process identifier: {0:?}")]
    MalformedIdentifier(String),

    /// No definition resource exists for the process.
    #[error("no structure definition found for process {0}")]
    MissingDefinition(String),

    /// The definition exists but is stored in a format we cannot read.
    #[error("unsupported structure format: {0}")]
    UnsupportedFormat(String),

    /// The definition resource could not be read.
    #[error("failed to read structure definition: {0}")]
    Io(#[from] std::io::Error),

    /// The definition resource could not be parsed.
    #[error("failed to parse structure definition: {0}")]
    Parse(String),
}

/// Top-level navigation error type.
///
/// Every variant is local to a single (session, process) key.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The loaded structure has no nodes to start on.
    #[error("content structure for process {process_id} has no nodes")]
    EmptyStructure {
        /// The process whose structure was empty.
        process_id: String,
    },

    /// Navigation was requested on a structure that was never started.
    #[error("content structure for process {process_id} has not been started")]
    NotStarted {
        /// The process whose structure is not started.
        process_id: String,
    },

    /// No structure is registered for the key.
    #[error("no active session {session_id} for process {process_id}")]
    NoActiveSession {
        /// The session identifier of the request.
        session_id: String,
        /// The process identifier of the request.
        process_id: String,
    },

    /// A next-node policy picked a node outside the structure.
    #[error("node reference {0} is outside the content structure")]
    InvalidNodeRef(usize),

    /// The structure loader did not answer within the configured bound.
    #[error("loading the structure for process {process_id} timed out after {} ms", .timeout.as_millis())]
    LoadTimeout {
        /// The process whose structure was being loaded.
        process_id: String,
        /// The bound that expired.
        timeout: Duration,
    },

    /// The structure loader failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}
