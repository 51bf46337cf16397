//! Registry keys.

use std::fmt;

/// Composite key of a registry entry.
///
/// Both parts are kept separate so that `("ab", "c")` and `("a", "bc")`
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    /// The learner's session.
    pub session_id: String,
    /// The process running in that session.
    pub process_id: String,
}

impl SessionKey {
    /// Creates a key.
    pub fn new(session_id: impl Into<String>, process_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            process_id: process_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session_id, self.process_id)
    }
}
