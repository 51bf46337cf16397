//! Navigation commands.

use cns_core::command::Command;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::key::SessionKey;

/// The five kinds of navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    /// Load the structure and show its first node.
    Start,
    /// Leave the current node for the next one.
    Forward,
    /// Go back to the previous node.
    Backward,
    /// Jump back to the first node.
    First,
    /// Drop the structure.
    Finish,
}

impl NavigationKind {
    /// All kinds, in request-table order.
    pub const ALL: [Self; 5] = [
        Self::Start,
        Self::Forward,
        Self::Backward,
        Self::First,
        Self::Finish,
    ];

    /// Command type name used for logging and routing.
    #[must_use]
    pub fn command_type(self) -> &'static str {
        match self {
            Self::Start => "navigation.start_learning_object",
            Self::Forward => "navigation.step_forward",
            Self::Backward => "navigation.step_backward",
            Self::First => "navigation.step_to_first_item",
            Self::Finish => "navigation.finish_learning_object",
        }
    }

    /// Whether a successful request of this kind delivers a node.
    #[must_use]
    pub fn delivers_content(self) -> bool {
        !matches!(self, Self::Finish)
    }
}

/// A navigation request for one (session, process) pair.
#[derive(Debug, Clone)]
pub struct NavigationCommand {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// What the learner asked for.
    pub kind: NavigationKind,
    /// The learner's session.
    pub session_id: String,
    /// The process the request is about.
    pub process_id: String,
    /// Caller-supplied token, echoed in the content-seen notification.
    pub token: String,
}

impl NavigationCommand {
    /// Creates a command with a fresh correlation ID.
    pub fn new(
        kind: NavigationKind,
        session_id: impl Into<String>,
        process_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            kind,
            session_id: session_id.into(),
            process_id: process_id.into(),
            token: token.into(),
        }
    }

    /// The registry key this command addresses.
    #[must_use]
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.session_id.clone(), self.process_id.clone())
    }
}

impl Command for NavigationCommand {
    fn command_type(&self) -> &'static str {
        self.kind.command_type()
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
