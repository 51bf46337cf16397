//! Content nodes and references into a node chain.

use serde::{Deserialize, Serialize};

/// Position of a node inside its owning [`ContentStructure`].
///
/// [`ContentStructure`]: super::structure::ContentStructure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub usize);

impl NodeRef {
    /// Returns the index this reference points at.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single displayable step in a learning sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) visited: bool,
    pub(crate) previous: Option<NodeRef>,
    pub(crate) next: Option<NodeRef>,
}

impl ContentNode {
    pub(crate) fn new(
        id: String,
        title: String,
        previous: Option<NodeRef>,
        next: Option<NodeRef>,
    ) -> Self {
        Self {
            id,
            title,
            visited: false,
            previous,
            next,
        }
    }

    /// Identifier of the content item to display.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable label.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the node has been left through forward navigation.
    #[must_use]
    pub fn visited(&self) -> bool {
        self.visited
    }

    /// The node before this one, absent for the first node.
    #[must_use]
    pub fn previous(&self) -> Option<NodeRef> {
        self.previous
    }

    /// The node after this one, absent for the last node.
    #[must_use]
    pub fn next(&self) -> Option<NodeRef> {
        self.next
    }
}
