//! The content structure: an ordered node chain with a navigation cursor.

use cns_core::error::NavigationError;
use serde::{Deserialize, Serialize};

use super::definition::NodeDefinition;
use super::node::{ContentNode, NodeRef};
use super::policy::{FollowNextLink, NextNodePolicy};

/// Boundary reached by a navigation step that could not move.
///
/// These are informational: the step still succeeds and returns the node
/// the cursor stays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceBoundary {
    /// Forward navigation at the last node.
    EndOfSequence,
    /// Backward navigation at the first node.
    StartOfSequence,
}

/// Outcome of a navigation operation on a [`ContentStructure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Where the cursor is after the operation.
    pub position: NodeRef,
    /// The node at `position`, as it is after the operation.
    pub node: ContentNode,
    /// Set when the operation hit either end of the chain.
    pub boundary: Option<SequenceBoundary>,
}

/// The ordered node chain for one process instance plus the learner's
/// position in it.
///
/// The chain topology is fixed at construction. Only the cursor and the
/// per-node `visited` flags change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StructureSnapshot")]
pub struct ContentStructure {
    process_id: String,
    nodes: Vec<ContentNode>,
    current: Option<NodeRef>,
}

/// Serialized form of a [`ContentStructure`], checked before it is trusted.
#[derive(Deserialize)]
struct StructureSnapshot {
    process_id: String,
    nodes: Vec<ContentNode>,
    current: Option<NodeRef>,
}

impl TryFrom<StructureSnapshot> for ContentStructure {
    type Error = NavigationError;

    fn try_from(snapshot: StructureSnapshot) -> Result<Self, Self::Error> {
        let len = snapshot.nodes.len();
        let links = snapshot
            .nodes
            .iter()
            .flat_map(|node| [node.previous, node.next]);
        if let Some(dangling) = links
            .chain([snapshot.current])
            .flatten()
            .find(|node_ref| node_ref.index() >= len)
        {
            return Err(NavigationError::InvalidNodeRef(dangling.index()));
        }

        Ok(Self {
            process_id: snapshot.process_id,
            nodes: snapshot.nodes,
            current: snapshot.current,
        })
    }
}

impl ContentStructure {
    /// Builds a not-yet-started structure whose navigation order is the
    /// iteration order of `nodes`.
    pub fn new(
        process_id: impl Into<String>,
        nodes: impl IntoIterator<Item = NodeDefinition>,
    ) -> Self {
        let definitions: Vec<NodeDefinition> = nodes.into_iter().collect();
        let last = definitions.len().saturating_sub(1);
        let nodes = definitions
            .into_iter()
            .enumerate()
            .map(|(index, definition)| {
                let previous = index.checked_sub(1).map(NodeRef);
                let next = (index < last).then_some(NodeRef(index + 1));
                ContentNode::new(definition.id, definition.title, previous, next)
            })
            .collect();

        Self {
            process_id: process_id.into(),
            nodes,
            current: None,
        }
    }

    /// The process this structure was built for.
    #[must_use]
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// All nodes in navigation order.
    #[must_use]
    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    /// Returns the node at `node_ref`, if it belongs to this structure.
    #[must_use]
    pub fn node(&self, node_ref: NodeRef) -> Option<&ContentNode> {
        self.nodes.get(node_ref.index())
    }

    /// The cursor, absent until [`start`](Self::start) is called.
    #[must_use]
    pub fn current(&self) -> Option<NodeRef> {
        self.current
    }

    /// Whether [`start`](Self::start) has been called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    /// Number of nodes in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Puts the cursor on the first node.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::EmptyStructure` if there are no nodes.
    pub fn start(&mut self) -> Result<Step, NavigationError> {
        self.move_to_first()
    }

    /// Leaves the current node (marking it visited) for the node chosen by
    /// [`FollowNextLink`].
    ///
    /// # Errors
    ///
    /// See [`step_forward_with`](Self::step_forward_with).
    pub fn step_forward(&mut self) -> Result<Step, NavigationError> {
        self.step_forward_with(&FollowNextLink)
    }

    /// Leaves the current node for the node chosen by `policy`.
    ///
    /// The current node is marked visited even when there is no node to move
    /// to; the cursor then stays put and the step reports
    /// [`SequenceBoundary::EndOfSequence`].
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NotStarted` if the structure has not been
    /// started, and `NavigationError::InvalidNodeRef` if `policy` picks a
    /// node outside the chain. The structure is untouched in both cases.
    pub fn step_forward_with(
        &mut self,
        policy: &dyn NextNodePolicy,
    ) -> Result<Step, NavigationError> {
        let current = self.require_current()?;
        let chosen = policy.choose_next(&self.nodes, current);
        if let Some(out_of_range) = chosen.filter(|next| next.index() >= self.nodes.len()) {
            return Err(NavigationError::InvalidNodeRef(out_of_range.index()));
        }

        self.nodes[current.index()].visited = true;

        match chosen {
            Some(next) => {
                self.current = Some(next);
                Ok(self.step_at(next, None))
            }
            None => Ok(self.step_at(current, Some(SequenceBoundary::EndOfSequence))),
        }
    }

    /// Moves the cursor to the previous node. `visited` flags are untouched.
    ///
    /// At the first node the cursor stays put and the step reports
    /// [`SequenceBoundary::StartOfSequence`].
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NotStarted` if the structure has not been
    /// started.
    pub fn step_backward(&mut self) -> Result<Step, NavigationError> {
        let current = self.require_current()?;
        match self.nodes[current.index()].previous {
            Some(previous) => {
                self.current = Some(previous);
                Ok(self.step_at(previous, None))
            }
            None => Ok(self.step_at(current, Some(SequenceBoundary::StartOfSequence))),
        }
    }

    /// Resets the cursor to the first node regardless of history. `visited`
    /// flags are untouched.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::EmptyStructure` if there are no nodes.
    pub fn step_to_first(&mut self) -> Result<Step, NavigationError> {
        self.move_to_first()
    }

    /// Returns the node under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NotStarted` if the structure has not been
    /// started.
    pub fn current_node(&self) -> Result<&ContentNode, NavigationError> {
        let current = self.require_current()?;
        Ok(&self.nodes[current.index()])
    }

    fn move_to_first(&mut self) -> Result<Step, NavigationError> {
        if self.nodes.is_empty() {
            return Err(NavigationError::EmptyStructure {
                process_id: self.process_id.clone(),
            });
        }
        let first = NodeRef(0);
        self.current = Some(first);
        Ok(self.step_at(first, None))
    }

    fn require_current(&self) -> Result<NodeRef, NavigationError> {
        self.current.ok_or_else(|| NavigationError::NotStarted {
            process_id: self.process_id.clone(),
        })
    }

    fn step_at(&self, position: NodeRef, boundary: Option<SequenceBoundary>) -> Step {
        Step {
            position,
            node: self.nodes[position.index()].clone(),
            boundary,
        }
    }
}
