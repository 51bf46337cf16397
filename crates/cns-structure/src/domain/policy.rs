//! Next-node selection for forward navigation.

use super::node::{ContentNode, NodeRef};

/// Chooses the node that forward navigation moves to.
///
/// Implementations see the whole chain, including every node's `visited`
/// flag, and may route around nodes (e.g. skip a subtree the learner has
/// already seen). `None` means there is nowhere further to go. The node at
/// `current` has not been marked visited yet when this is called.
pub trait NextNodePolicy: Send + Sync {
    /// Returns the node to move to from `current`.
    fn choose_next(&self, nodes: &[ContentNode], current: NodeRef) -> Option<NodeRef>;
}

/// Default policy: follow the static `next` link of the current node.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowNextLink;

impl NextNodePolicy for FollowNextLink {
    fn choose_next(&self, nodes: &[ContentNode], current: NodeRef) -> Option<NodeRef> {
        nodes.get(current.index()).and_then(ContentNode::next)
    }
}

/// Skips forward over nodes that were already visited, stopping at the
/// first unvisited node. Falls back to the static `next` link when every
/// later node has been seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipVisited;

impl NextNodePolicy for SkipVisited {
    fn choose_next(&self, nodes: &[ContentNode], current: NodeRef) -> Option<NodeRef> {
        let first_next = FollowNextLink.choose_next(nodes, current)?;
        let mut candidate = Some(first_next);
        while let Some(node_ref) = candidate {
            let node = nodes.get(node_ref.index())?;
            if !node.visited() {
                return Some(node_ref);
            }
            candidate = node.next();
        }
        Some(first_next)
    }
}
