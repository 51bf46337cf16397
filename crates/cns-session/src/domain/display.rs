//! Display commands handed to the renderer.
//!
//! A delivered node is wrapped as a learning object with a single chapter
//! whose body is the content package named by the node's id.

use cns_structure::domain::node::ContentNode;
use serde::{Deserialize, Serialize};

/// Service identifier the renderer attributes display commands to.
pub const SERVICE_ID: &str = "cns";

/// Body of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBody {
    /// A packaged content item resolved by the renderer.
    Package {
        /// Identifier of the package.
        content_id: String,
    },
}

/// One chapter of a learning object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter heading.
    pub title: String,
    /// Chapter content.
    pub body: ContentBody,
}

/// What the renderer displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningObject {
    /// Learning object title.
    pub title: String,
    /// Chapters in display order.
    pub chapters: Vec<Chapter>,
}

/// Request to display a learning object in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCommand {
    /// Session whose display is updated.
    pub session_id: String,
    /// Service issuing the update.
    pub service_id: String,
    /// Content to display.
    pub learning_object: LearningObject,
}

impl DisplayCommand {
    /// Wraps `node` for display in `session_id`.
    #[must_use]
    pub fn for_node(session_id: &str, node: &ContentNode) -> Self {
        Self {
            session_id: session_id.to_owned(),
            service_id: SERVICE_ID.to_owned(),
            learning_object: LearningObject {
                title: node.title().to_owned(),
                chapters: vec![Chapter {
                    title: node.title().to_owned(),
                    body: ContentBody::Package {
                        content_id: node.id().to_owned(),
                    },
                }],
            },
        }
    }

    /// Content id of the first chapter, if it is a package.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.learning_object
            .chapters
            .first()
            .map(|chapter| match &chapter.body {
                ContentBody::Package { content_id } => content_id.as_str(),
            })
    }
}
