//! Serialized structure definitions.
//!
//! A definition lists the nodes of a learning object in navigation order.
//! It is the only format the loaders read; BPMN or behavior-tree sources
//! have to be converted into it first.

use cns_core::error::LoadError;
use serde::{Deserialize, Serialize};

use super::structure::ContentStructure;

/// One node entry in a structure definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Content identifier handed to the renderer.
    pub id: String,
    /// Human-readable label.
    pub title: String,
}

impl NodeDefinition {
    /// Creates a node definition.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A complete structure definition as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDefinition {
    /// Optional title of the learning object as a whole.
    #[serde(default)]
    pub title: Option<String>,
    /// Nodes in navigation order.
    pub nodes: Vec<NodeDefinition>,
}

impl StructureDefinition {
    /// Parses a JSON definition.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Parse` if `source` is not a valid definition.
    pub fn from_json(source: &str) -> Result<Self, LoadError> {
        serde_json::from_str(source).map_err(|e| LoadError::Parse(format!("invalid JSON: {e}")))
    }

    /// Parses a YAML definition.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Parse` if `source` is not a valid definition.
    pub fn from_yaml(source: &str) -> Result<Self, LoadError> {
        serde_yaml::from_str(source).map_err(|e| LoadError::Parse(format!("invalid YAML: {e}")))
    }

    /// Builds the not-yet-started structure for `process_id`.
    #[must_use]
    pub fn into_structure(self, process_id: impl Into<String>) -> ContentStructure {
        ContentStructure::new(process_id, self.nodes)
    }
}
