// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node identity and kind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique name of a node in the host scene
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeName(String);

impl NodeName {
    /// Create a node name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a new name by appending a suffix
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Kind of a node, as far as deformer stacks care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeKind {
    /// Polygon mesh shape
    Mesh,
    /// Node computing an output mesh from an input mesh
    Deformer,
    /// Anything else
    #[default]
    Unknown,
}

impl NodeKind {
    /// Get display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeKind::Mesh => "mesh",
            NodeKind::Deformer => "deformer",
            NodeKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Mapping from host node type names to [`NodeKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindTable {
    /// Host type names treated as meshes
    pub mesh: Vec<String>,
    /// Host type names treated as deformers
    pub deformer: Vec<String>,
}

impl KindTable {
    /// Resolve a host type name
    pub fn kind_of(&self, type_name: &str) -> NodeKind {
        if self.mesh.iter().any(|t| t == type_name) {
            NodeKind::Mesh
        } else if self.deformer.iter().any(|t| t == type_name) {
            NodeKind::Deformer
        } else {
            NodeKind::Unknown
        }
    }
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            mesh: vec!["mesh".to_string()],
            deformer: vec!["skinCluster".to_string()],
        }
    }
}

/// A node in the scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node name
    pub name: NodeName,
    /// Node kind
    pub kind: NodeKind,
}

impl Node {
    /// Create a new node
    pub fn new(name: impl Into<NodeName>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
