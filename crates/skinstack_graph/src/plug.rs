// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plug (attribute slot) definitions.
//!
//! A plug path is `node.attribute`. The attribute part is opaque: it is only
//! compared against the well-known names below, never interpreted.

use crate::node::NodeName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deformer input geometry
pub const INPUT_GEOMETRY: &str = "input[0].inputGeometry";
/// Deformer original (undeformed) geometry
pub const ORIGINAL_GEOMETRY: &str = "originalGeometry[0]";
/// Deformer output geometry
pub const OUTPUT_GEOMETRY: &str = "outputGeometry[0]";
/// Mesh world-space output
pub const WORLD_MESH: &str = "worldMesh[0]";
/// Mesh local output
pub const OUT_MESH: &str = "outMesh";
/// Mesh input
pub const IN_MESH: &str = "inMesh";

/// Error parsing a plug path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlugParseError {
    /// No `.` separating node and attribute
    #[error("Plug path has no attribute: {0:?}")]
    MissingAttribute(String),

    /// Empty node part
    #[error("Plug path has no node: {0:?}")]
    MissingNode(String),
}

/// An addressable attribute slot on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plug {
    /// Owning node
    pub node: NodeName,
    /// Attribute path below the node
    pub attribute: String,
    /// Trailing element index of the attribute path, if any
    pub index: Option<u32>,
}

impl Plug {
    /// Create a plug on a node
    pub fn new(node: impl Into<NodeName>, attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let index = trailing_index(&attribute);
        Self {
            node: node.into(),
            attribute,
            index,
        }
    }

    /// Parse a host plug path
    pub fn parse(path: &str) -> Result<Self, PlugParseError> {
        let Some((node, attribute)) = path.split_once('.') else {
            return Err(PlugParseError::MissingAttribute(path.to_string()));
        };
        if node.is_empty() {
            return Err(PlugParseError::MissingNode(path.to_string()));
        }
        if attribute.is_empty() {
            return Err(PlugParseError::MissingAttribute(path.to_string()));
        }
        Ok(Self::new(node, attribute))
    }

    /// Full host path of this plug
    pub fn path(&self) -> String {
        format!("{}.{}", self.node, self.attribute)
    }

    /// Check whether this plug is the given attribute
    pub fn is(&self, attribute: &str) -> bool {
        self.attribute == attribute
    }
}

fn trailing_index(attribute: &str) -> Option<u32> {
    let open = attribute.strip_suffix(']')?.rfind('[')?;
    attribute[open + 1..attribute.len() - 1].parse().ok()
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.attribute)
    }
}

impl TryFrom<String> for Plug {
    type Error = PlugParseError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        Self::parse(&path)
    }
}

impl From<Plug> for String {
    fn from(plug: Plug) -> Self {
        plug.path()
    }
}
