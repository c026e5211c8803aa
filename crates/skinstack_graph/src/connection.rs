// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the scene graph.

use crate::plug::Plug;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a connection held by the in-memory scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometry role a connection plays for a deformer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Geometry the deformer deforms
    InputGeometry,
    /// Undeformed reference geometry
    OriginalGeometry,
    /// Deformed result
    OutputGeometry,
    /// Not a geometry connection
    Unclassified,
}

impl Role {
    /// The three geometry roles
    pub const GEOMETRY: [Role; 3] = [
        Role::InputGeometry,
        Role::OriginalGeometry,
        Role::OutputGeometry,
    ];

    /// Get display name for this role
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::InputGeometry => "input geometry",
            Role::OriginalGeometry => "original geometry",
            Role::OutputGeometry => "output geometry",
            Role::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A directed connection: `source` feeds `destination`.
///
/// This is a read snapshot. Any mutating host call invalidates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Upstream plug
    pub source: Plug,
    /// Downstream plug
    pub destination: Plug,
    /// Role relative to the node it was classified for
    pub role: Role,
}

impl Connection {
    /// Create a new connection
    pub fn new(source: Plug, destination: Plug, role: Role) -> Self {
        Self {
            source,
            destination,
            role,
        }
    }

    /// The plug on the other side of the classified node
    pub fn far_end(&self) -> Option<&Plug> {
        match self.role {
            Role::InputGeometry | Role::OriginalGeometry => Some(&self.source),
            Role::OutputGeometry => Some(&self.destination),
            Role::Unclassified => None,
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}
