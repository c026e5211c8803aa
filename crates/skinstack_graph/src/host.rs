// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene graph host capability.
//!
//! The host owns the persistent graph, its undo stack and its node
//! implementations. Everything in this workspace talks to it only through
//! [`SceneHost`].

use crate::node::{NodeKind, NodeName};
use serde::{Deserialize, Serialize};

/// Which connections of a node to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Directions {
    /// Connections feeding the node
    Upstream,
    /// Connections leaving the node
    Downstream,
    /// Both
    Both,
}

impl Directions {
    /// Whether incoming connections are included
    pub fn includes_upstream(&self) -> bool {
        matches!(self, Directions::Upstream | Directions::Both)
    }

    /// Whether outgoing connections are included
    pub fn includes_downstream(&self) -> bool {
        matches!(self, Directions::Downstream | Directions::Both)
    }
}

/// Error reported by a scene host
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// Node does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(NodeName),

    /// Host refused a connection
    #[error("Connection {from} -> {to} rejected: {reason}")]
    ConnectRejected {
        /// Source plug path
        from: String,
        /// Destination plug path
        to: String,
        /// Host message
        reason: String,
    },

    /// Host could not duplicate a node
    #[error("Duplicating {node} failed: {reason}")]
    DuplicateFailed {
        /// Node being duplicated
        node: NodeName,
        /// Host message
        reason: String,
    },

    /// Communication with the host failed
    #[error("Host transport error: {0}")]
    Transport(String),

    /// Host replied with something unexpected
    #[error("Unexpected host reply: {0}")]
    Protocol(String),
}

/// Capabilities the deformer tools need from the scene host
pub trait SceneHost {
    /// Check whether a node exists
    fn node_exists(&self, name: &NodeName) -> Result<bool, HostError>;

    /// Get the kind of an existing node
    fn node_kind(&self, name: &NodeName) -> Result<NodeKind, HostError>;

    /// List a node's connections as a flat list of
    /// `source, destination, source, destination, ...` plug paths
    fn list_connections(
        &self,
        name: &NodeName,
        directions: Directions,
        shapes_only: bool,
    ) -> Result<Vec<String>, HostError>;

    /// Connect two plugs. With `force`, an existing connection into the
    /// destination is replaced.
    fn connect(&mut self, from: &str, to: &str, force: bool) -> Result<(), HostError>;

    /// Duplicate a node under a new name, returning the name actually used
    fn duplicate(&mut self, node: &NodeName, new_name: &str) -> Result<NodeName, HostError>;

    /// Show an informational message to the user
    fn display_info(&self, message: &str);

    /// Show an error message to the user
    fn display_error(&self, message: &str);
}
