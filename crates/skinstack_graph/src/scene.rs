// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory scene host.
//!
//! Behaves like the real host for everything the deformer tools rely on:
//! one incoming connection per destination plug, force-connect replacement,
//! and auto-renaming on duplicate. Every [`SceneHost`] call is recorded so
//! callers can check what was queried and what was mutated.

use crate::connection::ConnectionId;
use crate::host::{Directions, HostError, SceneHost};
use crate::node::{Node, NodeKind, NodeName};
use crate::plug::Plug;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A stored connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Source plug
    pub from: Plug,
    /// Destination plug
    pub to: Plug,
}

/// Serializable scene contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Scene name
    pub name: String,
    /// Nodes in creation order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Connections
    #[serde(default)]
    pub connections: Vec<Link>,
}

/// A recorded host call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// `node_exists`
    NodeExists(NodeName),
    /// `node_kind`
    NodeKind(NodeName),
    /// `list_connections`
    ListConnections {
        /// Node queried
        node: NodeName,
        /// Directions requested
        directions: Directions,
        /// Shape filter flag
        shapes_only: bool,
    },
    /// `connect`
    Connect {
        /// Source plug path
        from: String,
        /// Destination plug path
        to: String,
        /// Force flag
        force: bool,
    },
    /// `duplicate`
    Duplicate {
        /// Node duplicated
        node: NodeName,
        /// Requested name
        new_name: String,
    },
}

impl HostCall {
    /// Whether this call mutates the graph
    pub fn is_mutation(&self) -> bool {
        matches!(self, HostCall::Connect { .. } | HostCall::Duplicate { .. })
    }
}

/// A message shown through the display sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayedMessage {
    /// `display_info`
    Info(String),
    /// `display_error`
    Error(String),
}

/// Errors loading or saving a scene
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// File system error
    #[error("Scene I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Scene parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON write error
    #[error("Scene write error: {0}")]
    Write(#[from] ron::Error),

    /// Two nodes share a name
    #[error("Duplicate node name: {0}")]
    DuplicateNode(NodeName),

    /// A connection in the document is invalid
    #[error("Invalid connection: {0}")]
    Link(#[from] HostError),
}

/// In-memory implementation of [`SceneHost`]
#[derive(Debug, Default)]
pub struct InMemoryScene {
    /// Scene name
    pub name: String,
    nodes: IndexMap<NodeName, Node>,
    connections: IndexMap<ConnectionId, Link>,
    rejected: HashSet<String>,
    calls: Mutex<Vec<HostCall>>,
    messages: Mutex<Vec<DisplayedMessage>>,
}

impl InMemoryScene {
    /// Create a new empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a scene from a document
    pub fn from_document(document: SceneDocument) -> Result<Self, SceneError> {
        let mut scene = Self::new(document.name);
        for node in document.nodes {
            if scene.nodes.contains_key(&node.name) {
                return Err(SceneError::DuplicateNode(node.name));
            }
            scene.nodes.insert(node.name.clone(), node);
        }
        for link in document.connections {
            scene.link(&link.from.path(), &link.to.path())?;
        }
        Ok(scene)
    }

    /// Export the scene contents
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument {
            name: self.name.clone(),
            nodes: self.nodes.values().cloned().collect(),
            connections: self.connections.values().cloned().collect(),
        }
    }

    /// Load a scene from a RON file
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)?;
        let document: SceneDocument = ron::from_str(&content)?;
        let scene = Self::from_document(document)?;
        tracing::info!(
            "Loaded scene {:?} ({} nodes, {} connections) from {:?}",
            scene.name,
            scene.node_count(),
            scene.link_count(),
            path
        );
        Ok(scene)
    }

    /// Save the scene to a RON file
    pub fn save(&self, path: &Path) -> Result<(), SceneError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(&self.to_document(), config)?;
        std::fs::write(path, content)?;
        tracing::info!("Saved scene to {:?}", path);
        Ok(())
    }

    /// Add a node, replacing the kind of an existing node with the same name
    pub fn add_node(&mut self, name: impl Into<NodeName>, kind: NodeKind) -> NodeName {
        let name = name.into();
        self.nodes.insert(name.clone(), Node::new(name.clone(), kind));
        name
    }

    /// Connect two plugs without force and without recording a host call
    pub fn link(&mut self, from: &str, to: &str) -> Result<ConnectionId, HostError> {
        self.insert_link(from, to, false)
    }

    /// Get a node by name
    pub fn node(&self, name: &NodeName) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get all connections
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.connections.values()
    }

    /// Get the number of connections
    pub fn link_count(&self) -> usize {
        self.connections.len()
    }

    /// The plug feeding a destination plug path
    pub fn source_of(&self, to: &str) -> Option<&Plug> {
        self.connections
            .values()
            .find(|l| l.to.path() == to)
            .map(|l| &l.from)
    }

    /// Check if a connection exists
    pub fn has_link(&self, from: &str, to: &str) -> bool {
        self.source_of(to).is_some_and(|p| p.path() == from)
    }

    /// Make every future `connect` into this destination plug fail
    pub fn reject_connections_to(&mut self, to: impl Into<String>) {
        self.rejected.insert(to.into());
    }

    /// Host calls recorded so far
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    /// Number of recorded mutating calls
    pub fn mutation_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_mutation()).count()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Messages shown so far
    pub fn messages(&self) -> Vec<DisplayedMessage> {
        self.messages.lock().clone()
    }

    /// Binary snapshot of nodes and connections, for equality checks
    pub fn snapshot(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&self.to_document())
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }

    fn insert_link(&mut self, from: &str, to: &str, force: bool) -> Result<ConnectionId, HostError> {
        let reject = |reason: String| HostError::ConnectRejected {
            from: from.to_string(),
            to: to.to_string(),
            reason,
        };
        let from_plug = Plug::parse(from).map_err(|e| reject(e.to_string()))?;
        let to_plug = Plug::parse(to).map_err(|e| reject(e.to_string()))?;

        for plug in [&from_plug, &to_plug] {
            if !self.nodes.contains_key(&plug.node) {
                return Err(HostError::NodeNotFound(plug.node.clone()));
            }
        }
        if from_plug == to_plug {
            return Err(reject("cannot connect a plug to itself".to_string()));
        }
        if self.rejected.contains(to) {
            return Err(reject("destination is locked".to_string()));
        }

        let existing = self
            .connections
            .iter()
            .find(|(_, l)| l.to == to_plug)
            .map(|(id, l)| (*id, l.from.clone()));
        if let Some((id, existing_from)) = existing {
            if existing_from == from_plug {
                return Ok(id);
            }
            if !force {
                return Err(reject(format!("already connected from {existing_from}")));
            }
            self.connections.shift_remove(&id);
        }

        let id = ConnectionId::new();
        self.connections.insert(
            id,
            Link {
                from: from_plug,
                to: to_plug,
            },
        );
        Ok(id)
    }

    fn free_name(&self, requested: &str) -> NodeName {
        let mut candidate = NodeName::from(requested);
        let mut counter = 0u32;
        while self.nodes.contains_key(&candidate) {
            counter += 1;
            candidate = NodeName::new(format!("{requested}{counter}"));
        }
        candidate
    }
}

impl SceneHost for InMemoryScene {
    fn node_exists(&self, name: &NodeName) -> Result<bool, HostError> {
        self.record(HostCall::NodeExists(name.clone()));
        Ok(self.nodes.contains_key(name))
    }

    fn node_kind(&self, name: &NodeName) -> Result<NodeKind, HostError> {
        self.record(HostCall::NodeKind(name.clone()));
        self.nodes
            .get(name)
            .map(|n| n.kind)
            .ok_or_else(|| HostError::NodeNotFound(name.clone()))
    }

    fn list_connections(
        &self,
        name: &NodeName,
        directions: Directions,
        shapes_only: bool,
    ) -> Result<Vec<String>, HostError> {
        self.record(HostCall::ListConnections {
            node: name.clone(),
            directions,
            shapes_only,
        });
        if !self.nodes.contains_key(name) {
            return Err(HostError::NodeNotFound(name.clone()));
        }

        Ok(self
            .connections
            .values()
            .filter(|l| {
                (directions.includes_upstream() && l.to.node == *name)
                    || (directions.includes_downstream() && l.from.node == *name)
            })
            .flat_map(|l| [l.from.path(), l.to.path()])
            .collect())
    }

    fn connect(&mut self, from: &str, to: &str, force: bool) -> Result<(), HostError> {
        self.record(HostCall::Connect {
            from: from.to_string(),
            to: to.to_string(),
            force,
        });
        self.insert_link(from, to, force)?;
        tracing::debug!("Connected {from} -> {to}");
        Ok(())
    }

    fn duplicate(&mut self, node: &NodeName, new_name: &str) -> Result<NodeName, HostError> {
        self.record(HostCall::Duplicate {
            node: node.clone(),
            new_name: new_name.to_string(),
        });
        let kind = self
            .nodes
            .get(node)
            .map(|n| n.kind)
            .ok_or_else(|| HostError::NodeNotFound(node.clone()))?;

        let name = self.free_name(new_name);
        self.nodes.insert(name.clone(), Node::new(name.clone(), kind));
        tracing::debug!("Duplicated {node} as {name}");
        Ok(name)
    }

    fn display_info(&self, message: &str) {
        tracing::info!("{message}");
        self.messages
            .lock()
            .push(DisplayedMessage::Info(message.to_string()));
    }

    fn display_error(&self, message: &str) {
        tracing::error!("{message}");
        self.messages
            .lock()
            .push(DisplayedMessage::Error(message.to_string()));
    }
}
