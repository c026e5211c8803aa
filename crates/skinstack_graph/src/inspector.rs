// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only queries against a scene host.

use crate::classify::{classify, ClassifyError, Classified};
use crate::host::{Directions, HostError, SceneHost};
use crate::node::{NodeKind, NodeName};

/// Error while inspecting the graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectError {
    /// Node does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(NodeName),

    /// Host query failed
    #[error(transparent)]
    Host(HostError),

    /// Host returned a malformed connection list
    #[error("Malformed connections on {node}: {error}")]
    Classify {
        /// Node queried
        node: NodeName,
        /// What was wrong
        error: ClassifyError,
    },
}

impl From<HostError> for InspectError {
    fn from(error: HostError) -> Self {
        match error {
            HostError::NodeNotFound(name) => InspectError::NodeNotFound(name),
            other => InspectError::Host(other),
        }
    }
}

/// Fetches classified connection snapshots from a host.
///
/// Never mutates and never caches: every call re-reads the host.
pub struct GraphInspector<'h, H: SceneHost + ?Sized> {
    host: &'h H,
}

impl<'h, H: SceneHost + ?Sized> GraphInspector<'h, H> {
    /// Create an inspector over a host
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Fail with `NodeNotFound` unless the node exists
    pub fn require_exists(&self, node: &NodeName) -> Result<(), InspectError> {
        if self.host.node_exists(node)? {
            Ok(())
        } else {
            Err(InspectError::NodeNotFound(node.clone()))
        }
    }

    /// Kind of an existing node
    pub fn node_kind(&self, node: &NodeName) -> Result<NodeKind, InspectError> {
        self.require_exists(node)?;
        Ok(self.host.node_kind(node)?)
    }

    /// Classified connections of a node, both directions
    pub fn get_classified_connections(&self, node: &NodeName) -> Result<Classified, InspectError> {
        self.classified(node, Directions::Both)
    }

    /// Classified incoming connections of a node
    pub fn upstream_connections(&self, node: &NodeName) -> Result<Classified, InspectError> {
        self.classified(node, Directions::Upstream)
    }

    fn classified(&self, node: &NodeName, directions: Directions) -> Result<Classified, InspectError> {
        self.require_exists(node)?;
        let raw = self.host.list_connections(node, directions, true)?;
        tracing::debug!("{node}: {} raw connections ({directions:?})", raw.len() / 2);
        classify(node, &raw).map_err(|error| InspectError::Classify {
            node: node.clone(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Role;
    use crate::scene::{HostCall, InMemoryScene};

    fn scene() -> InMemoryScene {
        let mut scene = InMemoryScene::new("inspect");
        scene.add_node("meshOrig", NodeKind::Mesh);
        scene.add_node("skinB", NodeKind::Deformer);
        scene.add_node("meshX", NodeKind::Mesh);
        scene.link("meshOrig.worldMesh[0]", "skinB.input[0].inputGeometry").unwrap();
        scene.link("meshOrig.outMesh", "skinB.originalGeometry[0]").unwrap();
        scene.link("skinB.outputGeometry[0]", "meshX.inMesh").unwrap();
        scene
    }

    #[test]
    fn test_classified_connections() {
        let scene = scene();
        let inspector = GraphInspector::new(&scene);
        let classified = inspector
            .get_classified_connections(&NodeName::from("skinB"))
            .unwrap();

        for role in Role::GEOMETRY {
            assert!(classified.unique(role).is_ok(), "{role}");
        }
        let output = classified.unique(Role::OutputGeometry).unwrap();
        assert_eq!(output.far_end().map(|p| p.node.as_str()), Some("meshX"));
    }

    #[test]
    fn test_upstream_only() {
        let scene = scene();
        let inspector = GraphInspector::new(&scene);
        let classified = inspector.upstream_connections(&NodeName::from("skinB")).unwrap();
        assert_eq!(classified.len(), 2);
        assert!(classified.optional(Role::OutputGeometry).unwrap().is_none());
    }

    #[test]
    fn test_missing_node() {
        let scene = scene();
        let inspector = GraphInspector::new(&scene);
        let ghost = NodeName::from("ghost");
        assert_eq!(
            inspector.get_classified_connections(&ghost),
            Err(InspectError::NodeNotFound(ghost.clone()))
        );
        assert_eq!(inspector.node_kind(&ghost), Err(InspectError::NodeNotFound(ghost)));
    }

    #[test]
    fn test_queries_use_shape_filter_and_never_mutate() {
        let scene = scene();
        let inspector = GraphInspector::new(&scene);
        let skin = NodeName::from("skinB");
        inspector.get_classified_connections(&skin).unwrap();
        inspector.get_classified_connections(&skin).unwrap();

        assert_eq!(scene.mutation_count(), 0);
        assert!(scene.calls().contains(&HostCall::ListConnections {
            node: skin,
            directions: Directions::Both,
            shapes_only: true,
        }));
    }
}
