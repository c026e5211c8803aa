// SPDX-License-Identifier: MIT OR Apache-2.0
//! Find the deformers attached to a mesh.

use crate::error::DeformError;
use skinstack_graph::{classify, Directions, GraphInspector, NodeKind, NodeName, SceneHost};

/// Deformers directly connected to `mesh`, in host connection order.
///
/// Both directions are searched, so this finds the deformer writing into the
/// mesh as well as deformers reading it as input or original geometry.
pub fn find_deformers<H: SceneHost + ?Sized>(
    host: &H,
    mesh: &NodeName,
) -> Result<Vec<NodeName>, DeformError> {
    let inspector = GraphInspector::new(host);
    inspector.require_exists(mesh)?;

    let raw = host.list_connections(mesh, Directions::Both, true)?;
    let connections = classify(mesh, &raw).map_err(|e| DeformError::classification(mesh, e))?;

    let mut found: Vec<NodeName> = Vec::new();
    for connection in connections.connections() {
        let neighbour = if connection.source.node == *mesh {
            &connection.destination.node
        } else {
            &connection.source.node
        };
        if neighbour == mesh || found.contains(neighbour) {
            continue;
        }
        if host.node_kind(neighbour)? == NodeKind::Deformer {
            found.push(neighbour.clone());
        }
    }

    if found.is_empty() {
        tracing::debug!("No deformers found on {mesh}");
    } else {
        tracing::debug!("Deformers on {mesh}: {found:?}");
    }
    Ok(found)
}
