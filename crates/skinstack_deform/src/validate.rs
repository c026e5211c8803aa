// SPDX-License-Identifier: MIT OR Apache-2.0
//! Operand checks shared by the engines.

use crate::error::DeformError;
use skinstack_graph::{GraphInspector, NodeKind, NodeName, SceneHost};

/// Fail unless `node` exists and is a deformer
pub(crate) fn require_deformer<H: SceneHost + ?Sized>(
    inspector: &GraphInspector<'_, H>,
    node: &NodeName,
) -> Result<(), DeformError> {
    let found = inspector.node_kind(node)?;
    if found != NodeKind::Deformer {
        return Err(DeformError::TypeMismatch {
            node: node.clone(),
            expected: NodeKind::Deformer,
            found,
        });
    }
    Ok(())
}
