// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors for merge and rebuild operations.

use crate::plan::RewireStep;
use crate::rebuild::RebuildMode;
use skinstack_graph::{ClassifyError, HostError, InspectError, NodeKind, NodeName, RoleLookupError};

/// Why a node's connections do not fit the expected pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationIssue {
    /// A required role is missing or appears more than once
    #[error(transparent)]
    Role(#[from] RoleLookupError),

    /// The host returned a malformed connection list
    #[error(transparent)]
    Malformed(#[from] ClassifyError),

    /// Original geometry is not supplied by a mesh
    #[error("original geometry comes from {node}, a {kind} node")]
    OriginNotMesh {
        /// Node feeding the original geometry
        node: NodeName,
        /// Its kind
        kind: NodeKind,
    },

    /// Far endpoints have kinds the operation has no rule for
    #[error("input comes from a {input}, output goes to a {output}")]
    Pattern {
        /// Kind feeding the input geometry
        input: NodeKind,
        /// Kind reading the output geometry
        output: NodeKind,
    },
}

/// Error from a merge or rebuild
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeformError {
    /// Node does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(NodeName),

    /// Node is not of the required kind
    #[error("{node} is a {found} node, expected a {expected}")]
    TypeMismatch {
        /// Offending node
        node: NodeName,
        /// Kind required
        expected: NodeKind,
        /// Kind found
        found: NodeKind,
    },

    /// Node connections do not fit the expected roles
    #[error("Cannot classify connections of {node}: {issue}")]
    Classification {
        /// Node whose connections were classified
        node: NodeName,
        /// What did not fit
        issue: ClassificationIssue,
    },

    /// Mode has no rewrite rule
    #[error("Rebuild mode {0} is not supported")]
    UnsupportedMode(RebuildMode),

    /// Both operands are the same node
    #[error("Cannot merge {0} with itself")]
    SameNode(NodeName),

    /// The first mutation failed; the graph is unchanged
    #[error("Host rejected {step}: {cause}")]
    HostConnect {
        /// Step that failed
        step: RewireStep,
        /// Host failure
        #[source]
        cause: HostError,
    },

    /// A mutation failed after earlier ones succeeded
    #[error("Graph partially rewired: {failed} failed after {} applied steps ({} not attempted): {cause}", .applied.len(), .pending.len())]
    PartialGraph {
        /// Steps that succeeded
        applied: Vec<RewireStep>,
        /// Step that failed
        failed: RewireStep,
        /// Steps never attempted
        pending: Vec<RewireStep>,
        /// Host failure
        #[source]
        cause: HostError,
    },

    /// A host query failed
    #[error("Host query failed: {0}")]
    Host(#[source] HostError),
}

impl DeformError {
    pub(crate) fn classification(node: &NodeName, issue: impl Into<ClassificationIssue>) -> Self {
        DeformError::Classification {
            node: node.clone(),
            issue: issue.into(),
        }
    }

    /// Whether the host graph may have been changed
    pub fn graph_changed(&self) -> bool {
        matches!(self, DeformError::PartialGraph { .. })
    }
}

impl From<HostError> for DeformError {
    fn from(error: HostError) -> Self {
        match error {
            HostError::NodeNotFound(name) => DeformError::NodeNotFound(name),
            other => DeformError::Host(other),
        }
    }
}

impl From<InspectError> for DeformError {
    fn from(error: InspectError) -> Self {
        match error {
            InspectError::NodeNotFound(name) => DeformError::NodeNotFound(name),
            InspectError::Host(error) => DeformError::Host(error),
            InspectError::Classify { node, error } => DeformError::classification(&node, error),
        }
    }
}
