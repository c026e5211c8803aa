// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rebuild (bake) a deformer out of its stack.

use crate::config::RewireConfig;
use crate::error::{ClassificationIssue, DeformError};
use crate::plan::{AppliedStep, RewirePlan, RewireStep};
use crate::validate::require_deformer;
use serde::{Deserialize, Serialize};
use skinstack_graph::{GraphInspector, HostError, NodeKind, NodeName, Role, SceneHost};
use std::fmt;

/// Where the rebuilt result goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RebuildMode {
    /// Bypass the deformer and keep a baked duplicate of the mesh
    NewMesh,
    /// Rebuild onto the existing target mesh
    #[default]
    TargetMesh,
}

impl RebuildMode {
    /// Get display name for this mode
    pub fn display_name(&self) -> &'static str {
        match self {
            RebuildMode::NewMesh => "New Mesh",
            RebuildMode::TargetMesh => "Target Mesh",
        }
    }
}

impl fmt::Display for RebuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Input and output are both meshes; nothing was changed
    AlreadyRebuilt {
        /// Deformer inspected
        node: NodeName,
        /// Mesh feeding it
        input: NodeName,
        /// Mesh it feeds
        output: NodeName,
    },
    /// The deformer was bypassed and its mesh duplicated
    Rebuilt {
        /// Deformer bypassed
        node: NodeName,
        /// Original geometry feeding the deformer, if connected
        original: Option<NodeName>,
        /// Steps applied
        applied: Vec<AppliedStep>,
        /// Name of the baked duplicate
        duplicate: NodeName,
    },
}

impl RebuildOutcome {
    /// Whether the host graph was changed
    pub fn changed_graph(&self) -> bool {
        matches!(self, RebuildOutcome::Rebuilt { .. })
    }

    /// Status line for the user
    pub fn message(&self) -> String {
        match self {
            RebuildOutcome::AlreadyRebuilt { node, .. } => {
                format!("The deformer {node} is already rebuilt.")
            }
            RebuildOutcome::Rebuilt { node, duplicate, .. } => {
                format!("Rebuilt {node} into {duplicate}")
            }
        }
    }
}

/// Rebuilds deformers
#[derive(Debug, Clone, Default)]
pub struct RebuildEngine {
    config: RewireConfig,
}

impl RebuildEngine {
    /// Create a rebuild engine
    pub fn new(config: RewireConfig) -> Self {
        Self { config }
    }

    /// Rebuild `node` in the given mode
    pub fn rebuild<H: SceneHost + ?Sized>(
        &self,
        host: &mut H,
        node: &NodeName,
        mode: RebuildMode,
    ) -> Result<RebuildOutcome, DeformError> {
        let (plan, original) = match self.prepare(&*host, node, mode)? {
            Prepared::Noop(outcome) => {
                tracing::info!("{}", outcome.message());
                return Ok(outcome);
            }
            Prepared::Plan { plan, original } => (plan, original),
        };

        let applied = plan.apply(host)?;
        let duplicate = applied
            .iter()
            .find_map(|a| a.created.clone())
            .ok_or_else(|| {
                DeformError::Host(HostError::Protocol("duplicate returned no node".to_string()))
            })?;

        let outcome = RebuildOutcome::Rebuilt {
            node: node.clone(),
            original,
            applied,
            duplicate,
        };
        tracing::info!("{}", outcome.message());
        Ok(outcome)
    }

    fn prepare<H: SceneHost + ?Sized>(
        &self,
        host: &H,
        node: &NodeName,
        mode: RebuildMode,
    ) -> Result<Prepared, DeformError> {
        let inspector = GraphInspector::new(host);
        require_deformer(&inspector, node)?;

        let connections = inspector.get_classified_connections(node)?;
        let lookup = |role| {
            connections
                .unique(role)
                .map_err(|e| DeformError::classification(node, e))
        };
        let input = lookup(Role::InputGeometry)?;
        let output = lookup(Role::OutputGeometry)?;
        let original = connections
            .optional(Role::OriginalGeometry)
            .map_err(|e| DeformError::classification(node, e))?
            .map(|c| c.source.node.clone());

        let input_node = &input.source.node;
        let output_node = &output.destination.node;
        let input_kind = inspector.node_kind(input_node)?;
        let output_kind = inspector.node_kind(output_node)?;
        tracing::debug!("{node}: input from {input_node} ({input_kind}), output to {output_node} ({output_kind})");

        if input_kind == NodeKind::Mesh && output_kind == NodeKind::Mesh {
            return Ok(Prepared::Noop(RebuildOutcome::AlreadyRebuilt {
                node: node.clone(),
                input: input_node.clone(),
                output: output_node.clone(),
            }));
        }

        match mode {
            RebuildMode::TargetMesh => Err(DeformError::UnsupportedMode(mode)),
            RebuildMode::NewMesh => {
                if input_kind != NodeKind::Deformer || output_kind != NodeKind::Mesh {
                    return Err(DeformError::classification(
                        node,
                        ClassificationIssue::Pattern {
                            input: input_kind,
                            output: output_kind,
                        },
                    ));
                }

                let mut plan = RewirePlan::new();
                plan.push(RewireStep::connect(
                    input.source.clone(),
                    output.destination.clone(),
                ))
                .push(RewireStep::duplicate(
                    output_node.clone(),
                    output_node.with_suffix(&self.config.rebuilt_suffix).as_str(),
                ));
                Ok(Prepared::Plan { plan, original })
            }
        }
    }
}

enum Prepared {
    Noop(RebuildOutcome),
    Plan {
        plan: RewirePlan,
        original: Option<NodeName>,
    },
}
