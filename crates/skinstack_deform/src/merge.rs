// SPDX-License-Identifier: MIT OR Apache-2.0
//! Merge two deformers into one stack.
//!
//! `merge(target, source)` splices `target` in front of `source`: the origin
//! shape that fed `source` now feeds `target`, and `source` reads `target`'s
//! output. Three force-connects, no node creation.

use crate::config::RewireConfig;
use crate::error::{ClassificationIssue, DeformError};
use crate::plan::{AppliedStep, RewirePlan, RewireStep};
use crate::validate::require_deformer;
use skinstack_graph::plug::{INPUT_GEOMETRY, ORIGINAL_GEOMETRY, OUTPUT_GEOMETRY};
use skinstack_graph::{Connection, GraphInspector, NodeKind, NodeName, Plug, Role, SceneHost};

/// A validated merge, ready to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMerge {
    /// Deformer spliced in front
    pub target: NodeName,
    /// Deformer that ends up reading the target
    pub source: NodeName,
    /// Mesh that originally fed the source
    pub origin_shape: NodeName,
    /// Existing connections the plan overwrites
    pub replaced: Vec<Connection>,
    /// Mutations to apply
    pub plan: RewirePlan,
}

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Deformer spliced in front
    pub target: NodeName,
    /// Deformer that now reads the target
    pub source: NodeName,
    /// Mesh feeding the stack
    pub origin_shape: NodeName,
    /// Connections that were overwritten
    pub replaced: Vec<Connection>,
    /// Steps applied
    pub applied: Vec<AppliedStep>,
}

impl MergeReport {
    /// Status line for the user
    pub fn message(&self) -> String {
        format!(
            "Merged {} into {} (origin shape {})",
            self.target, self.source, self.origin_shape
        )
    }
}

/// Builds and applies merges
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    config: RewireConfig,
}

impl MergeEngine {
    /// Create a merge engine
    pub fn new(config: RewireConfig) -> Self {
        Self { config }
    }

    /// Run every query and validation for a merge without mutating the host
    pub fn prepare<H: SceneHost + ?Sized>(
        &self,
        host: &H,
        target: &NodeName,
        source: &NodeName,
    ) -> Result<PreparedMerge, DeformError> {
        let inspector = GraphInspector::new(host);
        require_deformer(&inspector, target)?;
        require_deformer(&inspector, source)?;
        if target == source {
            return Err(DeformError::SameNode(target.clone()));
        }

        let target_connections = inspector.upstream_connections(target)?;
        let source_connections = inspector.upstream_connections(source)?;

        let original = source_connections
            .unique(Role::OriginalGeometry)
            .map_err(|e| DeformError::classification(source, e))?;
        let origin_shape = original.source.node.clone();
        let origin_kind = inspector.node_kind(&origin_shape)?;
        if origin_kind != NodeKind::Mesh {
            return Err(DeformError::classification(
                source,
                ClassificationIssue::OriginNotMesh {
                    node: origin_shape,
                    kind: origin_kind,
                },
            ));
        }
        tracing::debug!("Origin shape of {source} is {origin_shape}");

        let mut plan = RewirePlan::new();
        plan.push(RewireStep::connect(
            Plug::new(origin_shape.clone(), self.config.world_output.as_str()),
            Plug::new(target.clone(), INPUT_GEOMETRY),
        ))
        .push(RewireStep::connect(
            Plug::new(origin_shape.clone(), self.config.local_output.as_str()),
            Plug::new(target.clone(), ORIGINAL_GEOMETRY),
        ))
        .push(RewireStep::connect(
            Plug::new(target.clone(), OUTPUT_GEOMETRY),
            Plug::new(source.clone(), INPUT_GEOMETRY),
        ));

        let existing: Vec<&Connection> = target_connections
            .geometry()
            .chain(source_connections.with_role(Role::InputGeometry))
            .collect();
        let replaced = plan
            .steps()
            .iter()
            .filter_map(|step| match step {
                RewireStep::Connect { from, to } => existing
                    .iter()
                    .find(|c| c.destination == *to && c.source != *from)
                    .map(|c| (*c).clone()),
                RewireStep::Duplicate { .. } => None,
            })
            .collect();

        Ok(PreparedMerge {
            target: target.clone(),
            source: source.clone(),
            origin_shape,
            replaced,
            plan,
        })
    }

    /// Merge `target` in front of `source`
    pub fn merge<H: SceneHost + ?Sized>(
        &self,
        host: &mut H,
        target: &NodeName,
        source: &NodeName,
    ) -> Result<MergeReport, DeformError> {
        let prepared = self.prepare(&*host, target, source)?;
        for connection in &prepared.replaced {
            tracing::debug!("Overwriting {connection}");
        }

        let applied = prepared.plan.apply(host)?;
        let report = MergeReport {
            target: prepared.target,
            source: prepared.source,
            origin_shape: prepared.origin_shape,
            replaced: prepared.replaced,
            applied,
        };
        tracing::info!("{}", report.message());
        Ok(report)
    }
}
