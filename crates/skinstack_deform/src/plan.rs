// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered mutation plans.
//!
//! Engines finish every host query, build a [`RewirePlan`], and only then
//! apply it. The host has no rollback, so a failure partway through is
//! reported step by step and left for the caller to reconcile.

use crate::error::DeformError;
use serde::{Deserialize, Serialize};
use skinstack_graph::{NodeName, Plug, SceneHost};
use std::fmt;

/// One mutating host call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewireStep {
    /// Force-connect `from` into `to`
    Connect {
        /// Source plug
        from: Plug,
        /// Destination plug
        to: Plug,
    },
    /// Duplicate `node` as `name`
    Duplicate {
        /// Node to duplicate
        node: NodeName,
        /// Requested name
        name: String,
    },
}

impl RewireStep {
    /// Create a connect step
    pub fn connect(from: Plug, to: Plug) -> Self {
        RewireStep::Connect { from, to }
    }

    /// Create a duplicate step
    pub fn duplicate(node: NodeName, name: impl Into<String>) -> Self {
        RewireStep::Duplicate {
            node,
            name: name.into(),
        }
    }
}

impl fmt::Display for RewireStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewireStep::Connect { from, to } => write!(f, "connect {from} -> {to}"),
            RewireStep::Duplicate { node, name } => write!(f, "duplicate {node} as {name}"),
        }
    }
}

/// A step that was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    /// The step
    pub step: RewireStep,
    /// Node created by a duplicate step
    pub created: Option<NodeName>,
}

/// Ordered list of mutations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewirePlan {
    steps: Vec<RewireStep>,
}

impl RewirePlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn push(&mut self, step: RewireStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Planned steps
    pub fn steps(&self) -> &[RewireStep] {
        &self.steps
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if there are no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply all steps in order, stopping at the first failure
    pub fn apply<H: SceneHost + ?Sized>(&self, host: &mut H) -> Result<Vec<AppliedStep>, DeformError> {
        let mut applied = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let result = match step {
                RewireStep::Connect { from, to } => {
                    host.connect(&from.path(), &to.path(), true).map(|()| None)
                }
                RewireStep::Duplicate { node, name } => host.duplicate(node, name).map(Some),
            };

            match result {
                Ok(created) => {
                    tracing::info!("Applied {step}");
                    applied.push(AppliedStep {
                        step: step.clone(),
                        created,
                    });
                }
                Err(cause) if index == 0 => {
                    tracing::error!("Failed to {step}: {cause}");
                    return Err(DeformError::HostConnect {
                        step: step.clone(),
                        cause,
                    });
                }
                Err(cause) => {
                    tracing::error!(
                        "Failed to {step} after {index} applied steps, graph is partially rewired: {cause}"
                    );
                    return Err(DeformError::PartialGraph {
                        applied: applied.into_iter().map(|a| a.step).collect(),
                        failed: step.clone(),
                        pending: self.steps[index + 1..].to_vec(),
                        cause,
                    });
                }
            }
        }

        Ok(applied)
    }
}
