// SPDX-License-Identifier: MIT OR Apache-2.0
//! RON scripts driving a [`Session`].

use crate::session::{Session, SessionError};
use serde::{Deserialize, Serialize};
use skinstack_deform::RebuildMode;
use skinstack_graph::{NodeName, SceneHost};
use std::path::Path;

/// Errors loading a script
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// File system error
    #[error("Script I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Script parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// One session operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    /// Append the deformers on a mesh to the source list
    LoadSources(NodeName),
    /// Append the deformers on a mesh to the target list
    LoadTargets(NodeName),
    /// Add one source deformer
    AddSource(NodeName),
    /// Add one target deformer
    AddTarget(NodeName),
    /// Move a source deformer to the targets
    MoveToTarget(NodeName),
    /// Move a target deformer to the sources
    MoveToSource(NodeName),
    /// Remove a deformer from the lists
    Remove(NodeName),
    /// Change the rebuild mode
    SetMode(RebuildMode),
    /// Stack the target list
    Combine,
    /// Rebuild every listed deformer
    RebuildAll,
    /// Merge one deformer into another
    Merge {
        /// Deformer spliced in
        target: NodeName,
        /// Deformer it is spliced in front of
        source: NodeName,
    },
    /// Rebuild one deformer
    Rebuild {
        /// Deformer to rebuild
        node: NodeName,
        /// Mode override; the session mode when absent
        #[serde(default)]
        mode: Option<RebuildMode>,
    },
}

impl SessionCommand {
    /// Run this command against a session
    pub fn execute<H: SceneHost>(&self, session: &mut Session<H>) -> Result<(), SessionError> {
        match self {
            SessionCommand::LoadSources(mesh) => {
                session.load_sources(mesh)?;
            }
            SessionCommand::LoadTargets(mesh) => {
                session.load_targets(mesh)?;
            }
            SessionCommand::AddSource(node) => {
                session.add_source(node.clone());
            }
            SessionCommand::AddTarget(node) => {
                session.add_target(node.clone());
            }
            SessionCommand::MoveToTarget(node) => session.move_to_target(node)?,
            SessionCommand::MoveToSource(node) => session.move_to_source(node)?,
            SessionCommand::Remove(node) => session.remove(node)?,
            SessionCommand::SetMode(mode) => session.set_mode(*mode),
            SessionCommand::Combine => {
                session.combine()?;
            }
            SessionCommand::RebuildAll => {
                let results = session.rebuild_all()?;
                let failed = results.iter().filter(|(_, r)| r.is_err()).count();
                if failed > 0 {
                    return Err(SessionError::RebuildFailures {
                        failed,
                        total: results.len(),
                    });
                }
            }
            SessionCommand::Merge { target, source } => {
                session.merge(target, source)?;
            }
            SessionCommand::Rebuild { node, mode } => {
                let mode = mode.unwrap_or(session.mode());
                session.rebuild(node, mode)?;
            }
        }
        Ok(())
    }
}

fn default_stop_on_error() -> bool {
    true
}

/// A list of session commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Stop at the first failing command
    #[serde(default = "default_stop_on_error")]
    pub stop_on_error: bool,
    /// Commands in run order
    pub commands: Vec<SessionCommand>,
}

impl Script {
    /// Load a script from a RON file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a script from RON text
    pub fn parse(content: &str) -> Result<Self, ScriptError> {
        Ok(ron::from_str(content)?)
    }

    /// Run every command against `session`
    pub fn run<H: SceneHost>(&self, session: &mut Session<H>) -> ScriptSummary {
        let mut summary = ScriptSummary::default();
        for (index, command) in self.commands.iter().enumerate() {
            tracing::debug!("Command {index}: {command:?}");
            summary.executed += 1;
            if let Err(err) = command.execute(session) {
                tracing::error!("Command {index} failed: {err}");
                summary.failed += 1;
                if self.stop_on_error {
                    summary.skipped = self.commands.len() - index - 1;
                    break;
                }
            }
        }
        summary
    }
}

/// Counts from a script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    /// Commands run
    pub executed: usize,
    /// Commands that failed
    pub failed: usize,
    /// Commands not run after a failure
    pub skipped: usize,
}
