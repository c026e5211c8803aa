// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool session: source and target deformer lists over one host.

use skinstack_deform::{
    find_deformers, DeformError, MergeEngine, MergeReport, RebuildEngine, RebuildMode,
    RebuildOutcome, RewireConfig,
};
use skinstack_graph::{NodeName, SceneHost};

/// Errors from session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Merge or rebuild failure
    #[error(transparent)]
    Deform(#[from] DeformError),

    /// Combine needs a stack to build
    #[error("Combine needs at least two target deformers, found {0}")]
    NotEnoughTargets(usize),

    /// Node is in neither list
    #[error("{0} is not listed")]
    NotListed(NodeName),

    /// Rebuild all had nothing to work on
    #[error("No deformers listed to rebuild")]
    NothingToRebuild,

    /// Some rebuilds in a batch failed
    #[error("{failed} of {total} rebuilds failed")]
    RebuildFailures {
        /// Number of failed rebuilds
        failed: usize,
        /// Number of rebuilds attempted
        total: usize,
    },
}

/// Per-node result of [`Session::rebuild_all`]
pub type RebuildResult = (NodeName, Result<RebuildOutcome, SessionError>);

/// An explicitly owned tool session
pub struct Session<H: SceneHost> {
    host: H,
    merge: MergeEngine,
    rebuild: RebuildEngine,
    sources: Vec<NodeName>,
    targets: Vec<NodeName>,
    mode: RebuildMode,
}

impl<H: SceneHost> Session<H> {
    /// Create a session over `host`
    pub fn new(host: H, config: RewireConfig, mode: RebuildMode) -> Self {
        Self {
            host,
            merge: MergeEngine::new(config.clone()),
            rebuild: RebuildEngine::new(config),
            sources: Vec::new(),
            targets: Vec::new(),
            mode,
        }
    }

    /// The host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Give the host back, ending the session
    pub fn into_host(self) -> H {
        self.host
    }

    /// Source deformers, in list order
    pub fn sources(&self) -> &[NodeName] {
        &self.sources
    }

    /// Target deformers, in list order
    pub fn targets(&self) -> &[NodeName] {
        &self.targets
    }

    /// Current rebuild mode
    pub fn mode(&self) -> RebuildMode {
        self.mode
    }

    /// Change the rebuild mode
    pub fn set_mode(&mut self, mode: RebuildMode) {
        tracing::debug!("Rebuild mode set to {mode}");
        self.mode = mode;
    }

    /// Append the deformers found on `mesh` to the source list
    pub fn load_sources(&mut self, mesh: &NodeName) -> Result<usize, SessionError> {
        let found = self.discover(mesh)?;
        Ok(append_new(&mut self.sources, found))
    }

    /// Append the deformers found on `mesh` to the target list
    pub fn load_targets(&mut self, mesh: &NodeName) -> Result<usize, SessionError> {
        let found = self.discover(mesh)?;
        Ok(append_new(&mut self.targets, found))
    }

    fn discover(&self, mesh: &NodeName) -> Result<Vec<NodeName>, SessionError> {
        let result = find_deformers(&self.host, mesh).map_err(SessionError::from);
        match &result {
            Ok(found) if found.is_empty() => {
                self.host.display_info(&format!("No deformers found on {mesh}"));
            }
            Ok(found) => {
                self.host
                    .display_info(&format!("Found {} deformer(s) on {mesh}", found.len()));
            }
            Err(err) => self.host.display_error(&err.to_string()),
        }
        result
    }

    /// Add a source deformer; returns false if it was already listed
    pub fn add_source(&mut self, node: NodeName) -> bool {
        append_new(&mut self.sources, [node]) == 1
    }

    /// Add a target deformer; returns false if it was already listed
    pub fn add_target(&mut self, node: NodeName) -> bool {
        append_new(&mut self.targets, [node]) == 1
    }

    /// Move a source deformer to the end of the target list
    pub fn move_to_target(&mut self, node: &NodeName) -> Result<(), SessionError> {
        take(&mut self.sources, node)?;
        append_new(&mut self.targets, [node.clone()]);
        Ok(())
    }

    /// Move a target deformer to the end of the source list
    pub fn move_to_source(&mut self, node: &NodeName) -> Result<(), SessionError> {
        take(&mut self.targets, node)?;
        append_new(&mut self.sources, [node.clone()]);
        Ok(())
    }

    /// Remove a deformer from whichever lists hold it
    pub fn remove(&mut self, node: &NodeName) -> Result<(), SessionError> {
        let from_sources = take(&mut self.sources, node).is_ok();
        let from_targets = take(&mut self.targets, node).is_ok();
        if from_sources || from_targets {
            Ok(())
        } else {
            Err(SessionError::NotListed(node.clone()))
        }
    }

    /// Merge `target` into `source`
    pub fn merge(
        &mut self,
        target: &NodeName,
        source: &NodeName,
    ) -> Result<MergeReport, SessionError> {
        let result = self
            .merge
            .merge(&mut self.host, target, source)
            .map_err(SessionError::from);
        self.report(&result, MergeReport::message);
        result
    }

    /// Rebuild `node` in `mode`
    pub fn rebuild(
        &mut self,
        node: &NodeName,
        mode: RebuildMode,
    ) -> Result<RebuildOutcome, SessionError> {
        let result = self
            .rebuild
            .rebuild(&mut self.host, node, mode)
            .map_err(SessionError::from);
        self.report(&result, RebuildOutcome::message);
        result
    }

    /// Stack the target list so list order becomes deformation order
    ///
    /// Adjacent targets are merged from the bottom of the list up; the first
    /// failure stops the combine.
    pub fn combine(&mut self) -> Result<Vec<MergeReport>, SessionError> {
        let targets = self.targets.clone();
        if targets.len() < 2 {
            let err = SessionError::NotEnoughTargets(targets.len());
            self.host.display_error(&err.to_string());
            return Err(err);
        }

        let mut reports = Vec::with_capacity(targets.len() - 1);
        for pair in targets.windows(2).rev() {
            reports.push(self.merge(&pair[0], &pair[1])?);
        }
        tracing::info!("Combined {} deformers", targets.len());
        Ok(reports)
    }

    /// Rebuild every listed deformer, sources first, in the current mode
    pub fn rebuild_all(&mut self) -> Result<Vec<RebuildResult>, SessionError> {
        let nodes: Vec<NodeName> = self
            .sources
            .iter()
            .chain(&self.targets)
            .cloned()
            .collect();
        if nodes.is_empty() {
            let err = SessionError::NothingToRebuild;
            self.host.display_error(&err.to_string());
            return Err(err);
        }

        let mode = self.mode;
        Ok(nodes
            .into_iter()
            .map(|node| {
                let result = self.rebuild(&node, mode);
                (node, result)
            })
            .collect())
    }

    fn report<T>(&self, result: &Result<T, SessionError>, message: impl Fn(&T) -> String) {
        match result {
            Ok(value) => self.host.display_info(&message(value)),
            Err(err) => {
                tracing::error!("{err}");
                self.host.display_error(&err.to_string());
                if let SessionError::Deform(DeformError::PartialGraph { applied, .. }) = err {
                    for step in applied {
                        self.host.display_error(&format!("Already applied: {step}"));
                    }
                }
            }
        }
    }
}

fn append_new(list: &mut Vec<NodeName>, nodes: impl IntoIterator<Item = NodeName>) -> usize {
    let before = list.len();
    for node in nodes {
        if !list.contains(&node) {
            list.push(node);
        }
    }
    list.len() - before
}

fn take(list: &mut Vec<NodeName>, node: &NodeName) -> Result<NodeName, SessionError> {
    let index = list
        .iter()
        .position(|n| n == node)
        .ok_or_else(|| SessionError::NotListed(node.clone()))?;
    Ok(list.remove(index))
}
