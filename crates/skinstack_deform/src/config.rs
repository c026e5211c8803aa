// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rewire configuration.

use serde::{Deserialize, Serialize};
use skinstack_graph::plug::{OUT_MESH, WORLD_MESH};

/// Mesh plug names and naming rules used when rewiring.
///
/// Deformer plug names are fixed by the classifier and are not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewireConfig {
    /// Mesh world-space output attribute
    pub world_output: String,
    /// Mesh local output attribute
    pub local_output: String,
    /// Suffix for baked duplicates
    pub rebuilt_suffix: String,
}

impl Default for RewireConfig {
    fn default() -> Self {
        Self {
            world_output: WORLD_MESH.to_string(),
            local_output: OUT_MESH.to_string(),
            rebuilt_suffix: "Rebuilt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: RewireConfig = ron::from_str("(rebuilt_suffix: \"Baked\")").unwrap();
        assert_eq!(config.rebuilt_suffix, "Baked");
        assert_eq!(config.world_output, "worldMesh[0]");
        assert_eq!(config.local_output, "outMesh");
    }
}
