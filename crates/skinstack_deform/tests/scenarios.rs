// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end merge and rebuild scenarios against the in-memory host.

use skinstack_deform::{DeformError, MergeEngine, RebuildEngine, RebuildMode, RebuildOutcome};
use skinstack_graph::{HostCall, InMemoryScene, NodeKind, NodeName, SceneHost};

fn name(s: &str) -> NodeName {
    NodeName::from(s)
}

/// `meshOrig` feeds `skinB`; `skinA` is a free deformer.
fn merge_scene() -> InMemoryScene {
    let mut scene = InMemoryScene::new("merge");
    scene.add_node("meshOrig", NodeKind::Mesh);
    scene.add_node("skinA", NodeKind::Deformer);
    scene.add_node("skinB", NodeKind::Deformer);
    scene
        .link("meshOrig.worldMesh[0]", "skinB.input[0].inputGeometry")
        .unwrap();
    scene
        .link("meshOrig.outMesh", "skinB.originalGeometry[0]")
        .unwrap();
    scene
}

#[test]
fn merge_splices_target_in_front_of_source() {
    let mut scene = merge_scene();
    let report = MergeEngine::default()
        .merge(&mut scene, &name("skinA"), &name("skinB"))
        .unwrap();

    assert_eq!(report.origin_shape, name("meshOrig"));
    assert!(scene.has_link("meshOrig.worldMesh[0]", "skinA.input[0].inputGeometry"));
    assert!(scene.has_link("meshOrig.outMesh", "skinA.originalGeometry[0]"));
    assert!(scene.has_link("skinA.outputGeometry[0]", "skinB.input[0].inputGeometry"));
    assert!(!scene.has_link("meshOrig.worldMesh[0]", "skinB.input[0].inputGeometry"));
    assert_eq!(scene.mutation_count(), 3);
}

#[test]
fn merge_issues_all_queries_before_mutating() {
    let mut scene = merge_scene();
    MergeEngine::default()
        .merge(&mut scene, &name("skinA"), &name("skinB"))
        .unwrap();

    let calls = scene.calls();
    let first_mutation = calls.iter().position(HostCall::is_mutation).unwrap();
    assert!(calls[first_mutation..].iter().all(HostCall::is_mutation));
    assert!(calls.iter().all(|c| !matches!(c, HostCall::Connect { force: false, .. })));
}

#[test]
fn merge_is_idempotent() {
    let mut scene = merge_scene();
    let engine = MergeEngine::default();
    engine.merge(&mut scene, &name("skinA"), &name("skinB")).unwrap();
    let after_first = scene.snapshot().unwrap();

    let report = engine.merge(&mut scene, &name("skinA"), &name("skinB")).unwrap();
    assert_eq!(report.origin_shape, name("meshOrig"));
    assert!(report.replaced.is_empty());
    assert_eq!(scene.snapshot().unwrap(), after_first);
}

#[test]
fn merge_recomputes_origin_from_current_graph() {
    let mut scene = merge_scene();
    let engine = MergeEngine::default();
    engine.merge(&mut scene, &name("skinA"), &name("skinB")).unwrap();

    scene.add_node("meshOther", NodeKind::Mesh);
    scene
        .connect("meshOther.outMesh", "skinB.originalGeometry[0]", true)
        .unwrap();

    let report = engine.merge(&mut scene, &name("skinA"), &name("skinB")).unwrap();
    assert_eq!(report.origin_shape, name("meshOther"));
    assert!(scene.has_link("meshOther.worldMesh[0]", "skinA.input[0].inputGeometry"));
}

#[test]
fn merge_on_non_deformer_leaves_graph_untouched() {
    for (target, source) in [("meshOrig", "skinB"), ("skinA", "meshOrig")] {
        let mut scene = merge_scene();
        let before = scene.snapshot().unwrap();

        let err = MergeEngine::default()
            .merge(&mut scene, &name(target), &name(source))
            .unwrap_err();

        assert_eq!(
            err,
            DeformError::TypeMismatch {
                node: name("meshOrig"),
                expected: NodeKind::Deformer,
                found: NodeKind::Mesh,
            }
        );
        assert_eq!(scene.snapshot().unwrap(), before);
        assert_eq!(scene.mutation_count(), 0);
    }
}

#[test]
fn merge_stacks_three_deformers_bottom_up() {
    let mut scene = merge_scene();
    scene.add_node("skinZ", NodeKind::Deformer);
    let engine = MergeEngine::default();

    engine.merge(&mut scene, &name("skinA"), &name("skinB")).unwrap();
    engine.merge(&mut scene, &name("skinZ"), &name("skinA")).unwrap();

    assert!(scene.has_link("meshOrig.worldMesh[0]", "skinZ.input[0].inputGeometry"));
    assert!(scene.has_link("skinZ.outputGeometry[0]", "skinA.input[0].inputGeometry"));
    assert!(scene.has_link("skinA.outputGeometry[0]", "skinB.input[0].inputGeometry"));
}

/// `skinD` feeds `skinC`, which feeds `meshX`.
fn rebuild_scene() -> InMemoryScene {
    let mut scene = InMemoryScene::new("rebuild");
    scene.add_node("skinD", NodeKind::Deformer);
    scene.add_node("skinC", NodeKind::Deformer);
    scene.add_node("meshX", NodeKind::Mesh);
    scene
        .link("skinD.outputGeometry[0]", "skinC.input[0].inputGeometry")
        .unwrap();
    scene.link("skinC.outputGeometry[0]", "meshX.inMesh").unwrap();
    scene
}

#[test]
fn rebuild_new_mesh_bypasses_and_duplicates() {
    let mut scene = rebuild_scene();
    let nodes_before = scene.node_count();

    let outcome = RebuildEngine::default()
        .rebuild(&mut scene, &name("skinC"), RebuildMode::NewMesh)
        .unwrap();

    assert!(outcome.changed_graph());
    assert!(scene.has_link("skinD.outputGeometry[0]", "meshX.inMesh"));
    assert_eq!(scene.node_count(), nodes_before + 1);
    assert_eq!(
        scene.node(&name("meshXRebuilt")).map(|n| n.kind),
        Some(NodeKind::Mesh)
    );

    let mutations: Vec<HostCall> = scene.calls().into_iter().filter(HostCall::is_mutation).collect();
    assert_eq!(
        mutations,
        vec![
            HostCall::Connect {
                from: "skinD.outputGeometry[0]".to_string(),
                to: "meshX.inMesh".to_string(),
                force: true,
            },
            HostCall::Duplicate {
                node: name("meshX"),
                new_name: "meshXRebuilt".to_string(),
            },
        ]
    );
}

#[test]
fn rebuild_already_baked_is_informational_noop() {
    let mut scene = InMemoryScene::new("baked");
    scene.add_node("meshIn", NodeKind::Mesh);
    scene.add_node("skin", NodeKind::Deformer);
    scene.add_node("meshOut", NodeKind::Mesh);
    scene.link("meshIn.worldMesh[0]", "skin.input[0].inputGeometry").unwrap();
    scene.link("skin.outputGeometry[0]", "meshOut.inMesh").unwrap();
    let before = scene.snapshot().unwrap();

    let outcome = RebuildEngine::default()
        .rebuild(&mut scene, &name("skin"), RebuildMode::NewMesh)
        .unwrap();

    assert_eq!(
        outcome,
        RebuildOutcome::AlreadyRebuilt {
            node: name("skin"),
            input: name("meshIn"),
            output: name("meshOut"),
        }
    );
    assert_eq!(scene.mutation_count(), 0);
    assert_eq!(scene.snapshot().unwrap(), before);
}

#[test]
fn rebuild_duplicate_failure_reports_partial_graph() {
    struct NoDuplicates(InMemoryScene);

    impl SceneHost for NoDuplicates {
        fn node_exists(&self, name: &NodeName) -> Result<bool, skinstack_graph::HostError> {
            self.0.node_exists(name)
        }
        fn node_kind(&self, name: &NodeName) -> Result<NodeKind, skinstack_graph::HostError> {
            self.0.node_kind(name)
        }
        fn list_connections(
            &self,
            name: &NodeName,
            directions: skinstack_graph::Directions,
            shapes_only: bool,
        ) -> Result<Vec<String>, skinstack_graph::HostError> {
            self.0.list_connections(name, directions, shapes_only)
        }
        fn connect(&mut self, from: &str, to: &str, force: bool) -> Result<(), skinstack_graph::HostError> {
            self.0.connect(from, to, force)
        }
        fn duplicate(&mut self, node: &NodeName, _new_name: &str) -> Result<NodeName, skinstack_graph::HostError> {
            Err(skinstack_graph::HostError::DuplicateFailed {
                node: node.clone(),
                reason: "read-only scene".to_string(),
            })
        }
        fn display_info(&self, message: &str) {
            self.0.display_info(message);
        }
        fn display_error(&self, message: &str) {
            self.0.display_error(message);
        }
    }

    let mut host = NoDuplicates(rebuild_scene());
    let err = RebuildEngine::default()
        .rebuild(&mut host, &name("skinC"), RebuildMode::NewMesh)
        .unwrap_err();

    assert!(err.graph_changed());
    let DeformError::PartialGraph { applied, failed, pending, .. } = err else {
        panic!("expected a partial graph error");
    };
    assert_eq!(applied.len(), 1);
    assert_eq!(failed.to_string(), "duplicate meshX as meshXRebuilt");
    assert!(pending.is_empty());
    assert!(host.0.has_link("skinD.outputGeometry[0]", "meshX.inMesh"));
}
