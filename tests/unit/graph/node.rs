use super::*;

use crate::foundation::core::{RectD, RenderScale, ViewIdx};
use crate::foundation::error::TesseraResult;

struct Null;

impl Effect for Null {
    fn region_of_definition(
        &self,
        _node_hash: u64,
        _time: f64,
        _scale: RenderScale,
        _view: ViewIdx,
    ) -> TesseraResult<RectD> {
        Ok(RectD::new(0.0, 0.0, 1.0, 1.0))
    }
}

fn add(
    graph: &mut NodeGraph,
    label: &str,
    params: serde_json::Value,
    inputs: Vec<Option<NodeId>>,
) -> NodeId {
    graph.add_node(label, params, Box::new(Null), inputs).unwrap()
}

#[test]
fn rejects_blank_labels_and_unknown_inputs() {
    let mut g = NodeGraph::new();
    assert!(g
        .add_node("  ", serde_json::json!({}), Box::new(Null), vec![])
        .is_err());
    assert!(g
        .add_node(
            "merge",
            serde_json::json!({}),
            Box::new(Null),
            vec![Some(NodeId(7))]
        )
        .is_err());
    assert!(g.is_empty());
}

#[test]
fn accessors_reflect_wiring() {
    let mut g = NodeGraph::new();
    let src = add(&mut g, "source", serde_json::json!({}), vec![]);
    let blur = add(
        &mut g,
        "blur",
        serde_json::json!({"size": 4.0}),
        vec![Some(src), None],
    );
    assert_eq!(g.len(), 2);
    assert_eq!(g.label(blur), "blur");
    assert_eq!(g.input_count(blur), 2);
    assert_eq!(g.input(blur, 0), Some(src));
    assert_eq!(g.input(blur, 1), None);
    assert_eq!(g.input(blur, 5), None);
}

#[test]
fn hashes_are_deterministic_across_graphs() {
    let build = || {
        let mut g = NodeGraph::with_seed(99);
        let src = add(&mut g, "source", serde_json::json!({"file": "a.exr"}), vec![]);
        let blur = add(&mut g, "blur", serde_json::json!({"size": 4.0}), vec![Some(src)]);
        (g.node_hash(src), g.node_hash(blur))
    };
    assert_eq!(build(), build());
}

#[test]
fn hash_changes_with_params_label_and_seed() {
    let mut g = NodeGraph::new();
    let a = add(&mut g, "blur", serde_json::json!({"size": 4.0}), vec![]);
    let b = add(&mut g, "blur", serde_json::json!({"size": 5.0}), vec![]);
    let c = add(&mut g, "sharpen", serde_json::json!({"size": 4.0}), vec![]);
    assert_ne!(g.node_hash(a), g.node_hash(b));
    assert_ne!(g.node_hash(a), g.node_hash(c));

    let mut seeded = NodeGraph::with_seed(1);
    let d = add(&mut seeded, "blur", serde_json::json!({"size": 4.0}), vec![]);
    assert_ne!(g.node_hash(a), seeded.node_hash(d));
}

#[test]
fn hash_propagates_upstream_changes() {
    let mut g1 = NodeGraph::new();
    let s1 = add(&mut g1, "source", serde_json::json!({"file": "a.exr"}), vec![]);
    let b1 = add(&mut g1, "blur", serde_json::json!({"size": 4.0}), vec![Some(s1)]);

    let mut g2 = NodeGraph::new();
    let s2 = add(&mut g2, "source", serde_json::json!({"file": "b.exr"}), vec![]);
    let b2 = add(&mut g2, "blur", serde_json::json!({"size": 4.0}), vec![Some(s2)]);

    // Same blur parameters, different upstream configuration.
    assert_ne!(g1.node_hash(b1), g2.node_hash(b2));
}

#[test]
fn disconnected_input_hashes_differently_from_connected() {
    let mut g = NodeGraph::new();
    let src = add(&mut g, "source", serde_json::json!({}), vec![]);
    let with_input = add(&mut g, "blur", serde_json::json!({}), vec![Some(src)]);
    let without = add(&mut g, "blur", serde_json::json!({}), vec![None]);
    assert_ne!(g.node_hash(with_input), g.node_hash(without));
}

#[test]
fn attach_subtree_records_host_and_bottom() {
    let mut g = NodeGraph::new();
    let bottom = add(&mut g, "bg", serde_json::json!({}), vec![]);
    let stroke = add(&mut g, "stroke", serde_json::json!({}), vec![Some(bottom)]);
    let host = add(&mut g, "rotopaint", serde_json::json!({}), vec![Some(stroke)]);
    g.attach_subtree(host, bottom, &[stroke]);
    assert_eq!(g.subtree_host(stroke), Some(host));
    assert_eq!(g.subtree_bottom(host), Some(bottom));
    assert_eq!(g.subtree_host(host), None);
}
