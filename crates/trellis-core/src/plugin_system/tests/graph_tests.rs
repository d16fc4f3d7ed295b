#![cfg(test)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::plugin_system::descriptor::{PluginDescriptor, PluginId};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::graph::{PluginGraph, PluginState};

fn descriptor(id: &str, requires: &[&str]) -> PluginDescriptor {
    requires
        .iter()
        .fold(PluginDescriptor::builder(id).name(id), |builder, dep| builder.requires(*dep))
        .build()
}

fn sorted_edges(graph: &PluginGraph) -> Vec<(String, String)> {
    let mut edges: Vec<(String, String)> = graph
        .edges()
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
    edges.sort();
    edges
}

#[test]
fn test_dependency_registered_later_resolves_earlier_node() {
    let mut graph = PluginGraph::new();
    graph.add_node(descriptor("core-metrics", &["core-logging"])).unwrap();

    let metrics = graph.get_node("core-metrics").unwrap();
    assert_eq!(metrics.state(), PluginState::Unresolved);
    assert_eq!(metrics.missing_dependencies().len(), 1);
    assert!(graph.edges().is_empty());

    graph.add_node(descriptor("core-logging", &[])).unwrap();

    let metrics = graph.get_node("core-metrics").unwrap();
    assert_eq!(metrics.state(), PluginState::Resolvable);
    assert!(metrics.missing_dependencies().is_empty());
    assert_eq!(graph.predecessors("core-metrics"), vec![PluginId::from("core-logging")]);
    assert_eq!(graph.successors("core-logging"), vec![PluginId::from("core-metrics")]);
}

#[test]
fn test_optional_dependencies_never_block() {
    let mut graph = PluginGraph::new();
    let audit = PluginDescriptor::builder("audit")
        .name("Audit")
        .optionally_requires("core-metrics")
        .build();
    graph.add_node(audit).unwrap();

    assert_eq!(graph.get_node("audit").unwrap().state(), PluginState::Resolvable);
    graph.add_node(descriptor("core-metrics", &[])).unwrap();
    assert!(graph.edges().is_empty());
}

#[test]
fn test_duplicate_registration_leaves_graph_unchanged() {
    let mut graph = PluginGraph::new();
    graph.add_node(descriptor("core-logging", &[])).unwrap();
    graph.add_node(descriptor("core-metrics", &["core-logging"])).unwrap();
    let before = sorted_edges(&graph);

    let err = graph
        .add_node(descriptor("core-logging", &["core-metrics"]))
        .unwrap_err();
    assert!(matches!(err, PluginSystemError::DuplicateRegistration { ref plugin_id } if plugin_id == "core-logging"));

    assert_eq!(graph.len(), 2);
    assert_eq!(sorted_edges(&graph), before);
    assert!(graph.get_node("core-logging").unwrap().descriptor().dependencies().is_empty());
}

#[test]
fn test_resolution_is_order_independent() {
    let specs: Vec<(&str, Vec<&str>)> = vec![
        ("a", vec![]),
        ("b", vec!["a"]),
        ("c", vec!["a", "b"]),
        ("d", vec!["c", "missing"]),
        ("e", vec!["b"]),
    ];

    let mut reference = PluginGraph::new();
    for (id, deps) in &specs {
        reference.add_node(descriptor(id, deps)).unwrap();
    }
    let expected = sorted_edges(&reference);
    assert_eq!(expected.len(), 5);

    let mut rng = StdRng::seed_from_u64(0x7e11);
    for _ in 0..20 {
        let mut shuffled = specs.clone();
        shuffled.shuffle(&mut rng);

        let mut graph = PluginGraph::new();
        for (id, deps) in &shuffled {
            graph.add_node(descriptor(id, deps)).unwrap();
        }

        assert_eq!(sorted_edges(&graph), expected);
        for (id, _) in &specs {
            assert_eq!(
                graph.get_node(id).unwrap().state(),
                reference.get_node(id).unwrap().state(),
                "state of {} differs",
                id
            );
        }
        assert_eq!(graph.get_node("d").unwrap().state(), PluginState::Unresolved);
    }
}

#[test]
fn test_resolve_pass_is_idempotent() {
    let mut graph = PluginGraph::new();
    graph.add_node(descriptor("b", &["a"])).unwrap();
    graph.add_node(descriptor("a", &[])).unwrap();

    assert_eq!(graph.resolve_missing_dependencies(), 0);
    assert_eq!(graph.edges().len(), 1);
}

#[test]
fn test_cycle_detection() {
    let mut graph = PluginGraph::new();
    graph.add_node(descriptor("a", &["b"])).unwrap();
    graph.add_node(descriptor("b", &["a"])).unwrap();
    graph.add_node(descriptor("c", &["a"])).unwrap();

    assert!(graph.has_cycle());
    assert!(graph.is_on_cycle("a"));
    assert!(graph.is_on_cycle("b"));
    assert!(!graph.is_on_cycle("c"));
    assert!(!graph.is_on_cycle("unknown"));
}

#[test]
fn test_ids_keep_registration_order() {
    let mut graph = PluginGraph::new();
    for id in ["z", "a", "m"] {
        graph.add_node(descriptor(id, &[])).unwrap();
    }
    let ids: Vec<String> = graph.ids().iter().map(ToString::to_string).collect();
    assert_eq!(ids, vec!["z", "a", "m"]);
    assert!(graph.contains("m"));
    assert!(!graph.contains("q"));
}
