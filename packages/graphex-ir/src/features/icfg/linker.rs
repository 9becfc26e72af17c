//! CALLS/RETURN linking across per-file CFGs.
//!
//! Unions all per-file graphs into one (node weights are moved, not
//! copied), indexes procedure entries by method key, then visits every
//! node once: each resolved call site gets one CALLS edge to the callee
//! entry and one RETURN edge from each callee exit back to the call
//! site. Exits are computed before any RETURN edge exists, so linking
//! order cannot change what counts as an exit.

use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::shared::models::{CallTarget, CfgEdge, CfNode, Cfg, Icfg, MethodKey, NodeId};

pub fn link_cfgs(cfgs: Vec<Cfg>) -> Icfg {
    let mut graph: StableDiGraph<CfNode, CfgEdge> = StableDiGraph::new();
    let mut entries: Vec<NodeId> = Vec::new();
    let mut by_key: FxHashMap<MethodKey, NodeId> = FxHashMap::default();

    for mut cfg in cfgs {
        let package = cfg.package.clone();
        let edges: Vec<(NodeId, NodeId, CfgEdge)> = cfg
            .graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
            .collect();
        let old_ids: Vec<NodeId> = cfg.graph.node_indices().collect();
        let mut remap: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        for old in old_ids {
            if let Some(weight) = cfg.graph.remove_node(old) {
                remap.insert(old, graph.add_node(weight));
            }
        }
        for (source, target, weight) in edges {
            if let (Some(&s), Some(&t)) = (remap.get(&source), remap.get(&target)) {
                graph.add_edge(s, t, weight);
            }
        }
        for old_entry in &cfg.entries {
            let Some(&entry) = remap.get(old_entry) else {
                continue;
            };
            entries.push(entry);
            let node = &graph[entry];
            if let Some(info) = node.entry_info() {
                let key = MethodKey {
                    package: package.clone(),
                    class: info.class.clone(),
                    name: info.name.clone(),
                    line: node.line,
                };
                by_key.insert(key, entry);
            }
        }
    }

    // exits per callee, before any RETURN edge can disturb out-degrees
    let exits: FxHashMap<NodeId, Vec<NodeId>> = entries
        .iter()
        .map(|&entry| (entry, exits_of(&graph, entry)))
        .collect();

    let mut linked = 0usize;
    let nodes: Vec<NodeId> = graph.node_indices().collect();
    for node in nodes {
        let keys: Vec<MethodKey> = graph[node]
            .call_targets()
            .iter()
            .filter_map(|t| match t {
                CallTarget::Resolved(key) => Some(key.clone()),
                CallTarget::Unresolved => None,
            })
            .collect();
        for key in keys {
            let Some(&callee) = by_key.get(&key) else {
                continue;
            };
            if !has_edge(&graph, node, callee, CfgEdge::Calls) {
                graph.add_edge(node, callee, CfgEdge::Calls);
                linked += 1;
            }
            for &exit in exits.get(&callee).map(Vec::as_slice).unwrap_or(&[]) {
                if !has_edge(&graph, exit, node, CfgEdge::Return) {
                    graph.add_edge(exit, node, CfgEdge::Return);
                }
            }
        }
    }
    debug!(
        nodes = graph.node_count(),
        call_sites = linked,
        "linked interprocedural graph"
    );

    Icfg { graph, entries }
}

/// Out-degree-zero nodes of the procedure rooted at `entry`
fn exits_of(graph: &StableDiGraph<CfNode, CfgEdge>, entry: NodeId) -> Vec<NodeId> {
    let mut exits = Vec::new();
    let mut seen = FxHashSet::default();
    let mut stack = vec![entry];
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        let mut any = false;
        for e in graph.edges_directed(n, Direction::Outgoing) {
            any = true;
            stack.push(e.target());
        }
        if !any {
            exits.push(n);
        }
    }
    exits
}

fn has_edge(
    graph: &StableDiGraph<CfNode, CfgEdge>,
    from: NodeId,
    to: NodeId,
    kind: CfgEdge,
) -> bool {
    graph
        .edges_directed(from, Direction::Outgoing)
        .any(|e| e.target() == to && *e.weight() == kind)
}
