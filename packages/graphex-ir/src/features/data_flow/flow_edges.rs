//! Flow-edge derivation over converged DEF/USE sets.
//!
//! Joins each file's DDG to its CFG through the shared tree-position
//! map, then walks every CFG path forward from every defining node:
//! a use of the defined variable emits a FLOW edge, a redefinition
//! prunes that path. Node revisits within one traversal are pruned
//! too; their successors were already expanded the first time.

use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashSet;

use crate::features::flow_graph::CfPathTraversal;
use crate::shared::models::{Cfg, Ddg, DdgEdge, DdgEdgeKind, NodeId};

pub fn derive_flow_edges(cfg: &mut Cfg, ddg: &mut Ddg) {
    // pair CF nodes with their PD counterparts
    let pairs: Vec<(NodeId, NodeId)> = cfg
        .node_by_pos
        .iter()
        .filter_map(|(pos, &cf)| ddg.node_by_pos.get(pos).map(|&pd| (cf, pd)))
        .collect();
    for (cf, pd) in pairs {
        cfg.graph[cf].pd = Some(pd);
    }

    for entry in cfg.entries.clone() {
        for definer in cfg.reachable_from(entry) {
            let Some(pd_def) = cfg.graph[definer].pd else {
                continue;
            };
            let defs: Vec<String> = ddg.graph[pd_def].defs.iter().cloned().collect();
            if defs.is_empty() {
                continue;
            }
            let mut trav = CfPathTraversal::new(&cfg.graph, definer);
            for var in defs {
                trav.restart(definer);
                let _ = trav.next(); // the definer itself
                let mut visited = FxHashSet::default();
                while let Some(node) = trav.next() {
                    if node == definer || !visited.insert(node) {
                        trav.prune();
                        continue;
                    }
                    let Some(pd) = cfg.graph[node].pd else {
                        continue;
                    };
                    let (uses, redefines) = {
                        let w = &ddg.graph[pd];
                        (w.uses.contains(&var), w.defs.contains(&var))
                    };
                    // a statement like x = x + 1 reads before it writes
                    if uses && !has_flow(ddg, pd_def, pd, &var) {
                        ddg.graph.add_edge(pd_def, pd, DdgEdge::flow(var.as_str()));
                    }
                    if redefines {
                        trav.prune();
                    }
                }
            }
        }
    }

    // self-flows become direct self-loops
    let nodes: Vec<NodeId> = ddg.graph.node_indices().collect();
    for n in nodes {
        let flows: Vec<String> = ddg.graph[n].self_flows.iter().cloned().collect();
        for var in flows {
            if !has_flow(ddg, n, n, &var) {
                ddg.graph.add_edge(n, n, DdgEdge::flow(var.as_str()));
            }
        }
    }
}

fn has_flow(ddg: &Ddg, from: NodeId, to: NodeId, var: &str) -> bool {
    ddg.graph
        .edges_directed(from, Direction::Outgoing)
        .any(|e| {
            e.target() == to && e.weight().kind == DdgEdgeKind::Flow && e.weight().var == var
        })
}
