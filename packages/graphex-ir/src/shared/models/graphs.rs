//! Graph containers.
//!
//! All graphs are petgraph `StableDiGraph`s (arena-of-nodes by integer
//! index; stable across the region drops the CDG builder performs).
//! Edge endpoints must already be graph members — petgraph enforces
//! this, and a violation is a builder defect, never an input error.

use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::FxHashMap;

use super::edge::{CdgEdge, CfgEdge, DdgEdge};
use super::node::{CdNode, CfNode, DdNode};

/// Node identity within one graph
pub type NodeId = petgraph::stable_graph::NodeIndex;

/// Per-file control-flow graph with one entry per procedure
#[derive(Debug, Clone)]
pub struct Cfg {
    pub file: String,
    pub package: String,
    pub graph: StableDiGraph<CfNode, CfgEdge>,
    /// Ordered procedure entries; always a subset of the vertex set
    pub entries: Vec<NodeId>,
    /// Tree position (statement start byte) → node, for cross-graph identity
    pub node_by_pos: FxHashMap<usize, NodeId>,
}

impl Cfg {
    pub fn new(file: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            package: package.into(),
            graph: StableDiGraph::new(),
            entries: Vec::new(),
            node_by_pos: FxHashMap::default(),
        }
    }

    /// Successors of `n`, in edge insertion order
    pub fn successors(&self, n: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = self
            .graph
            .edges_directed(n, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        out.reverse(); // petgraph iterates newest-first
        out
    }

    /// All nodes reachable from `start` (including it), in DFS visit order
    pub fn reachable_from(&self, start: NodeId) -> Vec<NodeId> {
        reachable(&self.graph, start)
    }

    /// Out-degree-zero nodes of the procedure rooted at `entry`
    pub fn exits_of(&self, entry: NodeId) -> Vec<NodeId> {
        self.reachable_from(entry)
            .into_iter()
            .filter(|&n| {
                self.graph
                    .edges_directed(n, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect()
    }
}

fn reachable<N, E>(graph: &StableDiGraph<N, E>, start: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut seen = rustc_hash::FxHashSet::default();
    let mut stack = vec![start];
    while let Some(n) = stack.pop() {
        if !seen.insert(n) {
            continue;
        }
        order.push(n);
        // edges_directed iterates newest-first; pushing as-is makes the
        // stack pop oldest-first, i.e. edge insertion order
        for e in graph.edges_directed(n, Direction::Outgoing) {
            stack.push(e.target());
        }
    }
    order
}

/// Per-file control-dependence graph
#[derive(Debug, Clone)]
pub struct Cdg {
    pub file: String,
    pub graph: StableDiGraph<CdNode, CdgEdge>,
}

impl Cdg {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            graph: StableDiGraph::new(),
        }
    }
}

/// Per-file data-dependence graph
#[derive(Debug, Clone)]
pub struct Ddg {
    pub file: String,
    pub package: String,
    pub graph: StableDiGraph<DdNode, DdgEdge>,
    /// Tree position → node; gives DDG nodes stable identity across
    /// fixed-point passes and joins them to their CFG counterparts
    pub node_by_pos: FxHashMap<usize, NodeId>,
}

impl Ddg {
    pub fn new(file: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            package: package.into(),
            graph: StableDiGraph::new(),
            node_by_pos: FxHashMap::default(),
        }
    }

    /// Fetch-or-create the node anchored at tree position `pos`.
    ///
    /// First pass creates, later passes mutate in place.
    pub fn node_at(&mut self, pos: usize, line: u32, code: &str) -> NodeId {
        if let Some(&id) = self.node_by_pos.get(&pos) {
            return id;
        }
        let id = self.graph.add_node(DdNode::new(line, code));
        self.node_by_pos.insert(pos, id);
        id
    }
}

/// Program dependence graph: a file's CDG and DDG, paired.
///
/// The two graphs share no vertices; joining goes through tree
/// positions.
#[derive(Debug, Clone)]
pub struct Pdg {
    pub file: String,
    pub cdg: Cdg,
    pub ddg: Ddg,
}

impl Pdg {
    pub fn new(cdg: Cdg, ddg: Ddg) -> Self {
        debug_assert_eq!(cdg.file, ddg.file);
        Self {
            file: cdg.file.clone(),
            cdg,
            ddg,
        }
    }
}

/// Interprocedural CFG: union of all per-file CFGs plus CALLS/RETURN edges
#[derive(Debug, Clone)]
pub struct Icfg {
    pub graph: StableDiGraph<CfNode, CfgEdge>,
    pub entries: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exits_are_out_degree_zero() {
        let mut cfg = Cfg::new("T.java", "");
        let a = cfg.graph.add_node(CfNode::new(1, "entry"));
        let b = cfg.graph.add_node(CfNode::new(2, "x = 1;"));
        let c = cfg.graph.add_node(CfNode::new(3, "return;"));
        cfg.graph.add_edge(a, b, CfgEdge::Epsilon);
        cfg.graph.add_edge(b, c, CfgEdge::Epsilon);
        assert_eq!(cfg.exits_of(a), vec![c]);
    }

    #[test]
    fn test_reachable_stays_within_procedure() {
        let mut cfg = Cfg::new("T.java", "");
        let a = cfg.graph.add_node(CfNode::new(1, "entry a"));
        let b = cfg.graph.add_node(CfNode::new(5, "entry b"));
        let a1 = cfg.graph.add_node(CfNode::new(2, "x = 1;"));
        cfg.graph.add_edge(a, a1, CfgEdge::Epsilon);
        assert_eq!(cfg.reachable_from(a), vec![a, a1]);
        assert_eq!(cfg.reachable_from(b), vec![b]);
    }

    #[test]
    fn test_ddg_node_identity_is_stable() {
        let mut ddg = Ddg::new("T.java", "p");
        let first = ddg.node_at(10, 2, "x = 1;");
        let second = ddg.node_at(10, 2, "x = 1;");
        assert_eq!(first, second);
        assert_eq!(ddg.graph.node_count(), 1);
    }
}
