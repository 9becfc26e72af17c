//! Restartable depth-first path enumeration over one CFG.
//!
//! Lazy and non-deduplicating: each visit expands the current node's
//! outgoing edges into pending alternatives. `prune` discards only the
//! alternatives introduced by the most recent visit — sibling
//! alternatives queued earlier survive, so abandoning one path never
//! abandons the others. Callers deduplicate revisits themselves.

use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::shared::models::{CfNode, CfgEdge, NodeId};

pub struct CfPathTraversal<'g> {
    graph: &'g StableDiGraph<CfNode, CfgEdge>,
    stack: Vec<NodeId>,
    last_pushed: usize,
}

impl<'g> CfPathTraversal<'g> {
    pub fn new(graph: &'g StableDiGraph<CfNode, CfgEdge>, start: NodeId) -> Self {
        Self {
            graph,
            stack: vec![start],
            last_pushed: 0,
        }
    }

    /// Forget all pending alternatives and begin again from `start`
    pub fn restart(&mut self, start: NodeId) {
        self.stack.clear();
        self.stack.push(start);
        self.last_pushed = 0;
    }

    /// Next node on some path, expanding its successors as alternatives.
    /// CALLS/RETURN edges are interprocedural and never followed here.
    pub fn next(&mut self) -> Option<NodeId> {
        let n = self.stack.pop()?;
        let before = self.stack.len();
        for e in self.graph.edges_directed(n, Direction::Outgoing) {
            if matches!(e.weight(), CfgEdge::Calls | CfgEdge::Return) {
                continue;
            }
            self.stack.push(e.target());
        }
        self.last_pushed = self.stack.len() - before;
        Some(n)
    }

    /// Discard the alternatives the most recent `next` introduced
    pub fn prune(&mut self) {
        for _ in 0..self.last_pushed {
            self.stack.pop();
        }
        self.last_pushed = 0;
    }

    pub fn has_pending(&self) -> bool {
        !self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (StableDiGraph<CfNode, CfgEdge>, Vec<NodeId>) {
        // a → b → d, a → c → d
        let mut g = StableDiGraph::new();
        let a = g.add_node(CfNode::new(1, "a"));
        let b = g.add_node(CfNode::new(2, "b"));
        let c = g.add_node(CfNode::new(3, "c"));
        let d = g.add_node(CfNode::new(4, "d"));
        g.add_edge(a, b, CfgEdge::True);
        g.add_edge(a, c, CfgEdge::False);
        g.add_edge(b, d, CfgEdge::Epsilon);
        g.add_edge(c, d, CfgEdge::Epsilon);
        (g, vec![a, b, c, d])
    }

    #[test]
    fn test_enumerates_all_paths_without_dedup() {
        let (g, n) = diamond();
        let mut trav = CfPathTraversal::new(&g, n[0]);
        let mut visited = Vec::new();
        while let Some(m) = trav.next() {
            visited.push(m);
        }
        // d is reached twice, once per path
        assert_eq!(visited.iter().filter(|&&m| m == n[3]).count(), 2);
        assert_eq!(visited[0], n[0]);
    }

    #[test]
    fn test_prune_discards_only_latest_alternatives() {
        let (g, n) = diamond();
        let mut trav = CfPathTraversal::new(&g, n[0]);
        assert_eq!(trav.next(), Some(n[0])); // expands b and c
        let first_branch = trav.next().unwrap(); // one of b/c
        trav.prune(); // drop d introduced via that branch
        let second_branch = trav.next().unwrap(); // the sibling survives
        assert_ne!(first_branch, second_branch);
        assert!(matches!(second_branch, m if m == n[1] || m == n[2]));
    }

    #[test]
    fn test_restart() {
        let (g, n) = diamond();
        let mut trav = CfPathTraversal::new(&g, n[0]);
        while trav.next().is_some() {}
        assert!(!trav.has_pending());
        trav.restart(n[1]);
        assert_eq!(trav.next(), Some(n[1]));
        assert_eq!(trav.next(), Some(n[3]));
    }
}
