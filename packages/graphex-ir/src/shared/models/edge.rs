//! Typed edge labels for the three graph families.

use serde::{Deserialize, Serialize};

/// CFG edge label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CfgEdge {
    Epsilon,
    True,
    False,
    Throws,
    /// Call-site to callee entry; produced only by the ICFG linker
    Calls,
    /// Callee exit back to call-site; produced only by the ICFG linker
    Return,
}

impl CfgEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            CfgEdge::Epsilon => "EPSILON",
            CfgEdge::True => "TRUE",
            CfgEdge::False => "FALSE",
            CfgEdge::Throws => "THROWS",
            CfgEdge::Calls => "CALLS",
            CfgEdge::Return => "RETURN",
        }
    }
}

/// CDG edge label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CdgEdge {
    Epsilon,
    True,
    False,
    Throws,
    /// Merge out of a try-region: the successor runs only if nothing threw
    NotThrows,
}

impl CdgEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            CdgEdge::Epsilon => "EPSILON",
            CdgEdge::True => "TRUE",
            CdgEdge::False => "FALSE",
            CdgEdge::Throws => "THROWS",
            CdgEdge::NotThrows => "NOT_THROWS",
        }
    }
}

/// DDG edge kind
///
/// Builders currently emit `Flow` only; `Anti` and `Output` are part of
/// the label space consumed by downstream tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DdgEdgeKind {
    Flow,
    Anti,
    Output,
}

impl DdgEdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DdgEdgeKind::Flow => "FLOW",
            DdgEdgeKind::Anti => "ANTI",
            DdgEdgeKind::Output => "OUTPUT",
        }
    }
}

/// DDG edge label: kind plus the variable that flows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DdgEdge {
    pub kind: DdgEdgeKind,
    pub var: String,
}

impl DdgEdge {
    pub fn flow(var: impl Into<String>) -> Self {
        Self {
            kind: DdgEdgeKind::Flow,
            var: var.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_labels() {
        assert_eq!(CfgEdge::Epsilon.as_str(), "EPSILON");
        assert_eq!(CdgEdge::NotThrows.as_str(), "NOT_THROWS");
        assert_eq!(DdgEdge::flow("x").kind.as_str(), "FLOW");
    }
}
