//! Per-graph node types.
//!
//! Every node carries the statically-known fields (line, verbatim code,
//! optional normalized text) directly; the few cross-graph linking keys
//! live in one explicit sum-type slot instead of a generic property bag.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::graphs::NodeId;

/// Join key between call sites and declared methods.
///
/// Unique per declared method: the declaration line disambiguates
/// overloads within the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodKey {
    pub package: String,
    pub class: String,
    pub name: String,
    pub line: u32,
}

/// Procedure entry metadata carried by CFG entry nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    /// Declaring type (simple name)
    pub class: String,
    /// Member name; constructors use the type name, static initializers "<clinit>"
    pub name: String,
    /// None for constructors and static initializers
    pub return_type: Option<String>,
    /// Declared parameter names, in order
    pub params: Vec<String>,
}

/// Outcome of best-effort call resolution for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallTarget {
    Resolved(MethodKey),
    Unresolved,
}

/// The one sum-type linking slot of a CFG node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfLink {
    None,
    /// This node is a procedure entry
    Entry(Box<EntryInfo>),
    /// This node contains one or more call sites
    Calls(Vec<CallTarget>),
}

/// Control-flow graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfNode {
    pub line: u32,
    /// Verbatim (or synthesized, for headers and markers) source text
    pub code: String,
    /// Whitespace-normalized text, when it differs from `code`
    pub normalized: Option<String>,
    /// Paired node in the same file's DDG, when one exists
    pub pd: Option<NodeId>,
    pub link: CfLink,
}

impl CfNode {
    pub fn new(line: u32, code: impl Into<String>) -> Self {
        let code = code.into();
        let normalized = normalize(&code);
        Self {
            line,
            code,
            normalized,
            pd: None,
            link: CfLink::None,
        }
    }

    /// Resolved and unresolved call sites inside this node
    pub fn call_targets(&self) -> &[CallTarget] {
        match &self.link {
            CfLink::Calls(targets) => targets,
            _ => &[],
        }
    }

    pub fn entry_info(&self) -> Option<&EntryInfo> {
        match &self.link {
            CfLink::Entry(info) => Some(info),
            _ => None,
        }
    }
}

/// Region kinds of the control-dependence graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    Entry,
    Then,
    Else,
    Loop,
    Switch,
    Try,
    Catch,
    /// Lazy merge region for non-local control transfers
    Follow,
}

impl RegionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Entry => "ENTRY",
            RegionKind::Then => "THEN",
            RegionKind::Else => "ELSE",
            RegionKind::Loop => "LOOP",
            RegionKind::Switch => "SWITCH",
            RegionKind::Try => "TRY",
            RegionKind::Catch => "CATCH",
            RegionKind::Follow => "FOLLOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CdNodeKind {
    Statement,
    Region(RegionKind),
}

/// Control-dependence graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdNode {
    pub line: u32,
    pub code: String,
    pub kind: CdNodeKind,
}

impl CdNode {
    pub fn statement(line: u32, code: impl Into<String>) -> Self {
        Self {
            line,
            code: code.into(),
            kind: CdNodeKind::Statement,
        }
    }

    pub fn region(line: u32, kind: RegionKind) -> Self {
        Self {
            line,
            code: kind.as_str().to_string(),
            kind: CdNodeKind::Region(kind),
        }
    }

    pub fn is_region(&self) -> bool {
        matches!(self.kind, CdNodeKind::Region(_))
    }
}

/// Data-dependence graph node
///
/// DEF/USE/self-flow sets grow monotonically during the fixed-point
/// phase and are frozen afterward. BTreeSet keeps iteration (and thus
/// all derived output) deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdNode {
    pub line: u32,
    pub code: String,
    pub defs: BTreeSet<String>,
    pub uses: BTreeSet<String>,
    pub self_flows: BTreeSet<String>,
}

impl DdNode {
    pub fn new(line: u32, code: impl Into<String>) -> Self {
        Self {
            line,
            code: code.into(),
            defs: BTreeSet::new(),
            uses: BTreeSet::new(),
            self_flows: BTreeSet::new(),
        }
    }
}

/// Collapse all whitespace runs to single spaces
pub fn normalize(code: &str) -> Option<String> {
    let collapsed = code.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed == code {
        None
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("if  (x >\n 1)"), Some("if (x > 1)".to_string()));
        assert_eq!(normalize("x = 1;"), None);
    }

    #[test]
    fn test_call_targets_empty_without_link() {
        let node = CfNode::new(3, "x = 1;");
        assert!(node.call_targets().is_empty());
        assert!(node.entry_info().is_none());
    }
}
