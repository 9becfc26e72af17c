//! Shared graph models
//!
//! One node type per graph family (CFG / CDG / DDG); the same source
//! statement may be represented by up to three distinct node objects,
//! one per graph. Cross-graph identity goes through tree-position maps,
//! never through native references.

pub mod edge;
pub mod graphs;
pub mod node;

pub use edge::{CdgEdge, CfgEdge, DdgEdge, DdgEdgeKind};
pub use graphs::{Cdg, Cfg, Ddg, Icfg, NodeId, Pdg};
pub use node::{
    CallTarget, CdNode, CdNodeKind, CfLink, CfNode, DdNode, EntryInfo, MethodKey, RegionKind,
};
