//! Data-dependence graph construction: whole-program DEF/USE
//! annotation to a fixed point, then CFG-path flow-edge derivation.

pub mod def_use;
pub mod flow_edges;

pub use def_use::DefUseAnalyzer;
pub use flow_edges::derive_flow_edges;
