//! Vertical feature slices (parsing → declarations → flow_graph →
//! control_dep → data_flow → icfg → export)

pub mod control_dep;
pub mod data_flow;
pub mod declarations;
pub mod export;
pub mod flow_graph;
pub mod icfg;
pub mod parsing;
