//! Control-flow graph construction and path traversal.

pub mod cfg_builder;
pub mod traversal;

pub use cfg_builder::CfgBuilder;
pub use traversal::CfPathTraversal;
