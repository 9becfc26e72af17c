//! Interprocedural CFG: call-site resolution and CALLS/RETURN linking.

pub mod linker;
pub mod type_tracker;

pub use linker::link_cfgs;
pub use type_tracker::TypeTracker;
