//! Control-dependence graph construction.

pub mod cdg_builder;

pub use cdg_builder::CdgBuilder;
