/*
 * Graphex IR - Program-representation graph extraction for Java
 *
 * Feature-First layout:
 * - shared/    : Graph containers, node and edge models
 * - features/  : Vertical slices (parsing → declarations → flow_graph
 *                → control_dep → data_flow → icfg → export)
 * - usecases/  : End-to-end extraction over whole source sets
 *
 * Graphs produced per file: CFG, CDG, DDG (paired into a PDG).
 * Across files: one ICFG with CALLS/RETURN edges.
 */

pub mod errors;
pub mod features;
pub mod shared;
pub mod usecases;

pub use errors::{GraphexError, Result};
pub use features::control_dep::CdgBuilder;
pub use features::data_flow::{derive_flow_edges, DefUseAnalyzer};
pub use features::declarations::DeclarationIndex;
pub use features::flow_graph::CfgBuilder;
pub use features::icfg::{link_cfgs, TypeTracker};
pub use features::parsing::{JavaParser, SourceFile};
pub use shared::models::{Cdg, Cfg, Ddg, Icfg, NodeId, Pdg};
pub use usecases::{discover_sources, GraphExtractor, ProgramGraphs};
