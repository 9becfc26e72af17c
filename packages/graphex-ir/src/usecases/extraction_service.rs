//! End-to-end graph extraction over a set of Java sources.
//!
//! Pipeline order is fixed by the data each stage needs:
//! parse → declaration index → per-file CFG + call annotation →
//! whole-program DEF/USE fixed point → flow-edge derivation →
//! per-file CDG → PDG pairing → interprocedural linking.
//!
//! A file that fails to parse is skipped with a warning; one broken
//! file never aborts the rest of the set.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::errors::Result;
use crate::features::control_dep::CdgBuilder;
use crate::features::data_flow::{derive_flow_edges, DefUseAnalyzer};
use crate::features::declarations::DeclarationIndex;
use crate::features::flow_graph::CfgBuilder;
use crate::features::icfg::{link_cfgs, TypeTracker};
use crate::features::parsing::{JavaParser, SourceFile};
use crate::shared::models::{Cfg, Icfg, Pdg};

/// Everything the pipeline produces for one source set
#[derive(Debug)]
pub struct ProgramGraphs {
    /// One PDG (CDG + DDG) per successfully parsed file
    pub pdgs: Vec<Pdg>,
    /// All per-file CFGs, after flow-node pairing
    pub cfgs: Vec<Cfg>,
    /// Union of the CFGs with CALLS/RETURN edges
    pub icfg: Icfg,
}

pub struct GraphExtractor {
    parser: JavaParser,
}

impl GraphExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: JavaParser::new()?,
        })
    }

    /// Parse every path, skipping files that fail with a warning
    pub fn parse_files(&mut self, paths: &[PathBuf]) -> Vec<SourceFile> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match self.parser.parse_file(path) {
                Ok(file) => files.push(file),
                Err(err) => warn!(path = %path.display(), %err, "skipping unparseable file"),
            }
        }
        files
    }

    /// Run the full pipeline over already-parsed sources
    pub fn extract(&self, files: &[SourceFile]) -> ProgramGraphs {
        let index = DeclarationIndex::build(files);
        let tracker = TypeTracker::new(&index);

        let mut cfgs: Vec<Cfg> = files
            .iter()
            .map(|file| {
                let mut cfg = CfgBuilder::build(file);
                tracker.annotate(file, &mut cfg);
                cfg
            })
            .collect();

        let mut analyzer = DefUseAnalyzer::new(&index);
        let mut ddgs = analyzer.annotate(files);
        for (cfg, ddg) in cfgs.iter_mut().zip(ddgs.iter_mut()) {
            derive_flow_edges(cfg, ddg);
        }

        let pdgs: Vec<Pdg> = files
            .iter()
            .map(CdgBuilder::build)
            .zip(ddgs)
            .map(|(cdg, ddg)| Pdg::new(cdg, ddg))
            .collect();

        let icfg = link_cfgs(cfgs.clone());
        debug!(
            files = files.len(),
            pdgs = pdgs.len(),
            "graph extraction complete"
        );

        ProgramGraphs { pdgs, cfgs, icfg }
    }

    /// Parse the given paths and run the full pipeline
    pub fn extract_all(&mut self, paths: &[PathBuf]) -> ProgramGraphs {
        let files = self.parse_files(paths);
        self.extract(&files)
    }
}

/// All `.java` files under `root`, sorted for deterministic output.
///
/// Unreadable directory entries are logged and skipped.
pub fn discover_sources(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "java"))
        .collect();
    paths.sort();
    paths
}
