//! JSON rendering through flat DTOs.
//!
//! petgraph graphs don't serialize into a readable shape on their own,
//! so each graph is flattened to `{file, kind, nodes, edges}` with node
//! ids equal to the node's index in the underlying graph.

use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::errors::Result;
use crate::shared::models::{Cdg, Cfg, CfgEdge, Ddg, Icfg};

#[derive(Debug, Serialize)]
pub struct GraphDto {
    pub file: String,
    pub kind: &'static str,
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize)]
pub struct NodeDto {
    pub id: usize,
    pub line: u32,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defs: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_flows: Option<BTreeSet<String>>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDto {
    pub from: usize,
    pub to: usize,
    pub label: String,
}

impl NodeDto {
    fn plain(id: usize, line: u32, code: &str, normalized: Option<&str>) -> Self {
        Self {
            id,
            line,
            code: code.to_string(),
            normalized: normalized.map(str::to_string),
            defs: None,
            uses: None,
            self_flows: None,
        }
    }
}

fn cf_dto(file: &str, kind: &'static str, graph: &petgraph::stable_graph::StableDiGraph<crate::shared::models::CfNode, CfgEdge>) -> GraphDto {
    let nodes = graph
        .node_indices()
        .map(|n| {
            let node = &graph[n];
            NodeDto::plain(n.index(), node.line, &node.code, node.normalized.as_deref())
        })
        .collect();
    let edges = graph
        .edge_references()
        .map(|e| EdgeDto {
            from: e.source().index(),
            to: e.target().index(),
            label: e.weight().as_str().to_string(),
        })
        .collect();
    GraphDto {
        file: file.to_string(),
        kind,
        nodes,
        edges,
    }
}

pub fn cfg_to_json(cfg: &Cfg) -> Result<String> {
    Ok(serde_json::to_string_pretty(&cf_dto(
        &cfg.file, "cfg", &cfg.graph,
    ))?)
}

pub fn icfg_to_json(icfg: &Icfg) -> Result<String> {
    Ok(serde_json::to_string_pretty(&cf_dto(
        "", "icfg", &icfg.graph,
    ))?)
}

pub fn cdg_to_json(cdg: &Cdg) -> Result<String> {
    let nodes = cdg
        .graph
        .node_indices()
        .map(|n| {
            let node = &cdg.graph[n];
            NodeDto::plain(n.index(), node.line, &node.code, None)
        })
        .collect();
    let edges = cdg
        .graph
        .edge_references()
        .map(|e| EdgeDto {
            from: e.source().index(),
            to: e.target().index(),
            label: e.weight().as_str().to_string(),
        })
        .collect();
    let dto = GraphDto {
        file: cdg.file.clone(),
        kind: "cdg",
        nodes,
        edges,
    };
    Ok(serde_json::to_string_pretty(&dto)?)
}

pub fn ddg_to_json(ddg: &Ddg) -> Result<String> {
    let nodes = ddg
        .graph
        .node_indices()
        .map(|n| {
            let node = &ddg.graph[n];
            NodeDto {
                id: n.index(),
                line: node.line,
                code: node.code.clone(),
                normalized: None,
                defs: Some(node.defs.clone()),
                uses: Some(node.uses.clone()),
                self_flows: Some(node.self_flows.clone()),
            }
        })
        .collect();
    let edges = ddg
        .graph
        .edge_references()
        .map(|e| EdgeDto {
            from: e.source().index(),
            to: e.target().index(),
            label: format!("{} ({})", e.weight().kind.as_str(), e.weight().var),
        })
        .collect();
    let dto = GraphDto {
        file: ddg.file.clone(),
        kind: "ddg",
        nodes,
        edges,
    };
    Ok(serde_json::to_string_pretty(&dto)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::CfgBuilder;
    use crate::features::parsing::JavaParser;

    fn cfg_of(source: &str) -> Cfg {
        let mut parser = JavaParser::new().unwrap();
        let file = parser.parse_source("T.java", source.to_string()).unwrap();
        CfgBuilder::build(&file)
    }

    #[test]
    fn test_cfg_json_round_trips_through_serde_value() {
        let cfg = cfg_of("class A { void m() { int x = 0; x = x + 1; } }");
        let json = cfg_to_json(&cfg).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "cfg");
        assert_eq!(value["file"], "T.java");
        assert_eq!(
            value["nodes"].as_array().unwrap().len(),
            cfg.graph.node_count()
        );
        assert_eq!(
            value["edges"].as_array().unwrap().len(),
            cfg.graph.edge_count()
        );
    }

    #[test]
    fn test_cfg_json_edge_labels() {
        let cfg = cfg_of("class A { void m(int x) { if (x > 0) { x = 1; } } }");
        let json = cfg_to_json(&cfg).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let labels: Vec<&str> = value["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["label"].as_str().unwrap())
            .collect();
        assert!(labels.contains(&"TRUE"));
        assert!(labels.contains(&"FALSE"));
    }

    #[test]
    fn test_ddg_json_carries_def_use_sets() {
        use crate::features::data_flow::DefUseAnalyzer;
        use crate::features::declarations::DeclarationIndex;

        let mut parser = JavaParser::new().unwrap();
        let file = parser
            .parse_source(
                "T.java",
                "class A { void m() { int x = 1; int y = x; } }".to_string(),
            )
            .unwrap();
        let files = vec![file];
        let index = DeclarationIndex::build(&files);
        let mut analyzer = DefUseAnalyzer::new(&index);
        let ddgs = analyzer.annotate(&files);
        let json = ddg_to_json(&ddgs[0]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let nodes = value["nodes"].as_array().unwrap();
        let decl = nodes
            .iter()
            .find(|n| n["code"] == "int y = x;")
            .expect("declaration node serialized");
        assert!(decl["defs"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("y")));
        assert!(decl["uses"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("x")));
    }
}
