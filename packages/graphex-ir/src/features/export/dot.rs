//! GraphViz DOT rendering.

use std::fmt::Write;

use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use crate::shared::models::{Cdg, Cfg, CfgEdge, Ddg, Icfg};

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn cfg_to_dot(cfg: &Cfg) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph cfg {{");
    let _ = writeln!(out, "  // {}", cfg.file);
    for n in cfg.graph.node_indices() {
        let node = &cfg.graph[n];
        let label = node.normalized.as_deref().unwrap_or(&node.code);
        let _ = writeln!(
            out,
            "  n{} [label=\"{}: {}\"];",
            n.index(),
            node.line,
            escape(label)
        );
    }
    for e in cfg.graph.edge_references() {
        let _ = match e.weight() {
            CfgEdge::Epsilon => writeln!(
                out,
                "  n{} -> n{};",
                e.source().index(),
                e.target().index()
            ),
            kind => writeln!(
                out,
                "  n{} -> n{} [label=\"{}\"];",
                e.source().index(),
                e.target().index(),
                kind.as_str()
            ),
        };
    }
    let _ = writeln!(out, "}}");
    out
}

pub fn cdg_to_dot(cdg: &Cdg) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph cdg {{");
    let _ = writeln!(out, "  // {}", cdg.file);
    for n in cdg.graph.node_indices() {
        let node = &cdg.graph[n];
        let shape = if node.is_region() { "box" } else { "ellipse" };
        let _ = writeln!(
            out,
            "  n{} [label=\"{}\" shape={}];",
            n.index(),
            escape(&node.code),
            shape
        );
    }
    for e in cdg.graph.edge_references() {
        let _ = writeln!(
            out,
            "  n{} -> n{} [label=\"{}\"];",
            e.source().index(),
            e.target().index(),
            e.weight().as_str()
        );
    }
    let _ = writeln!(out, "}}");
    out
}

pub fn ddg_to_dot(ddg: &Ddg) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph ddg {{");
    let _ = writeln!(out, "  // {}", ddg.file);
    for n in ddg.graph.node_indices() {
        let node = &ddg.graph[n];
        let _ = writeln!(
            out,
            "  n{} [label=\"{}: {}\"];",
            n.index(),
            node.line,
            escape(&node.code)
        );
    }
    for e in ddg.graph.edge_references() {
        let _ = writeln!(
            out,
            "  n{} -> n{} [label=\"{} ({})\"];",
            e.source().index(),
            e.target().index(),
            e.weight().kind.as_str(),
            escape(&e.weight().var)
        );
    }
    let _ = writeln!(out, "}}");
    out
}

pub fn icfg_to_dot(icfg: &Icfg) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph icfg {{");
    for n in icfg.graph.node_indices() {
        let node = &icfg.graph[n];
        let _ = writeln!(
            out,
            "  n{} [label=\"{}: {}\"];",
            n.index(),
            node.line,
            escape(&node.code)
        );
    }
    for e in icfg.graph.edge_references() {
        let _ = match e.weight() {
            CfgEdge::Epsilon => writeln!(
                out,
                "  n{} -> n{};",
                e.source().index(),
                e.target().index()
            ),
            kind => writeln!(
                out,
                "  n{} -> n{} [label=\"{}\"];",
                e.source().index(),
                e.target().index(),
                kind.as_str()
            ),
        };
    }
    let _ = writeln!(out, "}}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::CfgBuilder;
    use crate::features::parsing::JavaParser;

    #[test]
    fn test_cfg_dot_contains_nodes_and_labels() {
        let mut parser = JavaParser::new().unwrap();
        let file = parser
            .parse_source(
                "T.java",
                "class A { void m(int x) { if (x > 0) { x = 1; } } }".to_string(),
            )
            .unwrap();
        let cfg = CfgBuilder::build(&file);
        let dot = cfg_to_dot(&cfg);
        assert!(dot.starts_with("digraph cfg {"));
        assert!(dot.contains("if (x > 0)"));
        assert!(dot.contains("[label=\"TRUE\"]"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_escaping_quotes() {
        let mut parser = JavaParser::new().unwrap();
        let file = parser
            .parse_source(
                "T.java",
                "class A { void m() { String s = \"quoted\"; } }".to_string(),
            )
            .unwrap();
        let cfg = CfgBuilder::build(&file);
        let dot = cfg_to_dot(&cfg);
        assert!(dot.contains("\\\"quoted\\\""));
    }
}
