//! Per-file control-dependence graph construction.
//!
//! Region-based, one pass per procedure. Every statement hangs off the
//! top of a control stack of region frames. Each frame also records its
//! negated dependency: the (node, edge-kind) pair a statement after a
//! non-local exit would actually depend on. Jumps queue that pair; the
//! next statement strictly shallower than the jump (the jump's frame
//! must already be popped, a sibling branch at the same depth does not
//! qualify) materializes a FOLLOW region fed by all queued pairs and
//! takes over as the current region. FOLLOW regions are therefore
//! created only when a jump makes one necessary.

use tree_sitter::Node;

use crate::features::parsing::syntax::{
    child_of_kind, children_of_kind, header_text, line_of, named_children, node_text,
};
use crate::features::parsing::SourceFile;
use crate::shared::models::{Cdg, CdgEdge, CdNode, CdNodeKind, NodeId, RegionKind};

struct Frame {
    /// Region new statements hang off with EPSILON
    region: NodeId,
    /// What a statement after a jump out of this frame depends on
    neg: Option<(NodeId, CdgEdge)>,
}

#[derive(Clone, Copy)]
struct JumpDep {
    anchor: NodeId,
    kind: CdgEdge,
    /// Control-stack depth at queue time
    depth: usize,
}

#[derive(Default)]
struct ProcState {
    frames: Vec<Frame>,
    jumps: Vec<JumpDep>,
}

impl ProcState {
    fn region(&self) -> NodeId {
        self.frames.last().map(|f| f.region).expect("empty control stack")
    }

    /// Innermost frame that knows its alternative path
    fn nearest_neg(&self) -> Option<(NodeId, CdgEdge)> {
        self.frames.iter().rev().find_map(|f| f.neg)
    }

    /// Nearest enclosing try region, for THROW merges
    fn nearest_try(&self) -> Option<NodeId> {
        self.frames.iter().rev().find_map(|f| match f.neg {
            Some((anchor, CdgEdge::NotThrows)) => Some(anchor),
            _ => None,
        })
    }
}

pub struct CdgBuilder<'s> {
    source: &'s str,
    cdg: Cdg,
}

impl<'s> CdgBuilder<'s> {
    /// Build the CDG of one parsed file
    pub fn build(file: &'s SourceFile) -> Cdg {
        let mut builder = CdgBuilder {
            source: &file.source,
            cdg: Cdg::new(file.file_name()),
        };
        for child in named_children(&file.root()) {
            builder.visit_type(child);
        }
        builder.drop_empty_regions();
        builder.cdg
    }

    fn visit_type(&mut self, node: Node) {
        if !matches!(
            node.kind(),
            "class_declaration" | "interface_declaration" | "enum_declaration"
        ) {
            return;
        }
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        self.visit_members(&body);
    }

    fn visit_members(&mut self, body: &Node) {
        for member in named_children(body) {
            match member.kind() {
                "method_declaration" | "constructor_declaration" => {
                    let block = member.child_by_field_name("body");
                    let signature = header_text(member, block, self.source);
                    self.build_procedure(member, signature, block);
                }
                "static_initializer" => {
                    let block = child_of_kind(&member, "block");
                    self.build_procedure(member, "static", block);
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    self.visit_type(member);
                }
                "enum_body_declarations" => self.visit_members(&member),
                _ => {}
            }
        }
    }

    fn build_procedure(&mut self, node: Node, signature: &str, body: Option<Node>) {
        let entry = self.cdg.graph.add_node(CdNode {
            line: line_of(node),
            code: signature.to_string(),
            kind: CdNodeKind::Region(RegionKind::Entry),
        });
        let mut st = ProcState::default();
        st.frames.push(Frame {
            region: entry,
            neg: None,
        });
        if let Some(body) = body {
            self.visit_block(&body, &mut st);
        }
    }

    // --- node plumbing ---

    fn add_statement(&mut self, st: &mut ProcState, line: u32, code: &str) -> NodeId {
        self.materialize_follows(st, line);
        let id = self.cdg.graph.add_node(CdNode::statement(line, code));
        self.cdg
            .graph
            .add_edge(st.region(), id, CdgEdge::Epsilon);
        id
    }

    fn add_region(&mut self, line: u32, kind: RegionKind) -> NodeId {
        self.cdg.graph.add_node(CdNode::region(line, kind))
    }

    /// Merge jumps whose frame has been popped into one FOLLOW region,
    /// which replaces the current region
    fn materialize_follows(&mut self, st: &mut ProcState, line: u32) {
        let depth = st.frames.len();
        let (due, kept): (Vec<JumpDep>, Vec<JumpDep>) =
            st.jumps.drain(..).partition(|j| j.depth > depth);
        st.jumps = kept;
        if due.is_empty() {
            return;
        }
        let follow = self.add_region(line, RegionKind::Follow);
        let mut seen: Vec<(NodeId, CdgEdge)> = Vec::new();
        for jump in due {
            let pair = (jump.anchor, jump.kind);
            if seen.contains(&pair) {
                continue;
            }
            seen.push(pair);
            self.cdg.graph.add_edge(jump.anchor, follow, jump.kind);
        }
        if let Some(frame) = st.frames.last_mut() {
            frame.region = follow;
        }
    }

    /// Regions that ended up governing nothing are noise; drop them
    /// until none remain (a drop can orphan a parent region)
    fn drop_empty_regions(&mut self) {
        loop {
            let empty: Vec<NodeId> = self
                .cdg
                .graph
                .node_indices()
                .filter(|&n| {
                    let node = &self.cdg.graph[n];
                    node.is_region()
                        && node.kind != CdNodeKind::Region(RegionKind::Entry)
                        && self
                            .cdg
                            .graph
                            .edges_directed(n, petgraph::Direction::Outgoing)
                            .next()
                            .is_none()
                })
                .collect();
            if empty.is_empty() {
                break;
            }
            for n in empty {
                self.cdg.graph.remove_node(n);
            }
        }
    }

    // --- statements ---

    fn visit_block(&mut self, block: &Node, st: &mut ProcState) {
        for stmt in named_children(block) {
            self.visit_stmt(stmt, st);
        }
    }

    fn visit_stmt(&mut self, node: Node, st: &mut ProcState) {
        match node.kind() {
            "block" | "constructor_body" => self.visit_block(&node, st),
            "expression_statement"
            | "local_variable_declaration"
            | "assert_statement"
            | "yield_statement"
            | "explicit_constructor_invocation" => {
                self.add_statement(st, line_of(node), node_text(node, self.source));
            }
            "if_statement" => self.visit_if(node, st),
            "while_statement" => self.visit_loop(node, "while", st),
            "do_statement" => self.visit_loop(node, "do-while", st),
            "for_statement" => self.visit_for(node, st),
            "enhanced_for_statement" => self.visit_enhanced_for(node, st),
            "switch_expression" => self.visit_switch(node, st),
            "labeled_statement" => {
                // labels do not change what a statement depends on
                if let Some(inner) = named_children(&node)
                    .into_iter()
                    .find(|c| c.kind() != "identifier")
                {
                    self.visit_stmt(inner, st);
                }
            }
            "break_statement" | "continue_statement" | "return_statement" => {
                self.add_statement(st, line_of(node), node_text(node, self.source));
                let dep = st.nearest_neg();
                self.queue_jump(st, dep);
            }
            "throw_statement" => {
                self.add_statement(st, line_of(node), node_text(node, self.source));
                let dep = match st.nearest_try() {
                    Some(try_region) => Some((try_region, CdgEdge::NotThrows)),
                    None => st.nearest_neg(),
                };
                self.queue_jump(st, dep);
            }
            "try_statement" | "try_with_resources_statement" => self.visit_try(node, st),
            "synchronized_statement" => {
                let header = header_text(node, node.child_by_field_name("body"), self.source);
                self.add_statement(st, line_of(node), header);
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_block(&body, st);
                }
            }
            _ => {}
        }
    }

    fn queue_jump(&mut self, st: &mut ProcState, dep: Option<(NodeId, CdgEdge)>) {
        // a jump with no alternative (a break ending a default arm, or a
        // return as the procedure's last statement) merges nothing
        if let Some((anchor, kind)) = dep {
            st.jumps.push(JumpDep {
                anchor,
                kind,
                depth: st.frames.len(),
            });
        }
    }

    fn visit_if(&mut self, node: Node, st: &mut ProcState) {
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source))
            .unwrap_or("(?)");
        let cond = self.add_statement(st, line_of(node), &format!("if {cond_text}"));

        let then_region = self.add_region(line_of(node), RegionKind::Then);
        self.cdg.graph.add_edge(cond, then_region, CdgEdge::True);
        st.frames.push(Frame {
            region: then_region,
            neg: Some((cond, CdgEdge::False)),
        });
        if let Some(then) = node.child_by_field_name("consequence") {
            self.visit_stmt(then, st);
        }
        st.frames.pop();

        if let Some(alt) = node.child_by_field_name("alternative") {
            let else_region = self.add_region(line_of(alt), RegionKind::Else);
            self.cdg.graph.add_edge(cond, else_region, CdgEdge::False);
            st.frames.push(Frame {
                region: else_region,
                neg: Some((cond, CdgEdge::True)),
            });
            self.visit_stmt(alt, st);
            st.frames.pop();
        }
    }

    fn visit_loop(&mut self, node: Node, keyword: &str, st: &mut ProcState) {
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source))
            .unwrap_or("(?)");
        let header = self.add_statement(st, line_of(node), &format!("{keyword} {cond_text}"));
        let region = self.add_region(line_of(node), RegionKind::Loop);
        self.cdg.graph.add_edge(header, region, CdgEdge::True);
        st.frames.push(Frame {
            region,
            neg: Some((header, CdgEdge::False)),
        });
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, st);
        }
        st.frames.pop();
    }

    fn visit_for(&mut self, node: Node, st: &mut ProcState) {
        let mut cursor = node.walk();
        let inits: Vec<Node> = node.children_by_field_name("init", &mut cursor).collect();
        for init in inits {
            self.add_statement(st, line_of(init), node_text(init, self.source));
        }
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source).to_string())
            .unwrap_or_default();
        let header = self.add_statement(st, line_of(node), &format!("for ({cond_text})"));
        let region = self.add_region(line_of(node), RegionKind::Loop);
        self.cdg.graph.add_edge(header, region, CdgEdge::True);
        st.frames.push(Frame {
            region,
            neg: Some((header, CdgEdge::False)),
        });
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, st);
        }
        let mut cursor = node.walk();
        let updates: Vec<Node> = node.children_by_field_name("update", &mut cursor).collect();
        for update in updates {
            self.add_statement(st, line_of(update), node_text(update, self.source));
        }
        st.frames.pop();
    }

    fn visit_enhanced_for(&mut self, node: Node, st: &mut ProcState) {
        let header_code = header_text(node, node.child_by_field_name("body"), self.source);
        let header = self.add_statement(st, line_of(node), header_code);
        let region = self.add_region(line_of(node), RegionKind::Loop);
        self.cdg.graph.add_edge(header, region, CdgEdge::True);
        st.frames.push(Frame {
            region,
            neg: Some((header, CdgEdge::False)),
        });
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, st);
        }
        st.frames.pop();
    }

    fn visit_switch(&mut self, node: Node, st: &mut ProcState) {
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source))
            .unwrap_or("(?)");
        let selector = self.add_statement(st, line_of(node), &format!("switch {cond_text}"));
        let region = self.add_region(line_of(node), RegionKind::Switch);
        self.cdg.graph.add_edge(selector, region, CdgEdge::Epsilon);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        for group in named_children(&body) {
            if !matches!(group.kind(), "switch_block_statement_group" | "switch_rule") {
                continue;
            }
            let is_default = children_of_kind(&group, "switch_label")
                .iter()
                .any(|l| node_text(*l, self.source).starts_with("default"));
            // default arms have no FALSE alternative to merge through
            let neg = if is_default {
                None
            } else {
                Some((selector, CdgEdge::False))
            };
            st.frames.push(Frame { region, neg });
            for stmt in named_children(&group) {
                if stmt.kind() != "switch_label" {
                    self.visit_stmt(stmt, st);
                }
            }
            st.frames.pop();
        }
    }

    fn visit_try(&mut self, node: Node, st: &mut ProcState) {
        self.materialize_follows(st, line_of(node));
        let try_region = self.add_region(line_of(node), RegionKind::Try);
        self.cdg
            .graph
            .add_edge(st.region(), try_region, CdgEdge::Epsilon);

        st.frames.push(Frame {
            region: try_region,
            neg: Some((try_region, CdgEdge::NotThrows)),
        });
        if let Some(resources) = node.child_by_field_name("resources") {
            for resource in named_children(&resources) {
                self.add_statement(st, line_of(resource), node_text(resource, self.source));
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_block(&body, st);
        }
        st.frames.pop();

        for clause in children_of_kind(&node, "catch_clause") {
            let param_text = child_of_kind(&clause, "catch_formal_parameter")
                .map(|p| node_text(p, self.source))
                .unwrap_or("(?)");
            let catch_region = self.add_region(line_of(clause), RegionKind::Catch);
            self.cdg
                .graph
                .add_edge(try_region, catch_region, CdgEdge::Throws);
            st.frames.push(Frame {
                region: catch_region,
                neg: Some((try_region, CdgEdge::NotThrows)),
            });
            self.add_statement(st, line_of(clause), &format!("catch ({param_text})"));
            if let Some(body) = clause.child_by_field_name("body") {
                self.visit_block(&body, st);
            }
            st.frames.pop();
        }

        if let Some(finally) = child_of_kind(&node, "finally_clause") {
            // finally always runs, so its statements depend on the try
            // region itself, not on any catch
            st.frames.push(Frame {
                region: try_region,
                neg: None,
            });
            if let Some(body) = child_of_kind(&finally, "block") {
                self.visit_block(&body, st);
            }
            st.frames.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::JavaParser;
    use petgraph::visit::EdgeRef;
    use petgraph::Direction;
    use pretty_assertions::assert_eq;

    fn cdg_of(source: &str) -> Cdg {
        let mut parser = JavaParser::new().unwrap();
        let file = parser.parse_source("T.java", source.to_string()).unwrap();
        CdgBuilder::build(&file)
    }

    fn node_named(cdg: &Cdg, code: &str) -> NodeId {
        cdg.graph
            .node_indices()
            .find(|&n| cdg.graph[n].code == code)
            .unwrap_or_else(|| panic!("no node with code {code:?}"))
    }

    fn edge_kind(cdg: &Cdg, from: NodeId, to: NodeId) -> CdgEdge {
        cdg.graph
            .edges_directed(from, Direction::Outgoing)
            .find(|e| e.target() == to)
            .map(|e| *e.weight())
            .unwrap_or_else(|| panic!("no edge between the given nodes"))
    }

    fn parent_of(cdg: &Cdg, n: NodeId) -> NodeId {
        cdg.graph
            .edges_directed(n, Direction::Incoming)
            .map(|e| e.source())
            .next()
            .unwrap()
    }

    #[test]
    fn test_then_branch_hangs_off_true_region() {
        let cdg = cdg_of(
            "class A { void m(int x) {\n\
                 if (x > 0) { x = 1; } else { x = 2; }\n\
             } }",
        );
        let cond = node_named(&cdg, "if (x > 0)");
        let then_stmt = node_named(&cdg, "x = 1;");
        let else_stmt = node_named(&cdg, "x = 2;");
        let then_region = parent_of(&cdg, then_stmt);
        let else_region = parent_of(&cdg, else_stmt);
        assert_eq!(cdg.graph[then_region].kind, CdNodeKind::Region(RegionKind::Then));
        assert_eq!(cdg.graph[else_region].kind, CdNodeKind::Region(RegionKind::Else));
        assert_eq!(edge_kind(&cdg, cond, then_region), CdgEdge::True);
        assert_eq!(edge_kind(&cdg, cond, else_region), CdgEdge::False);
    }

    #[test]
    fn test_if_without_else_creates_no_else_region() {
        let cdg = cdg_of("class A { void m(int x) { if (x > 0) x = 1; } }");
        let has_else = cdg
            .graph
            .node_indices()
            .any(|n| cdg.graph[n].kind == CdNodeKind::Region(RegionKind::Else));
        assert!(!has_else);
    }

    #[test]
    fn test_return_in_branch_makes_follow_region() {
        let cdg = cdg_of(
            "class A { int m(int x) {\n\
                 if (x > 0) { return 1; }\n\
                 int y = 2;\n\
                 return y;\n\
             } }",
        );
        let cond = node_named(&cdg, "if (x > 0)");
        let after = node_named(&cdg, "int y = 2;");
        let follow = parent_of(&cdg, after);
        assert_eq!(
            cdg.graph[follow].kind,
            CdNodeKind::Region(RegionKind::Follow)
        );
        // the follow merges through the branch's negation
        assert_eq!(edge_kind(&cdg, cond, follow), CdgEdge::False);
        // the later return also hangs off the follow, not the entry
        let last = node_named(&cdg, "return y;");
        assert_eq!(parent_of(&cdg, last), follow);
    }

    #[test]
    fn test_else_branch_does_not_consume_then_branch_jump() {
        let cdg = cdg_of(
            "class A { int m(int x) {\n\
                 if (x > 0) { return 1; } else { x = 2; }\n\
                 int y = 3;\n\
                 return y;\n\
             } }",
        );
        // the else statement stays in its own region
        let else_stmt = node_named(&cdg, "x = 2;");
        assert_eq!(
            cdg.graph[parent_of(&cdg, else_stmt)].kind,
            CdNodeKind::Region(RegionKind::Else)
        );
        // the statement after the whole if gets the follow region
        let after = node_named(&cdg, "int y = 3;");
        let follow = parent_of(&cdg, after);
        assert_eq!(
            cdg.graph[follow].kind,
            CdNodeKind::Region(RegionKind::Follow)
        );
        let cond = node_named(&cdg, "if (x > 0)");
        assert_eq!(edge_kind(&cdg, cond, follow), CdgEdge::False);
    }

    #[test]
    fn test_straight_line_code_makes_no_follow() {
        let cdg = cdg_of("class A { void m() { int x = 1; int y = 2; } }");
        let has_follow = cdg
            .graph
            .node_indices()
            .any(|n| cdg.graph[n].kind == CdNodeKind::Region(RegionKind::Follow));
        assert!(!has_follow);
    }

    #[test]
    fn test_catch_region_via_throws_edge() {
        let cdg = cdg_of(
            "class A { void m() {\n\
                 try { int x = 1; }\n\
                 catch (Exception e) { int y = 2; }\n\
                 finally { int z = 3; }\n\
             } }",
        );
        let try_stmt = node_named(&cdg, "int x = 1;");
        let try_region = parent_of(&cdg, try_stmt);
        assert_eq!(cdg.graph[try_region].kind, CdNodeKind::Region(RegionKind::Try));
        let catch_stmt = node_named(&cdg, "int y = 2;");
        let catch_region = parent_of(&cdg, catch_stmt);
        assert_eq!(
            cdg.graph[catch_region].kind,
            CdNodeKind::Region(RegionKind::Catch)
        );
        assert_eq!(edge_kind(&cdg, try_region, catch_region), CdgEdge::Throws);
        // finally statements depend on the try region directly
        let fin_stmt = node_named(&cdg, "int z = 3;");
        assert_eq!(parent_of(&cdg, fin_stmt), try_region);
    }

    #[test]
    fn test_throw_in_try_merges_with_not_throws() {
        let cdg = cdg_of(
            "class A { void m(int x) {\n\
                 try {\n\
                     if (x > 0) { throw new RuntimeException(); }\n\
                     int y = 1;\n\
                 } catch (Exception e) { }\n\
             } }",
        );
        let after = node_named(&cdg, "int y = 1;");
        let follow = parent_of(&cdg, after);
        assert_eq!(
            cdg.graph[follow].kind,
            CdNodeKind::Region(RegionKind::Follow)
        );
        let incoming: Vec<CdgEdge> = cdg
            .graph
            .edges_directed(follow, Direction::Incoming)
            .map(|e| *e.weight())
            .collect();
        assert!(incoming.contains(&CdgEdge::NotThrows));
    }

    #[test]
    fn test_empty_regions_are_dropped() {
        let cdg = cdg_of("class A { void m(int x) { if (x > 0) {} } }");
        let has_then = cdg
            .graph
            .node_indices()
            .any(|n| cdg.graph[n].kind == CdNodeKind::Region(RegionKind::Then));
        assert!(!has_then);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let source = "class A { int m(int x) {\n\
                 while (x > 0) { if (x == 3) break; x--; }\n\
                 return x;\n\
             } }";
        let first = cdg_of(source);
        let second = cdg_of(source);
        assert_eq!(first.graph.node_count(), second.graph.node_count());
        assert_eq!(first.graph.edge_count(), second.graph.edge_count());
        let codes = |cdg: &Cdg| {
            let mut v: Vec<String> = cdg
                .graph
                .node_indices()
                .map(|n| cdg.graph[n].code.clone())
                .collect();
            v.sort();
            v
        };
        assert_eq!(codes(&first), codes(&second));
    }
}
