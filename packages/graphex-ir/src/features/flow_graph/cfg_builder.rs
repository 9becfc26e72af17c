//! Per-file control-flow graph construction.
//!
//! One pass over the syntax tree, one CFG entry per method body
//! (methods, constructors, static initializers). Control constructs
//! keep a stack of pending (node, edge-kind) pairs: the dangling exits
//! of everything built so far, drained into the next node created.
//! break/continue/return/throw emit their node and leave nothing
//! pending, so following statements start unreachable from them.
//! Exits still pending when the body ends drain into a synthetic exit
//! node, so a trailing branch keeps both of its out-edges.

use tree_sitter::Node;

use crate::features::parsing::syntax::{
    child_of_kind, children_of_kind, header_text, line_of, named_children, node_text,
};
use crate::features::parsing::SourceFile;
use crate::shared::models::{Cfg, CfgEdge, CfLink, CfNode, EntryInfo, NodeId};

/// Dangling exits waiting to be wired into the next node
type Pending = Vec<(NodeId, CfgEdge)>;

struct LoopFrame {
    /// Where `continue` goes (condition, or first update of a for)
    continue_to: NodeId,
    /// Where `break` goes
    exit: NodeId,
    /// Switches push a frame for `break` but are not continue targets
    is_loop: bool,
}

struct LabelFrame {
    label: String,
    /// Index into the creation log of the labeled statement's first node
    mark: usize,
    end: NodeId,
}

struct TryFrame {
    /// Where `throw` inside the guarded block goes
    throws_to: NodeId,
}

#[derive(Default)]
struct ProcState {
    pending: Pending,
    loops: Vec<LoopFrame>,
    labels: Vec<LabelFrame>,
    tries: Vec<TryFrame>,
}

pub struct CfgBuilder<'s> {
    source: &'s str,
    cfg: Cfg,
    /// Creation log; resolves labeled-statement first nodes by mark
    created: Vec<NodeId>,
}

impl<'s> CfgBuilder<'s> {
    /// Build the CFG of one parsed file
    pub fn build(file: &'s SourceFile) -> Cfg {
        let mut builder = CfgBuilder {
            source: &file.source,
            cfg: Cfg::new(file.file_name(), file.package.clone()),
            created: Vec::new(),
        };
        for child in named_children(&file.root()) {
            builder.visit_type(child, None);
        }
        builder.cfg
    }

    fn visit_type(&mut self, node: Node, outer: Option<&str>) {
        if !matches!(
            node.kind(),
            "class_declaration" | "interface_declaration" | "enum_declaration"
        ) {
            return;
        }
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let simple = node_text(name_node, self.source);
        let class = match outer {
            Some(o) => format!("{o}.{simple}"),
            None => simple.to_string(),
        };
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        self.visit_members(&body, &class);
    }

    fn visit_members(&mut self, body: &Node, class: &str) {
        for member in named_children(body) {
            match member.kind() {
                "method_declaration" | "constructor_declaration" => {
                    self.build_procedure(member, class);
                }
                "static_initializer" => {
                    self.build_initializer(member, class);
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    self.visit_type(member, Some(class));
                }
                "enum_body_declarations" => {
                    self.visit_members(&member, class);
                }
                _ => {}
            }
        }
    }

    fn build_procedure(&mut self, node: Node, class: &str) {
        let body = node.child_by_field_name("body");
        let signature = header_text(node, body, self.source);
        let is_ctor = node.kind() == "constructor_declaration";
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, self.source).to_string())
            .unwrap_or_default();
        let return_type = if is_ctor {
            None
        } else {
            node.child_by_field_name("type")
                .map(|t| node_text(t, self.source).to_string())
        };
        let info = EntryInfo {
            class: class.to_string(),
            name,
            return_type,
            params: self.param_names(node),
        };
        let entry = self.start_entry(node, signature, info);
        if let Some(body) = body {
            let mut st = ProcState {
                pending: vec![(entry, CfgEdge::Epsilon)],
                ..Default::default()
            };
            self.visit_block(&body, &mut st);
            self.finish_procedure(&mut st, Self::end_line(node));
        }
    }

    fn build_initializer(&mut self, node: Node, class: &str) {
        let info = EntryInfo {
            class: class.to_string(),
            name: "<clinit>".to_string(),
            return_type: None,
            params: Vec::new(),
        };
        let entry = self.start_entry(node, "static", info);
        if let Some(body) = child_of_kind(&node, "block") {
            let mut st = ProcState {
                pending: vec![(entry, CfgEdge::Epsilon)],
                ..Default::default()
            };
            self.visit_block(&body, &mut st);
            self.finish_procedure(&mut st, Self::end_line(node));
        }
    }

    /// Wire any still-dangling exits into one synthetic exit node
    fn finish_procedure(&mut self, st: &mut ProcState, line: u32) {
        if st.pending.is_empty() {
            return;
        }
        let exit = self.add_node(None, line, "exit");
        self.drain_to(st, exit);
    }

    fn start_entry(&mut self, node: Node, code: &str, info: EntryInfo) -> NodeId {
        let entry = self.add_node(Some(node.start_byte()), line_of(node), code);
        self.cfg.graph[entry].link = CfLink::Entry(Box::new(info));
        self.cfg.entries.push(entry);
        entry
    }

    fn param_names(&self, node: Node) -> Vec<String> {
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(&params)
            .iter()
            .filter_map(|p| match p.kind() {
                "formal_parameter" => p.child_by_field_name("name"),
                "spread_parameter" => child_of_kind(p, "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name")),
                _ => None,
            })
            .map(|n| node_text(n, self.source).to_string())
            .collect()
    }

    // --- node plumbing ---

    fn add_node(&mut self, pos: Option<usize>, line: u32, code: &str) -> NodeId {
        let id = self.cfg.graph.add_node(CfNode::new(line, code));
        if let Some(pos) = pos {
            self.cfg.node_by_pos.entry(pos).or_insert(id);
        }
        self.created.push(id);
        id
    }

    /// Create a node and drain all pending exits into it
    fn emit(&mut self, st: &mut ProcState, pos: Option<usize>, line: u32, code: &str) -> NodeId {
        let id = self.add_node(pos, line, code);
        for (from, kind) in st.pending.drain(..) {
            self.cfg.graph.add_edge(from, id, kind);
        }
        id
    }

    fn drain_to(&mut self, st: &mut ProcState, target: NodeId) {
        for (from, kind) in st.pending.drain(..) {
            self.cfg.graph.add_edge(from, target, kind);
        }
    }

    /// Keep a merge node if anything reached it, otherwise discard it
    fn seal(&mut self, st: &mut ProcState, end: NodeId) {
        let wired = self
            .cfg
            .graph
            .edges_directed(end, petgraph::Direction::Incoming)
            .next()
            .is_some();
        if wired {
            st.pending.push((end, CfgEdge::Epsilon));
        } else {
            self.cfg.graph.remove_node(end);
        }
    }

    fn end_line(node: Node) -> u32 {
        node.end_position().row as u32 + 1
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
                let n = self.emit(
                    st,
                    Some(node.start_byte()),
                    line_of(node),
                    node_text(node, self.source),
                );
                st.pending.push((n, CfgEdge::Epsilon));
            }
            "if_statement" => self.visit_if(node, st),
            "while_statement" => self.visit_while(node, st),
            "do_statement" => self.visit_do(node, st),
            "for_statement" => self.visit_for(node, st),
            "enhanced_for_statement" => self.visit_enhanced_for(node, st),
            "switch_expression" => self.visit_switch(node, st),
            "labeled_statement" => self.visit_labeled(node, st),
            "break_statement" => self.visit_break(node, st),
            "continue_statement" => self.visit_continue(node, st),
            "return_statement" => {
                self.emit(
                    st,
                    Some(node.start_byte()),
                    line_of(node),
                    node_text(node, self.source),
                );
            }
            "throw_statement" => self.visit_throw(node, st),
            "try_statement" | "try_with_resources_statement" => self.visit_try(node, st),
            "synchronized_statement" => self.visit_synchronized(node, st),
            "class_declaration" | "interface_declaration" | "enum_declaration" => {
                // local types get their own entries, outside this procedure
            }
            "line_comment" | "block_comment" | "empty_statement" => {}
            _ => {}
        }
    }

    fn visit_if(&mut self, node: Node, st: &mut ProcState) {
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source))
            .unwrap_or("(?)");
        let cond = self.emit(
            st,
            Some(node.start_byte()),
            line_of(node),
            &format!("if {cond_text}"),
        );

        st.pending.push((cond, CfgEdge::True));
        if let Some(then) = node.child_by_field_name("consequence") {
            self.visit_stmt(then, st);
        }
        let then_exits = std::mem::take(&mut st.pending);

        match node.child_by_field_name("alternative") {
            Some(alt) => {
                st.pending.push((cond, CfgEdge::False));
                self.visit_stmt(alt, st);
                st.pending.extend(then_exits);
            }
            None => {
                st.pending = then_exits;
                st.pending.push((cond, CfgEdge::False));
            }
        }
    }

    fn visit_while(&mut self, node: Node, st: &mut ProcState) {
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source))
            .unwrap_or("(?)");
        let cond = self.emit(
            st,
            Some(node.start_byte()),
            line_of(node),
            &format!("while {cond_text}"),
        );
        let exit = self.add_node(None, Self::end_line(node), "endwhile");

        st.loops.push(LoopFrame {
            continue_to: cond,
            exit,
            is_loop: true,
        });
        st.pending.push((cond, CfgEdge::True));
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, st);
        }
        self.drain_to(st, cond);
        st.loops.pop();

        self.cfg.graph.add_edge(cond, exit, CfgEdge::False);
        st.pending.push((exit, CfgEdge::Epsilon));
    }

    fn visit_do(&mut self, node: Node, st: &mut ProcState) {
        // the do marker carries no variables; the condition is the
        // statement anchor the data-flow pass keys on
        let do_node = self.emit(st, None, line_of(node), "do");
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source))
            .unwrap_or("(?)");
        let cond = self.add_node(
            Some(node.start_byte()),
            Self::end_line(node),
            &format!("while {cond_text}"),
        );
        let exit = self.add_node(None, Self::end_line(node), "enddo");

        st.loops.push(LoopFrame {
            continue_to: cond,
            exit,
            is_loop: true,
        });
        st.pending.push((do_node, CfgEdge::Epsilon));
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, st);
        }
        self.drain_to(st, cond);
        st.loops.pop();

        self.cfg.graph.add_edge(cond, do_node, CfgEdge::True);
        self.cfg.graph.add_edge(cond, exit, CfgEdge::False);
        st.pending.push((exit, CfgEdge::Epsilon));
    }

    fn visit_for(&mut self, node: Node, st: &mut ProcState) {
        let mut cursor = node.walk();
        let inits: Vec<Node> = node.children_by_field_name("init", &mut cursor).collect();
        for init in inits {
            let n = self.emit(
                st,
                Some(init.start_byte()),
                line_of(init),
                node_text(init, self.source),
            );
            st.pending.push((n, CfgEdge::Epsilon));
        }

        let cond_node = node.child_by_field_name("condition");
        let cond_text = cond_node
            .map(|c| node_text(c, self.source).to_string())
            .unwrap_or_default();
        // the condition is anchored at the for keyword: init nodes have
        // claimed their own positions already
        let cond = self.emit(
            st,
            Some(node.start_byte()),
            line_of(node),
            &format!("for ({cond_text})"),
        );
        let exit = self.add_node(None, Self::end_line(node), "endfor");

        let mut cursor = node.walk();
        let update_nodes: Vec<Node> = node.children_by_field_name("update", &mut cursor).collect();
        let updates: Vec<NodeId> = update_nodes
            .iter()
            .map(|u| self.add_node(Some(u.start_byte()), line_of(*u), node_text(*u, self.source)))
            .collect();
        let continue_to = updates.first().copied().unwrap_or(cond);

        st.loops.push(LoopFrame {
            continue_to,
            exit,
            is_loop: true,
        });
        st.pending.push((cond, CfgEdge::True));
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, st);
        }
        self.drain_to(st, continue_to);
        st.loops.pop();

        // chain the updates back to the condition
        let mut prev = None;
        for &u in &updates {
            if let Some(p) = prev {
                self.cfg.graph.add_edge(p, u, CfgEdge::Epsilon);
            }
            prev = Some(u);
        }
        if let Some(last) = prev {
            self.cfg.graph.add_edge(last, cond, CfgEdge::Epsilon);
        }

        self.cfg.graph.add_edge(cond, exit, CfgEdge::False);
        st.pending.push((exit, CfgEdge::Epsilon));
    }

    fn visit_enhanced_for(&mut self, node: Node, st: &mut ProcState) {
        let header = header_text(node, node.child_by_field_name("body"), self.source);
        let hdr = self.emit(st, Some(node.start_byte()), line_of(node), header);
        let exit = self.add_node(None, Self::end_line(node), "endfor");

        st.loops.push(LoopFrame {
            continue_to: hdr,
            exit,
            is_loop: true,
        });
        st.pending.push((hdr, CfgEdge::True));
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, st);
        }
        self.drain_to(st, hdr);
        st.loops.pop();

        self.cfg.graph.add_edge(hdr, exit, CfgEdge::False);
        st.pending.push((exit, CfgEdge::Epsilon));
    }

    fn visit_switch(&mut self, node: Node, st: &mut ProcState) {
        let cond_text = node
            .child_by_field_name("condition")
            .map(|c| node_text(c, self.source))
            .unwrap_or("(?)");
        let selector = self.emit(
            st,
            Some(node.start_byte()),
            line_of(node),
            &format!("switch {cond_text}"),
        );
        let end = self.add_node(None, Self::end_line(node), "endswitch");

        // break with no label targets the switch end
        st.loops.push(LoopFrame {
            continue_to: selector,
            exit: end,
            is_loop: false,
        });

        let mut has_default = false;
        let mut fall: Pending = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for group in named_children(&body) {
                match group.kind() {
                    "switch_block_statement_group" => {
                        let is_default = children_of_kind(&group, "switch_label")
                            .iter()
                            .any(|l| node_text(*l, self.source).starts_with("default"));
                        has_default |= is_default;
                        let kind = if is_default {
                            CfgEdge::False
                        } else {
                            CfgEdge::True
                        };
                        // previous group falls through into this one
                        st.pending = std::mem::take(&mut fall);
                        st.pending.push((selector, kind));
                        for stmt in named_children(&group) {
                            if stmt.kind() != "switch_label" {
                                self.visit_stmt(stmt, st);
                            }
                        }
                        fall = std::mem::take(&mut st.pending);
                    }
                    "switch_rule" => {
                        let is_default = child_of_kind(&group, "switch_label")
                            .map(|l| node_text(l, self.source).starts_with("default"))
                            .unwrap_or(false);
                        has_default |= is_default;
                        let kind = if is_default {
                            CfgEdge::False
                        } else {
                            CfgEdge::True
                        };
                        st.pending = vec![(selector, kind)];
                        for stmt in named_children(&group) {
                            if stmt.kind() != "switch_label" {
                                self.visit_stmt(stmt, st);
                            }
                        }
                        // arrow rules never fall through
                        self.drain_to(st, end);
                    }
                    _ => {}
                }
            }
        }
        st.loops.pop();

        st.pending = fall;
        self.drain_to(st, end);
        if !has_default {
            self.cfg.graph.add_edge(selector, end, CfgEdge::False);
        }
        self.seal(st, end);
    }

    fn visit_labeled(&mut self, node: Node, st: &mut ProcState) {
        let children = named_children(&node);
        let Some(label_node) = children.first().filter(|c| c.kind() == "identifier") else {
            return;
        };
        let label = node_text(*label_node, self.source).to_string();
        let end = self.add_node(None, Self::end_line(node), &format!("end {label}"));
        // the labeled statement's first node is not created yet; record
        // where it will land in the creation log
        st.labels.push(LabelFrame {
            label,
            mark: self.created.len(),
            end,
        });
        if let Some(inner) = children.into_iter().find(|c| c.kind() != "identifier") {
            self.visit_stmt(inner, st);
        }
        st.labels.pop();
        self.seal(st, end);
    }

    fn visit_break(&mut self, node: Node, st: &mut ProcState) {
        let n = self.emit(
            st,
            Some(node.start_byte()),
            line_of(node),
            node_text(node, self.source),
        );
        let label = child_of_kind(&node, "identifier").map(|l| node_text(l, self.source));
        let target = match label {
            Some(name) => st
                .labels
                .iter()
                .rev()
                .find(|f| f.label == name)
                .map(|f| f.end),
            None => st.loops.last().map(|f| f.exit),
        };
        if let Some(target) = target {
            self.cfg.graph.add_edge(n, target, CfgEdge::Epsilon);
        }
        // nothing pending: the next statement is not a successor
    }

    fn visit_continue(&mut self, node: Node, st: &mut ProcState) {
        let n = self.emit(
            st,
            Some(node.start_byte()),
            line_of(node),
            node_text(node, self.source),
        );
        let label = child_of_kind(&node, "identifier").map(|l| node_text(l, self.source));
        let target = match label {
            Some(name) => st
                .labels
                .iter()
                .rev()
                .find(|f| f.label == name)
                .and_then(|f| self.created.get(f.mark).copied()),
            None => st
                .loops
                .iter()
                .rev()
                .find(|f| f.is_loop)
                .map(|f| f.continue_to),
        };
        if let Some(target) = target {
            self.cfg.graph.add_edge(n, target, CfgEdge::Epsilon);
        }
    }

    fn visit_throw(&mut self, node: Node, st: &mut ProcState) {
        let n = self.emit(
            st,
            Some(node.start_byte()),
            line_of(node),
            node_text(node, self.source),
        );
        if let Some(frame) = st.tries.last() {
            self.cfg
                .graph
                .add_edge(n, frame.throws_to, CfgEdge::Throws);
        }
    }

    fn visit_try(&mut self, node: Node, st: &mut ProcState) {
        let try_node = self.emit(st, Some(node.start_byte()), line_of(node), "try");
        st.pending.push((try_node, CfgEdge::Epsilon));

        if let Some(resources) = node.child_by_field_name("resources") {
            for resource in named_children(&resources) {
                let r = self.emit(
                    st,
                    Some(resource.start_byte()),
                    line_of(resource),
                    node_text(resource, self.source),
                );
                st.pending.push((r, CfgEdge::Epsilon));
            }
        }

        let end_try = self.add_node(None, Self::end_line(node), "end-try");
        st.tries.push(TryFrame { throws_to: end_try });
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_block(&body, st);
        }
        st.tries.pop();
        self.drain_to(st, end_try);

        let catches = children_of_kind(&node, "catch_clause");
        let mut end_catch = None;
        if !catches.is_empty() {
            let ec = self.add_node(None, Self::end_line(node), "end-catch");
            end_catch = Some(ec);
            for clause in catches {
                let param_text = child_of_kind(&clause, "catch_formal_parameter")
                    .map(|p| node_text(p, self.source))
                    .unwrap_or("(?)");
                // the catch header defines the exception variable, so it
                // anchors at the clause position
                let header = self.add_node(
                    Some(clause.start_byte()),
                    line_of(clause),
                    &format!("catch ({param_text})"),
                );
                self.cfg.graph.add_edge(end_try, header, CfgEdge::Throws);
                st.pending.push((header, CfgEdge::Epsilon));
                if let Some(body) = clause.child_by_field_name("body") {
                    self.visit_block(&body, st);
                }
                self.drain_to(st, ec);
            }
        }

        match child_of_kind(&node, "finally_clause") {
            Some(finally) => {
                st.pending.push((end_try, CfgEdge::Epsilon));
                if let Some(ec) = end_catch {
                    st.pending.push((ec, CfgEdge::Epsilon));
                }
                if let Some(body) = child_of_kind(&finally, "block") {
                    self.visit_block(&body, st);
                }
            }
            None => {
                if let Some(ec) = end_catch {
                    self.cfg.graph.add_edge(ec, end_try, CfgEdge::Epsilon);
                }
                st.pending.push((end_try, CfgEdge::Epsilon));
            }
        }
    }

    fn visit_synchronized(&mut self, node: Node, st: &mut ProcState) {
        let header = header_text(node, node.child_by_field_name("body"), self.source);
        let n = self.emit(st, Some(node.start_byte()), line_of(node), header);
        st.pending.push((n, CfgEdge::Epsilon));
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_block(&body, st);
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

    fn cfg_of(source: &str) -> Cfg {
        let mut parser = JavaParser::new().unwrap();
        let file = parser.parse_source("T.java", source.to_string()).unwrap();
        CfgBuilder::build(&file)
    }

    fn node_named<'c>(cfg: &'c Cfg, code: &str) -> NodeId {
        cfg.graph
            .node_indices()
            .find(|&n| {
                let node = &cfg.graph[n];
                node.code == code || node.normalized.as_deref() == Some(code)
            })
            .unwrap_or_else(|| panic!("no node with code {code:?}"))
    }

    fn edge_kind(cfg: &Cfg, from: NodeId, to: NodeId) -> CfgEdge {
        cfg.graph
            .edges_directed(from, Direction::Outgoing)
            .find(|e| e.target() == to)
            .map(|e| *e.weight())
            .unwrap_or_else(|| panic!("no edge between the given nodes"))
    }

    #[test]
    fn test_entry_has_in_degree_zero() {
        let cfg = cfg_of("class A { void m() { int x = 1; } }");
        assert_eq!(cfg.entries.len(), 1);
        let entry = cfg.entries[0];
        assert_eq!(
            cfg.graph
                .edges_directed(entry, Direction::Incoming)
                .count(),
            0
        );
        let info = cfg.graph[entry].entry_info().unwrap();
        assert_eq!(info.class, "A");
        assert_eq!(info.name, "m");
        assert_eq!(info.return_type.as_deref(), Some("void"));
    }

    #[test]
    fn test_if_without_else_joins_at_successor() {
        let cfg = cfg_of(
            "class A { void m(int x) {\n\
                 if (x > 0) x = 1;\n\
                 int y = 2;\n\
             } }",
        );
        let cond = node_named(&cfg, "if (x > 0)");
        let then = node_named(&cfg, "x = 1;");
        let after = node_named(&cfg, "int y = 2;");
        assert_eq!(edge_kind(&cfg, cond, then), CfgEdge::True);
        assert_eq!(edge_kind(&cfg, cond, after), CfgEdge::False);
        assert_eq!(edge_kind(&cfg, then, after), CfgEdge::Epsilon);
    }

    #[test]
    fn test_trailing_branch_keeps_false_edge_into_exit() {
        let cfg = cfg_of("class A { void m(int x) { if (x > 0) { x = 1; } } }");
        let cond = node_named(&cfg, "if (x > 0)");
        let then = node_named(&cfg, "x = 1;");
        let exit = node_named(&cfg, "exit");
        assert_eq!(edge_kind(&cfg, cond, exit), CfgEdge::False);
        assert_eq!(edge_kind(&cfg, then, exit), CfgEdge::Epsilon);
        assert_eq!(cfg.exits_of(cfg.entries[0]), vec![exit]);
    }

    #[test]
    fn test_fully_returning_body_adds_no_exit_node() {
        let cfg = cfg_of(
            "class A { int m(int x) {\n\
                 if (x > 0) { return 1; }\n\
                 return 0;\n\
             } }",
        );
        assert!(cfg.graph.node_indices().all(|n| cfg.graph[n].code != "exit"));
    }

    #[test]
    fn test_while_loop_back_edge_and_exit() {
        let cfg = cfg_of(
            "class A { void m(int x) {\n\
                 while (x > 0) { x = x - 1; }\n\
                 int y = 0;\n\
             } }",
        );
        let cond = node_named(&cfg, "while (x > 0)");
        let body = node_named(&cfg, "x = x - 1;");
        let exit = node_named(&cfg, "endwhile");
        assert_eq!(edge_kind(&cfg, cond, body), CfgEdge::True);
        assert_eq!(edge_kind(&cfg, body, cond), CfgEdge::Epsilon);
        assert_eq!(edge_kind(&cfg, cond, exit), CfgEdge::False);
        let after = node_named(&cfg, "int y = 0;");
        assert_eq!(edge_kind(&cfg, exit, after), CfgEdge::Epsilon);
    }

    #[test]
    fn test_for_loop_wires_updates_between_body_and_condition() {
        let cfg = cfg_of(
            "class A { void m() {\n\
                 for (int i = 0; i < 10; i++) { int z = i; }\n\
             } }",
        );
        let init = node_named(&cfg, "int i = 0;");
        let cond = node_named(&cfg, "for (i < 10)");
        let update = node_named(&cfg, "i++");
        let body = node_named(&cfg, "int z = i;");
        assert_eq!(edge_kind(&cfg, init, cond), CfgEdge::Epsilon);
        assert_eq!(edge_kind(&cfg, cond, body), CfgEdge::True);
        assert_eq!(edge_kind(&cfg, body, update), CfgEdge::Epsilon);
        assert_eq!(edge_kind(&cfg, update, cond), CfgEdge::Epsilon);
    }

    #[test]
    fn test_do_loop_enters_body_unconditionally() {
        let cfg = cfg_of(
            "class A { void m(int x) {\n\
                 do { x--; } while (x > 0);\n\
             } }",
        );
        let do_node = node_named(&cfg, "do");
        let body = node_named(&cfg, "x--;");
        let cond = node_named(&cfg, "while (x > 0)");
        assert_eq!(edge_kind(&cfg, do_node, body), CfgEdge::Epsilon);
        assert_eq!(edge_kind(&cfg, body, cond), CfgEdge::Epsilon);
        assert_eq!(edge_kind(&cfg, cond, do_node), CfgEdge::True);
    }

    #[test]
    fn test_break_leaves_loop_and_suppresses_fallthrough() {
        let cfg = cfg_of(
            "class A { void m(int x) {\n\
                 while (x > 0) { break; x = 1; }\n\
             } }",
        );
        let brk = node_named(&cfg, "break;");
        let exit = node_named(&cfg, "endwhile");
        assert_eq!(edge_kind(&cfg, brk, exit), CfgEdge::Epsilon);
        // the statement after break is unreachable from it
        let dead = node_named(&cfg, "x = 1;");
        assert_eq!(
            cfg.graph.edges_directed(dead, Direction::Incoming).count(),
            0
        );
    }

    #[test]
    fn test_labeled_continue_reaches_outer_loop() {
        let cfg = cfg_of(
            "class A { void m() {\n\
                 outer:\n\
                 while (true) {\n\
                     while (true) { continue outer; }\n\
                 }\n\
             } }",
        );
        let cont = node_named(&cfg, "continue outer;");
        let outer_cond = cfg
            .graph
            .node_indices()
            .filter(|&n| cfg.graph[n].code == "while (true)")
            .min()
            .unwrap();
        assert_eq!(edge_kind(&cfg, cont, outer_cond), CfgEdge::Epsilon);
    }

    #[test]
    fn test_return_has_no_successors() {
        let cfg = cfg_of(
            "class A { int m(int x) {\n\
                 if (x > 0) return 1;\n\
                 return 0;\n\
             } }",
        );
        let early = node_named(&cfg, "return 1;");
        assert_eq!(
            cfg.graph.edges_directed(early, Direction::Outgoing).count(),
            0
        );
    }

    #[test]
    fn test_throw_inside_try_jumps_to_catch_via_merge() {
        let cfg = cfg_of(
            "class A { void m() {\n\
                 try { throw new RuntimeException(); }\n\
                 catch (Exception e) { int y = 1; }\n\
             } }",
        );
        let thr = node_named(&cfg, "throw new RuntimeException();");
        let end_try = node_named(&cfg, "end-try");
        let catch = node_named(&cfg, "catch (Exception e)");
        assert_eq!(edge_kind(&cfg, thr, end_try), CfgEdge::Throws);
        assert_eq!(edge_kind(&cfg, end_try, catch), CfgEdge::Throws);
        let body = node_named(&cfg, "int y = 1;");
        assert_eq!(edge_kind(&cfg, catch, body), CfgEdge::Epsilon);
    }

    #[test]
    fn test_switch_cases_and_default() {
        let cfg = cfg_of(
            "class A { void m(int x) {\n\
                 switch (x) {\n\
                     case 1: x = 10; break;\n\
                     default: x = 20;\n\
                 }\n\
                 int y = x;\n\
             } }",
        );
        let sel = node_named(&cfg, "switch (x)");
        let case1 = node_named(&cfg, "x = 10;");
        let dflt = node_named(&cfg, "x = 20;");
        assert_eq!(edge_kind(&cfg, sel, case1), CfgEdge::True);
        assert_eq!(edge_kind(&cfg, sel, dflt), CfgEdge::False);
        let end = node_named(&cfg, "endswitch");
        let brk = node_named(&cfg, "break;");
        assert_eq!(edge_kind(&cfg, brk, end), CfgEdge::Epsilon);
        assert_eq!(edge_kind(&cfg, dflt, end), CfgEdge::Epsilon);
    }

    #[test]
    fn test_constructor_and_static_initializer_entries() {
        let cfg = cfg_of(
            "class A {\n\
                 static { int x = 0; }\n\
                 A(int v) { int y = v; }\n\
             }",
        );
        assert_eq!(cfg.entries.len(), 2);
        let infos: Vec<&str> = cfg
            .entries
            .iter()
            .map(|&e| cfg.graph[e].entry_info().unwrap().name.as_str())
            .collect();
        assert_eq!(infos, vec!["<clinit>", "A"]);
        let ctor = cfg.graph[cfg.entries[1]].entry_info().unwrap();
        assert_eq!(ctor.return_type, None);
        assert_eq!(ctor.params, vec!["v".to_string()]);
    }

    #[test]
    fn test_statement_positions_are_registered() {
        let source = "class A { void m() { int x = 1; } }";
        let cfg = cfg_of(source);
        let pos = source.find("int x").unwrap();
        let id = cfg.node_by_pos[&pos];
        assert_eq!(cfg.graph[id].code, "int x = 1;");
    }
}
