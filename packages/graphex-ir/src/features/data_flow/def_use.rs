//! Iterative DEF/USE annotation.
//!
//! Repeated full passes over every statement of every file until no
//! DEF, USE, or self-flow set grows. The passes exist because call
//! sites inherit side effects from callee bodies: a method observed to
//! assign a field or a parameter makes its callers' receiver/argument
//! DEF sets grow on the next pass. Sets are monotonic and bounded by
//! the program's symbol vocabulary, so the loop terminates.
//!
//! DDG nodes anchor at the same tree positions the CFG builder
//! registers, which is what lets the flow-edge pass join the graphs.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::debug;
use tree_sitter::Node;

use crate::features::declarations::{
    CallDesc, DeclarationIndex, MethodResolver, ResolveCtx, TypeRecord,
};
use crate::features::parsing::syntax::{
    child_of_kind, children_of_kind, header_text, line_of, literal_type, named_children,
    node_text,
};
use crate::features::parsing::SourceFile;
use crate::shared::models::{Ddg, MethodKey};
use crate::shared::utils::TypeScopes;

/// Method-name prefixes assumed to mutate the receiver's state
const MUTATOR_PREFIXES: &[&str] = &[
    "set", "put", "add", "insert", "push", "append", "remove", "delete", "clear", "write",
    "update",
];

fn is_mutator_name(name: &str) -> bool {
    MUTATOR_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Side effects observed in a method's own body so far
#[derive(Debug, Clone, Default)]
struct MethodEffects {
    /// Assigns a field of its declaring type
    mutates_state: bool,
    /// Parameter indices the body assigns to
    param_defs: BTreeSet<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Def,
    Use,
}

enum VarKind {
    Param(usize),
    Local,
    Field,
}

/// Collected names for one statement, applied to its DDG node at the end
#[derive(Default)]
struct Sets {
    defs: Vec<String>,
    uses: Vec<String>,
}

/// Per-procedure traversal context
struct ProcCtx<'a> {
    package: String,
    class: Option<&'a TypeRecord>,
    /// Simple name path of the enclosing type ("Outer.Inner")
    class_name: String,
    params: Vec<String>,
    /// Join key of the procedure itself, when it is indexed
    key: Option<MethodKey>,
    scopes: TypeScopes,
}

pub struct DefUseAnalyzer<'a> {
    index: &'a DeclarationIndex,
    resolver: MethodResolver<'a>,
    effects: FxHashMap<MethodKey, MethodEffects>,
    changed: bool,
}

impl<'a> DefUseAnalyzer<'a> {
    pub fn new(index: &'a DeclarationIndex) -> Self {
        Self {
            index,
            resolver: MethodResolver::new(index),
            effects: FxHashMap::default(),
            changed: false,
        }
    }

    /// Annotate every file of the program, iterating to a fixed point
    pub fn annotate(&mut self, files: &[SourceFile]) -> Vec<Ddg> {
        let mut ddgs: Vec<Ddg> = files
            .iter()
            .map(|f| Ddg::new(f.file_name(), f.package.clone()))
            .collect();
        let mut passes = 0u32;
        loop {
            self.changed = false;
            passes += 1;
            for (file, ddg) in files.iter().zip(ddgs.iter_mut()) {
                self.visit_file(file, ddg);
            }
            if !self.changed {
                break;
            }
        }
        debug!(passes, "def/use annotation converged");
        ddgs
    }

    fn visit_file(&mut self, file: &SourceFile, ddg: &mut Ddg) {
        for child in named_children(&file.root()) {
            self.visit_type(child, file, ddg, None);
        }
    }

    fn visit_type(&mut self, node: Node, file: &SourceFile, ddg: &mut Ddg, outer: Option<&str>) {
        if !matches!(
            node.kind(),
            "class_declaration" | "interface_declaration" | "enum_declaration"
        ) {
            return;
        }
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let simple = node_text(name_node, &file.source);
        let class_name = match outer {
            Some(o) => format!("{o}.{simple}"),
            None => simple.to_string(),
        };
        let qualified = if file.package.is_empty() {
            class_name.clone()
        } else {
            format!("{}.{class_name}", file.package)
        };
        let record = self.index.type_by_name(&qualified);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        self.visit_type_members(&body, file, ddg, record, &class_name);
    }

    fn visit_type_members(
        &mut self,
        body: &Node,
        file: &SourceFile,
        ddg: &mut Ddg,
        record: Option<&'a TypeRecord>,
        class_name: &str,
    ) {
        for member in named_children(body) {
            match member.kind() {
                "method_declaration" | "constructor_declaration" => {
                    self.visit_procedure(member, file, ddg, record, class_name);
                }
                "static_initializer" => {
                    self.visit_initializer(member, file, ddg, record, class_name);
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    self.visit_type(member, file, ddg, Some(class_name));
                }
                "enum_body_declarations" => {
                    self.visit_type_members(&member, file, ddg, record, class_name);
                }
                _ => {}
            }
        }
    }

    fn visit_procedure(
        &mut self,
        node: Node,
        file: &SourceFile,
        ddg: &mut Ddg,
        record: Option<&'a TypeRecord>,
        class_name: &str,
    ) {
        let body = node.child_by_field_name("body");
        let signature = header_text(node, body, &file.source);
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, &file.source).to_string())
            .unwrap_or_default();

        let mut params = Vec::new();
        let mut ctx = ProcCtx {
            package: file.package.clone(),
            class: record,
            class_name: class_name.to_string(),
            params: Vec::new(),
            key: record.and_then(|ty| {
                ty.methods
                    .iter()
                    .find(|m| m.name == name && m.line == line_of(node))
                    .map(|m| ty.key_of(m))
            }),
            scopes: TypeScopes::new(),
        };
        if let Some(param_list) = node.child_by_field_name("parameters") {
            for p in named_children(&param_list) {
                let name_node = match p.kind() {
                    "formal_parameter" => p.child_by_field_name("name"),
                    "spread_parameter" => child_of_kind(&p, "variable_declarator")
                        .and_then(|d| d.child_by_field_name("name")),
                    _ => None,
                };
                let Some(name_node) = name_node else { continue };
                let pname = node_text(name_node, &file.source).to_string();
                let ptype = p
                    .child_by_field_name("type")
                    .map(|t| node_text(t, &file.source))
                    .unwrap_or("");
                ctx.scopes.declare(&pname, ptype);
                params.push(pname);
            }
        }
        ctx.params = params;

        // the entry node defines the parameters
        let entry_sets = Sets {
            defs: ctx.params.clone(),
            uses: Vec::new(),
        };
        self.apply(ddg, node.start_byte(), line_of(node), signature, entry_sets);

        if let Some(body) = body {
            self.visit_block(&body, &file.source, &mut ctx, ddg);
        }
    }

    fn visit_initializer(
        &mut self,
        node: Node,
        file: &SourceFile,
        ddg: &mut Ddg,
        record: Option<&'a TypeRecord>,
        class_name: &str,
    ) {
        let mut ctx = ProcCtx {
            package: file.package.clone(),
            class: record,
            class_name: class_name.to_string(),
            params: Vec::new(),
            key: None,
            scopes: TypeScopes::new(),
        };
        self.apply(ddg, node.start_byte(), line_of(node), "static", Sets::default());
        if let Some(body) = child_of_kind(&node, "block") {
            self.visit_block(&body, &file.source, &mut ctx, ddg);
        }
    }

    // --- statements ---

    fn visit_block(&mut self, block: &Node, src: &str, ctx: &mut ProcCtx<'a>, ddg: &mut Ddg) {
        ctx.scopes.push();
        for stmt in named_children(block) {
            self.visit_stmt(stmt, src, ctx, ddg);
        }
        ctx.scopes.pop();
    }

    fn visit_stmt(&mut self, node: Node, src: &str, ctx: &mut ProcCtx<'a>, ddg: &mut Ddg) {
        match node.kind() {
            "block" | "constructor_body" => self.visit_block(&node, src, ctx, ddg),
            "expression_statement" | "explicit_constructor_invocation" => {
                let mut sets = Sets::default();
                for child in named_children(&node) {
                    self.collect(child, Access::Use, src, ctx, &mut sets);
                }
                self.apply(ddg, node.start_byte(), line_of(node), node_text(node, src), sets);
            }
            "local_variable_declaration" => {
                self.visit_local_decl(node, node.start_byte(), src, ctx, ddg);
            }
            "if_statement" => {
                self.anchor_condition(node, "if", src, ctx, ddg);
                if let Some(then) = node.child_by_field_name("consequence") {
                    self.visit_stmt(then, src, ctx, ddg);
                }
                if let Some(alt) = node.child_by_field_name("alternative") {
                    self.visit_stmt(alt, src, ctx, ddg);
                }
            }
            "while_statement" | "do_statement" => {
                self.anchor_condition(node, "while", src, ctx, ddg);
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_stmt(body, src, ctx, ddg);
                }
            }
            "for_statement" => self.visit_for(node, src, ctx, ddg),
            "enhanced_for_statement" => self.visit_enhanced_for(node, src, ctx, ddg),
            "switch_expression" => {
                self.anchor_condition(node, "switch", src, ctx, ddg);
                if let Some(body) = node.child_by_field_name("body") {
                    for group in named_children(&body) {
                        if !matches!(
                            group.kind(),
                            "switch_block_statement_group" | "switch_rule"
                        ) {
                            continue;
                        }
                        ctx.scopes.push();
                        for stmt in named_children(&group) {
                            if stmt.kind() != "switch_label" {
                                self.visit_stmt(stmt, src, ctx, ddg);
                            }
                        }
                        ctx.scopes.pop();
                    }
                }
            }
            "labeled_statement" => {
                if let Some(inner) = named_children(&node)
                    .into_iter()
                    .find(|c| c.kind() != "identifier")
                {
                    self.visit_stmt(inner, src, ctx, ddg);
                }
            }
            "return_statement" | "throw_statement" | "yield_statement" | "assert_statement" => {
                let mut sets = Sets::default();
                for child in named_children(&node) {
                    self.collect(child, Access::Use, src, ctx, &mut sets);
                }
                self.apply(ddg, node.start_byte(), line_of(node), node_text(node, src), sets);
            }
            "synchronized_statement" => {
                let header = header_text(node, node.child_by_field_name("body"), src);
                let mut sets = Sets::default();
                if let Some(monitor) = child_of_kind(&node, "parenthesized_expression") {
                    self.collect(monitor, Access::Use, src, ctx, &mut sets);
                }
                self.apply(ddg, node.start_byte(), line_of(node), header, sets);
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_block(&body, src, ctx, ddg);
                }
            }
            "try_statement" | "try_with_resources_statement" => {
                self.visit_try(node, src, ctx, ddg)
            }
            _ => {}
        }
    }

    /// Condition-bearing constructs anchor at the construct start, like
    /// their CFG counterparts
    fn anchor_condition(
        &mut self,
        node: Node,
        keyword: &str,
        src: &str,
        ctx: &mut ProcCtx<'a>,
        ddg: &mut Ddg,
    ) {
        let cond = node.child_by_field_name("condition");
        let cond_text = cond.map(|c| node_text(c, src)).unwrap_or("(?)");
        let mut sets = Sets::default();
        if let Some(cond) = cond {
            self.collect(cond, Access::Use, src, ctx, &mut sets);
        }
        self.apply(
            ddg,
            node.start_byte(),
            line_of(node),
            &format!("{keyword} {cond_text}"),
            sets,
        );
    }

    fn visit_local_decl(
        &mut self,
        node: Node,
        pos: usize,
        src: &str,
        ctx: &mut ProcCtx<'a>,
        ddg: &mut Ddg,
    ) {
        let ty = node
            .child_by_field_name("type")
            .map(|t| node_text(t, src))
            .unwrap_or("");
        let mut sets = Sets::default();
        for declarator in children_of_kind(&node, "variable_declarator") {
            if let Some(name) = declarator.child_by_field_name("name") {
                let name = node_text(name, src).to_string();
                ctx.scopes.declare(&name, ty);
                sets.defs.push(name);
            }
            if let Some(value) = declarator.child_by_field_name("value") {
                self.collect(value, Access::Use, src, ctx, &mut sets);
            }
        }
        self.apply(ddg, pos, line_of(node), node_text(node, src), sets);
    }

    fn visit_for(&mut self, node: Node, src: &str, ctx: &mut ProcCtx<'a>, ddg: &mut Ddg) {
        ctx.scopes.push();
        let mut cursor = node.walk();
        let inits: Vec<Node> = node.children_by_field_name("init", &mut cursor).collect();
        for init in inits {
            if init.kind() == "local_variable_declaration" {
                self.visit_local_decl(init, init.start_byte(), src, ctx, ddg);
            } else {
                let mut sets = Sets::default();
                self.collect(init, Access::Use, src, ctx, &mut sets);
                self.apply(ddg, init.start_byte(), line_of(init), node_text(init, src), sets);
            }
        }

        let cond = node.child_by_field_name("condition");
        let cond_text = cond.map(|c| node_text(c, src).to_string()).unwrap_or_default();
        let mut sets = Sets::default();
        if let Some(cond) = cond {
            self.collect(cond, Access::Use, src, ctx, &mut sets);
        }
        self.apply(
            ddg,
            node.start_byte(),
            line_of(node),
            &format!("for ({cond_text})"),
            sets,
        );

        let mut cursor = node.walk();
        let updates: Vec<Node> = node.children_by_field_name("update", &mut cursor).collect();
        for update in updates {
            let mut sets = Sets::default();
            self.collect(update, Access::Use, src, ctx, &mut sets);
            self.apply(
                ddg,
                update.start_byte(),
                line_of(update),
                node_text(update, src),
                sets,
            );
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, src, ctx, ddg);
        }
        ctx.scopes.pop();
    }

    fn visit_enhanced_for(&mut self, node: Node, src: &str, ctx: &mut ProcCtx<'a>, ddg: &mut Ddg) {
        ctx.scopes.push();
        let header = header_text(node, node.child_by_field_name("body"), src);
        let mut sets = Sets::default();
        if let Some(name) = node.child_by_field_name("name") {
            let name = node_text(name, src).to_string();
            let ty = node
                .child_by_field_name("type")
                .map(|t| node_text(t, src))
                .unwrap_or("");
            ctx.scopes.declare(&name, ty);
            sets.defs.push(name);
        }
        if let Some(value) = node.child_by_field_name("value") {
            self.collect(value, Access::Use, src, ctx, &mut sets);
        }
        self.apply(ddg, node.start_byte(), line_of(node), header, sets);
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_stmt(body, src, ctx, ddg);
        }
        ctx.scopes.pop();
    }

    fn visit_try(&mut self, node: Node, src: &str, ctx: &mut ProcCtx<'a>, ddg: &mut Ddg) {
        ctx.scopes.push();
        if let Some(resources) = node.child_by_field_name("resources") {
            for resource in named_children(&resources) {
                if resource.kind() != "resource" {
                    continue;
                }
                let mut sets = Sets::default();
                if let Some(name) = resource.child_by_field_name("name") {
                    let name = node_text(name, src).to_string();
                    let ty = resource
                        .child_by_field_name("type")
                        .map(|t| node_text(t, src))
                        .unwrap_or("");
                    ctx.scopes.declare(&name, ty);
                    sets.defs.push(name);
                } else {
                    // an existing variable used as a resource
                    self.collect(resource, Access::Use, src, ctx, &mut sets);
                }
                if let Some(value) = resource.child_by_field_name("value") {
                    self.collect(value, Access::Use, src, ctx, &mut sets);
                }
                self.apply(
                    ddg,
                    resource.start_byte(),
                    line_of(resource),
                    node_text(resource, src),
                    sets,
                );
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_block(&body, src, ctx, ddg);
        }
        ctx.scopes.pop();

        for clause in children_of_kind(&node, "catch_clause") {
            ctx.scopes.push();
            let mut sets = Sets::default();
            let param_text = child_of_kind(&clause, "catch_formal_parameter")
                .map(|p| node_text(p, src))
                .unwrap_or("(?)");
            if let Some(param) = child_of_kind(&clause, "catch_formal_parameter") {
                if let Some(name) = param.child_by_field_name("name") {
                    let name = node_text(name, src).to_string();
                    let ty = child_of_kind(&param, "catch_type")
                        .map(|t| node_text(t, src))
                        .unwrap_or("");
                    ctx.scopes.declare(&name, ty);
                    sets.defs.push(name);
                }
            }
            self.apply(
                ddg,
                clause.start_byte(),
                line_of(clause),
                &format!("catch ({param_text})"),
                sets,
            );
            if let Some(body) = clause.child_by_field_name("body") {
                self.visit_block(&body, src, ctx, ddg);
            }
            ctx.scopes.pop();
        }

        if let Some(finally) = child_of_kind(&node, "finally_clause") {
            if let Some(body) = child_of_kind(&finally, "block") {
                self.visit_block(&body, src, ctx, ddg);
            }
        }
    }

    // --- expressions ---

    fn collect(
        &mut self,
        node: Node,
        access: Access,
        src: &str,
        ctx: &ProcCtx<'a>,
        out: &mut Sets,
    ) {
        match node.kind() {
            "identifier" => self.push_var(node_text(node, src), access, ctx, out),
            "this" => {}
            "field_access" => {
                let object = node.child_by_field_name("object");
                let field = node.child_by_field_name("field");
                match object {
                    Some(obj) if obj.kind() == "this" => {
                        if let Some(field) = field {
                            self.push_var(node_text(field, src), access, ctx, out);
                        }
                    }
                    Some(obj) => {
                        // writes through another object's field drop the
                        // DEF; the base object is still read
                        self.collect(obj, Access::Use, src, ctx, out);
                    }
                    None => {}
                }
            }
            "array_access" => {
                if let Some(array) = node.child_by_field_name("array") {
                    self.collect(array, access, src, ctx, out);
                }
                if let Some(index) = node.child_by_field_name("index") {
                    self.collect(index, Access::Use, src, ctx, out);
                }
            }
            "assignment_expression" => {
                let compound = node
                    .child_by_field_name("operator")
                    .map(|op| node_text(op, src) != "=")
                    .unwrap_or(false);
                if let Some(left) = node.child_by_field_name("left") {
                    if compound {
                        self.collect(left, Access::Use, src, ctx, out);
                    }
                    self.collect(left, Access::Def, src, ctx, out);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.collect(right, Access::Use, src, ctx, out);
                }
            }
            "update_expression" => {
                if let Some(operand) = named_children(&node).into_iter().next() {
                    self.collect(operand, Access::Use, src, ctx, out);
                    self.collect(operand, Access::Def, src, ctx, out);
                }
            }
            "unary_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.collect(operand, Access::Use, src, ctx, out);
                }
            }
            "binary_expression" => {
                for side in ["left", "right"] {
                    if let Some(child) = node.child_by_field_name(side) {
                        self.collect(child, Access::Use, src, ctx, out);
                    }
                }
            }
            "instanceof_expression" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.collect(left, Access::Use, src, ctx, out);
                }
            }
            "parenthesized_expression" => {
                if let Some(inner) = named_children(&node).into_iter().next() {
                    self.collect(inner, access, src, ctx, out);
                }
            }
            "cast_expression" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.collect(value, Access::Use, src, ctx, out);
                }
            }
            "ternary_expression" => {
                for field in ["condition", "consequence", "alternative"] {
                    if let Some(child) = node.child_by_field_name(field) {
                        self.collect(child, Access::Use, src, ctx, out);
                    }
                }
            }
            "method_invocation" => self.collect_call(node, false, src, ctx, out),
            "object_creation_expression" => self.collect_call(node, true, src, ctx, out),
            "string_literal"
            | "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal"
            | "decimal_floating_point_literal"
            | "hex_floating_point_literal"
            | "character_literal"
            | "true"
            | "false"
            | "null_literal"
            | "class_literal"
            | "type_identifier" => {}
            _ => {
                for child in named_children(&node) {
                    self.collect(child, Access::Use, src, ctx, out);
                }
            }
        }
    }

    fn collect_call(
        &mut self,
        node: Node,
        is_ctor: bool,
        src: &str,
        ctx: &ProcCtx<'a>,
        out: &mut Sets,
    ) {
        let name = if is_ctor {
            node.child_by_field_name("type")
                .map(|t| node_text(t, src).to_string())
        } else {
            node.child_by_field_name("name")
                .map(|n| node_text(n, src).to_string())
        };
        let Some(name) = name else { return };

        let mut receiver_var: Option<String> = None;
        let mut receiver_type: Option<String> = None;
        if !is_ctor {
            match node.child_by_field_name("object") {
                Some(obj) if obj.kind() == "identifier" => {
                    let obj_name = node_text(obj, src);
                    if let Some(ty) = ctx.scopes.lookup(obj_name) {
                        receiver_type = Some(ty.to_string());
                        receiver_var = Some(obj_name.to_string());
                        out.uses.push(obj_name.to_string());
                    } else if let Some((_, f)) = ctx
                        .class
                        .and_then(|ty| self.index.field_in_hierarchy(ty, obj_name))
                    {
                        receiver_type = Some(f.ty.clone());
                        receiver_var = Some(obj_name.to_string());
                        out.uses.push(obj_name.to_string());
                    } else if self.index.type_by_name(obj_name).is_some() {
                        // static call through the type name
                        receiver_type = Some(obj_name.to_string());
                    }
                }
                Some(obj) if obj.kind() == "this" => {
                    receiver_type = Some(ctx.class_name.clone());
                }
                Some(obj) => self.collect(obj, Access::Use, src, ctx, out),
                None => {}
            }
        }

        let mut arg_idents: Vec<Option<String>> = Vec::new();
        let mut arg_types: Vec<Option<String>> = Vec::new();
        if let Some(args) = node.child_by_field_name("arguments") {
            for arg in named_children(&args) {
                self.collect(arg, Access::Use, src, ctx, out);
                let ident = if arg.kind() == "identifier" {
                    let n = node_text(arg, src);
                    self.classify(n, ctx).map(|_| n.to_string())
                } else {
                    None
                };
                arg_idents.push(ident);
                arg_types.push(self.best_effort_type(arg, src, ctx));
            }
        }

        let call = CallDesc {
            name,
            argc: arg_types.len(),
            arg_types,
            receiver_type,
            is_ctor,
        };
        let rctx = ResolveCtx {
            package: &ctx.package,
            class: (!ctx.class_name.is_empty()).then_some(ctx.class_name.as_str()),
        };
        let Some((ty, m)) = self.resolver.resolve_record(&call, rctx) else {
            // unresolved calls assume no state-mutating side effect
            return;
        };
        let key = ty.key_of(&m);
        let observed = self.effects.get(&key).cloned().unwrap_or_default();
        let mutating = m.is_ctor
            || m.return_type.as_deref().map_or(true, |t| t == "void")
            || is_mutator_name(&m.name)
            || observed.mutates_state;
        if mutating {
            if let Some(var) = &receiver_var {
                out.defs.push(var.clone());
            }
            for ident in arg_idents.iter().flatten() {
                out.defs.push(ident.clone());
            }
        } else {
            for (i, ident) in arg_idents.iter().enumerate() {
                if observed.param_defs.contains(&i) {
                    if let Some(var) = ident {
                        out.defs.push(var.clone());
                    }
                }
            }
        }
    }

    fn push_var(&mut self, name: &str, access: Access, ctx: &ProcCtx<'a>, out: &mut Sets) {
        let Some(kind) = self.classify(name, ctx) else {
            // unresolved symbols are dropped silently
            return;
        };
        match access {
            Access::Use => out.uses.push(name.to_string()),
            Access::Def => {
                out.defs.push(name.to_string());
                self.record_effect(&kind, ctx);
            }
        }
    }

    fn classify(&self, name: &str, ctx: &ProcCtx<'a>) -> Option<VarKind> {
        if let Some(i) = ctx.params.iter().position(|p| p == name) {
            return Some(VarKind::Param(i));
        }
        if ctx.scopes.contains(name) {
            return Some(VarKind::Local);
        }
        if let Some(ty) = ctx.class {
            if self.index.field_in_hierarchy(ty, name).is_some() {
                return Some(VarKind::Field);
            }
        }
        None
    }

    /// A DEF against a field or parameter is a side effect of the
    /// enclosing method, visible to its callers on the next pass
    fn record_effect(&mut self, kind: &VarKind, ctx: &ProcCtx<'a>) {
        let Some(key) = &ctx.key else { return };
        let effects = self.effects.entry(key.clone()).or_default();
        match kind {
            VarKind::Field => {
                if !effects.mutates_state {
                    effects.mutates_state = true;
                    self.changed = true;
                }
            }
            VarKind::Param(i) => {
                if effects.param_defs.insert(*i) {
                    self.changed = true;
                }
            }
            VarKind::Local => {}
        }
    }

    fn best_effort_type(&self, arg: Node, src: &str, ctx: &ProcCtx<'a>) -> Option<String> {
        if let Some(ty) = literal_type(arg.kind()) {
            return Some(ty.to_string());
        }
        match arg.kind() {
            "identifier" => {
                let name = node_text(arg, src);
                if let Some(ty) = ctx.scopes.lookup(name) {
                    return Some(ty.to_string());
                }
                ctx.class
                    .and_then(|ty| self.index.field_in_hierarchy(ty, name))
                    .map(|(_, f)| f.ty.clone())
            }
            "object_creation_expression" | "cast_expression" => arg
                .child_by_field_name("type")
                .map(|t| node_text(t, src).to_string()),
            _ => None,
        }
    }

    fn apply(&mut self, ddg: &mut Ddg, pos: usize, line: u32, code: &str, sets: Sets) {
        let id = ddg.node_at(pos, line, code);
        let node = &mut ddg.graph[id];
        for d in sets.defs {
            self.changed |= node.defs.insert(d);
        }
        for u in sets.uses {
            self.changed |= node.uses.insert(u);
        }
        let overlap: Vec<String> = node.defs.intersection(&node.uses).cloned().collect();
        for v in overlap {
            self.changed |= node.self_flows.insert(v);
        }
    }
}
