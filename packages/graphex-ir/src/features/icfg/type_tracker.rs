//! Call-site annotation against the Declaration Index.
//!
//! Companion pass to CFG construction: walks the same statement
//! anchors with a scope stack of name → best-effort declared type,
//! resolves every invocation it can, and stores the outcome on the
//! matching CFG node. Misses become `Unresolved` markers, never
//! errors.

use tree_sitter::Node;

use crate::features::declarations::{
    CallDesc, DeclarationIndex, MethodResolver, ResolveCtx, TypeRecord,
};
use crate::features::parsing::syntax::{
    child_of_kind, children_of_kind, literal_type, named_children, node_text,
};
use crate::features::parsing::SourceFile;
use crate::shared::models::{CallTarget, Cfg, CfLink};
use crate::shared::utils::TypeScopes;

struct TrackCtx<'a> {
    package: String,
    class: Option<&'a TypeRecord>,
    class_name: String,
    scopes: TypeScopes,
}

pub struct TypeTracker<'a> {
    index: &'a DeclarationIndex,
    resolver: MethodResolver<'a>,
}

impl<'a> TypeTracker<'a> {
    pub fn new(index: &'a DeclarationIndex) -> Self {
        Self {
            index,
            resolver: MethodResolver::new(index),
        }
    }

    /// Annotate every call-bearing node of `cfg` with its targets
    pub fn annotate(&self, file: &SourceFile, cfg: &mut Cfg) {
        for child in named_children(&file.root()) {
            self.visit_type(child, file, cfg, None);
        }
    }

    fn visit_type(&self, node: Node, file: &SourceFile, cfg: &mut Cfg, outer: Option<&str>) {
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
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let record = self.index.type_by_name(&qualified);
        self.visit_members(&body, file, cfg, record, &class_name);
    }

    fn visit_members(
        &self,
        body: &Node,
        file: &SourceFile,
        cfg: &mut Cfg,
        record: Option<&'a TypeRecord>,
        class_name: &str,
    ) {
        for member in named_children(body) {
            match member.kind() {
                "method_declaration" | "constructor_declaration" | "static_initializer" => {
                    let mut ctx = TrackCtx {
                        package: file.package.clone(),
                        class: record,
                        class_name: class_name.to_string(),
                        scopes: TypeScopes::new(),
                    };
                    if let Some(params) = member.child_by_field_name("parameters") {
                        for p in named_children(&params) {
                            if p.kind() != "formal_parameter" && p.kind() != "spread_parameter" {
                                continue;
                            }
                            let name = p.child_by_field_name("name").or_else(|| {
                                child_of_kind(&p, "variable_declarator")
                                    .and_then(|d| d.child_by_field_name("name"))
                            });
                            let ty = p.child_by_field_name("type");
                            if let (Some(name), Some(ty)) = (name, ty) {
                                ctx.scopes.declare(
                                    node_text(name, &file.source),
                                    node_text(ty, &file.source),
                                );
                            }
                        }
                    }
                    let body = member
                        .child_by_field_name("body")
                        .or_else(|| child_of_kind(&member, "block"));
                    if let Some(body) = body {
                        self.visit_block(&body, &file.source, &mut ctx, cfg);
                    }
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    self.visit_type(member, file, cfg, Some(class_name));
                }
                "enum_body_declarations" => {
                    self.visit_members(&member, file, cfg, record, class_name);
                }
                _ => {}
            }
        }
    }

    fn visit_block(&self, block: &Node, src: &str, ctx: &mut TrackCtx<'a>, cfg: &mut Cfg) {
        ctx.scopes.push();
        for stmt in named_children(block) {
            self.visit_stmt(stmt, src, ctx, cfg);
        }
        ctx.scopes.pop();
    }

    fn visit_stmt(&self, node: Node, src: &str, ctx: &mut TrackCtx<'a>, cfg: &mut Cfg) {
        match node.kind() {
            "block" | "constructor_body" => self.visit_block(&node, src, ctx, cfg),
            "expression_statement"
            | "return_statement"
            | "throw_statement"
            | "yield_statement"
            | "assert_statement"
            | "explicit_constructor_invocation" => {
                self.annotate_calls(node, node, src, ctx, cfg);
            }
            "local_variable_declaration" => {
                self.declare_locals(node, src, ctx);
                self.annotate_calls(node, node, src, ctx, cfg);
            }
            "if_statement" | "while_statement" | "do_statement" | "switch_expression" => {
                if let Some(cond) = node.child_by_field_name("condition") {
                    self.annotate_calls(node, cond, src, ctx, cfg);
                }
                match node.kind() {
                    "if_statement" => {
                        if let Some(then) = node.child_by_field_name("consequence") {
                            self.visit_stmt(then, src, ctx, cfg);
                        }
                        if let Some(alt) = node.child_by_field_name("alternative") {
                            self.visit_stmt(alt, src, ctx, cfg);
                        }
                    }
                    "switch_expression" => {
                        if let Some(body) = node.child_by_field_name("body") {
                            for group in named_children(&body) {
                                ctx.scopes.push();
                                for stmt in named_children(&group) {
                                    if stmt.kind() != "switch_label" {
                                        self.visit_stmt(stmt, src, ctx, cfg);
                                    }
                                }
                                ctx.scopes.pop();
                            }
                        }
                    }
                    _ => {
                        if let Some(body) = node.child_by_field_name("body") {
                            self.visit_stmt(body, src, ctx, cfg);
                        }
                    }
                }
            }
            "for_statement" => {
                ctx.scopes.push();
                let mut cursor = node.walk();
                let inits: Vec<Node> = node.children_by_field_name("init", &mut cursor).collect();
                for init in inits {
                    if init.kind() == "local_variable_declaration" {
                        self.declare_locals(init, src, ctx);
                    }
                    self.annotate_calls(init, init, src, ctx, cfg);
                }
                if let Some(cond) = node.child_by_field_name("condition") {
                    self.annotate_calls(node, cond, src, ctx, cfg);
                }
                let mut cursor = node.walk();
                let updates: Vec<Node> =
                    node.children_by_field_name("update", &mut cursor).collect();
                for update in updates {
                    self.annotate_calls(update, update, src, ctx, cfg);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_stmt(body, src, ctx, cfg);
                }
                ctx.scopes.pop();
            }
            "enhanced_for_statement" => {
                ctx.scopes.push();
                if let (Some(name), Some(ty)) = (
                    node.child_by_field_name("name"),
                    node.child_by_field_name("type"),
                ) {
                    ctx.scopes.declare(node_text(name, src), node_text(ty, src));
                }
                if let Some(value) = node.child_by_field_name("value") {
                    self.annotate_calls(node, value, src, ctx, cfg);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_stmt(body, src, ctx, cfg);
                }
                ctx.scopes.pop();
            }
            "labeled_statement" => {
                if let Some(inner) = named_children(&node)
                    .into_iter()
                    .find(|c| c.kind() != "identifier")
                {
                    self.visit_stmt(inner, src, ctx, cfg);
                }
            }
            "synchronized_statement" => {
                if let Some(monitor) = child_of_kind(&node, "parenthesized_expression") {
                    self.annotate_calls(node, monitor, src, ctx, cfg);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_block(&body, src, ctx, cfg);
                }
            }
            "try_statement" | "try_with_resources_statement" => {
                ctx.scopes.push();
                if let Some(resources) = node.child_by_field_name("resources") {
                    for resource in named_children(&resources) {
                        if let (Some(name), Some(ty)) = (
                            resource.child_by_field_name("name"),
                            resource.child_by_field_name("type"),
                        ) {
                            ctx.scopes.declare(node_text(name, src), node_text(ty, src));
                        }
                        self.annotate_calls(resource, resource, src, ctx, cfg);
                    }
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_block(&body, src, ctx, cfg);
                }
                ctx.scopes.pop();
                for clause in children_of_kind(&node, "catch_clause") {
                    ctx.scopes.push();
                    if let Some(param) = child_of_kind(&clause, "catch_formal_parameter") {
                        if let Some(name) = param.child_by_field_name("name") {
                            let ty = child_of_kind(&param, "catch_type")
                                .map(|t| node_text(t, src))
                                .unwrap_or("");
                            ctx.scopes.declare(node_text(name, src), ty);
                        }
                    }
                    if let Some(body) = clause.child_by_field_name("body") {
                        self.visit_block(&body, src, ctx, cfg);
                    }
                    ctx.scopes.pop();
                }
                if let Some(finally) = child_of_kind(&node, "finally_clause") {
                    if let Some(body) = child_of_kind(&finally, "block") {
                        self.visit_block(&body, src, ctx, cfg);
                    }
                }
            }
            _ => {}
        }
    }

    fn declare_locals(&self, node: Node, src: &str, ctx: &mut TrackCtx<'a>) {
        let ty = node
            .child_by_field_name("type")
            .map(|t| node_text(t, src))
            .unwrap_or("");
        for declarator in children_of_kind(&node, "variable_declarator") {
            if let Some(name) = declarator.child_by_field_name("name") {
                ctx.scopes.declare(node_text(name, src), ty);
            }
        }
    }

    /// Resolve all invocations under `subtree` and store the outcome on
    /// the CFG node anchored at `anchor`'s position
    fn annotate_calls(
        &self,
        anchor: Node,
        subtree: Node,
        src: &str,
        ctx: &TrackCtx<'a>,
        cfg: &mut Cfg,
    ) {
        let mut targets = Vec::new();
        self.scan(subtree, src, ctx, &mut targets);
        if targets.is_empty() {
            return;
        }
        let Some(&id) = cfg.node_by_pos.get(&anchor.start_byte()) else {
            return;
        };
        let node = &mut cfg.graph[id];
        // entry nodes keep their entry metadata
        if matches!(node.link, CfLink::None) {
            node.link = CfLink::Calls(targets);
        }
    }

    fn scan(&self, node: Node, src: &str, ctx: &TrackCtx<'a>, out: &mut Vec<CallTarget>) {
        match node.kind() {
            "method_invocation" => {
                // arguments may contain nested calls; record them first
                if let Some(args) = node.child_by_field_name("arguments") {
                    self.scan(args, src, ctx, out);
                }
                if let Some(obj) = node.child_by_field_name("object") {
                    self.scan(obj, src, ctx, out);
                }
                out.push(self.resolve_invocation(node, src, ctx));
            }
            "object_creation_expression" => {
                if let Some(args) = node.child_by_field_name("arguments") {
                    self.scan(args, src, ctx, out);
                }
                out.push(self.resolve_creation(node, src, ctx));
            }
            "explicit_constructor_invocation" => {
                if let Some(args) = node.child_by_field_name("arguments") {
                    self.scan(args, src, ctx, out);
                }
                out.push(self.resolve_explicit_ctor(node, src, ctx));
            }
            _ => {
                for child in named_children(&node) {
                    self.scan(child, src, ctx, out);
                }
            }
        }
    }

    fn resolve_invocation(&self, node: Node, src: &str, ctx: &TrackCtx<'a>) -> CallTarget {
        let Some(name) = node.child_by_field_name("name") else {
            return CallTarget::Unresolved;
        };
        let receiver_type = node
            .child_by_field_name("object")
            .and_then(|obj| self.type_of(obj, src, ctx));
        let call = CallDesc {
            name: node_text(name, src).to_string(),
            argc: self.arg_count(node),
            arg_types: self.arg_types(node, src, ctx),
            receiver_type,
            is_ctor: false,
        };
        self.resolve(&call, ctx)
    }

    fn resolve_creation(&self, node: Node, src: &str, ctx: &TrackCtx<'a>) -> CallTarget {
        let Some(ty) = node.child_by_field_name("type") else {
            return CallTarget::Unresolved;
        };
        let call = CallDesc {
            name: node_text(ty, src).to_string(),
            argc: self.arg_count(node),
            arg_types: self.arg_types(node, src, ctx),
            receiver_type: None,
            is_ctor: true,
        };
        self.resolve(&call, ctx)
    }

    /// this(...) targets a sibling constructor; super(...) the
    /// superclass constructor
    fn resolve_explicit_ctor(&self, node: Node, src: &str, ctx: &TrackCtx<'a>) -> CallTarget {
        let is_super = node_text(node, src).trim_start().starts_with("super");
        let target_type = if is_super {
            ctx.class.and_then(|ty| ty.superclass.clone())
        } else {
            ctx.class_name.rsplit('.').next().map(str::to_string)
        };
        let Some(name) = target_type else {
            return CallTarget::Unresolved;
        };
        let call = CallDesc {
            name,
            argc: self.arg_count(node),
            arg_types: self.arg_types(node, src, ctx),
            receiver_type: None,
            is_ctor: true,
        };
        self.resolve(&call, ctx)
    }

    fn resolve(&self, call: &CallDesc, ctx: &TrackCtx<'a>) -> CallTarget {
        let rctx = ResolveCtx {
            package: &ctx.package,
            class: (!ctx.class_name.is_empty()).then_some(ctx.class_name.as_str()),
        };
        match self.resolver.resolve(call, rctx) {
            Some(key) => CallTarget::Resolved(key),
            None => CallTarget::Unresolved,
        }
    }

    fn arg_count(&self, node: Node) -> usize {
        node.child_by_field_name("arguments")
            .map(|args| named_children(&args).len())
            .unwrap_or(0)
    }

    fn arg_types(&self, node: Node, src: &str, ctx: &TrackCtx<'a>) -> Vec<Option<String>> {
        let Some(args) = node.child_by_field_name("arguments") else {
            return Vec::new();
        };
        named_children(&args)
            .iter()
            .map(|arg| {
                if let Some(ty) = literal_type(arg.kind()) {
                    return Some(ty.to_string());
                }
                match arg.kind() {
                    "identifier" => ctx.scopes.lookup(node_text(*arg, src)).map(str::to_string),
                    "object_creation_expression" | "cast_expression" => arg
                        .child_by_field_name("type")
                        .map(|t| node_text(t, src).to_string()),
                    _ => None,
                }
            })
            .collect()
    }

    fn type_of(&self, obj: Node, src: &str, ctx: &TrackCtx<'a>) -> Option<String> {
        match obj.kind() {
            "identifier" => {
                let name = node_text(obj, src);
                if let Some(ty) = ctx.scopes.lookup(name) {
                    return Some(ty.to_string());
                }
                if let Some((_, f)) = ctx
                    .class
                    .and_then(|ty| self.index.field_in_hierarchy(ty, name))
                {
                    return Some(f.ty.clone());
                }
                // a bare type name means a static call
                self.index.type_by_name(name).map(|_| name.to_string())
            }
            "this" => Some(ctx.class_name.clone()),
            "field_access" => {
                let object = obj.child_by_field_name("object")?;
                let field = obj.child_by_field_name("field")?;
                if object.kind() == "this" {
                    let name = node_text(field, src);
                    return ctx
                        .class
                        .and_then(|ty| self.index.field_in_hierarchy(ty, name))
                        .map(|(_, f)| f.ty.clone());
                }
                None
            }
            "object_creation_expression" => obj
                .child_by_field_name("type")
                .map(|t| node_text(t, src).to_string()),
            _ => None,
        }
    }
}
