//! Declaration Index construction and lookup.

use rustc_hash::FxHashMap;
use tree_sitter::Node;

use crate::features::parsing::syntax::{
    child_of_kind, children_of_kind, has_modifier, line_of, named_children, node_text,
};
use crate::features::parsing::SourceFile;
use crate::shared::models::MethodKey;

use super::types::{FieldRecord, MethodRecord, TypeRecord};

/// Whole-program index of declared types, fields, and methods
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    types: Vec<TypeRecord>,
    by_qualified: FxHashMap<String, usize>,
    by_simple: FxHashMap<String, Vec<usize>>,
}

impl DeclarationIndex {
    /// Build the index from every file of the program in one pass
    pub fn build(files: &[SourceFile]) -> Self {
        let mut index = Self::default();
        for file in files {
            for child in named_children(&file.root()) {
                index.collect_type(child, &file.source, &file.package, None);
            }
        }
        index
    }

    fn collect_type(&mut self, node: Node, source: &str, package: &str, outer: Option<&str>) {
        if !matches!(
            node.kind(),
            "class_declaration" | "interface_declaration" | "enum_declaration"
        ) {
            return;
        }
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let simple = node_text(name_node, source);
        let name = match outer {
            Some(o) => format!("{o}.{simple}"),
            None => simple.to_string(),
        };
        let qualified_name = if package.is_empty() {
            name.clone()
        } else {
            format!("{package}.{name}")
        };

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|sc| named_children(&sc).into_iter().next())
            .map(|t| node_text(t, source).to_string());
        let interfaces = node
            .child_by_field_name("interfaces")
            .and_then(|si| child_of_kind(&si, "type_list"))
            .map(|list| {
                named_children(&list)
                    .iter()
                    .map(|t| node_text(*t, source).to_string())
                    .collect()
            })
            .unwrap_or_default();
        let type_params = node
            .child_by_field_name("type_parameters")
            .map(|tp| {
                children_of_kind(&tp, "type_parameter")
                    .iter()
                    .filter_map(|p| named_children(p).into_iter().next())
                    .map(|id| node_text(id, source).to_string())
                    .collect()
            })
            .unwrap_or_default();

        let mut record = TypeRecord {
            qualified_name,
            package: package.to_string(),
            name: name.clone(),
            superclass,
            interfaces,
            type_params,
            fields: Vec::new(),
            methods: Vec::new(),
        };

        let mut nested = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(&body) {
                match member.kind() {
                    "field_declaration" | "constant_declaration" => {
                        collect_fields(member, source, &mut record.fields);
                    }
                    "method_declaration" => {
                        record.methods.push(method_record(member, source, false));
                    }
                    "constructor_declaration" => {
                        record.methods.push(method_record(member, source, true));
                    }
                    "class_declaration" | "interface_declaration" | "enum_declaration" => {
                        nested.push(member);
                    }
                    "enum_body_declarations" => {
                        for decl in named_children(&member) {
                            match decl.kind() {
                                "field_declaration" => {
                                    collect_fields(decl, source, &mut record.fields)
                                }
                                "method_declaration" => {
                                    record.methods.push(method_record(decl, source, false))
                                }
                                "constructor_declaration" => {
                                    record.methods.push(method_record(decl, source, true))
                                }
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        let idx = self.types.len();
        self.by_qualified.insert(record.qualified_name.clone(), idx);
        self.by_simple
            .entry(simple.to_string())
            .or_default()
            .push(idx);
        self.types.push(record);

        for child in nested {
            self.collect_type(child, source, package, Some(&name));
        }
    }

    pub fn all_types(&self) -> &[TypeRecord] {
        &self.types
    }

    /// Lookup by qualified name, falling back to a unique simple name
    pub fn type_by_name(&self, name: &str) -> Option<&TypeRecord> {
        if let Some(&idx) = self.by_qualified.get(name) {
            return Some(&self.types[idx]);
        }
        let simple = name.rsplit('.').next().unwrap_or(name);
        match self.by_simple.get(simple) {
            Some(idxs) if idxs.len() == 1 => Some(&self.types[idxs[0]]),
            _ => None,
        }
    }

    /// All types sharing a simple name
    pub fn types_named(&self, simple: &str) -> Vec<&TypeRecord> {
        self.by_simple
            .get(simple)
            .map(|idxs| idxs.iter().map(|&i| &self.types[i]).collect())
            .unwrap_or_default()
    }

    /// All declared methods with the given name, program-wide
    pub fn methods_named(&self, name: &str) -> Vec<(&TypeRecord, &MethodRecord)> {
        let mut found = Vec::new();
        for ty in &self.types {
            for m in &ty.methods {
                if !m.is_ctor && m.name == name {
                    found.push((ty, m));
                }
            }
        }
        found
    }

    /// The type itself followed by every indexed supertype, nearest first
    pub fn hierarchy<'a>(&'a self, ty: &'a TypeRecord) -> Vec<&'a TypeRecord> {
        let mut chain = vec![ty];
        let mut current = ty;
        while let Some(sup_name) = &current.superclass {
            let base = crate::features::parsing::syntax::erase_generics(sup_name);
            match self.type_by_name(base) {
                Some(sup) if !chain.iter().any(|t| t.qualified_name == sup.qualified_name) => {
                    chain.push(sup);
                    current = sup;
                }
                _ => break,
            }
        }
        chain
    }

    /// Whether `name` is a field of `ty` or any indexed supertype
    pub fn field_in_hierarchy<'a>(
        &'a self,
        ty: &'a TypeRecord,
        name: &str,
    ) -> Option<(&'a TypeRecord, &'a FieldRecord)> {
        for t in self.hierarchy(ty) {
            if let Some(f) = t.fields.iter().find(|f| f.name == name) {
                return Some((t, f));
            }
        }
        None
    }

    /// Join key for a declared method
    pub fn key_of(&self, ty: &TypeRecord, method: &MethodRecord) -> MethodKey {
        ty.key_of(method)
    }
}

fn collect_fields(node: Node, source: &str, fields: &mut Vec<FieldRecord>) {
    let Some(ty) = node.child_by_field_name("type") else {
        return;
    };
    let ty = node_text(ty, source).to_string();
    let is_static = has_modifier(&node, source, "static");
    for declarator in children_of_kind(&node, "variable_declarator") {
        if let Some(name) = declarator.child_by_field_name("name") {
            fields.push(FieldRecord {
                name: node_text(name, source).to_string(),
                ty: ty.clone(),
                is_static,
            });
        }
    }
}

fn method_record(node: Node, source: &str, is_ctor: bool) -> MethodRecord {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();
    let return_type = if is_ctor {
        None
    } else {
        node.child_by_field_name("type")
            .map(|t| node_text(t, source).to_string())
    };
    let params = node
        .child_by_field_name("parameters")
        .map(|ps| {
            named_children(&ps)
                .iter()
                .filter_map(|p| match p.kind() {
                    "formal_parameter" | "spread_parameter" => p
                        .child_by_field_name("type")
                        .or_else(|| named_children(p).into_iter().next())
                        .map(|t| node_text(t, source).to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    MethodRecord {
        name,
        return_type,
        params,
        line: line_of(node),
        is_static: has_modifier(&node, source, "static"),
        is_abstract: has_modifier(&node, source, "abstract"),
        is_ctor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::JavaParser;

    fn index_of(source: &str) -> DeclarationIndex {
        let mut parser = JavaParser::new().unwrap();
        let file = parser.parse_source("T.java", source.to_string()).unwrap();
        DeclarationIndex::build(std::slice::from_ref(&file))
    }

    #[test]
    fn test_collects_fields_and_methods() {
        let index = index_of(
            "package p;\n\
             class Account {\n\
                 private int balance;\n\
                 static final String BANK = \"b\";\n\
                 Account(int initial) { balance = initial; }\n\
                 int getBalance() { return balance; }\n\
                 void deposit(int amount) { balance += amount; }\n\
             }\n",
        );
        let ty = index.type_by_name("Account").unwrap();
        assert_eq!(ty.qualified_name, "p.Account");
        assert_eq!(ty.fields.len(), 2);
        assert!(ty.fields.iter().any(|f| f.name == "BANK" && f.is_static));
        let ctor = ty.methods.iter().find(|m| m.is_ctor).unwrap();
        assert_eq!(ctor.name, "Account");
        assert_eq!(ctor.return_type, None);
        assert_eq!(ctor.params, vec!["int".to_string()]);
        let deposit = ty.methods.iter().find(|m| m.name == "deposit").unwrap();
        assert_eq!(deposit.return_type.as_deref(), Some("void"));
        assert_eq!(deposit.line, 7);
    }

    #[test]
    fn test_hierarchy_walks_superclass() {
        let index = index_of(
            "class Base { int shared; }\n\
             class Derived extends Base { void m() {} }\n",
        );
        let derived = index.type_by_name("Derived").unwrap();
        let chain = index.hierarchy(derived);
        assert_eq!(chain.len(), 2);
        assert!(index.field_in_hierarchy(derived, "shared").is_some());
        assert!(index.field_in_hierarchy(derived, "missing").is_none());
    }

    #[test]
    fn test_nested_types_get_qualified_names() {
        let index = index_of("package p;\nclass Outer { class Inner { void f() {} } }\n");
        let inner = index.type_by_name("Inner").unwrap();
        assert_eq!(inner.qualified_name, "p.Outer.Inner");
        assert_eq!(inner.name, "Outer.Inner");
    }

    #[test]
    fn test_generic_type_params_recorded() {
        let index = index_of("class Box<T> { T value; T get() { return value; } }\n");
        let boxed = index.type_by_name("Box").unwrap();
        assert_eq!(boxed.type_params, vec!["T".to_string()]);
    }
}
