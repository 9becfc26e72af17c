//! Small helpers over tree-sitter nodes.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use tree_sitter::Node;

/// Best-effort static types of literal expressions, by grammar kind
static LITERAL_TYPES: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = FxHashMap::default();
    m.insert("decimal_integer_literal", "int");
    m.insert("hex_integer_literal", "int");
    m.insert("octal_integer_literal", "int");
    m.insert("binary_integer_literal", "int");
    m.insert("decimal_floating_point_literal", "double");
    m.insert("hex_floating_point_literal", "double");
    m.insert("string_literal", "String");
    m.insert("character_literal", "char");
    m.insert("true", "boolean");
    m.insert("false", "boolean");
    m
});

/// Declared type of a literal node kind, when one is known
pub fn literal_type(kind: &str) -> Option<&'static str> {
    LITERAL_TYPES.get(kind).copied()
}

/// Verbatim source text of a node
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// 1-based line number of a node's first character
pub fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Named children, collected (tree-sitter iterators need a cursor)
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named children of a given kind
pub fn children_of_kind<'t>(node: &Node<'t>, kind: &str) -> Vec<Node<'t>> {
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() == kind)
        .collect()
}

/// First named child of a given kind
pub fn child_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

/// Whether a `modifiers` child contains the given keyword
pub fn has_modifier(node: &Node, source: &str, modifier: &str) -> bool {
    child_of_kind(node, "modifiers")
        .map(|m| {
            node_text(m, source)
                .split_whitespace()
                .any(|tok| tok == modifier)
        })
        .unwrap_or(false)
}

/// Source text of a statement header: everything up to its body child.
///
/// Used for control-flow nodes whose verbatim text would otherwise
/// include the whole nested body.
pub fn header_text<'a>(node: Node, body: Option<Node>, source: &'a str) -> &'a str {
    let end = body.map(|b| b.start_byte()).unwrap_or(node.end_byte());
    source[node.start_byte()..end].trim_end()
}

/// Strip generic type arguments: `List<String>` → `List`
pub fn erase_generics(ty: &str) -> &str {
    match ty.find('<') {
        Some(idx) => ty[..idx].trim_end(),
        None => ty,
    }
}

/// Generic type arguments: `Map<String, Integer>` → ["String", "Integer"]
pub fn generic_args(ty: &str) -> Vec<String> {
    let Some(open) = ty.find('<') else {
        return Vec::new();
    };
    let Some(close) = ty.rfind('>') else {
        return Vec::new();
    };
    let inner = &ty[open + 1..close];
    // Split on top-level commas only (nested generics stay intact)
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        args.push(last.to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erase_generics() {
        assert_eq!(erase_generics("List<String>"), "List");
        assert_eq!(erase_generics("int"), "int");
    }

    #[test]
    fn test_generic_args_nested() {
        assert_eq!(
            generic_args("Map<String, List<Integer>>"),
            vec!["String".to_string(), "List<Integer>".to_string()]
        );
        assert!(generic_args("String").is_empty());
    }
}
