//! Best-effort call resolution.
//!
//! Resolution order: unique-name match first; else, with no receiver,
//! narrow by declaring package/type plus argument count/types; else,
//! with a known receiver type, narrow by that type's (generic-
//! substituted) method signatures. Misses are never errors — callers
//! degrade to "no additional edge".

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::features::parsing::syntax::{erase_generics, generic_args};
use crate::shared::models::MethodKey;

use super::index::DeclarationIndex;
use super::types::{MethodRecord, TypeRecord};

/// One call site, as much of it as the tracker could see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDesc {
    pub name: String,
    pub argc: usize,
    /// Best-effort argument types; None = unknown (compatible with anything)
    pub arg_types: Vec<Option<String>>,
    /// Best-effort declared type of the receiver, generics included
    pub receiver_type: Option<String>,
    pub is_ctor: bool,
}

/// Where the call syntactically lives
#[derive(Debug, Clone, Copy)]
pub struct ResolveCtx<'a> {
    pub package: &'a str,
    /// Simple name of the enclosing type, when inside one
    pub class: Option<&'a str>,
}

pub struct MethodResolver<'a> {
    index: &'a DeclarationIndex,
}

impl<'a> MethodResolver<'a> {
    pub fn new(index: &'a DeclarationIndex) -> Self {
        Self { index }
    }

    /// Resolve one call site to a method key, or None
    pub fn resolve(&self, call: &CallDesc, ctx: ResolveCtx) -> Option<MethodKey> {
        let resolved = self
            .resolve_record(call, ctx)
            .map(|(ty, m)| ty.key_of(&m));
        if resolved.is_none() {
            debug!(name = %call.name, argc = call.argc, "unresolved call site");
        }
        resolved
    }

    /// Resolve to the full method record (used by DEF/USE heuristics)
    pub fn resolve_record(
        &self,
        call: &CallDesc,
        ctx: ResolveCtx,
    ) -> Option<(&'a TypeRecord, MethodRecord)> {
        if call.is_ctor {
            let ty = self.type_in_scope(erase_generics(&call.name), ctx)?;
            let ctor = self.pick_unique(candidates_of(ty, &call.name, true), call)?;
            return Some((ty, ctor));
        }

        // Unique-name match first
        let all = self.index.methods_named(&call.name);
        if all.len() == 1 {
            let (ty, m) = all[0];
            return Some((ty, m.clone()));
        }

        match &call.receiver_type {
            None => {
                // Narrow by the declaring type's own hierarchy
                let ty = self.type_in_scope(ctx.class?, ctx)?;
                let mut cands = Vec::new();
                for t in self.index.hierarchy(ty) {
                    cands.extend(candidates_of(t, &call.name, false));
                }
                let m = self.pick_unique(cands, call)?;
                let owner = self.owner_of(&m, ty)?;
                Some((owner, m))
            }
            Some(receiver) => {
                let base = erase_generics(receiver);
                let ty = self.type_in_scope(base, ctx)?;
                let subst = substitution(ty, receiver);
                let mut cands = Vec::new();
                for t in self.index.hierarchy(ty) {
                    for m in candidates_of(t, &call.name, false) {
                        cands.push(instantiate(m, &subst));
                    }
                }
                let m = self.pick_unique(cands, call)?;
                let owner = self.owner_of(&m, ty)?;
                Some((owner, m))
            }
        }
    }

    /// Type lookup as seen from the call site: a qualified or unique
    /// simple name wins outright; an ambiguous simple name falls back
    /// to the one match in the caller's own package
    fn type_in_scope(&self, name: &str, ctx: ResolveCtx) -> Option<&'a TypeRecord> {
        if let Some(ty) = self.index.type_by_name(name) {
            return Some(ty);
        }
        let simple = name.rsplit('.').next().unwrap_or(name);
        let mut same_package = self
            .index
            .types_named(simple)
            .into_iter()
            .filter(|t| t.package == ctx.package);
        let first = same_package.next()?;
        same_package.next().is_none().then_some(first)
    }

    /// The hierarchy member that actually declares `m`
    fn owner_of(&self, m: &MethodRecord, start: &'a TypeRecord) -> Option<&'a TypeRecord> {
        self.index
            .hierarchy(start)
            .into_iter()
            .find(|t| t.methods.iter().any(|tm| tm.name == m.name && tm.line == m.line))
    }

    fn pick_unique(&self, cands: Vec<MethodRecord>, call: &CallDesc) -> Option<MethodRecord> {
        let mut matching: Vec<MethodRecord> = cands
            .into_iter()
            .filter(|m| m.params.len() == call.argc && args_compatible(&m.params, &call.arg_types))
            .collect();
        if matching.len() == 1 {
            matching.pop()
        } else {
            None
        }
    }
}

fn candidates_of(ty: &TypeRecord, name: &str, ctor: bool) -> Vec<MethodRecord> {
    if ctor && !ty.name.ends_with(erase_generics(name)) {
        return Vec::new();
    }
    ty.methods
        .iter()
        .filter(|m| m.is_ctor == ctor && (ctor || m.name == name))
        .cloned()
        .collect()
}

/// Type-parameter → type-argument map for a generic receiver
fn substitution(ty: &TypeRecord, receiver: &str) -> FxHashMap<String, String> {
    let args = generic_args(receiver);
    ty.type_params
        .iter()
        .zip(args)
        .map(|(p, a)| (p.clone(), a))
        .collect()
}

/// Textually substitute generic parameters into a method signature
fn instantiate(mut m: MethodRecord, subst: &FxHashMap<String, String>) -> MethodRecord {
    if subst.is_empty() {
        return m;
    }
    for p in &mut m.params {
        if let Some(concrete) = subst.get(p.as_str()) {
            *p = concrete.clone();
        }
    }
    if let Some(ret) = &m.return_type {
        if let Some(concrete) = subst.get(ret.as_str()) {
            m.return_type = Some(concrete.clone());
        }
    }
    m
}

fn args_compatible(params: &[String], args: &[Option<String>]) -> bool {
    params
        .iter()
        .zip(args)
        .all(|(p, a)| type_compatible(p, a.as_deref()))
}

/// Parameter/argument compatibility: unknown arguments match anything,
/// primitive/boxed aliases are equivalent, and any type is compatible
/// with the universal object type.
fn type_compatible(param: &str, arg: Option<&str>) -> bool {
    let Some(arg) = arg else {
        return true;
    };
    let param = erase_generics(param);
    let arg = erase_generics(arg);
    if param == arg {
        return true;
    }
    if param == "Object" || param == "java.lang.Object" {
        return true;
    }
    matches!(
        (unbox(param), unbox(arg)),
        (Some(p), Some(a)) if p == a
    )
}

/// Primitive name for a primitive or boxed type
fn unbox(ty: &str) -> Option<&'static str> {
    match ty {
        "int" | "Integer" | "java.lang.Integer" => Some("int"),
        "long" | "Long" | "java.lang.Long" => Some("long"),
        "short" | "Short" | "java.lang.Short" => Some("short"),
        "byte" | "Byte" | "java.lang.Byte" => Some("byte"),
        "double" | "Double" | "java.lang.Double" => Some("double"),
        "float" | "Float" | "java.lang.Float" => Some("float"),
        "boolean" | "Boolean" | "java.lang.Boolean" => Some("boolean"),
        "char" | "Character" | "java.lang.Character" => Some("char"),
        _ => None,
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

    fn index_of_files(sources: &[(&str, &str)]) -> DeclarationIndex {
        let mut parser = JavaParser::new().unwrap();
        let files: Vec<_> = sources
            .iter()
            .map(|(path, src)| parser.parse_source(path, src.to_string()).unwrap())
            .collect();
        DeclarationIndex::build(&files)
    }

    fn call(name: &str, argc: usize, receiver: Option<&str>) -> CallDesc {
        CallDesc {
            name: name.to_string(),
            argc,
            arg_types: vec![None; argc],
            receiver_type: receiver.map(str::to_string),
            is_ctor: false,
        }
    }

    #[test]
    fn test_unique_name_match() {
        let index = index_of(
            "package p;\n\
             class A { void only(int x) {} }\n\
             class B { void other() {} }\n",
        );
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "p", class: Some("B") };
        let key = resolver.resolve(&call("only", 1, None), ctx).unwrap();
        assert_eq!(key.class, "A");
        assert_eq!(key.name, "only");
    }

    #[test]
    fn test_receiverless_narrows_to_own_hierarchy() {
        let index = index_of(
            "package p;\n\
             class A { void run(int x) {} }\n\
             class B { void run(int x) {} void go() { run(1); } }\n",
        );
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "p", class: Some("B") };
        let key = resolver.resolve(&call("run", 1, None), ctx).unwrap();
        assert_eq!(key.class, "B");
    }

    #[test]
    fn test_receiver_type_disambiguates() {
        let index = index_of(
            "package p;\n\
             class A { void run() {} }\n\
             class B { void run() {} }\n",
        );
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "p", class: Some("C") };
        let key = resolver.resolve(&call("run", 0, Some("A")), ctx).unwrap();
        assert_eq!(key.class, "A");
    }

    #[test]
    fn test_ambiguous_overload_degrades_to_none() {
        let index = index_of(
            "package p;\n\
             class A { void f(int x) {} void f(long x) {} }\n\
             class B { void f(int x) {} }\n",
        );
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "p", class: Some("A") };
        assert!(resolver.resolve(&call("f", 1, None), ctx).is_none());
    }

    #[test]
    fn test_boxed_primitive_equivalence() {
        let index = index_of(
            "package p;\n\
             class A { void f(Integer x) {} void g() {} }\n\
             class B { void f(String x) {} }\n",
        );
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "p", class: Some("C") };
        let mut c = call("f", 1, Some("A"));
        c.arg_types = vec![Some("int".to_string())];
        let key = resolver.resolve(&c, ctx).unwrap();
        assert_eq!(key.class, "A");
    }

    #[test]
    fn test_generic_receiver_substitution() {
        let index = index_of(
            "package p;\n\
             class Box<T> { void put(T value) {} void put(T a, T b) {} }\n\
             class Other { void put(Object o) {} }\n",
        );
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "p", class: Some("C") };
        let mut c = call("put", 1, Some("Box<String>"));
        c.arg_types = vec![Some("String".to_string())];
        let key = resolver.resolve(&c, ctx).unwrap();
        assert_eq!(key.class, "Box");
    }

    #[test]
    fn test_ambiguous_simple_name_narrowed_by_caller_package() {
        let index = index_of_files(&[
            ("a/Dup.java", "package a;\nclass Dup { void ping(int x) {} }"),
            ("b/Dup.java", "package b;\nclass Dup { void ping(int x) {} }"),
        ]);
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "a", class: Some("Caller") };
        let key = resolver.resolve(&call("ping", 1, Some("Dup")), ctx).unwrap();
        assert_eq!(key.package, "a");
        // a caller in an unrelated package cannot pick either
        let far = ResolveCtx { package: "c", class: Some("Caller") };
        assert!(resolver.resolve(&call("ping", 1, Some("Dup")), far).is_none());
    }

    #[test]
    fn test_constructor_resolution() {
        let index = index_of("package p;\nclass A { A(int x) {} A() {} }\n");
        let resolver = MethodResolver::new(&index);
        let ctx = ResolveCtx { package: "p", class: None };
        let mut c = call("A", 1, None);
        c.is_ctor = true;
        let key = resolver.resolve(&c, ctx).unwrap();
        assert_eq!(key.name, "A");
    }
}
