//! Scope stack of name → best-effort declared type.
//!
//! Tracks nested lexical scopes during statement traversal; a scope is
//! pushed on block/loop/try/switch entry and restored on exit.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct TypeScopes {
    scopes: Vec<FxHashMap<String, String>>,
}

impl TypeScopes {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Enter a nested scope
    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Leave the current scope, dropping its declarations
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Record a declaration in the current scope
    pub fn declare(&mut self, name: impl Into<String>, ty: impl Into<String>) {
        if let Some(top) = self.scopes.last_mut() {
            top.insert(name.into(), ty.into());
        }
    }

    /// Innermost declared type for `name`
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).map(String::as_str))
    }

    /// Whether `name` is declared in any active scope
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Execute a closure within a nested scope
    pub fn with_scope<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.push();
        let result = f(self);
        self.pop();
        result
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut scopes = TypeScopes::new();
        scopes.declare("x", "int");
        scopes.push();
        scopes.declare("x", "String");
        assert_eq!(scopes.lookup("x"), Some("String"));
        scopes.pop();
        assert_eq!(scopes.lookup("x"), Some("int"));
    }

    #[test]
    fn test_pop_restores_declarations() {
        let mut scopes = TypeScopes::new();
        scopes.push();
        scopes.declare("buf", "StringBuilder");
        scopes.pop();
        assert!(!scopes.contains("buf"));
    }

    #[test]
    fn test_with_scope() {
        let mut scopes = TypeScopes::new();
        scopes.declare("a", "long");
        let inner = scopes.with_scope(|s| {
            s.declare("b", "int");
            s.contains("a") && s.contains("b")
        });
        assert!(inner);
        assert!(!scopes.contains("b"));
    }
}
