pub mod type_scopes;

pub use type_scopes::TypeScopes;
