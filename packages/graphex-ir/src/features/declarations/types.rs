//! Declaration records.

use serde::{Deserialize, Serialize};

use crate::shared::models::MethodKey;

/// One declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    pub ty: String,
    pub is_static: bool,
}

/// One declared method or constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    /// None for constructors
    pub return_type: Option<String>,
    /// Declared parameter types, in order
    pub params: Vec<String>,
    pub line: u32,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_ctor: bool,
}

/// One declared type (class, interface, or enum)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    /// package.Outer.Inner
    pub qualified_name: String,
    pub package: String,
    /// Simple name (Outer.Inner for nested types)
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    /// Declared generic type parameters, e.g. ["K", "V"]
    pub type_params: Vec<String>,
    pub fields: Vec<FieldRecord>,
    pub methods: Vec<MethodRecord>,
}

impl TypeRecord {
    /// Join key for one of this type's methods
    pub fn key_of(&self, method: &MethodRecord) -> MethodKey {
        MethodKey {
            package: self.package.clone(),
            class: self.name.clone(),
            name: method.name.clone(),
            line: method.line,
        }
    }
}
