//! Scalar type descriptors
//!
//! A [`TypeDescriptor`] turns one raw scalar into a [`FieldValue`] or rejects
//! it with a [`CoercionError`]. The built-ins live in [`builtin`]; callers can
//! register their own through [`TypeRegistry`].

pub mod builtin;
pub mod context;
pub mod registry;

pub use builtin::{BooleanType, DateFormat, DateTimeType, DateType, FloatType, IntegerType, StringType};
pub use context::{TypeContext, TypeRef};
pub use registry::TypeRegistry;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::CoercionError;
use crate::value::FieldValue;

/// A named scalar coercion unit
pub trait TypeDescriptor: Send + Sync + fmt::Debug {
    /// Name used in error messages
    fn name(&self) -> &str;

    /// Coerce a raw value. Blank input usually yields `FieldValue::Nil`.
    fn parse(&self, raw: &Value) -> Result<FieldValue, CoercionError>;

    /// Whether `raw` holds a value this type can coerce
    fn is_valid(&self, raw: &Value) -> bool;

    /// Tokens treated as "no value", if this type supports them
    fn nil_sentinels(&self) -> Option<&NilSentinels> {
        None
    }
}

/// Shared, mutable set of textual nil tokens.
///
/// Clones share the same set, so sentinels added through any handle are seen
/// by every parse that goes through the owning descriptor.
#[derive(Debug, Clone, Default)]
pub struct NilSentinels(Arc<RwLock<BTreeSet<String>>>);

impl NilSentinels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>) {
        let mut set = self.0.write().unwrap_or_else(|e| e.into_inner());
        set.insert(token.into());
    }

    pub fn remove(&self, token: &str) -> bool {
        let mut set = self.0.write().unwrap_or_else(|e| e.into_inner());
        set.remove(token)
    }

    pub fn clear(&self) {
        self.0.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Only string inputs can match a sentinel
    pub fn matches(&self, raw: &Value) -> bool {
        match raw {
            Value::String(s) => self.0.read().unwrap_or_else(|e| e.into_inner()).contains(s),
            _ => false,
        }
    }

    pub fn tokens(&self) -> Vec<String> {
        self.0.read().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }
}

/// Null, `false`, whitespace-only strings, and empty collections
pub fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Textual form of a raw value
pub fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
