//! Type Context: every name visible during one compilation pass

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::Value;

use super::TypeDescriptor;
use crate::error::{ModelError, ParseFailure, Result};
use crate::model::ModelType;
use crate::namespace::qualify;
use crate::value::FieldValue;

/// What a type name resolves to
#[derive(Clone)]
pub enum TypeRef {
    /// A scalar descriptor (built-in or caller-registered)
    Scalar(Arc<dyn TypeDescriptor>),
    /// A model compiled from a schema definition
    Model(Arc<ModelType>),
}

impl TypeRef {
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Scalar(d) => d.name(),
            TypeRef::Model(m) => m.qualified_name(),
        }
    }

    pub fn as_model(&self) -> Option<&Arc<ModelType>> {
        match self {
            TypeRef::Model(m) => Some(m),
            TypeRef::Scalar(_) => None,
        }
    }

    /// Coerce one raw value through this type
    pub fn coerce(&self, raw: &Value) -> std::result::Result<FieldValue, ParseFailure> {
        match self {
            TypeRef::Scalar(d) => Ok(d.parse(raw)?),
            TypeRef::Model(m) => Ok(m
                .parse(raw)?
                .map(FieldValue::Record)
                .unwrap_or(FieldValue::Nil)),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(d) => write!(f, "Scalar({})", d.name()),
            TypeRef::Model(m) => write!(f, "Model({})", m.qualified_name()),
        }
    }
}

/// Name → type mapping for one load pass.
///
/// Keys are bare names for scalars and `Namespace::Path::Class` for models.
/// Later registrations under an existing key replace the earlier binding.
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    entries: BTreeMap<String, TypeRef>,
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, type_ref: TypeRef) -> Option<TypeRef> {
        self.entries.insert(key.into(), type_ref)
    }

    pub fn get(&self, key: &str) -> Option<&TypeRef> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resolve a type name referenced from `namespace`.
    ///
    /// The bare name is tried first, so a built-in or global type shadows a
    /// same-named model in the namespace. Only then is
    /// `<namespace>::<name>` tried.
    pub fn lookup(&self, name: &str, namespace: &str) -> Result<TypeRef> {
        if let Some(found) = self.entries.get(name) {
            return Ok(found.clone());
        }
        let key = qualify(namespace, name);
        if let Some(found) = self.entries.get(&key) {
            return Ok(found.clone());
        }
        Err(ModelError::UnknownType {
            name: name.to_string(),
            namespace: if namespace.is_empty() { "the root namespace".to_string() } else { namespace.to_string() },
            suggestion: self.suggest(name),
        })
    }

    /// Closest registered key to `name`
    pub fn suggest(&self, name: &str) -> Option<String> {
        let matcher = SkimMatcherV2::default();
        self.entries
            .keys()
            .filter_map(|key| {
                let tail = key.rsplit("::").next().unwrap_or(key);
                matcher.fuzzy_match(tail, name).map(|score| (score, key))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, key)| key.clone())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Compiled models, keyed by qualified name
    pub fn models(&self) -> impl Iterator<Item = (&str, &Arc<ModelType>)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_model().map(|m| (k.as_str(), m)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntegerType, StringType};

    fn context() -> TypeContext {
        let mut ctx = TypeContext::new();
        ctx.register("integer", TypeRef::Scalar(Arc::new(IntegerType::integer())));
        ctx.register("Test::Code", TypeRef::Scalar(Arc::new(StringType::new())));
        ctx
    }

    #[test]
    fn test_bare_name_resolves_first() {
        let mut ctx = context();
        ctx.register("Test::integer", TypeRef::Scalar(Arc::new(StringType::new())));
        let found = ctx.lookup("integer", "Test").unwrap();
        assert_eq!(found.name(), "integer");
    }

    #[test]
    fn test_falls_back_to_namespace_qualified_key() {
        let ctx = context();
        assert_eq!(ctx.lookup("Code", "Test").unwrap().name(), "string");
        assert!(ctx.lookup("Code", "Other").is_err());
    }

    #[test]
    fn test_unknown_type_is_lookup_error() {
        let ctx = context();
        let err = ctx.lookup("Cod", "Test").unwrap_err();
        assert!(err.is_lookup());
        match err {
            ModelError::UnknownType { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("Test::Code"));
            }
            other => panic!("expected UnknownType, got {:?}", other),
        }
    }

    #[test]
    fn test_registration_overwrites() {
        let mut ctx = context();
        let previous = ctx.register("integer", TypeRef::Scalar(Arc::new(StringType::new())));
        assert!(previous.is_some());
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.lookup("integer", "").unwrap().name(), "string");
    }
}
