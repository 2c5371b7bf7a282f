//! Type Registry: caller-overridable scalar descriptors
//!
//! The registry outlives individual load passes. Each pass seeds a fresh
//! [`TypeContext`] from it, so a descriptor registered before a load is what
//! that load's schemas resolve to.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::builtin::{BooleanType, DateFormat, DateTimeType, DateType, FloatType, IntegerType, StringType};
use super::context::{TypeContext, TypeRef};
use super::{NilSentinels, TypeDescriptor};
use crate::config::TypesConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    descriptors: BTreeMap<String, Arc<dyn TypeDescriptor>>,
    /// Alias → canonical name; an alias follows re-registrations of its target
    aliases: BTreeMap<String, String>,
    date: Arc<DateType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Registry holding the built-in types, with no sentinels or date formats
    pub fn new() -> Self {
        let date = Arc::new(DateType::new());
        let mut registry = Self {
            descriptors: BTreeMap::new(),
            aliases: BTreeMap::new(),
            date: date.clone(),
        };
        registry.register("boolean", Arc::new(BooleanType::new()));
        registry.register("date", date);
        registry.register("datetime", Arc::new(DateTimeType::new()));
        registry.register("integer", Arc::new(IntegerType::integer()));
        registry.register("PositiveInteger", Arc::new(IntegerType::positive()));
        registry.alias("positive_integer", "PositiveInteger");
        registry.register("float", Arc::new(FloatType::new()));
        registry.register("string", Arc::new(StringType::new()));
        registry
    }

    /// Built-ins configured with nil sentinels and extra date formats
    pub fn from_config(config: &TypesConfig) -> Result<Self> {
        let registry = Self::new();
        for (name, tokens) in &config.nil_sentinels {
            match registry.sentinels_for_config_key(name) {
                Some(sentinels) => tokens.iter().for_each(|t| sentinels.insert(t.clone())),
                None => debug!(type_name = %name, "ignoring nil sentinels for a type without sentinel support"),
            }
        }
        for format in &config.date_formats {
            registry
                .date
                .register_date_format(DateFormat::new(format.template.clone(), &format.regex)?);
        }
        Ok(registry)
    }

    /// Install or replace a descriptor. The last registration for a name wins.
    ///
    /// Aliases of `name` are re-pointed at the new descriptor. Registering
    /// under an alias detaches that alias from its target.
    pub fn register(&mut self, name: impl Into<String>, descriptor: Arc<dyn TypeDescriptor>) {
        let name = name.into();
        self.aliases.remove(&name);
        for (alias, target) in &self.aliases {
            if *target == name {
                self.descriptors.insert(alias.clone(), descriptor.clone());
            }
        }
        self.descriptors.insert(name, descriptor);
    }

    /// Make `alias` resolve to whatever is registered under `target`.
    /// Returns false when `target` is not registered.
    pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> bool {
        let Some(descriptor) = self.descriptors.get(target).cloned() else {
            return false;
        };
        let alias = alias.into();
        self.descriptors.insert(alias.clone(), descriptor);
        self.aliases.insert(alias, target.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TypeDescriptor>> {
        self.descriptors.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Shared sentinel set of the descriptor registered under `name`
    pub fn nil_sentinels(&self, name: &str) -> Option<NilSentinels> {
        self.descriptors
            .get(name)
            .and_then(|d| d.nil_sentinels().cloned())
    }

    /// Config sources may fold key case, so fall back to a case-insensitive match
    fn sentinels_for_config_key(&self, name: &str) -> Option<NilSentinels> {
        self.nil_sentinels(name).or_else(|| {
            self.descriptors
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .and_then(|(_, d)| d.nil_sentinels().cloned())
        })
    }

    /// The built-in Date descriptor, for registering formats
    pub fn date_type(&self) -> Arc<DateType> {
        self.date.clone()
    }

    pub fn register_date_format(&self, template: impl Into<String>, pattern: &str) -> Result<()> {
        self.date.register_date_format(DateFormat::new(template, pattern)?);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    /// A fresh Type Context holding every registered descriptor
    pub fn seed_context(&self) -> TypeContext {
        let mut ctx = TypeContext::new();
        for (name, descriptor) in &self.descriptors {
            ctx.register(name.clone(), TypeRef::Scalar(descriptor.clone()));
        }
        ctx
    }
}
