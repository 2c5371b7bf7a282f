//! Catalog and engine
//!
//! A [`Catalog`] is everything one load pass produced: the namespace tree, the
//! Type Context and a checksum of the batch. [`ModelRegistry`] publishes one
//! catalog at a time. A reload compiles a complete new catalog off to the side
//! and swaps it in only when every definition in the batch compiled; parse
//! callers holding the previous snapshot are unaffected.

use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;
use tracing::{info, warn};

use crate::attribute::ArrayNilPolicy;
use crate::checksum::{BatchChecksum, Checksum};
use crate::compiler::SchemaCompiler;
use crate::config::ModelsConfig;
use crate::discovery::{DirectorySource, SchemaFile, SchemaSource};
use crate::error::{ModelError, Result};
use crate::model::ModelType;
use crate::namespace::NamespaceTree;
use crate::types::{TypeContext, TypeDescriptor, TypeRegistry};
use crate::value::Record;

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug)]
pub struct Catalog {
    namespaces: NamespaceTree,
    types: TypeContext,
    checksum: Checksum,
    definitions: usize,
}

impl Catalog {
    /// A catalog holding only the registry's scalar types
    pub fn empty(registry: &TypeRegistry) -> Self {
        Self {
            namespaces: NamespaceTree::new(),
            types: registry.seed_context(),
            checksum: BatchChecksum::new().finish(),
            definitions: 0,
        }
    }

    /// Compile a whole batch into a fresh catalog. The first failing
    /// definition fails the batch.
    pub fn build(registry: &TypeRegistry, compiler: &SchemaCompiler, batch: &[SchemaFile]) -> Result<Self> {
        let mut namespaces = NamespaceTree::new();
        let mut types = registry.seed_context();
        let mut checksum = BatchChecksum::new();
        let mut definitions = 0;

        for file in batch {
            compiler
                .compile_at(&mut namespaces, &file.segments, &file.definition, &mut types)
                .map_err(|e| ModelError::Source {
                    path: file.location(),
                    source: Box::new(e),
                })?;
            checksum.add(&file.segments, &file.definition)?;
            definitions += file.definition.class_count();
        }

        Ok(Self {
            namespaces,
            types,
            checksum: checksum.finish(),
            definitions,
        })
    }

    /// Model registered under a qualified name such as `Test::TestSchema::Company`
    pub fn model(&self, name: &str) -> Result<Arc<ModelType>> {
        self.types
            .get(name)
            .and_then(|t| t.as_model())
            .cloned()
            .ok_or_else(|| ModelError::ModelNotFound(name.to_string()))
    }

    pub fn parse(&self, name: &str, raw: &Value) -> Result<Option<Record>> {
        Ok(self.model(name)?.parse(raw)?)
    }

    pub fn models(&self) -> impl Iterator<Item = (&str, &Arc<ModelType>)> {
        self.types.models()
    }

    pub fn namespaces(&self) -> &NamespaceTree {
        &self.namespaces
    }

    pub fn types(&self) -> &TypeContext {
        &self.types
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Number of class definitions compiled, nested ones included
    pub fn definitions(&self) -> usize {
        self.definitions
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Process-wide owner of the type registry and the published catalog
#[derive(Debug)]
pub struct ModelRegistry {
    types: RwLock<TypeRegistry>,
    compiler: SchemaCompiler,
    current: RwLock<Arc<Catalog>>,
    writer: Mutex<()>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(TypeRegistry::new(), ArrayNilPolicy::default())
    }
}

impl ModelRegistry {
    pub fn new(types: TypeRegistry, policy: ArrayNilPolicy) -> Self {
        let current = Arc::new(Catalog::empty(&types));
        Self {
            types: RwLock::new(types),
            compiler: SchemaCompiler::new(policy),
            current: RwLock::new(current),
            writer: Mutex::new(()),
        }
    }

    /// Engine with configured built-ins; nothing is loaded yet
    pub fn from_config(config: &ModelsConfig) -> Result<Self> {
        Ok(Self::new(
            TypeRegistry::from_config(&config.types)?,
            config.parsing.array_nil_policy,
        ))
    }

    /// Engine from configuration with the configured schemas directory loaded
    pub fn open(config: &ModelsConfig) -> Result<Self> {
        let engine = Self::from_config(config)?;
        engine.reload(&DirectorySource::from_config(&config.loader)?)?;
        Ok(engine)
    }

    /// Install or replace a scalar type. Takes effect on the next reload.
    pub fn register_type(&self, name: impl Into<String>, descriptor: Arc<dyn TypeDescriptor>) {
        self.types
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .register(name, descriptor);
    }

    /// Snapshot of the type registry
    pub fn type_registry(&self) -> TypeRegistry {
        self.types.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Load a batch from `source` and publish it
    pub fn reload(&self, source: &dyn SchemaSource) -> Result<Arc<Catalog>> {
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let batch = source.load().map_err(|e| {
            warn!(source = %source.describe(), error = %e, "schema batch could not be read; keeping current catalog");
            e
        })?;
        self.publish(&batch)
    }

    /// Compile `batch` and publish it
    pub fn reload_batch(&self, batch: &[SchemaFile]) -> Result<Arc<Catalog>> {
        let _writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        self.publish(batch)
    }

    fn publish(&self, batch: &[SchemaFile]) -> Result<Arc<Catalog>> {
        let registry = self.type_registry();
        let catalog = match Catalog::build(&registry, &self.compiler, batch) {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                warn!(error = %e, "schema batch rejected; keeping current catalog");
                return Err(e);
            }
        };

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = catalog.clone();
        info!(
            files = batch.len(),
            definitions = catalog.definitions(),
            checksum = %catalog.checksum().short(),
            "published model catalog"
        );
        Ok(catalog)
    }

    /// Currently published catalog
    pub fn catalog(&self) -> Arc<Catalog> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn model(&self, name: &str) -> Result<Arc<ModelType>> {
        self.catalog().model(name)
    }

    pub fn parse(&self, name: &str, raw: &Value) -> Result<Option<Record>> {
        self.catalog().parse(name, raw)
    }
}
