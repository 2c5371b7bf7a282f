//! Schema Compiler
//!
//! Turns a [`SchemaDefinition`] tree into [`ModelType`]s registered in a
//! [`TypeContext`] under namespace-qualified names.
//!
//! Compilation is eager and nested-first: every nested definition is compiled
//! before the class that declares it, and every type reference is resolved
//! before the class is registered. A bad reference therefore fails at load
//! time, and the failing class is never bound.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::attribute::{ArrayNilPolicy, AttributeSpec};
use crate::definition::{PropertySpec, SchemaDefinition};
use crate::error::{ModelError, Result};
use crate::model::ModelType;
use crate::namespace::{qualify, to_namespace_ident, version_segment, NamespaceId, NamespaceTree, SEPARATOR};
use crate::schema::CompiledSchema;
use crate::types::{TypeContext, TypeRef};

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCompiler {
    policy: ArrayNilPolicy,
}

impl SchemaCompiler {
    pub fn new(policy: ArrayNilPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ArrayNilPolicy {
        self.policy
    }

    /// Resolve `segments` from the root of `tree`, then compile `definition`
    /// there.
    pub fn compile_at<S: AsRef<str>>(
        &self,
        tree: &mut NamespaceTree,
        segments: &[S],
        definition: &SchemaDefinition,
        ctx: &mut TypeContext,
    ) -> Result<Arc<ModelType>> {
        let namespace = tree.namespace_for(tree.root(), segments)?;
        self.compile(tree, namespace, definition, ctx)
    }

    /// Compile `definition` and its nested definitions under `namespace`.
    ///
    /// Returns the model for the definition's own class.
    pub fn compile(
        &self,
        tree: &mut NamespaceTree,
        namespace: NamespaceId,
        definition: &SchemaDefinition,
        ctx: &mut TypeContext,
    ) -> Result<Arc<ModelType>> {
        let namespace = self.descend(tree, namespace, definition)?;

        for nested in &definition.nested_definitions {
            self.compile(tree, namespace, nested, ctx)?;
        }

        let class_name = class_name(definition)?;
        let ns_name = tree.get(namespace).qualified_name().to_string();
        let key = qualify(&ns_name, class_name);
        if let Some(TypeRef::Scalar(_)) = ctx.get(&key) {
            return Err(ModelError::InvalidDefinition(format!(
                "class '{}' would replace the scalar type of the same name",
                key
            )));
        }

        let attributes = self.build_attributes(&key, &ns_name, &definition.properties, ctx)?;
        let model = Arc::new(ModelType::new(
            class_name,
            ns_name,
            CompiledSchema::new(key.clone(), attributes),
            self.policy,
        ));

        if ctx.register(key.clone(), TypeRef::Model(model.clone())).is_some() {
            debug!(model = %key, "replacing previously registered type");
        }
        tree.bind(namespace, class_name, &key);

        info!(model = %key, attributes = model.schema().len(), "compiled schema definition");
        Ok(model)
    }

    /// Step into the `schema` and then the `version` namespace, if declared
    fn descend(
        &self,
        tree: &mut NamespaceTree,
        mut namespace: NamespaceId,
        definition: &SchemaDefinition,
    ) -> Result<NamespaceId> {
        if let Some(schema) = non_blank(definition.schema_name.as_deref()) {
            namespace = tree.find_or_create(namespace, &to_namespace_ident(schema)?);
        }
        if let Some(version) = non_blank(definition.version.as_deref()) {
            namespace = tree.find_or_create(namespace, &version_segment(version));
        }
        Ok(namespace)
    }

    fn build_attributes(
        &self,
        owner: &str,
        namespace: &str,
        properties: &[PropertySpec],
        ctx: &TypeContext,
    ) -> Result<Vec<AttributeSpec>> {
        let mut seen = BTreeSet::new();
        let mut attributes = Vec::with_capacity(properties.len());

        for property in properties {
            if property.name.trim().is_empty() {
                return Err(ModelError::InvalidDefinition(format!("{} declares a property without a name", owner)));
            }
            if !seen.insert(property.name.as_str()) {
                return Err(ModelError::InvalidDefinition(format!(
                    "{} declares property '{}' more than once",
                    owner, property.name
                )));
            }
            if property.path.is_empty() {
                return Err(ModelError::InvalidDefinition(format!(
                    "property '{}' of {} has an empty path",
                    property.name, owner
                )));
            }

            let mut attribute =
                AttributeSpec::new(property.name.clone(), property.path.clone()).array(property.is_array);
            if let Some(type_name) = non_blank(property.type_name.as_deref()) {
                attribute = attribute.with_type(ctx.lookup(type_name, namespace)?);
            }
            attributes.push(attribute);
        }

        Ok(attributes)
    }
}

fn class_name(definition: &SchemaDefinition) -> Result<&str> {
    let name = definition.class_name.trim();
    if name.is_empty() {
        return Err(ModelError::InvalidDefinition("definition without a class name".to_string()));
    }
    if name.contains(SEPARATOR) {
        return Err(ModelError::InvalidDefinition(format!(
            "class name '{}' must not contain '{}'",
            name, SEPARATOR
        )));
    }
    Ok(name)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
