//! Compiled schemas

use crate::attribute::AttributeSpec;

/// The resolved, immutable attribute list of one model
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    name: String,
    attributes: Vec<AttributeSpec>,
}

impl CompiledSchema {
    pub fn new(name: impl Into<String>, attributes: Vec<AttributeSpec>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Qualified name of the owning model
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
