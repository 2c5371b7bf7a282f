//! Schema definition input
//!
//! The already-decoded shape of one schema file:
//!
//! ```yaml
//! schema: TestSchema        # optional, descends into a namespace
//! version: "1.0"            # optional, descends into V_1_0
//! definitions:              # optional, compiled before this class
//!   - class: Employee
//!     properties:
//!       - { name: id, path: [id], type: integer }
//! class: Company
//! properties:
//!   - { name: id, path: [id], type: integer }
//!   - { name: employees, path: [employees], type: Employee, array: true }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};

/// One record type, possibly carrying nested definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default, rename = "schema", skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,

    #[serde(default, deserialize_with = "version_text", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, rename = "definitions", skip_serializing_if = "Vec::is_empty")]
    pub nested_definitions: Vec<SchemaDefinition>,

    #[serde(rename = "class")]
    pub class_name: String,

    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

/// One declared attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,

    /// Keys to follow through nested maps
    pub path: Vec<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, rename = "array")]
    pub is_array: bool,
}

impl SchemaDefinition {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            schema_name: None,
            version: None,
            nested_definitions: Vec::new(),
            class_name: class_name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_definition(mut self, nested: SchemaDefinition) -> Self {
        self.nested_definitions.push(nested);
        self
    }

    pub fn with_property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }

    /// Decode a definition from a generic data tree
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ModelError::InvalidDefinition(e.to_string()))
    }

    /// Decode a definition from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Number of class definitions in this tree, itself included
    pub fn class_count(&self) -> usize {
        1 + self
            .nested_definitions
            .iter()
            .map(SchemaDefinition::class_count)
            .sum::<usize>()
    }
}

impl PropertySpec {
    pub fn new<I, S>(name: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            path: path.into_iter().map(Into::into).collect(),
            type_name: None,
            is_array: false,
        }
    }

    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }
}

/// Versions are often written unquoted in YAML (`version: 1.2`)
fn version_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_from_value() {
        let def = SchemaDefinition::from_value(json!({
            "schema": "TestSchema",
            "version": 1.2,
            "definitions": [
                {"class": "Employee", "properties": [{"name": "id", "path": ["id"], "type": "integer"}]}
            ],
            "class": "Company",
            "properties": [
                {"name": "employees", "path": ["employees"], "type": "Employee", "array": true}
            ]
        }))
        .unwrap();

        assert_eq!(def.schema_name.as_deref(), Some("TestSchema"));
        assert_eq!(def.version.as_deref(), Some("1.2"));
        assert_eq!(def.nested_definitions[0].class_name, "Employee");
        assert!(def.properties[0].is_array);
        assert_eq!(def.class_count(), 2);
    }

    #[test]
    fn test_defaults() {
        let def = SchemaDefinition::from_yaml("class: Empty\n").unwrap();
        assert!(def.properties.is_empty());
        assert!(def.nested_definitions.is_empty());

        let prop: PropertySpec = serde_yaml::from_str("{name: a, path: [a]}").unwrap();
        assert!(!prop.is_array);
        assert!(prop.type_name.is_none());
    }

    #[test]
    fn test_class_is_required() {
        let err = SchemaDefinition::from_value(json!({"properties": []})).unwrap_err();
        assert!(matches!(err, ModelError::InvalidDefinition(_)));
    }

    #[test]
    fn test_builder() {
        let def = SchemaDefinition::new("Company")
            .with_schema("TestSchema")
            .with_property(PropertySpec::new("id", ["id"]).typed("integer"));
        assert_eq!(def.properties[0].type_name.as_deref(), Some("integer"));
    }
}
