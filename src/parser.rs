//! Document Parser
//!
//! Drives every attribute of a [`CompiledSchema`] over one raw input. The
//! first failing attribute aborts the whole parse; a partially filled
//! [`Document`] is never handed out.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::attribute::ArrayNilPolicy;
use crate::error::{ParseError, ParseFailure};
use crate::schema::CompiledSchema;
use crate::value::FieldValue;

/// Ordered result of applying a compiled schema to one raw input
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    attributes: Vec<(String, FieldValue)>,
}

impl Document {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn into_attributes(self) -> Vec<(String, FieldValue)> {
        self.attributes
    }
}

#[derive(Debug, Clone)]
pub struct DocumentParser {
    schema: Arc<CompiledSchema>,
    policy: ArrayNilPolicy,
}

impl DocumentParser {
    pub fn new(schema: Arc<CompiledSchema>, policy: ArrayNilPolicy) -> Self {
        Self { schema, policy }
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    pub fn parse(&self, raw: &Value) -> Result<Document, ParseError> {
        let mut attributes = Vec::with_capacity(self.schema.len());

        for attribute in self.schema.attributes() {
            match attribute.resolve(raw, self.policy) {
                Ok(value) => attributes.push((attribute.name.clone(), value)),
                Err(cause) => {
                    let err = ParseError {
                        attribute: attribute.name.clone(),
                        owner: self.schema.name().to_string(),
                        path: attribute.path.clone(),
                        raw_input: raw.clone(),
                        cause,
                    };
                    match &err.cause {
                        ParseFailure::Coercion(_) => error!(
                            model = %err.owner,
                            attribute = %err.attribute,
                            path = %err.path.join("->"),
                            "{}",
                            err
                        ),
                        ParseFailure::Nested(_) => debug!(
                            model = %err.owner,
                            attribute = %err.attribute,
                            "nested record failed to parse"
                        ),
                    }
                    return Err(err);
                }
            }
        }

        Ok(Document { attributes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSpec;
    use crate::types::{FloatType, IntegerType, TypeRef};
    use serde_json::json;

    fn parser() -> DocumentParser {
        let schema = CompiledSchema::new(
            "Test::Reading",
            vec![
                AttributeSpec::new("id", vec!["id".into()])
                    .with_type(TypeRef::Scalar(Arc::new(IntegerType::integer()))),
                AttributeSpec::new("value", vec!["value".into()])
                    .with_type(TypeRef::Scalar(Arc::new(FloatType::new()))),
                AttributeSpec::new("note", vec!["meta".into(), "note".into()]),
            ],
        );
        DocumentParser::new(Arc::new(schema), ArrayNilPolicy::WrapNil)
    }

    #[test]
    fn test_document_covers_every_attribute() {
        let doc = parser().parse(&json!({"id": "4", "value": "0.5"})).unwrap();
        let names: Vec<_> = doc.attributes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["id", "value", "note"]);
        assert_eq!(doc.get("id"), Some(&FieldValue::Integer(4)));
        assert!(doc.get("note").unwrap().is_nil());
    }

    #[test]
    fn test_first_failure_aborts() {
        let raw = json!({"id": "4", "value": "lots"});
        let err = parser().parse(&raw).unwrap_err();
        assert_eq!(err.attribute, "value");
        assert_eq!(err.owner, "Test::Reading");
        assert_eq!(err.path, vec!["value".to_string()]);
        assert_eq!(err.raw_input, raw);
        assert_eq!(err.root_cause().type_name, "float");
    }
}
