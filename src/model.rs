//! Generated value types
//!
//! Every compiled class becomes a [`ModelType`]: a named parser that turns raw
//! input into an immutable [`Record`] with one field per declared attribute.

use std::sync::Arc;

use serde_json::Value;

use crate::attribute::ArrayNilPolicy;
use crate::error::ParseError;
use crate::parser::{Document, DocumentParser};
use crate::schema::CompiledSchema;
use crate::value::Record;

#[derive(Debug)]
pub struct ModelType {
    class_name: String,
    namespace: String,
    qualified_name: Arc<str>,
    parser: DocumentParser,
}

impl ModelType {
    pub(crate) fn new(
        class_name: impl Into<String>,
        namespace: impl Into<String>,
        schema: CompiledSchema,
        policy: ArrayNilPolicy,
    ) -> Self {
        let qualified_name: Arc<str> = Arc::from(schema.name());
        Self {
            class_name: class_name.into(),
            namespace: namespace.into(),
            qualified_name,
            parser: DocumentParser::new(Arc::new(schema), policy),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Qualified name of the namespace the class is bound in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn schema(&self) -> &CompiledSchema {
        self.parser.schema()
    }

    /// Declared attribute names, in order
    pub fn properties(&self) -> Vec<&str> {
        self.schema().attribute_names()
    }

    /// Parse raw input into a record. Nil input yields `Ok(None)`.
    pub fn parse(&self, raw: &Value) -> Result<Option<Record>, ParseError> {
        if raw.is_null() {
            return Ok(None);
        }
        let document = self.parser.parse(raw)?;
        Ok(Some(self.build(document)))
    }

    /// Parse without building a record
    pub fn parse_document(&self, raw: &Value) -> Result<Document, ParseError> {
        self.parser.parse(raw)
    }

    fn build(&self, document: Document) -> Record {
        Record::new(self.qualified_name.clone(), document.into_attributes())
    }
}
