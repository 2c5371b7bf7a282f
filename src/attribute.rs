//! Attribute resolution: pull one declared attribute out of raw input

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoercionError, ParseFailure};
use crate::types::{raw_text, TypeRef};
use crate::value::FieldValue;

/// How an array attribute wraps a value that resolved to nil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayNilPolicy {
    /// `[nil]`
    #[default]
    WrapNil,
    /// `[]`
    Empty,
}

/// One compiled attribute
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub name: String,
    /// Non-empty list of keys into the raw input
    pub path: Vec<String>,
    pub type_ref: Option<TypeRef>,
    pub is_array: bool,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
            type_ref: None,
            is_array: false,
        }
    }

    pub fn with_type(mut self, type_ref: TypeRef) -> Self {
        self.type_ref = Some(type_ref);
        self
    }

    pub fn array(mut self, is_array: bool) -> Self {
        self.is_array = is_array;
        self
    }

    /// Resolve this attribute against `raw`.
    ///
    /// Nil input short-circuits to nil. Otherwise the path is followed, the
    /// found value is coerced element-wise when it is a sequence, and array
    /// attributes always come back as a list.
    pub fn resolve(&self, raw: &Value, policy: ArrayNilPolicy) -> Result<FieldValue, ParseFailure> {
        if raw.is_null() {
            return Ok(FieldValue::Nil);
        }

        let found = self.dig(raw)?.cloned().unwrap_or(Value::Null);

        let value = match &self.type_ref {
            Some(type_ref) => match &found {
                Value::Array(items) => FieldValue::List(
                    items
                        .iter()
                        .map(|item| type_ref.coerce(item))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                scalar => type_ref.coerce(scalar)?,
            },
            None => FieldValue::from_raw(&found),
        };

        Ok(if self.is_array { wrap(value, policy) } else { value })
    }

    /// Follow the path through nested maps. A missing key or null along the
    /// way resolves to `None`; stepping into a scalar or sequence is an error.
    fn dig<'a>(&self, raw: &'a Value) -> Result<Option<&'a Value>, CoercionError> {
        let mut current = raw;
        for key in &self.path {
            current = match current {
                Value::Object(map) => match map.get(key) {
                    Some(next) => next,
                    None => return Ok(None),
                },
                Value::Null => return Ok(None),
                other => {
                    return Err(CoercionError::new(
                        "path",
                        raw_text(other),
                        format!("cannot look up '{}' in a {}", key, json_kind(other)),
                    ))
                }
            };
        }
        Ok(Some(current))
    }
}

fn wrap(value: FieldValue, policy: ArrayNilPolicy) -> FieldValue {
    match (value, policy) {
        (list @ FieldValue::List(_), _) => list,
        (FieldValue::Nil, ArrayNilPolicy::Empty) => FieldValue::List(Vec::new()),
        (other, _) => FieldValue::List(vec![other]),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "map",
    }
}
