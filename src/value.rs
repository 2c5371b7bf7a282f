//! Coerced values and the records built from parsed documents

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A value produced by resolving one attribute
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    List(Vec<FieldValue>),
    Record(Record),
    /// Untyped pass-through of the raw input
    Raw(Value),
}

impl FieldValue {
    /// Lift an untyped raw value.
    ///
    /// Sequences become lists so array handling treats typed and untyped
    /// attributes alike; maps and scalars stay raw.
    pub fn from_raw(raw: &Value) -> Self {
        match raw {
            Value::Null => FieldValue::Nil,
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from_raw).collect()),
            other => FieldValue::Raw(other.clone()),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, FieldValue::Nil)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            FieldValue::Raw(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Raw(Value::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Raw(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            FieldValue::Raw(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            FieldValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Nil => "nil",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::List(_) => "list",
            FieldValue::Record(_) => "record",
            FieldValue::Raw(_) => "raw",
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Nil => serializer.serialize_none(),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FieldValue::Record(r) => r.serialize(serializer),
            FieldValue::Raw(v) => v.serialize(serializer),
        }
    }
}

/// A read-only instance of a compiled model.
///
/// One field per declared attribute, in declaration order. Clones share the
/// underlying storage.
#[derive(Clone, PartialEq)]
pub struct Record {
    type_name: Arc<str>,
    fields: Arc<[(String, FieldValue)]>,
}

impl Record {
    pub(crate) fn new(type_name: Arc<str>, fields: Vec<(String, FieldValue)>) -> Self {
        Self {
            type_name,
            fields: fields.into(),
        }
    }

    /// Qualified name of the model that built this record
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Value of a declared attribute
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(&self.type_name);
        for (name, value) in self.fields.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.fields.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employee() -> Record {
        Record::new(
            Arc::from("Test::Employee"),
            vec![
                ("id".to_string(), FieldValue::Integer(1001)),
                ("name".to_string(), FieldValue::from("John Smith")),
                ("manager".to_string(), FieldValue::Nil),
            ],
        )
    }

    #[test]
    fn test_record_preserves_declaration_order() {
        let record = employee();
        assert_eq!(record.field_names(), vec!["id", "name", "manager"]);
        assert_eq!(record.get("id").and_then(FieldValue::as_i64), Some(1001));
        assert!(record.get("manager").unwrap().is_nil());
        assert!(record.get("salary").is_none());
    }

    #[test]
    fn test_from_raw_lifts_sequences() {
        let value = FieldValue::from_raw(&json!([1, null, {"a": 1}]));
        let items = value.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_i64(), Some(1));
        assert!(items[1].is_nil());
        assert_eq!(items[2], FieldValue::Raw(json!({"a": 1})));
    }

    #[test]
    fn test_record_serializes_as_ordered_map() {
        let json = serde_json::to_string(&employee()).unwrap();
        assert_eq!(json, r#"{"id":1001,"name":"John Smith","manager":null}"#);
    }

    #[test]
    fn test_debug_uses_type_name() {
        let debug = format!("{:?}", employee());
        assert!(debug.starts_with("Test::Employee"));
    }
}
