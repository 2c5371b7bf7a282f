//! Built-in scalar types
//!
//! | Key               | Value              | Blank input |
//! |-------------------|--------------------|-------------|
//! | `boolean`         | `Boolean`          | nil         |
//! | `date`            | `Date`             | nil         |
//! | `datetime`        | `DateTime`         | nil         |
//! | `integer`         | `Integer`          | nil         |
//! | `PositiveInteger` | `Integer` (>= 0)   | nil         |
//! | `float`           | `Float`            | nil         |
//! | `string`          | `String`           | `""`        |

use std::sync::RwLock;

use chrono::format::{self, ParseErrorKind, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use serde_json::Value;

use super::{is_blank, raw_text, NilSentinels, TypeDescriptor};
use crate::error::CoercionError;
use crate::value::FieldValue;

// =============================================================================
// Integer / PositiveInteger
// =============================================================================

/// Integers written as digits with an optional leading `-`.
///
/// Zero padding is accepted (`"0045"` is 45); a `-` anywhere but the first
/// position is not.
#[derive(Debug)]
pub struct IntegerType {
    name: &'static str,
    non_negative: bool,
    sentinels: NilSentinels,
}

impl IntegerType {
    pub fn integer() -> Self {
        Self {
            name: "integer",
            non_negative: false,
            sentinels: NilSentinels::new(),
        }
    }

    /// Integer that additionally rejects negative values
    pub fn positive() -> Self {
        Self {
            name: "PositiveInteger",
            non_negative: true,
            sentinels: NilSentinels::new(),
        }
    }

    fn check(&self, text: &str) -> Result<i64, &'static str> {
        if text.is_empty() {
            return Err("empty value");
        }
        if text.chars().any(|c| !c.is_ascii_digit() && c != '-') {
            return Err("expected digits with an optional leading '-'");
        }
        if text.rfind('-').is_some_and(|i| i != 0) {
            return Err("'-' is only allowed as the first character");
        }
        let value: i64 = text.parse().map_err(|_| "not a 64-bit integer")?;
        if self.non_negative && value < 0 {
            return Err("value must not be negative");
        }
        Ok(value)
    }
}

impl TypeDescriptor for IntegerType {
    fn name(&self) -> &str {
        self.name
    }

    fn parse(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        if is_blank(raw) || self.sentinels.matches(raw) {
            return Ok(FieldValue::Nil);
        }
        let text = raw_text(raw);
        self.check(&text)
            .map(FieldValue::Integer)
            .map_err(|reason| CoercionError::new(self.name, text, reason))
    }

    fn is_valid(&self, raw: &Value) -> bool {
        self.check(&raw_text(raw)).is_ok()
    }

    fn nil_sentinels(&self) -> Option<&NilSentinels> {
        Some(&self.sentinels)
    }
}

// =============================================================================
// Float
// =============================================================================

/// Floats whose text is already in canonical integer or float form.
///
/// `"23"`, `"0.56"`, `"50000.0"` and integers beyond `i64` such as
/// `"18446744073709551615"` pass; `"0045"`, `"1.50"` and `"inf"` do not.
#[derive(Debug, Default)]
pub struct FloatType {
    sentinels: NilSentinels,
}

impl FloatType {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(text: &str) -> Result<f64, &'static str> {
        if text.is_empty() {
            return Err("empty value");
        }
        if is_canonical_integer(text) {
            return text
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or("integer out of range");
        }
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() && format!("{:?}", f) == text => Ok(f),
            _ => Err("expected an integer or decimal number"),
        }
    }
}

/// Integer text with no padding and no `+`; `-0` is not canonical
fn is_canonical_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    canonical && !(text.starts_with('-') && digits == "0")
}

impl TypeDescriptor for FloatType {
    fn name(&self) -> &str {
        "float"
    }

    fn parse(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        if is_blank(raw) || self.sentinels.matches(raw) {
            return Ok(FieldValue::Nil);
        }
        let text = raw_text(raw);
        Self::check(&text)
            .map(FieldValue::Float)
            .map_err(|reason| CoercionError::new("float", text, reason))
    }

    fn is_valid(&self, raw: &Value) -> bool {
        Self::check(&raw_text(raw)).is_ok()
    }

    fn nil_sentinels(&self) -> Option<&NilSentinels> {
        Some(&self.sentinels)
    }
}

// =============================================================================
// Date
// =============================================================================

/// A registered date layout: inputs matching `regex` are read with `template`
#[derive(Debug, Clone)]
pub struct DateFormat {
    pub template: String,
    pub regex: Regex,
}

impl DateFormat {
    pub fn new(template: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            template: template.into(),
            regex: Regex::new(pattern)?,
        })
    }

    fn read(&self, text: &str) -> Option<NaiveDate> {
        parse_date_template(text, &self.template)
    }
}

const GENERIC_DATE_TEMPLATES: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d, %Y",
];

/// Calendar dates.
///
/// Registered formats are tried in registration order and the first whose
/// regex matches decides the template. Unmatched input falls back to a set of
/// common layouts.
#[derive(Debug, Default)]
pub struct DateType {
    formats: RwLock<Vec<DateFormat>>,
}

impl DateType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_date_format(&self, format: DateFormat) {
        self.formats.write().unwrap_or_else(|e| e.into_inner()).push(format);
    }

    pub fn date_formats(&self) -> Vec<DateFormat> {
        self.formats.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn read(&self, text: &str) -> Result<NaiveDate, String> {
        let formats = self.formats.read().unwrap_or_else(|e| e.into_inner());
        if let Some(format) = formats.iter().find(|f| f.regex.is_match(text)) {
            return format
                .read(text)
                .ok_or_else(|| format!("does not match template '{}'", format.template));
        }
        drop(formats);
        generic_date(text).ok_or_else(|| "unrecognized date format".to_string())
    }
}

impl TypeDescriptor for DateType {
    fn name(&self) -> &str {
        "date"
    }

    fn parse(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        if is_blank(raw) {
            return Ok(FieldValue::Nil);
        }
        let text = raw_text(raw);
        match self.read(text.trim()) {
            Ok(date) => Ok(FieldValue::Date(date)),
            Err(reason) => Err(CoercionError::new("date", text, reason)),
        }
    }

    fn is_valid(&self, raw: &Value) -> bool {
        !is_blank(raw) && self.read(raw_text(raw).trim()).is_ok()
    }
}

/// Parse with a strftime template, defaulting a missing day or month to 1
fn parse_date_template(text: &str, template: &str) -> Option<NaiveDate> {
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, text, StrftimeItems::new(template)).ok()?;
    match parsed.to_naive_date() {
        Ok(date) => Some(date),
        Err(e) if e.kind() == ParseErrorKind::NotEnough => {
            // Conflicts are ignored: an already-set field keeps its value.
            let _ = parsed.set_month(1);
            let _ = parsed.set_day(1);
            parsed.to_naive_date().ok()
        }
        Err(_) => None,
    }
}

fn generic_date(text: &str) -> Option<NaiveDate> {
    GENERIC_DATE_TEMPLATES
        .iter()
        .find_map(|t| NaiveDate::parse_from_str(text, t).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| DateTime::parse_from_rfc2822(text).ok().map(|dt| dt.date_naive()))
}

// =============================================================================
// DateTime
// =============================================================================

const ZONED_DATETIME_TEMPLATES: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%z"];

const NAIVE_DATETIME_TEMPLATES: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Timestamps with an offset; values without one are taken as UTC
#[derive(Debug, Default)]
pub struct DateTimeType;

impl DateTimeType {
    pub fn new() -> Self {
        Self
    }

    fn read(text: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
            return Some(dt);
        }
        if let Some(dt) = ZONED_DATETIME_TEMPLATES
            .iter()
            .find_map(|t| DateTime::parse_from_str(text, t).ok())
        {
            return Some(dt);
        }
        let naive = NAIVE_DATETIME_TEMPLATES
            .iter()
            .find_map(|t| NaiveDateTime::parse_from_str(text, t).ok())
            .or_else(|| generic_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))?;
        let utc = FixedOffset::east_opt(0)?;
        Some(utc.from_utc_datetime(&naive))
    }
}

impl TypeDescriptor for DateTimeType {
    fn name(&self) -> &str {
        "datetime"
    }

    fn parse(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        if is_blank(raw) {
            return Ok(FieldValue::Nil);
        }
        let text = raw_text(raw);
        Self::read(text.trim())
            .map(FieldValue::DateTime)
            .ok_or_else(|| CoercionError::new("datetime", text, "unrecognized datetime format"))
    }

    fn is_valid(&self, raw: &Value) -> bool {
        !is_blank(raw) && Self::read(raw_text(raw).trim()).is_some()
    }
}

// =============================================================================
// String / Boolean
// =============================================================================

/// Stringifies anything; blank input becomes `""`
#[derive(Debug, Default)]
pub struct StringType;

impl StringType {
    pub fn new() -> Self {
        Self
    }
}

impl TypeDescriptor for StringType {
    fn name(&self) -> &str {
        "string"
    }

    fn parse(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        if is_blank(raw) {
            return Ok(FieldValue::String(String::new()));
        }
        Ok(FieldValue::String(raw_text(raw)))
    }

    fn is_valid(&self, _raw: &Value) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub struct BooleanType;

impl BooleanType {
    pub fn new() -> Self {
        Self
    }

    fn read(raw: &Value) -> Option<bool> {
        match raw {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl TypeDescriptor for BooleanType {
    fn name(&self) -> &str {
        "boolean"
    }

    fn parse(&self, raw: &Value) -> Result<FieldValue, CoercionError> {
        if let Value::Bool(b) = raw {
            return Ok(FieldValue::Boolean(*b));
        }
        if is_blank(raw) {
            return Ok(FieldValue::Nil);
        }
        Self::read(raw)
            .map(FieldValue::Boolean)
            .ok_or_else(|| CoercionError::new("boolean", raw_text(raw), "expected true/false, yes/no or 1/0"))
    }

    fn is_valid(&self, raw: &Value) -> bool {
        Self::read(raw).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn int(t: &IntegerType, raw: Value) -> Result<FieldValue, CoercionError> {
        t.parse(&raw)
    }

    #[test]
    fn test_integer_accepts_padding_and_sign() {
        let t = IntegerType::integer();
        assert_eq!(int(&t, json!("23")).unwrap(), FieldValue::Integer(23));
        assert_eq!(int(&t, json!("0")).unwrap(), FieldValue::Integer(0));
        assert_eq!(int(&t, json!("000")).unwrap(), FieldValue::Integer(0));
        assert_eq!(int(&t, json!("-74")).unwrap(), FieldValue::Integer(-74));
        assert_eq!(int(&t, json!("0045")).unwrap(), FieldValue::Integer(45));
        assert_eq!(int(&t, json!("-0045")).unwrap(), FieldValue::Integer(-45));
        assert_eq!(int(&t, json!(17)).unwrap(), FieldValue::Integer(17));
    }

    #[test]
    fn test_integer_rejects_malformed_input() {
        let t = IntegerType::integer();
        for bad in ["00-45", "0.56", "seven", "a67", "67b", "99999999999999999999"] {
            let err = int(&t, json!(bad)).unwrap_err();
            assert_eq!(err.type_name, "integer");
            assert_eq!(err.raw, bad);
        }
        assert!(!t.is_valid(&json!("00-45")));
    }

    #[test]
    fn test_integer_blank_and_sentinels() {
        let t = IntegerType::integer();
        assert!(int(&t, json!(null)).unwrap().is_nil());
        assert!(int(&t, json!("")).unwrap().is_nil());
        assert!(int(&t, json!("NA")).is_err());

        t.nil_sentinels().unwrap().insert("NA");
        assert!(int(&t, json!("NA")).unwrap().is_nil());
        assert!(!t.is_valid(&json!("NA")));
    }

    #[test]
    fn test_positive_integer() {
        let t = IntegerType::positive();
        assert_eq!(t.name(), "PositiveInteger");
        assert_eq!(int(&t, json!("23")).unwrap(), FieldValue::Integer(23));
        assert_eq!(int(&t, json!("0")).unwrap(), FieldValue::Integer(0));
        assert_eq!(int(&t, json!("0045")).unwrap(), FieldValue::Integer(45));
        for bad in ["-74", "-0045", "0.56", "seven", "a67", "67b"] {
            assert!(int(&t, json!(bad)).is_err(), "{} should be rejected", bad);
        }
        t.nil_sentinels().unwrap().insert("NA");
        assert!(int(&t, json!("NA")).unwrap().is_nil());
        assert!(int(&t, json!("")).unwrap().is_nil());
    }

    #[test]
    fn test_float() {
        let t = FloatType::new();
        assert_eq!(t.parse(&json!("23")).unwrap(), FieldValue::Float(23.0));
        assert_eq!(t.parse(&json!("0.56")).unwrap(), FieldValue::Float(0.56));
        assert_eq!(t.parse(&json!("50000.0")).unwrap(), FieldValue::Float(50000.0));
        assert_eq!(t.parse(&json!("-3")).unwrap(), FieldValue::Float(-3.0));
        assert_eq!(t.parse(&json!(1.25)).unwrap(), FieldValue::Float(1.25));
        assert_eq!(
            t.parse(&json!("18446744073709551615")).unwrap(),
            FieldValue::Float(18446744073709551615.0)
        );
        assert_eq!(t.parse(&json!("-99999999999999999999")).unwrap(), FieldValue::Float(-1e20));
        for bad in ["seven", "0045", "1.50", "inf", "NaN", "-0", "+3"] {
            assert!(t.parse(&json!(bad)).is_err(), "{} should be rejected", bad);
        }
        assert!(t.parse(&json!(null)).unwrap().is_nil());
        assert!(t.parse(&json!("")).unwrap().is_nil());
        t.nil_sentinels().unwrap().insert("NA");
        assert!(t.parse(&json!("NA")).unwrap().is_nil());
    }

    #[test]
    fn test_date_generic_and_blank() {
        let t = DateType::new();
        assert_eq!(
            t.parse(&json!("2000-10-23")).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2000, 10, 23).unwrap())
        );
        assert!(t.parse(&json!(null)).unwrap().is_nil());
        assert!(t.parse(&json!("")).unwrap().is_nil());
        assert!(t.parse(&json!("2000_01_01")).is_err());
    }

    #[test]
    fn test_date_custom_format_defaults_day() {
        let t = DateType::new();
        t.register_date_format(DateFormat::new("%Y.%m", r"\A[0-9]{4}.[0-9]{2}\z").unwrap());
        assert_eq!(
            t.parse(&json!("2000.01")).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_date_first_registered_format_wins() {
        let t = DateType::new();
        t.register_date_format(DateFormat::new("%d/%m/%Y", r"^\d{2}/\d{2}/\d{4}$").unwrap());
        t.register_date_format(DateFormat::new("%m/%d/%Y", r"^\d{2}/\d{2}/\d{4}$").unwrap());
        assert_eq!(
            t.parse(&json!("03/04/2021")).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2021, 4, 3).unwrap())
        );
    }

    #[test]
    fn test_date_unmatched_input_uses_generic_layouts() {
        let t = DateType::new();
        t.register_date_format(DateFormat::new("%d.%m.%Y", r"^\d{2}\.\d{2}\.\d{4}$").unwrap());
        assert_eq!(
            t.parse(&json!("2021-08-01")).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2021, 8, 1).unwrap())
        );
        assert_eq!(
            t.parse(&json!("01.08.2021")).unwrap(),
            FieldValue::Date(NaiveDate::from_ymd_opt(2021, 8, 1).unwrap())
        );
        assert!(t.parse(&json!("August first")).is_err());
    }

    #[test]
    fn test_date_matched_format_does_not_fall_back() {
        let t = DateType::new();
        t.register_date_format(DateFormat::new("%d.%m.%Y", r"^\d{4}-").unwrap());
        assert!(t.parse(&json!("2021-01-01")).is_err());
    }

    #[test]
    fn test_datetime() {
        let t = DateTimeType::new();
        let value = t.parse(&json!("2019-06-17 16:01:05 +0300")).unwrap();
        let dt = value.as_datetime().unwrap();
        assert_eq!(dt.to_rfc3339(), "2019-06-17T16:01:05+03:00");

        let value = t.parse(&json!("2001-02-03")).unwrap();
        assert_eq!(value.as_datetime().unwrap().to_rfc3339(), "2001-02-03T00:00:00+00:00");

        assert!(t.parse(&json!(null)).unwrap().is_nil());
        assert!(t.parse(&json!("")).unwrap().is_nil());
        assert!(t.parse(&json!("2019-06 16:01:05 +0300")).is_err());
    }

    #[test]
    fn test_string() {
        let t = StringType::new();
        assert_eq!(t.parse(&json!("Hello")).unwrap(), FieldValue::from("Hello"));
        assert_eq!(t.parse(&json!(null)).unwrap(), FieldValue::from(""));
        assert_eq!(t.parse(&json!("")).unwrap(), FieldValue::from(""));
        assert_eq!(t.parse(&json!(42)).unwrap(), FieldValue::from("42"));
    }

    #[test]
    fn test_boolean() {
        let t = BooleanType::new();
        assert_eq!(t.parse(&json!(false)).unwrap(), FieldValue::Boolean(false));
        assert_eq!(t.parse(&json!("Yes")).unwrap(), FieldValue::Boolean(true));
        assert_eq!(t.parse(&json!(0)).unwrap(), FieldValue::Boolean(false));
        assert!(t.parse(&json!("")).unwrap().is_nil());
        assert!(t.parse(&json!("maybe")).is_err());
    }
}
