//! Error types for schema compilation and document parsing

use std::fmt;

use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while loading, compiling, or parsing models
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown type '{name}' referenced from {namespace}{}", suggestion_suffix(.suggestion))]
    UnknownType {
        name: String,
        namespace: String,
        suggestion: Option<String>,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid schema definition: {0}")]
    InvalidDefinition(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Schema file {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: Box<ModelError>,
    },

    #[error("Invalid date format pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

impl ModelError {
    /// Whether this error came from an unresolved type reference
    pub fn is_lookup(&self) -> bool {
        match self {
            ModelError::UnknownType { .. } => true,
            ModelError::Source { source, .. } => source.is_lookup(),
            _ => false,
        }
    }
}

/// A raw value failed a type's validity check
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid {type_name}: {raw} ({reason})")]
pub struct CoercionError {
    /// Name of the type that rejected the value
    pub type_name: String,
    /// Textual form of the offending value
    pub raw: String,
    pub reason: String,
}

impl CoercionError {
    pub fn new(type_name: impl Into<String>, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// Why an attribute could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    /// A scalar failed coercion
    Coercion(CoercionError),
    /// A nested record failed to parse
    Nested(Box<ParseError>),
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::Coercion(e) => write!(f, "{}", e),
            ParseFailure::Nested(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ParseFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseFailure::Coercion(e) => Some(e),
            ParseFailure::Nested(e) => Some(e.as_ref()),
        }
    }
}

impl From<CoercionError> for ParseFailure {
    fn from(e: CoercionError) -> Self {
        ParseFailure::Coercion(e)
    }
}

impl From<ParseError> for ParseFailure {
    fn from(e: ParseError) -> Self {
        ParseFailure::Nested(Box::new(e))
    }
}

/// A document could not be parsed against its compiled schema.
///
/// Identifies the failing attribute, the model that owns it, the declared
/// path, and the raw input handed to the parser.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unable to parse attribute {attribute} ({owner}) at {}: {cause}", .path.join("->"))]
pub struct ParseError {
    pub attribute: String,
    pub owner: String,
    pub path: Vec<String>,
    pub raw_input: serde_json::Value,
    #[source]
    pub cause: ParseFailure,
}

impl ParseError {
    /// The innermost coercion failure behind this error
    pub fn root_cause(&self) -> &CoercionError {
        match &self.cause {
            ParseFailure::Coercion(e) => e,
            ParseFailure::Nested(inner) => inner.root_cause(),
        }
    }

    /// Attribute names from this record down to the failing scalar
    pub fn attribute_trail(&self) -> Vec<&str> {
        let mut trail = vec![self.attribute.as_str()];
        if let ParseFailure::Nested(inner) = &self.cause {
            trail.extend(inner.attribute_trail());
        }
        trail
    }
}
