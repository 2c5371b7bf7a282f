//! Familiar Models
//!
//! Compiles declarative, YAML-described schema definitions into typed parsers
//! and uses them to turn raw nested data into validated records.
//!
//! ## Features
//!
//! - **Namespaced Types**: Definitions compile into a namespace tree mirroring the schema directories
//! - **Two-Tier Lookup**: Type names resolve bare first, then namespace-qualified
//! - **Path Extraction**: Attributes are pulled out of arbitrarily nested input by key path
//! - **Atomic Parsing**: A document either parses completely or fails naming the attribute
//! - **Build-Then-Swap Reloads**: A failing batch never replaces the published catalog
//!
//! ## Architecture
//!
//! ```text
//! schemas/test/test_schema.yml
//!        │  DirectorySource
//!        ▼
//! SchemaFile { segments: ["test"], definition }
//!        │  SchemaCompiler (+ TypeRegistry)
//!        ▼
//! Catalog { NamespaceTree, TypeContext }
//!        │  ModelRegistry::parse("Test::TestSchema::Company", raw)
//!        ▼
//! Record { id: 123480369, employees: [Employee { .. }] }
//! ```

pub mod attribute;
pub mod catalog;
pub mod checksum;
pub mod compiler;
pub mod config;
pub mod definition;
pub mod discovery;
pub mod error;
pub mod model;
pub mod namespace;
pub mod parser;
pub mod schema;
pub mod types;
pub mod value;

pub use attribute::{ArrayNilPolicy, AttributeSpec};
pub use catalog::{Catalog, ModelRegistry};
pub use checksum::Checksum;
pub use compiler::SchemaCompiler;
pub use config::ModelsConfig;
pub use definition::{PropertySpec, SchemaDefinition};
pub use discovery::{DirectorySource, SchemaFile, SchemaSource, StaticSource};
pub use error::{CoercionError, ModelError, ParseError, ParseFailure, Result};
pub use model::ModelType;
pub use namespace::{Namespace, NamespaceId, NamespaceTree};
pub use parser::{Document, DocumentParser};
pub use schema::CompiledSchema;
pub use types::{TypeContext, TypeDescriptor, TypeRef, TypeRegistry};
pub use value::{FieldValue, Record};
