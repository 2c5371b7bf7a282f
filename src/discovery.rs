//! Schema Discovery
//!
//! Sources hand the engine a batch of definitions, each paired with the
//! namespace segments it should be compiled under. [`DirectorySource`] walks a
//! schemas root and derives the segments from each file's directory relative
//! to that root:
//!
//! ```text
//! schemas/
//! └── test/
//!     └── test_schema.yml      → segments ["test"] → namespace Test
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{LoaderConfig, DEFAULT_FILE_PATTERN};
use crate::definition::SchemaDefinition;
use crate::error::{ModelError, Result};

/// One definition tree and where it belongs
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFile {
    /// Raw namespace segments, normalized at compile time
    pub segments: Vec<String>,
    pub definition: SchemaDefinition,
    /// File the definition was read from, if any
    pub origin: Option<PathBuf>,
}

impl SchemaFile {
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>, definition: SchemaDefinition) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            definition,
            origin: None,
        }
    }

    /// Human-readable location for errors and logs
    pub fn location(&self) -> String {
        match &self.origin {
            Some(path) => path.display().to_string(),
            None => format!("<{}>", self.definition.class_name),
        }
    }
}

/// Anything that can produce a load batch
pub trait SchemaSource {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Every definition in the batch, in compile order
    fn load(&self) -> Result<Vec<SchemaFile>>;
}

/// Schema files under a directory tree
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    pattern: Regex,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_pattern(root, DEFAULT_FILE_PATTERN)
    }

    pub fn with_pattern(root: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        Self::with_pattern(config.schemas_root(), &config.file_pattern)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Matching files, sorted by path
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = relative_text(&self.root, entry.path());
            if self.pattern.is_match(&relative) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<SchemaFile> {
        let text = fs::read_to_string(path)?;
        let definition = SchemaDefinition::from_yaml(&text)?;
        let segments = path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.root).ok())
            .map(|dir| {
                dir.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(SchemaFile {
            segments,
            definition,
            origin: Some(path.to_path_buf()),
        })
    }
}

impl SchemaSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn load(&self) -> Result<Vec<SchemaFile>> {
        let files = self.files()?;
        debug!(root = %self.root.display(), files = files.len(), "discovered schema files");

        files
            .iter()
            .map(|path| {
                debug!(file = %path.display(), "reading schema file");
                self.read(path).map_err(|e| ModelError::Source {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })
            })
            .collect()
    }
}

/// An in-memory batch
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    files: Vec<SchemaFile>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<S: Into<String>>(mut self, segments: impl IntoIterator<Item = S>, definition: SchemaDefinition) -> Self {
        self.push(SchemaFile::new(segments, definition));
        self
    }

    pub fn push(&mut self, file: SchemaFile) {
        self.files.push(file);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SchemaSource for StaticSource {
    fn describe(&self) -> String {
        format!("{} in-memory definitions", self.files.len())
    }

    fn load(&self) -> Result<Vec<SchemaFile>> {
        Ok(self.files.clone())
    }
}

fn relative_text(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const COMPANY: &str = "schema: TestSchema\nclass: Company\nproperties:\n  - { name: id, path: [id], type: integer }\n";

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discovers_matching_files_in_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "test/test_schema.yml", COMPANY);
        write(dir.path(), "test/nested/deep/b_schema.1.0.0.yml", "class: B\n");
        write(dir.path(), "a_schema.yml", "class: A\n");
        write(dir.path(), "test/notes.yml", "class: Ignored\n");
        write(dir.path(), "test/readme.md", "# not a schema");

        let batch = DirectorySource::new(dir.path()).unwrap().load().unwrap();
        let classes: Vec<_> = batch.iter().map(|f| f.definition.class_name.as_str()).collect();
        assert_eq!(classes, vec!["A", "B", "Company"]);

        assert!(batch[0].segments.is_empty());
        assert_eq!(batch[1].segments, vec!["test", "nested", "deep"]);
        assert_eq!(batch[2].segments, vec!["test"]);
        assert!(batch[2].origin.as_ref().unwrap().ends_with("test/test_schema.yml"));
    }

    #[test]
    fn test_custom_pattern() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "models/company.yaml", "class: Company\n");
        write(dir.path(), "models/company_schema.yml", "class: Other\n");

        let source = DirectorySource::with_pattern(dir.path(), r"\.yaml$").unwrap();
        let batch = source.load().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].definition.class_name, "Company");
    }

    #[test]
    fn test_from_config_uses_resolved_root_and_pattern() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "models/company.yaml", "class: Company\n");
        write(dir.path(), "models/company_schema.yml", "class: Other\n");

        let config = LoaderConfig {
            schemas_path: dir.path().to_path_buf(),
            file_pattern: r"\.yaml$".to_string(),
        };
        let source = DirectorySource::from_config(&config).unwrap();
        assert_eq!(source.root(), dir.path());
        let batch = source.load().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].segments, vec!["models"]);

        let relative = DirectorySource::from_config(&LoaderConfig::default()).unwrap();
        assert!(relative.root().is_absolute());
        assert_eq!(relative.root(), LoaderConfig::default().schemas_root());
    }

    #[test]
    fn test_invalid_file_fails_batch() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good_schema.yml", "class: Good\n");
        write(dir.path(), "bad_schema.yml", "properties: [\n");

        let err = DirectorySource::new(dir.path()).unwrap().load().unwrap_err();
        match err {
            ModelError::Source { path, .. } => assert!(path.ends_with("bad_schema.yml")),
            other => panic!("expected source error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let source = DirectorySource::new(dir.path().join("absent")).unwrap();
        assert!(matches!(source.load(), Err(ModelError::Walk(_))));
    }

    #[test]
    fn test_static_source() {
        let source = StaticSource::new().with(["test"], SchemaDefinition::new("Company"));
        let batch = source.load().unwrap();
        assert_eq!(batch[0].segments, vec!["test"]);
        assert_eq!(batch[0].location(), "<Company>");
        assert_eq!(source.len(), 1);
    }
}
