//! Configuration management for the model engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (models.toml)
//! - Environment variables (MODELS__*)
//!
//! ## Example config file (models.toml):
//! ```toml
//! [loader]
//! schemas_path = "./schemas"
//! file_pattern = '.*_schema(?:.\d+.\d+.\d+)?.yml'
//!
//! [types.nil_sentinels]
//! integer = ["NA"]
//! PositiveInteger = ["NA"]
//! float = ["NA", "-"]
//!
//! [[types.date_formats]]
//! template = "%d.%m.%Y"
//! regex = '^\d{2}\.\d{2}\.\d{4}$'
//!
//! [parsing]
//! array_nil_policy = "wrap_nil"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::attribute::ArrayNilPolicy;

/// Default pattern for schema files, matched against the path relative to
/// the schemas root
pub const DEFAULT_FILE_PATTERN: &str = r".*_schema(?:.\d+.\d+.\d+)?.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Schema discovery settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Built-in type settings
    #[serde(default)]
    pub types: TypesConfig,

    #[serde(default)]
    pub parsing: ParsingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Root directory searched for schema files
    #[serde(default = "default_schemas_path")]
    pub schemas_path: PathBuf,

    /// Regex a file's relative path must match to be loaded
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesConfig {
    /// Type name → tokens treated as "no value"
    #[serde(default = "default_nil_sentinels")]
    pub nil_sentinels: BTreeMap<String, Vec<String>>,

    /// Extra Date formats, tried in order before the generic parser
    #[serde(default)]
    pub date_formats: Vec<DateFormatConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFormatConfig {
    /// chrono format string, e.g. `%d.%m.%Y`
    pub template: String,
    /// Regex selecting the inputs this template applies to
    pub regex: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingConfig {
    #[serde(default)]
    pub array_nil_policy: ArrayNilPolicy,
}

fn default_schemas_path() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_file_pattern() -> String {
    DEFAULT_FILE_PATTERN.to_string()
}

fn default_nil_sentinels() -> BTreeMap<String, Vec<String>> {
    ["integer", "PositiveInteger", "float"]
        .into_iter()
        .map(|name| (name.to_string(), vec!["NA".to_string()]))
        .collect()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            schemas_path: default_schemas_path(),
            file_pattern: default_file_pattern(),
        }
    }
}

impl LoaderConfig {
    /// The schemas root, resolved against the working directory
    pub fn schemas_root(&self) -> PathBuf {
        if self.schemas_path.is_absolute() {
            self.schemas_path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.schemas_path)
        }
    }
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            nil_sentinels: default_nil_sentinels(),
            date_formats: Vec::new(),
        }
    }
}

impl ModelsConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["models.toml", ".models.toml", "config/models.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "familiar", "models") {
            let xdg_config = dirs.config_dir().join("models.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("MODELS")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
