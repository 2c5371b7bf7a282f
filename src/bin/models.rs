//! Models CLI
//!
//! Compiles a schemas directory and parses data files against it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use familiar_models::{DirectorySource, ModelRegistry, ModelsConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "familiar-models")]
#[command(about = "Compile schema definitions and parse data against them")]
struct Cli {
    /// Config file, layered over models.toml and MODELS__* variables
    #[arg(short, long)]
    config: Option<String>,

    /// Schemas directory (overrides loader.schemas_path)
    #[arg(short, long)]
    schemas: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every schema file and list the registered models
    Check,

    /// Parse a JSON or YAML data file as one model
    Parse {
        /// Qualified model name, e.g. Test::TestSchema::Company
        #[arg(short, long)]
        model: String,

        /// Data file
        file: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to this file
        #[arg(short, long)]
        write: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ModelsConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(schemas) = cli.schemas {
        config.loader.schemas_path = schemas;
    }

    match cli.command {
        Commands::Check => {
            let engine = load(&config)?;
            let catalog = engine.catalog();

            println!("🔍 {} definitions from {}", catalog.definitions(), config.loader.schemas_root().display());
            for (name, model) in catalog.models() {
                println!("  ✅ {} ({})", name, model.properties().join(", "));
            }
            println!();
            println!("checksum: {}", catalog.checksum());
            Ok(())
        }

        Commands::Parse { model, file } => {
            let engine = load(&config)?;
            let raw = read_data(&file)?;
            match engine.parse(&model, &raw)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("null"),
            }
            Ok(())
        }

        Commands::Config { write } => {
            println!("{}", toml::to_string_pretty(&config)?);
            if let Some(path) = write {
                config
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("✅ Wrote {}", path.display());
            }
            Ok(())
        }
    }
}

fn load(config: &ModelsConfig) -> anyhow::Result<ModelRegistry> {
    let engine = ModelRegistry::from_config(config)?;
    let source = DirectorySource::from_config(&config.loader)?;
    engine
        .reload(&source)
        .with_context(|| format!("compiling schemas under {}", source.root().display()))?;
    Ok(engine)
}

fn read_data(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        Some("yml") | Some("yaml") => serde_yaml::from_str(&text)?,
        _ => bail!("unsupported data file {}: expected .json, .yml or .yaml", path.display()),
    };
    Ok(value)
}
