//! Stageload Ingest - offline checks against a schema registry

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use stageload_common::logging::{init_logging, LogConfig, LogLevel};
use stageload_ingest::{enrich, parse_csv, relocator, SchemaRegistry};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stageload-ingest")]
#[command(author, version, about = "Inspect how staged files would be routed and loaded")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML registry file; the built-in tables are used when omitted
    #[arg(short, long, global = true, env = "INGEST_REGISTRY_PATH")]
    registry: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the table each file name routes to
    Classify {
        /// Bare file names, e.g. departments_01.csv
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Parse and enrich a local file without touching any store
    Preview {
        /// Local CSV file
        file: PathBuf,

        /// File name to route by; defaults to the local file's name
        #[arg(short, long)]
        name: Option<String>,

        /// Number of enriched rows to print
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("stageload-ingest")
        .build()
        .overlay_env()?;
    let _guard = init_logging(&log_config)?;

    let registry = match &cli.registry {
        Some(path) => SchemaRegistry::from_toml_file(path)?,
        None => SchemaRegistry::builtin()?,
    };
    info!(tables = registry.len(), "Schema registry ready");

    match cli.command {
        Command::Classify { names } => classify(&registry, &names),
        Command::Preview { file, name, rows } => preview(&registry, &file, name, rows),
    }
}

fn classify(registry: &SchemaRegistry, names: &[String]) -> Result<()> {
    for name in names {
        match registry.lookup(name) {
            Some(descriptor) => println!("{}\t{}", name, descriptor.table_name()),
            None => println!("{}\t-", name),
        }
    }
    Ok(())
}

fn preview(registry: &SchemaRegistry, file: &Path, name: Option<String>, rows: usize) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Input path has no file name")?,
    };

    let descriptor = registry
        .lookup(&name)
        .with_context(|| format!("No table matches file name {}", name))?;

    let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let now = Utc::now();
    let (destination_key, file_name) = relocator::destination_key(descriptor.table_name(), &name, now);

    let mut dataset = parse_csv(&data, descriptor)?;
    enrich(&mut dataset, descriptor, &file_name, now)?;

    info!(
        table = descriptor.table_name(),
        rows = dataset.len(),
        destination_key = %destination_key,
        "Preview complete"
    );

    let header: Vec<_> = dataset.columns().iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join("\t"));
    for row in dataset.rows().iter().take(rows) {
        println!("{}", serde_json::to_string(row)?);
    }

    Ok(())
}
