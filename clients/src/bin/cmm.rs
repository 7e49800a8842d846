//! `cmm`: drives the custom model registry from the command line.
//!
//! State lives in a JSON snapshot file (default `registry.json`).
//!
//! **Usage:**
//! ```text
//! cmm [--config <file>] [--log <filter>] apply  [--state <file>] <script>...
//! cmm [--config <file>] [--log <filter>] show   [--state <file>] [--model <name>]
//! cmm [--config <file>] [--log <filter>] export [--state <file>] --model <name> [--format turtle|jsonld] [--out <file>]
//! cmm [--config <file>] [--log <filter>] audit  [--state <file>]
//! ```
//!
//! `audit` exits non-zero if any conformance check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cmm_catalog::Catalog;
use cmm_clients::commands;
use cmm_clients::config::{init_logging, CliConfig};
use cmm_clients::state;
use cmm_registry::{ExportFormat, TracingSink};

/// Manage custom content models.
#[derive(Parser)]
#[command(name = "cmm", about = "Manage custom content models", version)]
struct Args {
    /// Configuration file (default: ./cmm.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overriding the config file and RUST_LOG.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply operation scripts and save the result.
    Apply {
        /// State file.
        #[arg(long, default_value = "registry.json")]
        state: PathBuf,
        /// JSON scripts, applied in order.
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
    },
    /// Print models and classes.
    Show {
        /// State file.
        #[arg(long, default_value = "registry.json")]
        state: PathBuf,
        /// Only this model.
        #[arg(long)]
        model: Option<String>,
    },
    /// Render one model as an ontology document.
    Export {
        /// State file.
        #[arg(long, default_value = "registry.json")]
        state: PathBuf,
        /// Model to export.
        #[arg(long)]
        model: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Turtle)]
        format: Format,
        /// Output file (default: stdout).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Audit the state file.
    Audit {
        /// State file.
        #[arg(long, default_value = "registry.json")]
        state: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Turtle,
    Jsonld,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Turtle => ExportFormat::Turtle,
            Format::Jsonld => ExportFormat::JsonLd,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = CliConfig::load(args.config.as_deref())?;
    init_logging(config.log_filter(args.log.as_deref()));

    match args.command {
        Command::Apply { state, scripts } => {
            let registry = state::load(&state, &config.registry)?;
            registry.subscribe(Arc::new(TracingSink));
            let outcomes = commands::apply(&registry, &scripts);
            // Whatever was applied before a failure is kept.
            state::save(&registry, &state)?;
            for outcome in &outcomes? {
                println!("{}", commands::describe(outcome));
            }
            println!("  Written: {}", state.display());
        }
        Command::Show { state, model } => {
            let registry = state::load(&state, &config.registry)?;
            print!("{}", commands::show(&registry, model.as_deref())?);
        }
        Command::Export {
            state,
            model,
            format,
            out,
        } => {
            let registry = state::load(&state, &config.registry)?;
            let document = registry.export(&model, format.into())?;
            match out {
                Some(path) => {
                    fs::write(&path, document)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("  Written: {}", path.display());
                }
                None => print!("{document}"),
            }
        }
        Command::Audit { state } => {
            let report = cmm_conformance::run_file(
                &state,
                Arc::new(Catalog::standard()),
                config.registry.clone(),
            )?;

            println!("Custom Model Registry Conformance Report");
            println!("========================================");
            println!();
            for result in &report.results {
                println!("{result}");
            }
            println!();
            println!("Summary: {}", report.summary());

            if !report.all_passed() {
                eprintln!(
                    "Conformance FAILED: {} check(s) did not pass.",
                    report.failure_count()
                );
                process::exit(1);
            }
            println!("Conformance PASSED.");
        }
    }
    Ok(())
}
