//! `oboe-skeleton`: Generates a starter annotation template from a dataset.
//!
//! Reads the dataset's column names and writes a template with one
//! observation/measurement block and one mapping per column. Class tokens are
//! `foo:EditMe` placeholders to be replaced by the author.
//!
//! **Usage:**
//! ```
//! oboe-skeleton <DATASET> [--out <path>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use oboe_annotation::{skeleton, Dataset};
use tracing_subscriber::EnvFilter;

/// Generate an annotation template skeleton.
#[derive(Parser)]
#[command(
    name = "oboe-skeleton",
    about = "Generate an OBOE annotation template skeleton from a dataset"
)]
struct Args {
    /// Dataset whose columns the template should map.
    dataset: PathBuf,

    /// Output file (default: stdout).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let dataset = Dataset::from_path(&args.dataset)
        .with_context(|| format!("Failed to read dataset {}", args.dataset.display()))?;
    let columns: Vec<&str> = dataset.column_names().collect();
    let text = skeleton::generate(&columns, &args.dataset.to_string_lossy())
        .context("Failed to render template skeleton")?;

    match &args.out {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(template = %path.display(), columns = columns.len(), "skeleton written");
        }
        None => print!("{text}"),
    }
    Ok(())
}
