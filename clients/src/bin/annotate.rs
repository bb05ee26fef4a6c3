//! `oboe-annotate`: Turns an OBOE annotation template into an RDF graph.
//!
//! Parses the template, resolves the dataset named by its
//! `data_identifier`, applies every mapping and writes the triples next to
//! the template (or to `--out`).
//!
//! **Usage:**
//! ```
//! oboe-annotate <TEMPLATE> [--limit <N>] [--out <path>] [--format turtle|ntriples|jsonld]
//!               [--cache-dir <path>] [--compare native|text] [--dump-model] [--verify]
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG` (default `info`).
//! Exits non-zero if the run fails or, with `--verify`, if any conformance
//! check fails.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use oboe_annotation::{run, Coercion, RunConfig, Syntax, Template};
use oboe_conformance::{run_all, Artifacts, Severity};
use tracing_subscriber::EnvFilter;

/// Annotate a dataset from an OBOE annotation template.
#[derive(Parser)]
#[command(
    name = "oboe-annotate",
    about = "Materialize OBOE observation/measurement triples from an annotation template"
)]
struct Args {
    /// Path to the annotation template (CSV).
    template: PathBuf,

    /// Process only the first N dataset rows.
    #[arg(long)]
    limit: Option<usize>,

    /// Output file (default: the template path with the format's extension).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output syntax.
    #[arg(long, default_value = "turtle")]
    format: Syntax,

    /// Directory for downloaded datasets (default: the template's directory).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// How condition comparands are compared with cells.
    #[arg(long, default_value = "native")]
    compare: Coercion,

    /// Print the parsed annotation model as JSON and exit.
    #[arg(long)]
    dump_model: bool,

    /// Run the conformance checks on the written output.
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.dump_model {
        let template = Template::from_path(&args.template)
            .with_context(|| format!("Failed to parse {}", args.template.display()))?;
        let json = serde_json::to_string_pretty(&template.model)
            .context("Failed to serialize annotation model")?;
        println!("{json}");
        return Ok(());
    }

    let config = RunConfig::new(&args.template)
        .with_row_limit(args.limit)
        .with_output(args.out)
        .with_syntax(args.format)
        .with_cache_dir(args.cache_dir)
        .with_coercion(args.compare);

    let output = run(&config)
        .with_context(|| format!("Failed to annotate {}", args.template.display()))?;
    println!(
        "  Written: {} ({} triples, {} measurements)",
        output.path.display(),
        output.annotation.graph.len(),
        output.annotation.summary.measurements
    );

    if !args.verify {
        return Ok(());
    }

    let report = run_all(&Artifacts::from(&output))?;
    for result in &report.results {
        let status = match result.severity {
            Severity::Pass => "PASS",
            Severity::Warning => "WARN",
            Severity::Failure => "FAIL",
        };
        println!("[{}] {}: {}", status, result.validator, result.message);
        for detail in &result.details {
            println!("       {}", detail);
        }
    }
    println!();
    println!(
        "Summary: {} passed, {} warnings, {} failed",
        report.results.len() - report.warning_count() - report.failure_count(),
        report.warning_count(),
        report.failure_count()
    );

    if !report.all_passed() {
        eprintln!(
            "Conformance FAILED: {} check(s) did not pass.",
            report.failure_count()
        );
        process::exit(1);
    }
    Ok(())
}
