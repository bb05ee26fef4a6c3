//! OBOE annotation conformance suite.
//!
//! This crate checks the artifacts of an annotation run: the serialized graph
//! must re-parse as the syntax it claims to be and agree with the in-memory
//! graph, and the template it came from is linted for authoring mistakes.
//!
//! # Conformance Scope
//!
//! | Artifact | Standard |
//! |-----------|----------|
//! | Turtle / N-Triples output | RDF 1.1, Turtle 1.1, triple count agreement |
//! | JSON-LD output | JSON-LD 1.1 document shape |
//! | Annotation template | declared mapping keys, characteristics, coverage |
//!
//! # Entry Point
//!
//! ```no_run
//! use oboe_annotation::{run, RunConfig};
//! use oboe_conformance::{run_all, Artifacts};
//!
//! let output = run(&RunConfig::new("fish.csv"))?;
//! let report = run_all(&Artifacts::from(&output))?;
//! assert!(report.all_passed());
//! # Ok::<(), anyhow::Error>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod report;
pub mod validators;

use std::path::Path;

use oboe_annotation::{Annotation, RunOutput, Syntax};

pub use report::{ConformanceReport, Severity, TestResult};

/// What the conformance runner inspects.
#[derive(Debug, Clone, Copy)]
pub struct Artifacts<'a> {
    /// The processed annotation (model and in-memory graph).
    pub annotation: &'a Annotation,
    /// The serialized graph on disk.
    pub output: &'a Path,
    /// Syntax of `output`.
    pub syntax: Syntax,
}

impl<'a> From<&'a RunOutput> for Artifacts<'a> {
    fn from(output: &'a RunOutput) -> Self {
        Self {
            annotation: &output.annotation,
            output: &output.path,
            syntax: output.syntax,
        }
    }
}

/// Runs all conformance validators and returns the aggregated report.
///
/// Validators are run in this order:
/// 1. Template lint (mapping keys, characteristics, coverage, skipped rows)
/// 2. RDF re-parse of the written artifact
///
/// # Errors
///
/// Returns an error only if a file system operation fails.
pub fn run_all(artifacts: &Artifacts<'_>) -> anyhow::Result<ConformanceReport> {
    let mut report = ConformanceReport::new();
    let template = &artifacts.annotation.template;

    // 1. Template lint
    report.extend(validators::template::validate(
        &template.model,
        &template.skipped,
    ));

    // 2. RDF 1.1 / Turtle 1.1
    report.extend(validators::rdf::validate(
        artifacts.output,
        artifacts.syntax,
        &artifacts.annotation.graph,
    )?);

    tracing::info!(
        checks = report.results.len(),
        failures = report.failure_count(),
        warnings = report.warning_count(),
        "conformance checks complete"
    );
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests_unit {
    use super::*;
    use oboe_annotation::{run, RunConfig};

    fn write_fixture(dir: &Path) {
        std::fs::write(dir.join("catch.csv"), "spp,len\nshad,12\nbass,9\n").unwrap();
        std::fs::write(
            dir.join("fish.csv"),
            "META\ndata_identifier,catch.csv\n\
             NAMESPACES\nfish,http://example.org/fish#\n\
             TRIPLES\nfish:Fish,rdfs:subClassOf,owl:unionOf(oboe:Entity fish:Animal)\n\
             OBSERVATIONS\nobservation,o1\n,entity,fish:Fish\n,measurement,m1\n\
             ,,characteristic,fish:Length\n,,standard,fish:Centimeter\n\
             MAPPINGS\nlen,m1\n",
        )
        .unwrap();
    }

    #[test]
    fn every_syntax_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        for syntax in [Syntax::Turtle, Syntax::NTriples, Syntax::JsonLd] {
            let config = RunConfig::new(dir.path().join("fish.csv")).with_syntax(syntax);
            let output = run(&config).unwrap();
            let report = run_all(&Artifacts::from(&output)).unwrap();
            let failures: Vec<_> = report.results.iter().filter(|r| r.is_failure()).collect();
            assert!(failures.is_empty(), "{syntax} failures: {:#?}", failures);
            assert_eq!(report.warning_count(), 0);
        }
    }

    #[test]
    fn tampered_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let output = run(&RunConfig::new(dir.path().join("fish.csv"))).unwrap();
        std::fs::write(&output.path, "@prefix x: <http://x/> .\n").unwrap();
        let report = run_all(&Artifacts::from(&output)).unwrap();
        assert!(!report.all_passed());
    }
}
