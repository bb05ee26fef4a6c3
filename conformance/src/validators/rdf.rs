//! RDF 1.1 / Turtle 1.1 validator.
//!
//! Validates that a written annotation graph is well-formed:
//! - Turtle and N-Triples files parse without errors
//! - The parsed triple count equals the size of the in-memory graph
//! - JSON-LD files are valid JSON with a `@graph` array of the expected
//!   number of subjects

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use oboe_annotation::Syntax;
use sophia_api::prelude::*;
use sophia_inmem::graph::LightGraph;
use sophia_turtle::parser::{nt, turtle};
use tracing::debug;

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "annotation/rdf";

/// Validates the artifact at `path`, written in `syntax`, against the graph
/// that produced it.
///
/// # Errors
///
/// Returns an error if the artifact cannot be read.
pub fn validate(
    path: &Path,
    syntax: Syntax,
    graph: &oboe_annotation::Graph,
) -> Result<ConformanceReport> {
    let mut report = ConformanceReport::new();
    if !path.exists() {
        report.push(TestResult::fail(
            VALIDATOR,
            format!("{} not found", path.display()),
        ));
        return Ok(report);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match syntax {
        Syntax::Turtle | Syntax::NTriples => {
            report.push(check_reparse(path, &content, syntax, graph.len()));
        }
        Syntax::JsonLd => {
            let subjects = graph.iter().map(|t| &t.subject).collect::<HashSet<_>>().len();
            report.push(check_json_ld(path, &content, subjects));
        }
    }
    Ok(report)
}

/// Parses `content` with sophia and compares the number of distinct triples.
fn check_reparse(path: &Path, content: &str, syntax: Syntax, expected: usize) -> TestResult {
    let parsed: std::result::Result<LightGraph, String> = match syntax {
        Syntax::NTriples => nt::parse_str(content)
            .collect_triples()
            .map_err(|e| e.to_string()),
        _ => turtle::parse_str(content)
            .collect_triples()
            .map_err(|e| e.to_string()),
    };
    let graph = match parsed {
        Ok(graph) => graph,
        Err(e) => {
            return TestResult::fail_with_details(
                VALIDATOR,
                format!("{} is not valid {syntax}", path.display()),
                vec![e],
            );
        }
    };

    let count = graph.triples().count();
    debug!(artifact = %path.display(), count, expected, "re-parsed artifact");
    if count == expected {
        TestResult::pass(
            VALIDATOR,
            format!(
                "{} is valid {syntax} ({count} triples, matching the emitted graph)",
                path.display()
            ),
        )
    } else {
        TestResult::fail(
            VALIDATOR,
            format!(
                "{} parses to {count} triples but {expected} were emitted",
                path.display()
            ),
        )
    }
}

/// JSON-LD is checked structurally: one node object per subject.
fn check_json_ld(path: &Path, content: &str, subjects: usize) -> TestResult {
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            return TestResult::fail(
                VALIDATOR,
                format!("{} is not valid JSON: {e}", path.display()),
            );
        }
    };

    let mut issues = Vec::new();
    if !value.get("@context").is_some_and(serde_json::Value::is_object) {
        issues.push("Missing @context object".to_string());
    }
    match value.get("@graph").and_then(serde_json::Value::as_array) {
        Some(nodes) if nodes.len() == subjects => {}
        Some(nodes) => issues.push(format!(
            "@graph has {} node objects, expected {subjects}",
            nodes.len()
        )),
        None => issues.push("Missing @graph array".to_string()),
    }

    if issues.is_empty() {
        TestResult::pass(
            VALIDATOR,
            format!("{} is valid JSON-LD ({subjects} nodes)", path.display()),
        )
    } else {
        TestResult::fail_with_details(
            VALIDATOR,
            format!("{} has structural issues", path.display()),
            issues,
        )
    }
}
