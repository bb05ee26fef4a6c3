//! Annotation template lint.
//!
//! Checks the parsed model for authoring mistakes that do not stop a run:
//! - Mapping keys that name no measurement or observation (failure)
//! - Measurements without a characteristic (warning)
//! - Observations no mapping reaches (warning)
//! - Rows the parser skipped (warning)

use std::collections::BTreeSet;

use oboe_annotation::{AnnotationModel, SkippedRow};

use crate::report::{ConformanceReport, TestResult};

const VALIDATOR: &str = "annotation/template";

/// Lints `model` and the rows skipped while parsing it.
pub fn validate(model: &AnnotationModel, skipped: &[SkippedRow]) -> ConformanceReport {
    let mut report = ConformanceReport::new();

    let unresolved = model.unresolved_mapping_keys();
    if unresolved.is_empty() {
        report.push(TestResult::pass(
            VALIDATOR,
            format!("All {} mapping(s) name a declared key", model.mappings.len()),
        ));
    } else {
        report.push(TestResult::fail_with_details(
            VALIDATOR,
            format!("{} mapping key(s) are not declared", unresolved.len()),
            unresolved
                .iter()
                .map(|k| format!("'{k}' is neither a measurement nor an observation"))
                .collect(),
        ));
    }

    let uncharacterized: Vec<String> = model
        .measurements
        .keys()
        .filter(|k| !model.characteristics.contains_key(*k))
        .map(|k| format!("measurement '{k}' has no characteristic"))
        .collect();
    if uncharacterized.is_empty() {
        report.push(TestResult::pass(
            VALIDATOR,
            "Every measurement declares a characteristic",
        ));
    } else {
        report.push(TestResult::warn_with_details(
            VALIDATOR,
            format!("{} measurement(s) lack a characteristic", uncharacterized.len()),
            uncharacterized,
        ));
    }

    let reached: BTreeSet<&str> = model
        .mappings
        .iter()
        .filter_map(|m| model.owning_observation(&m.key))
        .collect();
    let unreached: Vec<String> = model
        .observations
        .keys()
        .filter(|k| !reached.contains(k.as_str()))
        .map(|k| format!("observation '{k}' is never mapped"))
        .collect();
    if !unreached.is_empty() {
        report.push(TestResult::warn_with_details(
            VALIDATOR,
            format!("{} observation(s) produce no triples", unreached.len()),
            unreached,
        ));
    }

    if !skipped.is_empty() {
        report.push(TestResult::warn_with_details(
            VALIDATOR,
            format!("{} template row(s) were skipped", skipped.len()),
            skipped
                .iter()
                .map(|s| format!("line {}: {}", s.line, s.reason))
                .collect(),
        ));
    }

    report
}
