//! Annotation model types.
//!
//! An [`AnnotationModel`] is the parsed form of one annotation template. It
//! is filled in by [`crate::template`] and is read-only afterwards: the
//! mapping engine only borrows it. Keys are opaque identifiers chosen by the
//! template author; every table uses last-write-wins semantics.

use std::collections::BTreeMap;

use serde::Serialize;

/// One `(subject, predicate, object)` row of the TRIPLES section, kept as
/// written. Tokens are expanded when the triple is materialized so that a
/// NAMESPACES section placed after TRIPLES still applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticTriple {
    /// Subject token.
    pub subject: String,
    /// Predicate token.
    pub predicate: String,
    /// Object token.
    pub object: String,
}

/// A rule binding a dataset column to a measurement key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    /// Dataset column name.
    pub attribute: String,
    /// Measurement (or observation) key declared under OBSERVATIONS.
    pub key: String,
    /// Row filter of the form `<column> <op> <comparand>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Constant literal used instead of the cell content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The parsed annotation template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotationModel {
    /// META key/value pairs (e.g. `data_identifier`).
    pub meta: BTreeMap<String, String>,
    /// Namespace prefix → base IRI.
    pub namespaces: BTreeMap<String, String>,
    /// TRIPLES rows in template order.
    pub static_triples: Vec<StaticTriple>,
    /// Observation key → parent key (root observations map to themselves).
    pub observations: BTreeMap<String, String>,
    /// Observation key → entity type token.
    pub entities: BTreeMap<String, String>,
    /// Measurement key → owning observation key.
    pub measurements: BTreeMap<String, String>,
    /// Measurement key → characteristic type token.
    pub characteristics: BTreeMap<String, String>,
    /// Measurement key → standard type token.
    pub standards: BTreeMap<String, String>,
    /// Measurement key → conversion type token.
    pub conversions: BTreeMap<String, String>,
    /// Measurement key → literal datatype token.
    pub datatypes: BTreeMap<String, String>,
    /// Observation key → context observation key.
    pub contexts: BTreeMap<String, String>,
    /// MAPPINGS rows in template order.
    pub mappings: Vec<Mapping>,
}

/// META key naming the dataset location.
pub const DATA_IDENTIFIER: &str = "data_identifier";

impl AnnotationModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dataset path or URL declared in META, if any.
    #[must_use]
    pub fn data_identifier(&self) -> Option<&str> {
        self.meta
            .get(DATA_IDENTIFIER)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Returns the observation owning `key`.
    ///
    /// A measurement key resolves to the observation it was declared under;
    /// an observation key resolves to itself.
    #[must_use]
    pub fn owning_observation(&self, key: &str) -> Option<&str> {
        if let Some(obs) = self.measurements.get(key) {
            return Some(obs.as_str());
        }
        self.observations.get_key_value(key).map(|(k, _)| k.as_str())
    }

    /// Returns mapping keys that name neither a measurement nor an
    /// observation, in mapping order and without repeats.
    #[must_use]
    pub fn unresolved_mapping_keys(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for mapping in &self.mappings {
            let key = mapping.key.as_str();
            let known =
                self.measurements.contains_key(key) || self.observations.contains_key(key);
            if !known && !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    /// Returns the number of declared measurements.
    #[must_use]
    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    /// Returns the number of declared observations.
    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }
}

/// Standard IRI constants used by the triple builder and serializers.
pub mod iris {
    /// OWL namespace.
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    /// RDF namespace.
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// RDFS namespace.
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// XSD namespace.
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    /// OBOE core namespace.
    pub const OBOE: &str = "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#";

    /// Prefixes available to every template unless it redeclares them.
    pub const WELL_KNOWN: &[(&str, &str)] = &[
        ("oboe", OBOE),
        ("owl", OWL),
        ("rdf", RDF),
        ("rdfs", RDFS),
        ("xsd", XSD),
    ];

    /// Looks up a well-known prefix.
    #[must_use]
    pub fn well_known(prefix: &str) -> Option<&'static str> {
        WELL_KNOWN
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, iri)| *iri)
    }

    /// `rdf:type`.
    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// `rdf:label`, the label predicate used for observations and measurements.
    pub const RDF_LABEL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#label";
    /// `rdf:first`.
    pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    /// `rdf:rest`.
    pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    /// `rdf:nil`.
    pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
    /// `owl:Class`.
    pub const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    /// `owl:unionOf`.
    pub const OWL_UNION_OF: &str = "http://www.w3.org/2002/07/owl#unionOf";
    /// `xsd:string`.
    pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// `oboe:Observation`.
    pub const OBOE_OBSERVATION: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#Observation";
    /// `oboe:Measurement`.
    pub const OBOE_MEASUREMENT: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#Measurement";
    /// `oboe:hasValue`.
    pub const OBOE_HAS_VALUE: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#hasValue";
    /// `oboe:hasMeasurement`.
    pub const OBOE_HAS_MEASUREMENT: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#hasMeasurement";
    /// `oboe:hasContext`.
    pub const OBOE_HAS_CONTEXT: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#hasContext";
    /// `oboe:ofEntity`.
    pub const OBOE_OF_ENTITY: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#ofEntity";
    /// `oboe:ofCharacteristic`.
    pub const OBOE_OF_CHARACTERISTIC: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#ofCharacteristic";
    /// `oboe:usesStandard`.
    pub const OBOE_USES_STANDARD: &str =
        "http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#usesStandard";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_measurement() -> AnnotationModel {
        let mut model = AnnotationModel::new();
        model.observations.insert("o1".into(), "o1".into());
        model.measurements.insert("m1".into(), "o1".into());
        model
    }

    #[test]
    fn owning_observation_resolves_measurements_and_observations() {
        let model = model_with_measurement();
        assert_eq!(model.owning_observation("m1"), Some("o1"));
        assert_eq!(model.owning_observation("o1"), Some("o1"));
        assert_eq!(model.owning_observation("m9"), None);
    }

    #[test]
    fn unresolved_keys_are_reported_once() {
        let mut model = model_with_measurement();
        for key in ["m1", "m2", "m2", "o1"] {
            model.mappings.push(Mapping {
                attribute: "col".into(),
                key: key.into(),
                condition: None,
                value: None,
            });
        }
        assert_eq!(model.unresolved_mapping_keys(), vec!["m2"]);
    }

    #[test]
    fn blank_data_identifier_is_absent() {
        let mut model = AnnotationModel::new();
        model.meta.insert(DATA_IDENTIFIER.into(), "  ".into());
        assert_eq!(model.data_identifier(), None);
    }

    #[test]
    fn well_known_prefixes() {
        assert_eq!(iris::well_known("oboe"), Some(iris::OBOE));
        assert_eq!(iris::well_known("foo"), None);
    }
}
