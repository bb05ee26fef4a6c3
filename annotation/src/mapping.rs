//! Joins the annotation model against dataset rows.
//!
//! Each mapping selects rows of its attribute column (all of them, or those
//! passing its condition) and, per selected row, materializes a measurement
//! node linked to its observation, entity, context, characteristic and
//! standard. Node identifiers are derived from the mapping index and the
//! original row index, so two runs over the same inputs agree exactly.

use tracing::{debug, info, warn};

use crate::builder::TriplesBuilder;
use crate::condition::{Coercion, Condition};
use crate::dataset::{Column, Dataset};
use crate::error::Result;
use crate::model::{iris, AnnotationModel, Mapping};
use crate::term::{Term, Token};
use crate::tracker::ValueTracker;

/// Counters reported after all mappings ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingSummary {
    /// Mappings that produced output (possibly zero rows).
    pub applied: usize,
    /// Mappings skipped with a warning.
    pub skipped: usize,
    /// Measurement nodes emitted.
    pub measurements: usize,
}

/// Applies every mapping of a model to one dataset.
#[derive(Debug, Clone, Copy)]
pub struct MappingEngine<'a> {
    model: &'a AnnotationModel,
    dataset: &'a Dataset,
    coercion: Coercion,
}

impl<'a> MappingEngine<'a> {
    /// Creates an engine with [`Coercion::Native`] comparisons.
    #[must_use]
    pub fn new(model: &'a AnnotationModel, dataset: &'a Dataset) -> Self {
        Self {
            model,
            dataset,
            coercion: Coercion::default(),
        }
    }

    /// Sets how condition comparands are compared with cells.
    #[must_use]
    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    /// Processes the mappings in template order.
    ///
    /// # Errors
    ///
    /// [`crate::Error::DuplicateUse`] if a cell is consumed twice, and any
    /// term resolution error from the builder (unknown prefix, invalid
    /// type token, empty union).
    pub fn run(
        &self,
        builder: &mut TriplesBuilder<'_>,
        tracker: &mut ValueTracker,
    ) -> Result<MappingSummary> {
        let mut summary = MappingSummary::default();
        for (i, mapping) in self.model.mappings.iter().enumerate() {
            let index = i + 1;
            match self.rows_for(index, mapping) {
                Some((column, rows)) => {
                    tracker.touch(&mapping.attribute);
                    self.warn_if_unresolved(index, mapping);
                    for row in rows {
                        self.emit_row(index, mapping, column, row, builder)?;
                        tracker.record(&mapping.attribute, row)?;
                        summary.measurements += 1;
                    }
                    summary.applied += 1;
                }
                None => summary.skipped += 1,
            }
        }
        info!(
            applied = summary.applied,
            skipped = summary.skipped,
            measurements = summary.measurements,
            "mappings processed"
        );
        Ok(summary)
    }

    /// The attribute column and selected rows of a mapping, or `None` if the
    /// mapping must be skipped.
    fn rows_for(&self, index: usize, mapping: &Mapping) -> Option<(&'a Column, Vec<usize>)> {
        let Some(column) = self.dataset.column(&mapping.attribute) else {
            warn!(
                mapping = index,
                attribute = %mapping.attribute,
                "attribute is not a dataset column, skipping mapping"
            );
            return None;
        };
        let Some(text) = mapping.condition.as_deref() else {
            return Some((column, (0..column.len()).collect()));
        };
        let condition = match Condition::parse(text) {
            Ok(condition) => condition,
            Err(e) => {
                warn!(mapping = index, condition = %text, "{e}, skipping mapping");
                return None;
            }
        };
        let Some(filter) = self.dataset.column(&condition.column) else {
            warn!(
                mapping = index,
                column = %condition.column,
                "condition column is not in the dataset, skipping mapping"
            );
            return None;
        };
        let rows = condition.select(filter, self.coercion);
        debug!(mapping = index, %condition, matched = rows.len(), "condition applied");
        Some((column, rows))
    }

    fn warn_if_unresolved(&self, index: usize, mapping: &Mapping) {
        if self.model.owning_observation(&mapping.key).is_none() {
            warn!(
                mapping = index,
                key = %mapping.key,
                "mapping key names no declared measurement or observation"
            );
        }
    }

    fn emit_row(
        &self,
        index: usize,
        mapping: &Mapping,
        column: &Column,
        row: usize,
        builder: &mut TriplesBuilder<'_>,
    ) -> Result<()> {
        let model = self.model;
        let key = mapping.key.as_str();
        let measurement_label = format!("m{index}_row{row}");
        let measurement = Term::blank(measurement_label.as_str());

        let text = match &mapping.value {
            Some(value) => value.clone(),
            None => column.get(row).map(|c| c.text.clone()).unwrap_or_default(),
        };
        let literal = match model.datatypes.get(key) {
            Some(datatype) => Token::typed_literal(text, datatype.as_str()),
            None => Token::literal(text),
        };

        typed(builder, &measurement, Token::Iri(iris::OBOE_MEASUREMENT.to_owned()))?;
        builder.add(
            measurement.clone().into(),
            Token::Iri(iris::OBOE_HAS_VALUE.to_owned()),
            literal,
        )?;
        labelled(builder, &measurement, &mapping.attribute);

        if let Some(obs_key) = model.owning_observation(key) {
            let observation = observation_node(obs_key, row);
            typed(builder, &observation, Token::Iri(iris::OBOE_OBSERVATION.to_owned()))?;
            labelled(builder, &observation, obs_key);
            builder.insert(
                observation.clone(),
                Term::iri(iris::OBOE_HAS_MEASUREMENT),
                measurement.clone(),
            );

            if let Some(context) = model.contexts.get(obs_key) {
                builder.insert(
                    observation.clone(),
                    Term::iri(iris::OBOE_HAS_CONTEXT),
                    observation_node(context, row),
                );
            }
            if let Some(entity_type) = model.entities.get(obs_key) {
                let entity = Term::blank(format!("{obs_key}row{row}_entity"));
                typed(builder, &entity, Token::parse(entity_type)?)?;
                builder.insert(observation, Term::iri(iris::OBOE_OF_ENTITY), entity);
            }
        }

        if let Some(characteristic) = model.characteristics.get(key) {
            let node = Term::blank(format!("{measurement_label}_characteristic"));
            typed(builder, &node, Token::parse(characteristic)?)?;
            builder.insert(
                measurement.clone(),
                Term::iri(iris::OBOE_OF_CHARACTERISTIC),
                node,
            );
        }
        if let Some(standard) = model.standards.get(key) {
            let node = Term::blank(format!("{measurement_label}_standard"));
            typed(builder, &node, Token::parse(standard)?)?;
            builder.insert(measurement, Term::iri(iris::OBOE_USES_STANDARD), node);
        }
        Ok(())
    }
}

fn observation_node(key: &str, row: usize) -> Term {
    Term::blank(format!("{key}row{row}"))
}

fn typed(builder: &mut TriplesBuilder<'_>, node: &Term, class: Token) -> Result<bool> {
    builder.add(
        node.clone().into(),
        Token::Iri(iris::RDF_TYPE.to_owned()),
        class,
    )
}

fn labelled(builder: &mut TriplesBuilder<'_>, node: &Term, label: &str) -> bool {
    builder.insert(node.clone(), Term::iri(iris::RDF_LABEL), Term::literal(label))
}
