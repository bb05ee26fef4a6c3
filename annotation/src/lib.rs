//! OBOE annotation templates encoded as RDF.
//!
//! The `oboe-annotation` crate reads an annotation template, a sectioned CSV
//! file describing observations, entities, measurements, characteristics and
//! standards, and joins it against the rows of a tabular dataset to produce
//! a graph of uniquely identified triples. The graph can be written as
//! Turtle, N-Triples or JSON-LD.
//!
//! # Entry Point
//!
//! ```no_run
//! use oboe_annotation::{run, RunConfig, Syntax};
//!
//! let config = RunConfig::new("fish.csv").with_syntax(Syntax::Turtle);
//! let output = run(&config)?;
//! println!("{} triples written to {}", output.annotation.graph.len(), output.path.display());
//! # Ok::<(), oboe_annotation::Error>(())
//! ```
//!
//! # Parsing only
//!
//! ```
//! let template = oboe_annotation::Template::from_reader(
//!     "OBSERVATIONS\nobservation,o1\n,measurement,m1\nMAPPINGS\nlen,m1\n".as_bytes(),
//! )?;
//! assert_eq!(template.model.measurement_count(), 1);
//! # Ok::<(), oboe_annotation::Error>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod builder;
pub mod condition;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod mapping;
pub mod model;
pub mod pipeline;
pub mod serializer;
pub mod skeleton;
pub mod template;
pub mod term;
pub mod tracker;

pub use builder::TriplesBuilder;
pub use condition::{Coercion, Condition, Operator};
pub use dataset::Dataset;
pub use error::{Error, Result};
pub use graph::{Graph, Triple};
pub use mapping::{MappingEngine, MappingSummary};
pub use model::{AnnotationModel, Mapping, StaticTriple};
pub use pipeline::{resolve_dataset, run, Annotation, Annotator, RunConfig, RunOutput};
pub use serializer::Syntax;
pub use template::{Section, SkippedRow, Template};
pub use term::{Literal, Term, Token};
pub use tracker::ValueTracker;
