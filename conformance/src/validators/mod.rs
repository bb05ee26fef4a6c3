//! Annotation artifact validators.
//!
//! - [`rdf`] re-parses the written graph and checks its triple count
//! - [`template`] lints the annotation model the graph was built from

pub mod rdf;
pub mod template;
