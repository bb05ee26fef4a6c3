//! Starter templates generated from a dataset's columns.
//!
//! Every column gets its own observation block (`o<i>`, entity `e<i>`,
//! measurement `m<i>`) whose class tokens are `foo:EditMe` placeholders, and a
//! MAPPINGS row binding the column to `m<i>`. The result parses as-is, so an
//! author can run it immediately and refine the placeholders afterwards.
//! Columns whose name would read back as a section header or a comment are
//! left out with a warning.

use std::io;

use tracing::warn;

use crate::error::Result;
use crate::model::{iris, DATA_IDENTIFIER};
use crate::template::{Section, COMMENT_MARKER};

/// Placeholder class token written for every type the author must fill in.
pub const PLACEHOLDER: &str = "foo:EditMe";

const PLACEHOLDER_NAMESPACE: &str = "http://example.org/edit-me#";

/// Renders a template for `columns` reading from `data_identifier`.
///
/// # Errors
///
/// [`crate::Error::Csv`] if a row cannot be written.
pub fn generate<S: AsRef<str>>(columns: &[S], data_identifier: &str) -> Result<String> {
    let columns: Vec<&str> = columns
        .iter()
        .map(|c| {
            let c: &str = c.as_ref();
            c
        })
        .filter(|c| mappable(c))
        .collect();

    let mut out = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    out.write_record(["META"])?;
    out.write_record([DATA_IDENTIFIER, data_identifier])?;

    out.write_record(["NAMESPACES"])?;
    out.write_record(["rdf", iris::RDF])?;
    out.write_record(["oboe", iris::OBOE])?;
    out.write_record(["foo", PLACEHOLDER_NAMESPACE])?;

    out.write_record(["TRIPLES"])?;

    out.write_record(["OBSERVATIONS"])?;
    for (i, column) in columns.iter().enumerate() {
        let n = i + 1;
        out.write_record([format!("#{column}")])?;
        out.write_record(["observation".to_owned(), format!("o{n}")])?;
        out.write_record(["", "entity", format!("e{n}").as_str(), PLACEHOLDER])?;
        out.write_record(["".to_owned(), "measurement".to_owned(), format!("m{n}")])?;
        for kind in ["characteristic", "standard", "datatype"] {
            out.write_record(["", "", kind, PLACEHOLDER])?;
        }
    }

    out.write_record(["MAPPINGS"])?;
    for (i, column) in columns.iter().enumerate() {
        out.write_record([*column, format!("m{}", i + 1).as_str()])?;
    }

    let bytes = out
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| csv::Error::from(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    Ok(text)
}

/// Returns false, with a warning, for a column name the template parser
/// would not read back as a MAPPINGS attribute.
fn mappable(column: &str) -> bool {
    let name = column.trim();
    let problem = if name.is_empty() {
        "is empty"
    } else if name.starts_with(COMMENT_MARKER) {
        "would be read as a comment"
    } else if Section::from_header(name).is_some() {
        "would be read as a section header"
    } else {
        return true;
    };
    warn!(column, "column name {problem}, leaving it out of the skeleton");
    false
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::template::Template;

    #[test]
    fn one_block_per_column_reparses() {
        let text = generate(&["spp", "len", "site name"], "data/catch.csv").unwrap();
        let template = Template::from_reader(text.as_bytes()).unwrap();
        let model = &template.model;

        assert!(template.skipped.is_empty(), "{:?}", template.skipped);
        assert_eq!(model.data_identifier(), Some("data/catch.csv"));
        assert_eq!(model.observation_count(), 3);
        assert_eq!(model.measurement_count(), 3);
        assert_eq!(model.mappings.len(), 3);
        assert_eq!(model.mappings[2].attribute, "site name");
        assert_eq!(model.mappings[2].key, "m3");
        assert_eq!(model.measurements.get("m2").map(String::as_str), Some("o2"));
        assert_eq!(model.characteristics.get("m1").map(String::as_str), Some(PLACEHOLDER));
        assert_eq!(model.datatypes.get("m3").map(String::as_str), Some(PLACEHOLDER));
        assert!(model.unresolved_mapping_keys().is_empty());
    }

    #[test]
    fn comment_rows_name_the_column() {
        let text = generate(&["spp"], "x.csv").unwrap();
        assert!(text.lines().any(|l| l == "#spp"));
    }

    #[test]
    fn header_and_comment_names_are_left_out() {
        let text = generate(&["spp", "META", "#note", " ", "len"], "x.csv").unwrap();
        let template = Template::from_reader(text.as_bytes()).unwrap();
        let model = &template.model;
        assert!(template.skipped.is_empty(), "{:?}", template.skipped);
        let attributes: Vec<(&str, &str)> = model
            .mappings
            .iter()
            .map(|m| (m.attribute.as_str(), m.key.as_str()))
            .collect();
        assert_eq!(attributes, vec![("spp", "m1"), ("len", "m2")]);
        assert_eq!(model.observation_count(), 2);
        assert_eq!(model.meta.len(), 1);
    }

    #[test]
    fn no_columns_still_parses() {
        let empty: [&str; 0] = [];
        let text = generate(&empty, "x.csv").unwrap();
        let template = Template::from_reader(text.as_bytes()).unwrap();
        assert!(template.model.mappings.is_empty());
    }
}
