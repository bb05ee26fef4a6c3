//! Annotation template parser.
//!
//! A template is a comma-separated file divided into sections by all-caps
//! header rows (`META`, `NAMESPACES`, `TRIPLES`, `OBSERVATIONS`, `MAPPINGS`,
//! `DATATYPES`). Inside `OBSERVATIONS` the column of a row's first non-empty
//! cell gives its depth in the observation tree:
//!
//! ```text
//! OBSERVATIONS
//! observation,o1
//! ,entity,e1,foo:Fish
//! ,measurement,m1
//! ,,characteristic,oboe:Length
//! ,,standard,oboe:Centimeter
//! ```
//!
//! The parser does no I/O beyond reading the template itself. Malformed rows
//! are logged, recorded in [`Template::skipped`] and otherwise ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{AnnotationModel, Mapping, StaticTriple};

/// Marker that starts a comment row or cell.
pub const COMMENT_MARKER: char = '#';

/// The section a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Before the first header.
    None,
    /// `META`: `key, value`.
    Meta,
    /// `NAMESPACES`: `prefix, iri`.
    Namespaces,
    /// `TRIPLES`: `subject, predicate, object`.
    Triples,
    /// `OBSERVATIONS`: the indented observation tree.
    Observations,
    /// `MAPPINGS`: `attribute, key[, condition[, value]]`.
    Mappings,
    /// `DATATYPES`: `measurement-key, datatype`.
    Datatypes,
}

impl Section {
    /// Recognizes a section header cell.
    #[must_use]
    pub fn from_header(cell: &str) -> Option<Self> {
        match cell.trim() {
            "META" => Some(Self::Meta),
            "NAMESPACES" => Some(Self::Namespaces),
            "TRIPLES" => Some(Self::Triples),
            "OBSERVATIONS" => Some(Self::Observations),
            "MAPPINGS" => Some(Self::Mappings),
            "DATATYPES" => Some(Self::Datatypes),
            _ => None,
        }
    }
}

/// A template row that was not registered in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the template.
    pub line: usize,
    /// Why the row was ignored.
    pub reason: String,
}

/// A parsed template.
#[derive(Debug, Clone, Default)]
pub struct Template {
    /// The annotation model.
    pub model: AnnotationModel,
    /// Rows dropped as malformed, in file order.
    pub skipped: Vec<SkippedRow>,
}

impl Template {
    /// Reads and parses the template at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::TemplateNotFound`] if the file does not exist,
    /// [`Error::Io`] if it cannot be opened and [`Error::Csv`] if it is not
    /// valid delimited UTF-8 text.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::TemplateNotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        debug!(template = %path.display(), "parsing annotation template");
        Self::from_reader(file)
    }

    /// Parses template text from any reader.
    ///
    /// # Errors
    ///
    /// [`Error::Csv`] if the input is not valid delimited UTF-8 text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut parser = Parser::default();
        for (i, record) in csv.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map_or(i + 1, |p| usize::try_from(p.line()).unwrap_or(i + 1));
            let cells: Vec<String> = record.iter().map(str::to_owned).collect();
            parser.row(line, cells);
        }
        Ok(parser.finish())
    }

    /// Parses rows that are already split into cells. Lines are numbered
    /// from 1 in iteration order.
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parser = Parser::default();
        for (i, row) in rows.into_iter().enumerate() {
            parser.row(i + 1, row.into_iter().map(Into::into).collect());
        }
        parser.finish()
    }
}

/// Parser state: the active section and the path from the current
/// observation down to the row being read, as `(node-type, key)` pairs.
#[derive(Debug)]
struct Parser {
    model: AnnotationModel,
    skipped: Vec<SkippedRow>,
    section: Section,
    stack: Vec<(String, String)>,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            model: AnnotationModel::new(),
            skipped: Vec::new(),
            section: Section::None,
            stack: Vec::new(),
        }
    }
}

fn cell(cells: &[String], i: usize) -> &str {
    cells.get(i).map_or("", |c| c.trim())
}

impl Parser {
    fn finish(self) -> Template {
        Template {
            model: self.model,
            skipped: self.skipped,
        }
    }

    fn skip(&mut self, line: usize, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(line, %reason, "skipping template row");
        self.skipped.push(SkippedRow { line, reason });
    }

    fn row(&mut self, line: usize, mut cells: Vec<String>) {
        if cell(&cells, 0).starts_with(COMMENT_MARKER) {
            return;
        }
        for c in &mut cells {
            if c.trim_start().starts_with(COMMENT_MARKER) {
                c.clear();
            }
        }
        if cells.iter().all(|c| c.trim().is_empty()) {
            return;
        }
        if let Some(section) = Section::from_header(cell(&cells, 0)) {
            debug!(line, ?section, "section");
            self.section = section;
            return;
        }

        match self.section {
            Section::None => self.skip(line, "row appears before any section header"),
            Section::Meta => self.meta(line, &cells),
            Section::Namespaces => self.namespace(line, &cells),
            Section::Triples => self.triple(line, &cells),
            Section::Observations => self.observation_tree(line, &cells),
            Section::Mappings => self.mapping(line, &cells),
            Section::Datatypes => self.datatype(line, &cells),
        }
    }

    fn meta(&mut self, line: usize, cells: &[String]) {
        let (key, value) = (cell(cells, 0), cell(cells, 1));
        if key.is_empty() || value.is_empty() {
            return self.skip(line, "META rows need a key and a value");
        }
        self.model.meta.insert(key.to_owned(), value.to_owned());
    }

    fn namespace(&mut self, line: usize, cells: &[String]) {
        let prefix = cell(cells, 0).trim_end_matches(':');
        let iri = cell(cells, 1);
        if iri.is_empty() {
            return self.skip(line, "NAMESPACES rows need a prefix and an IRI");
        }
        self.model
            .namespaces
            .insert(prefix.to_owned(), iri.to_owned());
    }

    fn triple(&mut self, line: usize, cells: &[String]) {
        let (s, p, o) = (cell(cells, 0), cell(cells, 1), cell(cells, 2));
        if s.is_empty() || p.is_empty() || o.is_empty() {
            return self.skip(line, "TRIPLES rows need a subject, predicate and object");
        }
        self.model.static_triples.push(StaticTriple {
            subject: s.to_owned(),
            predicate: p.to_owned(),
            object: o.to_owned(),
        });
    }

    fn mapping(&mut self, line: usize, cells: &[String]) {
        let (attribute, key) = (cell(cells, 0), cell(cells, 1));
        if attribute.is_empty() || key.is_empty() {
            return self.skip(line, "MAPPINGS rows need an attribute and a key");
        }
        let optional = |s: &str| (!s.is_empty()).then(|| s.to_owned());
        self.model.mappings.push(Mapping {
            attribute: attribute.to_owned(),
            key: key.to_owned(),
            condition: optional(cell(cells, 2)),
            value: optional(cell(cells, 3)),
        });
    }

    fn datatype(&mut self, line: usize, cells: &[String]) {
        let (key, datatype) = (cell(cells, 0), cell(cells, 1));
        if key.is_empty() || datatype.is_empty() {
            return self.skip(line, "DATATYPES rows need a measurement key and a datatype");
        }
        self.model
            .datatypes
            .insert(key.to_owned(), datatype.to_owned());
    }

    /// Adjusts the stack for this row's depth, then registers the row.
    fn observation_tree(&mut self, line: usize, cells: &[String]) {
        let Some(index) = cells.iter().position(|c| !c.trim().is_empty()) else {
            return;
        };
        let depth = index + 1;
        let pair = (cell(cells, index).to_owned(), cell(cells, index + 1).to_owned());

        let len = self.stack.len();
        if depth == len {
            self.stack.pop();
        } else if depth < len {
            self.stack.truncate(depth - 1);
        }
        self.stack.push(pair);

        if self.stack.len() != depth {
            return self.skip(
                line,
                format!("row at depth {depth} is not nested under a depth {} row", depth - 1),
            );
        }

        let kind = cell(cells, index).to_ascii_lowercase();
        let first = cell(cells, index + 1);
        let second = cell(cells, index + 2);
        match depth {
            1 => self.observation(line, &kind, first),
            2 => {
                let parent = self.stack[0].1.clone();
                self.observation_child(line, &kind, &parent, first, second);
            }
            3 => {
                let parent = self.stack[1].1.clone();
                self.measurement_child(line, &kind, &parent, first);
            }
            _ => self.skip(line, format!("observation tree rows nest at most 3 deep, got {depth}")),
        }
    }

    fn observation(&mut self, line: usize, kind: &str, key: &str) {
        if kind != "observation" {
            return self.skip(line, format!("expected 'observation', found '{kind}'"));
        }
        if key.is_empty() {
            return self.skip(line, "observation rows need a key");
        }
        self.model
            .observations
            .insert(key.to_owned(), key.to_owned());
    }

    fn observation_child(&mut self, line: usize, kind: &str, parent: &str, first: &str, second: &str) {
        if !self.model.observations.contains_key(parent) {
            return self.skip(line, format!("'{kind}' row has no valid parent observation"));
        }
        match kind {
            "entity" => {
                // `entity, <label>, <type>` or just `entity, <type>`
                let entity_type = if !second.is_empty() {
                    second
                } else if first.contains(':') {
                    first
                } else {
                    return self.skip(line, "entity rows need an entity type");
                };
                self.model
                    .entities
                    .insert(parent.to_owned(), entity_type.to_owned());
            }
            "measurement" => {
                if first.is_empty() {
                    return self.skip(line, "measurement rows need a key");
                }
                self.model
                    .measurements
                    .insert(first.to_owned(), parent.to_owned());
            }
            "context" => {
                if first.is_empty() {
                    return self.skip(line, "context rows need an observation key");
                }
                self.model
                    .contexts
                    .insert(parent.to_owned(), first.to_owned());
            }
            other => self.skip(
                line,
                format!("unknown observation member '{other}' (expected entity, measurement or context)"),
            ),
        }
    }

    fn measurement_child(&mut self, line: usize, kind: &str, parent: &str, type_token: &str) {
        if !self.model.measurements.contains_key(parent) {
            return self.skip(line, format!("'{kind}' row is not nested under a measurement"));
        }
        if type_token.is_empty() {
            return self.skip(line, format!("{kind} rows need a type"));
        }
        let table = match kind {
            "characteristic" => &mut self.model.characteristics,
            "standard" => &mut self.model.standards,
            "conversion" => &mut self.model.conversions,
            "datatype" => &mut self.model.datatypes,
            other => {
                return self.skip(
                    line,
                    format!("unknown measurement member '{other}' (expected characteristic, standard, conversion or datatype)"),
                )
            }
        };
        table.insert(parent.to_owned(), type_token.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Template {
        Template::from_reader(text.as_bytes()).unwrap_or_default()
    }

    const FULL: &str = "\
META
data_identifier,data.csv
NAMESPACES
foo,http://foo.org/#
TRIPLES
foo:A,rdfs:subClassOf,foo:B
OBSERVATIONS
# fish observations
observation,o1
,entity,e1,foo:Fish
,measurement,m1
,,characteristic,oboe:Length
,,standard,oboe:Centimeter
,,datatype,xsd:decimal
,measurement,m2
,,characteristic,oboe:Count
observation,o2
,measurement,m3
,context,o1
MAPPINGS
len,m1
n,m2,spp eq shad,1
site,m3
";

    #[test]
    fn parses_every_section() {
        let t = parse(FULL);
        let m = &t.model;
        assert!(t.skipped.is_empty(), "{:?}", t.skipped);
        assert_eq!(m.data_identifier(), Some("data.csv"));
        assert_eq!(m.namespaces.get("foo").map(String::as_str), Some("http://foo.org/#"));
        assert_eq!(m.static_triples.len(), 1);
        assert_eq!(m.observations.len(), 2);
        assert_eq!(m.entities.get("o1").map(String::as_str), Some("foo:Fish"));
        assert_eq!(m.measurements.get("m1").map(String::as_str), Some("o1"));
        assert_eq!(m.measurements.get("m2").map(String::as_str), Some("o1"));
        assert_eq!(m.measurements.get("m3").map(String::as_str), Some("o2"));
        assert_eq!(m.characteristics.get("m1").map(String::as_str), Some("oboe:Length"));
        assert_eq!(m.characteristics.get("m2").map(String::as_str), Some("oboe:Count"));
        assert_eq!(m.standards.get("m1").map(String::as_str), Some("oboe:Centimeter"));
        assert_eq!(m.datatypes.get("m1").map(String::as_str), Some("xsd:decimal"));
        assert_eq!(m.contexts.get("o2").map(String::as_str), Some("o1"));
        assert_eq!(m.mappings.len(), 3);
        assert_eq!(m.mappings[1].condition.as_deref(), Some("spp eq shad"));
        assert_eq!(m.mappings[1].value.as_deref(), Some("1"));
        assert_eq!(m.mappings[2].condition, None);
    }

    #[test]
    fn dedent_then_sibling_reparents() {
        let t = Template::from_rows(vec![
            vec!["OBSERVATIONS"],
            vec!["observation", "o1"],
            vec!["", "measurement", "m1"],
            vec!["", "", "characteristic", "a:C"],
            vec!["observation", "o2"],
            vec!["", "measurement", "m2"],
        ]);
        assert_eq!(t.model.measurements.get("m2").map(String::as_str), Some("o2"));
        assert_eq!(t.model.characteristics.len(), 1);
    }

    #[test]
    fn sections_are_order_independent() {
        let t = parse("MAPPINGS\nx,m1\nNAMESPACES\na,http://a/\nMAPPINGS\ny,m1\n");
        assert_eq!(t.model.mappings.len(), 2);
        assert_eq!(t.model.namespaces.len(), 1);
    }

    #[test]
    fn later_meta_rows_overwrite() {
        let t = parse("META\nk,1\nk,2\n");
        assert_eq!(t.model.meta.get("k").map(String::as_str), Some("2"));
    }

    #[test]
    fn comments_and_blank_rows_are_ignored() {
        let t = parse("#header comment\n,,,\nTRIPLES\na:S,a:p,a:O,# trailing note\n# a:X,a:p,a:Y\n");
        assert!(t.skipped.is_empty());
        assert_eq!(t.model.static_triples.len(), 1);
    }

    #[test]
    fn malformed_rows_are_skipped_and_parsing_continues() {
        let t = parse(
            "stray,row\nTRIPLES\na:S,a:p\na:S,a:p,a:O\nMAPPINGS\nonly_attribute\nx,m1\n",
        );
        assert_eq!(t.skipped.len(), 3);
        assert_eq!(t.skipped[0].line, 1);
        assert_eq!(t.model.static_triples.len(), 1);
        assert_eq!(t.model.mappings.len(), 1);
    }

    #[test]
    fn skipped_indentation_level_is_reported() {
        let t = Template::from_rows(vec![
            vec!["OBSERVATIONS"],
            vec!["observation", "o1"],
            vec!["", "", "characteristic", "a:C"],
            vec!["", "measurement", "m1"],
        ]);
        assert_eq!(t.skipped.len(), 1);
        assert!(t.model.characteristics.is_empty());
        assert_eq!(t.model.measurements.get("m1").map(String::as_str), Some("o1"));
    }

    #[test]
    fn members_need_valid_parents() {
        let t = Template::from_rows(vec![
            vec!["OBSERVATIONS"],
            vec!["observation", ""],
            vec!["", "measurement", "m1"],
            vec!["observation", "o2"],
            vec!["", "entity", "e2", "a:Fish"],
            vec!["", "", "standard", "a:S"],
            vec!["", "widget", "w"],
        ]);
        // empty observation key, orphan measurement, standard under an entity, unknown member
        assert_eq!(t.skipped.len(), 4);
        assert!(t.model.measurements.is_empty());
        assert!(t.model.standards.is_empty());
        assert_eq!(t.model.entities.get("o2").map(String::as_str), Some("a:Fish"));
    }

    #[test]
    fn entity_type_may_follow_keyword_directly() {
        let t = Template::from_rows(vec![
            vec!["OBSERVATIONS"],
            vec!["observation", "o1"],
            vec!["", "entity", "a:Tree"],
        ]);
        assert_eq!(t.model.entities.get("o1").map(String::as_str), Some("a:Tree"));
    }

    #[test]
    fn datatype_section_registers_datatypes() {
        let t = parse("DATATYPES\nm1,xsd:integer\n");
        assert_eq!(t.model.datatypes.get("m1").map(String::as_str), Some("xsd:integer"));
    }

    #[test]
    fn missing_template_is_fatal() {
        let result = Template::from_path(Path::new("/nonexistent/template.csv"));
        assert!(matches!(result, Err(Error::TemplateNotFound(_))));
    }
}
