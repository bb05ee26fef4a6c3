//! Tabular dataset reader.
//!
//! The layout is chosen from the first line: a comma means comma-separated,
//! otherwise a tab means tab-separated, otherwise the file is read as
//! fixed-width text whose column boundaries are the character positions that
//! are blank on every line. The first row names the columns.
//!
//! Each column is typed as a whole: integer if every present cell parses as
//! an integer, float if every present cell parses as a number, text
//! otherwise. Cells keep their original text, which is what gets emitted as
//! a literal. Row indices are 0-based positions in the file and never change,
//! so filtered views can refer back to them.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// How the dataset's columns are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Comma-separated values.
    Comma,
    /// Tab-separated values.
    Tab,
    /// Whitespace-aligned fixed-width columns.
    FixedWidth,
}

/// Picks the layout from the first line of a dataset. Comma wins over tab.
#[must_use]
pub fn detect_layout(first_line: &str) -> Layout {
    if first_line.contains(',') {
        Layout::Comma
    } else if first_line.contains('\t') {
        Layout::Tab
    } else {
        Layout::FixedWidth
    }
}

/// The inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every present cell is an integer.
    Integer,
    /// Every present cell is a number.
    Float,
    /// Anything else.
    Text,
}

impl ColumnKind {
    /// Returns true for integer and float columns.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// A typed cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Empty or a missing-value marker.
    Missing,
    /// Cell of an integer column.
    Integer(i64),
    /// Cell of a float column.
    Float(f64),
    /// Cell of a text column.
    Text,
}

impl Value {
    /// Numeric view of integer and float cells.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(i as f64),
            Self::Float(f) => Some(f),
            Self::Missing | Self::Text => None,
        }
    }
}

/// One cell: its original text and its typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Text as it appeared in the file, trimmed.
    pub text: String,
    /// Typed value according to the column kind.
    pub value: Value,
}

impl Cell {
    /// Returns true for empty or missing-value cells.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.value == Value::Missing
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Markers read as missing values in numeric columns. An empty cell is
/// missing in every column.
const MISSING_MARKERS: &[&str] = &["NA", "NaN", "nan"];

fn is_missing(text: &str) -> bool {
    text.is_empty() || MISSING_MARKERS.contains(&text)
}

/// A named column.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    /// Builds a column from raw cell text, inferring its kind.
    pub fn new(name: impl Into<String>, raw: Vec<String>) -> Self {
        let present = || raw.iter().map(|s| s.trim()).filter(|s| !is_missing(s));
        let kind = if present().all(|s| s.parse::<i64>().is_ok()) {
            ColumnKind::Integer
        } else if present().all(|s| s.parse::<f64>().is_ok()) {
            ColumnKind::Float
        } else {
            ColumnKind::Text
        };
        let cells = raw
            .into_iter()
            .map(|text| {
                let text = text.trim().to_owned();
                let value = if text.is_empty() || (kind.is_numeric() && is_missing(&text)) {
                    Value::Missing
                } else {
                    match kind {
                        ColumnKind::Integer => text.parse().map_or(Value::Text, Value::Integer),
                        ColumnKind::Float => text.parse().map_or(Value::Text, Value::Float),
                        ColumnKind::Text => Value::Text,
                    }
                };
                Cell { text, value }
            })
            .collect();
        Self {
            name: name.into(),
            kind,
            cells,
        }
    }

    /// Column header.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inferred kind.
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell at row index `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&Cell> {
        self.cells.get(row)
    }

    /// Iterates `(row index, cell)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().enumerate()
    }
}

/// A dataset loaded fully into memory.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Builds a dataset from a header row and data rows. Short rows are
    /// padded with empty cells; extra cells are dropped.
    pub fn from_records<H, R>(headers: Vec<H>, records: Vec<Vec<R>>) -> Self
    where
        H: Into<String>,
        R: Into<String>,
    {
        let width = headers.len();
        let rows = records.len();
        let mut raw: Vec<Vec<String>> = vec![Vec::with_capacity(rows); width];
        for record in records {
            let mut fields = record.into_iter().map(Into::<String>::into);
            for column in &mut raw {
                column.push(fields.next().unwrap_or_default());
            }
        }
        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| {
                let name: String = name.into();
                Column::new(name.trim(), cells)
            })
            .collect();
        Self { columns, rows }
    }

    /// Reads and parses the dataset at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::Csv`] if a
    /// delimited file is malformed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let dataset = Self::parse(&text)?;
        debug!(
            dataset = %path.display(),
            columns = dataset.columns.len(),
            rows = dataset.rows,
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Parses dataset text, detecting its layout from the first line.
    ///
    /// # Errors
    ///
    /// [`Error::Csv`] if a delimited file is malformed.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim_start_matches('\u{feff}');
        let first = text.lines().next().unwrap_or_default();
        match detect_layout(first) {
            Layout::Comma => Self::parse_delimited(text, b','),
            Layout::Tab => Self::parse_delimited(text, b'\t'),
            Layout::FixedWidth => Ok(Self::parse_fixed_width(text)),
        }
    }

    fn parse_delimited(text: &str, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?.iter().map(str::to_owned).collect::<Vec<_>>());
        }
        Ok(Self::from_records(headers, records))
    }

    fn parse_fixed_width(text: &str) -> Self {
        let lines: Vec<Vec<char>> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.trim_end().chars().collect())
            .collect();
        let width = lines.iter().map(Vec::len).max().unwrap_or(0);

        let occupied: Vec<bool> = (0..width)
            .map(|pos| {
                lines
                    .iter()
                    .any(|l| l.get(pos).is_some_and(|c| !c.is_whitespace()))
            })
            .collect();
        let mut spans = Vec::new();
        let mut start = None;
        for (pos, &busy) in occupied.iter().enumerate() {
            match (busy, start) {
                (true, None) => start = Some(pos),
                (false, Some(s)) => {
                    spans.push((s, pos));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push((s, width));
        }

        let slice = |line: &[char], (s, e): (usize, usize)| -> String {
            let e = e.min(line.len());
            if s >= e {
                String::new()
            } else {
                line[s..e].iter().collect::<String>().trim().to_owned()
            }
        };
        let mut rows = lines
            .iter()
            .map(|l| spans.iter().map(|&span| slice(l, span)).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();
        Self::from_records(headers, rows.collect())
    }

    /// Looks up a column by header.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if a column named `name` exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column headers in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Keeps only the first `limit` rows.
    pub fn truncate(&mut self, limit: usize) {
        if limit >= self.rows {
            return;
        }
        for column in &mut self.columns {
            column.cells.truncate(limit);
        }
        self.rows = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_detection_prefers_comma() {
        assert_eq!(detect_layout("a,b\tc"), Layout::Comma);
        assert_eq!(detect_layout("a\tb"), Layout::Tab);
        assert_eq!(detect_layout("a   b"), Layout::FixedWidth);
    }

    #[test]
    fn parses_comma_separated_with_types() {
        let ds = Dataset::parse("spp,len,n\nshad,1.5,3\nbass,2,4\n");
        let ds = ds.unwrap_or_default();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("spp").map(Column::kind), Some(ColumnKind::Text));
        assert_eq!(ds.column("len").map(Column::kind), Some(ColumnKind::Float));
        assert_eq!(ds.column("n").map(Column::kind), Some(ColumnKind::Integer));
        let len = ds.column("len").and_then(|c| c.get(1)).map(|c| c.text.clone());
        assert_eq!(len.as_deref(), Some("2"));
    }

    #[test]
    fn parses_tab_separated() {
        let ds = Dataset::parse("a\tb\n1\tx\n").unwrap_or_default();
        assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(ds.column("b").and_then(|c| c.get(0)).map(|c| c.text.as_str()), Some("x"));
    }

    #[test]
    fn parses_fixed_width() {
        let text = "\
depth   temp  station
  10.5  21.3  A1
 200.0   4.1  B22
";
        let ds = Dataset::parse(text).unwrap_or_default();
        assert_eq!(ds.column_names().collect::<Vec<_>>(), vec!["depth", "temp", "station"]);
        assert_eq!(ds.row_count(), 2);
        let station = ds.column("station").and_then(|c| c.get(1)).map(|c| c.text.clone());
        assert_eq!(station.as_deref(), Some("B22"));
        assert_eq!(ds.column("depth").map(Column::kind), Some(ColumnKind::Float));
    }

    #[test]
    fn missing_cells_do_not_change_column_kind() {
        let ds = Dataset::from_records(vec!["n"], vec![vec!["1"], vec!["NA"], vec![""]]);
        let col = ds.column("n");
        assert_eq!(col.map(Column::kind), Some(ColumnKind::Integer));
        assert!(col.and_then(|c| c.get(1)).is_some_and(Cell::is_missing));
    }

    #[test]
    fn na_markers_are_text_in_text_columns() {
        let ds = Dataset::from_records(
            vec!["spp"],
            vec![vec!["shad"], vec!["NA"], vec![""]],
        );
        let col = ds.column("spp");
        assert_eq!(col.map(Column::kind), Some(ColumnKind::Text));
        let na = col.and_then(|c| c.get(1));
        assert!(na.is_some_and(|c| !c.is_missing() && c.text == "NA"));
        assert!(col.and_then(|c| c.get(2)).is_some_and(Cell::is_missing));
    }

    #[test]
    fn truncate_keeps_leading_rows() {
        let mut ds = Dataset::from_records(vec!["n"], vec![vec!["1"], vec!["2"], vec!["3"]]);
        ds.truncate(2);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("n").map(Column::len), Some(2));
        ds.truncate(10);
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn short_rows_are_padded() {
        let ds = Dataset::parse("a,b\n1\n").unwrap_or_default();
        assert!(ds.column("b").and_then(|c| c.get(0)).is_some_and(Cell::is_missing));
    }
}
