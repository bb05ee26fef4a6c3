//! Run-terminating failures.
//!
//! Only conditions that make the emitted graph untrustworthy live here.
//! Malformed template rows, mappings against missing columns and bad
//! conditions are logged and skipped instead; see [`crate::template`] and
//! [`crate::mapping`].

use std::path::PathBuf;

/// Errors raised by template loading, dataset resolution, triple building
/// and value-use validation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The annotation template does not exist.
    #[error("annotation template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// A file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A template or dataset could not be tokenized as delimited text.
    #[error("malformed delimited text: {0}")]
    Csv(#[from] csv::Error),

    /// Retrieving a remote dataset failed.
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// The requested URL.
        url: String,
        /// Status line or transport failure.
        reason: String,
    },

    /// Mappings were declared but no dataset could be resolved for them.
    #[error("template declares {mappings} mapping(s) but no dataset ({reason})")]
    MissingDataset {
        /// Number of mappings in the template.
        mappings: usize,
        /// Why no dataset is available.
        reason: String,
    },

    /// A `prefix:local` reference names a prefix that is not declared.
    #[error("unknown namespace prefix '{prefix}' in '{token}'")]
    UnknownPrefix {
        /// The undeclared prefix.
        prefix: String,
        /// The full token being resolved.
        token: String,
    },

    /// A token cannot be used in the position it appears in.
    #[error("invalid term '{token}': {reason}")]
    InvalidTerm {
        /// The offending token.
        token: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// An `owl:unionOf(...)` expression without members.
    #[error("owl:unionOf expression has no members: '{0}'")]
    EmptyUnion(String),

    /// The same dataset cell was mapped twice.
    #[error("value of '{attribute}' at row {row} was already used by an earlier mapping")]
    DuplicateUse {
        /// Dataset column.
        attribute: String,
        /// Row index.
        row: usize,
    },

    /// A mapped column did not have every row consumed exactly once.
    #[error("attribute '{attribute}' mapped {actual} value(s), expected {expected}")]
    CountMismatch {
        /// Dataset column.
        attribute: String,
        /// Rows in the (possibly truncated) dataset.
        expected: usize,
        /// Rows actually consumed.
        actual: usize,
    },

    /// The graph could not be rendered as JSON-LD.
    #[error("JSON-LD serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested output syntax is not supported.
    #[error("unknown output syntax '{0}' (expected turtle, ntriples or jsonld)")]
    UnknownSyntax(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
