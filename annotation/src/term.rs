//! RDF terms and template tokens.
//!
//! A [`Term`] is a fully resolved graph node. A [`Token`] is what a template
//! cell (or the mapping engine) hands to the triple builder before prefixes
//! are expanded; [`crate::builder::TriplesBuilder`] turns tokens into terms.

use std::fmt;

use crate::error::{Error, Result};

/// A literal value with an optional datatype IRI or language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    /// Lexical form.
    pub value: String,
    /// Full datatype IRI.
    pub datatype: Option<String>,
    /// Language tag.
    pub lang: Option<String>,
}

/// A resolved RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Absolute IRI.
    Iri(String),
    /// Blank node label (without the `_:` marker).
    Blank(String),
    /// Literal.
    Literal(Literal),
}

impl Term {
    /// Creates an IRI term.
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    /// Creates a blank node term.
    pub fn blank(label: impl Into<String>) -> Self {
        Self::Blank(label.into())
    }

    /// Creates a plain literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal {
            value: value.into(),
            datatype: None,
            lang: None,
        })
    }

    /// Creates a literal typed with the datatype IRI `datatype`.
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal(Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            lang: None,
        })
    }

    /// Returns the IRI if this is an IRI term.
    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

/// Writes the N-Triples form of the term.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::Blank(label) => write!(f, "_:{label}"),
            Self::Literal(lit) => {
                write!(f, "\"{}\"", escape_literal(&lit.value))?;
                if let Some(lang) = &lit.lang {
                    write!(f, "@{lang}")
                } else if let Some(dt) = &lit.datatype {
                    write!(f, "^^<{dt}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Escapes a literal's lexical form for Turtle and N-Triples.
#[must_use]
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Marker that introduces a blank node label in a template cell.
pub const BLANK_MARKER: &str = "_:";

const UNION_OPEN: &str = "owl:unionOf(";

/// An unresolved subject, predicate or object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An already-resolved term.
    Node(Term),
    /// An absolute IRI, written `<...>` or `scheme://...`.
    Iri(String),
    /// A blank node label (`_:label`).
    Blank(String),
    /// A `prefix:local` reference.
    Shorthand {
        /// Namespace prefix (may be empty for `:local`).
        prefix: String,
        /// Local name.
        local: String,
    },
    /// A literal; `datatype` is itself an unresolved token string.
    Literal {
        /// Lexical form.
        value: String,
        /// Datatype token (`xsd:int`, `<http://...>`).
        datatype: Option<String>,
        /// Language tag.
        lang: Option<String>,
    },
    /// `owl:unionOf(a:X b:Y ...)`.
    Union(Vec<Token>),
}

impl Token {
    /// Classifies a template cell.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTerm`] for empty or prefix-less tokens and
    /// [`Error::EmptyUnion`] for `owl:unionOf()` without members.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(invalid(text, "empty token"));
        }
        if let Some(label) = text.strip_prefix(BLANK_MARKER) {
            if label.is_empty() {
                return Err(invalid(text, "blank node without a label"));
            }
            return Ok(Self::Blank(label.to_owned()));
        }
        if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            return checked_iri(text, inner.to_owned()).map(Self::Iri);
        }
        if text.starts_with('"') {
            return parse_quoted(text);
        }
        if let Some(inner) = text.strip_prefix(UNION_OPEN) {
            let Some(inner) = inner.strip_suffix(')') else {
                return Err(invalid(text, "unterminated owl:unionOf("));
            };
            let members = inner
                .split_whitespace()
                .map(Self::parse)
                .collect::<Result<Vec<_>>>()?;
            if members.is_empty() {
                return Err(Error::EmptyUnion(text.to_owned()));
            }
            return Ok(Self::Union(members));
        }
        if text.contains("://") {
            return checked_iri(text, text.to_owned()).map(Self::Iri);
        }
        match text.split_once(':') {
            Some((prefix, local)) if !prefix.contains(char::is_whitespace) => {
                Ok(Self::Shorthand {
                    prefix: prefix.to_owned(),
                    local: local.to_owned(),
                })
            }
            _ => Err(invalid(
                text,
                "expected prefix:name, _:label, <iri> or a quoted literal",
            )),
        }
    }

    /// Wraps `text` as a plain literal without interpreting it.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal {
            value: text.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Wraps `text` as a literal typed by the datatype token `datatype`.
    pub fn typed_literal(text: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: text.into(),
            datatype: Some(datatype.into()),
            lang: None,
        }
    }
}

impl From<Term> for Token {
    fn from(term: Term) -> Self {
        Self::Node(term)
    }
}

/// Returns `iri` unless it is empty or holds a character that may not
/// appear between `<` and `>` in Turtle or N-Triples.
///
/// # Errors
///
/// [`Error::InvalidTerm`] naming `token`.
pub(crate) fn checked_iri(token: &str, iri: String) -> Result<String> {
    let forbidden = |c: char| {
        c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
    };
    if iri.is_empty() {
        return Err(invalid(token, "empty IRI"));
    }
    if iri.chars().any(forbidden) {
        return Err(invalid(token, "IRI contains a space or a character RDF does not allow"));
    }
    Ok(iri)
}

fn invalid(token: &str, reason: &'static str) -> Error {
    Error::InvalidTerm {
        token: token.to_owned(),
        reason,
    }
}

/// Parses `"value"`, `"value"@lang` or `"value"^^datatype`.
fn parse_quoted(text: &str) -> Result<Token> {
    let Some(close) = text.rfind('"').filter(|&i| i > 0) else {
        return Err(invalid(text, "unterminated quoted literal"));
    };
    let value = text[1..close].replace("\\\"", "\"");
    let rest = &text[close + 1..];
    if rest.is_empty() {
        return Ok(Token::literal(value));
    }
    if let Some(lang) = rest.strip_prefix('@') {
        return Ok(Token::Literal {
            value,
            datatype: None,
            lang: Some(lang.to_owned()),
        });
    }
    if let Some(datatype) = rest.strip_prefix("^^") {
        return Ok(Token::typed_literal(value, datatype));
    }
    Err(invalid(text, "unexpected text after quoted literal"))
}
