//! Serializers for annotation graphs.
//!
//! Three serialization formats are supported:
//! - **Turtle** ([`turtle`]): the default output, grouped by subject with
//!   IRIs compacted against the registered prefixes
//! - **N-Triples** ([`ntriples`]): one absolute triple per line
//! - **JSON-LD** ([`jsonld`]): a `@context` plus flattened `@graph`
//!
//! All three are deterministic: the same graph and namespace table always
//! produce the same bytes.

pub mod jsonld;
pub mod ntriples;
pub mod turtle;

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::graph::{Graph, Triple};
use crate::model::iris;
use crate::term::{checked_iri, Term};

/// Output syntax of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    /// Turtle 1.1.
    #[default]
    Turtle,
    /// N-Triples.
    NTriples,
    /// JSON-LD 1.1.
    JsonLd,
}

impl Syntax {
    /// File extension used for default output paths.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
            Self::JsonLd => "jsonld",
        }
    }
}

impl FromStr for Syntax {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "nt" => Ok(Self::NTriples),
            "jsonld" | "json-ld" => Ok(Self::JsonLd),
            _ => Err(Error::UnknownSyntax(s.to_owned())),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Turtle => "turtle",
            Self::NTriples => "ntriples",
            Self::JsonLd => "jsonld",
        })
    }
}

/// Renders `graph` in `syntax`, registering the template's namespaces.
///
/// # Errors
///
/// [`Error::Json`] if the JSON-LD document cannot be rendered.
pub fn serialize(
    graph: &Graph,
    namespaces: &BTreeMap<String, String>,
    syntax: Syntax,
) -> Result<String> {
    match syntax {
        Syntax::Turtle => Ok(turtle::to_turtle(graph, &Prefixes::new(namespaces))),
        Syntax::NTriples => Ok(ntriples::to_ntriples(graph)),
        Syntax::JsonLd => {
            let doc = jsonld::to_json_ld(graph, &Prefixes::new(namespaces));
            Ok(serde_json::to_string_pretty(&doc)? + "\n")
        }
    }
}

/// The prefix table written into a document: template namespaces first (in
/// prefix order), then the well-known ones the template did not override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefixes {
    entries: Vec<(String, String)>,
}

impl Prefixes {
    /// Builds the table from a template namespace map. Prefixes that are not
    /// valid Turtle prefix names, or whose base is not a writable IRI, are
    /// left out.
    #[must_use]
    pub fn new(namespaces: &BTreeMap<String, String>) -> Self {
        let mut entries: Vec<(String, String)> = namespaces
            .iter()
            .filter(|(prefix, iri)| {
                is_prefix_name(prefix) && checked_iri(prefix, (*iri).clone()).is_ok()
            })
            .map(|(p, iri)| (p.clone(), iri.clone()))
            .collect();
        for (prefix, iri) in iris::WELL_KNOWN {
            if !namespaces.contains_key(*prefix) {
                entries.push(((*prefix).to_owned(), (*iri).to_owned()));
            }
        }
        Self { entries }
    }

    /// `(prefix, base IRI)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, i)| (p.as_str(), i.as_str()))
    }

    /// Returns `prefix:local` for `iri` using the longest matching base,
    /// or `None` if no base matches with a plain local name.
    #[must_use]
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.entries
            .iter()
            .filter(|(_, base)| !base.is_empty())
            .filter_map(|(prefix, base)| {
                iri.strip_prefix(base.as_str())
                    .filter(|local| is_local_name(local))
                    .map(|local| (base.len(), prefix, local))
            })
            .max_by_key(|(len, _, _)| *len)
            .map(|(_, prefix, local)| format!("{prefix}:{local}"))
    }
}

fn is_prefix_name(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Triples grouped by subject, subjects in first-seen order.
pub(crate) fn group_by_subject(graph: &Graph) -> Vec<(&Term, Vec<&Triple>)> {
    let mut index: HashMap<&Term, usize> = HashMap::new();
    let mut groups: Vec<(&Term, Vec<&Triple>)> = Vec::new();
    for t in graph {
        let slot = *index.entry(&t.subject).or_insert_with(|| {
            groups.push((&t.subject, Vec::new()));
            groups.len() - 1
        });
        if let Some((_, triples)) = groups.get_mut(slot) {
            triples.push(t);
        }
    }
    groups
}

/// A blank node label safe for Turtle and N-Triples.
///
/// ASCII letters and digits are kept, as is `_` after the first character.
/// Every other character is written as `-XX` per UTF-8 byte, and a label
/// whose first character had to be escaped gets a leading `_`. Distinct
/// labels therefore always produce distinct output.
pub(crate) fn blank_label(label: &str) -> Cow<'_, str> {
    let keep = |i: usize, c: char| c.is_ascii_alphanumeric() || (i > 0 && c == '_');
    if !label.is_empty() && label.chars().enumerate().all(|(i, c)| keep(i, c)) {
        return Cow::Borrowed(label);
    }
    let mut out = String::with_capacity(label.len() * 3 + 1);
    let mut buf = [0u8; 4];
    for (i, c) in label.chars().enumerate() {
        if keep(i, c) {
            out.push(c);
            continue;
        }
        if i == 0 {
            out.push('_');
        }
        for byte in c.encode_utf8(&mut buf).bytes() {
            out.push_str(&format!("-{byte:02X}"));
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespaces() -> BTreeMap<String, String> {
        let mut ns = BTreeMap::new();
        ns.insert("a".to_owned(), "http://a.org/".to_owned());
        ns.insert("deep".to_owned(), "http://a.org/deep/".to_owned());
        ns.insert("bad prefix".to_owned(), "http://bad.org/".to_owned());
        ns.insert("spaced".to_owned(), "http://bad.org/a b#".to_owned());
        ns
    }

    #[test]
    fn syntax_names_and_extensions() {
        assert_eq!("ttl".parse::<Syntax>().ok(), Some(Syntax::Turtle));
        assert_eq!("NT".parse::<Syntax>().ok(), Some(Syntax::NTriples));
        assert_eq!("json-ld".parse::<Syntax>().ok(), Some(Syntax::JsonLd));
        assert!(matches!("rdfxml".parse::<Syntax>(), Err(Error::UnknownSyntax(_))));
        assert_eq!(Syntax::default().extension(), "ttl");
        assert_eq!(Syntax::JsonLd.to_string(), "jsonld");
    }

    #[test]
    fn prefixes_include_unshadowed_well_known() {
        let prefixes = Prefixes::new(&namespaces());
        let names: Vec<&str> = prefixes.iter().map(|(p, _)| p).collect();
        assert_eq!(names[..2], ["a", "deep"]);
        assert!(names.contains(&"oboe"));
        assert!(!names.contains(&"bad prefix"));
        assert!(!names.contains(&"spaced"));
    }

    #[test]
    fn compaction_uses_longest_base() {
        let prefixes = Prefixes::new(&namespaces());
        assert_eq!(prefixes.compact("http://a.org/deep/X").as_deref(), Some("deep:X"));
        assert_eq!(prefixes.compact("http://a.org/X").as_deref(), Some("a:X"));
        assert_eq!(prefixes.compact("http://a.org/x/y"), None);
        assert_eq!(prefixes.compact("http://other.org/X"), None);
    }

    #[test]
    fn blank_labels_are_escaped() {
        assert_eq!(blank_label("m1_row0"), "m1_row0");
        assert_eq!(blank_label("site a"), "site-20a");
        assert_eq!(blank_label("site.arow0"), "site-2Earow0");
        assert_eq!(blank_label("-x"), "_-2Dx");
        assert_eq!(blank_label("_x"), "_-5Fx");
        assert_eq!(blank_label("é"), "_-C3-A9");
    }

    #[test]
    fn escaped_labels_never_collide() {
        let labels = [
            "site_arow0", "site.arow0", "site arow0", "site-arow0",
            "site-2Earow0", "_x", "-5Fx", "x", "",
        ];
        let escaped: std::collections::HashSet<String> =
            labels.iter().map(|l| blank_label(l).into_owned()).collect();
        assert_eq!(escaped.len(), labels.len());
        for label in &escaped {
            assert!(label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
            assert!(!label.starts_with('-'));
        }
    }
}
