//! The single path by which triples enter the graph.
//!
//! Both the TRIPLES pass and the mapping engine hand [`Token`]s to
//! [`TriplesBuilder::add`], which expands `prefix:local` references against
//! the template's namespace table (falling back to [`iris::WELL_KNOWN`]),
//! rejects terms in positions RDF does not allow, and rewrites
//! `owl:unionOf(...)` expressions into an anonymous `owl:Class` backed by an
//! `rdf:List`.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{Error, Result};
use crate::graph::{Graph, Triple};
use crate::model::iris;
use crate::term::{checked_iri, Literal, Term, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Subject,
    Predicate,
    Object,
}

impl Position {
    fn name(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
        }
    }
}

/// Resolves tokens and writes the resulting triples into an owned [`Graph`].
#[derive(Debug)]
pub struct TriplesBuilder<'a> {
    namespaces: &'a BTreeMap<String, String>,
    graph: Graph,
    unions: usize,
}

impl<'a> TriplesBuilder<'a> {
    /// Creates a builder over an empty graph.
    #[must_use]
    pub fn new(namespaces: &'a BTreeMap<String, String>) -> Self {
        Self {
            namespaces,
            graph: Graph::new(),
            unions: 0,
        }
    }

    /// Resolves the three tokens and inserts the triple.
    ///
    /// Returns false if the triple was already in the graph.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPrefix`] for an undeclared prefix,
    /// [`Error::InvalidTerm`] for a literal outside the object position or a
    /// blank node / union as predicate.
    pub fn add(&mut self, subject: Token, predicate: Token, object: Token) -> Result<bool> {
        let s = self.resolve(subject, Position::Subject)?;
        let p = self.resolve(predicate, Position::Predicate)?;
        let o = self.resolve(object, Position::Object)?;
        Ok(self.insert(s, p, o))
    }

    /// Inserts already-resolved terms. Used by the mapping engine for the
    /// fixed vocabulary it emits.
    pub fn insert(&mut self, subject: Term, predicate: Term, object: Term) -> bool {
        trace!(%subject, %predicate, %object, "triple");
        self.graph.insert(Triple::new(subject, predicate, object))
    }

    /// Expands `prefix:local` to an absolute IRI.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPrefix`] if neither the template nor the well-known
    /// table declares `prefix`, [`Error::InvalidTerm`] if the expanded IRI
    /// holds a character RDF does not allow.
    pub fn expand(&self, prefix: &str, local: &str) -> Result<String> {
        let token = format!("{prefix}:{local}");
        let Some(base) = self
            .namespaces
            .get(prefix)
            .map(String::as_str)
            .or_else(|| iris::well_known(prefix))
        else {
            return Err(Error::UnknownPrefix {
                prefix: prefix.to_owned(),
                token,
            });
        };
        checked_iri(&token, format!("{base}{local}"))
    }

    /// Resolves a datatype or class token that must denote an IRI.
    ///
    /// # Errors
    ///
    /// As [`TriplesBuilder::add`]; additionally [`Error::InvalidTerm`] if the
    /// token is not an IRI reference.
    pub fn resolve_iri(&self, token: &str) -> Result<String> {
        match Token::parse(token)? {
            Token::Iri(iri) => Ok(iri),
            Token::Shorthand { prefix, local } => self.expand(&prefix, &local),
            Token::Node(Term::Iri(iri)) => Ok(iri),
            _ => Err(Error::InvalidTerm {
                token: token.to_owned(),
                reason: "expected an IRI",
            }),
        }
    }

    /// The graph built so far.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Consumes the builder and returns its graph.
    #[must_use]
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    fn resolve(&mut self, token: Token, position: Position) -> Result<Term> {
        let term = match token {
            Token::Node(term) => term,
            Token::Iri(iri) => Term::Iri(iri),
            Token::Blank(label) => Term::Blank(label),
            Token::Shorthand { prefix, local } => Term::Iri(self.expand(&prefix, &local)?),
            Token::Literal {
                value,
                datatype,
                lang,
            } => {
                let datatype = datatype.map(|dt| self.resolve_iri(&dt)).transpose()?;
                Term::Literal(Literal {
                    value,
                    datatype,
                    lang,
                })
            }
            Token::Union(members) => {
                if position == Position::Predicate {
                    return Err(Error::InvalidTerm {
                        token: "owl:unionOf(...)".to_owned(),
                        reason: "a class expression cannot be a predicate",
                    });
                }
                self.build_union(members)?
            }
        };
        match (&term, position) {
            (Term::Literal(lit), Position::Subject | Position::Predicate) => {
                Err(Error::InvalidTerm {
                    token: lit.value.clone(),
                    reason: literal_position_reason(position),
                })
            }
            (Term::Blank(label), Position::Predicate) => Err(Error::InvalidTerm {
                token: format!("_:{label}"),
                reason: "a blank node cannot be a predicate",
            }),
            _ => Ok(term),
        }
    }

    /// Emits the `rdf:List` and `owl:Class` wrapper for a union and returns
    /// the wrapper node.
    fn build_union(&mut self, members: Vec<Token>) -> Result<Term> {
        if members.is_empty() {
            return Err(Error::EmptyUnion("owl:unionOf()".to_owned()));
        }
        let n = self.unions;
        self.unions += 1;

        let resolved = members
            .into_iter()
            .map(|m| self.resolve(m, Position::Object))
            .collect::<Result<Vec<_>>>()?;
        let cells: Vec<Term> = (0..resolved.len())
            .map(|i| Term::blank(format!("union{n}_list{i}")))
            .collect();

        for (i, member) in resolved.into_iter().enumerate() {
            let rest = cells
                .get(i + 1)
                .cloned()
                .unwrap_or_else(|| Term::iri(iris::RDF_NIL));
            self.insert(cells[i].clone(), Term::iri(iris::RDF_FIRST), member);
            self.insert(cells[i].clone(), Term::iri(iris::RDF_REST), rest);
        }

        let wrapper = Term::blank(format!("union{n}"));
        self.insert(
            wrapper.clone(),
            Term::iri(iris::RDF_TYPE),
            Term::iri(iris::OWL_CLASS),
        );
        self.insert(
            wrapper.clone(),
            Term::iri(iris::OWL_UNION_OF),
            cells[0].clone(),
        );
        Ok(wrapper)
    }
}

fn literal_position_reason(position: Position) -> &'static str {
    match position {
        Position::Subject => "a literal cannot be a subject",
        _ => "a literal cannot be a predicate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespaces() -> BTreeMap<String, String> {
        let mut ns = BTreeMap::new();
        ns.insert("a".to_owned(), "http://a.org/".to_owned());
        ns.insert("b".to_owned(), "http://b.org/".to_owned());
        ns
    }

    fn tok(s: &str) -> Token {
        Token::parse(s).unwrap_or_else(|_| Token::literal(s))
    }

    #[test]
    fn expands_declared_and_well_known_prefixes() {
        let ns = namespaces();
        let builder = TriplesBuilder::new(&ns);
        assert_eq!(builder.expand("a", "X").ok().as_deref(), Some("http://a.org/X"));
        assert_eq!(
            builder.expand("oboe", "Entity").ok().as_deref(),
            Some("http://ecoinformatics.org/oboe/oboe.1.0/oboe-core.owl#Entity")
        );
    }

    #[test]
    fn template_namespace_overrides_well_known() {
        let mut ns = namespaces();
        ns.insert("oboe".to_owned(), "http://local/oboe#".to_owned());
        let builder = TriplesBuilder::new(&ns);
        assert_eq!(
            builder.expand("oboe", "Entity").ok().as_deref(),
            Some("http://local/oboe#Entity")
        );
    }

    #[test]
    fn expanded_iris_are_checked() {
        let mut ns = namespaces();
        ns.insert("sp".to_owned(), "http://sp.org/with space/".to_owned());
        let mut builder = TriplesBuilder::new(&ns);
        assert!(matches!(
            builder.add(tok("a:S"), tok("a:p"), tok("a:Big>Fish")),
            Err(Error::InvalidTerm { .. })
        ));
        assert!(matches!(
            builder.add(tok("sp:S"), tok("a:p"), tok("a:O")),
            Err(Error::InvalidTerm { .. })
        ));
        assert!(builder.graph().is_empty());
    }

    #[test]
    fn unknown_prefix_is_fatal() {
        let ns = namespaces();
        let mut builder = TriplesBuilder::new(&ns);
        let result = builder.add(tok("zz:S"), tok("a:p"), tok("a:O"));
        assert!(matches!(result, Err(Error::UnknownPrefix { ref prefix, .. }) if prefix == "zz"));
        assert!(builder.graph().is_empty());
    }

    #[test]
    fn union_object_emits_list_and_wrapper() {
        let ns = namespaces();
        let mut builder = TriplesBuilder::new(&ns);
        let added = builder.add(tok("a:S"), tok("rdfs:range"), tok("owl:unionOf(a:X b:Y)"));
        assert!(added.is_ok());

        let graph = builder.into_graph();
        // k first + k rest + type + unionOf + original, k = 2
        assert_eq!(graph.len(), 7);

        let first = Term::iri(iris::RDF_FIRST);
        let rest = Term::iri(iris::RDF_REST);
        let nil = Term::iri(iris::RDF_NIL);
        assert_eq!(graph.iter().filter(|t| t.predicate == first).count(), 2);
        assert_eq!(graph.iter().filter(|t| t.predicate == rest).count(), 2);
        assert!(graph.contains(&Triple::new(
            Term::blank("union0_list1"),
            rest.clone(),
            nil
        )));
        assert!(graph.contains(&Triple::new(
            Term::blank("union0"),
            Term::iri(iris::OWL_UNION_OF),
            Term::blank("union0_list0")
        )));
        assert!(graph.contains(&Triple::new(
            Term::blank("union0"),
            Term::iri(iris::RDF_TYPE),
            Term::iri(iris::OWL_CLASS)
        )));
        assert!(graph.contains(&Triple::new(
            Term::iri("http://a.org/S"),
            Term::iri("http://www.w3.org/2000/01/rdf-schema#range"),
            Term::blank("union0")
        )));
    }

    #[test]
    fn union_subject_is_supported() {
        let ns = namespaces();
        let mut builder = TriplesBuilder::new(&ns);
        let added = builder.add(
            tok("owl:unionOf(a:X b:Y a:Z)"),
            tok("rdfs:subClassOf"),
            tok("a:Top"),
        );
        assert!(added.is_ok());
        assert_eq!(builder.graph().len(), 2 * 3 + 3);
    }

    #[test]
    fn literals_only_in_object_position() {
        let ns = namespaces();
        let mut builder = TriplesBuilder::new(&ns);
        assert!(builder
            .add(Token::literal("x"), tok("a:p"), tok("a:O"))
            .is_err());
        assert!(builder
            .add(tok("a:S"), tok("_:p"), tok("a:O"))
            .is_err());
        assert!(builder
            .add(tok("a:S"), tok("a:p"), Token::literal("a:O"))
            .is_ok());
        let object = builder.graph().iter().last().map(|t| t.object.clone());
        assert_eq!(object, Some(Term::literal("a:O")));
    }

    #[test]
    fn typed_literal_datatype_is_expanded() {
        let ns = namespaces();
        let mut builder = TriplesBuilder::new(&ns);
        let ok = builder.add(
            tok("a:S"),
            tok("a:p"),
            Token::typed_literal("4", "xsd:integer"),
        );
        assert!(ok.is_ok());
        let object = builder.graph().iter().next().map(|t| t.object.clone());
        assert_eq!(
            object,
            Some(Term::typed_literal(
                "4",
                "http://www.w3.org/2001/XMLSchema#integer"
            ))
        );
    }
}
