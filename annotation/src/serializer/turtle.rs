//! Turtle 1.1 serializer for annotation graphs.
//!
//! Produces one `@prefix` line per registered namespace followed by one block
//! per subject, in the order subjects first appear in the graph. Within a
//! block, predicates keep insertion order and `rdf:type` is written as `a`.

use super::{blank_label, group_by_subject, Prefixes};
use crate::graph::Graph;
use crate::model::iris;
use crate::term::{escape_literal, Term};

/// Serializes a graph to a Turtle string.
#[must_use]
pub fn to_turtle(graph: &Graph, prefixes: &Prefixes) -> String {
    let mut out = String::with_capacity(64 * graph.len() + 512);

    // Prefix declarations
    for (prefix, iri) in prefixes.iter() {
        out.push_str(&format!("@prefix {prefix}: <{iri}> .\n"));
    }
    out.push('\n');

    for (subject, triples) in group_by_subject(graph) {
        out.push_str(&term(subject, prefixes));
        for (i, t) in triples.iter().enumerate() {
            out.push_str(if i == 0 { "\n  " } else { " ;\n  " });
            out.push_str(&predicate(&t.predicate, prefixes));
            out.push(' ');
            out.push_str(&term(&t.object, prefixes));
        }
        out.push_str(" .\n\n");
    }

    out
}

fn predicate(p: &Term, prefixes: &Prefixes) -> String {
    if p.as_iri() == Some(iris::RDF_TYPE) {
        return "a".to_owned();
    }
    term(p, prefixes)
}

fn term(t: &Term, prefixes: &Prefixes) -> String {
    match t {
        Term::Iri(iri) => iri_ref(iri, prefixes),
        Term::Blank(label) => format!("_:{}", blank_label(label)),
        Term::Literal(lit) => {
            let mut s = format!("\"{}\"", escape_literal(&lit.value));
            if let Some(lang) = &lit.lang {
                s.push('@');
                s.push_str(lang);
            } else if let Some(dt) = &lit.datatype {
                s.push_str("^^");
                s.push_str(&iri_ref(dt, prefixes));
            }
            s
        }
    }
}

fn iri_ref(iri: &str, prefixes: &Prefixes) -> String {
    prefixes.compact(iri).unwrap_or_else(|| format!("<{iri}>"))
}
