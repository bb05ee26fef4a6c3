//! N-Triples serializer for annotation graphs.
//!
//! Produces a valid N-Triples document (one triple per line, absolute IRIs)
//! in graph insertion order. N-Triples is suitable for streaming, bulk
//! loading, and diff-friendly storage.

use super::blank_label;
use crate::graph::Graph;
use crate::term::Term;

/// Serializes a graph to an N-Triples string.
#[must_use]
pub fn to_ntriples(graph: &Graph) -> String {
    let mut out = String::with_capacity(96 * graph.len());
    for t in graph {
        node(&mut out, &t.subject);
        out.push(' ');
        node(&mut out, &t.predicate);
        out.push(' ');
        node(&mut out, &t.object);
        out.push_str(" .\n");
    }
    out
}

fn node(out: &mut String, term: &Term) {
    match term {
        Term::Blank(label) => {
            out.push_str("_:");
            out.push_str(&blank_label(label));
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;
    use crate::model::iris;

    #[test]
    fn every_line_ends_with_period() {
        let mut g = Graph::new();
        g.insert(Triple::new(
            Term::blank("o1row0"),
            Term::iri(iris::RDF_LABEL),
            Term::literal("line\nbreak"),
        ));
        g.insert(Triple::new(
            Term::blank("o1row0"),
            Term::iri(iris::RDF_TYPE),
            Term::iri(iris::OBOE_OBSERVATION),
        ));
        let nt = to_ntriples(&g);
        assert_eq!(nt.lines().count(), 2);
        for line in nt.lines() {
            assert!(line.ends_with(" ."), "Line does not end with ' .': {line}");
        }
        assert!(nt.starts_with(&format!(
            "_:o1row0 <{}> \"line\\nbreak\" .\n",
            iris::RDF_LABEL
        )));
    }

    #[test]
    fn typed_literals_keep_absolute_datatype() {
        let mut g = Graph::new();
        g.insert(Triple::new(
            Term::blank("m1_row0"),
            Term::iri(iris::OBOE_HAS_VALUE),
            Term::typed_literal("4", iris::XSD_STRING),
        ));
        assert!(to_ntriples(&g).contains(&format!("\"4\"^^<{}>", iris::XSD_STRING)));
    }
}
