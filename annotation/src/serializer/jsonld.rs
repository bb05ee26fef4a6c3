//! JSON-LD 1.1 serializer for annotation graphs.
//!
//! Produces a single JSON-LD document with a `@context` holding every
//! registered prefix and a flattened `@graph` array with one node object per
//! subject. IRI-valued `rdf:type` statements become `@type`.

use serde_json::{json, Map, Value};

use super::{group_by_subject, Prefixes};
use crate::graph::Graph;
use crate::model::iris;
use crate::term::Term;

/// Serializes a graph to a JSON-LD `Value`.
///
/// The returned value can be pretty-printed with [`serde_json::to_string_pretty`].
#[must_use]
pub fn to_json_ld(graph: &Graph, prefixes: &Prefixes) -> Value {
    json!({
        "@context": build_context(prefixes),
        "@graph": build_graph(graph, prefixes)
    })
}

fn build_context(prefixes: &Prefixes) -> Value {
    let mut ctx = Map::new();
    for (prefix, iri) in prefixes.iter() {
        ctx.insert(prefix.to_owned(), json!(iri));
    }
    Value::Object(ctx)
}

fn build_graph(graph: &Graph, prefixes: &Prefixes) -> Value {
    let nodes = group_by_subject(graph)
        .into_iter()
        .map(|(subject, triples)| {
            let mut node = Map::new();
            node.insert("@id".to_owned(), json!(id(subject, prefixes)));
            for t in triples {
                let (key, value) = match (t.predicate.as_iri(), &t.object) {
                    (Some(iris::RDF_TYPE), Term::Iri(class)) => {
                        ("@type".to_owned(), json!(compact(class, prefixes)))
                    }
                    _ => (id(&t.predicate, prefixes), object(&t.object, prefixes)),
                };
                push(&mut node, key, value);
            }
            Value::Object(node)
        })
        .collect();
    Value::Array(nodes)
}

fn push(node: &mut Map<String, Value>, key: String, value: Value) {
    match node.get_mut(&key) {
        Some(Value::Array(values)) => values.push(value),
        _ => {
            node.insert(key, Value::Array(vec![value]));
        }
    }
}

fn id(term: &Term, prefixes: &Prefixes) -> String {
    match term {
        Term::Iri(iri) => compact(iri, prefixes),
        Term::Blank(label) => format!("_:{label}"),
        Term::Literal(lit) => lit.value.clone(),
    }
}

fn compact(iri: &str, prefixes: &Prefixes) -> String {
    prefixes.compact(iri).unwrap_or_else(|| iri.to_owned())
}

fn object(term: &Term, prefixes: &Prefixes) -> Value {
    match term {
        Term::Literal(lit) => {
            let mut value = json!({ "@value": lit.value });
            if let Some(lang) = &lit.lang {
                value["@language"] = json!(lang);
            } else if let Some(dt) = &lit.datatype {
                value["@type"] = json!(compact(dt, prefixes));
            }
            value
        }
        other => json!({ "@id": id(other, prefixes) }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::graph::Triple;

    #[test]
    fn context_and_typed_nodes() {
        let mut g = Graph::new();
        let m = Term::blank("m1_row0");
        g.insert(Triple::new(
            m.clone(),
            Term::iri(iris::RDF_TYPE),
            Term::iri(iris::OBOE_MEASUREMENT),
        ));
        g.insert(Triple::new(
            m.clone(),
            Term::iri(iris::OBOE_HAS_VALUE),
            Term::typed_literal("7", "http://www.w3.org/2001/XMLSchema#integer"),
        ));
        g.insert(Triple::new(
            m,
            Term::iri(iris::RDF_LABEL),
            Term::literal("len"),
        ));
        let doc = to_json_ld(&g, &Prefixes::new(&BTreeMap::new()));

        assert_eq!(doc["@context"]["oboe"], json!(iris::OBOE));
        let node = &doc["@graph"][0];
        assert_eq!(node["@id"], json!("_:m1_row0"));
        assert_eq!(node["@type"], json!(["oboe:Measurement"]));
        assert_eq!(
            node["oboe:hasValue"],
            json!([{ "@value": "7", "@type": "xsd:integer" }])
        );
        assert_eq!(node["rdf:label"], json!([{ "@value": "len" }]));
    }

    #[test]
    fn repeated_predicates_accumulate() {
        let mut g = Graph::new();
        let s = Term::iri("http://x.org/S");
        for o in ["http://x.org/A", "http://x.org/B"] {
            g.insert(Triple::new(s.clone(), Term::iri("http://x.org/p"), Term::iri(o)));
        }
        let doc = to_json_ld(&g, &Prefixes::new(&BTreeMap::new()));
        assert_eq!(
            doc["@graph"][0]["http://x.org/p"],
            json!([{ "@id": "http://x.org/A" }, { "@id": "http://x.org/B" }])
        );
    }
}
