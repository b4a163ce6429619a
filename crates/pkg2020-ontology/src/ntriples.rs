//! N-Triples export of a graph, used to feed SPARQL stores.
//!
//! Each individual is typed with its asserted class and every named
//! superclass, so pattern queries over `BioEntity` also see genes and
//! diseases. Class and property declarations are included.

use std::io::{self, Write};

use crate::graph::KnowledgeGraph;
use crate::model::Literal;
use crate::reason::Inferences;
use crate::schema::{self, Class, DataProperty, ObjectProperty, OWL_NS, RDFS_NS, RDF_NS};

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

struct Triples<W: Write> {
    out: W,
    count: usize,
}

impl<W: Write> Triples<W> {
    fn iri(&mut self, s: &str, p: &str, o: &str) -> io::Result<()> {
        self.count += 1;
        writeln!(self.out, "<{s}> <{p}> <{o}> .")
    }

    fn literal(&mut self, s: &str, p: &str, value: &Literal) -> io::Result<()> {
        self.count += 1;
        writeln!(
            self.out,
            "<{s}> <{p}> \"{}\"^^<{}> .",
            escape_literal(&value.lexical()),
            value.datatype().iri()
        )
    }
}

/// Write the graph as N-Triples. Returns the number of triples written.
pub fn write_ntriples<W: Write>(
    graph: &KnowledgeGraph,
    inferences: Option<&Inferences>,
    out: W,
) -> io::Result<usize> {
    let rdf_type = format!("{RDF_NS}type");
    let sub_class = format!("{RDFS_NS}subClassOf");
    let mut t = Triples { out, count: 0 };

    for class in Class::ALL {
        t.iri(&class.iri(), &rdf_type, &format!("{OWL_NS}Class"))?;
        if let Some(parent) = class.parent() {
            t.iri(&class.iri(), &sub_class, &parent.iri())?;
        }
    }
    for p in ObjectProperty::ALL {
        t.iri(&p.iri(), &rdf_type, &format!("{OWL_NS}ObjectProperty"))?;
    }
    for p in DataProperty::ALL {
        t.iri(&p.iri(), &rdf_type, &format!("{OWL_NS}DatatypeProperty"))?;
    }

    let derived_types = inferences
        .map(Inferences::classes_by_individual)
        .unwrap_or_default();
    let derived_links = inferences
        .map(Inferences::relations_by_subject)
        .unwrap_or_default();

    for individual in graph.individuals() {
        let name = individual.name();
        let subject = schema::iri(name);
        let mut class = Some(individual.class());
        while let Some(c) = class {
            t.iri(&subject, &rdf_type, &c.iri())?;
            class = c.parent();
        }
        for c in derived_types.get(name).into_iter().flatten() {
            t.iri(&subject, &rdf_type, &c.iri())?;
        }
        for (property, value) in individual.data_values() {
            t.literal(&subject, &property.iri(), &value)?;
        }
        for (property, target) in individual.object_values() {
            t.iri(&subject, &property.iri(), &schema::iri(target))?;
        }
        for (property, target) in derived_links.get(name).into_iter().flatten() {
            t.iri(&subject, &property.iri(), &schema::iri(target))?;
        }
    }

    t.out.flush()?;
    Ok(t.count)
}
