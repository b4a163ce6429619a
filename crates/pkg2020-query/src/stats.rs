//! Graph statistics: triples, individuals per class, assertions per property

use pkg2020_ontology::schema::NS;
use serde::Serialize;

use crate::error::QueryError;
use crate::service::GraphService;

#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub triples: usize,
    /// (class local name, distinct individuals), largest first. Individuals
    /// count towards every superclass.
    pub classes: Vec<(String, usize)>,
    /// (property local name, assertions), largest first
    pub properties: Vec<(String, usize)>,
}

impl GraphStats {
    pub fn class_count(&self, class: &str) -> usize {
        lookup(&self.classes, class)
    }

    pub fn property_count(&self, property: &str) -> usize {
        lookup(&self.properties, property)
    }
}

fn lookup(counts: &[(String, usize)], key: &str) -> usize {
    counts
        .iter()
        .find(|(name, _)| name == key)
        .map_or(0, |(_, n)| *n)
}

fn counts(service: &GraphService, sparql: &str) -> Result<Vec<(String, usize)>, QueryError> {
    let table = service.query(sparql)?;
    table
        .rows
        .into_iter()
        .map(|row| {
            let [name, count] = <[String; 2]>::try_from(row)
                .map_err(|_| QueryError::Evaluation("expected two columns".into()))?;
            let count = count
                .parse()
                .map_err(|_| QueryError::Evaluation(format!("non-numeric count {count:?}")))?;
            Ok((name, count))
        })
        .collect()
}

pub fn collect(service: &GraphService) -> Result<GraphStats, QueryError> {
    let classes = counts(
        service,
        &format!(
            "SELECT ?class (COUNT(DISTINCT ?s) AS ?n)
WHERE {{ ?s a ?class . FILTER(STRSTARTS(STR(?class), \"{NS}\")) }}
GROUP BY ?class
ORDER BY DESC(?n) ?class"
        ),
    )?;
    let properties = counts(
        service,
        &format!(
            "SELECT ?property (COUNT(*) AS ?n)
WHERE {{ ?s ?property ?o . FILTER(STRSTARTS(STR(?property), \"{NS}\")) }}
GROUP BY ?property
ORDER BY DESC(?n) ?property"
        ),
    )?;

    Ok(GraphStats {
        triples: service.triple_count()?,
        classes,
        properties,
    })
}
