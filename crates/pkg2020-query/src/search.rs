//! Keyword search over individual names and labels

use pkg2020_ontology::schema::NS;
use pkg2020_ontology::{Class, DataProperty};

use crate::error::QueryError;
use crate::service::GraphService;
use crate::table::QueryTable;

/// Data properties whose values are searched besides the individual's name.
const LABELS: [DataProperty; 6] = [
    DataProperty::LastName,
    DataProperty::ForeName,
    DataProperty::HasPmid,
    DataProperty::EntityName,
    DataProperty::PiName,
    DataProperty::ProjectNumber,
];

fn escape(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// SPARQL for [`search`].
pub fn search_query(keyword: &str, class: Option<Class>, limit: usize) -> String {
    let keyword = escape(&keyword.trim().to_lowercase());
    let type_pattern = match class {
        Some(class) => format!("?entity a <{}> .", class.iri()),
        None => format!("?entity a ?type . FILTER(STRSTARTS(STR(?type), \"{NS}\"))"),
    };
    let labels = LABELS
        .iter()
        .map(|p| format!("<{}>", p.iri()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT DISTINCT ?entity ?match
WHERE {{
    {{ {type_pattern} ?entity ?p ?match . FILTER(?p IN ({labels})) }}
    UNION
    {{ {type_pattern} BIND(STRAFTER(STR(?entity), \"#\") AS ?match) }}
    FILTER(CONTAINS(LCASE(STR(?match)), \"{keyword}\"))
}}
ORDER BY ?entity ?match
LIMIT {limit}"
    )
}

/// Individuals whose name, author name, PMID, bio-entity name or project
/// label contains `keyword` (case-insensitive). One row per matching label.
pub fn search(
    service: &GraphService,
    keyword: &str,
    class: Option<Class>,
    limit: usize,
) -> Result<QueryTable, QueryError> {
    if keyword.trim().is_empty() {
        return Err(QueryError::Syntax("empty search keyword".into()));
    }
    service.query(&search_query(keyword, class, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::sparql::Query;

    #[test]
    fn quotes_cannot_escape_the_literal() {
        let sparql = search_query("x\") } DROP ALL #", None, 10);
        assert!(sparql.contains(r#""x\") } drop all #""#));
        Query::parse(&sparql, None).unwrap();
    }

    #[test]
    fn class_restriction() {
        let sparql = search_query("smith", Some(Class::Author), 5);
        assert!(sparql.contains(&format!("?entity a <{NS}Author>")));
        assert!(sparql.ends_with("LIMIT 5"));
        Query::parse(&sparql, None).unwrap();
    }
}
