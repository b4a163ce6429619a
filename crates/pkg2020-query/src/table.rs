//! Tabular query results

use oxigraph::model::Term;
use pkg2020_ontology::schema::NS;
use serde::Serialize;

/// Result of a SELECT (or ASK/CONSTRUCT, flattened) query. Unbound cells are
/// empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }

    /// The single cell of a one-row aggregate, parsed as a count.
    pub fn scalar_count(&self) -> Option<usize> {
        self.rows.first()?.first()?.parse().ok()
    }
}

/// Ontology IRIs lose their namespace; other IRIs keep `<...>`.
pub fn compact_iri(iri: &str) -> String {
    match iri.strip_prefix(NS) {
        Some(local) => local.to_string(),
        None => format!("<{iri}>"),
    }
}

pub(crate) fn render_term(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => compact_iri(node.as_str()),
        Term::Literal(literal) => literal.value().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, NamedNode};

    fn table() -> QueryTable {
        QueryTable {
            columns: vec!["author".into(), "count".into()],
            rows: vec![
                vec!["Author_1".into(), "3".into()],
                vec!["Author_2".into(), "".into()],
            ],
        }
    }

    #[test]
    fn cell_and_column_access() {
        let t = table();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0, "count"), Some("3"));
        assert_eq!(t.get(5, "count"), None);
        assert_eq!(t.get(0, "missing"), None);
        assert_eq!(t.column("author"), Some(vec!["Author_1", "Author_2"]));
    }

    #[test]
    fn scalar_count() {
        let t = QueryTable {
            columns: vec!["n".into()],
            rows: vec![vec!["42".into()]],
        };
        assert_eq!(t.scalar_count(), Some(42));
        assert_eq!(QueryTable::default().scalar_count(), None);
    }

    #[test]
    fn terms_render_compactly() {
        let author = NamedNode::new(format!("{NS}Author_7")).unwrap();
        assert_eq!(render_term(&author.into()), "Author_7");
        let other = NamedNode::new("http://dbpedia.org/resource/MIT").unwrap();
        assert_eq!(render_term(&other.into()), "<http://dbpedia.org/resource/MIT>");
        let year = Literal::new_typed_literal(
            "2015",
            NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap(),
        );
        assert_eq!(render_term(&year.into()), "2015");
    }
}
