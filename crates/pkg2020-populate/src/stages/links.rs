//! Generated external links for organizations and institutions.

use pkg2020_ontology::{DataProperty, Institution, Organization, Session};

use super::{StageOutput, set_data};

const DBPEDIA_RESOURCE: &str = "http://dbpedia.org/resource/";
const WIKIDATA_SEARCH: &str = "https://www.wikidata.org/w/index.php?search=";

/// Human label behind an entity name: the key prefix dropped, underscores
/// read as spaces.
fn label(name: &str, prefix: &str) -> String {
    let bare = name
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(name);
    bare.replace('_', " ").trim().to_string()
}

/// Percent-encode everything outside the URL-unreserved set.
fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

pub fn dbpedia_uri(label: &str) -> String {
    format!("{DBPEDIA_RESOURCE}{}", encode(&label.replace(' ', "_")))
}

pub fn wikidata_search_url(label: &str) -> String {
    format!("{WIKIDATA_SEARCH}{}", encode(label))
}

/// Link up to `limit` organizations to DBpedia and up to `limit`
/// institutions to a Wikidata search, in name order. Entities that already
/// carry a link keep it and do not count against the limit.
pub fn populate(session: &mut Session<'_>, limit: usize) -> StageOutput {
    let organizations: Vec<String> = session
        .graph()
        .iter::<Organization>()
        .filter(|o| o.links.dbpedia.is_none())
        .take(limit)
        .map(|o| o.name.clone())
        .collect();
    for name in &organizations {
        let uri = dbpedia_uri(&label(name, "Organization"));
        log::debug!("{name} -> {uri}");
        set_data::<Organization>(session, name, DataProperty::DbpediaLink, uri);
    }

    let institutions: Vec<String> = session
        .graph()
        .iter::<Institution>()
        .filter(|i| i.links.wikidata.is_none())
        .take(limit)
        .map(|i| i.name.clone())
        .collect();
    for name in &institutions {
        let url = wikidata_search_url(&label(name, "Institution"));
        set_data::<Institution>(session, name, DataProperty::WikidataLink, url);
    }

    log::info!(
        "Linked {} organizations to DBpedia, {} institutions to Wikidata",
        organizations.len(),
        institutions.len()
    );
    StageOutput::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg2020_ontology::KnowledgeGraph;

    #[test]
    fn labels_drop_key_prefix() {
        assert_eq!(label("Organization_Harvard_University", "Organization"), "Harvard University");
        assert_eq!(label("Org_HAND_Harvard", "Organization"), "Org HAND Harvard");
    }

    #[test]
    fn uris() {
        assert_eq!(
            dbpedia_uri("Harvard University"),
            "http://dbpedia.org/resource/Harvard_University"
        );
        assert_eq!(
            wikidata_search_url("Harvard University"),
            "https://www.wikidata.org/w/index.php?search=Harvard%20University"
        );
    }

    #[test]
    fn limit_and_existing_links() {
        let mut graph = KnowledgeGraph::new();
        for name in ["Organization_A", "Organization_B", "Organization_C"] {
            graph.get_or_create::<Organization>(name);
        }
        graph
            .get_mut::<Organization>("Organization_A")
            .unwrap()
            .links
            .dbpedia = Some("http://example.org/a".to_string());
        graph.get_or_create::<Institution>("Institution_MIT");

        let mut session = graph.begin("links");
        populate(&mut session, 1);
        session.commit();

        let a = graph.get::<Organization>("Organization_A").unwrap();
        assert_eq!(a.links.dbpedia.as_deref(), Some("http://example.org/a"));
        let b = graph.get::<Organization>("Organization_B").unwrap();
        assert_eq!(
            b.links.dbpedia.as_deref(),
            Some("http://dbpedia.org/resource/B")
        );
        assert!(graph.get::<Organization>("Organization_C").unwrap().links.dbpedia.is_none());
        let mit = graph.get::<Institution>("Institution_MIT").unwrap();
        assert_eq!(
            mit.links.wikidata.as_deref(),
            Some("https://www.wikidata.org/w/index.php?search=MIT")
        );
    }
}
