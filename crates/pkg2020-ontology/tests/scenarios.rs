use pkg2020_ontology::snapshot::{self, write_tbox};
use pkg2020_ontology::{
    Article, Author, Class, Classification, Inferences, KnowledgeGraph, NihProject, classify,
};

fn article(graph: &mut KnowledgeGraph, name: &str, pmid: &str, authors: &[&str]) {
    for author in authors {
        graph.get_or_create::<Author>(author);
    }
    let (article, _) = graph.get_or_create::<Article>(name);
    article.pmid = Some(pmid.into());
    article.authors = authors.iter().map(|a| a.to_string()).collect();
}

fn inferences(graph: &KnowledgeGraph) -> Inferences {
    match classify(graph) {
        Classification::Consistent(inferences) => inferences,
        Classification::Inconsistent(v) => panic!("unexpected violations: {v:?}"),
    }
}

/// Build, write to disk, read back and classify the reloaded graph.
fn reloaded(graph: &KnowledgeGraph) -> KnowledgeGraph {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.owl");
    snapshot::save(graph, None, &path).unwrap();
    let back = snapshot::load(&path).unwrap();
    assert_eq!(&back, graph);
    back
}

#[test]
fn single_and_multi_author_articles() {
    let mut graph = KnowledgeGraph::new();
    article(&mut graph, "A1", "1", &["John_Smith"]);
    article(&mut graph, "A2", "2", &["P", "Q", "R"]);

    let inf = inferences(&reloaded(&graph));
    assert!(inf.is_member(Class::SingleAuthorArticle, "A1"));
    assert!(!inf.is_member(Class::MultiAuthorArticle, "A1"));
    assert!(inf.is_member(Class::MultiAuthorArticle, "A2"));
    assert!(!inf.is_member(Class::SingleAuthorArticle, "A2"));
    assert!(inf.is_member(Class::CollaborativeArticle, "A2"));
}

#[test]
fn active_and_anonymous_authors_partition() {
    let mut graph = KnowledgeGraph::new();
    article(&mut graph, "A1", "1", &["X", "Y"]);
    graph.get_or_create::<Author>("X").0.career_start_year = Some(2001);

    let inf = inferences(&reloaded(&graph));
    for author in ["X", "Y"] {
        let active = inf.is_member(Class::ActiveAuthor, author);
        let anonymous = inf.is_member(Class::AnonymousAuthor, author);
        assert!(active != anonymous, "{author} must be in exactly one");
    }
    assert!(inf.is_member(Class::ActiveAuthor, "X"));
    assert!(inf.is_member(Class::AnonymousAuthor, "Y"));
}

#[test]
fn funded_author_needs_a_project() {
    let mut graph = KnowledgeGraph::new();
    article(&mut graph, "A1", "1", &["X", "Y"]);
    graph.get_or_create::<NihProject>("NIHProject_R01");
    graph.get_or_create::<Author>("X").0.projects = vec!["NIHProject_R01".into()];

    let inf = inferences(&reloaded(&graph));
    assert!(inf.is_member(Class::FundedAuthor, "X"));
    assert!(!inf.is_member(Class::FundedAuthor, "Y"));
}

#[test]
fn shared_pmid_is_reported_with_both_articles() {
    let mut graph = KnowledgeGraph::new();
    article(&mut graph, "A1", "42", &["X"]);
    article(&mut graph, "A2", "42", &["Y"]);

    let classification = classify(&reloaded(&graph));
    assert!(!classification.is_consistent());
    assert!(classification.inferences().is_none());
    let violation = classification
        .violations()
        .iter()
        .find(|v| v.subjects.iter().any(|s| s == "A1"))
        .expect("duplicate PMID must be reported");
    assert!(violation.subjects.iter().any(|s| s == "A2"));
}

#[test]
fn tbox_file_has_no_individuals() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tbox.owl");
    write_tbox(std::fs::File::create(&path).unwrap()).unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    for class in Class::ALL {
        assert!(xml.contains(&class.iri()), "{} missing", class.local_name());
    }
    assert!(snapshot::load(&path).unwrap().is_empty());
}
