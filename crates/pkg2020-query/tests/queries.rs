use pkg2020_core::ProgressContext;
use pkg2020_ontology::{Class, Classification, KnowledgeGraph, classify, snapshot};
use pkg2020_populate::{Config, Dataset, run_stage};
use pkg2020_query::{GraphService, QueryError, QueryTable, competency, search, stats};

fn hand_annotated() -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    run_stage(
        &mut graph,
        Dataset::HandAnnotated,
        &Config::default(),
        &ProgressContext::new(),
    )
    .unwrap();
    graph
}

fn classified_service() -> GraphService {
    let graph = hand_annotated();
    match classify(&graph) {
        Classification::Consistent(inferences) => {
            GraphService::from_graph(&graph, Some(&inferences)).unwrap()
        }
        Classification::Inconsistent(v) => panic!("fixtures are inconsistent: {v:?}"),
    }
}

fn cq(service: &GraphService, key: &str) -> QueryTable {
    let question = competency::find(key).unwrap();
    competency::run(service, question).unwrap()
}

#[test]
fn every_competency_question_runs() {
    let service = classified_service();
    for question in &competency::CATALOG {
        if let Err(e) = competency::run(&service, question) {
            panic!("{} failed: {e}", question.key);
        }
    }
}

#[test]
fn competency_answers_over_fixtures() {
    let service = classified_service();

    let prolific = cq(&service, "CQ2");
    assert_eq!(prolific.get(0, "author"), Some("Author_HAND_001"));
    assert_eq!(prolific.get(0, "articleCount"), Some("2"));

    assert_eq!(cq(&service, "CQ3").len(), 3);

    let genes = cq(&service, "CQ4");
    assert_eq!(genes.len(), 1);
    assert_eq!(genes.get(0, "pmid"), Some("12345678"));
    assert_eq!(genes.get(0, "entityName"), Some("BRCA1"));

    assert_eq!(cq(&service, "CQ5").get(0, "diseaseName"), Some("Breast Cancer"));
    assert_eq!(cq(&service, "CQ8").get(0, "org"), Some("Org_HAND_Harvard"));
    assert_eq!(cq(&service, "CQ9").get(0, "country"), Some("USA"));

    let doctors = cq(&service, "CQ12");
    assert_eq!(doctors.get(0, "institution"), Some("Inst_HAND_MIT"));

    assert_eq!(cq(&service, "CQ13").get(0, "projectNumber"), Some("R01-CA12345"));
    let pis = cq(&service, "CQ14");
    assert_eq!(pis.get(0, "piName"), Some("John Smith"));
    assert_eq!(pis.get(0, "projectCount"), Some("1"));
}

#[test]
fn inferred_memberships_are_queryable() {
    let service = classified_service();
    let funded = service
        .query(&format!(
            "SELECT ?a WHERE {{ ?a a <{}> }}",
            Class::FundedAuthor.iri()
        ))
        .unwrap();
    assert_eq!(funded.column("a"), Some(vec!["Author_HAND_001"]));
}

#[test]
fn statistics() {
    let service = classified_service();
    let stats = stats::collect(&service).unwrap();
    assert!(stats.triples > 0);
    assert_eq!(stats.class_count("Author"), 3);
    assert_eq!(stats.class_count("Article"), 2);
    assert_eq!(stats.class_count("BioEntity"), 2);
    assert_eq!(stats.class_count("Gene"), 1);
    assert_eq!(stats.property_count("writtenBy"), 4);
    assert_eq!(stats.class_count("Nonexistent"), 0);
}

#[test]
fn keyword_search() {
    let service = classified_service();

    let smith = search::search(&service, "SMITH", None, 50).unwrap();
    let entities = smith.column("entity").unwrap();
    assert!(entities.contains(&"Author_HAND_001"));
    assert!(entities.contains(&"NIH_HAND_001"));

    let authors_only = search::search(&service, "smith", Some(Class::Author), 50).unwrap();
    assert!(
        authors_only
            .column("entity")
            .unwrap()
            .iter()
            .all(|e| *e == "Author_HAND_001")
    );

    let brca = search::search(&service, "brca", None, 50).unwrap();
    assert!(brca.column("entity").unwrap().contains(&"Gene_HAND_BRCA1"));

    assert!(search::search(&service, "zzzz-no-match", None, 50).unwrap().is_empty());
    assert!(matches!(
        search::search(&service, "  ", None, 50),
        Err(QueryError::Syntax(_))
    ));
}

#[test]
fn snapshot_file_is_classified_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hand.owl");
    snapshot::save(&hand_annotated(), None, &path).unwrap();

    let service = GraphService::open(&path);
    let table = service
        .query(&format!(
            "SELECT ?x WHERE {{ ?x a <{}> }}",
            Class::SingleAuthorArticle.iri()
        ))
        .unwrap();
    assert_eq!(table.column("x"), Some(vec!["Article_HAND_001"]));
}
