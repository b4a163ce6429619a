use std::fs;
use std::path::Path;

use pkg2020_core::ProgressContext;
use pkg2020_ontology::snapshot;
use pkg2020_ontology::{
    Affiliation, Article, Author, Authorship, BioEntity, BioKind, Class, Classification,
    Education, Employment, Institution, KnowledgeGraph, NihProject, Organization, classify,
};
use pkg2020_populate::{Config, Dataset, run, run_stage};
use tempfile::TempDir;

const AUTHORS: &str = "\
PMID,AND_ID,LastName,ForeName,Initials,AuOrder,BeginYear
100,1,Smith,John,J,1,2005
100,2,Doe,Jane,JD,2,
200,3,Roe,Rick,R,3,nan
200,1,Smith,John,J,1,2005
200,2,Doe,Jane,JD,2,
300,4,,,,1,1998.0
";

const AFFILIATIONS: &str = "\
id,AND_ID,Affiliation,City,State,Country
10,1,Harvard University,Boston,MA,USA
11,2,\"Harvard University,\",Boston,,USA
12,99,Nowhere Institute,Nowhere,,
13,3,,Paris,,France
";

const EMPLOYMENT: &str = "\
id,AND_ID,Organization,Role,StartYear,EndYear,ORCID
20,1,Harvard University,Professor,2010,2020,0000-0001
21,2,MIT,Postdoc,unknown,2019.0,
22,42,MIT,,2000,2001,
";

const EDUCATION: &str = "\
id,AND_ID,Institution,Degree,StartYear,EndYear
30,1,Stanford University,Ph.D.,2000,2004
31,3,Stanford University,M.Sc,n/a,
,4,Oxford,BA,1990,1993
";

const BIO_MAIN: &str = "\
PMID,id,Type,Name
100,G1,Gene,BRCA1
100,D1,Disease,Breast Cancer
200,C1,chemical,Aspirin
999,G2,Gene,TP53
";

const BIO_MUTATION: &str = "\
PMID,id,MutationType
200,M1,SNP
";

const NIH: &str = "\
id,AND_ID,ProjectNumber,PI_Name
40,1,R01-CA 12345,John Smith
41,2,R01-CA 12345,Jane Doe
42,3,,Rick Roe
43,77,R21-XX,Ghost
";

fn write(dir: &Path, dataset: Dataset, body: &str) {
    let file = dataset.default_file().unwrap();
    fs::write(dir.join(file), body).unwrap();
}

fn data_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), Dataset::AuthorsArticles, AUTHORS);
    write(dir.path(), Dataset::Affiliations, AFFILIATIONS);
    write(dir.path(), Dataset::Employment, EMPLOYMENT);
    write(dir.path(), Dataset::Education, EDUCATION);
    write(dir.path(), Dataset::BioEntities, BIO_MAIN);
    write(dir.path(), Dataset::BioMutations, BIO_MUTATION);
    write(dir.path(), Dataset::NihProjects, NIH);
    dir
}

fn populated(dir: &Path) -> KnowledgeGraph {
    let config = Config::with_data_dir(dir);
    let mut graph = KnowledgeGraph::new();
    run(&mut graph, &Dataset::SOURCED, &config, &ProgressContext::new()).unwrap();
    graph
}

#[test]
fn authors_articles_and_authorships() {
    let dir = data_dir();
    let graph = populated(dir.path());

    assert_eq!(graph.count::<Article>(), 3);
    assert_eq!(graph.count::<Author>(), 4);
    assert_eq!(graph.count::<Authorship>(), 6);

    let smith = graph.get::<Author>("Author_1").unwrap();
    assert_eq!(smith.last_name.as_deref(), Some("Smith"));
    assert_eq!(smith.career_start_year, Some(2005));
    assert_eq!(smith.orcid.as_deref(), Some("0000-0001"));

    // Blank name cells leave the attribute absent.
    let anonymous = graph.get::<Author>("Author_4").unwrap();
    assert_eq!(anonymous.last_name, None);
    assert_eq!(anonymous.career_start_year, Some(1998));
    assert_eq!(graph.get::<Author>("Author_3").unwrap().career_start_year, None);

    let article = graph.get::<Article>("Article_100").unwrap();
    assert_eq!(article.pmid.as_deref(), Some("100"));
    assert_eq!(article.authors, ["Author_1", "Author_2"]);
}

#[test]
fn authorship_order_round_trips() {
    let dir = data_dir();
    let graph = populated(dir.path());

    // Rows for article 200 arrive as order 3, 1, 2.
    let article = graph.get::<Article>("Article_200").unwrap();
    let mut ordered: Vec<(i32, String)> = article
        .authorships
        .iter()
        .map(|name| {
            let a = graph.get::<Authorship>(name).unwrap();
            (a.order.unwrap(), a.author.clone().unwrap())
        })
        .collect();
    ordered.sort();
    let authors: Vec<&str> = ordered.iter().map(|(_, a)| a.as_str()).collect();
    assert_eq!(authors, ["Author_1", "Author_2", "Author_3"]);
    assert_eq!(article.primary_author.as_deref(), Some("Author_1"));
}

#[test]
fn rerun_creates_nothing() {
    let dir = data_dir();
    let config = Config::with_data_dir(dir.path());
    let progress = ProgressContext::new();
    let mut graph = populated(dir.path());
    let before = graph.counts();

    for dataset in Dataset::SOURCED {
        let summary = run_stage(&mut graph, dataset, &config, &progress).unwrap();
        assert_eq!(summary.created_total(), 0, "{dataset}");
        assert_eq!(summary.conflicts, 0, "{dataset}");
    }
    assert_eq!(graph.counts(), before);
}

#[test]
fn organizations_merge_by_sanitized_name() {
    let dir = data_dir();
    let graph = populated(dir.path());

    // "Harvard University" and "Harvard University," collapse to one key and
    // employment reuses the organization created by affiliations.
    let orgs: Vec<&str> = graph.names::<Organization>().collect();
    assert_eq!(orgs, ["Organization_Harvard_University", "Organization_MIT"]);

    let affiliation = graph.get::<Affiliation>("Affiliation_10").unwrap();
    assert_eq!(
        affiliation.organization.as_deref(),
        Some("Organization_Harvard_University")
    );
    assert_eq!(affiliation.city.as_deref(), Some("Boston"));

    let no_org = graph.get::<Affiliation>("Affiliation_13").unwrap();
    assert_eq!(no_org.organization, None);
    assert_eq!(no_org.country.as_deref(), Some("France"));
}

#[test]
fn rows_with_unknown_parent_are_skipped() {
    let dir = data_dir();
    let config = Config::with_data_dir(dir.path());
    let progress = ProgressContext::new();
    let mut graph = KnowledgeGraph::new();
    run_stage(&mut graph, Dataset::AuthorsArticles, &config, &progress).unwrap();

    let summary = run_stage(&mut graph, Dataset::Affiliations, &config, &progress).unwrap();
    assert_eq!(summary.rows_read, 4);
    assert_eq!(summary.rows_applied, 3);
    assert_eq!(summary.skipped.get("unknown author"), Some(&1));
    assert!(!graph.contains::<Affiliation>("Affiliation_12"));

    let summary = run_stage(&mut graph, Dataset::BioEntities, &config, &progress).unwrap();
    assert_eq!(summary.skipped.get("unknown article"), Some(&1));
    assert!(!graph.contains::<BioEntity>("BioEntity_G2"));
}

#[test]
fn latin1_names_keep_their_rows() {
    let dir = tempfile::tempdir().unwrap();
    let file = Dataset::AuthorsArticles.default_file().unwrap();
    fs::write(
        dir.path().join(file),
        b"PMID,AND_ID,LastName,ForeName,Initials,AuOrder\n\
          100,1,M\xFCller,Hans,H,1\n\
          100,2,Doe,Jane,J,2\n",
    )
    .unwrap();
    let config = Config::with_data_dir(dir.path());
    let mut graph = KnowledgeGraph::new();
    let summary = run_stage(
        &mut graph,
        Dataset::AuthorsArticles,
        &config,
        &ProgressContext::new(),
    )
    .unwrap();

    assert_eq!(summary.rows_applied, 2);
    assert_eq!(summary.skipped.get("malformed row"), None);
    assert_eq!(graph.count::<Author>(), 2);
    let muller = graph.get::<Author>("Author_1").unwrap();
    assert_eq!(muller.last_name.as_deref(), Some("M\u{FFFD}ller"));
    assert_eq!(muller.fore_name.as_deref(), Some("Hans"));
    assert_eq!(graph.get::<Article>("Article_100").unwrap().authors.len(), 2);
}

#[test]
fn first_specific_bio_type_wins() {
    let dir = data_dir();
    write(
        dir.path(),
        Dataset::BioEntities,
        "PMID,id,Type,Name\n100,X1,,TP53\n100,X1,Gene,TP53\n200,X1,Disease,TP53\n",
    );
    let config = Config::with_data_dir(dir.path());
    let progress = ProgressContext::new();
    let mut graph = KnowledgeGraph::new();
    run_stage(&mut graph, Dataset::AuthorsArticles, &config, &progress).unwrap();
    run_stage(&mut graph, Dataset::BioEntities, &config, &progress).unwrap();

    assert_eq!(graph.count::<BioEntity>(), 1);
    assert_eq!(graph.get::<BioEntity>("BioEntity_X1").unwrap().kind, BioKind::Gene);
}

#[test]
fn unparseable_years_are_omitted() {
    let dir = data_dir();
    let graph = populated(dir.path());

    let postdoc = graph.get::<Employment>("Employment_21").unwrap();
    assert_eq!(postdoc.start_year, None);
    assert_eq!(postdoc.end_year, Some(2019));
    assert_eq!(postdoc.job_title.as_deref(), Some("Postdoc"));

    let msc = graph.get::<Education>("Education_31").unwrap();
    assert_eq!(msc.start_year, None);
    assert_eq!(msc.end_year, None);
    assert_eq!(msc.degree.as_deref(), Some("M_Sc"));

    let phd = graph.get::<Education>("Education_30").unwrap();
    assert_eq!(phd.degree.as_deref(), Some("Ph_D"));
    assert_eq!(phd.institution.as_deref(), Some("Institution_Stanford_University"));

    // Missing id falls back to the row index.
    assert!(graph.contains::<Education>("Education_row2"));
    assert_eq!(graph.count::<Institution>(), 2);
}

#[test]
fn bio_entities_and_projects() {
    let dir = data_dir();
    let graph = populated(dir.path());

    let gene = graph.get::<BioEntity>("BioEntity_G1").unwrap();
    assert_eq!(gene.kind, BioKind::Gene);
    assert_eq!(gene.entity_name.as_deref(), Some("BRCA1"));
    assert_eq!(
        graph.get::<BioEntity>("BioEntity_C1").unwrap().kind,
        BioKind::Chemical
    );
    let mutation = graph.get::<BioEntity>("Mutation_M1").unwrap();
    assert_eq!(mutation.kind, BioKind::Mutation);
    assert_eq!(mutation.entity_type.as_deref(), Some("Mutation"));
    assert_eq!(mutation.entity_name.as_deref(), Some("SNP"));
    assert_eq!(
        graph.get::<Article>("Article_200").unwrap().mentions,
        ["BioEntity_C1", "Mutation_M1"]
    );

    // Two investigators share one grant; a row without a number keys on id.
    let grant = graph.get::<NihProject>("NIHProject_R01_CA_12345").unwrap();
    assert_eq!(grant.investigators, ["Author_1", "Author_2"]);
    assert_eq!(grant.pi_name.as_deref(), Some("John Smith"));
    assert!(graph.contains::<NihProject>("NIHProject_42"));
    assert_eq!(graph.count::<NihProject>(), 2);
}

#[test]
fn populated_graph_is_consistent_and_classifies() {
    let dir = data_dir();
    let graph = populated(dir.path());

    for article in graph.iter::<Article>() {
        assert!(!article.authors.is_empty(), "{}", article.name);
        assert!(article.pmid.is_some(), "{}", article.name);
    }

    let inferences = match classify(&graph) {
        Classification::Consistent(inferences) => inferences,
        Classification::Inconsistent(violations) => panic!("{violations:?}"),
    };
    assert!(inferences.is_member(Class::ActiveAuthor, "Author_1"));
    assert!(inferences.is_member(Class::AnonymousAuthor, "Author_2"));
    assert!(inferences.is_member(Class::SingleAuthorArticle, "Article_300"));
    assert!(inferences.is_member(Class::MultiAuthorArticle, "Article_200"));
    assert!(inferences.is_member(Class::GeneDiseaseLinkArticle, "Article_100"));
    assert!(inferences.is_member(Class::FundedAuthor, "Author_3"));
    assert!(!inferences.is_member(Class::FundedAuthor, "Author_4"));
    assert!(inferences.is_member(Class::EstablishedResearcher, "Author_1"));
}

#[test]
fn missing_source_skips_only_that_stage() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), Dataset::AuthorsArticles, AUTHORS);
    let config = Config::with_data_dir(dir.path());
    let mut graph = KnowledgeGraph::new();

    let summary = run(
        &mut graph,
        &[Dataset::AuthorsArticles, Dataset::BioEntities, Dataset::HandAnnotated],
        &config,
        &ProgressContext::new(),
    )
    .unwrap();
    assert_eq!(summary.missing, [Dataset::BioEntities]);
    assert_eq!(summary.stages.len(), 2);
    assert_eq!(graph.count::<BioEntity>(), 2);
    assert!(graph.contains::<Author>("Author_HAND_001"));
}

#[test]
fn failed_stage_leaves_graph_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path());
    let mut graph = KnowledgeGraph::new();
    graph.get_or_create::<Author>("Author_1");
    let before = graph.clone();

    let err = run_stage(&mut graph, Dataset::Employment, &config, &ProgressContext::new())
        .unwrap_err();
    assert!(err.is_missing());
    assert_eq!(graph, before);
}

#[test]
fn row_limits_cap_each_stage() {
    let dir = data_dir();
    let mut config = Config::with_data_dir(dir.path());
    config.limits.authors = 2;
    let mut graph = KnowledgeGraph::new();
    let summary = run_stage(
        &mut graph,
        Dataset::AuthorsArticles,
        &config,
        &ProgressContext::new(),
    )
    .unwrap();
    assert_eq!(summary.rows_read, 2);
    assert_eq!(graph.count::<Article>(), 1);
}

#[test]
fn snapshot_round_trip_after_population() {
    let dir = data_dir();
    let graph = populated(dir.path());
    let path = dir.path().join("snapshot.owl");
    snapshot::save(&graph, None, &path).unwrap();
    let loaded = snapshot::load(&path).unwrap();
    assert_eq!(loaded, graph);
}
