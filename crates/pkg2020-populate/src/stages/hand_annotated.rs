//! Hand-annotated individuals.
//!
//! A small fixed A-Box that exercises every defined class: one active and one
//! anonymous author, a single- and a multi-author article, a funded author,
//! and an organization and institution carrying external links.

use pkg2020_ontology::{
    Affiliation, Article, Author, BioEntity, BioKind, DataProperty, Education, Employment,
    Institution, NihProject, ObjectProperty, Organization, PublicationStatus, Session,
};

use super::{StageOutput, set_data, set_object};

struct Person {
    name: &'static str,
    last: &'static str,
    fore: &'static str,
    initials: &'static str,
    career_start: Option<i32>,
}

const PEOPLE: [Person; 3] = [
    Person {
        name: "Author_HAND_001",
        last: "Smith",
        fore: "John",
        initials: "JS",
        career_start: Some(2010),
    },
    Person {
        name: "Author_HAND_002",
        last: "Doe",
        fore: "Jane",
        initials: "JD",
        career_start: None,
    },
    Person {
        name: "Author_HAND_003",
        last: "Williams",
        fore: "Robert",
        initials: "RW",
        career_start: Some(2015),
    },
];

pub fn populate(session: &mut Session<'_>) -> StageOutput {
    for person in &PEOPLE {
        session.get_or_create::<Author>(person.name);
        set_data::<Author>(session, person.name, DataProperty::LastName, person.last);
        set_data::<Author>(session, person.name, DataProperty::ForeName, person.fore);
        set_data::<Author>(session, person.name, DataProperty::Initials, person.initials);
        if let Some(year) = person.career_start {
            set_data::<Author>(session, person.name, DataProperty::CareerStartYear, year);
        }
    }
    let [smith, doe, williams] = PEOPLE.map(|p| p.name);

    let single = "Article_HAND_001";
    session.get_or_create::<Article>(single);
    set_data::<Article>(session, single, DataProperty::HasPmid, "12345678");
    set_data::<Article>(session, single, DataProperty::PublicationYear, 2023);
    set_object::<Article>(
        session,
        single,
        ObjectProperty::HasStatus,
        PublicationStatus::Published.local_name(),
    );
    set_object::<Article>(session, single, ObjectProperty::WrittenBy, smith);
    set_object::<Article>(session, single, ObjectProperty::HasPrimaryAuthor, smith);

    let multi = "Article_HAND_002";
    session.get_or_create::<Article>(multi);
    set_data::<Article>(session, multi, DataProperty::HasPmid, "87654321");
    set_data::<Article>(session, multi, DataProperty::PublicationYear, 2024);
    for author in [smith, doe, williams] {
        set_object::<Article>(session, multi, ObjectProperty::WrittenBy, author);
    }
    set_object::<Article>(session, multi, ObjectProperty::HasPrimaryAuthor, smith);

    let harvard = "Org_HAND_Harvard";
    session.get_or_create::<Organization>(harvard);
    set_data::<Organization>(
        session,
        harvard,
        DataProperty::DbpediaLink,
        "http://dbpedia.org/resource/Harvard_University",
    );

    let mit = "Inst_HAND_MIT";
    session.get_or_create::<Institution>(mit);
    set_data::<Institution>(
        session,
        mit,
        DataProperty::WikidataLink,
        "https://www.wikidata.org/wiki/Q49108",
    );

    let affiliation = "Aff_HAND_001";
    session.get_or_create::<Affiliation>(affiliation);
    set_data::<Affiliation>(session, affiliation, DataProperty::City, "Boston");
    set_data::<Affiliation>(session, affiliation, DataProperty::State, "Massachusetts");
    set_data::<Affiliation>(session, affiliation, DataProperty::Country, "USA");
    set_object::<Affiliation>(session, affiliation, ObjectProperty::AffiliatedWith, harvard);
    set_object::<Author>(session, smith, ObjectProperty::HasAffiliation, affiliation);

    let employment = "Emp_HAND_001";
    session.get_or_create::<Employment>(employment);
    set_data::<Employment>(session, employment, DataProperty::StartYear, 2015);
    set_data::<Employment>(session, employment, DataProperty::EndYear, 2020);
    set_data::<Employment>(session, employment, DataProperty::JobTitle, "Research Scientist");
    set_object::<Employment>(session, employment, ObjectProperty::EmployedAt, harvard);
    set_object::<Author>(session, smith, ObjectProperty::HasEmployment, employment);

    let education = "Edu_HAND_001";
    session.get_or_create::<Education>(education);
    set_data::<Education>(session, education, DataProperty::Degree, "PhD");
    set_data::<Education>(session, education, DataProperty::StartYear, 2008);
    set_data::<Education>(session, education, DataProperty::EndYear, 2014);
    set_object::<Education>(session, education, ObjectProperty::EducatedAt, mit);
    set_object::<Author>(session, smith, ObjectProperty::HasEducation, education);

    for (name, kind, label, kind_label) in [
        ("Gene_HAND_BRCA1", BioKind::Gene, "BRCA1", "Gene"),
        ("Disease_HAND_Cancer", BioKind::Disease, "Breast Cancer", "Disease"),
    ] {
        session.get_or_create::<BioEntity>(name).kind = kind;
        set_data::<BioEntity>(session, name, DataProperty::EntityName, label);
        set_data::<BioEntity>(session, name, DataProperty::EntityType, kind_label);
        set_object::<Article>(session, single, ObjectProperty::MentionsBioEntity, name);
    }

    let project = "NIH_HAND_001";
    session.get_or_create::<NihProject>(project);
    set_data::<NihProject>(session, project, DataProperty::ProjectNumber, "R01-CA12345");
    set_data::<NihProject>(session, project, DataProperty::PiName, "John Smith");
    set_object::<NihProject>(session, project, ObjectProperty::IsPrincipalInvestigator, smith);
    set_object::<Author>(session, smith, ObjectProperty::HasProject, project);

    StageOutput::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg2020_ontology::{Class, Classification, KnowledgeGraph, classify};

    fn annotated() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        let mut session = graph.begin("hand-annotated");
        populate(&mut session);
        let report = session.commit();
        assert_eq!(report.created_of(Class::Author), 3);
        assert_eq!(report.conflicts, 0);
        graph
    }

    #[test]
    fn fixtures_classify_as_annotated() {
        let graph = annotated();
        let inferences = match classify(&graph) {
            Classification::Consistent(inferences) => inferences,
            Classification::Inconsistent(violations) => panic!("{violations:?}"),
        };
        assert!(inferences.is_member(Class::ActiveAuthor, "Author_HAND_001"));
        assert!(inferences.is_member(Class::AnonymousAuthor, "Author_HAND_002"));
        assert!(inferences.is_member(Class::ActiveAuthor, "Author_HAND_003"));
        assert!(inferences.is_member(Class::SingleAuthorArticle, "Article_HAND_001"));
        assert!(inferences.is_member(Class::MultiAuthorArticle, "Article_HAND_002"));
        assert!(inferences.is_member(Class::FundedAuthor, "Author_HAND_001"));
        assert!(!inferences.is_member(Class::FundedAuthor, "Author_HAND_002"));
        assert!(inferences.is_member(Class::EstablishedResearcher, "Author_HAND_001"));
        assert!(inferences.is_member(Class::GeneDiseaseLinkArticle, "Article_HAND_001"));
    }

    #[test]
    fn rerun_changes_nothing() {
        let mut graph = annotated();
        let before = graph.counts();
        let mut session = graph.begin("hand-annotated");
        populate(&mut session);
        let report = session.commit();
        assert_eq!(report.total_created(), 0);
        assert_eq!(report.conflicts, 0);
        assert_eq!(graph.counts(), before);
    }
}
