//! The fifteen competency questions the ontology is built to answer.

use crate::error::QueryError;
use crate::service::GraphService;
use crate::table::QueryTable;

#[derive(Debug, Clone, Copy)]
pub struct CompetencyQuestion {
    /// `CQ1` .. `CQ15`
    pub key: &'static str,
    pub question: &'static str,
    pub sparql: &'static str,
}

macro_rules! cq {
    ($key:literal, $question:literal, $body:literal) => {
        CompetencyQuestion {
            key: $key,
            question: $question,
            sparql: concat!(
                "PREFIX pkg: <http://example.org/pkg2020/ontology.owl#>\n",
                $body
            ),
        }
    };
}

pub const CATALOG: [CompetencyQuestion; 15] = [
    cq!(
        "CQ1",
        "Which authors have worked in multiple institutions?",
        "SELECT ?author ?lastName (COUNT(DISTINCT ?org) AS ?orgCount)
WHERE {
    ?author a pkg:Author .
    OPTIONAL { ?author pkg:lastName ?lastName }
    ?author pkg:hasAffiliation ?aff .
    ?aff pkg:affiliatedWith ?org .
}
GROUP BY ?author ?lastName
HAVING (COUNT(DISTINCT ?org) > 1)
ORDER BY DESC(?orgCount) ?author
LIMIT 100"
    ),
    cq!(
        "CQ2",
        "Who are the most prolific authors by article count?",
        "SELECT ?author ?lastName (COUNT(DISTINCT ?article) AS ?articleCount)
WHERE {
    ?author a pkg:Author .
    OPTIONAL { ?author pkg:lastName ?lastName }
    ?article pkg:writtenBy ?author .
}
GROUP BY ?author ?lastName
ORDER BY DESC(?articleCount) ?author
LIMIT 50"
    ),
    cq!(
        "CQ3",
        "Which authors frequently collaborate together?",
        "SELECT ?author1 ?author2 (COUNT(DISTINCT ?article) AS ?collaborations)
WHERE {
    ?article a pkg:Article .
    ?article pkg:writtenBy ?author1 .
    ?article pkg:writtenBy ?author2 .
    FILTER (STR(?author1) < STR(?author2))
}
GROUP BY ?author1 ?author2
ORDER BY DESC(?collaborations) ?author1 ?author2
LIMIT 100"
    ),
    cq!(
        "CQ4",
        "Which articles mention genes?",
        "SELECT ?article ?pmid ?entityName
WHERE {
    ?article a pkg:Article .
    ?article pkg:hasPMID ?pmid .
    ?article pkg:mentionsBioEntity ?entity .
    ?entity a pkg:Gene .
    OPTIONAL { ?entity pkg:entityName ?entityName }
}
ORDER BY ?article
LIMIT 100"
    ),
    cq!(
        "CQ5",
        "Which articles discuss diseases?",
        "SELECT ?article ?pmid ?diseaseName
WHERE {
    ?article a pkg:Article .
    ?article pkg:hasPMID ?pmid .
    ?article pkg:mentionsBioEntity ?entity .
    ?entity a pkg:Disease .
    OPTIONAL { ?entity pkg:entityName ?diseaseName }
}
ORDER BY ?article
LIMIT 100"
    ),
    cq!(
        "CQ6",
        "Which articles mention both genes and mutations?",
        "SELECT ?article ?pmid ?gene ?mutation
WHERE {
    ?article a pkg:Article .
    ?article pkg:hasPMID ?pmid .
    ?article pkg:mentionsBioEntity ?gene .
    ?gene a pkg:Gene .
    ?article pkg:mentionsBioEntity ?mutation .
    ?mutation a pkg:Mutation .
}
ORDER BY ?article
LIMIT 100"
    ),
    cq!(
        "CQ7",
        "What is the distribution of bio-entity types?",
        "SELECT ?entityType (COUNT(DISTINCT ?entity) AS ?count)
WHERE {
    ?entity a pkg:BioEntity .
    ?entity pkg:entityType ?entityType .
}
GROUP BY ?entityType
ORDER BY DESC(?count) ?entityType"
    ),
    cq!(
        "CQ8",
        "Which organizations have the most affiliated authors?",
        "SELECT ?org (COUNT(DISTINCT ?author) AS ?authorCount)
WHERE {
    ?author a pkg:Author .
    ?author pkg:hasAffiliation ?aff .
    ?aff pkg:affiliatedWith ?org .
}
GROUP BY ?org
ORDER BY DESC(?authorCount) ?org
LIMIT 50"
    ),
    cq!(
        "CQ9",
        "How are author affiliations distributed by country?",
        "SELECT ?country (COUNT(DISTINCT ?aff) AS ?affiliationCount)
WHERE {
    ?aff a pkg:Affiliation .
    ?aff pkg:country ?country .
}
GROUP BY ?country
ORDER BY DESC(?affiliationCount) ?country
LIMIT 30"
    ),
    cq!(
        "CQ10",
        "Which institutions produced the most researchers?",
        "SELECT ?institution (COUNT(DISTINCT ?author) AS ?authorCount)
WHERE {
    ?author a pkg:Author .
    ?author pkg:hasEducation ?edu .
    ?edu pkg:educatedAt ?institution .
}
GROUP BY ?institution
ORDER BY DESC(?authorCount) ?institution
LIMIT 50"
    ),
    cq!(
        "CQ11",
        "What is the employment timeline of each author?",
        "SELECT ?author ?lastName ?org ?startYear ?endYear
WHERE {
    ?author a pkg:Author .
    OPTIONAL { ?author pkg:lastName ?lastName }
    ?author pkg:hasEmployment ?emp .
    ?emp pkg:employedAt ?org .
    OPTIONAL { ?emp pkg:startYear ?startYear }
    OPTIONAL { ?emp pkg:endYear ?endYear }
}
ORDER BY ?author ?startYear
LIMIT 100"
    ),
    cq!(
        "CQ12",
        "Which authors hold doctoral degrees?",
        "SELECT ?author ?lastName ?degree ?institution
WHERE {
    ?author a pkg:Author .
    OPTIONAL { ?author pkg:lastName ?lastName }
    ?author pkg:hasEducation ?edu .
    ?edu pkg:degree ?degree .
    OPTIONAL { ?edu pkg:educatedAt ?institution }
    FILTER (CONTAINS(LCASE(?degree), \"phd\") || CONTAINS(LCASE(?degree), \"doctor\"))
}
ORDER BY ?author
LIMIT 100"
    ),
    cq!(
        "CQ13",
        "Which authors have NIH project funding?",
        "SELECT ?author ?lastName ?projectNumber ?piName
WHERE {
    ?author a pkg:Author .
    OPTIONAL { ?author pkg:lastName ?lastName }
    ?author pkg:hasProject ?project .
    OPTIONAL { ?project pkg:projectNumber ?projectNumber }
    OPTIONAL { ?project pkg:piName ?piName }
}
ORDER BY ?author
LIMIT 100"
    ),
    cq!(
        "CQ14",
        "Who are the principal investigators and how many projects do they lead?",
        "SELECT ?piName (COUNT(DISTINCT ?project) AS ?projectCount)
WHERE {
    ?project a pkg:NIHProject .
    ?project pkg:piName ?piName .
}
GROUP BY ?piName
ORDER BY DESC(?projectCount) ?piName
LIMIT 50"
    ),
    cq!(
        "CQ15",
        "What is the complete profile of each author?",
        "SELECT ?author ?lastName ?foreName ?article ?org ?institution ?project
WHERE {
    ?author a pkg:Author .
    OPTIONAL { ?author pkg:lastName ?lastName }
    OPTIONAL { ?author pkg:foreName ?foreName }
    OPTIONAL { ?article pkg:writtenBy ?author }
    OPTIONAL {
        ?author pkg:hasAffiliation ?aff .
        ?aff pkg:affiliatedWith ?org .
    }
    OPTIONAL {
        ?author pkg:hasEducation ?edu .
        ?edu pkg:educatedAt ?institution .
    }
    OPTIONAL { ?author pkg:hasProject ?project }
}
ORDER BY ?author
LIMIT 50"
    ),
];

/// Look up a question by key. Accepts `CQ7`, `cq7` and `7`.
pub fn find(key: &str) -> Option<&'static CompetencyQuestion> {
    let key = key.trim();
    let number = key
        .strip_prefix("CQ")
        .or_else(|| key.strip_prefix("cq"))
        .unwrap_or(key);
    CATALOG
        .iter()
        .find(|cq| cq.key.get(2..) == Some(number))
}

pub fn run(service: &GraphService, cq: &CompetencyQuestion) -> Result<QueryTable, QueryError> {
    log::debug!("{}: {}", cq.key, cq.question);
    service.query(cq.sparql)
}
