//! Articles, authors and the ordered authorships between them (OA01).

use std::collections::BTreeSet;

use pkg2020_core::entity_key;
use pkg2020_ontology::{Article, Author, Authorship, DataProperty, ObjectProperty, Session};
use serde::Deserialize;

use super::{Resolver, StageInput, StageOutput, set_data, set_object, set_year};
use crate::source::{self, SourceError, Skip, identifier, present};

#[derive(Debug, Deserialize)]
struct AuthorRow {
    #[serde(rename = "PMID", default, deserialize_with = "present")]
    pmid: Option<String>,
    #[serde(rename = "AND_ID", default, deserialize_with = "present")]
    and_id: Option<String>,
    #[serde(rename = "LastName", default, deserialize_with = "present")]
    last_name: Option<String>,
    #[serde(rename = "ForeName", default, deserialize_with = "present")]
    fore_name: Option<String>,
    #[serde(rename = "Initials", default, deserialize_with = "present")]
    initials: Option<String>,
    #[serde(rename = "AuOrder", default, deserialize_with = "present")]
    order: Option<String>,
    #[serde(
        rename = "BeginYear",
        alias = "CareerStartYear",
        default,
        deserialize_with = "present"
    )]
    career_start: Option<String>,
    #[serde(
        rename = "PubYear",
        alias = "PublicationYear",
        default,
        deserialize_with = "present"
    )]
    pub_year: Option<String>,
}

/// Create articles, authors and authorships.
///
/// Article, Author and Authorship are keyed by PMID, AND_ID and the pair, so
/// a rerun over the same rows finds every entity instead of duplicating it.
/// After all rows, each touched article without a primary author gets the
/// author of its lowest-ordered authorship.
pub fn populate(session: &mut Session<'_>, input: &StageInput<'_>) -> Result<StageOutput, SourceError> {
    let mut articles = Resolver::<Article>::seeded(session);
    let mut authors = Resolver::<Author>::seeded(session);
    let mut authorships = Resolver::<Authorship>::seeded(session);
    let mut touched = BTreeSet::new();

    let tally = source::read_rows(
        input.dataset,
        input.path,
        input.limit,
        input.bar,
        |_, row: AuthorRow| {
            let pmid = identifier(row.pmid.as_deref().ok_or(Skip::MissingKey("PMID"))?);
            let and_id = identifier(row.and_id.as_deref().ok_or(Skip::MissingKey("AND_ID"))?);

            let article = entity_key("Article", &pmid);
            articles.resolve(session, &article);
            set_data::<Article>(session, &article, DataProperty::HasPmid, pmid.as_str());
            set_year::<Article>(
                session,
                &article,
                DataProperty::PublicationYear,
                row.pub_year.as_deref(),
            );

            let author = entity_key("Author", &and_id);
            authors.resolve(session, &author);
            for (property, value) in [
                (DataProperty::LastName, row.last_name),
                (DataProperty::ForeName, row.fore_name),
                (DataProperty::Initials, row.initials),
            ] {
                if let Some(value) = value {
                    set_data::<Author>(session, &author, property, value);
                }
            }
            set_year::<Author>(
                session,
                &author,
                DataProperty::CareerStartYear,
                row.career_start.as_deref(),
            );

            let authorship = entity_key("Authorship", &format!("{pmid}_{and_id}"));
            authorships.resolve(session, &authorship);
            set_year::<Authorship>(
                session,
                &authorship,
                DataProperty::AuthorOrder,
                row.order.as_deref(),
            );
            set_object::<Authorship>(session, &authorship, ObjectProperty::RefersToAuthor, &author);

            set_object::<Article>(session, &article, ObjectProperty::WrittenBy, &author);
            set_object::<Article>(session, &article, ObjectProperty::HasAuthorship, &authorship);
            touched.insert(article);
            Ok(())
        },
    )?;

    for article in &touched {
        if let Some(primary) = first_author(session, article) {
            set_object::<Article>(session, article, ObjectProperty::HasPrimaryAuthor, &primary);
        }
    }

    Ok(StageOutput {
        tally,
        reused: articles.reused() + authors.reused() + authorships.reused(),
    })
}

/// Author of the lowest-ordered authorship of an article that has no primary
/// author yet. Unordered authorships rank after ordered ones, in link order.
fn first_author(session: &Session<'_>, article: &str) -> Option<String> {
    let article = session.get::<Article>(article)?;
    if article.primary_author.is_some() {
        return None;
    }
    article
        .authorships
        .iter()
        .enumerate()
        .filter_map(|(position, name)| {
            let authorship = session.get::<Authorship>(name)?;
            let author = authorship.author.clone()?;
            Some(((authorship.order.unwrap_or(i32::MAX), position), author))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, author)| author)
}
