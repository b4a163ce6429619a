//! Population stages, one module per dataset.
//!
//! Each CSV stage maps rows onto the typed graph through a [`Session`]:
//! parents are looked up by their real foreign key, secondary entities are
//! resolved through a [`Resolver`] so repeated references converge, and
//! every functional assertion outcome is reported to the session so
//! conflicts reach the consistency check.

pub mod affiliations;
pub mod authors;
pub mod bioentities;
pub mod education;
pub mod employment;
pub mod hand_annotated;
pub mod links;
pub mod nih_projects;

use std::marker::PhantomData;
use std::path::Path;

use indicatif::ProgressBar;
use pkg2020_core::{EntityCache, entity_key};
use pkg2020_ontology::{
    Article, Author, DataProperty, Entity, Literal, ObjectProperty, Property, Session,
};

use crate::dataset::Dataset;
use crate::source::{Skip, Tally, identifier};

/// Where a CSV stage reads from.
pub struct StageInput<'a> {
    pub dataset: Dataset,
    pub path: &'a Path,
    pub limit: Option<usize>,
    pub bar: &'a ProgressBar,
}

/// Rows consumed by a stage plus how often its caches served an existing
/// entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutput {
    pub tally: Tally,
    pub reused: usize,
}

/// Entity resolution for one entity type within one stage.
///
/// Seeded with the names already present in the graph, so entities created
/// by earlier stages (or an earlier run of this one) are found rather than
/// duplicated.
pub(crate) struct Resolver<E> {
    cache: EntityCache<String>,
    _entity: PhantomData<E>,
}

impl<E: Entity> Resolver<E> {
    pub fn seeded(session: &Session<'_>) -> Self {
        let existing = session.names::<E>().map(|n| (n.to_string(), n.to_string()));
        Self {
            cache: EntityCache::from_existing(existing),
            _entity: PhantomData,
        }
    }

    /// Find or create the entity named `name`.
    pub fn resolve<'s>(&mut self, session: &'s mut Session<'_>, name: &str) -> &'s mut E {
        let name = self.cache.resolve(name, str::to_string);
        session.get_or_create::<E>(name)
    }

    #[cfg(test)]
    pub fn created(&self) -> usize {
        self.cache.created()
    }

    pub fn reused(&self) -> usize {
        self.cache.reused()
    }
}

/// `Author_<AND_ID>` for a row, provided that author is already loaded.
pub(crate) fn loaded_author(session: &Session<'_>, and_id: Option<&str>) -> Result<String, Skip> {
    let id = and_id.ok_or(Skip::MissingKey("AND_ID"))?;
    let name = entity_key("Author", &identifier(id));
    if session.contains::<Author>(&name) {
        Ok(name)
    } else {
        Err(Skip::UnknownAuthor(name))
    }
}

/// `Article_<PMID>` for a row, provided that article is already loaded.
pub(crate) fn loaded_article(session: &Session<'_>, pmid: Option<&str>) -> Result<String, Skip> {
    let pmid = pmid.ok_or(Skip::MissingKey("PMID"))?;
    let name = entity_key("Article", &identifier(pmid));
    if session.contains::<Article>(&name) {
        Ok(name)
    } else {
        Err(Skip::UnknownArticle(name))
    }
}

/// Assert a data value on an existing entity and report the outcome.
pub(crate) fn set_data<E: Entity>(
    session: &mut Session<'_>,
    name: &str,
    property: DataProperty,
    value: impl Into<Literal>,
) {
    let Some(entity) = session.get_mut::<E>(name) else {
        return;
    };
    let outcome = entity.assert_data(property, value.into());
    session.note(name, Property::Data(property), outcome);
}

/// Assert a link on an existing entity and report the outcome.
pub(crate) fn set_object<E: Entity>(
    session: &mut Session<'_>,
    name: &str,
    property: ObjectProperty,
    target: &str,
) {
    let Some(entity) = session.get_mut::<E>(name) else {
        return;
    };
    let outcome = entity.assert_object(property, target);
    session.note(name, Property::Object(property), outcome);
}

/// Assert an integer attribute parsed from a raw cell. Unparseable values
/// leave the attribute absent.
pub(crate) fn set_year<E: Entity>(
    session: &mut Session<'_>,
    name: &str,
    property: DataProperty,
    raw: Option<&str>,
) {
    let Some(raw) = raw else {
        return;
    };
    match crate::source::parse_year(raw) {
        Some(year) => set_data::<E>(session, name, property, year),
        None => log::debug!("{name}: {property} '{raw}' is not a year, omitted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg2020_ontology::{KnowledgeGraph, Organization};

    #[test]
    fn resolver_sees_existing_entities() {
        let mut graph = KnowledgeGraph::new();
        graph.get_or_create::<Organization>("Organization_MIT");

        let mut session = graph.begin("test");
        let mut orgs = Resolver::<Organization>::seeded(&session);
        orgs.resolve(&mut session, "Organization_MIT");
        orgs.resolve(&mut session, "Organization_Yale");
        orgs.resolve(&mut session, "Organization_Yale");
        assert_eq!(orgs.created(), 1);
        assert_eq!(orgs.reused(), 2);
        let report = session.commit();
        assert_eq!(report.created_of(pkg2020_ontology::Class::Organization), 1);
        assert_eq!(graph.count::<Organization>(), 2);
    }

    #[test]
    fn parent_lookup() {
        let mut graph = KnowledgeGraph::new();
        graph.get_or_create::<Author>("Author_7");
        let session = graph.begin("test");
        assert_eq!(loaded_author(&session, Some("7.0")), Ok("Author_7".to_string()));
        assert_eq!(
            loaded_author(&session, Some("8")),
            Err(Skip::UnknownAuthor("Author_8".to_string()))
        );
        assert_eq!(loaded_author(&session, None), Err(Skip::MissingKey("AND_ID")));
        assert_eq!(
            loaded_article(&session, Some("1")),
            Err(Skip::UnknownArticle("Article_1".to_string()))
        );
    }

    #[test]
    fn bad_year_is_omitted() {
        let mut graph = KnowledgeGraph::new();
        graph.get_or_create::<Author>("Author_1");
        let mut session = graph.begin("test");
        set_year::<Author>(&mut session, "Author_1", DataProperty::CareerStartYear, Some("n/a"));
        assert_eq!(session.get::<Author>("Author_1").unwrap().career_start_year, None);
        set_year::<Author>(&mut session, "Author_1", DataProperty::CareerStartYear, Some("2001.0"));
        assert_eq!(
            session.get::<Author>("Author_1").unwrap().career_start_year,
            Some(2001)
        );
    }
}
