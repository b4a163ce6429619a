//! The A-Box: an explicit, typed knowledge graph passed by reference into
//! every population stage, plus the batch [`Session`] stages write through.

use std::collections::BTreeMap;

use crate::model::{
    Affiliation, Article, Assertion, Author, Authorship, BioEntity, BioKind, Education,
    Employment, Individual, Institution, NihProject, Organization,
};
use crate::schema::{Class, Property, PublicationStatus};

/// An entity type stored in its own name-keyed table of the graph.
pub trait Entity: Individual + Clone + 'static {
    /// Class of the table (subtypes of BioEntity share one table).
    const CLASS: Class;

    fn new(name: &str) -> Self;

    fn table(graph: &KnowledgeGraph) -> &BTreeMap<String, Self>;

    fn table_mut(graph: &mut KnowledgeGraph) -> &mut BTreeMap<String, Self>;
}

macro_rules! entity_table {
    ($ty:ty, $field:ident, $class:expr) => {
        impl Entity for $ty {
            const CLASS: Class = $class;

            fn new(name: &str) -> Self {
                Self {
                    name: name.to_string(),
                    ..Default::default()
                }
            }

            fn table(graph: &KnowledgeGraph) -> &BTreeMap<String, Self> {
                &graph.$field
            }

            fn table_mut(graph: &mut KnowledgeGraph) -> &mut BTreeMap<String, Self> {
                &mut graph.$field
            }
        }
    };
}

entity_table!(Article, articles, Class::Article);
entity_table!(Author, authors, Class::Author);
entity_table!(Authorship, authorships, Class::Authorship);
entity_table!(Affiliation, affiliations, Class::Affiliation);
entity_table!(Organization, organizations, Class::Organization);
entity_table!(Institution, institutions, Class::Institution);
entity_table!(Employment, employments, Class::Employment);
entity_table!(Education, educations, Class::Education);
entity_table!(NihProject, projects, Class::NihProject);
entity_table!(BioEntity, bio_entities, Class::BioEntity);

/// A second value asserted for a functional property.
///
/// Population is permissive: the first value stays on the entity and the
/// rejected one is kept here so classification can report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub subject: String,
    pub property: Property,
    pub value: String,
}

/// Individuals and relationships, keyed by entity name per type.
///
/// Tables are ordered maps so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeGraph {
    articles: BTreeMap<String, Article>,
    authors: BTreeMap<String, Author>,
    authorships: BTreeMap<String, Authorship>,
    affiliations: BTreeMap<String, Affiliation>,
    organizations: BTreeMap<String, Organization>,
    institutions: BTreeMap<String, Institution>,
    employments: BTreeMap<String, Employment>,
    educations: BTreeMap<String, Education>,
    projects: BTreeMap<String, NihProject>,
    bio_entities: BTreeMap<String, BioEntity>,
    conflicts: Vec<Conflict>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<E: Entity>(&self, name: &str) -> Option<&E> {
        E::table(self).get(name)
    }

    pub fn get_mut<E: Entity>(&mut self, name: &str) -> Option<&mut E> {
        E::table_mut(self).get_mut(name)
    }

    pub fn contains<E: Entity>(&self, name: &str) -> bool {
        E::table(self).contains_key(name)
    }

    /// Return the entity named `name`, creating it if absent. The flag is
    /// `true` when it was created by this call.
    pub fn get_or_create<E: Entity>(&mut self, name: &str) -> (&mut E, bool) {
        let table = E::table_mut(self);
        let created = !table.contains_key(name);
        let entity = table
            .entry(name.to_string())
            .or_insert_with(|| E::new(name));
        (entity, created)
    }

    pub fn iter<E: Entity>(&self) -> impl Iterator<Item = &E> {
        E::table(self).values()
    }

    pub fn names<E: Entity>(&self) -> impl Iterator<Item = &str> {
        E::table(self).keys().map(String::as_str)
    }

    pub fn count<E: Entity>(&self) -> usize {
        E::table(self).len()
    }

    /// Every individual, grouped by table in a fixed order.
    pub fn individuals(&self) -> impl Iterator<Item = &dyn Individual> {
        fn all<E: Entity>(t: &BTreeMap<String, E>) -> impl Iterator<Item = &dyn Individual> {
            t.values().map(|e| e as &dyn Individual)
        }
        all(&self.articles)
            .chain(all(&self.authors))
            .chain(all(&self.authorships))
            .chain(all(&self.affiliations))
            .chain(all(&self.organizations))
            .chain(all(&self.institutions))
            .chain(all(&self.employments))
            .chain(all(&self.educations))
            .chain(all(&self.projects))
            .chain(all(&self.bio_entities))
    }

    pub fn len(&self) -> usize {
        self.articles.len()
            + self.authors.len()
            + self.authorships.len()
            + self.affiliations.len()
            + self.organizations.len()
            + self.institutions.len()
            + self.employments.len()
            + self.educations.len()
            + self.projects.len()
            + self.bio_entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Individual count per most specific asserted class.
    pub fn counts(&self) -> BTreeMap<Class, usize> {
        let mut counts = BTreeMap::new();
        for individual in self.individuals() {
            *counts.entry(individual.class()).or_insert(0) += 1;
        }
        counts
    }

    /// Whether `name` is an individual of `class` (or one of its subclasses).
    pub fn has_individual(&self, class: Class, name: &str) -> bool {
        match class {
            Class::Article => self.articles.contains_key(name),
            Class::Author => self.authors.contains_key(name),
            Class::Authorship => self.authorships.contains_key(name),
            Class::Affiliation => self.affiliations.contains_key(name),
            Class::Organization => self.organizations.contains_key(name),
            Class::Institution => self.institutions.contains_key(name),
            Class::Employment => self.employments.contains_key(name),
            Class::Education => self.educations.contains_key(name),
            Class::NihProject => self.projects.contains_key(name),
            Class::PublicationStatus => PublicationStatus::from_local_name(name).is_some(),
            c if c.is_a(Class::BioEntity) => self
                .bio_entities
                .get(name)
                .is_some_and(|e| e.class().is_a(c)),
            _ => false,
        }
    }

    /// Create (or fetch) an individual by its asserted class. `None` for
    /// classes that have no table (derived classes, the status enumeration).
    pub fn create_individual(&mut self, class: Class, name: &str) -> Option<&mut dyn Individual> {
        let individual: &mut dyn Individual = match class {
            Class::Article => self.get_or_create::<Article>(name).0,
            Class::Author => self.get_or_create::<Author>(name).0,
            Class::Authorship => self.get_or_create::<Authorship>(name).0,
            Class::Affiliation => self.get_or_create::<Affiliation>(name).0,
            Class::Organization => self.get_or_create::<Organization>(name).0,
            Class::Institution => self.get_or_create::<Institution>(name).0,
            Class::Employment => self.get_or_create::<Employment>(name).0,
            Class::Education => self.get_or_create::<Education>(name).0,
            Class::NihProject => self.get_or_create::<NihProject>(name).0,
            c => {
                let kind = BioKind::from_class(c)?;
                let (entity, _) = self.get_or_create::<BioEntity>(name);
                entity.kind = kind;
                entity
            }
        };
        Some(individual)
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn record_conflict(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    /// Open a batch. Changes go to a staged copy and only become visible in
    /// `self` on [`Session::commit`]; dropping the session discards them.
    pub fn begin(&mut self, label: &str) -> Session<'_> {
        log::debug!("begin batch '{label}' ({} individuals)", self.len());
        let staged = self.clone();
        Session {
            target: self,
            staged: Some(staged),
            label: label.to_string(),
            created: BTreeMap::new(),
            conflicts: 0,
        }
    }
}

/// Open batch over a [`KnowledgeGraph`].
pub struct Session<'g> {
    target: &'g mut KnowledgeGraph,
    staged: Option<KnowledgeGraph>,
    label: String,
    created: BTreeMap<Class, usize>,
    conflicts: usize,
}

impl Session<'_> {
    fn staged(&self) -> &KnowledgeGraph {
        self.staged
            .as_ref()
            .unwrap_or_else(|| unreachable!("staged graph is only taken by commit"))
    }

    fn staged_mut(&mut self) -> &mut KnowledgeGraph {
        self.staged
            .as_mut()
            .unwrap_or_else(|| unreachable!("staged graph is only taken by commit"))
    }

    /// Read access to the staged graph, including this batch's changes.
    pub fn graph(&self) -> &KnowledgeGraph {
        self.staged()
    }

    /// Typed repository entry point: fetch or create an entity by key.
    pub fn get_or_create<E: Entity>(&mut self, name: &str) -> &mut E {
        let created = !self.staged().contains::<E>(name);
        if created {
            *self.created.entry(E::CLASS).or_insert(0) += 1;
        }
        self.staged_mut().get_or_create::<E>(name).0
    }

    pub fn get<E: Entity>(&self, name: &str) -> Option<&E> {
        self.staged().get(name)
    }

    pub fn get_mut<E: Entity>(&mut self, name: &str) -> Option<&mut E> {
        self.staged_mut().get_mut(name)
    }

    pub fn contains<E: Entity>(&self, name: &str) -> bool {
        self.staged().contains::<E>(name)
    }

    pub fn names<E: Entity>(&self) -> impl Iterator<Item = &str> {
        self.staged().names::<E>()
    }

    /// Record the outcome of a functional assertion; conflicts are kept for
    /// the consistency check.
    pub fn note(&mut self, subject: &str, property: Property, outcome: Assertion) {
        if let Assertion::Conflict(value) = outcome {
            log::debug!("{}: second {property} value '{value}' on {subject}", self.label);
            self.conflicts += 1;
            self.staged_mut().record_conflict(Conflict {
                subject: subject.to_string(),
                property,
                value,
            });
        }
    }

    /// Close the batch and publish its changes.
    pub fn commit(mut self) -> BatchReport {
        if let Some(staged) = self.staged.take() {
            *self.target = staged;
        }
        BatchReport {
            label: std::mem::take(&mut self.label),
            created: std::mem::take(&mut self.created),
            conflicts: self.conflicts,
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.staged.is_some() {
            log::debug!("batch '{}' discarded without commit", self.label);
        }
    }
}

/// What a committed batch created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub label: String,
    pub created: BTreeMap<Class, usize>,
    pub conflicts: usize,
}

impl BatchReport {
    pub fn created_of(&self, class: Class) -> usize {
        self.created.get(&class).copied().unwrap_or(0)
    }

    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataProperty, ObjectProperty};

    fn sorted_names<E: Entity>(graph: &KnowledgeGraph) -> Vec<&str> {
        graph.names::<E>().collect()
    }

    #[test]
    fn tables_iterate_by_name() {
        let mut graph = KnowledgeGraph::new();
        graph.get_or_create::<Author>("Author_2");
        graph.get_or_create::<Author>("Author_1").0.last_name = Some("Smith".into());
        graph.get_or_create::<Article>("Article_1");

        assert_eq!(sorted_names::<Author>(&graph), vec!["Author_1", "Author_2"]);
        assert_eq!(sorted_names::<Article>(&graph), vec!["Article_1"]);
        let last_names: Vec<_> = graph
            .iter::<Author>()
            .map(|a| a.last_name.as_deref())
            .collect();
        assert_eq!(last_names, vec![Some("Smith"), None]);
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut graph = KnowledgeGraph::new();
        let (_, created) = graph.get_or_create::<Author>("Author_1");
        assert!(created);
        let (author, created) = graph.get_or_create::<Author>("Author_1");
        assert!(!created);
        author.last_name = Some("Smith".into());

        assert_eq!(graph.count::<Author>(), 1);
        assert_eq!(
            graph.get::<Author>("Author_1").and_then(|a| a.last_name.as_deref()),
            Some("Smith")
        );
    }

    #[test]
    fn commit_publishes_changes() {
        let mut graph = KnowledgeGraph::new();
        let mut session = graph.begin("authors");
        session.get_or_create::<Article>("Article_1").pmid = Some("1".into());
        session.get_or_create::<Author>("Author_1");
        session.get_or_create::<Author>("Author_1");
        let report = session.commit();

        assert_eq!(report.created_of(Class::Author), 1);
        assert_eq!(report.total_created(), 2);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn dropped_session_leaves_graph_untouched() {
        let mut graph = KnowledgeGraph::new();
        graph.get_or_create::<Author>("Author_1");
        {
            let mut session = graph.begin("doomed");
            session.get_or_create::<Author>("Author_2");
            if let Some(author) = session.get_mut::<Author>("Author_1") {
                author.orcid = Some("x".into());
            }
            assert_eq!(session.graph().count::<Author>(), 2);
        }
        assert_eq!(graph.count::<Author>(), 1);
        assert_eq!(graph.get::<Author>("Author_1").and_then(|a| a.orcid.clone()), None);
    }

    #[test]
    fn conflicts_are_recorded_on_commit() {
        let mut graph = KnowledgeGraph::new();
        let mut session = graph.begin("articles");
        let first = crate::model::assign(
            &mut session.get_or_create::<Article>("Article_1").year,
            2020,
        );
        session.note("Article_1", Property::Data(DataProperty::PublicationYear), first);
        let second = crate::model::assign(
            &mut session.get_or_create::<Article>("Article_1").year,
            2021,
        );
        session.note("Article_1", Property::Data(DataProperty::PublicationYear), second);
        let report = session.commit();

        assert_eq!(report.conflicts, 1);
        assert_eq!(graph.conflicts().len(), 1);
        assert_eq!(graph.conflicts()[0].value, "2021");
    }

    #[test]
    fn bio_entities_share_one_table() {
        let mut graph = KnowledgeGraph::new();
        graph.create_individual(Class::Gene, "BioEntity_1");
        graph.create_individual(Class::Disease, "BioEntity_2");
        assert!(graph.create_individual(Class::ActiveAuthor, "x").is_none());

        assert_eq!(graph.count::<BioEntity>(), 2);
        assert!(graph.has_individual(Class::BioEntity, "BioEntity_1"));
        assert!(graph.has_individual(Class::Gene, "BioEntity_1"));
        assert!(!graph.has_individual(Class::Gene, "BioEntity_2"));
        assert_eq!(graph.counts().get(&Class::Disease), Some(&1));
    }

    #[test]
    fn individuals_visit_every_table() {
        let mut graph = KnowledgeGraph::new();
        graph.get_or_create::<Article>("Article_1");
        graph.get_or_create::<NihProject>("NIHProject_1");
        graph
            .get_or_create::<Article>("Article_1")
            .0
            .assert_object(ObjectProperty::HasStatus, "Published");

        let names: Vec<&str> = graph.individuals().map(|i| i.name()).collect();
        assert_eq!(names, vec!["Article_1", "NIHProject_1"]);
        assert!(graph.has_individual(Class::PublicationStatus, "Published"));
    }
}
