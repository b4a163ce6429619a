//! A-Box entity records.
//!
//! Every individual is a plain struct with explicit `Option` fields for
//! optional attributes and `Vec<String>` for multi-valued links (targets are
//! entity names). [`Individual`] gives the snapshot codec, the N-Triples
//! exporter and the classifier one uniform view over all of them.

use crate::schema::{Class, DataProperty, Datatype, ObjectProperty, PublicationStatus};

/// A typed data property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Text(String),
    Integer(i64),
}

impl Literal {
    pub fn datatype(&self) -> Datatype {
        match self {
            Self::Text(_) => Datatype::String,
            Self::Integer(_) => Datatype::Integer,
        }
    }

    pub fn lexical(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
        }
    }

    /// Parse a lexical form against a datatype. `None` when it does not fit.
    pub fn parse(datatype: Datatype, lexical: &str) -> Option<Self> {
        match datatype {
            Datatype::String => Some(Self::Text(lexical.to_string())),
            Datatype::Integer => lexical.trim().parse().ok().map(Self::Integer),
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    fn into_i32(self) -> Option<i32> {
        match self {
            Self::Integer(n) => i32::try_from(n).ok(),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

/// Outcome of asserting one property value on an individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    Added,
    /// The same value was already present.
    Unchanged,
    /// A functional property already holds a different value; carries the
    /// rejected value's lexical form.
    Conflict(String),
    /// Not applicable to this individual, or a second value for a
    /// single-valued, non-functional attribute (first write wins).
    Ignored,
}

/// Set a functional attribute. A second, different value is a conflict.
pub fn assign<T: PartialEq + ToString>(slot: &mut Option<T>, value: T) -> Assertion {
    match slot {
        None => {
            *slot = Some(value);
            Assertion::Added
        }
        Some(existing) if *existing == value => Assertion::Unchanged,
        Some(_) => Assertion::Conflict(value.to_string()),
    }
}

/// Set a single-valued attribute where the first asserted value wins.
pub fn assign_first<T: PartialEq>(slot: &mut Option<T>, value: T) -> Assertion {
    match slot {
        None => {
            *slot = Some(value);
            Assertion::Added
        }
        Some(existing) if *existing == value => Assertion::Unchanged,
        Some(_) => Assertion::Ignored,
    }
}

/// Append a link target unless already present. Keeps insertion order.
pub fn link(targets: &mut Vec<String>, target: &str) -> Assertion {
    if targets.iter().any(|t| t == target) {
        Assertion::Unchanged
    } else {
        targets.push(target.to_string());
        Assertion::Added
    }
}

fn text(slot: &mut Option<String>, value: Literal) -> Assertion {
    value
        .into_text()
        .map_or(Assertion::Ignored, |v| assign_first(slot, v))
}

fn integer(slot: &mut Option<i32>, value: Literal) -> Assertion {
    value
        .into_i32()
        .map_or(Assertion::Ignored, |v| assign_first(slot, v))
}

fn push_text(out: &mut Vec<(DataProperty, Literal)>, p: DataProperty, v: &Option<String>) {
    if let Some(v) = v {
        out.push((p, Literal::Text(v.clone())));
    }
}

fn push_int(out: &mut Vec<(DataProperty, Literal)>, p: DataProperty, v: Option<i32>) {
    if let Some(v) = v {
        out.push((p, Literal::from(v)));
    }
}

fn push_links<'a>(out: &mut Vec<(ObjectProperty, &'a str)>, p: ObjectProperty, v: &'a [String]) {
    out.extend(v.iter().map(|t| (p, t.as_str())));
}

fn push_link<'a>(out: &mut Vec<(ObjectProperty, &'a str)>, p: ObjectProperty, v: &'a Option<String>) {
    if let Some(t) = v {
        out.push((p, t.as_str()));
    }
}

/// Uniform, name-keyed view over every entity record.
pub trait Individual {
    fn name(&self) -> &str;

    /// Most specific asserted class.
    fn class(&self) -> Class;

    fn data_values(&self) -> Vec<(DataProperty, Literal)>;

    /// Object property values as `(property, target name)`.
    fn object_values(&self) -> Vec<(ObjectProperty, &str)>;

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion;

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub name: String,
    pub pmid: Option<String>,
    pub year: Option<i32>,
    pub status: Option<PublicationStatus>,
    pub primary_author: Option<String>,
    pub authors: Vec<String>,
    pub authorships: Vec<String>,
    pub mentions: Vec<String>,
}

impl Individual for Article {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Article
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::HasPmid, &self.pmid);
        push_int(&mut out, DataProperty::PublicationYear, self.year);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        let mut out = Vec::new();
        push_links(&mut out, ObjectProperty::WrittenBy, &self.authors);
        push_links(&mut out, ObjectProperty::HasAuthorship, &self.authorships);
        push_link(&mut out, ObjectProperty::HasPrimaryAuthor, &self.primary_author);
        if let Some(status) = self.status {
            out.push((ObjectProperty::HasStatus, status.local_name()));
        }
        push_links(&mut out, ObjectProperty::MentionsBioEntity, &self.mentions);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::HasPmid => match value.into_text() {
                Some(v) => assign(&mut self.pmid, v),
                None => Assertion::Ignored,
            },
            DataProperty::PublicationYear => match value.into_i32() {
                Some(v) => assign(&mut self.year, v),
                None => Assertion::Ignored,
            },
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion {
        match property {
            ObjectProperty::WrittenBy => link(&mut self.authors, target),
            ObjectProperty::HasAuthorship => link(&mut self.authorships, target),
            ObjectProperty::MentionsBioEntity => link(&mut self.mentions, target),
            ObjectProperty::HasPrimaryAuthor => assign(&mut self.primary_author, target.to_string()),
            ObjectProperty::HasStatus => match PublicationStatus::from_local_name(target) {
                Some(status) => assign(&mut self.status, status),
                None => Assertion::Ignored,
            },
            _ => Assertion::Ignored,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Author {
    pub name: String,
    pub last_name: Option<String>,
    pub fore_name: Option<String>,
    pub initials: Option<String>,
    pub orcid: Option<String>,
    pub career_start_year: Option<i32>,
    pub affiliations: Vec<String>,
    pub employments: Vec<String>,
    pub educations: Vec<String>,
    pub projects: Vec<String>,
}

impl Author {
    /// "Fore Last" when either part is known.
    pub fn display_name(&self) -> Option<String> {
        match (&self.fore_name, &self.last_name) {
            (Some(f), Some(l)) => Some(format!("{f} {l}")),
            (Some(n), None) | (None, Some(n)) => Some(n.clone()),
            (None, None) => None,
        }
    }
}

impl Individual for Author {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Author
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::LastName, &self.last_name);
        push_text(&mut out, DataProperty::ForeName, &self.fore_name);
        push_text(&mut out, DataProperty::Initials, &self.initials);
        push_text(&mut out, DataProperty::Orcid, &self.orcid);
        push_int(&mut out, DataProperty::CareerStartYear, self.career_start_year);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        let mut out = Vec::new();
        push_links(&mut out, ObjectProperty::HasAffiliation, &self.affiliations);
        push_links(&mut out, ObjectProperty::HasEmployment, &self.employments);
        push_links(&mut out, ObjectProperty::HasEducation, &self.educations);
        push_links(&mut out, ObjectProperty::HasProject, &self.projects);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::LastName => text(&mut self.last_name, value),
            DataProperty::ForeName => text(&mut self.fore_name, value),
            DataProperty::Initials => text(&mut self.initials, value),
            DataProperty::Orcid => text(&mut self.orcid, value),
            DataProperty::CareerStartYear => integer(&mut self.career_start_year, value),
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion {
        match property {
            ObjectProperty::HasAffiliation => link(&mut self.affiliations, target),
            ObjectProperty::HasEmployment => link(&mut self.employments, target),
            ObjectProperty::HasEducation => link(&mut self.educations, target),
            ObjectProperty::HasProject => link(&mut self.projects, target),
            _ => Assertion::Ignored,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Authorship {
    pub name: String,
    pub author: Option<String>,
    pub order: Option<i32>,
}

impl Individual for Authorship {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Authorship
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_int(&mut out, DataProperty::AuthorOrder, self.order);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        let mut out = Vec::new();
        push_link(&mut out, ObjectProperty::RefersToAuthor, &self.author);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::AuthorOrder => integer(&mut self.order, value),
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion {
        match property {
            ObjectProperty::RefersToAuthor => assign_first(&mut self.author, target.to_string()),
            _ => Assertion::Ignored,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Affiliation {
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub organization: Option<String>,
}

impl Individual for Affiliation {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Affiliation
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::City, &self.city);
        push_text(&mut out, DataProperty::State, &self.state);
        push_text(&mut out, DataProperty::Country, &self.country);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        let mut out = Vec::new();
        push_link(&mut out, ObjectProperty::AffiliatedWith, &self.organization);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::City => text(&mut self.city, value),
            DataProperty::State => text(&mut self.state, value),
            DataProperty::Country => text(&mut self.country, value),
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion {
        match property {
            ObjectProperty::AffiliatedWith => {
                assign_first(&mut self.organization, target.to_string())
            }
            _ => Assertion::Ignored,
        }
    }
}

/// Shared shape of [`Organization`] and [`Institution`]: a sanitized-name key
/// plus optional external links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalLinks {
    pub dbpedia: Option<String>,
    pub wikidata: Option<String>,
}

impl ExternalLinks {
    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::DbpediaLink, &self.dbpedia);
        push_text(&mut out, DataProperty::WikidataLink, &self.wikidata);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::DbpediaLink => text(&mut self.dbpedia, value),
            DataProperty::WikidataLink => text(&mut self.wikidata, value),
            _ => Assertion::Ignored,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dbpedia.is_none() && self.wikidata.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Organization {
    pub name: String,
    pub links: ExternalLinks,
}

impl Individual for Organization {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Organization
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        self.links.data_values()
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        Vec::new()
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        self.links.assert_data(property, value)
    }

    fn assert_object(&mut self, _: ObjectProperty, _: &str) -> Assertion {
        Assertion::Ignored
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Institution {
    pub name: String,
    pub links: ExternalLinks,
}

impl Individual for Institution {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Institution
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        self.links.data_values()
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        Vec::new()
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        self.links.assert_data(property, value)
    }

    fn assert_object(&mut self, _: ObjectProperty, _: &str) -> Assertion {
        Assertion::Ignored
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Employment {
    pub name: String,
    pub job_title: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub organization: Option<String>,
}

impl Individual for Employment {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Employment
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::JobTitle, &self.job_title);
        push_int(&mut out, DataProperty::StartYear, self.start_year);
        push_int(&mut out, DataProperty::EndYear, self.end_year);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        let mut out = Vec::new();
        push_link(&mut out, ObjectProperty::EmployedAt, &self.organization);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::JobTitle => text(&mut self.job_title, value),
            DataProperty::StartYear => integer(&mut self.start_year, value),
            DataProperty::EndYear => integer(&mut self.end_year, value),
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion {
        match property {
            ObjectProperty::EmployedAt => assign_first(&mut self.organization, target.to_string()),
            _ => Assertion::Ignored,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Education {
    pub name: String,
    pub degree: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub institution: Option<String>,
}

impl Individual for Education {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::Education
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::Degree, &self.degree);
        push_int(&mut out, DataProperty::StartYear, self.start_year);
        push_int(&mut out, DataProperty::EndYear, self.end_year);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        let mut out = Vec::new();
        push_link(&mut out, ObjectProperty::EducatedAt, &self.institution);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::Degree => text(&mut self.degree, value),
            DataProperty::StartYear => integer(&mut self.start_year, value),
            DataProperty::EndYear => integer(&mut self.end_year, value),
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion {
        match property {
            ObjectProperty::EducatedAt => assign_first(&mut self.institution, target.to_string()),
            _ => Assertion::Ignored,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NihProject {
    pub name: String,
    pub project_number: Option<String>,
    pub pi_name: Option<String>,
    pub investigators: Vec<String>,
}

impl Individual for NihProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        Class::NihProject
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::ProjectNumber, &self.project_number);
        push_text(&mut out, DataProperty::PiName, &self.pi_name);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        let mut out = Vec::new();
        push_links(&mut out, ObjectProperty::IsPrincipalInvestigator, &self.investigators);
        out
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::ProjectNumber => text(&mut self.project_number, value),
            DataProperty::PiName => text(&mut self.pi_name, value),
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, property: ObjectProperty, target: &str) -> Assertion {
        match property {
            ObjectProperty::IsPrincipalInvestigator => link(&mut self.investigators, target),
            _ => Assertion::Ignored,
        }
    }
}

/// Asserted subtype of a [`BioEntity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BioKind {
    #[default]
    Generic,
    Gene,
    Chemical,
    Disease,
    Species,
    Mutation,
}

impl BioKind {
    /// Map a source `Type` label (case-insensitive) to a subtype.
    pub fn from_type_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "gene" => Self::Gene,
            "chemical" => Self::Chemical,
            "disease" => Self::Disease,
            "species" => Self::Species,
            "mutation" => Self::Mutation,
            _ => Self::Generic,
        }
    }

    pub fn from_class(class: Class) -> Option<Self> {
        match class {
            Class::BioEntity => Some(Self::Generic),
            Class::Gene => Some(Self::Gene),
            Class::Chemical => Some(Self::Chemical),
            Class::Disease => Some(Self::Disease),
            Class::Species => Some(Self::Species),
            Class::Mutation => Some(Self::Mutation),
            _ => None,
        }
    }

    pub fn class(self) -> Class {
        match self {
            Self::Generic => Class::BioEntity,
            Self::Gene => Class::Gene,
            Self::Chemical => Class::Chemical,
            Self::Disease => Class::Disease,
            Self::Species => Class::Species,
            Self::Mutation => Class::Mutation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BioEntity {
    pub name: String,
    pub kind: BioKind,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub entity_type: Option<String>,
}

impl Individual for BioEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> Class {
        self.kind.class()
    }

    fn data_values(&self) -> Vec<(DataProperty, Literal)> {
        let mut out = Vec::new();
        push_text(&mut out, DataProperty::EntityId, &self.entity_id);
        push_text(&mut out, DataProperty::EntityName, &self.entity_name);
        push_text(&mut out, DataProperty::EntityType, &self.entity_type);
        out
    }

    fn object_values(&self) -> Vec<(ObjectProperty, &str)> {
        Vec::new()
    }

    fn assert_data(&mut self, property: DataProperty, value: Literal) -> Assertion {
        match property {
            DataProperty::EntityId => text(&mut self.entity_id, value),
            DataProperty::EntityName => text(&mut self.entity_name, value),
            DataProperty::EntityType => text(&mut self.entity_type, value),
            _ => Assertion::Ignored,
        }
    }

    fn assert_object(&mut self, _: ObjectProperty, _: &str) -> Assertion {
        Assertion::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_detects_conflict() {
        let mut slot = None;
        assert_eq!(assign(&mut slot, 2020), Assertion::Added);
        assert_eq!(assign(&mut slot, 2020), Assertion::Unchanged);
        assert_eq!(assign(&mut slot, 2021), Assertion::Conflict("2021".into()));
        assert_eq!(slot, Some(2020));
    }

    #[test]
    fn first_write_wins_for_names() {
        let mut author = Author::default();
        author.assert_data(DataProperty::LastName, "Smith".into());
        let second = author.assert_data(DataProperty::LastName, "Smyth".into());
        assert_eq!(second, Assertion::Ignored);
        assert_eq!(author.last_name.as_deref(), Some("Smith"));
    }

    #[test]
    fn links_deduplicate_and_keep_order() {
        let mut article = Article::default();
        for a in ["Author_2", "Author_1", "Author_2"] {
            article.assert_object(ObjectProperty::WrittenBy, a);
        }
        assert_eq!(article.authors, vec!["Author_2", "Author_1"]);
    }

    #[test]
    fn status_is_parsed_from_individual_name() {
        let mut article = Article::default();
        assert_eq!(
            article.assert_object(ObjectProperty::HasStatus, "Preprint"),
            Assertion::Added
        );
        assert_eq!(article.status, Some(PublicationStatus::Preprint));
        assert_eq!(
            article.assert_object(ObjectProperty::HasStatus, "Bogus"),
            Assertion::Ignored
        );
        assert_eq!(
            article.assert_object(ObjectProperty::HasStatus, "Retracted"),
            Assertion::Conflict("Retracted".into())
        );
    }

    #[test]
    fn wrong_datatype_is_ignored() {
        let mut employment = Employment::default();
        let out = employment.assert_data(DataProperty::StartYear, "2015".into());
        assert_eq!(out, Assertion::Ignored);
        assert_eq!(employment.start_year, None);
    }

    #[test]
    fn bio_kind_labels() {
        assert_eq!(BioKind::from_type_label("Gene"), BioKind::Gene);
        assert_eq!(BioKind::from_type_label(" DISEASE "), BioKind::Disease);
        assert_eq!(BioKind::from_type_label("CellLine"), BioKind::Generic);
        assert_eq!(BioKind::Species.class(), Class::Species);
        assert_eq!(BioKind::from_class(Class::Mutation), Some(BioKind::Mutation));
        assert_eq!(BioKind::from_class(Class::Author), None);
    }

    #[test]
    fn integer_literals() {
        assert_eq!(
            Literal::parse(Datatype::Integer, " 2015 "),
            Some(Literal::Integer(2015))
        );
        assert_eq!(Literal::parse(Datatype::Integer, "n/a"), None);
        assert_eq!(Literal::from(3).lexical(), "3");
    }
}
