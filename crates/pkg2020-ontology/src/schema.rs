//! T-Box vocabulary: classes, object properties and data properties of the
//! PKG2020 ontology, with their IRIs, hierarchy, domains, ranges and
//! characteristics.

/// Ontology IRI (no fragment).
pub const ONTOLOGY_IRI: &str = "http://example.org/pkg2020/ontology.owl";
/// Namespace for every class, property and individual.
pub const NS: &str = "http://example.org/pkg2020/ontology.owl#";

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Full IRI of a local name in the ontology namespace.
pub fn iri(local: &str) -> String {
    format!("{NS}{local}")
}

/// Strip the ontology namespace (or any `#`/`/` prefix) from an IRI.
pub fn local_name(iri: &str) -> &str {
    if let Some(rest) = iri.strip_prefix(NS) {
        return rest;
    }
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    Article,
    Author,
    Authorship,
    PublicationYear,
    PublicationStatus,
    Organization,
    Institution,
    Affiliation,
    Employment,
    Education,
    NihProject,
    BioEntity,
    Gene,
    Chemical,
    Disease,
    Species,
    Mutation,
    // Defined (equivalent-class axioms)
    ActiveAuthor,
    AnonymousAuthor,
    ResearchEntity,
    ProlificAuthor,
    SingleAuthorArticle,
    MultiAuthorArticle,
    FundedAuthor,
    // Rule heads
    EstablishedResearcher,
    CollaborativeArticle,
    GeneDiseaseLinkArticle,
}

impl Class {
    pub const ALL: [Class; 27] = [
        Class::Article,
        Class::Author,
        Class::Authorship,
        Class::PublicationYear,
        Class::PublicationStatus,
        Class::Organization,
        Class::Institution,
        Class::Affiliation,
        Class::Employment,
        Class::Education,
        Class::NihProject,
        Class::BioEntity,
        Class::Gene,
        Class::Chemical,
        Class::Disease,
        Class::Species,
        Class::Mutation,
        Class::ActiveAuthor,
        Class::AnonymousAuthor,
        Class::ResearchEntity,
        Class::ProlificAuthor,
        Class::SingleAuthorArticle,
        Class::MultiAuthorArticle,
        Class::FundedAuthor,
        Class::EstablishedResearcher,
        Class::CollaborativeArticle,
        Class::GeneDiseaseLinkArticle,
    ];

    pub fn local_name(self) -> &'static str {
        match self {
            Self::Article => "Article",
            Self::Author => "Author",
            Self::Authorship => "Authorship",
            Self::PublicationYear => "PublicationYear",
            Self::PublicationStatus => "PublicationStatus",
            Self::Organization => "Organization",
            Self::Institution => "Institution",
            Self::Affiliation => "Affiliation",
            Self::Employment => "Employment",
            Self::Education => "Education",
            Self::NihProject => "NIHProject",
            Self::BioEntity => "BioEntity",
            Self::Gene => "Gene",
            Self::Chemical => "Chemical",
            Self::Disease => "Disease",
            Self::Species => "Species",
            Self::Mutation => "Mutation",
            Self::ActiveAuthor => "ActiveAuthor",
            Self::AnonymousAuthor => "AnonymousAuthor",
            Self::ResearchEntity => "ResearchEntity",
            Self::ProlificAuthor => "ProlificAuthor",
            Self::SingleAuthorArticle => "SingleAuthorArticle",
            Self::MultiAuthorArticle => "MultiAuthorArticle",
            Self::FundedAuthor => "FundedAuthor",
            Self::EstablishedResearcher => "EstablishedResearcher",
            Self::CollaborativeArticle => "CollaborativeArticle",
            Self::GeneDiseaseLinkArticle => "GeneDiseaseLinkArticle",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.local_name() == name)
    }

    pub fn iri(self) -> String {
        iri(self.local_name())
    }

    /// Direct named superclass, if any.
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::Gene | Self::Chemical | Self::Disease | Self::Species | Self::Mutation => {
                Some(Self::BioEntity)
            }
            Self::ActiveAuthor
            | Self::AnonymousAuthor
            | Self::ProlificAuthor
            | Self::FundedAuthor
            | Self::EstablishedResearcher => Some(Self::Author),
            Self::SingleAuthorArticle
            | Self::MultiAuthorArticle
            | Self::CollaborativeArticle
            | Self::GeneDiseaseLinkArticle => Some(Self::Article),
            _ => None,
        }
    }

    /// Reflexive, transitive subclass test over the named hierarchy.
    pub fn is_a(self, other: Self) -> bool {
        let mut current = Some(self);
        while let Some(c) = current {
            if c == other {
                return true;
            }
            current = c.parent();
        }
        false
    }

    /// Classes whose membership is computed, never asserted.
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Self::ActiveAuthor
                | Self::AnonymousAuthor
                | Self::ResearchEntity
                | Self::ProlificAuthor
                | Self::SingleAuthorArticle
                | Self::MultiAuthorArticle
                | Self::FundedAuthor
                | Self::EstablishedResearcher
                | Self::CollaborativeArticle
                | Self::GeneDiseaseLinkArticle
        )
    }

    /// Human-readable description written as `rdfs:comment`.
    pub fn comment(self) -> Option<&'static str> {
        let text = match self {
            Self::Article => "A publication identified by exactly one PMID.",
            Self::Author => "A researcher identified by an author-name-disambiguation id.",
            Self::Authorship => "Reified Article-Author link carrying the author order.",
            Self::PublicationStatus => "Closed enumeration of publication states.",
            Self::BioEntity => "A biomedical entity mentioned by articles.",
            Self::NihProject => "An NIH-funded research project.",
            _ => return None,
        };
        Some(text)
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}

/// The closed `PublicationStatus` enumeration (`owl:oneOf`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublicationStatus {
    Published,
    Preprint,
    Retracted,
    InReview,
}

impl PublicationStatus {
    pub const ALL: [PublicationStatus; 4] = [
        PublicationStatus::Published,
        PublicationStatus::Preprint,
        PublicationStatus::Retracted,
        PublicationStatus::InReview,
    ];

    pub fn local_name(self) -> &'static str {
        match self {
            Self::Published => "Published",
            Self::Preprint => "Preprint",
            Self::Retracted => "Retracted",
            Self::InReview => "InReview",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.local_name() == name)
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectProperty {
    WrittenBy,
    HasAuthorship,
    RefersToAuthor,
    HasPrimaryAuthor,
    HasStatus,
    HasAffiliation,
    AffiliatedWith,
    HasEmployment,
    EmployedAt,
    HasEducation,
    EducatedAt,
    HasProject,
    IsPrincipalInvestigator,
    MentionsBioEntity,
    IsAlumniPeerOf,
}

impl ObjectProperty {
    pub const ALL: [ObjectProperty; 15] = [
        ObjectProperty::WrittenBy,
        ObjectProperty::HasAuthorship,
        ObjectProperty::RefersToAuthor,
        ObjectProperty::HasPrimaryAuthor,
        ObjectProperty::HasStatus,
        ObjectProperty::HasAffiliation,
        ObjectProperty::AffiliatedWith,
        ObjectProperty::HasEmployment,
        ObjectProperty::EmployedAt,
        ObjectProperty::HasEducation,
        ObjectProperty::EducatedAt,
        ObjectProperty::HasProject,
        ObjectProperty::IsPrincipalInvestigator,
        ObjectProperty::MentionsBioEntity,
        ObjectProperty::IsAlumniPeerOf,
    ];

    pub fn local_name(self) -> &'static str {
        match self {
            Self::WrittenBy => "writtenBy",
            Self::HasAuthorship => "hasAuthorship",
            Self::RefersToAuthor => "refersToAuthor",
            Self::HasPrimaryAuthor => "hasPrimaryAuthor",
            Self::HasStatus => "hasStatus",
            Self::HasAffiliation => "hasAffiliation",
            Self::AffiliatedWith => "affiliatedWith",
            Self::HasEmployment => "hasEmployment",
            Self::EmployedAt => "employedAt",
            Self::HasEducation => "hasEducation",
            Self::EducatedAt => "educatedAt",
            Self::HasProject => "hasProject",
            Self::IsPrincipalInvestigator => "isPrincipalInvestigator",
            Self::MentionsBioEntity => "mentionsBioEntity",
            Self::IsAlumniPeerOf => "isAlumniPeerOf",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.local_name() == name)
    }

    pub fn iri(self) -> String {
        iri(self.local_name())
    }

    pub fn domain(self) -> Class {
        match self {
            Self::WrittenBy
            | Self::HasAuthorship
            | Self::HasPrimaryAuthor
            | Self::HasStatus
            | Self::MentionsBioEntity => Class::Article,
            Self::RefersToAuthor => Class::Authorship,
            Self::HasAffiliation
            | Self::HasEmployment
            | Self::HasEducation
            | Self::HasProject
            | Self::IsAlumniPeerOf => Class::Author,
            Self::AffiliatedWith => Class::Affiliation,
            Self::EmployedAt => Class::Employment,
            Self::EducatedAt => Class::Education,
            Self::IsPrincipalInvestigator => Class::NihProject,
        }
    }

    pub fn range(self) -> Class {
        match self {
            Self::WrittenBy
            | Self::RefersToAuthor
            | Self::HasPrimaryAuthor
            | Self::IsPrincipalInvestigator
            | Self::IsAlumniPeerOf => Class::Author,
            Self::HasAuthorship => Class::Authorship,
            Self::HasStatus => Class::PublicationStatus,
            Self::HasAffiliation => Class::Affiliation,
            Self::AffiliatedWith | Self::EmployedAt => Class::Organization,
            Self::HasEmployment => Class::Employment,
            Self::HasEducation => Class::Education,
            Self::EducatedAt => Class::Institution,
            Self::HasProject => Class::NihProject,
            Self::MentionsBioEntity => Class::BioEntity,
        }
    }

    pub fn is_functional(self) -> bool {
        matches!(self, Self::HasPrimaryAuthor | Self::HasStatus)
    }

    pub fn is_symmetric(self) -> bool {
        matches!(self, Self::IsAlumniPeerOf)
    }

    /// Properties only ever produced by classification.
    pub fn is_derived(self) -> bool {
        matches!(self, Self::IsAlumniPeerOf)
    }
}

impl std::fmt::Display for ObjectProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}

/// XSD datatypes used by data property ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    String,
    Integer,
}

impl Datatype {
    pub fn iri(self) -> String {
        match self {
            Self::String => format!("{XSD_NS}string"),
            Self::Integer => format!("{XSD_NS}integer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataProperty {
    HasPmid,
    PublicationYear,
    LastName,
    ForeName,
    Initials,
    Orcid,
    CareerStartYear,
    AuthorOrder,
    City,
    State,
    Country,
    StartYear,
    EndYear,
    JobTitle,
    Degree,
    ProjectNumber,
    PiName,
    EntityId,
    EntityName,
    EntityType,
    DbpediaLink,
    WikidataLink,
}

impl DataProperty {
    pub const ALL: [DataProperty; 22] = [
        DataProperty::HasPmid,
        DataProperty::PublicationYear,
        DataProperty::LastName,
        DataProperty::ForeName,
        DataProperty::Initials,
        DataProperty::Orcid,
        DataProperty::CareerStartYear,
        DataProperty::AuthorOrder,
        DataProperty::City,
        DataProperty::State,
        DataProperty::Country,
        DataProperty::StartYear,
        DataProperty::EndYear,
        DataProperty::JobTitle,
        DataProperty::Degree,
        DataProperty::ProjectNumber,
        DataProperty::PiName,
        DataProperty::EntityId,
        DataProperty::EntityName,
        DataProperty::EntityType,
        DataProperty::DbpediaLink,
        DataProperty::WikidataLink,
    ];

    pub fn local_name(self) -> &'static str {
        match self {
            Self::HasPmid => "hasPMID",
            Self::PublicationYear => "publicationYear",
            Self::LastName => "lastName",
            Self::ForeName => "foreName",
            Self::Initials => "initials",
            Self::Orcid => "orcid",
            Self::CareerStartYear => "careerStartYear",
            Self::AuthorOrder => "authorOrder",
            Self::City => "city",
            Self::State => "state",
            Self::Country => "country",
            Self::StartYear => "startYear",
            Self::EndYear => "endYear",
            Self::JobTitle => "jobTitle",
            Self::Degree => "degree",
            Self::ProjectNumber => "projectNumber",
            Self::PiName => "piName",
            Self::EntityId => "entityId",
            Self::EntityName => "entityName",
            Self::EntityType => "entityType",
            Self::DbpediaLink => "dbpediaLink",
            Self::WikidataLink => "wikidataLink",
        }
    }

    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.local_name() == name)
    }

    pub fn iri(self) -> String {
        iri(self.local_name())
    }

    /// Domain class; `None` for properties shared by several classes.
    pub fn domain(self) -> Option<Class> {
        match self {
            Self::HasPmid | Self::PublicationYear => Some(Class::Article),
            Self::LastName
            | Self::ForeName
            | Self::Initials
            | Self::Orcid
            | Self::CareerStartYear => Some(Class::Author),
            Self::AuthorOrder => Some(Class::Authorship),
            Self::City | Self::State | Self::Country => Some(Class::Affiliation),
            Self::JobTitle => Some(Class::Employment),
            Self::Degree => Some(Class::Education),
            Self::ProjectNumber | Self::PiName => Some(Class::NihProject),
            Self::EntityId | Self::EntityName | Self::EntityType => Some(Class::BioEntity),
            Self::StartYear | Self::EndYear | Self::DbpediaLink | Self::WikidataLink => None,
        }
    }

    pub fn range(self) -> Datatype {
        match self {
            Self::PublicationYear
            | Self::CareerStartYear
            | Self::AuthorOrder
            | Self::StartYear
            | Self::EndYear => Datatype::Integer,
            _ => Datatype::String,
        }
    }

    pub fn is_functional(self) -> bool {
        matches!(self, Self::HasPmid | Self::PublicationYear)
    }

    pub fn is_inverse_functional(self) -> bool {
        matches!(self, Self::HasPmid)
    }
}

impl std::fmt::Display for DataProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}

/// Either kind of property, for messages that cover both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Object(ObjectProperty),
    Data(DataProperty),
}

impl Property {
    pub fn local_name(self) -> &'static str {
        match self {
            Self::Object(p) => p.local_name(),
            Self::Data(p) => p.local_name(),
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.local_name())
    }
}
