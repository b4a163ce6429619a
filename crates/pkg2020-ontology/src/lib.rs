//! PKG2020 ontology: the T-Box, the typed A-Box graph, the RDF/XML snapshot
//! codec and the classifier.

pub mod axioms;
pub mod graph;
pub mod model;
pub mod ntriples;
pub mod reason;
pub mod schema;
pub mod snapshot;

pub use graph::{BatchReport, Conflict, Entity, KnowledgeGraph, Session};
pub use model::{
    Affiliation, Article, Assertion, Author, Authorship, BioEntity, BioKind, Education,
    Employment, ExternalLinks, Individual, Institution, Literal, NihProject, Organization,
};
pub use ntriples::write_ntriples;
pub use reason::{Classification, Inferences, Violation, check_consistency, classify};
pub use schema::{Class, DataProperty, ObjectProperty, Property, PublicationStatus};
pub use snapshot::SnapshotError;
