//! PKG2020 Query - SPARQL access to populated graphs
//!
//! [`GraphService`] holds an in-memory SPARQL store that is loaded from a
//! snapshot on first use. On top of it sit the competency-question catalog,
//! graph statistics and keyword search. [`fuseki`] pushes an N-Triples export
//! into an external Fuseki server instead.

pub mod competency;
pub mod error;
pub mod fuseki;
pub mod search;
pub mod service;
pub mod stats;
pub mod table;

pub use competency::{CATALOG, CompetencyQuestion};
pub use error::QueryError;
pub use fuseki::{FusekiTarget, LoadReport, ServiceError};
pub use service::{DEFAULT_TIMEOUT, GraphFormat, GraphService};
pub use stats::GraphStats;
pub use table::QueryTable;
