//! PKG2020 Populate - builds the A-Box from the PKG2020 CSV extracts
//!
//! Each dataset is one stage that reads its CSV, resolves the entities it
//! refers to against the graph produced by earlier stages, and commits its
//! additions as a single batch.
//!
//! # Example
//!
//! ```ignore
//! use pkg2020_core::ProgressContext;
//! use pkg2020_ontology::KnowledgeGraph;
//! use pkg2020_populate::{Config, Dataset, run};
//!
//! let config = Config::with_data_dir("data");
//! let mut graph = KnowledgeGraph::new();
//! let summary = run(&mut graph, &Dataset::SOURCED, &config, &ProgressContext::new())?;
//! println!("{} individuals", summary.individuals);
//! ```

pub mod config;
pub mod dataset;
pub mod runner;
pub mod source;
pub mod stages;

// Re-exports
pub use config::{Config, Limits};
pub use dataset::Dataset;
pub use runner::{StageSummary, Summary, run, run_stage};
pub use source::{SourceError, Skip};
