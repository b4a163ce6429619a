//! PKG2020 Core - shared infrastructure for the knowledge-graph pipeline
//!
//! Identifier sanitization, the per-stage entity resolution cache,
//! logging, progress reporting and retry helpers used by every other crate.

pub mod cache;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod sanitize;

// Re-exports for convenience
pub use cache::EntityCache;
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, fmt_num};
pub use retry::{RetryPolicy, Retryable, retry_with_backoff};
pub use sanitize::{UNKNOWN_IDENTIFIER, entity_key, sanitize};
