//! Errors at the query boundary

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum QueryError {
    /// The SPARQL text does not parse
    Syntax(String),
    /// Evaluation did not finish within the configured wall-clock limit
    Timeout(Duration),
    Evaluation(String),
    /// The graph could not be loaded into the SPARQL store
    Load {
        path: Option<PathBuf>,
        message: String,
    },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(msg) => write!(f, "SPARQL syntax error: {msg}"),
            Self::Timeout(limit) => {
                write!(f, "query timed out after {:.1}s", limit.as_secs_f64())
            }
            Self::Evaluation(msg) => write!(f, "query evaluation failed: {msg}"),
            Self::Load {
                path: Some(path),
                message,
            } => write!(f, "failed to load {}: {message}", path.display()),
            Self::Load {
                path: None,
                message,
            } => write!(f, "failed to load graph: {message}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl QueryError {
    pub(crate) fn load(path: Option<&std::path::Path>, message: impl ToString) -> Self {
        Self::Load {
            path: path.map(PathBuf::from),
            message: message.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
