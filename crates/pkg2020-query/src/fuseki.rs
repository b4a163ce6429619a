//! Loader for an Apache Jena Fuseki triple store
//!
//! Waits for the server, creates the dataset when missing, uploads an
//! N-Triples export and reads back the triple count.

use std::path::Path;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pkg2020_core::{RetryPolicy, Retryable, fmt_num, retry_with_backoff};
use reqwest::StatusCode;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const PING_TIMEOUT: Duration = Duration::from_secs(5);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(3600);

static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

/// Runtime for the blocking facade over async reqwest.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

#[derive(Debug)]
pub enum ServiceError {
    Http {
        status: Option<u16>,
        message: String,
    },
    Io(std::io::Error),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    fn status(status: StatusCode, body: &str) -> Self {
        Self::Http {
            status: Some(status.as_u16()),
            message: body.chars().take(500).collect(),
        }
    }
}

impl Retryable for ServiceError {
    /// Connection failures and 5xx are retried; client errors are not.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status: None, .. } => true,
            Self::Http {
                status: Some(s), ..
            } => *s >= 500,
            Self::Io(_) => false,
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Connection settings for one Fuseki dataset.
#[derive(Debug, Clone)]
pub struct FusekiTarget {
    /// Server root, e.g. `http://localhost:3030`
    pub url: String,
    pub dataset: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Readiness polling: attempts after the first, and the fixed delay
    pub retry: RetryPolicy,
}

impl FusekiTarget {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.url.trim_end_matches('/'))
    }

    pub fn sparql_endpoint(&self) -> String {
        self.endpoint(&format!("{}/sparql", self.dataset))
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = SHARED_CLIENT.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }
}

/// Outcome of a completed load.
#[derive(Debug)]
pub struct LoadReport {
    pub created_dataset: bool,
    pub bytes: u64,
    pub triples: usize,
    pub elapsed: Duration,
}

/// Send a request and return the body; non-2xx statuses are errors.
async fn send(builder: reqwest::RequestBuilder) -> Result<(StatusCode, String), ServiceError> {
    let response = builder
        .send()
        .await
        .map_err(|e| ServiceError::from_reqwest(&e))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ServiceError::from_reqwest(&e))?;
    Ok((status, body))
}

fn ok_or_error((status, body): (StatusCode, String)) -> Result<String, ServiceError> {
    if status.is_success() {
        Ok(body)
    } else {
        Err(ServiceError::status(status, &body))
    }
}

pub fn ping(target: &FusekiTarget) -> Result<(), ServiceError> {
    let url = target.endpoint("$/ping");
    SHARED_RUNTIME.handle().block_on(async {
        send(SHARED_CLIENT.get(&url).timeout(PING_TIMEOUT))
            .await
            .and_then(ok_or_error)
            .map(|_| ())
    })
}

/// Poll `$/ping` until the server answers or the retry policy is spent.
pub fn wait_ready(target: &FusekiTarget) -> Result<(), ServiceError> {
    log::info!("Waiting for Fuseki at {} ...", target.url);
    retry_with_backoff("fuseki ping", target.retry, || ping(target))
}

pub fn dataset_exists(target: &FusekiTarget) -> Result<bool, ServiceError> {
    let url = target.endpoint(&format!("$/datasets/{}", target.dataset));
    let (status, body) = SHARED_RUNTIME
        .handle()
        .block_on(send(target.request(reqwest::Method::GET, &url)))?;
    match status {
        s if s.is_success() => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        s => Err(ServiceError::status(s, &body)),
    }
}

/// Create a TDB2 dataset unless it exists. Returns whether it was created.
pub fn ensure_dataset(target: &FusekiTarget) -> Result<bool, ServiceError> {
    if dataset_exists(target)? {
        log::info!("Dataset '{}' already exists", target.dataset);
        return Ok(false);
    }
    let url = target.endpoint("$/datasets");
    let form = [("dbType", "tdb2"), ("dbName", target.dataset.as_str())];
    SHARED_RUNTIME
        .handle()
        .block_on(send(target.request(reqwest::Method::POST, &url).form(&form)))
        .and_then(ok_or_error)?;
    log::info!("Dataset '{}' created", target.dataset);
    Ok(true)
}

/// Upload an N-Triples file into the dataset's default graph.
pub fn upload(target: &FusekiTarget, path: &Path) -> Result<u64, ServiceError> {
    let body = std::fs::read(path)?;
    let bytes = body.len() as u64;
    let url = target.endpoint(&format!("{}/data", target.dataset));
    SHARED_RUNTIME
        .handle()
        .block_on(send(
            target
                .request(reqwest::Method::POST, &url)
                .header(reqwest::header::CONTENT_TYPE, "application/n-triples")
                .timeout(UPLOAD_TIMEOUT)
                .body(body),
        ))
        .and_then(ok_or_error)?;
    Ok(bytes)
}

/// Parse the count out of a SPARQL JSON results document for
/// `SELECT (COUNT(*) AS ?count)`.
fn parse_count(json: &str) -> Option<usize> {
    let doc: serde_json::Value = serde_json::from_str(json).ok()?;
    doc.pointer("/results/bindings/0/count/value")?
        .as_str()?
        .parse()
        .ok()
}

pub fn triple_count(target: &FusekiTarget) -> Result<usize, ServiceError> {
    let query = "SELECT (COUNT(*) AS ?count) WHERE { ?s ?p ?o }";
    let body = SHARED_RUNTIME
        .handle()
        .block_on(send(
            target
                .request(reqwest::Method::GET, &target.sparql_endpoint())
                .query(&[("query", query)])
                .header(reqwest::header::ACCEPT, "application/sparql-results+json"),
        ))
        .and_then(ok_or_error)?;
    parse_count(&body).ok_or_else(|| ServiceError::Http {
        status: None,
        message: "unexpected SPARQL results document".into(),
    })
}

/// Wait for the server, ensure the dataset, upload `ntriples` and verify.
pub fn load(target: &FusekiTarget, ntriples: &Path) -> Result<LoadReport> {
    let start = Instant::now();
    wait_ready(target).with_context(|| format!("Fuseki at {} is not reachable", target.url))?;
    let created_dataset = ensure_dataset(target)
        .with_context(|| format!("Failed to create dataset '{}'", target.dataset))?;

    log::info!("Uploading {} ...", ntriples.display());
    let bytes = upload(target, ntriples)
        .with_context(|| format!("Failed to upload {}", ntriples.display()))?;
    let triples = triple_count(target).context("Failed to verify upload")?;

    let report = LoadReport {
        created_dataset,
        bytes,
        triples,
        elapsed: start.elapsed(),
    };
    log::info!(
        "Dataset '{}' holds {} triples ({:.1}s)",
        target.dataset,
        fmt_num(report.triples),
        report.elapsed.as_secs_f64()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(url: &str) -> FusekiTarget {
        FusekiTarget {
            url: url.into(),
            dataset: "pkg2020".into(),
            username: None,
            password: None,
            retry: RetryPolicy::fixed(1, Duration::ZERO),
        }
    }

    #[test]
    fn endpoints() {
        let t = target("http://localhost:3030/");
        assert_eq!(t.endpoint("$/ping"), "http://localhost:3030/$/ping");
        assert_eq!(t.sparql_endpoint(), "http://localhost:3030/pkg2020/sparql");
    }

    #[test]
    fn retryable_classification() {
        let http = |status| ServiceError::Http {
            status,
            message: "x".into(),
        };
        assert!(http(None).is_retryable());
        assert!(http(Some(503)).is_retryable());
        assert!(!http(Some(401)).is_retryable());
        assert!(!http(Some(404)).is_retryable());
        assert!(!ServiceError::Io(std::io::Error::other("disk")).is_retryable());
    }

    #[test]
    fn count_from_results_document() {
        let json = r#"{"head":{"vars":["count"]},"results":{"bindings":[{"count":{"type":"literal","datatype":"http://www.w3.org/2001/XMLSchema#integer","value":"1234"}}]}}"#;
        assert_eq!(parse_count(json), Some(1234));
        assert_eq!(parse_count(r#"{"results":{"bindings":[]}}"#), None);
        assert_eq!(parse_count("not json"), None);
    }

    #[test]
    fn upload_of_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = upload(&target("http://127.0.0.1:9"), &dir.path().join("absent.nt")).unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
    }

    #[test]
    fn unreachable_server_gives_up() {
        // Port 9 (discard) is closed on test machines
        let err = wait_ready(&target("http://127.0.0.1:9")).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    #[ignore] // requires a running Fuseki on localhost:3030
    fn load_into_local_fuseki() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.nt");
        std::fs::write(
            &path,
            "<http://example.org/pkg2020/ontology.owl#Article_1> <http://example.org/pkg2020/ontology.owl#hasPMID> \"1\" .\n",
        )
        .unwrap();
        let mut t = target("http://localhost:3030");
        t.username = Some("admin".into());
        t.password = std::env::var("FUSEKI_PASSWORD").ok();
        let report = load(&t, &path).unwrap();
        assert!(report.triples >= 1);
    }
}
