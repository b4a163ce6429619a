//! In-memory SPARQL store over a populated graph
//!
//! The store is loaded on first use and at most once per [`GraphService`];
//! concurrent first queries wait on the same mutex and share one load.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use oxigraph::io::RdfFormat;
use oxigraph::sparql::{Query, QueryResults};
use oxigraph::store::Store;
use pkg2020_core::fmt_num;
use pkg2020_ontology::{Classification, Inferences, KnowledgeGraph, classify, snapshot, write_ntriples};

use crate::error::QueryError;
use crate::table::{QueryTable, compact_iri, render_term};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a graph file is read, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    /// RDF/XML snapshot written by this toolchain (`.owl`, `.rdf`, `.xml`);
    /// classified on load so derived memberships are queryable
    Snapshot,
    NTriples,
    Turtle,
}

impl GraphFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "owl" | "rdf" | "xml" => Some(Self::Snapshot),
            "nt" => Some(Self::NTriples),
            "ttl" => Some(Self::Turtle),
            _ => None,
        }
    }
}

pub struct GraphService {
    source: Option<PathBuf>,
    store: Mutex<Option<Store>>,
    timeout: Duration,
}

impl GraphService {
    /// Service over a graph file. Nothing is read until the first query.
    pub fn open(path: &Path) -> Self {
        Self {
            source: Some(path.to_path_buf()),
            store: Mutex::new(None),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Service over an in-memory graph, loaded immediately.
    pub fn from_graph(
        graph: &KnowledgeGraph,
        inferences: Option<&Inferences>,
    ) -> Result<Self, QueryError> {
        let store = new_store()?;
        load_graph(&store, graph, inferences, None)?;
        Ok(Self {
            source: None,
            store: Mutex::new(Some(store)),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_loaded(&self) -> bool {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Handle to the loaded store, loading it first if needed.
    fn store(&self) -> Result<Store, QueryError> {
        let mut slot = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = slot.as_ref() {
            return Ok(store.clone());
        }
        let path = self
            .source
            .as_deref()
            .ok_or_else(|| QueryError::load(None, "no graph source"))?;
        let store = load_file(path)?;
        *slot = Some(store.clone());
        Ok(store)
    }

    pub fn triple_count(&self) -> Result<usize, QueryError> {
        self.store()?
            .len()
            .map_err(|e| QueryError::Evaluation(e.to_string()))
    }

    /// Evaluate a SPARQL query within the service's timeout.
    ///
    /// On timeout the evaluation thread is told to stop and its partial
    /// result is discarded.
    pub fn query(&self, sparql: &str) -> Result<QueryTable, QueryError> {
        let query = Query::parse(sparql, None).map_err(|e| QueryError::Syntax(e.to_string()))?;
        let store = self.store()?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let flag = Arc::clone(&cancelled);
        std::thread::spawn(move || {
            let _ = tx.send(evaluate(&store, query, &flag));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::Relaxed);
                Err(QueryError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(QueryError::Evaluation("query worker exited".into()))
            }
        }
    }
}

fn new_store() -> Result<Store, QueryError> {
    Store::new().map_err(|e| QueryError::load(None, e))
}

fn load_graph(
    store: &Store,
    graph: &KnowledgeGraph,
    inferences: Option<&Inferences>,
    path: Option<&Path>,
) -> Result<(), QueryError> {
    let mut buf = Vec::new();
    let triples =
        write_ntriples(graph, inferences, &mut buf).map_err(|e| QueryError::load(path, e))?;
    store
        .load_from_reader(RdfFormat::NTriples, buf.as_slice())
        .map_err(|e| QueryError::load(path, e))?;
    log::debug!("loaded {} triples into SPARQL store", fmt_num(triples));
    Ok(())
}

fn load_file(path: &Path) -> Result<Store, QueryError> {
    let format = GraphFormat::from_path(path)
        .ok_or_else(|| QueryError::load(Some(path), "unsupported graph file extension"))?;
    let start = Instant::now();
    log::info!("Loading graph from {} ...", path.display());

    let store = new_store()?;
    match format {
        GraphFormat::Snapshot => {
            let graph = snapshot::load(path).map_err(|e| QueryError::load(Some(path), e))?;
            match classify(&graph) {
                Classification::Consistent(inferences) => {
                    load_graph(&store, &graph, Some(&inferences), Some(path))?
                }
                Classification::Inconsistent(violations) => {
                    log::warn!(
                        "{} is inconsistent ({} violations), serving asserted facts only",
                        path.display(),
                        violations.len()
                    );
                    load_graph(&store, &graph, None, Some(path))?
                }
            }
        }
        GraphFormat::NTriples | GraphFormat::Turtle => {
            let rdf_format = if format == GraphFormat::NTriples {
                RdfFormat::NTriples
            } else {
                RdfFormat::Turtle
            };
            let file = std::fs::File::open(path).map_err(|e| QueryError::load(Some(path), e))?;
            store
                .load_from_reader(rdf_format, std::io::BufReader::new(file))
                .map_err(|e| QueryError::load(Some(path), e))?;
        }
    }

    let triples = store.len().map_err(|e| QueryError::load(Some(path), e))?;
    log::info!(
        "Loaded {} triples in {:.1}s",
        fmt_num(triples),
        start.elapsed().as_secs_f64()
    );
    Ok(store)
}

/// Collect all results, stopping early once `cancelled` is set.
fn evaluate(
    store: &Store,
    query: Query,
    cancelled: &AtomicBool,
) -> Result<QueryTable, QueryError> {
    let eval = |e: oxigraph::sparql::EvaluationError| QueryError::Evaluation(e.to_string());
    let check = || {
        if cancelled.load(Ordering::Relaxed) {
            Err(QueryError::Evaluation("cancelled".into()))
        } else {
            Ok(())
        }
    };

    match store.query(query).map_err(eval)? {
        QueryResults::Solutions(solutions) => {
            let variables = solutions.variables().to_vec();
            let columns = variables.iter().map(|v| v.as_str().to_string()).collect();
            let mut rows = Vec::new();
            for solution in solutions {
                check()?;
                let solution = solution.map_err(eval)?;
                rows.push(
                    variables
                        .iter()
                        .map(|v| solution.get(v).map(render_term).unwrap_or_default())
                        .collect(),
                );
            }
            Ok(QueryTable { columns, rows })
        }
        QueryResults::Boolean(value) => Ok(QueryTable {
            columns: vec!["result".into()],
            rows: vec![vec![value.to_string()]],
        }),
        QueryResults::Graph(triples) => {
            let mut rows = Vec::new();
            for triple in triples {
                check()?;
                let triple = triple.map_err(eval)?;
                let subject = triple.subject.to_string();
                rows.push(vec![
                    subject
                        .strip_prefix('<')
                        .and_then(|s| s.strip_suffix('>'))
                        .map_or(subject.clone(), compact_iri),
                    compact_iri(triple.predicate.as_str()),
                    render_term(&triple.object),
                ]);
            }
            Ok(QueryTable {
                columns: vec!["subject".into(), "predicate".into(), "object".into()],
                rows,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg2020_ontology::{Article, Author};

    fn small_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph.get_or_create::<Author>("Author_1");
        let (article, _) = graph.get_or_create::<Article>("Article_1");
        article.pmid = Some("1".into());
        article.authors = vec!["Author_1".into()];
        graph
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(GraphFormat::from_path(Path::new("a.owl")), Some(GraphFormat::Snapshot));
        assert_eq!(GraphFormat::from_path(Path::new("a.NT")), Some(GraphFormat::NTriples));
        assert_eq!(GraphFormat::from_path(Path::new("a.ttl")), Some(GraphFormat::Turtle));
        assert_eq!(GraphFormat::from_path(Path::new("a.csv")), None);
        assert_eq!(GraphFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn select_over_in_memory_graph() {
        let service = GraphService::from_graph(&small_graph(), None).unwrap();
        assert!(service.is_loaded());
        let table = service
            .query(&format!(
                "SELECT ?a ?au WHERE {{ ?a <{ns}writtenBy> ?au }}",
                ns = pkg2020_ontology::schema::NS
            ))
            .unwrap();
        assert_eq!(table.columns, vec!["a", "au"]);
        assert_eq!(table.rows, vec![vec!["Article_1".to_string(), "Author_1".to_string()]]);
    }

    #[test]
    fn ask_and_construct() {
        let service = GraphService::from_graph(&small_graph(), None).unwrap();
        let ask = service.query("ASK { ?s ?p ?o }").unwrap();
        assert_eq!(ask.get(0, "result"), Some("true"));

        let construct = service
            .query(&format!(
                "CONSTRUCT {{ ?a <{ns}writtenBy> ?b }} WHERE {{ ?a <{ns}writtenBy> ?b }}",
                ns = pkg2020_ontology::schema::NS
            ))
            .unwrap();
        assert_eq!(construct.len(), 1);
        assert_eq!(construct.get(0, "predicate"), Some("writtenBy"));
    }

    #[test]
    fn runaway_query_times_out_and_service_stays_usable() {
        let mut graph = KnowledgeGraph::new();
        for i in 0..50 {
            let (author, _) = graph.get_or_create::<Author>(&format!("Author_{i}"));
            author.last_name = Some(format!("Name{i}"));
        }
        let service = GraphService::from_graph(&graph, None)
            .unwrap()
            .with_timeout(Duration::from_millis(1));

        let err = service
            .query("SELECT * WHERE { ?a ?b ?c . ?d ?e ?f . ?g ?h ?i . ?j ?k ?l }")
            .unwrap_err();
        assert!(matches!(err, QueryError::Timeout(limit) if limit == Duration::from_millis(1)));

        let service = service.with_timeout(DEFAULT_TIMEOUT);
        let ask = service.query("ASK { ?s ?p ?o }").unwrap();
        assert_eq!(ask.get(0, "result"), Some("true"));
    }

    #[test]
    fn cancelled_evaluation_stops() {
        let store = new_store().unwrap();
        load_graph(&store, &small_graph(), None, None).unwrap();
        let query = Query::parse("SELECT * WHERE { ?s ?p ?o }", None).unwrap();
        let result = evaluate(&store, query, &AtomicBool::new(true));
        assert!(matches!(result, Err(QueryError::Evaluation(msg)) if msg == "cancelled"));
    }

    #[test]
    fn syntax_error_is_distinct() {
        let service = GraphService::from_graph(&small_graph(), None).unwrap();
        assert!(matches!(
            service.query("SELEKT * WHERE {}"),
            Err(QueryError::Syntax(_))
        ));
    }

    #[test]
    fn file_is_loaded_lazily_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.owl");
        snapshot::save(&small_graph(), None, &path).unwrap();

        let service = GraphService::open(&path);
        assert!(!service.is_loaded());
        let first = service.triple_count().unwrap();
        assert!(service.is_loaded());

        // A second read must come from memory, not the (now missing) file
        std::fs::remove_file(&path).unwrap();
        assert_eq!(service.triple_count().unwrap(), first);
    }

    #[test]
    fn ntriples_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.nt");
        std::fs::write(
            &path,
            "<http://example.org/a> <http://example.org/p> \"x\" .\n",
        )
        .unwrap();
        let service = GraphService::open(&path);
        assert_eq!(service.triple_count().unwrap(), 1);
    }

    #[test]
    fn unreadable_source_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = GraphService::open(&dir.path().join("absent.owl"));
        assert!(matches!(missing.triple_count(), Err(QueryError::Load { .. })));
        let unknown = GraphService::open(&dir.path().join("graph.json"));
        assert!(matches!(unknown.query("ASK {}"), Err(QueryError::Load { .. })));
    }
}
