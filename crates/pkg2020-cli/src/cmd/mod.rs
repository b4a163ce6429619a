pub mod classify;
pub mod export;
pub mod load;
pub mod populate;
pub mod query;
pub mod run;
pub mod search;
pub mod stats;
pub mod store;
pub mod tbox;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use pkg2020_ontology::{Classification, Inferences, KnowledgeGraph, classify, snapshot};
use pkg2020_query::{GraphService, QueryTable};

use crate::config::Config;

pub const TBOX_FILE: &str = "pkg2020_tbox_only.owl";
pub const POPULATED_FILE: &str = "pkg2020_populated.owl";
pub const FINAL_FILE: &str = "pkg2020_final.owl";
pub const NTRIPLES_FILE: &str = "pkg2020_final.nt";

/// Table with the shared preset and cyan headers.
pub fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

/// Print a key-value summary table on stderr
pub fn print_summary(title: &str, rows: &[(&str, String)]) {
    let mut t = table(&[title, "Value"]);
    for (label, value) in rows {
        t.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{t}");
}

pub fn print_query_table(result: &QueryTable) {
    let columns: Vec<&str> = result.columns.iter().map(String::as_str).collect();
    let mut t = table(&columns);
    for row in &result.rows {
        t.add_row(row);
    }
    println!("{t}");
    eprintln!("{} rows", result.len());
}

pub fn load_snapshot(path: &Path) -> Result<KnowledgeGraph> {
    let graph = snapshot::load(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    log::info!("Loaded {} individuals from {}", graph.len(), path.display());
    Ok(graph)
}

/// Classify `graph`, failing with the violation list when it is inconsistent.
pub fn classify_or_bail(graph: &KnowledgeGraph) -> Result<Inferences> {
    match classify(graph) {
        Classification::Consistent(inferences) => Ok(inferences),
        Classification::Inconsistent(violations) => {
            log::error!("Graph is inconsistent ({} violations)", violations.len());
            for violation in &violations {
                log::error!("  {violation}");
            }
            anyhow::bail!("classification failed: graph is inconsistent")
        }
    }
}

/// The graph a read command works on: `--graph`, else the final snapshot in
/// the output directory, else the populated one.
pub fn resolve_graph(explicit: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    [FINAL_FILE, POPULATED_FILE]
        .iter()
        .map(|name| config.output.dir.join(name))
        .find(|path| path.is_file())
        .with_context(|| {
            format!(
                "no snapshot in {} (run `pkg2020 populate` or pass --graph)",
                config.output.dir.display()
            )
        })
}

pub fn open_service(explicit: Option<PathBuf>, config: &Config, timeout: Option<u64>) -> Result<GraphService> {
    let path = resolve_graph(explicit, config)?;
    let timeout = timeout.map_or_else(|| config.query_timeout(), std::time::Duration::from_secs);
    Ok(GraphService::open(&path).with_timeout(timeout))
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_graph_prefers_final_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.output.dir = dir.path().to_path_buf();

        assert!(resolve_graph(None, &config).is_err());

        std::fs::write(dir.path().join(POPULATED_FILE), "").unwrap();
        assert_eq!(
            resolve_graph(None, &config).unwrap(),
            dir.path().join(POPULATED_FILE)
        );

        std::fs::write(dir.path().join(FINAL_FILE), "").unwrap();
        assert_eq!(
            resolve_graph(None, &config).unwrap(),
            dir.path().join(FINAL_FILE)
        );

        let explicit = PathBuf::from("elsewhere.owl");
        assert_eq!(resolve_graph(Some(explicit.clone()), &config).unwrap(), explicit);
    }
}
