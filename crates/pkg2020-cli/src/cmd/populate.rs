//! `pkg2020 populate` - build the A-Box from the CSV extracts

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pkg2020_core::{ProgressContext, fmt_num};
use pkg2020_ontology::{KnowledgeGraph, snapshot};
use pkg2020_populate::Dataset;

use super::{POPULATED_FILE, ensure_parent, load_snapshot, table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PopulateArgs {
    /// Stages to run, in order (default: every CSV-backed stage)
    #[arg(short, long, value_delimiter = ',')]
    pub stages: Vec<Dataset>,

    /// Snapshot to extend instead of starting from an empty graph
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output snapshot (default: <output.dir>/pkg2020_populated.owl)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum rows per stage (overrides [limits])
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Directory holding the CSV extracts (overrides [data] dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

pub fn run(args: PopulateArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let mut populate = config.populate_config(args.limit);
    if let Some(dir) = args.data_dir {
        if config.data.bio_dir.is_none() {
            populate.bio_dir = dir.clone();
        }
        populate.data_dir = dir;
    }
    let stages = if args.stages.is_empty() {
        Dataset::SOURCED.to_vec()
    } else {
        args.stages
    };
    let output = args
        .output
        .unwrap_or_else(|| config.output.dir.join(POPULATED_FILE));

    let mut graph = match &args.input {
        Some(path) => load_snapshot(path)?,
        None => KnowledgeGraph::new(),
    };

    let summary = pkg2020_populate::run(&mut graph, &stages, &populate, progress)?;

    ensure_parent(&output)?;
    snapshot::save(&graph, None, &output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    log::info!("Saved {}", output.display());

    let mut t = table(&["Stage", "Rows", "Skipped", "Created", "Reused", "Conflicts", "Time"]);
    for stage in &summary.stages {
        t.add_row(vec![
            stage.dataset.to_string(),
            fmt_num(stage.rows_read),
            fmt_num(stage.rows_skipped()),
            fmt_num(stage.created_total()),
            fmt_num(stage.reused),
            fmt_num(stage.conflicts),
            format!("{:.1}s", stage.elapsed.as_secs_f64()),
        ]);
    }
    for dataset in &summary.missing {
        t.add_row(vec![
            dataset.to_string(),
            "missing source".to_string(),
        ]);
    }
    eprintln!("\n{t}");
    eprintln!(
        "{} individuals -> {}",
        fmt_num(summary.individuals),
        output.display()
    );
    Ok(())
}
