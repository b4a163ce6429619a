//! `pkg2020 classify` - consistency check and defined-class inference

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;
use pkg2020_core::fmt_num;
use pkg2020_ontology::snapshot;

use super::{FINAL_FILE, POPULATED_FILE, classify_or_bail, ensure_parent, load_snapshot, table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Populated snapshot (default: <output.dir>/pkg2020_populated.owl)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Classified snapshot (default: <output.dir>/pkg2020_final.owl)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only check consistency, write nothing
    #[arg(long)]
    pub check: bool,
}

pub fn run(args: ClassifyArgs, config: &Config) -> Result<()> {
    let input = args
        .input
        .unwrap_or_else(|| config.output.dir.join(POPULATED_FILE));
    let graph = load_snapshot(&input)?;

    let start = Instant::now();
    let inferences = classify_or_bail(&graph)?;
    log::info!(
        "Classified {} individuals in {:.1}s",
        fmt_num(graph.len()),
        start.elapsed().as_secs_f64()
    );

    let mut t = table(&["Defined class", "Members"]);
    for (class, count) in inferences.class_counts() {
        t.add_row(vec![Cell::new(class.local_name()), Cell::new(fmt_num(count))]);
    }
    eprintln!("\n{t}");

    if args.check {
        eprintln!("Consistent.");
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| config.output.dir.join(FINAL_FILE));
    ensure_parent(&output)?;
    snapshot::save(&graph, Some(&inferences), &output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    eprintln!(
        "{} inferred facts -> {}",
        fmt_num(inferences.total()),
        output.display()
    );
    Ok(())
}
