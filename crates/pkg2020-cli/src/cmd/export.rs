//! `pkg2020 export` - N-Triples export of a snapshot

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use pkg2020_core::fmt_num;
use pkg2020_ontology::write_ntriples;

use super::{NTRIPLES_FILE, classify_or_bail, ensure_parent, load_snapshot, resolve_graph};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Snapshot to export (default: final, else populated snapshot)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (default: <output.dir>/pkg2020_final.nt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export asserted facts only, without classifying
    #[arg(long)]
    pub asserted: bool,
}

pub fn run(args: ExportArgs, config: &Config) -> Result<()> {
    let input = resolve_graph(args.input, config)?;
    let output = args
        .output
        .unwrap_or_else(|| config.output.dir.join(NTRIPLES_FILE));
    let triples = export(&input, &output, !args.asserted)?;
    eprintln!("{} triples -> {}", fmt_num(triples), output.display());
    Ok(())
}

/// Write `input` as N-Triples to `output`, with inferred facts when `classify`.
pub fn export(input: &Path, output: &Path, classify: bool) -> Result<usize> {
    let graph = load_snapshot(input)?;
    let inferences = if classify {
        Some(classify_or_bail(&graph)?)
    } else {
        None
    };

    ensure_parent(output)?;
    let file = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut out = BufWriter::new(file);
    let triples = write_ntriples(&graph, inferences.as_ref(), &mut out)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    out.flush()?;
    log::info!("Exported {} triples to {}", fmt_num(triples), output.display());
    Ok(triples)
}
