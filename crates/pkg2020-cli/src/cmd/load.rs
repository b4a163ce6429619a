//! `pkg2020 load` - push the graph into a Fuseki dataset

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pkg2020_core::fmt_num;
use pkg2020_query::GraphFormat;

use super::{NTRIPLES_FILE, export::export, print_summary, resolve_graph};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// N-Triples file or snapshot (snapshots are exported first)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Fuseki server URL (overrides [fuseki] url)
    #[arg(long)]
    pub url: Option<String>,

    /// Dataset name (overrides [fuseki] dataset)
    #[arg(long)]
    pub dataset: Option<String>,
}

pub fn run(args: LoadArgs, config: &Config) -> Result<()> {
    let mut target = config.fuseki.target();
    if let Some(url) = args.url {
        target.url = url;
    }
    if let Some(dataset) = args.dataset {
        target.dataset = dataset;
    }

    let input = resolve_graph(args.input, config)?;
    let ntriples = match GraphFormat::from_path(&input) {
        Some(GraphFormat::NTriples) => input,
        Some(GraphFormat::Snapshot) => {
            let path = config.output.dir.join(NTRIPLES_FILE);
            export(&input, &path, true)?;
            path
        }
        _ => anyhow::bail!(
            "cannot load {}: expected an N-Triples file or a snapshot",
            input.display()
        ),
    };

    let report = pkg2020_query::fuseki::load(&target, &ntriples)?;
    print_summary(
        "Fuseki load",
        &[
            ("Endpoint", target.sparql_endpoint()),
            (
                "Dataset",
                if report.created_dataset {
                    format!("{} (created)", target.dataset)
                } else {
                    target.dataset.clone()
                },
            ),
            ("Uploaded", format!("{} bytes", fmt_num(report.bytes as usize))),
            ("Triples", fmt_num(report.triples)),
            ("Time", format!("{:.1}s", report.elapsed.as_secs_f64())),
        ],
    );
    Ok(())
}
