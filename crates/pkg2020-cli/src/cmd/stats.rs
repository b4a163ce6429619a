//! `pkg2020 stats` - individual and property counts

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use pkg2020_core::fmt_num;

use super::{open_service, table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Snapshot to inspect (default: final, else populated snapshot)
    #[arg(short, long)]
    pub graph: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs, config: &Config) -> Result<()> {
    let service = open_service(args.graph, config, None)?;
    let stats = pkg2020_query::stats::collect(&service)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let mut classes = table(&["Class", "Individuals"]);
    for (class, count) in &stats.classes {
        classes.add_row(vec![Cell::new(class), Cell::new(fmt_num(*count))]);
    }
    let mut properties = table(&["Property", "Assertions"]);
    for (property, count) in &stats.properties {
        properties.add_row(vec![Cell::new(property), Cell::new(fmt_num(*count))]);
    }
    println!("{classes}");
    println!("{properties}");
    eprintln!("{} triples", fmt_num(stats.triples));
    Ok(())
}
