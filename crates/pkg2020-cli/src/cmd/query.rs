//! `pkg2020 query` - competency questions and ad-hoc SPARQL

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::Cell;
use pkg2020_query::{CATALOG, GraphService, QueryTable, competency};

use super::{open_service, print_query_table, table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Competency question key (CQ7, 7), @file.rq, or a SPARQL query
    #[arg(required_unless_present_any = ["list", "all"])]
    pub query: Option<String>,

    /// List the competency questions
    #[arg(long)]
    pub list: bool,

    /// Run every competency question
    #[arg(long, conflicts_with = "query")]
    pub all: bool,

    /// Snapshot to query (default: final, else populated snapshot)
    #[arg(short, long)]
    pub graph: Option<PathBuf>,

    /// Query timeout in seconds (overrides [query] timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

pub fn run(args: QueryArgs, config: &Config) -> Result<()> {
    if args.list {
        let mut t = table(&["Key", "Question"]);
        for cq in &CATALOG {
            t.add_row(vec![Cell::new(cq.key), Cell::new(cq.question)]);
        }
        println!("{t}");
        return Ok(());
    }

    let service = open_service(args.graph, config, args.timeout)?;

    if args.all {
        let mut failed = 0;
        for cq in &CATALOG {
            eprintln!("\n{}: {}", cq.key, cq.question);
            match competency::run(&service, cq) {
                Ok(result) => emit(&result, args.format)?,
                Err(e) => {
                    log::error!("{}: {e}", cq.key);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            anyhow::bail!("{failed}/{} competency questions failed", CATALOG.len());
        }
        return Ok(());
    }

    let query = args.query.unwrap_or_default();
    let result = execute(&service, &query)?;
    emit(&result, args.format)
}

/// Resolve `query` to SPARQL and evaluate it.
fn execute(service: &GraphService, query: &str) -> Result<QueryTable> {
    if let Some(cq) = competency::find(query) {
        eprintln!("{}: {}", cq.key, cq.question);
        return competency::run(service, cq).with_context(|| format!("{} failed", cq.key));
    }
    let sparql = match query.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file {path}"))?,
        None => query.to_string(),
    };
    Ok(service.query(&sparql)?)
}

fn emit(result: &QueryTable, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_query_table(result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}
