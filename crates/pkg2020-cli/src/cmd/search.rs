//! `pkg2020 search` - keyword search over labels

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Args;
use pkg2020_ontology::Class;

use super::{open_service, print_query_table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Case-insensitive keyword
    pub keyword: String,

    /// Restrict to one class (Author, Article, Gene, ...)
    #[arg(short, long)]
    pub class: Option<String>,

    /// Maximum rows
    #[arg(short = 'l', long, default_value_t = 50)]
    pub limit: usize,

    /// Snapshot to search (default: final, else populated snapshot)
    #[arg(short, long)]
    pub graph: Option<PathBuf>,
}

pub fn run(args: SearchArgs, config: &Config) -> Result<()> {
    let class = args
        .class
        .as_deref()
        .map(|name| Class::from_local_name(name).ok_or_else(|| anyhow!("unknown class '{name}'")))
        .transpose()?;
    let service = open_service(args.graph, config, None)?;
    let result = pkg2020_query::search::search(&service, &args.keyword, class, args.limit)?;
    print_query_table(&result);
    Ok(())
}
