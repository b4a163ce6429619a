//! pkg2020 - PKG2020 knowledge-graph population pipeline
//!
//! Builds the PKG2020 ontology from its CSV extracts, classifies it, and
//! answers SPARQL queries over the result.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "pkg2020")]
#[command(about = "PKG2020 biomedical knowledge-graph population pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./pkg2020.toml or ~/.config/pkg2020/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Write the schema-only ontology
    Tbox(cmd::tbox::TboxArgs),
    /// Populate the graph from the CSV extracts
    Populate(cmd::populate::PopulateArgs),
    /// Run the staged pipeline from run.toml (cached per stage)
    Run(cmd::run::RunArgs),
    /// Check consistency and infer defined-class memberships
    Classify(cmd::classify::ClassifyArgs),
    /// Export a snapshot as N-Triples
    Export(cmd::export::ExportArgs),
    /// Run a competency question or SPARQL query
    Query(cmd::query::QueryArgs),
    /// Keyword search over names and identifiers
    Search(cmd::search::SearchArgs),
    /// Individual and property counts
    Stats(cmd::stats::StatsArgs),
    /// Load the graph into a Fuseki dataset
    Load(cmd::load::LoadArgs),
    /// Manage the snapshot store (cache)
    Store(cmd::store::StoreArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = pkg2020_core::ProgressContext::new();

    // TTY: quiet unless --debug, progress bars show activity.
    // non-TTY: info, logs are the only progress indicator.
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    pkg2020_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Tbox(args) => cmd::tbox::run(args, &config),
        Command::Populate(args) => cmd::populate::run(args, &config, &progress),
        Command::Run(args) => cmd::run::run(args, &config, &progress),
        Command::Classify(args) => cmd::classify::run(args, &config),
        Command::Export(args) => cmd::export::run(args, &config),
        Command::Query(args) => cmd::query::run(args, &config),
        Command::Search(args) => cmd::search::run(args, &config),
        Command::Stats(args) => cmd::stats::run(args, &config),
        Command::Load(args) => cmd::load::run(args, &config),
        Command::Store(args) => cmd::store::run(args),
        Command::Config => {
            let mut table = cmd::table(&["Setting", "Value"]);
            table.add_row(vec![
                "Data directory".to_string(),
                config.data.dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Bio-entity directory".to_string(),
                config.bio_dir().display().to_string(),
            ]);
            table.add_row(vec![
                "Output directory".to_string(),
                config.output.dir.display().to_string(),
            ]);
            let limits = &config.limits;
            for (label, limit) in [
                ("Limit: authors", limits.authors),
                ("Limit: affiliations", limits.affiliations),
                ("Limit: employment", limits.employment),
                ("Limit: education", limits.education),
                ("Limit: bio_entities", limits.bio_entities),
                ("Limit: bio_mutations", limits.bio_mutations),
                ("Limit: nih_projects", limits.nih_projects),
                ("Limit: links", limits.links),
            ] {
                table.add_row(vec![label.to_string(), pkg2020_core::fmt_num(limit)]);
            }
            table.add_row(vec![
                "Query timeout".to_string(),
                format!("{}s", config.query.timeout_secs),
            ]);
            table.add_row(vec![
                "Fuseki".to_string(),
                format!("{}/{}", config.fuseki.url, config.fuseki.dataset),
            ]);
            table.add_row(vec![
                "Fuseki retries".to_string(),
                format!(
                    "{} every {}s",
                    config.fuseki.max_retries, config.fuseki.retry_delay_secs
                ),
            ]);
            table.add_row(vec![
                "Fuseki credentials".to_string(),
                if config.fuseki.username.is_some() {
                    "configured"
                } else {
                    "not set"
                }
                .to_string(),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
