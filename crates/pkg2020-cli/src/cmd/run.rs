//! `pkg2020 run` - staged pipeline from run.toml with snapshot caching

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use pkg2020_core::{ProgressContext, fmt_num};
use pkg2020_ontology::{KnowledgeGraph, snapshot};
use pkg2020_populate::{Dataset, StageSummary};
use pkg2020_store::{
    LookupResult, RunConfig, RunStage, SNAPSHOT_FILE, StageInput, StageManifest, StageName, Store,
    hash_file,
};

use super::{classify_or_bail, load_snapshot};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to run.toml
    pub run_config: PathBuf,

    /// Force re-run all stages (ignore cache)
    #[arg(long)]
    pub force: bool,

    /// Show stage status without executing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageStatus {
    Cached,
    Executed,
    /// Source CSV absent; the stage is left out of the run
    Missing,
    /// Input depends on an earlier stage that has not run yet
    Pending,
    NeedsRun,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cached => write!(f, "CACHED"),
            Self::Executed => write!(f, "EXECUTED"),
            Self::Missing => write!(f, "MISSING"),
            Self::Pending => write!(f, "PENDING"),
            Self::NeedsRun => write!(f, "NEEDS_RUN"),
        }
    }
}

/// One row of the plan / run report.
struct StagePlan {
    name: StageName,
    input: Option<StageInput>,
    manifest: Option<StageManifest>,
    status: StageStatus,
}

impl StagePlan {
    fn short_hash(&self) -> String {
        self.input
            .as_ref()
            .map_or_else(|| "-".to_string(), StageInput::short_hash)
    }

    fn content(&self) -> &str {
        self.manifest
            .as_ref()
            .map_or("-", |m| &m.content_hash[..8.min(m.content_hash.len())])
    }
}

/// Graph held in memory between executed stages. After a cache hit only the
/// snapshot path is known; it is read when a later stage has to run.
#[derive(Default)]
struct Working {
    graph: Option<KnowledgeGraph>,
    snapshot: Option<PathBuf>,
}

impl Working {
    fn cached(&mut self, snapshot: PathBuf) {
        self.graph = None;
        self.snapshot = Some(snapshot);
    }

    fn graph(&mut self) -> Result<&mut KnowledgeGraph> {
        if self.graph.is_none() {
            if let Some(path) = self.snapshot.take() {
                self.graph = Some(load_snapshot(&path)?);
            }
        }
        Ok(self.graph.get_or_insert_with(KnowledgeGraph::new))
    }
}

pub fn run(args: RunArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    let run_config = RunConfig::from_file(&args.run_config)
        .with_context(|| format!("failed to load {}", args.run_config.display()))?;
    run_config.validate()?;

    let plans = execute(&run_config, config, &args, progress)?;
    if args.dry_run {
        print_plan("=== Pipeline Plan ===", &plans);
        println!("(dry-run mode, no execution)");
    }
    Ok(())
}

/// Population settings of a run: run.toml paths, [limits] from the global
/// config, then per-stage overrides.
fn populate_config(run_config: &RunConfig, config: &Config) -> pkg2020_populate::Config {
    let mut populate = pkg2020_populate::Config {
        data_dir: run_config.data_dir.clone(),
        bio_dir: run_config
            .bio_dir
            .clone()
            .unwrap_or_else(|| run_config.data_dir.clone()),
        limits: config.limits.clone(),
        ..Default::default()
    };
    for stage in run_config.active_stages() {
        let (Some(dataset), Some(cfg)) = (dataset_of(stage), run_config.stage_config(stage)) else {
            continue;
        };
        if let Some(limit) = cfg.limit {
            populate.limits.set(dataset, limit);
        }
        if let Some(file) = &cfg.file {
            populate.files.insert(dataset, file.clone());
        }
    }
    populate
}

fn dataset_of(stage: StageName) -> Option<Dataset> {
    if !stage.is_populate() {
        return None;
    }
    stage.dir_name().parse().ok()
}

fn execute(
    run_config: &RunConfig,
    config: &Config,
    args: &RunArgs,
    progress: &ProgressContext,
) -> Result<Vec<StagePlan>> {
    let store = Store::new(&run_config.output)?;
    store.cleanup_tmp()?;
    let populate = populate_config(run_config, config);

    let mut plans: Vec<StagePlan> = Vec::new();
    let mut working = Working::default();
    let mut parent: Option<String> = None;
    let mut blocked = false;

    for stage in run_config.active_stages() {
        if blocked {
            plans.push(StagePlan {
                name: stage,
                input: None,
                manifest: None,
                status: StageStatus::Pending,
            });
            continue;
        }

        let input = match dataset_of(stage) {
            Some(dataset) => {
                let source_hash = match populate.source_path(dataset) {
                    Some(path) if !path.is_file() => {
                        log::warn!("{stage}: source file not found: {}, stage skipped", path.display());
                        plans.push(StagePlan {
                            name: stage,
                            input: None,
                            manifest: None,
                            status: StageStatus::Missing,
                        });
                        continue;
                    }
                    Some(path) => Some(
                        hash_file(&path)
                            .with_context(|| format!("failed to hash {}", path.display()))?
                            .to_hex()
                            .to_string(),
                    ),
                    None => None,
                };
                run_config.populate_input(
                    stage,
                    populate.limits.for_dataset(dataset),
                    source_hash,
                    parent.as_deref(),
                )
            }
            None => {
                let parent = parent
                    .as_deref()
                    .context("classify stage has no populated snapshot to classify")?;
                run_config.classify_input(parent)
            }
        }
        .with_context(|| format!("{stage} is not configured"))?;

        let cached = if args.force {
            None
        } else {
            match store.lookup(&input) {
                LookupResult::Cached { manifest, .. } => Some(manifest),
                LookupResult::NeedsRun => None,
            }
        };

        if let Some(manifest) = cached {
            log::info!("{stage}: cached ({})", input.short_hash());
            parent = Some(manifest.content_hash.clone());
            working.cached(store.snapshot_path(&input));
            plans.push(StagePlan {
                name: stage,
                input: Some(input),
                manifest: Some(manifest),
                status: StageStatus::Cached,
            });
            continue;
        }

        if args.dry_run {
            plans.push(StagePlan {
                name: stage,
                input: Some(input),
                manifest: None,
                status: StageStatus::NeedsRun,
            });
            blocked = true;
            continue;
        }

        log::info!("{stage}: executing...");
        let tmp_dir = store.stage_tmp_dir(&input);
        if tmp_dir.exists() {
            std::fs::remove_dir_all(&tmp_dir)?;
        }
        std::fs::create_dir_all(&tmp_dir)?;

        let graph = working.graph()?;
        let stats = match dataset_of(stage) {
            Some(dataset) => run_populate(graph, dataset, &populate, progress, &tmp_dir)?,
            None => run_classify(graph, &tmp_dir)?,
        };

        let manifest = store.commit_stage(&input, &tmp_dir, stats)?;
        log::info!(
            "{stage}: committed (content_hash: {})",
            &manifest.content_hash[..8]
        );
        parent = Some(manifest.content_hash.clone());
        plans.push(StagePlan {
            name: stage,
            input: Some(input),
            manifest: Some(manifest),
            status: StageStatus::Executed,
        });
    }

    if args.dry_run {
        return Ok(plans);
    }

    let stages: Vec<RunStage<'_>> = plans
        .iter()
        .filter_map(|plan| {
            Some(RunStage {
                input: plan.input.as_ref()?,
                manifest: plan.manifest.as_ref()?,
                cached: plan.status == StageStatus::Cached,
            })
        })
        .collect();
    if stages.is_empty() {
        anyhow::bail!("no stage produced a snapshot (all sources missing?)");
    }
    let run_dir = store.create_run(&stages)?;

    println!();
    print_plan("=== Run Complete ===", &plans);
    println!("Run: {}", run_dir.display());
    if let Some(last) = stages.last() {
        println!(
            "Snapshot: {}",
            run_dir.join(last.input.stage.dir_name()).join(SNAPSHOT_FILE).display()
        );
    }
    Ok(plans)
}

fn run_populate(
    graph: &mut KnowledgeGraph,
    dataset: Dataset,
    populate: &pkg2020_populate::Config,
    progress: &ProgressContext,
    tmp_dir: &Path,
) -> Result<BTreeMap<String, usize>> {
    let summary = pkg2020_populate::run_stage(graph, dataset, populate, progress)
        .with_context(|| format!("Stage {dataset} failed"))?;
    save(graph, None, tmp_dir)?;
    Ok(populate_stats(&summary, graph.len()))
}

fn populate_stats(summary: &StageSummary, individuals: usize) -> BTreeMap<String, usize> {
    BTreeMap::from([
        ("rows".to_string(), summary.rows_read),
        ("skipped".to_string(), summary.rows_skipped()),
        ("created".to_string(), summary.created_total()),
        ("reused".to_string(), summary.reused),
        ("conflicts".to_string(), summary.conflicts),
        ("individuals".to_string(), individuals),
    ])
}

fn run_classify(graph: &KnowledgeGraph, tmp_dir: &Path) -> Result<BTreeMap<String, usize>> {
    let inferences = classify_or_bail(graph)?;
    log::info!(
        "classify: {} inferred facts over {} individuals",
        fmt_num(inferences.total()),
        fmt_num(graph.len())
    );
    save(graph, Some(&inferences), tmp_dir)?;
    Ok(BTreeMap::from([
        ("inferred".to_string(), inferences.total()),
        ("individuals".to_string(), graph.len()),
    ]))
}

fn save(
    graph: &KnowledgeGraph,
    inferences: Option<&pkg2020_ontology::Inferences>,
    dir: &Path,
) -> Result<()> {
    let path = dir.join(SNAPSHOT_FILE);
    snapshot::save(graph, inferences, &path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn print_plan(title: &str, plans: &[StagePlan]) {
    println!("{title}");
    println!("{:<16} {:<10} {:<10} Status", "Stage", "Hash", "Content");
    println!("{}", "-".repeat(50));
    for plan in plans {
        println!(
            "{:<16} {:<10} {:<10} {}",
            plan.name.to_string(),
            plan.short_hash(),
            plan.content(),
            plan.status
        );
    }
    println!();
}
