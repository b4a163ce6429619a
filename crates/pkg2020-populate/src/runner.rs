//! Stage runner for the population pipeline

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pkg2020_core::{ProgressContext, fmt_num};
use pkg2020_ontology::{Class, KnowledgeGraph, Session};

use crate::config::Config;
use crate::dataset::Dataset;
use crate::source::SourceError;
use crate::stages::{
    StageInput, StageOutput, affiliations, authors, bioentities, education, employment,
    hand_annotated, links, nih_projects,
};

/// Outcome of one committed stage
#[derive(Debug, Clone)]
pub struct StageSummary {
    pub dataset: Dataset,
    pub rows_read: usize,
    pub rows_applied: usize,
    pub skipped: BTreeMap<&'static str, usize>,
    pub created: BTreeMap<Class, usize>,
    pub reused: usize,
    pub conflicts: usize,
    pub elapsed: Duration,
}

impl StageSummary {
    pub fn rows_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn created_total(&self) -> usize {
        self.created.values().sum()
    }

    pub fn created_of(&self, class: Class) -> usize {
        self.created.get(&class).copied().unwrap_or(0)
    }
}

/// Population run summary
#[derive(Debug)]
pub struct Summary {
    pub stages: Vec<StageSummary>,
    /// Stages whose source file was absent
    pub missing: Vec<Dataset>,
    pub individuals: usize,
    pub elapsed: Duration,
}

fn read_csv(session: &mut Session<'_>, input: &StageInput<'_>) -> Result<StageOutput, SourceError> {
    match input.dataset {
        Dataset::AuthorsArticles => authors::populate(session, input),
        Dataset::Affiliations => affiliations::populate(session, input),
        Dataset::Employment => employment::populate(session, input),
        Dataset::Education => education::populate(session, input),
        Dataset::BioEntities => bioentities::populate_main(session, input),
        Dataset::BioMutations => bioentities::populate_mutations(session, input),
        Dataset::NihProjects => nih_projects::populate(session, input),
        Dataset::HandAnnotated | Dataset::Links => Ok(StageOutput::default()),
    }
}

/// Run one stage as a single batch.
///
/// The stage's changes are committed only when it finishes; on a
/// [`SourceError`] the batch is discarded and `graph` is unchanged.
pub fn run_stage(
    graph: &mut KnowledgeGraph,
    dataset: Dataset,
    config: &Config,
    progress: &ProgressContext,
) -> Result<StageSummary, SourceError> {
    let start = Instant::now();
    let limit = config.limits.for_dataset(dataset);
    let mut session = graph.begin(dataset.as_str());

    let output = match dataset {
        Dataset::HandAnnotated => hand_annotated::populate(&mut session),
        Dataset::Links => links::populate(&mut session, limit.unwrap_or(0)),
        _ => {
            let path = config.source_path(dataset).unwrap_or_default();
            let bar = progress.rows_bar(dataset.as_str(), limit.unwrap_or(0) as u64);
            let input = StageInput {
                dataset,
                path: &path,
                limit,
                bar: &bar,
            };
            let result = read_csv(&mut session, &input);
            bar.finish_and_clear();
            result?
        }
    };

    let report = session.commit();
    let summary = StageSummary {
        dataset,
        rows_read: output.tally.read,
        rows_applied: output.tally.applied,
        skipped: output.tally.skipped,
        created: report.created,
        reused: output.reused,
        conflicts: report.conflicts,
        elapsed: start.elapsed(),
    };

    log::info!(
        "{dataset}: {} rows, {} created, {} reused, {} skipped ({:.1}s)",
        fmt_num(summary.rows_read),
        fmt_num(summary.created_total()),
        fmt_num(summary.reused),
        fmt_num(summary.rows_skipped()),
        summary.elapsed.as_secs_f64()
    );
    for (reason, count) in &summary.skipped {
        log::debug!("{dataset}: skipped {} rows ({reason})", fmt_num(*count));
    }
    if summary.conflicts > 0 {
        log::warn!(
            "{dataset}: {} functional property conflicts recorded",
            summary.conflicts
        );
    }
    Ok(summary)
}

/// Run `datasets` in order against `graph`.
///
/// A missing source aborts only its own stage; any other source failure
/// aborts the run.
pub fn run(
    graph: &mut KnowledgeGraph,
    datasets: &[Dataset],
    config: &Config,
    progress: &ProgressContext,
) -> Result<Summary> {
    let start = Instant::now();
    let mut stages = Vec::with_capacity(datasets.len());
    let mut missing = Vec::new();

    for &dataset in datasets {
        match run_stage(graph, dataset, config, progress) {
            Ok(summary) => stages.push(summary),
            Err(e) if e.is_missing() => {
                log::warn!("{e}, stage skipped");
                missing.push(dataset);
            }
            Err(e) => return Err(e).with_context(|| format!("Stage {dataset} failed")),
        }
    }

    let summary = Summary {
        stages,
        missing,
        individuals: graph.len(),
        elapsed: start.elapsed(),
    };

    let rows: usize = summary.stages.iter().map(|s| s.rows_read).sum();
    let skipped: usize = summary.stages.iter().map(StageSummary::rows_skipped).sum();
    let created: usize = summary.stages.iter().map(StageSummary::created_total).sum();

    log::info!("=== Population Summary ===");
    log::info!(
        "Stages: {}/{} completed ({} missing source)",
        summary.stages.len(),
        datasets.len(),
        summary.missing.len()
    );
    log::info!("Rows: {} read, {} skipped", fmt_num(rows), fmt_num(skipped));
    log::info!(
        "Individuals: {} created, {} total",
        fmt_num(created),
        fmt_num(summary.individuals)
    );
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}
