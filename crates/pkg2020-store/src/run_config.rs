//! RunConfig: parse run.toml and generate stage inputs
//!
//! ```toml
//! output = "./pipeline"
//! data_dir = "./data"
//!
//! [authors]
//! limit = 5000
//!
//! [bio_entities]
//! file = "./data/bio/OA02_Bio_entities_Main.csv"
//!
//! [hand_annotated]
//! [classify]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::manifest::CURRENT_FORMAT_VERSION;
use crate::stage::{ClassifyInput, PopulateInput, StageInput, StageName, make_stage_input};

/// Top-level run.toml structure. Each stage section present = enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Output directory (store + runs live here)
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Directory holding the OA0x CSV extracts
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory of the bio-entity extracts; defaults to `data_dir`
    pub bio_dir: Option<PathBuf>,

    pub authors: Option<StageConfig>,
    pub affiliations: Option<StageConfig>,
    pub employment: Option<StageConfig>,
    pub education: Option<StageConfig>,
    pub bio_entities: Option<StageConfig>,
    pub bio_mutations: Option<StageConfig>,
    pub nih_projects: Option<StageConfig>,
    pub hand_annotated: Option<StageConfig>,
    pub links: Option<StageConfig>,
    pub classify: Option<ClassifyStageConfig>,
}

fn default_output() -> PathBuf {
    PathBuf::from("./pipeline")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Row limit (entity limit for `links`)
    pub limit: Option<usize>,
    /// Source file overriding the default OA0x name
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyStageConfig {}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read run config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse run config: {}", path.display()))?;
        Ok(config)
    }

    pub fn stage_config(&self, stage: StageName) -> Option<&StageConfig> {
        match stage {
            StageName::Authors => self.authors.as_ref(),
            StageName::Affiliations => self.affiliations.as_ref(),
            StageName::Employment => self.employment.as_ref(),
            StageName::Education => self.education.as_ref(),
            StageName::BioEntities => self.bio_entities.as_ref(),
            StageName::BioMutations => self.bio_mutations.as_ref(),
            StageName::NihProjects => self.nih_projects.as_ref(),
            StageName::HandAnnotated => self.hand_annotated.as_ref(),
            StageName::Links => self.links.as_ref(),
            StageName::Classify => None,
        }
    }

    /// Enabled stages in pipeline order.
    pub fn active_stages(&self) -> Vec<StageName> {
        StageName::ALL
            .into_iter()
            .filter(|&stage| match stage {
                StageName::Classify => self.classify.is_some(),
                _ => self.stage_config(stage).is_some(),
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let active = self.active_stages();
        if !active.iter().any(|s| s.is_populate()) {
            anyhow::bail!("run config enables no populate stage");
        }
        for stage in [StageName::HandAnnotated, StageName::Links] {
            if self.stage_config(stage).is_some_and(|c| c.file.is_some()) {
                anyhow::bail!("[{}] takes no source file", stage_section(stage));
            }
        }
        if self
            .hand_annotated
            .as_ref()
            .is_some_and(|c| c.limit.is_some())
        {
            anyhow::bail!("[hand_annotated] takes no limit");
        }
        Ok(())
    }

    /// Input of a populate stage, or `None` when the stage is disabled.
    ///
    /// `default_limit` applies when the section sets none. `source_hash` is
    /// the blake3 of the stage's CSV, `parent_hash` the content hash of the
    /// snapshot it extends.
    pub fn populate_input(
        &self,
        stage: StageName,
        default_limit: Option<usize>,
        source_hash: Option<String>,
        parent_hash: Option<&str>,
    ) -> Option<StageInput> {
        let cfg = self.stage_config(stage)?;
        let input = PopulateInput {
            stage,
            source_hash,
            limit: cfg.limit.or(default_limit),
            parent_hash: parent_hash.map(str::to_owned),
            format_version: CURRENT_FORMAT_VERSION,
        };
        Some(make_stage_input(stage, &input))
    }

    pub fn classify_input(&self, parent_hash: &str) -> Option<StageInput> {
        self.classify.as_ref()?;
        let input = ClassifyInput {
            parent_hash: parent_hash.to_owned(),
            format_version: CURRENT_FORMAT_VERSION,
        };
        Some(make_stage_input(StageName::Classify, &input))
    }
}

/// run.toml section name of a stage.
pub fn stage_section(stage: StageName) -> String {
    match stage {
        StageName::Classify => "classify".to_string(),
        _ => stage.dir_name().replace('-', "_"),
    }
}
