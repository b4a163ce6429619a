//! Pipeline stages and their input hashes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hash;

/// One step of the population pipeline, in execution order.
///
/// Every populate stage extends the snapshot of the stage before it;
/// `Classify` runs the reasoner over the final population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageName {
    Authors,
    Affiliations,
    Employment,
    Education,
    BioEntities,
    BioMutations,
    NihProjects,
    HandAnnotated,
    Links,
    Classify,
}

impl StageName {
    pub const ALL: [StageName; 10] = [
        Self::Authors,
        Self::Affiliations,
        Self::Employment,
        Self::Education,
        Self::BioEntities,
        Self::BioMutations,
        Self::NihProjects,
        Self::HandAnnotated,
        Self::Links,
        Self::Classify,
    ];

    /// Directory name used in runs/ symlinks. Populate stages share their
    /// dataset's name.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Affiliations => "affiliations",
            Self::Employment => "employment",
            Self::Education => "education",
            Self::BioEntities => "bio-entities",
            Self::BioMutations => "bio-mutations",
            Self::NihProjects => "nih-projects",
            Self::HandAnnotated => "hand-annotated",
            Self::Links => "links",
            Self::Classify => "classified",
        }
    }

    pub fn is_populate(self) -> bool {
        self != Self::Classify
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for StageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|stage| stage.dir_name() == s)
            .or(match s.as_str() {
                "classify" => Some(Self::Classify),
                _ => None,
            })
            .ok_or_else(|| format!("unknown stage: {s}"))
    }
}

/// Content-affecting configuration for a stage, serialized to compute the
/// input hash.
#[derive(Debug, Clone, Serialize)]
pub struct StageInput {
    pub stage: StageName,
    /// Canonical JSON of the stage's content-affecting fields
    pub config_json: String,
}

impl StageInput {
    pub fn input_hash(&self) -> blake3::Hash {
        hash::hash_bytes(self.config_json.as_bytes())
    }

    /// Short (8-char hex) input hash.
    pub fn short_hash(&self) -> String {
        hash::short_hash(&self.input_hash())
    }
}

/// Content-affecting fields of a populate stage.
///
/// `parent_hash` is the content hash of the snapshot the stage extends, so
/// a change anywhere upstream invalidates every later stage.
#[derive(Debug, Clone, Serialize)]
pub struct PopulateInput {
    pub stage: StageName,
    /// Blake3 of the CSV extract; `None` for stages without a source file
    pub source_hash: Option<String>,
    pub limit: Option<usize>,
    pub parent_hash: Option<String>,
    pub format_version: u32,
}

/// Content-affecting fields of the classification stage.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyInput {
    pub parent_hash: String,
    pub format_version: u32,
}

/// Build a StageInput from typed config.
pub fn make_stage_input<T: Serialize>(stage: StageName, config: &T) -> StageInput {
    // Plain structs of strings and integers always serialize
    let config_json =
        serde_json::to_string(config).expect("StageInput config serialization should never fail");
    StageInput { stage, config_json }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors(source: &str, limit: Option<usize>) -> StageInput {
        make_stage_input(
            StageName::Authors,
            &PopulateInput {
                stage: StageName::Authors,
                source_hash: Some(source.into()),
                limit,
                parent_hash: None,
                format_version: 1,
            },
        )
    }

    #[test]
    fn input_hash_deterministic() {
        assert_eq!(
            authors("abc", Some(5000)).input_hash(),
            authors("abc", Some(5000)).input_hash()
        );
    }

    #[test]
    fn source_and_limit_affect_hash() {
        let base = authors("abc", Some(5000));
        assert_ne!(base.input_hash(), authors("abd", Some(5000)).input_hash());
        assert_ne!(base.input_hash(), authors("abc", Some(10)).input_hash());
        assert_ne!(base.input_hash(), authors("abc", None).input_hash());
    }

    #[test]
    fn parent_affects_hash() {
        let input = |parent: &str| {
            make_stage_input(
                StageName::Links,
                &PopulateInput {
                    stage: StageName::Links,
                    source_hash: None,
                    limit: Some(50),
                    parent_hash: Some(parent.into()),
                    format_version: 1,
                },
            )
        };
        assert_ne!(input("aaaa").input_hash(), input("bbbb").input_hash());
        assert_eq!(input("aaaa").short_hash().len(), 8);
    }

    #[test]
    fn stage_name_display_and_parse() {
        assert_eq!(StageName::BioEntities.to_string(), "bio-entities");
        assert_eq!(StageName::Classify.to_string(), "classified");
        for stage in StageName::ALL {
            assert_eq!(stage.dir_name().parse::<StageName>(), Ok(stage));
        }
        assert_eq!("nih_projects".parse(), Ok(StageName::NihProjects));
        assert_eq!("classify".parse(), Ok(StageName::Classify));
        assert!("pubmed".parse::<StageName>().is_err());
    }

    #[test]
    fn pipeline_order() {
        assert!(StageName::Authors < StageName::Affiliations);
        assert!(StageName::HandAnnotated < StageName::Links);
        assert!(StageName::ALL.iter().filter(|s| !s.is_populate()).eq([&StageName::Classify]));
    }
}
