//! Population configuration

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::dataset::Dataset;

/// Maximum number of source rows each stage reads.
///
/// Stages sample the head of their CSV instead of reading it whole. The caps
/// bound snapshot size and limit how complete downstream query results are.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub authors: usize,
    pub affiliations: usize,
    pub employment: usize,
    pub education: usize,
    pub bio_entities: usize,
    pub bio_mutations: usize,
    pub nih_projects: usize,
    /// Organizations and institutions receiving generated external links.
    pub links: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            authors: 5_000,
            affiliations: 5_000,
            employment: 10_000,
            education: 15_000,
            bio_entities: 10_000,
            bio_mutations: 10_000,
            nih_projects: 10_000,
            links: 50,
        }
    }
}

impl Limits {
    /// Row cap for a dataset. `None` for the fixture stage.
    pub fn for_dataset(&self, dataset: Dataset) -> Option<usize> {
        match dataset {
            Dataset::AuthorsArticles => Some(self.authors),
            Dataset::Affiliations => Some(self.affiliations),
            Dataset::Employment => Some(self.employment),
            Dataset::Education => Some(self.education),
            Dataset::BioEntities => Some(self.bio_entities),
            Dataset::BioMutations => Some(self.bio_mutations),
            Dataset::NihProjects => Some(self.nih_projects),
            Dataset::Links => Some(self.links),
            Dataset::HandAnnotated => None,
        }
    }

    /// Override the cap of one dataset. No-op for the fixture stage.
    pub fn set(&mut self, dataset: Dataset, limit: usize) {
        let slot = match dataset {
            Dataset::AuthorsArticles => &mut self.authors,
            Dataset::Affiliations => &mut self.affiliations,
            Dataset::Employment => &mut self.employment,
            Dataset::Education => &mut self.education,
            Dataset::BioEntities => &mut self.bio_entities,
            Dataset::BioMutations => &mut self.bio_mutations,
            Dataset::NihProjects => &mut self.nih_projects,
            Dataset::Links => &mut self.links,
            Dataset::HandAnnotated => return,
        };
        *slot = limit;
    }

    /// Apply the same cap to every stage (`--limit`).
    pub fn uniform(limit: usize) -> Self {
        Self {
            authors: limit,
            affiliations: limit,
            employment: limit,
            education: limit,
            bio_entities: limit,
            bio_mutations: limit,
            nih_projects: limit,
            links: limit,
        }
    }
}

/// Runtime configuration for a population run
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the OA0x CSV extracts
    pub data_dir: PathBuf,
    /// Directory holding the bio-entity CSVs
    pub bio_dir: PathBuf,
    pub limits: Limits,
    /// Per-dataset source file overrides
    pub files: BTreeMap<Dataset, PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bio_dir: PathBuf::from("data"),
            limits: Limits::default(),
            files: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Use one directory for every source.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            bio_dir: dir.clone(),
            data_dir: dir,
            ..Default::default()
        }
    }

    /// Resolved source path for a dataset, `None` when it reads no file.
    pub fn source_path(&self, dataset: Dataset) -> Option<PathBuf> {
        if let Some(path) = self.files.get(&dataset) {
            return Some(path.clone());
        }
        let file = dataset.default_file()?;
        let dir = if dataset.is_bio() {
            &self.bio_dir
        } else {
            &self.data_dir
        };
        Some(dir.join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.for_dataset(Dataset::AuthorsArticles), Some(5_000));
        assert_eq!(limits.for_dataset(Dataset::Education), Some(15_000));
        assert_eq!(limits.for_dataset(Dataset::Links), Some(50));
        assert_eq!(limits.for_dataset(Dataset::HandAnnotated), None);
    }

    #[test]
    fn partial_limits_keep_defaults() {
        let limits = from_pairs(&[("authors", 10)]);
        assert_eq!(limits.authors, 10);
        assert_eq!(limits.education, 15_000);
    }

    #[test]
    fn set_overrides_one_dataset() {
        let mut limits = Limits::default();
        limits.set(Dataset::BioMutations, 7);
        limits.set(Dataset::HandAnnotated, 7);
        assert_eq!(limits.for_dataset(Dataset::BioMutations), Some(7));
        assert_eq!(limits.for_dataset(Dataset::BioEntities), Some(10_000));
        assert_eq!(limits.for_dataset(Dataset::HandAnnotated), None);
    }

    fn from_pairs(pairs: &[(&'static str, usize)]) -> Limits {
        let de = serde::de::value::MapDeserializer::<_, serde::de::value::Error>::new(
            pairs.iter().copied(),
        );
        Limits::deserialize(de).unwrap()
    }

    #[test]
    fn source_paths() {
        let mut config = Config::with_data_dir("/data");
        config.bio_dir = PathBuf::from("/bio");
        assert_eq!(
            config.source_path(Dataset::Affiliations),
            Some(PathBuf::from("/data/OA04_Affiliations.csv"))
        );
        assert_eq!(
            config.source_path(Dataset::BioMutations),
            Some(PathBuf::from("/bio/OA03_Bio_entities_Mutation.csv"))
        );
        assert_eq!(config.source_path(Dataset::Links), None);

        config
            .files
            .insert(Dataset::Education, PathBuf::from("/tmp/edu.csv"));
        assert_eq!(
            config.source_path(Dataset::Education),
            Some(PathBuf::from("/tmp/edu.csv"))
        );
    }
}
