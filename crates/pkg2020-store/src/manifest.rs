//! Stage manifest: how a snapshot was produced and what it hashes to

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hash;
use crate::stage::StageName;

/// Bumped whenever the snapshot serialization changes. Entries written under
/// another version are treated as misses.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";

/// Manifest stored alongside a stage's snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageManifest {
    #[serde(default)]
    pub format_version: u32,
    pub stage: StageName,
    /// Short input hash, also the store directory name
    pub input_hash: String,
    /// Config JSON that was hashed
    pub config_json: String,
    /// filename -> full hex blake3
    pub file_hashes: BTreeMap<String, String>,
    /// Combined hash of all output files; the next stage's parent hash
    pub content_hash: String,
    /// Counters reported by the stage (rows read, individuals created, ...)
    #[serde(default)]
    pub stats: BTreeMap<String, usize>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl StageManifest {
    /// Hash every regular file in `dir` except the manifest itself.
    /// Returns (file_hashes, combined_content_hash).
    pub fn compute_content_hashes(dir: &Path) -> Result<(BTreeMap<String, String>, blake3::Hash)> {
        let pattern = dir.join("*");
        let pattern_str = pattern.to_string_lossy();

        let mut entries: Vec<_> = glob::glob(&pattern_str)
            .context("invalid glob pattern")?
            .filter_map(|e| e.ok())
            .filter(|p| p.is_file() && p.file_name().is_none_or(|n| n != MANIFEST_FILE))
            .collect();
        entries.sort();

        let mut file_hashes = BTreeMap::new();
        let mut all_hashes = Vec::with_capacity(entries.len());
        for path in &entries {
            let h = hash::hash_file(path)
                .with_context(|| format!("failed to hash {}", path.display()))?;
            let Some(filename) = path.file_name() else {
                continue;
            };
            file_hashes.insert(filename.to_string_lossy().into_owned(), h.to_hex().to_string());
            all_hashes.push(h);
        }

        let content_hash = if all_hashes.is_empty() {
            hash::hash_bytes(b"empty")
        } else {
            hash::combine_hashes(&all_hashes)
        };
        Ok((file_hashes, content_hash))
    }

    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).context("failed to serialize manifest")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn read_from(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn stat(&self, key: &str) -> usize {
        self.stats.get(key).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StageManifest {
        StageManifest {
            format_version: CURRENT_FORMAT_VERSION,
            stage: StageName::Authors,
            input_hash: "abcd1234".into(),
            config_json: r#"{"stage":"authors"}"#.into(),
            file_hashes: BTreeMap::from([("snapshot.owl".into(), "hash_a".into())]),
            content_hash: "deadbeef".into(),
            stats: BTreeMap::from([("rows_read".into(), 3)]),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn empty_dir_hashes_to_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let (hashes, combined) = StageManifest::compute_content_hashes(dir.path()).unwrap();
        assert!(hashes.is_empty());
        assert_eq!(combined, hash::hash_bytes(b"empty"));
    }

    #[test]
    fn manifest_excludes_itself() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("snapshot.owl"), b"<rdf:RDF/>").unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), b"{}").unwrap();

        let (hashes, _) = StageManifest::compute_content_hashes(dir.path()).unwrap();
        assert_eq!(hashes.len(), 1);
        assert!(hashes.contains_key("snapshot.owl"));
    }

    #[test]
    fn content_hash_follows_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.owl");
        std::fs::write(&path, b"one").unwrap();
        let (_, first) = StageManifest::compute_content_hashes(dir.path()).unwrap();
        let (_, again) = StageManifest::compute_content_hashes(dir.path()).unwrap();
        assert_eq!(first, again);

        std::fs::write(&path, b"two").unwrap();
        let (_, changed) = StageManifest::compute_content_hashes(dir.path()).unwrap();
        assert_ne!(first, changed);
    }

    #[test]
    fn read_from_missing_or_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StageManifest::read_from(dir.path()).is_err());
        std::fs::write(dir.path().join(MANIFEST_FILE), b"not json").unwrap();
        assert!(StageManifest::read_from(dir.path()).is_err());
    }

    #[test]
    fn manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = sample();
        manifest.write_to(dir.path()).unwrap();

        let loaded = StageManifest::read_from(dir.path()).unwrap();
        assert_eq!(loaded.stage, StageName::Authors);
        assert_eq!(loaded.content_hash, manifest.content_hash);
        assert_eq!(loaded.stat("rows_read"), 3);
        assert_eq!(loaded.stat("conflicts"), 0);
    }

    #[test]
    fn manifest_without_version_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"stage":"links","input_hash":"x","config_json":"{}","file_hashes":{},"content_hash":"y","created_at":"2026-01-01T00:00:00Z"}"#;
        std::fs::write(dir.path().join(MANIFEST_FILE), json).unwrap();
        let loaded = StageManifest::read_from(dir.path()).unwrap();
        assert_eq!(loaded.format_version, 0);
        assert!(loaded.stats.is_empty());
    }
}
