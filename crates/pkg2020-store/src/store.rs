//! Content-addressable store for stage snapshots
//!
//! Directory layout:
//! ```text
//! {base}/
//! ├── store/
//! │   └── {input-hash}/     # stage output (8 char hex)
//! │       ├── manifest.json
//! │       └── snapshot.owl
//! ├── runs/
//! │   └── {run-hash}/       # per-run symlinks
//! │       ├── run.json
//! │       ├── authors -> ../../store/{hash}
//! │       └── ...
//! └── latest -> runs/{run-hash}
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hash;
use crate::manifest::{CURRENT_FORMAT_VERSION, StageManifest};
use crate::stage::{StageInput, StageName};

/// File name of the ontology snapshot inside a stage directory.
pub const SNAPSHOT_FILE: &str = "snapshot.owl";

/// Result of looking up a stage in the store.
#[derive(Debug)]
pub enum LookupResult {
    Cached {
        path: PathBuf,
        manifest: StageManifest,
    },
    NeedsRun,
}

/// Summary of a store entry for listing.
#[derive(Debug, Serialize)]
pub struct StoreEntry {
    pub input_hash: String,
    pub stage: StageName,
    pub content_hash: String,
    pub size_bytes: u64,
    pub created_at: String,
    pub referenced: bool,
}

/// Verification result for a single file.
#[derive(Debug)]
pub struct VerifyResult {
    pub path: String,
    pub expected: String,
    pub actual: String,
    pub ok: bool,
}

/// One stage as recorded in a run.
pub struct RunStage<'a> {
    pub input: &'a StageInput,
    pub manifest: &'a StageManifest,
    pub cached: bool,
}

/// Run metadata stored in runs/{run-hash}/run.json
#[derive(Debug, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_hash: String,
    /// Stages in execution order
    pub stages: Vec<StageMeta>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StageMeta {
    pub stage: StageName,
    pub input_hash: String,
    pub content_hash: String,
    pub cached: bool,
}

impl RunMeta {
    pub fn stage(&self, stage: StageName) -> Option<&StageMeta> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

pub struct Store {
    base: PathBuf,
}

impl Store {
    /// Open (creating if needed) a store rooted at `base`.
    pub fn new(base: &Path) -> Result<Self> {
        let store_dir = base.join("store");
        let runs_dir = base.join("runs");
        fs::create_dir_all(&store_dir)
            .with_context(|| format!("failed to create store dir: {}", store_dir.display()))?;
        fs::create_dir_all(&runs_dir)
            .with_context(|| format!("failed to create runs dir: {}", runs_dir.display()))?;
        Ok(Self {
            base: base.to_path_buf(),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn store_dir(&self) -> PathBuf {
        self.base.join("store")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.base.join("runs")
    }

    /// Look up a cached snapshot by input hash.
    ///
    /// Entries with an unreadable manifest, a foreign format version or a
    /// missing snapshot file are misses.
    pub fn lookup(&self, input: &StageInput) -> LookupResult {
        let short = input.short_hash();
        let dir = self.store_dir().join(&short);
        if !dir.exists() {
            return LookupResult::NeedsRun;
        }

        match StageManifest::read_from(&dir) {
            Ok(manifest) if manifest.format_version != CURRENT_FORMAT_VERSION => {
                log::warn!(
                    "cache {short}: format_version {} != current {CURRENT_FORMAT_VERSION}, invalidating",
                    manifest.format_version,
                );
                LookupResult::NeedsRun
            }
            Ok(_) if !dir.join(SNAPSHOT_FILE).is_file() => {
                log::warn!("cache {short}: {SNAPSHOT_FILE} missing, invalidating");
                LookupResult::NeedsRun
            }
            Ok(manifest) => LookupResult::Cached {
                path: dir,
                manifest,
            },
            Err(e) => {
                log::warn!("corrupt cache entry {short}: {e:#}");
                LookupResult::NeedsRun
            }
        }
    }

    /// Staging directory a stage writes into before [`Store::commit_stage`].
    pub fn stage_tmp_dir(&self, input: &StageInput) -> PathBuf {
        self.store_dir().join(format!("{}.tmp", input.short_hash()))
    }

    pub fn stage_dir(&self, input: &StageInput) -> PathBuf {
        self.store_dir().join(input.short_hash())
    }

    /// Snapshot path of a committed stage.
    pub fn snapshot_path(&self, input: &StageInput) -> PathBuf {
        self.stage_dir(input).join(SNAPSHOT_FILE)
    }

    /// Commit a completed stage: hash its files, write the manifest, then
    /// rename the staging directory into place.
    pub fn commit_stage(
        &self,
        input: &StageInput,
        tmp_dir: &Path,
        stats: BTreeMap<String, usize>,
    ) -> Result<StageManifest> {
        let (file_hashes, content_hash) = StageManifest::compute_content_hashes(tmp_dir)?;

        let manifest = StageManifest {
            format_version: CURRENT_FORMAT_VERSION,
            stage: input.stage,
            input_hash: input.short_hash(),
            config_json: input.config_json.clone(),
            file_hashes,
            content_hash: content_hash.to_hex().to_string(),
            stats,
            created_at: chrono::Utc::now(),
        };
        manifest.write_to(tmp_dir)?;

        let final_dir = self.stage_dir(input);
        if final_dir.exists() {
            // Same input hash, same snapshot
            log::info!(
                "store: {} already exists, removing tmp",
                final_dir.display()
            );
            fs::remove_dir_all(tmp_dir)
                .with_context(|| format!("failed to remove tmp {}", tmp_dir.display()))?;
        } else {
            fs::rename(tmp_dir, &final_dir).with_context(|| {
                format!(
                    "failed to rename {} -> {}",
                    tmp_dir.display(),
                    final_dir.display()
                )
            })?;
        }

        Ok(manifest)
    }

    /// Record a run: one symlink per stage, run.json, and `latest`.
    pub fn create_run(&self, stages: &[RunStage<'_>]) -> Result<PathBuf> {
        let combined = hash::combine_hashes(
            &stages
                .iter()
                .map(|s| s.input.input_hash())
                .collect::<Vec<_>>(),
        );
        let run_hash = hash::short_hash(&combined);

        let run_dir = self.runs_dir().join(&run_hash);
        if run_dir.exists() {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to replace {}", run_dir.display()))?;
        }
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("failed to create {}", run_dir.display()))?;

        for s in stages {
            let target = PathBuf::from("../../store").join(s.input.short_hash());
            let link = run_dir.join(s.input.stage.dir_name());
            std::os::unix::fs::symlink(&target, &link).with_context(|| {
                format!(
                    "failed to create symlink {} -> {}",
                    link.display(),
                    target.display()
                )
            })?;
        }

        let run_meta = RunMeta {
            run_hash: run_hash.clone(),
            stages: stages
                .iter()
                .map(|s| StageMeta {
                    stage: s.input.stage,
                    input_hash: s.input.short_hash(),
                    content_hash: s.manifest.content_hash.clone(),
                    cached: s.cached,
                })
                .collect(),
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string_pretty(&run_meta)?;
        fs::write(run_dir.join("run.json"), json)
            .with_context(|| format!("failed to write run.json in {}", run_dir.display()))?;

        let latest = self.base.join("latest");
        let _ = fs::remove_file(&latest);
        let target = PathBuf::from("runs").join(&run_hash);
        if let Err(e) = std::os::unix::fs::symlink(&target, &latest) {
            log::warn!("failed to update latest symlink: {e}");
        }

        Ok(run_dir)
    }

    /// Metadata of the run `latest` points to.
    pub fn latest_run(&self) -> Result<Option<RunMeta>> {
        let run_json = self.base.join("latest").join("run.json");
        if !run_json.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&run_json)
            .with_context(|| format!("failed to read {}", run_json.display()))?;
        let meta = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", run_json.display()))?;
        Ok(Some(meta))
    }

    /// Snapshot of the last stage of the latest run.
    pub fn latest_snapshot(&self) -> Result<Option<PathBuf>> {
        let Some(run) = self.latest_run()? else {
            return Ok(None);
        };
        Ok(run.stages.last().map(|s| {
            self.store_dir().join(&s.input_hash).join(SNAPSHOT_FILE)
        }))
    }

    pub fn list(&self) -> Result<Vec<StoreEntry>> {
        let referenced = self.referenced_hashes()?;

        let mut entries = Vec::new();
        for entry in fs::read_dir(self.store_dir())? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if !path.is_dir() || name.ends_with(".tmp") {
                continue;
            }

            match StageManifest::read_from(&path) {
                Ok(manifest) => {
                    let size_bytes = fs::metadata(path.join(SNAPSHOT_FILE))
                        .map(|m| m.len())
                        .unwrap_or(0);
                    entries.push(StoreEntry {
                        stage: manifest.stage,
                        content_hash: manifest.content_hash.chars().take(8).collect(),
                        size_bytes,
                        created_at: manifest.created_at.format("%Y-%m-%d %H:%M").to_string(),
                        referenced: referenced.contains(&name),
                        input_hash: name,
                    });
                }
                Err(e) => log::warn!("skipping {name}: {e:#}"),
            }
        }

        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.stage.cmp(&b.stage))
        });
        Ok(entries)
    }

    fn referenced_hashes(&self) -> Result<HashSet<String>> {
        let mut refs = HashSet::new();
        let runs_dir = self.runs_dir();
        if !runs_dir.exists() {
            return Ok(refs);
        }

        for entry in fs::read_dir(&runs_dir)? {
            let run_json = entry?.path().join("run.json");
            let Ok(content) = fs::read_to_string(&run_json) else {
                continue;
            };
            match serde_json::from_str::<RunMeta>(&content) {
                Ok(meta) => refs.extend(meta.stages.into_iter().map(|s| s.input_hash)),
                Err(e) => log::warn!("unreadable {}: {e}", run_json.display()),
            }
        }
        Ok(refs)
    }

    /// Remove stale `.tmp` directories and entries no run references.
    /// Returns the removed directory names.
    pub fn gc(&self) -> Result<Vec<String>> {
        let referenced = self.referenced_hashes()?;
        let mut removed = Vec::new();

        for entry in fs::read_dir(self.store_dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            if name.ends_with(".tmp") {
                log::info!("gc: removing stale tmp {name}");
            } else if !referenced.contains(&name) {
                log::info!("gc: removing unreferenced {name}");
            } else {
                continue;
            }
            fs::remove_dir_all(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            removed.push(name);
        }

        removed.sort();
        Ok(removed)
    }

    /// Re-hash the files of one entry against its manifest.
    pub fn verify(&self, input_hash: &str) -> Result<Vec<VerifyResult>> {
        let dir = self.store_dir().join(input_hash);
        let manifest = StageManifest::read_from(&dir)
            .with_context(|| format!("no manifest for {input_hash}"))?;

        let results = manifest
            .file_hashes
            .iter()
            .map(|(filename, expected)| {
                let file_path = dir.join(filename);
                let actual = if file_path.exists() {
                    match hash::hash_file(&file_path) {
                        Ok(h) => h.to_hex().to_string(),
                        Err(e) => format!("error: {e}"),
                    }
                } else {
                    "MISSING".to_string()
                };
                VerifyResult {
                    path: filename.clone(),
                    ok: actual == *expected,
                    expected: expected.clone(),
                    actual,
                }
            })
            .collect();
        Ok(results)
    }

    pub fn verify_all(&self) -> Result<BTreeMap<String, Vec<VerifyResult>>> {
        let mut all_results = BTreeMap::new();
        for entry in fs::read_dir(self.store_dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tmp") || !entry.path().is_dir() {
                continue;
            }
            match self.verify(&name) {
                Ok(results) => {
                    all_results.insert(name, results);
                }
                Err(e) => log::warn!("verify {name}: {e:#}"),
            }
        }
        Ok(all_results)
    }

    /// Remove `.tmp` directories left by interrupted stages.
    pub fn cleanup_tmp(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(self.store_dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tmp") && entry.path().is_dir() {
                log::info!("cleaning stale tmp: {name}");
                fs::remove_dir_all(entry.path())?;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{ClassifyInput, PopulateInput, make_stage_input};

    fn populate_input(stage: StageName, source: &str) -> StageInput {
        make_stage_input(
            stage,
            &PopulateInput {
                stage,
                source_hash: Some(source.into()),
                limit: Some(100),
                parent_hash: None,
                format_version: CURRENT_FORMAT_VERSION,
            },
        )
    }

    fn commit(store: &Store, input: &StageInput, snapshot: &[u8]) -> StageManifest {
        let tmp = store.stage_tmp_dir(input);
        fs::create_dir_all(&tmp).unwrap();
        fs::write(tmp.join(SNAPSHOT_FILE), snapshot).unwrap();
        store
            .commit_stage(input, &tmp, BTreeMap::from([("rows_read".into(), 2)]))
            .unwrap()
    }

    #[test]
    fn new_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        assert!(store.store_dir().is_dir());
        assert!(store.runs_dir().is_dir());
    }

    #[test]
    fn commit_then_lookup_hits() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        let input = populate_input(StageName::Authors, "a1");
        assert!(matches!(store.lookup(&input), LookupResult::NeedsRun));

        let manifest = commit(&store, &input, b"<rdf:RDF/>");
        assert!(manifest.file_hashes.contains_key(SNAPSHOT_FILE));
        assert!(!store.stage_tmp_dir(&input).exists());

        match store.lookup(&input) {
            LookupResult::Cached { path, manifest: m } => {
                assert_eq!(path, store.stage_dir(&input));
                assert_eq!(m.content_hash, manifest.content_hash);
                assert_eq!(m.stat("rows_read"), 2);
            }
            LookupResult::NeedsRun => panic!("expected cache hit"),
        }
    }

    #[test]
    fn foreign_format_version_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        let input = populate_input(StageName::Authors, "a1");
        let mut manifest = commit(&store, &input, b"x");
        manifest.format_version = CURRENT_FORMAT_VERSION + 1;
        manifest.write_to(&store.stage_dir(&input)).unwrap();
        assert!(matches!(store.lookup(&input), LookupResult::NeedsRun));
    }

    #[test]
    fn missing_snapshot_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        let input = populate_input(StageName::Education, "e1");
        commit(&store, &input, b"x");
        fs::remove_file(store.snapshot_path(&input)).unwrap();
        assert!(matches!(store.lookup(&input), LookupResult::NeedsRun));
    }

    #[test]
    fn duplicate_commit_keeps_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        let input = populate_input(StageName::Authors, "a1");
        commit(&store, &input, b"same");
        let second = commit(&store, &input, b"same");
        assert!(!store.stage_tmp_dir(&input).exists());
        assert!(store.stage_dir(&input).exists());
        assert!(!second.content_hash.is_empty());
    }

    #[test]
    fn run_links_stages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();

        let authors = populate_input(StageName::Authors, "a1");
        let authors_manifest = commit(&store, &authors, b"authors");
        let classify = make_stage_input(
            StageName::Classify,
            &ClassifyInput {
                parent_hash: authors_manifest.content_hash.clone(),
                format_version: CURRENT_FORMAT_VERSION,
            },
        );
        let classify_manifest = commit(&store, &classify, b"classified");

        let run_dir = store
            .create_run(&[
                RunStage {
                    input: &authors,
                    manifest: &authors_manifest,
                    cached: true,
                },
                RunStage {
                    input: &classify,
                    manifest: &classify_manifest,
                    cached: false,
                },
            ])
            .unwrap();

        assert!(run_dir.join("authors").is_symlink());
        assert!(run_dir.join("classified").join(SNAPSHOT_FILE).is_file());

        let latest = dir.path().join("latest");
        assert!(latest.is_symlink());
        assert_eq!(
            fs::canonicalize(&latest).unwrap(),
            fs::canonicalize(&run_dir).unwrap()
        );

        let meta = store.latest_run().unwrap().unwrap();
        assert_eq!(meta.stages.len(), 2);
        assert!(meta.stage(StageName::Authors).unwrap().cached);
        assert!(!meta.stage(StageName::Classify).unwrap().cached);
        assert_eq!(
            store.latest_snapshot().unwrap(),
            Some(store.snapshot_path(&classify))
        );
    }

    #[test]
    fn no_runs_means_no_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        assert!(store.latest_run().unwrap().is_none());
        assert!(store.latest_snapshot().unwrap().is_none());
    }

    #[test]
    fn list_marks_referenced_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();

        let kept = populate_input(StageName::Authors, "a1");
        let kept_manifest = commit(&store, &kept, b"kept");
        let orphan = populate_input(StageName::Authors, "a2");
        commit(&store, &orphan, b"orphan");
        fs::create_dir_all(store.store_dir().join("abcd1234.tmp")).unwrap();

        store
            .create_run(&[RunStage {
                input: &kept,
                manifest: &kept_manifest,
                cached: false,
            }])
            .unwrap();

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 2);
        let find = |hash: String| entries.iter().find(|e| e.input_hash == hash).unwrap();
        assert!(find(kept.short_hash()).referenced);
        assert!(!find(orphan.short_hash()).referenced);
        assert_eq!(find(kept.short_hash()).size_bytes, 4);
    }

    #[test]
    fn gc_removes_unreferenced_and_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();

        let kept = populate_input(StageName::Authors, "a1");
        let kept_manifest = commit(&store, &kept, b"kept");
        let orphan = populate_input(StageName::Links, "l1");
        commit(&store, &orphan, b"orphan");
        fs::create_dir_all(store.store_dir().join("deadbeef.tmp")).unwrap();
        store
            .create_run(&[RunStage {
                input: &kept,
                manifest: &kept_manifest,
                cached: false,
            }])
            .unwrap();

        let removed = store.gc().unwrap();
        assert_eq!(removed.len(), 2);
        assert!(removed.contains(&orphan.short_hash()));
        assert!(removed.contains(&"deadbeef.tmp".to_string()));
        assert!(store.stage_dir(&kept).exists());
        assert!(!store.stage_dir(&orphan).exists());
    }

    #[test]
    fn verify_detects_corruption_and_loss() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();

        let good = populate_input(StageName::Authors, "a1");
        commit(&store, &good, b"good");
        let corrupt = populate_input(StageName::Authors, "a2");
        commit(&store, &corrupt, b"original");
        fs::write(store.snapshot_path(&corrupt), b"tampered").unwrap();
        let lost = populate_input(StageName::Authors, "a3");
        commit(&store, &lost, b"lost");
        fs::remove_file(store.snapshot_path(&lost)).unwrap();

        let all = store.verify_all().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[&good.short_hash()].iter().all(|r| r.ok));
        assert!(all[&corrupt.short_hash()].iter().any(|r| !r.ok));
        let lost_results = &all[&lost.short_hash()];
        assert_eq!(lost_results[0].actual, "MISSING");
    }

    #[test]
    fn cleanup_tmp_leaves_committed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        let input = populate_input(StageName::Authors, "a1");
        commit(&store, &input, b"real");
        fs::create_dir_all(store.store_dir().join("aaa.tmp")).unwrap();
        fs::create_dir_all(store.store_dir().join("bbb.tmp")).unwrap();

        assert_eq!(store.cleanup_tmp().unwrap(), 2);
        assert!(store.stage_dir(&input).exists());
        assert_eq!(store.cleanup_tmp().unwrap(), 0);
    }
}
