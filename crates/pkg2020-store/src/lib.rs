//! pkg2020-store: content-addressable store for population snapshots
//!
//! Every pipeline stage writes one ontology snapshot. The snapshot is stored
//! under the hash of everything that determines it: the stage, its source
//! file's content, its row limit, the snapshot it extends and the snapshot
//! format version. Re-running an unchanged pipeline is a sequence of cache
//! hits.

pub mod hash;
pub mod manifest;
pub mod run_config;
pub mod stage;
pub mod store;

pub use hash::{combine_hashes, hash_bytes, hash_file, short_hash};
pub use manifest::{CURRENT_FORMAT_VERSION, StageManifest};
pub use run_config::{RunConfig, StageConfig, stage_section};
pub use stage::{ClassifyInput, PopulateInput, StageInput, StageName, make_stage_input};
pub use store::{LookupResult, RunMeta, RunStage, SNAPSHOT_FILE, Store, StoreEntry, VerifyResult};
