//! `pkg2020 store` - manage the snapshot store

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color};

use pkg2020_core::fmt_num;
use pkg2020_store::{Store, VerifyResult};

use super::table;

#[derive(Args, Debug)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub action: StoreAction,
}

#[derive(Subcommand, Debug)]
pub enum StoreAction {
    /// List cached stage snapshots
    List {
        /// Pipeline output directory (containing store/)
        #[arg(short, long)]
        dir: PathBuf,
    },
    /// Show the stages of the latest run
    Latest {
        /// Pipeline output directory (containing store/)
        #[arg(short, long)]
        dir: PathBuf,
    },
    /// Remove unreferenced cache entries
    Gc {
        /// Pipeline output directory (containing store/)
        #[arg(short, long)]
        dir: PathBuf,

        /// Actually delete (otherwise dry-run)
        #[arg(long)]
        confirm: bool,
    },
    /// Verify content hashes
    Verify {
        /// Pipeline output directory (containing store/)
        #[arg(short, long)]
        dir: PathBuf,

        /// Specific input hash to verify (default: all)
        hash: Option<String>,
    },
}

pub fn run(args: StoreArgs) -> Result<()> {
    match args.action {
        StoreAction::List { dir } => list(&dir),
        StoreAction::Latest { dir } => latest(&dir),
        StoreAction::Gc { dir, confirm } => gc(&dir, confirm),
        StoreAction::Verify { dir, hash } => verify(&dir, hash.as_deref()),
    }
}

fn short(hash: &str) -> &str {
    &hash[..std::cmp::min(8, hash.len())]
}

fn list(dir: &Path) -> Result<()> {
    let store = Store::new(dir)?;
    let entries = store.list()?;

    if entries.is_empty() {
        eprintln!("No cached entries.");
        return Ok(());
    }

    let mut t = table(&["Hash", "Stage", "Snapshot", "Content", "Created", "Ref"]);
    for entry in &entries {
        let ref_cell = if entry.referenced {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        t.add_row(vec![
            Cell::new(&entry.input_hash),
            Cell::new(entry.stage),
            Cell::new(format!("{} KiB", fmt_num((entry.size_bytes / 1024) as usize))),
            Cell::new(short(&entry.content_hash)),
            Cell::new(&entry.created_at),
            ref_cell,
        ]);
    }

    eprintln!("\n{t}");
    eprintln!("{} entries total", entries.len());
    Ok(())
}

fn latest(dir: &Path) -> Result<()> {
    let store = Store::new(dir)?;
    let Some(run) = store.latest_run()? else {
        eprintln!("No runs recorded.");
        return Ok(());
    };

    let mut t = table(&["Stage", "Hash", "Content", "Status"]);
    for stage in &run.stages {
        t.add_row(vec![
            Cell::new(stage.stage),
            Cell::new(&stage.input_hash),
            Cell::new(short(&stage.content_hash)),
            Cell::new(if stage.cached { "cached" } else { "executed" }),
        ]);
    }
    eprintln!("\nRun {} ({})", run.run_hash, run.created_at.format("%Y-%m-%d %H:%M"));
    eprintln!("{t}");
    if let Some(snapshot) = store.latest_snapshot()? {
        eprintln!("Snapshot: {}", snapshot.display());
    }
    Ok(())
}

fn gc(dir: &Path, confirm: bool) -> Result<()> {
    let store = Store::new(dir)?;

    if !confirm {
        let entries = store.list()?;
        let unreferenced: Vec<_> = entries.iter().filter(|e| !e.referenced).collect();

        if unreferenced.is_empty() {
            eprintln!("No unreferenced entries to remove.");
        } else {
            let mut t = table(&["Hash", "Stage"]);
            for entry in &unreferenced {
                t.add_row(vec![Cell::new(&entry.input_hash), Cell::new(entry.stage)]);
            }

            eprintln!(
                "\nWould remove {} unreferenced entries:",
                unreferenced.len()
            );
            eprintln!("{t}");
            eprintln!("Run with --confirm to actually delete.");
        }
        return Ok(());
    }

    let removed = store.gc()?;
    if removed.is_empty() {
        eprintln!("Nothing to clean up.");
    } else {
        eprintln!("Removed {} entries:", removed.len());
        for hash in &removed {
            eprintln!("  {hash}");
        }
    }
    Ok(())
}

fn verify(dir: &Path, hash: Option<&str>) -> Result<()> {
    let store = Store::new(dir)?;

    if let Some(h) = hash {
        let results = store.verify(h)?;
        if !print_verify_results(h, &results) {
            anyhow::bail!("{h} failed verification");
        }
        return Ok(());
    }

    let all = store.verify_all()?;
    if all.is_empty() {
        eprintln!("No entries to verify.");
        return Ok(());
    }

    let mut t = table(&["Hash", "Files", "Status"]);
    let mut all_ok = true;
    for (h, results) in &all {
        let ok = results.iter().all(|r| r.ok);
        all_ok &= ok;
        let status_cell = if ok {
            Cell::new("OK").fg(Color::Green)
        } else {
            Cell::new("FAIL").fg(Color::Red)
        };
        t.add_row(vec![Cell::new(h), Cell::new(results.len()), status_cell]);
    }
    eprintln!("\n{t}");

    for (h, results) in &all {
        print_mismatches(h, results);
    }

    if all_ok {
        eprintln!("All entries verified OK.");
        Ok(())
    } else {
        anyhow::bail!("some entries have integrity issues")
    }
}

fn print_verify_results(hash: &str, results: &[VerifyResult]) -> bool {
    let all_ok = results.iter().all(|r| r.ok);
    let status = if all_ok { "OK" } else { "FAIL" };
    eprintln!("[{status}] {hash} ({} files)", results.len());

    print_mismatches(hash, results);

    all_ok
}

fn print_mismatches(hash: &str, results: &[VerifyResult]) {
    for r in results {
        if !r.ok {
            eprintln!("  MISMATCH in {hash}: {}", r.path);
            eprintln!("    expected: {}", short(&r.expected));
            eprintln!("    actual:   {}", short(&r.actual));
        }
    }
}
