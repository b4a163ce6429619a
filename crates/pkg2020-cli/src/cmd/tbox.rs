//! `pkg2020 tbox` - write the schema-only ontology

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pkg2020_ontology::{Class, DataProperty, ObjectProperty};
use pkg2020_ontology::snapshot::write_tbox;

use super::{TBOX_FILE, ensure_parent, print_summary};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct TboxArgs {
    /// Output file (default: <output.dir>/pkg2020_tbox_only.owl)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: TboxArgs, config: &Config) -> Result<()> {
    let path = args
        .output
        .unwrap_or_else(|| config.output.dir.join(TBOX_FILE));
    ensure_parent(&path)?;

    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_tbox(&mut out).with_context(|| format!("Failed to write {}", path.display()))?;
    out.flush()?;

    let derived = Class::ALL.iter().filter(|c| c.is_derived()).count();
    print_summary(
        "T-Box",
        &[
            ("File", path.display().to_string()),
            ("Classes", format!("{} ({derived} defined)", Class::ALL.len())),
            ("Object properties", ObjectProperty::ALL.len().to_string()),
            ("Data properties", DataProperty::ALL.len().to_string()),
        ],
    );
    Ok(())
}
