//! CSV source reading.
//!
//! Every stage reads its extract through [`read_rows`]: rows are deserialized
//! into a serde record whose fields are all optional, so a missing column only
//! drops the attribute it feeds. A row that cannot be used is reported as a
//! [`Skip`] and counted, never treated as an error.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::dataset::Dataset;

/// Dataset-level failure. Aborts the stage; the graph is left untouched.
#[derive(Debug)]
pub enum SourceError {
    /// The expected extract does not exist.
    Missing { dataset: Dataset, path: PathBuf },
    Io {
        dataset: Dataset,
        path: PathBuf,
        source: io::Error,
    },
    /// The header line could not be read.
    Csv {
        dataset: Dataset,
        path: PathBuf,
        source: csv::Error,
    },
}

impl SourceError {
    pub fn dataset(&self) -> Dataset {
        match self {
            Self::Missing { dataset, .. } | Self::Io { dataset, .. } | Self::Csv { dataset, .. } => {
                *dataset
            }
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { dataset, path } => {
                write!(f, "{dataset}: source file not found: {}", path.display())
            }
            Self::Io {
                dataset,
                path,
                source,
            } => write!(f, "{dataset}: cannot read {}: {source}", path.display()),
            Self::Csv {
                dataset,
                path,
                source,
            } => write!(f, "{dataset}: bad CSV header in {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Missing { .. } => None,
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
        }
    }
}

/// Why a row contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// A key column is absent or empty.
    MissingKey(&'static str),
    /// The row's author is not in the graph.
    UnknownAuthor(String),
    /// The row's article is not in the graph.
    UnknownArticle(String),
    /// The record did not deserialize.
    Malformed(String),
}

impl Skip {
    /// Stable label used to group skips in summaries.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingKey(_) => "missing key",
            Self::UnknownAuthor(_) => "unknown author",
            Self::UnknownArticle(_) => "unknown article",
            Self::Malformed(_) => "malformed row",
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(column) => write!(f, "no {column}"),
            Self::UnknownAuthor(name) => write!(f, "author {name} not loaded"),
            Self::UnknownArticle(name) => write!(f, "article {name} not loaded"),
            Self::Malformed(msg) => write!(f, "malformed: {msg}"),
        }
    }
}

/// Row accounting for one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub read: usize,
    pub applied: usize,
    pub skipped: BTreeMap<&'static str, usize>,
}

impl Tally {
    pub fn skip(&mut self, skip: &Skip) {
        *self.skipped.entry(skip.reason()).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Stream up to `limit` rows of `path` into `apply`.
///
/// `apply` receives the zero-based row index and the deserialized record.
pub fn read_rows<R, F>(
    dataset: Dataset,
    path: &Path,
    limit: Option<usize>,
    bar: &ProgressBar,
    mut apply: F,
) -> Result<Tally, SourceError>
where
    R: DeserializeOwned,
    F: FnMut(usize, R) -> Result<(), Skip>,
{
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            SourceError::Missing {
                dataset,
                path: path.to_path_buf(),
            }
        } else {
            SourceError::Io {
                dataset,
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));
    let headers = reader
        .byte_headers()
        .map_err(|source| SourceError::Csv {
            dataset,
            path: path.to_path_buf(),
            source,
        })
        .map(lossy)?;

    let mut tally = Tally::default();
    for (index, record) in reader.byte_records().enumerate() {
        if limit.is_some_and(|max| index >= max) {
            break;
        }
        tally.read += 1;
        bar.inc(1);

        let outcome = record
            .map(|raw| lossy(&raw))
            .and_then(|row| row.deserialize::<R>(Some(&headers)))
            .map_err(|e| Skip::Malformed(e.to_string()))
            .and_then(|row| apply(index, row));
        match outcome {
            Ok(()) => tally.applied += 1,
            Err(skip) => {
                log::debug!("{dataset} row {}: {skip}", index + 1);
                tally.skip(&skip);
            }
        }
    }
    Ok(tally)
}

/// Decode a raw record field by field, replacing invalid UTF-8 with U+FFFD.
/// Extracts are not guaranteed to be UTF-8 throughout.
fn lossy(raw: &ByteRecord) -> StringRecord {
    raw.iter().map(String::from_utf8_lossy).collect()
}

/// Normalize a raw cell: trimmed, with empty and `nan` treated as absent.
pub fn clean(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(value.to_string())
    }
}

/// Serde adapter applying [`clean`] to an optional column.
///
/// Use together with `#[serde(default)]` so an absent column reads as `None`.
pub fn present<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.as_deref().and_then(clean))
}

/// Integer cell, also accepting float renderings such as `2015.0`.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Year or order cell. Anything that is not an integer in `i32` range is
/// reported as absent, never as zero.
pub fn parse_year(raw: &str) -> Option<i32> {
    parse_integer(raw).and_then(|n| i32::try_from(n).ok())
}

/// Source identifier with a float rendering (`123.0`) folded back to `123`.
pub fn identifier(raw: &str) -> String {
    match raw.strip_suffix(".0") {
        Some(head) if !head.is_empty() && head.bytes().all(|b| b.is_ascii_digit()) => {
            head.to_string()
        }
        _ => raw.to_string(),
    }
}
