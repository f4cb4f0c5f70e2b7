//! On-disk ledger store.
//!
//! Layout: `{root}/{vendor}/{dataset}/{ticker}.csv` for per-entity
//! ledgers, `{root}/{vendor}/{dataset}/universe/{yyyyMMdd}.csv` for
//! per-date universe snapshots. No header rows; UTF-8; newline-delimited
//! with a trailing newline.
//!
//! Every merge re-reads the destination from disk, unions, sorts, and
//! rewrites the whole file through a `.tmp` sibling and an atomic rename.
//! Nothing is cached between calls, so a run that crashed or a process
//! restart cannot leave the store inconsistent with memory. One call owns
//! one file; concurrent runs against the same root are not supported.

use crate::merge::{ledger_date_key, leading_field, merge_lines};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The ledger store rooted at `{root}/{vendor}/{dataset}`.
pub struct LedgerStore {
    dataset_dir: PathBuf,
}

/// Shape of one ledger file, as reported by [`LedgerStore::stats`].
#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub entity: String,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Store-wide inventory.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub ledgers: Vec<LedgerStats>,
    pub universe_files: usize,
}

impl LedgerStore {
    pub fn new(root: impl Into<PathBuf>, vendor: &str, dataset: &str) -> Self {
        Self {
            dataset_dir: root.into().join(vendor).join(dataset),
        }
    }

    /// Directory all ledgers live under.
    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    /// Path of an entity's ledger file: `{dataset_dir}/{entity-lowercase}.csv`
    pub fn ledger_path(&self, entity: &str) -> PathBuf {
        self.dataset_dir
            .join(format!("{}.csv", entity.to_lowercase()))
    }

    fn universe_dir(&self) -> PathBuf {
        self.dataset_dir.join("universe")
    }

    /// Path of a date's universe snapshot: `{dataset_dir}/universe/{yyyyMMdd}.csv`
    pub fn universe_path(&self, date: NaiveDate) -> PathBuf {
        self.universe_dir()
            .join(format!("{}.csv", date.format("%Y%m%d")))
    }

    /// Merge rows into an entity's ledger, keeping it date-sorted.
    pub fn merge_ledger(&self, entity: &str, rows: Vec<String>) -> Result<PathBuf, StoreError> {
        let path = self.ledger_path(entity);
        self.merge_file(&path, rows, ledger_date_key)?;
        Ok(path)
    }

    /// Merge rows into a date's universe snapshot, keeping it sorted by
    /// entity identifier.
    pub fn merge_universe(
        &self,
        date: NaiveDate,
        rows: Vec<String>,
    ) -> Result<PathBuf, StoreError> {
        let path = self.universe_path(date);
        self.merge_file(&path, rows, leading_field)?;
        Ok(path)
    }

    fn merge_file<K, F>(&self, path: &Path, rows: Vec<String>, key: F) -> Result<(), StoreError>
    where
        K: Ord,
        F: Fn(&str) -> K,
    {
        let existing = read_lines(path)?;
        let merged = merge_lines(existing, rows, key);
        write_atomic(path, &merged)
    }

    /// Inventory the store: every ledger's row count and date span, plus
    /// how many universe snapshots exist. A store that does not exist yet
    /// reports as empty.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let mut stats = StoreStats::default();

        if !self.dataset_dir.exists() {
            return Ok(stats);
        }

        let read_err = |source| StoreError::Read {
            path: self.dataset_dir.clone(),
            source,
        };

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dataset_dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let entity = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let lines = read_lines(&path)?;
            stats.ledgers.push(LedgerStats {
                entity,
                rows: lines.len(),
                first_date: lines.first().map(|l| ledger_date_key(l)),
                last_date: lines.last().map(|l| ledger_date_key(l)),
            });
        }

        let universe_dir = self.universe_dir();
        if universe_dir.exists() {
            for entry in fs::read_dir(&universe_dir).map_err(read_err)? {
                let entry = entry.map_err(read_err)?;
                if entry.path().extension().and_then(|e| e.to_str()) == Some("csv") {
                    stats.universe_files += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// Read a ledger file as lines, dropping blank ones. A missing file is an
/// empty ledger.
fn read_lines(path: &Path) -> Result<Vec<String>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Write the full line set through a `.tmp` sibling and rename into place.
fn write_atomic(path: &Path, rows: &[String]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut content = rows.join("\n");
    content.push('\n');

    let tmp_path = path.with_extension("csv.tmp");
    fs::write(&tmp_path, content).map_err(write_err)?;

    fs::rename(&tmp_path, path).map_err(|source| {
        // Leave no stray temp file behind a failed rename.
        let _ = fs::remove_file(&tmp_path);
        write_err(source)
    })
}
