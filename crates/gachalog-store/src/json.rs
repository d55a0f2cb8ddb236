//! Per-pool JSON logs, one `GachaLog<pool>.json` file per pool.
//!
//! Each file is a tab-indented JSON array of flat string objects, newest
//! draw first. Writes go through a temp file in the same directory and are
//! renamed into place, so an interrupted run never leaves a truncated log.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use gachalog_core::{DrawRecord, StoreConfig};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::StoreError;

/// A pool's persisted history as read back from disk.
///
/// `records` is `None` when the file is missing or unreadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLog {
    pub name: String,
    pub records: Option<Vec<DrawRecord>>,
}

pub struct JsonStore {
    config: StoreConfig,
}

impl JsonStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn path_for(&self, pool: &str) -> PathBuf {
        self.config.pool_path(pool)
    }

    /// Overwrite a pool's log with `records`.
    ///
    /// An empty list is never written: the previous file (if any) is left as
    /// it was and `Ok(None)` is returned. Otherwise returns the written path.
    pub fn save_pool(&self, pool: &str, records: &[DrawRecord]) -> Result<Option<PathBuf>, StoreError> {
        let path = self.path_for(pool);
        if records.is_empty() {
            info!(pool, path = %path.display(), "nothing to save, keeping existing log");
            return Ok(None);
        }

        let dir = parent_dir(&path);
        fs::create_dir_all(dir).map_err(io_err(dir))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err(dir))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let mut ser = serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"\t"));
            records.serialize(&mut ser).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;
            writer.flush().map_err(io_err(&path))?;
        }
        tmp.persist(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        info!(pool, count = records.len(), path = %path.display(), "saved pool log");
        Ok(Some(path))
    }

    /// Read a pool's log, surfacing why it could not be read.
    pub fn try_load_pool(&self, pool: &str) -> Result<Vec<DrawRecord>, StoreError> {
        let path = self.path_for(pool);
        let text = fs::read_to_string(&path).map_err(io_err(&path))?;
        let values: Vec<Value> = serde_json::from_str(&text).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        DrawRecord::from_values(values, self.config.field_policy)
            .map_err(|source| StoreError::Decode { path, source })
    }

    /// Read a pool's log for merging.
    ///
    /// Only a missing file is `Ok(None)`; a log that exists but cannot be
    /// read or decoded is an error, so the caller never overwrites it.
    pub fn load_existing(&self, pool: &str) -> Result<Option<Vec<DrawRecord>>, StoreError> {
        match self.try_load_pool(pool) {
            Ok(records) => Ok(Some(records)),
            Err(StoreError::Io { source, path }) if source.kind() == io::ErrorKind::NotFound => {
                info!(pool, path = %path.display(), "no saved log");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Read a pool's log; a missing or malformed file is `None`.
    pub fn load_pool(&self, pool: &str) -> Option<Vec<DrawRecord>> {
        match self.load_existing(pool) {
            Ok(records) => records,
            Err(e) => {
                warn!(pool, error = %e, "ignoring unreadable log");
                None
            }
        }
    }

    /// Load every named pool. Each pool succeeds or fails on its own.
    pub fn load_pools<S: AsRef<str>>(&self, names: &[S]) -> Vec<PoolLog> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                PoolLog {
                    name: name.to_string(),
                    records: self.load_pool(name),
                }
            })
            .collect()
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
