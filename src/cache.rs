//! Persistent travel-time cache.
//!
//! Maps a directional pair of rounded coordinates to the last observed travel
//! time in seconds. The whole table is loaded into memory when a planning
//! session starts and written back once per matrix build. Storage problems
//! never fail an ordering: a broken file loads as an empty cache and a failed
//! write is logged and dropped.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coordinate::Coordinate;
use crate::error::CacheError;

/// Decimal digits kept in cache keys (~1.1 m).
pub const DEFAULT_CACHE_PRECISION: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    origin: String,
    destination: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheEntry {
    seconds: i64,
    updated_at: i64,
}

/// One row of the backing CSV file. Extra columns are ignored.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    origin: String,
    destination: String,
    seconds: f64,
    #[serde(default)]
    updated_at: i64,
}

#[derive(Debug, Clone)]
pub struct CostCache {
    entries: HashMap<PairKey, CacheEntry>,
    path: Option<PathBuf>,
    precision: u32,
    dirty: bool,
}

impl Default for CostCache {
    fn default() -> Self {
        Self::in_memory(DEFAULT_CACHE_PRECISION)
    }
}

impl CostCache {
    /// Cache with no backing file; `flush` is a no-op.
    pub fn in_memory(precision: u32) -> Self {
        Self {
            entries: HashMap::new(),
            path: None,
            precision,
            dirty: false,
        }
    }

    /// Load every entry from `path`. A missing file yields an empty cache;
    /// an unreadable one does too, with a warning.
    pub fn load(path: impl Into<PathBuf>, precision: u32) -> Self {
        let path = path.into();
        let mut cache = Self {
            path: Some(path.clone()),
            ..Self::in_memory(precision)
        };

        if !path.exists() {
            debug!(path = %path.display(), "no cost cache yet, starting empty");
            return cache;
        }

        match read_records(&path) {
            Ok((records, skipped)) => {
                for record in records {
                    cache.entries.insert(
                        PairKey {
                            origin: record.origin,
                            destination: record.destination,
                        },
                        CacheEntry {
                            seconds: record.seconds.round() as i64,
                            updated_at: record.updated_at,
                        },
                    );
                }
                if skipped > 0 {
                    warn!(path = %path.display(), skipped, "skipped unreadable cost cache rows");
                }
                debug!(path = %path.display(), entries = cache.entries.len(), "loaded cost cache");
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cost cache unreadable, starting empty");
            }
        }

        cache
    }

    pub fn get(&self, origin: Coordinate, destination: Coordinate) -> Option<i64> {
        self.entries
            .get(&self.key(origin, destination))
            .map(|entry| entry.seconds)
    }

    /// Insert or overwrite the cost for `origin → destination`.
    pub fn put(&mut self, origin: Coordinate, destination: Coordinate, seconds: i64) {
        let key = self.key(origin, destination);
        self.entries.insert(
            key,
            CacheEntry {
                seconds,
                updated_at: chrono::Utc::now().timestamp(),
            },
        );
        self.dirty = true;
    }

    /// Persist the table if anything changed since the last flush.
    ///
    /// Returns `true` when the file was written.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        let Some(path) = self.path.clone() else {
            return false;
        };

        match self.write_to(&path) {
            Ok(()) => {
                self.dirty = false;
                debug!(path = %path.display(), entries = self.entries.len(), "flushed cost cache");
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to persist cost cache");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn key(&self, origin: Coordinate, destination: Coordinate) -> PairKey {
        PairKey {
            origin: origin.cache_key(self.precision),
            destination: destination.cache_key(self.precision),
        }
    }

    fn write_to(&self, path: &Path) -> Result<(), CacheError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            let mut rows: Vec<_> = self.entries.iter().collect();
            rows.sort_by(|a, b| {
                (&a.0.origin, &a.0.destination).cmp(&(&b.0.origin, &b.0.destination))
            });
            for (key, entry) in rows {
                writer.serialize(CacheRecord {
                    origin: key.origin.clone(),
                    destination: key.destination.clone(),
                    seconds: entry.seconds as f64,
                    updated_at: entry.updated_at,
                })?;
            }
            writer.flush()?;
        }
        fs::rename(tmp_path, path)?;
        Ok(())
    }
}

fn read_records(path: &Path) -> Result<(Vec<CacheRecord>, usize), CacheError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut records = Vec::new();
    let mut skipped = 0;

    for row in reader.deserialize::<CacheRecord>() {
        match row {
            Ok(record) if record.seconds.is_finite() && record.seconds.round() >= 1.0 => {
                records.push(record)
            }
            Err(err) if err.is_io_error() => return Err(err.into()),
            _ => skipped += 1,
        }
    }

    Ok((records, skipped))
}
