//! Durable cache: a binary dump of a [`ScipIndex`]'s documents plus a JSON
//! manifest of per-file content hashes, so a cold start can skip re-indexing
//! unchanged files.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::hash::hash_file;
use crate::index::ScipIndex;
use crate::model::Document;

/// Bumped whenever the on-disk manifest or dump shape changes incompatibly.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub indexer_version: String,
    pub files: HashMap<String, String>,
    pub generated_at: String,
}

impl Manifest {
    pub fn new(indexer_version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Manifest {
            schema_version: SCHEMA_VERSION,
            indexer_version: indexer_version.into(),
            files: HashMap::new(),
            generated_at: generated_at.into(),
        }
    }
}

/// UTC timestamp in ISO-8601 (`YYYY-MM-DDTHH:MM:SSZ`), dependency-free.
pub fn iso8601_now() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let days_since_epoch = secs / 86400;
    let time_of_day = secs % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;
    let (year, month, day) = days_to_ymd(days_since_epoch);
    format!(
        "{year:04}-{month:02}-{day:02}T{hours:02}:{minutes:02}:{seconds:02}Z"
    )
}

fn days_to_ymd(mut days: u64) -> (u64, u64, u64) {
    let mut year = 1970;
    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }
    let months: [u64; 12] = if is_leap(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };
    let mut month = 1;
    for &m in &months {
        if days < m {
            break;
        }
        days -= m;
        month += 1;
    }
    (year, month, days + 1)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Outcome of [`load`]: the index reconstructed from cached documents, plus
/// which tracked paths are stale (hash mismatch) or removed (no longer exist).
pub struct LoadOutcome {
    pub index: ScipIndex,
    pub stale_paths: Vec<String>,
    pub removed_paths: Vec<String>,
}

fn dump_path(cache_dir: &Path) -> PathBuf {
    // Named `index.scip` to match the on-disk layout in the public cache
    // contract; the bytes are a JSON dump of the reconstructed `Document`s
    // (per the in-memory format below), not the raw SCIP protobuf stream —
    // re-deriving `symbols_by_id`/`name_index`/etc. from a flat document
    // list on load is simpler than replaying the original protobuf, and the
    // two are interchangeable since `update_document` is the only way either
    // format reaches the index.
    cache_dir.join("index.scip")
}

fn manifest_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("manifest.json")
}

fn lock_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(".lock")
}

/// Open (creating if needed) `<cache_dir>/.lock` and take an advisory lock on
/// it so two `Context`s opened against the same package never interleave a
/// manifest read with another's write. Shared for readers, exclusive for
/// writers; released when the returned `File` is dropped.
fn acquire_lock(cache_dir: &Path, exclusive: bool) -> Option<File> {
    std::fs::create_dir_all(cache_dir).ok()?;
    let file = File::create(lock_path(cache_dir)).ok()?;
    let result = if exclusive {
        file.lock_exclusive()
    } else {
        file.lock_shared()
    };
    result.ok()?;
    Some(file)
}

/// Load a cache directory. Any structural problem (missing files, corrupt
/// JSON, or a schema/indexer version mismatch) is treated as "no usable
/// cache" rather than a hard error: the caller gets an empty index and every
/// path it knows about marked stale, forcing a full rebuild.
pub fn load(
    cache_dir: &Path,
    indexer_version: &str,
    package_root: &Path,
) -> Result<LoadOutcome, CacheError> {
    let manifest_file = manifest_path(cache_dir);
    let dump_file = dump_path(cache_dir);

    // A missing cache dir has nothing to lock and nothing to read; fall
    // through to the empty-index path below without creating one on a
    // read-only open.
    let _lock = if cache_dir.exists() {
        acquire_lock(cache_dir, false)
    } else {
        None
    };

    let manifest: Option<Manifest> = (|| {
        let bytes = std::fs::read(&manifest_file).ok()?;
        serde_json::from_slice(&bytes).ok()
    })();

    let Some(manifest) = manifest else {
        return Ok(LoadOutcome {
            index: ScipIndex::new(),
            stale_paths: Vec::new(),
            removed_paths: Vec::new(),
        });
    };

    if manifest.schema_version != SCHEMA_VERSION || manifest.indexer_version != indexer_version {
        tracing::warn!(
            cache_schema = manifest.schema_version,
            expected_schema = SCHEMA_VERSION,
            "cache schema/version mismatch, discarding cache"
        );
        return Ok(LoadOutcome {
            index: ScipIndex::new(),
            stale_paths: Vec::new(),
            removed_paths: Vec::new(),
        });
    }

    let documents: Vec<Document> = match std::fs::read(&dump_file) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(docs) => docs,
            Err(_) => {
                tracing::warn!("corrupt cache dump, discarding cache");
                return Ok(LoadOutcome {
                    index: ScipIndex::new(),
                    stale_paths: Vec::new(),
                    removed_paths: Vec::new(),
                });
            }
        },
        Err(_) => {
            return Ok(LoadOutcome {
                index: ScipIndex::new(),
                stale_paths: Vec::new(),
                removed_paths: Vec::new(),
            })
        }
    };

    let mut stale_paths = Vec::new();
    let mut removed_paths = Vec::new();
    let mut keep = Vec::new();

    for doc in documents {
        let abs = package_root.join(&doc.relative_path);
        match manifest.files.get(&doc.relative_path) {
            Some(expected_hash) => match hash_file(&abs) {
                Ok(actual) if &actual == expected_hash => keep.push(doc),
                Ok(_) => stale_paths.push(doc.relative_path),
                Err(_) => removed_paths.push(doc.relative_path),
            },
            None => stale_paths.push(doc.relative_path),
        }
    }

    Ok(LoadOutcome {
        index: ScipIndex::from_documents(keep),
        stale_paths,
        removed_paths,
    })
}

/// Load a pre-computed external cache (sdk/framework/hosted/git) without
/// hash-checking: these are read-only snapshots with no corresponding
/// source tree to re-hash against, so a successfully-parsed dump is always
/// treated as valid. Corrupt or missing dumps return `None`.
pub fn load_external(cache_dir: &Path) -> Option<ScipIndex> {
    let bytes = std::fs::read(dump_path(cache_dir)).ok()?;
    let documents: Vec<Document> = serde_json::from_slice(&bytes).ok()?;
    Some(ScipIndex::from_documents(documents))
}

/// Serialize `index` and `manifest` atomically: write to a tempfile in the
/// same directory, then rename over the target. A reader never observes a
/// half-written cache.
pub fn save(cache_dir: &Path, index: &ScipIndex, manifest: &Manifest) -> Result<(), CacheError> {
    std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
        path: cache_dir.to_path_buf(),
        source: e,
    })?;
    let _lock = acquire_lock(cache_dir, true);

    let docs = index.documents();
    let dump_bytes = serde_json::to_vec(&docs).map_err(CacheError::Serialize)?;
    atomic_write(&dump_path(cache_dir), &dump_bytes)?;

    let manifest_bytes = serde_json::to_vec_pretty(manifest).map_err(CacheError::Serialize)?;
    atomic_write(&manifest_path(cache_dir), &manifest_bytes)?;

    Ok(())
}

fn atomic_write(target: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(
        ".{}.tmp",
        target.file_name().and_then(|n| n.to_str()).unwrap_or("cache")
    ));
    std::fs::write(&tmp, bytes).map_err(|e| CacheError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, target).map_err(|e| CacheError::Io {
        path: target.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
