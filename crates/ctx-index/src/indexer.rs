//! Per-package orchestrator: initial build, incremental single-file update,
//! and cache persistence.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ctx_core::cache::{self, Manifest};
use ctx_core::hash::hash_file;
use ctx_core::model::documents_from_scip_index;
use ctx_core::ScipIndex;
use rayon::prelude::*;
use tokio::sync::broadcast;

use crate::binding::LanguageBinding;

const DEBOUNCE_SAVE: Duration = Duration::from_millis(500);
const RETRY_BACKOFF_BASE_MS: u64 = 100;
const RETRY_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub enum IndexUpdate {
    InitialIndex { file_count: usize, symbol_count: usize },
    FileUpdated { path: String },
    FileRemoved { path: String },
    IndexError { path: String, message: String },
}

pub struct Indexer {
    root: PathBuf,
    package_name: String,
    binding: Arc<dyn LanguageBinding>,
    index: Arc<ScipIndex>,
    cache_dir: PathBuf,
    indexer_version: String,
    updates: broadcast::Sender<IndexUpdate>,
    manifest: Mutex<Manifest>,
    last_change: Arc<Mutex<Instant>>,
}

/// A binding that never produces SCIP; used to wrap an already-populated
/// [`ScipIndex`] (cache replay, projection tests) where no producer is
/// needed because nothing will ever be reindexed.
struct NullBinding;

impl LanguageBinding for NullBinding {
    fn language_id(&self) -> &str {
        "none"
    }
    fn extensions(&self) -> &[&str] {
        &[]
    }
    fn package_marker(&self) -> &str {
        ""
    }
    fn produce_scip_for_file(
        &self,
        file: &Path,
    ) -> Result<Vec<u8>, crate::binding::ScipProductionError> {
        Err(crate::binding::ScipProductionError {
            path: file.display().to_string(),
            message: "NullBinding never produces SCIP".to_owned(),
        })
    }
}

impl Indexer {
    /// Wrap an already-built index under `package_name`, skipping the open
    /// protocol entirely. Used by the projection and registry to construct
    /// fixtures without a real [`LanguageBinding`].
    pub fn from_index(root: PathBuf, package_name: String, index: Arc<ScipIndex>) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Indexer {
            root,
            package_name,
            binding: Arc::new(NullBinding),
            index,
            cache_dir: PathBuf::new(),
            indexer_version: "test".to_owned(),
            updates: tx,
            manifest: Mutex::new(Manifest::new("test", now_timestamp())),
            last_change: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn index(&self) -> Arc<ScipIndex> {
        self.index.clone()
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IndexUpdate> {
        self.updates.subscribe()
    }

    /// Run the full open protocol: load cache, enumerate files, reindex
    /// stale/new/changed paths, drop removed ones, save, emit `InitialIndex`.
    pub fn open(
        root: PathBuf,
        package_name: String,
        binding: Arc<dyn LanguageBinding>,
        cache_dir: PathBuf,
        indexer_version: String,
        use_cache: bool,
    ) -> Self {
        let (index, stale, removed, manifest) = if use_cache {
            match cache::load(&cache_dir, &indexer_version, &root) {
                Ok(outcome) => {
                    let mut manifest = Manifest::new(indexer_version.clone(), now_timestamp());
                    for path in outcome.index.files() {
                        if let Ok(hash) = hash_file(&root.join(&path)) {
                            manifest.files.insert(path, hash);
                        }
                    }
                    (outcome.index, outcome.stale_paths, outcome.removed_paths, manifest)
                }
                Err(_) => (
                    ScipIndex::new(),
                    Vec::new(),
                    Vec::new(),
                    Manifest::new(indexer_version.clone(), now_timestamp()),
                ),
            }
        } else {
            (
                ScipIndex::new(),
                Vec::new(),
                Vec::new(),
                Manifest::new(indexer_version.clone(), now_timestamp()),
            )
        };

        let (tx, _rx) = broadcast::channel(256);
        let indexer = Indexer {
            root,
            package_name,
            binding,
            index: Arc::new(index),
            cache_dir,
            indexer_version,
            updates: tx,
            manifest: Mutex::new(manifest),
            last_change: Arc::new(Mutex::new(Instant::now())),
        };

        let enumerated = indexer.enumerate_source_files();
        let enumerated_set: HashSet<String> = enumerated.iter().cloned().collect();
        let already_indexed: HashSet<String> = indexer.index.files().into_iter().collect();

        let mut to_reindex: Vec<String> = stale.into_iter().collect();
        for path in &enumerated_set {
            if !already_indexed.contains(path) {
                to_reindex.push(path.clone());
            }
        }
        to_reindex.sort();
        to_reindex.dedup();

        // Per-file SCIP production fan-out: each file's producer call and
        // `update_document` are independent (the index's write lock only
        // ever spans one document's map-swap), so the initial batch runs
        // across a rayon pool sized to `num_cpus` rather than one at a time.
        to_reindex.par_iter().for_each(|path| {
            indexer.reindex_file_with_retry(path);
        });
        for path in &removed {
            indexer.index.remove_document(path);
            indexer.manifest.lock().unwrap().files.remove(path);
        }

        indexer.save_cache();

        let stats = indexer.index.stats();
        let _ = indexer.updates.send(IndexUpdate::InitialIndex {
            file_count: stats.files,
            symbol_count: stats.symbols,
        });

        indexer
    }

    fn enumerate_source_files(&self) -> Vec<String> {
        let mut out = Vec::new();
        let extensions = self.binding.extensions();
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    let name = path.file_name().map(|n| n.to_string_lossy().to_string());
                    if name.as_deref() != Some(".ctx") && name.as_deref() != Some(".git") {
                        stack.push(path);
                    }
                } else if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    if extensions.contains(&ext) {
                        if let Ok(rel) = path.strip_prefix(&self.root) {
                            out.push(rel.to_string_lossy().replace('\\', "/"));
                        }
                    }
                }
            }
        }
        out.sort();
        out
    }

    fn reindex_file_with_retry(&self, relative_path: &str) {
        let abs = self.root.join(relative_path);
        let mut attempt = 0;
        loop {
            match self.binding.produce_scip_for_file(&abs) {
                Ok(bytes) => {
                    if let Err(message) = self.ingest_scip_bytes(relative_path, &bytes) {
                        let _ = self.updates.send(IndexUpdate::IndexError {
                            path: relative_path.to_owned(),
                            message,
                        });
                    }
                    return;
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= RETRY_MAX_ATTEMPTS {
                        let _ = self.updates.send(IndexUpdate::IndexError {
                            path: relative_path.to_owned(),
                            message: err.to_string(),
                        });
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(
                        RETRY_BACKOFF_BASE_MS * 2u64.pow(attempt - 1),
                    ));
                }
            }
        }
    }

    fn ingest_scip_bytes(&self, relative_path: &str, bytes: &[u8]) -> Result<(), String> {
        use protobuf::Message;
        let scip_index = scip::types::Index::parse_from_bytes(bytes)
            .map_err(|e| format!("invalid SCIP bytes for {relative_path}: {e}"))?;
        let docs = documents_from_scip_index(&scip_index);
        let doc = docs
            .into_iter()
            .find(|d| d.relative_path == relative_path)
            .unwrap_or_else(|| ctx_core::Document::new(relative_path));
        self.index
            .update_document(doc)
            .map_err(|e| format!("index invariant violation for {relative_path}: {e}"))?;
        if let Ok(hash) = hash_file(&self.root.join(relative_path)) {
            self.manifest
                .lock()
                .unwrap()
                .files
                .insert(relative_path.to_owned(), hash);
        }
        Ok(())
    }

    /// Recompute the file's hash; no-op if unchanged. Otherwise reindex and
    /// schedule a debounced cache save.
    pub fn update_file(&self, relative_path: &str) {
        let abs = self.root.join(relative_path);
        let unchanged = hash_file(&abs)
            .ok()
            .zip(self.manifest.lock().unwrap().files.get(relative_path).cloned())
            .map(|(new, old)| new == old)
            .unwrap_or(false);
        if unchanged {
            return;
        }
        self.reindex_file_with_retry(relative_path);
        let _ = self.updates.send(IndexUpdate::FileUpdated {
            path: relative_path.to_owned(),
        });
        *self.last_change.lock().unwrap() = Instant::now();
        self.schedule_debounced_save();
    }

    pub fn remove_file(&self, relative_path: &str) {
        self.index.remove_document(relative_path);
        self.manifest.lock().unwrap().files.remove(relative_path);
        let _ = self.updates.send(IndexUpdate::FileRemoved {
            path: relative_path.to_owned(),
        });
        *self.last_change.lock().unwrap() = Instant::now();
        self.schedule_debounced_save();
    }

    fn schedule_debounced_save(&self) {
        let index = self.index.clone();
        let cache_dir = self.cache_dir.clone();
        let manifest = self.manifest.lock().unwrap().clone();
        let last_change = self.last_change.clone();
        let marker = *last_change.lock().unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_SAVE).await;
            if *last_change.lock().unwrap() == marker {
                let _ = cache::save(&cache_dir, &index, &manifest);
            }
        });
    }

    pub fn save_cache(&self) {
        let manifest = self.manifest.lock().unwrap().clone();
        let _ = cache::save(&self.cache_dir, &self.index, &manifest);
    }
}

fn now_timestamp() -> String {
    ctx_core::cache::iso8601_now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct FixtureBinding;

    impl LanguageBinding for FixtureBinding {
        fn language_id(&self) -> &str {
            "fixture"
        }
        fn extensions(&self) -> &[&str] {
            &["fx"]
        }
        fn package_marker(&self) -> &str {
            "fixture.toml"
        }
        fn produce_scip_for_file(
            &self,
            _file: &Path,
        ) -> Result<Vec<u8>, crate::binding::ScipProductionError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn open_with_no_files_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = Indexer::open(
            dir.path().to_path_buf(),
            "pkg".to_owned(),
            Arc::new(FixtureBinding),
            dir.path().join(".ctx"),
            "v1".to_owned(),
            true,
        );
        assert_eq!(indexer.index().stats().files, 0);
    }

    #[tokio::test]
    async fn update_file_on_unwritten_path_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let indexer = Indexer::open(
            dir.path().to_path_buf(),
            "pkg".to_owned(),
            Arc::new(FixtureBinding),
            dir.path().join(".ctx"),
            "v1".to_owned(),
            true,
        );
        indexer.update_file("missing.fx");
        assert_eq!(indexer.index().stats().files, 0);
    }
}
