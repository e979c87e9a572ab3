//! Typed, file-backed configuration. A missing or unparsable `ctx.toml` never
//! blocks `open` — every field defaults, matching the fallback behavior the
//! rest of this crate family expects from its config loaders.

use std::path::Path;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_row_cap() -> usize {
    10_000
}

fn default_debounce_ms() -> u64 {
    200
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtxConfig {
    #[serde(default)]
    pub cache_dir_override: Option<String>,
    #[serde(default = "default_true")]
    pub watch: bool,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default = "default_false")]
    pub load_dependencies: bool,
    #[serde(default = "default_row_cap")]
    pub row_cap: usize,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for CtxConfig {
    fn default() -> Self {
        CtxConfig {
            cache_dir_override: None,
            watch: true,
            use_cache: true,
            load_dependencies: false,
            row_cap: default_row_cap(),
            languages: Vec::new(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl CtxConfig {
    /// Load `<root>/ctx.toml`. Any I/O or parse failure logs a warning and
    /// falls back to [`CtxConfig::default`] rather than failing `open`.
    pub fn load(root: &Path) -> Self {
        let path = root.join("ctx.toml");
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to parse ctx.toml, using defaults");
                    CtxConfig::default()
                }
            },
            Err(_) => CtxConfig::default(),
        }
    }

    /// Base directory under which every local package's cache is mirrored
    /// by its path relative to `root`, or `None` when no override is in
    /// effect — in which case each package caches directly at
    /// `<package>/.ctx/` per §6. `CTX_CACHE_DIR` is the external-cache-root
    /// override (`$HOME/.ctx` by default, applied in `attach_external_caches`);
    /// it does not affect where local packages cache.
    pub fn cache_root_override(&self, _root: &Path) -> Option<std::path::PathBuf> {
        self.cache_dir_override.as_ref().map(std::path::PathBuf::from)
    }
}
