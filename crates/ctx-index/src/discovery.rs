//! Package discovery: a marker-file breadth-first walk under a root,
//! generalized from per-build-tool detection to whatever marker each
//! registered [`LanguageBinding`] declares.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::binding::LanguageBinding;

const PRUNED_DIRS: &[&str] = &[".git", "build", "node_modules", ".ctx", ".dart_tool", "target"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPackage {
    pub name: String,
    pub path: PathBuf,
    pub language_id: String,
}

/// Breadth-first walk from `root`, pruning dot/build/cache directories,
/// emitting one [`DiscoveredPackage`] per directory containing a marker file
/// recognized by any of `bindings`. Path-sorted for determinism.
pub fn discover_packages(
    root: &Path,
    bindings: &[Box<dyn LanguageBinding>],
) -> Vec<DiscoveredPackage> {
    let mut found = Vec::new();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(dir) = queue.pop_front() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut subdirs = Vec::new();
        let mut marker_present = false;
        let mut matched_binding: Option<&dyn LanguageBinding> = None;

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if !PRUNED_DIRS.contains(&name.as_ref()) {
                    subdirs.push(path);
                }
            } else if file_type.is_file() {
                let file_name = entry.file_name();
                let file_name = file_name.to_string_lossy();
                for binding in bindings {
                    if binding.package_marker() == file_name {
                        marker_present = true;
                        matched_binding = Some(binding.as_ref());
                        break;
                    }
                }
            }
        }

        if marker_present {
            if let Some(binding) = matched_binding {
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "root".to_owned());
                found.push(DiscoveredPackage {
                    name,
                    path: dir.clone(),
                    language_id: binding.language_id().to_owned(),
                });
            }
        }

        for sub in subdirs {
            queue.push_back(sub);
        }
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}
