//! Renders the discovered-package list for `ctx list-packages`.

use ctx_index::DiscoveredPackage;

use crate::OutputFormat;

pub fn format_packages(packages: &[DiscoveredPackage], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if packages.is_empty() {
                return "(no packages discovered)\n".to_owned();
            }
            let mut out = String::new();
            for pkg in packages {
                out.push_str(&format!(
                    "{} [{}] {}\n",
                    pkg.name,
                    pkg.language_id,
                    pkg.path.display()
                ));
            }
            out
        }
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = packages
                .iter()
                .map(|pkg| {
                    serde_json::json!({
                        "name": pkg.name,
                        "language_id": pkg.language_id,
                        "path": pkg.path.to_string_lossy(),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&items).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> Vec<DiscoveredPackage> {
        vec![DiscoveredPackage {
            name: "app".to_owned(),
            path: PathBuf::from("/repo/app"),
            language_id: "dart".to_owned(),
        }]
    }

    #[test]
    fn text_lists_name_language_and_path() {
        let text = format_packages(&sample(), OutputFormat::Text);
        assert!(text.contains("app [dart] /repo/app"));
    }

    #[test]
    fn empty_list_renders_placeholder() {
        let text = format_packages(&[], OutputFormat::Text);
        assert_eq!(text, "(no packages discovered)\n");
    }

    #[test]
    fn json_lists_every_field() {
        let json = format_packages(&sample(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["name"], "app");
    }
}
