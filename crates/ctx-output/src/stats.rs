//! Renders [`ctx_watch::ContextStats`] for `.stats` and the CLI's default
//! startup banner.

use ctx_watch::ContextStats;

use crate::OutputFormat;

pub fn format_stats(stats: &ContextStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "{} package(s), {} file(s), {} symbol(s), {} occurrence(s), {} relationship(s)\n",
            stats.packages, stats.files, stats.symbols, stats.occurrences, stats.relationships
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "packages": stats.packages,
            "files": stats.files,
            "symbols": stats.symbols,
            "occurrences": stats.occurrences,
            "relationships": stats.relationships,
        }))
        .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_stats_mentions_every_count() {
        let stats = ContextStats {
            files: 3,
            symbols: 10,
            occurrences: 20,
            relationships: 5,
            packages: 1,
        };
        let text = format_stats(&stats, OutputFormat::Text);
        assert!(text.contains("1 package"));
        assert!(text.contains("10 symbol"));
    }

    #[test]
    fn json_stats_round_trips_counts() {
        let stats = ContextStats {
            files: 3,
            symbols: 10,
            occurrences: 20,
            relationships: 5,
            packages: 1,
        };
        let json = format_stats(&stats, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["symbols"], 10);
    }
}
