use crate::collect::CancelFlag;
use crate::config::{Config, OverviewTemplate, workspace_name};
use crate::document::{OVERVIEW_END_MARKER, OVERVIEW_START_MARKER};
use crate::error::{Diagnostic, Result};
use crate::filter::PathFilter;
use crate::tree::{self, NO_EXTENSION_KEY, TreeOptions};
use chrono::{DateTime, Utc};
use log;
use std::collections::HashMap;
use std::path::Path;

pub const TREE_HEADING: &str = "PROJECT TREE:";
pub const FILE_TYPES_HEADING: &str = "FILE TYPES:";

const MAX_HISTOGRAM_ROWS: usize = 8;

/// Renders the delimited overview block. The template gates which sections
/// may appear; the `include_metadata`/`include_tree` switches further
/// restrict them. The generation timestamp is supplied by the caller so the
/// render is a pure function of its inputs.
pub fn render_overview(
    root: &Path,
    config: &Config,
    filter: &PathFilter,
    cancel: &CancelFlag,
    diagnostics: &mut Vec<Diagnostic>,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let overview = &config.overview;
    let with_metadata = overview.include_metadata
        && matches!(
            overview.template,
            OverviewTemplate::Full | OverviewTemplate::MetadataOnly | OverviewTemplate::Summary
        );
    let with_tree = overview.include_tree
        && matches!(
            overview.template,
            OverviewTemplate::Full | OverviewTemplate::TreeOnly
        );
    let with_histogram = overview.template == OverviewTemplate::Summary && with_metadata;

    // Metadata totals come from the same bounded traversal as the tree, so
    // tree-less templates still walk the workspace to count.
    let summary = if with_metadata || with_tree {
        let options = TreeOptions {
            max_depth: overview.effective_max_depth(),
            max_entries: overview.effective_max_entries(),
        };
        Some(tree::build_tree(root, &options, filter, cancel, diagnostics)?)
    } else {
        log::debug!("All overview sections disabled; rendering empty block.");
        None
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push(OVERVIEW_START_MARKER.to_string());

    let mut metadata_emitted = false;
    if with_metadata {
        let summary = summary.as_ref().expect("traversal ran for metadata");
        lines.push(format!("Project: {}", workspace_name(root)));
        lines.push(format!("Root: {}", root.display()));
        lines.push(format!(
            "Generated: {}",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(format!("Directories: {}", summary.directory_count));
        lines.push(format!("Files: {}", summary.file_count));
        metadata_emitted = true;
    }

    if with_histogram {
        if let Some(summary) = summary.as_ref() {
            let rows = histogram_rows(&summary.extension_counts);
            if !rows.is_empty() {
                lines.push(String::new());
                lines.push(FILE_TYPES_HEADING.to_string());
                lines.extend(rows);
            }
        }
    }

    if with_tree {
        let summary = summary.as_ref().expect("traversal ran for tree");
        if !summary.lines.is_empty() {
            if metadata_emitted {
                lines.push(String::new());
            }
            lines.push(TREE_HEADING.to_string());
            lines.extend(summary.lines.iter().cloned());
        }
    }

    if let Some(summary) = summary.as_ref() {
        if summary.excluded_entries > 0 {
            lines.push(format!("Excluded entries: {}", summary.excluded_entries));
        }
    }

    lines.push(OVERVIEW_END_MARKER.to_string());
    let mut block = lines.join("\n");
    // The block always ends with the end marker followed by a blank line.
    block.push('\n');
    block.push('\n');
    Ok(block)
}

/// Descending by count, name ascending on ties, capped at eight rows with a
/// trailing remainder row.
fn histogram_rows(counts: &HashMap<String, usize>) -> Vec<String> {
    let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut rows = Vec::new();
    for (key, count) in entries.iter().take(MAX_HISTOGRAM_ROWS) {
        let label = if key.as_str() == NO_EXTENSION_KEY {
            (*key).clone()
        } else {
            format!(".{}", key)
        };
        rows.push(format!("  {}: {}", label, count));
    }
    if entries.len() > MAX_HISTOGRAM_ROWS {
        rows.push(format!(
            "  +{} other extensions",
            entries.len() - MAX_HISTOGRAM_ROWS
        ));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::filter::{IgnoreMatcher, NameExclusions, PathFilter};
    use chrono::TimeZone;
    use std::fs::File;
    use std::io::Write;

    fn config_filter(root: &Path, config: &Config) -> PathFilter {
        PathFilter::new(
            root,
            IgnoreMatcher::compile(root, &[]).unwrap(),
            IgnoreMatcher::compile(root, &[]).unwrap(),
            NameExclusions::compile(&config.overview.excluded_dirs).unwrap(),
        )
    }

    fn touch(path: &Path) {
        let mut file = File::create(path).unwrap();
        file.write_all(b"x").unwrap();
    }

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 0).unwrap()
    }

    fn render(root: &Path, config: &Config) -> String {
        let filter = config_filter(root, config);
        render_overview(
            root,
            config,
            &filter,
            &CancelFlag::new(),
            &mut Vec::new(),
            fixed_timestamp(),
        )
        .unwrap()
    }

    #[test]
    fn full_template_has_metadata_then_tree() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.rs"));

        let block = render(dir.path(), &Config::default());
        assert!(block.starts_with(&format!("{}\n", OVERVIEW_START_MARKER)));
        assert!(block.ends_with(&format!("{}\n\n", OVERVIEW_END_MARKER)));
        assert!(block.contains("Project: "));
        assert!(block.contains("Generated: 2026-01-15 12:30:00 UTC"));
        assert!(block.contains("Directories: 1"));
        assert!(block.contains("Files: 1"));
        // Blank separator between metadata and the tree heading.
        assert!(block.contains(&format!("Files: 1\n\n{}\n", TREE_HEADING)));
        assert!(block.contains("└── a.rs"));
    }

    #[test]
    fn metadata_only_template_has_no_tree() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.rs"));

        let mut config = Config::default();
        config.overview.template = OverviewTemplate::MetadataOnly;
        let block = render(dir.path(), &config);
        assert!(block.contains("Files: 1"));
        assert!(!block.contains(TREE_HEADING));
    }

    #[test]
    fn include_tree_switch_restricts_the_full_template() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.rs"));

        let mut config = Config::default();
        config.overview.include_tree = false;
        let block = render(dir.path(), &config);
        assert!(block.contains("Files: 1"));
        assert!(!block.contains(TREE_HEADING));
    }

    #[test]
    fn all_sections_disabled_still_frames_the_markers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.overview.include_metadata = false;
        config.overview.include_tree = false;
        let block = render(dir.path(), &config);
        assert_eq!(
            block,
            format!("{}\n{}\n\n", OVERVIEW_START_MARKER, OVERVIEW_END_MARKER)
        );
    }

    #[test]
    fn summary_template_renders_the_histogram() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.rs"));
        touch(&dir.path().join("b.rs"));
        touch(&dir.path().join("c.toml"));

        let mut config = Config::default();
        config.overview.template = OverviewTemplate::Summary;
        let block = render(dir.path(), &config);
        assert!(block.contains(FILE_TYPES_HEADING));
        assert!(block.contains("  .rs: 2"));
        assert!(block.contains("  .toml: 1"));
        assert!(!block.contains(TREE_HEADING));
    }

    #[test]
    fn histogram_caps_at_eight_rows_with_remainder() {
        let mut counts = HashMap::new();
        for i in 0..10 {
            counts.insert(format!("ext{}", i), 10 - i);
        }
        let rows = histogram_rows(&counts);
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0], "  .ext0: 10");
        assert_eq!(rows.last().unwrap(), "  +2 other extensions");
    }

    #[test]
    fn histogram_sorts_ties_by_name() {
        let mut counts = HashMap::new();
        counts.insert("rs".to_string(), 2);
        counts.insert("md".to_string(), 2);
        counts.insert(NO_EXTENSION_KEY.to_string(), 5);
        let rows = histogram_rows(&counts);
        assert_eq!(rows, ["  no extension: 5", "  .md: 2", "  .rs: 2"]);
    }

    #[test]
    fn rendering_twice_with_fixed_clock_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.rs"));
        let config = Config::default();
        let first = render(dir.path(), &config);
        let second = render(dir.path(), &config);
        assert_eq!(first, second);
    }

    #[test]
    fn excluded_entries_line_trails_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("keep.rs"));
        let modules = dir.path().join("node_modules");
        std::fs::create_dir(&modules).unwrap();

        let block = render(dir.path(), &Config::default());
        assert!(block.contains("Excluded entries: 1"));
        // Trailing: after the tree lines, before the end marker.
        let excluded_pos = block.find("Excluded entries:").unwrap();
        let tree_pos = block.find(TREE_HEADING).unwrap();
        let end_pos = block.find(OVERVIEW_END_MARKER).unwrap();
        assert!(tree_pos < excluded_pos && excluded_pos < end_pos);
    }
}
