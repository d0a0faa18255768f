use crate::collect::{CancelFlag, MAX_TRAVERSAL_DEPTH};
use crate::error::{Diagnostic, DiagnosticKind, Result};
use crate::filter::PathFilter;
use log;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Histogram key for files without an extension.
pub const NO_EXTENSION_KEY: &str = "no extension";

#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// `None` means unlimited. A directory at the boundary is rendered as a
    /// single line and not recursed into.
    pub max_depth: Option<usize>,
    /// `None` means unlimited. Entries beyond the cap collapse into one
    /// `+N more item(s)` summary line.
    pub max_entries: Option<usize>,
}

/// The tree is rendered directly during traversal; no node structure is
/// materialized. `directory_count` includes the root; `file_count` and
/// `extension_counts` cover only files that passed filtering and were
/// rendered.
#[derive(Debug, Clone, Default)]
pub struct TreeSummary {
    pub lines: Vec<String>,
    pub file_count: usize,
    pub directory_count: usize,
    pub extension_counts: HashMap<String, usize>,
    pub excluded_entries: usize,
}

struct VisibleEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
    is_symlink: bool,
}

/// Bounded depth-first rendering of a single root. Entries at each level are
/// filtered, then sorted lexicographically by name for a deterministic,
/// human-readable listing.
pub fn build_tree(
    root: &Path,
    options: &TreeOptions,
    filter: &PathFilter,
    cancel: &CancelFlag,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<TreeSummary> {
    log::debug!("Building tree for: {}", root.display());
    let mut summary = TreeSummary {
        directory_count: 1, // the root itself
        ..TreeSummary::default()
    };
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    summary.lines.push(format!("{}/", root_name));
    render_directory(root, "", 1, options, filter, cancel, diagnostics, &mut summary)?;
    log::debug!(
        "Tree built: {} file(s), {} directorie(s), {} excluded.",
        summary.file_count,
        summary.directory_count,
        summary.excluded_entries
    );
    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn render_directory(
    dir: &Path,
    prefix: &str,
    depth: usize,
    options: &TreeOptions,
    filter: &PathFilter,
    cancel: &CancelFlag,
    diagnostics: &mut Vec<Diagnostic>,
    summary: &mut TreeSummary,
) -> Result<()> {
    cancel.check()?;

    if depth > MAX_TRAVERSAL_DEPTH {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::RecursionLimit,
            dir.to_path_buf(),
            format!(
                "directory deeper than {} levels was not rendered",
                MAX_TRAVERSAL_DEPTH
            ),
        ));
        return Ok(());
    }

    let reader = match fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(e) => {
            log::warn!("Cannot list directory: {} ({})", dir.display(), e);
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnlistableDirectory,
                dir.to_path_buf(),
                e.to_string(),
            ));
            return Ok(());
        }
    };

    let mut entries = Vec::new();
    for entry_result in reader {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnlistableDirectory,
                    dir.to_path_buf(),
                    e.to_string(),
                ));
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if filter.is_excluded_name(&name) || filter.should_skip(&path).is_some() {
            summary.excluded_entries += 1;
            continue;
        }
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnreadableFile,
                    path.clone(),
                    e.to_string(),
                ));
                continue;
            }
        };
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            file_type.is_dir()
        };
        entries.push(VisibleEntry {
            name,
            path,
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let cap = options.max_entries.unwrap_or(usize::MAX);
    let visible = entries.len().min(cap);
    let truncated = entries.len() - visible;

    for (index, entry) in entries.iter().take(visible).enumerate() {
        // The truncation summary line occupies the last slot when present.
        let is_last = index + 1 == visible && truncated == 0;
        let connector = if is_last { "└── " } else { "├── " };
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        if entry.is_dir {
            summary.directory_count += 1;
            let at_depth_limit = options.max_depth.is_some_and(|limit| depth >= limit);
            if entry.is_symlink {
                // Symlinked directories are leaf entries, never followed.
                summary
                    .lines
                    .push(format!("{}{}{}/", prefix, connector, entry.name));
            } else if at_depth_limit {
                summary.lines.push(format!(
                    "{}{}{}/ (max depth reached)",
                    prefix, connector, entry.name
                ));
            } else {
                summary
                    .lines
                    .push(format!("{}{}{}/", prefix, connector, entry.name));
                render_directory(
                    &entry.path,
                    &child_prefix,
                    depth + 1,
                    options,
                    filter,
                    cancel,
                    diagnostics,
                    summary,
                )?;
            }
        } else {
            summary.file_count += 1;
            *summary
                .extension_counts
                .entry(extension_key(&entry.name))
                .or_insert(0) += 1;
            summary
                .lines
                .push(format!("{}{}{}", prefix, connector, entry.name));
        }
    }

    if truncated > 0 {
        summary
            .lines
            .push(format!("{}└── +{} more item(s)", prefix, truncated));
    }
    Ok(())
}

fn extension_key(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| NO_EXTENSION_KEY.to_string())
}
