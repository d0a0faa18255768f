//! One-invocation orchestration: build the filter, collect the selection,
//! read and classify file content, render the overview and compose the final
//! document. The engine never writes the document; the caller performs the
//! single whole-file write as the very last step.

use crate::binary;
use crate::collect::{self, CancelFlag};
use crate::config::Config;
use crate::document;
use crate::error::{AppError, Diagnostic, DiagnosticKind, Result};
use crate::filter::PathFilter;
use crate::overview;
use chrono::{DateTime, Utc};
use log;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct RunReport {
    /// The composed document content, or `None` when there was nothing to do
    /// (no file content and no overview block were produced).
    pub document: Option<String>,
    pub document_path: PathBuf,
    pub appended_files: usize,
    pub binary_skipped: usize,
    pub vcs_excluded: usize,
    pub tool_excluded: usize,
    pub directories_scanned: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn run_invocation(
    workspace_root: &Path,
    selections: &[PathBuf],
    config: &Config,
    cancel: &CancelFlag,
    generated_at: DateTime<Utc>,
) -> Result<RunReport> {
    if !workspace_root.is_dir() {
        return Err(AppError::InvalidArgument(format!(
            "workspace root is not a directory: {}",
            workspace_root.display()
        )));
    }

    let filter = PathFilter::from_workspace(workspace_root, &config.overview.excluded_dirs)?;
    let mut diagnostics = Vec::new();

    let absolute_selections: Vec<PathBuf> = selections
        .iter()
        .map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                workspace_root.join(p)
            }
        })
        .collect();

    let (mut files, stats) =
        collect::collect_selection(&absolute_selections, &filter, cancel, &mut diagnostics)?;
    // The collector guarantees uniqueness, not order; sort for a
    // deterministic document.
    files.sort();
    log::info!(
        "Collected {} file(s) from {} selection(s).",
        files.len(),
        absolute_selections.len()
    );

    let mut sections = String::new();
    let mut appended_files = 0usize;
    let mut binary_skipped = 0usize;
    for path in &files {
        cancel.check()?;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Skipping unreadable file: {} ({})", path.display(), e);
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnreadableFile,
                    path.clone(),
                    e.to_string(),
                ));
                continue;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("Skipping non-UTF-8 file: {} ({})", path.display(), e);
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NonUtf8File,
                    path.clone(),
                    e.to_string(),
                ));
                continue;
            }
        };
        if binary::is_binary_text(&content) {
            log::debug!("Skipping binary-like file: {}", path.display());
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::BinarySkipped,
                path.clone(),
                "content classified as binary",
            ));
            binary_skipped += 1;
            continue;
        }

        let relative =
            pathdiff::diff_paths(path, workspace_root).unwrap_or_else(|| path.clone());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative.to_string_lossy().into_owned());
        sections.push_str(&document::format_file_section(
            &file_name,
            &relative.to_string_lossy(),
            &content,
        ));
        appended_files += 1;
    }

    let overview_block = if config.overview.enabled {
        Some(overview::render_overview(
            workspace_root,
            config,
            &filter,
            cancel,
            &mut diagnostics,
            generated_at,
        )?)
    } else {
        log::debug!("Overview block disabled.");
        None
    };

    let document_path = config.resolve_document_path(workspace_root);

    if sections.is_empty() && overview_block.is_none() {
        log::warn!("No file content and no overview produced; nothing to write.");
        return Ok(RunReport {
            document: None,
            document_path,
            appended_files,
            binary_skipped,
            vcs_excluded: filter.vcs_excluded(),
            tool_excluded: filter.tool_excluded(),
            directories_scanned: stats.directories_scanned,
            diagnostics,
        });
    }

    let existing = match fs::read_to_string(&document_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!(
                "No existing document at {}, starting fresh.",
                document_path.display()
            );
            String::new()
        }
        Err(e) => {
            return Err(AppError::FileRead {
                path: document_path,
                source: e,
            });
        }
    };

    let composed = document::compose_document(&existing, overview_block.as_deref(), &sections);

    Ok(RunReport {
        document: Some(composed),
        document_path,
        appended_files,
        binary_skipped,
        vcs_excluded: filter.vcs_excluded(),
        tool_excluded: filter.tool_excluded(),
        directories_scanned: stats.directories_scanned,
        diagnostics,
    })
}
