use crate::error::{AppError, Diagnostic, DiagnosticKind, Result};
use crate::filter::PathFilter;
use log;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Hard bound on recursion depth, independent of any configured tree limit.
/// Symlinked directories are never followed, so together these guarantee
/// termination on pathological trees.
pub const MAX_TRAVERSAL_DEPTH: usize = 200;

/// Cooperative cancellation flag, polled before every directory listing and
/// file read. Observing it aborts the whole invocation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub directories_scanned: usize,
    pub selections_resolved: usize,
}

/// Expands the selection roots into an ordered list of unique absolute file
/// paths. Selection roots are deduplicated before processing and the result
/// is deduplicated again (a file may be reachable both directly and via a
/// containing directory). Recursion follows filesystem enumeration order; the
/// caller sorts if it needs a display order.
pub fn collect_selection(
    selections: &[PathBuf],
    filter: &PathFilter,
    cancel: &CancelFlag,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Vec<PathBuf>, CollectionStats)> {
    let mut stats = CollectionStats::default();
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    let mut root_keys = HashSet::new();
    let mut roots = Vec::new();
    for selection in selections {
        if root_keys.insert(dedup_key(selection)) {
            roots.push(selection.clone());
        } else {
            log::debug!("Duplicate selection ignored: {}", selection.display());
        }
    }

    // Stat all roots up front so an entirely unresolvable selection fails
    // before any traversal work.
    let mut resolved = Vec::new();
    for root in &roots {
        match fs::metadata(root) {
            Ok(metadata) if metadata.is_file() || metadata.is_dir() => {
                resolved.push((root.clone(), metadata));
            }
            Ok(_) => {
                log::warn!("Selection is neither file nor directory: {}", root.display());
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvableSelection,
                    root.clone(),
                    "selection is neither a file nor a directory",
                ));
            }
            Err(e) => {
                log::warn!("Selection not accessible: {} ({})", root.display(), e);
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvableSelection,
                    root.clone(),
                    e.to_string(),
                ));
            }
        }
    }
    if resolved.is_empty() && !roots.is_empty() {
        return Err(AppError::InvalidArgument(
            "none of the selected paths resolve to a file or directory".to_string(),
        ));
    }
    stats.selections_resolved = resolved.len();

    for (root, metadata) in &resolved {
        // Explicit selection does not override ignore rules.
        if let Some(name) = root.file_name().and_then(|n| n.to_str()) {
            if filter.is_excluded_name(name) {
                log::debug!("Selection excluded by name rule: {}", root.display());
                continue;
            }
        }
        if let Some(source) = filter.should_skip(root) {
            log::debug!("Selection excluded by {:?}: {}", source, root.display());
            continue;
        }

        if metadata.is_file() {
            push_unique(&mut files, &mut seen, root.clone());
        } else {
            walk_directory(
                root,
                filter,
                cancel,
                diagnostics,
                &mut files,
                &mut seen,
                &mut stats,
                1,
            )?;
        }
    }

    log::debug!(
        "Collection complete: {} file(s) from {} directory listing(s).",
        files.len(),
        stats.directories_scanned
    );
    Ok((files, stats))
}

fn walk_directory(
    dir: &Path,
    filter: &PathFilter,
    cancel: &CancelFlag,
    diagnostics: &mut Vec<Diagnostic>,
    files: &mut Vec<PathBuf>,
    seen: &mut HashSet<String>,
    stats: &mut CollectionStats,
    depth: usize,
) -> Result<()> {
    cancel.check()?;

    if depth > MAX_TRAVERSAL_DEPTH {
        log::warn!("Recursion limit reached at: {}", dir.display());
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::RecursionLimit,
            dir.to_path_buf(),
            format!(
                "directory deeper than {} levels was not traversed",
                MAX_TRAVERSAL_DEPTH
            ),
        ));
        return Ok(());
    }

    // An unlistable directory is recovered locally: siblings keep going.
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
    stats.directories_scanned += 1;

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
        let path = entry.path();
        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            if filter.is_excluded_name(name) {
                log::trace!("Entry excluded by name rule: {}", path.display());
                continue;
            }
        }
        // Filtered before descending, so an ignored subtree is pruned whole.
        if filter.should_skip(&path).is_some() {
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
        if file_type.is_symlink() {
            log::trace!("Symlink not followed: {}", path.display());
            continue;
        }
        if file_type.is_dir() {
            walk_directory(&path, filter, cancel, diagnostics, files, seen, stats, depth + 1)?;
        } else if file_type.is_file() {
            push_unique(files, seen, path);
        }
    }
    Ok(())
}

fn push_unique(files: &mut Vec<PathBuf>, seen: &mut HashSet<String>, path: PathBuf) {
    if seen.insert(dedup_key(&path)) {
        files.push(path);
    } else {
        log::trace!("Duplicate file skipped: {}", path.display());
    }
}

/// Uniqueness is case-insensitive on filesystems that are.
fn dedup_key(path: &Path) -> String {
    let key = path.to_string_lossy().into_owned();
    if cfg!(any(windows, target_os = "macos")) {
        key.to_lowercase()
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{IgnoreMatcher, NameExclusions};
    use std::fs::File;
    use std::io::Write;

    fn to_strings(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    fn filter_with(root: &Path, vcs: &[&str], names: &[&str]) -> PathFilter {
        let vcs = IgnoreMatcher::compile(root, &to_strings(vcs)).unwrap();
        let tool = IgnoreMatcher::compile(root, &[]).unwrap();
        let names = NameExclusions::compile(&to_strings(names)).unwrap();
        PathFilter::new(root, vcs, tool, names)
    }

    fn touch(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn nested_selection_yields_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        touch(&sub.join("a.txt"), "a");

        let filter = filter_with(dir.path(), &[], &[]);
        let selections = vec![sub.clone(), sub.join("a.txt")];
        let (files, _) =
            collect_selection(&selections, &filter, &CancelFlag::new(), &mut Vec::new()).unwrap();
        assert_eq!(files, vec![sub.join("a.txt")]);
    }

    #[test]
    fn duplicate_selection_roots_are_processed_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.txt"), "a");

        let filter = filter_with(dir.path(), &[], &[]);
        let selections = vec![dir.path().to_path_buf(), dir.path().to_path_buf()];
        let (files, stats) =
            collect_selection(&selections, &filter, &CancelFlag::new(), &mut Vec::new()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(stats.directories_scanned, 1);
    }

    #[test]
    fn ignored_directory_is_pruned_without_listing() {
        let dir = tempfile::tempdir().unwrap();
        let skipped = dir.path().join("skipme");
        fs::create_dir(&skipped).unwrap();
        touch(&skipped.join("inner.txt"), "hidden");
        touch(&dir.path().join("keep.txt"), "kept");

        let filter = filter_with(dir.path(), &["skipme/"], &[]);
        let selections = vec![dir.path().to_path_buf()];
        let (files, stats) =
            collect_selection(&selections, &filter, &CancelFlag::new(), &mut Vec::new()).unwrap();
        assert_eq!(files, vec![dir.path().join("keep.txt")]);
        // Only the root was listed; the pruned subtree never was.
        assert_eq!(stats.directories_scanned, 1);
        assert_eq!(filter.vcs_excluded(), 1);
    }

    #[test]
    fn excluded_name_prunes_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let modules = dir.path().join("node_modules");
        fs::create_dir(&modules).unwrap();
        touch(&modules.join("index.js"), "js");
        touch(&dir.path().join("main.rs"), "rs");

        let filter = filter_with(dir.path(), &[], &["node_modules"]);
        let selections = vec![dir.path().to_path_buf()];
        let (files, _) =
            collect_selection(&selections, &filter, &CancelFlag::new(), &mut Vec::new()).unwrap();
        assert_eq!(files, vec![dir.path().join("main.rs")]);
    }

    #[test]
    fn explicitly_selected_ignored_root_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("secret.txt");
        touch(&secret, "s");

        let filter = filter_with(dir.path(), &["secret.txt"], &[]);
        let (files, _) =
            collect_selection(&[secret], &filter, &CancelFlag::new(), &mut Vec::new()).unwrap();
        assert!(files.is_empty());
        assert_eq!(filter.vcs_excluded(), 1);
    }

    #[test]
    fn unresolvable_selection_among_others_is_a_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.txt"), "a");

        let filter = filter_with(dir.path(), &[], &[]);
        let selections = vec![dir.path().join("a.txt"), dir.path().join("missing.txt")];
        let mut diagnostics = Vec::new();
        let (files, _) =
            collect_selection(&selections, &filter, &CancelFlag::new(), &mut diagnostics).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvableSelection);
    }

    #[test]
    fn all_selections_unresolvable_is_a_user_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let filter = filter_with(dir.path(), &[], &[]);
        let selections = vec![dir.path().join("missing.txt")];
        let result =
            collect_selection(&selections, &filter, &CancelFlag::new(), &mut Vec::new());
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn cancellation_aborts_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.txt"), "a");

        let filter = filter_with(dir.path(), &[], &[]);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = collect_selection(
            &[dir.path().to_path_buf()],
            &filter,
            &cancel,
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(AppError::Cancelled)));
    }
}
