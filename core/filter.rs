use crate::error::{AppError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log;
use std::cell::Cell;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const VCS_IGNORE_FILENAME: &str = ".gitignore";
pub const TOOL_IGNORE_FILENAME: &str = ".llmignore";

/// Which ignore tier caused a path to be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionSource {
    VcsIgnore,
    ToolIgnore,
}

/// A compiled set of gitignore-syntax pattern lines, anchored at one root.
pub struct IgnoreMatcher {
    inner: Gitignore,
}

impl IgnoreMatcher {
    pub fn compile(root: &Path, pattern_lines: &[String]) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for line in pattern_lines {
            if line.trim().is_empty() {
                continue;
            }
            builder.add_line(None, line)?;
        }
        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Absence of the ignore file is not an error; it compiles to a matcher
    /// that matches nothing.
    pub fn from_file(root: &Path, file: &Path) -> Result<Self> {
        match fs::read_to_string(file) {
            Ok(content) => {
                let lines: Vec<String> = content.lines().map(String::from).collect();
                log::debug!(
                    "Loaded {} ignore line(s) from {}",
                    lines.len(),
                    file.display()
                );
                Self::compile(root, &lines)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Ignore file absent, matching nothing: {}", file.display());
                Ok(Self {
                    inner: Gitignore::empty(),
                })
            }
            Err(e) => Err(AppError::FileRead {
                path: file.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Tests `relative` both as a file and as a directory, so directory-only
    /// patterns (trailing `/`) match without the caller stat-ing the entry.
    /// Ancestor directories are probed too: a path inside an ignored
    /// directory matches even when selected explicitly.
    pub fn matches(&self, relative: &Path) -> bool {
        if self.inner.is_empty() {
            return false;
        }
        self.inner
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
            || self
                .inner
                .matched_path_or_any_parents(relative, true)
                .is_ignore()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Entry-name exclusion globs. Only `*` is a wildcard; every other glob
/// metacharacter is matched literally. Matching is case-insensitive and
/// anchored to the whole entry name.
pub struct NameExclusions {
    set: GlobSet,
    count: usize,
}

impl NameExclusions {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut count = 0;
        for pattern in patterns {
            let trimmed = pattern.trim();
            if trimmed.is_empty() {
                continue;
            }
            let glob_text = escape_non_wildcard(trimmed);
            let glob = GlobBuilder::new(&glob_text)
                .case_insensitive(true)
                .literal_separator(false)
                .build()
                .map_err(|e| {
                    AppError::Glob(format!(
                        "Invalid name exclusion \"{}\" (processed as \"{}\"): {}",
                        pattern, glob_text, e
                    ))
                })?;
            builder.add(glob);
            count += 1;
        }
        Ok(Self {
            set: builder.build()?,
            count,
        })
    }

    pub fn matches(&self, entry_name: &str) -> bool {
        self.count > 0 && self.set.is_match(entry_name)
    }
}

fn escape_non_wildcard(pattern: &str) -> String {
    pattern
        .split('*')
        .map(|segment| globset::escape(segment))
        .collect::<Vec<_>>()
        .join("*")
}

/// Per-invocation path filter: VCS ignore tier, tool ignore tier, and
/// entry-name exclusion globs, with exclusion counters accumulated across the
/// whole traversal. Traversal is single-threaded, so the counters use plain
/// interior mutability.
pub struct PathFilter {
    root: PathBuf,
    vcs: IgnoreMatcher,
    tool: IgnoreMatcher,
    name_exclusions: NameExclusions,
    vcs_excluded: Cell<usize>,
    tool_excluded: Cell<usize>,
}

impl PathFilter {
    pub fn new(
        root: &Path,
        vcs: IgnoreMatcher,
        tool: IgnoreMatcher,
        name_exclusions: NameExclusions,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            vcs,
            tool,
            name_exclusions,
            vcs_excluded: Cell::new(0),
            tool_excluded: Cell::new(0),
        }
    }

    /// Builds the filter from the two optional ignore files at the workspace
    /// root plus the configured entry-name exclusion globs.
    pub fn from_workspace(root: &Path, excluded_name_globs: &[String]) -> Result<Self> {
        let vcs = IgnoreMatcher::from_file(root, &root.join(VCS_IGNORE_FILENAME))?;
        let tool = IgnoreMatcher::from_file(root, &root.join(TOOL_IGNORE_FILENAME))?;
        let name_exclusions = NameExclusions::compile(excluded_name_globs)?;
        log::debug!(
            "Path filter built for {} (vcs rules: {}, tool rules: {})",
            root.display(),
            !vcs.is_empty(),
            !tool.is_empty()
        );
        Ok(Self::new(root, vcs, tool, name_exclusions))
    }

    /// The VCS tier is tested before the tool tier; the first match wins and
    /// is charged to its own counter. Paths not inside the workspace root get
    /// no opinion and are treated as included by the caller.
    pub fn should_skip(&self, absolute: &Path) -> Option<ExclusionSource> {
        let relative = self.relative_to_root(absolute)?;
        if self.vcs.matches(&relative) {
            self.vcs_excluded.set(self.vcs_excluded.get() + 1);
            log::trace!(
                "Excluded by {}: {}",
                VCS_IGNORE_FILENAME,
                relative.display()
            );
            return Some(ExclusionSource::VcsIgnore);
        }
        if self.tool.matches(&relative) {
            self.tool_excluded.set(self.tool_excluded.get() + 1);
            log::trace!(
                "Excluded by {}: {}",
                TOOL_IGNORE_FILENAME,
                relative.display()
            );
            return Some(ExclusionSource::ToolIgnore);
        }
        None
    }

    pub fn is_excluded_name(&self, entry_name: &str) -> bool {
        self.name_exclusions.matches(entry_name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vcs_excluded(&self) -> usize {
        self.vcs_excluded.get()
    }

    pub fn tool_excluded(&self) -> usize {
        self.tool_excluded.get()
    }

    fn relative_to_root(&self, absolute: &Path) -> Option<PathBuf> {
        let relative = absolute.strip_prefix(&self.root).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }
        Some(relative.to_path_buf())
    }
}
