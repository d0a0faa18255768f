use crate::error::{AppError, Result};
use log;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = ".llmdoc.toml";
pub const DEFAULT_DOCUMENT_NAME: &str = "LLM_doc.txt";

/// Directory-name exclusion globs applied when no configuration overrides them.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".vscode",
    "out",
    ".venv",
    "dist",
    "build",
    "__pycache__",
    ".idea",
    ".cache",
    ".next",
    ".turbo",
    ".DS_Store",
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub overview: OverviewConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OverviewConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub include_metadata: bool,
    #[serde(default = "default_true")]
    pub include_tree: bool,
    #[serde(default = "default_tree_max_depth")]
    pub tree_max_depth: i64,
    #[serde(default = "default_tree_max_entries")]
    pub tree_max_entries: i64,
    #[serde(default)]
    pub template: OverviewTemplate,
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,
}

/// Which sections the overview block may contain. The `include_metadata` and
/// `include_tree` switches further restrict what the template admits.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverviewTemplate {
    Full,
    MetadataOnly,
    TreeOnly,
    Summary,
}

impl Default for OverviewTemplate {
    fn default() -> Self {
        OverviewTemplate::Full
    }
}

impl OverviewTemplate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "full" => Some(OverviewTemplate::Full),
            "metadata_only" => Some(OverviewTemplate::MetadataOnly),
            "tree_only" => Some(OverviewTemplate::TreeOnly),
            "summary" => Some(OverviewTemplate::Summary),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_tree_max_depth() -> i64 {
    3
}
fn default_tree_max_entries() -> i64 {
    30
}
fn default_excluded_dirs() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect()
}
fn default_document_path() -> PathBuf {
    PathBuf::from(DEFAULT_DOCUMENT_NAME)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overview: OverviewConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            include_metadata: default_true(),
            include_tree: default_true(),
            tree_max_depth: default_tree_max_depth(),
            tree_max_entries: default_tree_max_entries(),
            template: OverviewTemplate::default(),
            excluded_dirs: default_excluded_dirs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            document_path: default_document_path(),
        }
    }
}

impl OverviewConfig {
    /// Zero or negative means unlimited.
    pub fn effective_max_depth(&self) -> Option<usize> {
        if self.tree_max_depth > 0 {
            Some(self.tree_max_depth as usize)
        } else {
            None
        }
    }

    /// Zero or negative means unlimited.
    pub fn effective_max_entries(&self) -> Option<usize> {
        if self.tree_max_entries > 0 {
            Some(self.tree_max_entries as usize)
        } else {
            None
        }
    }
}

impl Config {
    pub fn determine_workspace_root(cli_workspace_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_workspace_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var("LLMDOC_ROOT").ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize workspace root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        workspace_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let expanded = shellexpand::tilde(p_str);
                let mut path = PathBuf::from(expanded.as_ref());
                if !path.is_absolute() {
                    path = workspace_root.join(path);
                }
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = workspace_root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    /// Absolute document paths are used verbatim; relative ones resolve
    /// against the workspace root.
    pub fn resolve_document_path(&self, workspace_root: &Path) -> PathBuf {
        if self.output.document_path.is_absolute() {
            self.output.document_path.clone()
        } else {
            workspace_root.join(&self.output.document_path)
        }
    }
}

pub fn workspace_name(workspace_root: &Path) -> String {
    workspace_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "UnknownWorkspace".to_string())
}
