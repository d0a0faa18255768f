pub mod binary;
pub mod collect;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod filter;
pub mod overview;
pub mod tree;

pub use binary::is_binary_text;
pub use collect::{CancelFlag, CollectionStats, collect_selection};
pub use config::{Config, OutputConfig, OverviewConfig, OverviewTemplate, workspace_name};
pub use document::{
    FILE_CONTENT_MARKER, FILE_END_MARKER, FILE_START_MARKER, OVERVIEW_END_MARKER,
    OVERVIEW_START_MARKER, compose_document, format_file_section, strip_overview_block,
};
pub use engine::{RunReport, run_invocation};
pub use error::{AppError, Diagnostic, DiagnosticKind, Result};
pub use filter::{
    ExclusionSource, IgnoreMatcher, PathFilter, TOOL_IGNORE_FILENAME, VCS_IGNORE_FILENAME,
};
pub use tree::{TreeOptions, TreeSummary, build_tree};
