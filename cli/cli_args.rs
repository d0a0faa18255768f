use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceOpts {
    #[arg(
        long,
        help = "Specify the workspace root directory (default: current dir).",
        help_heading = "Workspace",
        value_name = "PATH"
    )]
    pub workspace_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path of the TOML config file (default: .llmdoc.toml at the workspace root).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config_file",
        help_heading = "Workspace"
    )]
    pub config_file: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config_file",
        help_heading = "Workspace"
    )]
    pub no_config_file: bool,

    #[arg(
        long,
        help = "Override the output document path (absolute, or relative to the workspace root).",
        value_name = "PATH",
        help_heading = "Workspace"
    )]
    pub doc: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OverviewTuningOpts {
    #[arg(
        long,
        help = "Force generation of the overview block [default: enabled].",
        overrides_with = "disable_overview",
        help_heading = "Overview"
    )]
    pub enable_overview: bool,
    #[arg(
        long,
        help = "Disable the overview block.",
        overrides_with = "enable_overview",
        help_heading = "Overview"
    )]
    pub disable_overview: bool,

    #[arg(
        long,
        help = "Force inclusion of the metadata section [default: enabled].",
        overrides_with = "disable_metadata",
        help_heading = "Overview"
    )]
    pub enable_metadata: bool,
    #[arg(
        long,
        help = "Disable the metadata section.",
        overrides_with = "enable_metadata",
        help_heading = "Overview"
    )]
    pub disable_metadata: bool,

    #[arg(
        long,
        help = "Force inclusion of the directory tree section [default: enabled].",
        overrides_with = "disable_tree",
        help_heading = "Overview"
    )]
    pub enable_tree: bool,
    #[arg(
        long,
        help = "Disable the directory tree section.",
        overrides_with = "enable_tree",
        help_heading = "Overview"
    )]
    pub disable_tree: bool,

    #[arg(
        long,
        help = "Set the overview template.",
        value_name = "MODE",
        value_parser = ["full", "metadata_only", "tree_only", "summary"],
        help_heading = "Overview"
    )]
    pub template: Option<String>,

    #[arg(
        long,
        help = "Maximum tree depth (0 or less means unlimited).",
        value_name = "N",
        allow_hyphen_values = true,
        help_heading = "Overview"
    )]
    pub tree_max_depth: Option<i64>,

    #[arg(
        long,
        help = "Maximum entries rendered per directory (0 or less means unlimited).",
        value_name = "N",
        allow_hyphen_values = true,
        help_heading = "Overview"
    )]
    pub tree_max_entries: Option<i64>,

    #[arg(
        long = "exclude-dir",
        value_name = "GLOB",
        action = clap::ArgAction::Append,
        help = "Replace the excluded directory-name globs ('*' wildcard only, case-insensitive).",
        help_heading = "Overview"
    )]
    pub exclude_dir: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Aggregate project files into one flat LLM-ready text document.",
    long_about = "llmdoc collects selected files and directories, filters them through \n.gitignore/.llmignore rules, skips binary content, and appends each file \n(annotated with its name and relative path) to a single text document with \na replaceable project-overview header.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  llmdoc append src/ README.md\n  llmdoc append --disable-overview notes.txt\n  llmdoc overview --template summary\n  llmdoc config --save",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "a",
        about = "Append selected files and/or directories to the LLM document."
    )]
    Append(AppendArgs),

    #[command(
        visible_alias = "o",
        about = "Regenerate the project overview block of the LLM document."
    )]
    Overview(OverviewArgs),

    #[command(about = "Show or save the default configuration file structure.")]
    Config(ConfigArgs),

    #[command(about = "Generate shell completion scripts.")]
    Completion(CompletionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AppendArgs {
    #[clap(flatten)]
    pub workspace: WorkspaceOpts,
    #[clap(flatten)]
    pub overview: OverviewTuningOpts,

    #[arg(
        required = true,
        value_name = "PATH",
        help = "Files and/or directories to append (relative paths resolve against the workspace root)."
    )]
    pub paths: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OverviewArgs {
    #[clap(flatten)]
    pub workspace: WorkspaceOpts,
    #[clap(flatten)]
    pub overview: OverviewTuningOpts,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Save the default config structure to the workspace root (refuses to overwrite)."
    )]
    pub save: bool,

    #[arg(short = 'f', long, help = "Output format for the default config.", value_name = "FORMAT", value_parser = ["toml", "json"])]
    pub format: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,
}
