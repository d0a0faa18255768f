use crate::cli_args::OverviewArgs;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use chrono::Utc;
use llmdoc_core::{CancelFlag, Config, run_invocation};
use log;

/// Regenerates only the overview header: an invocation with an empty
/// selection. Previously appended file sections are preserved.
pub fn handle_overview_command(args: OverviewArgs, quiet: bool) -> Result<()> {
    let workspace_root = Config::determine_workspace_root(args.workspace.workspace_root.as_ref())
        .context("Failed to determine workspace root")?;
    log::info!("Workspace root determined: {}", workspace_root.display());

    let config = load_config_for_command(&workspace_root, &args.workspace, Some(&args.overview))
        .context("Failed to load configuration")?;
    if !config.overview.enabled {
        log::warn!("Overview generation is disabled; nothing will be written.");
    }

    let cancel = CancelFlag::new();
    let report = run_invocation(&workspace_root, &[], &config, &cancel, Utc::now())
        .context("Failed to regenerate the overview")?;

    output::finish_run(&report, quiet)
}
