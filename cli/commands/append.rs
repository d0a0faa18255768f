use crate::cli_args::AppendArgs;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use chrono::Utc;
use llmdoc_core::{CancelFlag, Config, run_invocation};
use log;

pub fn handle_append_command(args: AppendArgs, quiet: bool) -> Result<()> {
    let workspace_root = Config::determine_workspace_root(args.workspace.workspace_root.as_ref())
        .context("Failed to determine workspace root")?;
    log::info!("Workspace root determined: {}", workspace_root.display());

    let config = load_config_for_command(&workspace_root, &args.workspace, Some(&args.overview))
        .context("Failed to load configuration")?;

    // Cancellation is cooperative; the host wires the flag, a plain CLI run
    // never sets it.
    let cancel = CancelFlag::new();
    let report = run_invocation(&workspace_root, &args.paths, &config, &cancel, Utc::now())
        .context("Failed to collect and compose the document")?;

    output::finish_run(&report, quiet)
}
