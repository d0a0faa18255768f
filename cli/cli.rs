mod cli_args;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use log;
use std::process;

use cli_args::{Cli, Commands, OverviewTuningOpts, WorkspaceOpts};
use llmdoc_core::{AppError, Config, OverviewTemplate};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;
    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let core_err = e.downcast_ref::<AppError>();
            let exit_code = match core_err {
                Some(AppError::Config(_)) => 1,
                Some(AppError::TomlParse(_)) => 1,
                Some(AppError::TomlSerialize(_)) => 1,
                Some(AppError::Io(_)) => 2,
                Some(AppError::FileRead { .. }) => 2,
                Some(AppError::FileWrite { .. }) => 2,
                Some(AppError::Ignore(_)) => 2,
                Some(AppError::Glob(_)) => 2,
                Some(AppError::InvalidArgument(_)) => 5,
                Some(AppError::Cancelled) => 130,
                Some(_) => 1,
                None => 1,
            };

            if matches!(core_err, Some(AppError::Cancelled)) {
                // Cancellation is not an error; keep the message distinct.
                eprintln!("{}", "Operation cancelled.".yellow());
            } else if !quiet || exit_code == 1 || exit_code == 5 {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Append(args) => {
                log::debug!("Executing 'append' command...");
                commands::append::handle_append_command(args, quiet)?;
            }
            Commands::Overview(args) => {
                log::debug!("Executing 'overview' command...");
                commands::overview::handle_overview_command(args, quiet)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                commands::config::handle_config_command(&args, quiet)?;
            }
            Commands::Completion(args) => {
                log::debug!("Executing 'completion' command...");
                commands::completion::handle_completion_command(&args)?;
            }
        },
    }
    Ok(())
}

fn merge_config_with_cli_overrides(mut config: Config, tuning: &OverviewTuningOpts) -> Config {
    log::trace!("Applying overview CLI overrides to config...");

    if tuning.disable_overview {
        config.overview.enabled = false;
    }
    if tuning.enable_overview {
        config.overview.enabled = true;
    }
    if tuning.disable_metadata {
        config.overview.include_metadata = false;
    }
    if tuning.enable_metadata {
        config.overview.include_metadata = true;
    }
    if tuning.disable_tree {
        config.overview.include_tree = false;
    }
    if tuning.enable_tree {
        config.overview.include_tree = true;
    }

    if let Some(template_name) = &tuning.template {
        // The value_parser restricts input to the known names.
        if let Some(template) = OverviewTemplate::from_name(template_name) {
            config.overview.template = template;
        }
    }
    if let Some(depth) = tuning.tree_max_depth {
        config.overview.tree_max_depth = depth;
    }
    if let Some(entries) = tuning.tree_max_entries {
        config.overview.tree_max_entries = entries;
    }
    if !tuning.exclude_dir.is_empty() {
        config.overview.excluded_dirs = tuning.exclude_dir.clone();
    }

    log::trace!("Config after CLI overrides: {:?}", config);
    config
}

/// Loads the TOML config (or defaults) and applies CLI overrides. Used by the
/// append and overview commands.
pub fn load_config_for_command(
    workspace_root: &std::path::Path,
    workspace_opts: &WorkspaceOpts,
    tuning: Option<&OverviewTuningOpts>,
) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        workspace_root,
        workspace_opts.config_file.as_ref(),
        workspace_opts.no_config_file,
    )
    .context("Failed to resolve configuration path")?;

    let mut config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(tuning) = tuning {
        config = merge_config_with_cli_overrides(config, tuning);
    }
    if let Some(doc) = &workspace_opts.doc {
        config.output.document_path = doc.clone();
    }

    Ok(config)
}
