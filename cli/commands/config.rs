use crate::cli_args::ConfigArgs;
use crate::output::write_to_file;
use anyhow::{Context, Result};
use colored::*;
use llmdoc_core::{AppError, Config, config::DEFAULT_CONFIG_FILENAME};
use log;

/// Prints the default configuration structure, or saves it to the workspace
/// root with `--save`.
pub fn handle_config_command(args: &ConfigArgs, quiet: bool) -> Result<()> {
    let config = Config::default();
    let format = args.format.as_deref().unwrap_or("toml");
    let content = match format {
        "json" => serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?,
        _ => toml::to_string_pretty(&config)
            .map_err(AppError::TomlSerialize)
            .context("Failed to serialize default config to TOML")?,
    };

    if args.save {
        let workspace_root = Config::determine_workspace_root(None)
            .context("Failed to determine workspace root")?;
        let save_path = workspace_root.join(DEFAULT_CONFIG_FILENAME);
        if save_path.exists() {
            anyhow::bail!(AppError::InvalidArgument(format!(
                "Config file already exists at '{}'; remove it first.",
                save_path.display()
            )));
        }
        write_to_file(&save_path, &content)?;
        if !quiet {
            println!(
                "{} Default config saved to: {}",
                "✅".green(),
                save_path.display().to_string().blue()
            );
        }
        log::info!("Default config written to {}", save_path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}
