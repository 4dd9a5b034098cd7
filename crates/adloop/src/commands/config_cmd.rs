//! Config subcommand handlers.

use std::io::IsTerminal;

use adloop_config::{Config, ConfigError};
use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_api_url(current: &str) -> Result<String, CliError> {
    Input::new()
        .with_prompt("Backend URL")
        .with_initial_text(current)
        .validate_with(|input: &String| -> Result<(), String> {
            let candidate = Config {
                api_base_url: input.clone(),
                ..Config::default()
            };
            match candidate.base_url() {
                Ok(Some(_)) => Ok(()),
                Ok(None) => Err("URL cannot be empty".into()),
                Err(e) => Err(e.to_string()),
            }
        })
        .interact_text()
        .map_err(prompt_err)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path(global).display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = toml::to_string_pretty(&cfg).map_err(ConfigError::from)?;
            print!("{rendered}");
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = config::config_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let mut cfg = config::load(global)?;
            if global.api_url.is_none() && std::io::stdin().is_terminal() {
                cfg.api_base_url = prompt_api_url(&cfg.api_base_url)?;
            }
            // Reject a bad URL before it lands on disk.
            cfg.base_url()?;

            adloop_config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }
    }
}
