//! `namefix config`: view, validate or create `.namefix/namefix.toml`.

use anyhow::{Context, Result};
use std::path::Path;

use namefix::config::{
    API_KEY_VAR, GITHUB_TOKEN_VAR, NamefixConfig, NamefixToml, config_path, get_namefix_dir,
};

use super::super::ConfigCommands;

fn print_sections(toml: &NamefixToml) {
    println!("[remote]");
    println!("  base_url = \"{}\"", toml.remote.base_url);
    println!("  session_id = \"{}\"", toml.remote.session_id);
    println!();

    println!("[poll]");
    println!("  interval_secs = {}", toml.poll.interval_secs);
    println!("  backoff = {}", toml.poll.backoff);
    println!("  max_interval_secs = {}", toml.poll.max_interval_secs);
    println!("  max_attempts = {}", toml.poll.max_attempts);
    if let Some(timeout) = toml.poll.timeout_secs {
        println!("  timeout_secs = {}", timeout);
    }
    println!("  fail_fast = {}", toml.poll.fail_fast);
    println!();

    println!("[rename]");
    println!("  allow_outside_root = {}", toml.rename.allow_outside_root);
    println!();

    println!("[output]");
    println!("  plan_file = \"{}\"", toml.output.plan_file.display());
    println!("  replay_file = \"{}\"", toml.output.replay_file.display());
    println!();
}

fn credential_state(key: &str) -> &'static str {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => "set",
        _ => "not set",
    }
}

pub fn cmd_config(project_dir: &Path, command: Option<ConfigCommands>) -> Result<()> {
    let namefix_dir = get_namefix_dir(project_dir);
    let config_path = config_path(project_dir);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Namefix Configuration");
            println!("=====================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                print_sections(&NamefixToml::load(&config_path)?);
            } else {
                println!("No namefix.toml found at {}", config_path.display());
                println!();
                println!("Using default configuration:");
                print_sections(&NamefixToml::default());
                println!("Run 'namefix config init' to create a namefix.toml file.");
                println!();
            }

            let config = NamefixConfig::load(project_dir)?;
            println!("Effective values (with env overrides):");
            println!("  base_url = \"{}\"", config.base_url);
            println!("  poll.interval = {}s", config.poll.interval.as_secs());
            println!("  poll.max_attempts = {}", config.poll.max_attempts);
            println!("  {} is {}", API_KEY_VAR, credential_state(API_KEY_VAR));
            println!("  {} is {}", GITHUB_TOKEN_VAR, credential_state(GITHUB_TOKEN_VAR));
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No namefix.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = NamefixToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("namefix.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&namefix_dir).with_context(|| {
                format!("Failed to create directory: {}", namefix_dir.display())
            })?;
            NamefixToml::default().save(&config_path)?;

            println!("Created namefix.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [remote] base_url, session_id");
            println!("  - [poll] interval_secs, backoff, max_attempts, timeout_secs");
            println!("  - [output] plan_file, replay_file");
            println!();
            println!(
                "Credentials ({}, {}) stay in the environment or .env.",
                API_KEY_VAR, GITHUB_TOKEN_VAR
            );
            println!();
        }
    }

    Ok(())
}
