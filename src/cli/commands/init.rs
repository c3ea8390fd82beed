//! Init and Config commands.

use anyhow::{Result, bail};

use crate::config::Settings;

/// Create `.filingrag/settings.toml` in the current directory.
pub fn run_init(force: bool) -> Result<()> {
    match Settings::init_config_file(force) {
        Ok(path) => {
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            println!("API keys are read from the environment (OPENAI_API_KEY by default).");
            Ok(())
        }
        Err(e) => bail!("{e}"),
    }
}

/// Print the effective settings.
pub fn run_config(settings: &Settings) -> Result<()> {
    println!("{}", super::heading("Current Configuration:"));
    println!("{}", "=".repeat(50));
    println!("{}", settings.to_toml()?);
    Ok(())
}
