//! Command-line interface for the `baitline` binary.

use clap::{Parser, Subcommand};

use bait_domain::config::Config;

/// Baitline — a scam-baiting session intelligence engine.
#[derive(Debug, Parser)]
#[command(name = "baitline", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load the configuration from the path specified by `BAITLINE_CONFIG` (or
/// `config.toml` by default). A missing file yields the built-in defaults.
/// Returns the parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path =
        std::env::var("BAITLINE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        Config::from_toml(&raw)
            .map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// `config validate`: parse and report. Returns false when the file exists
/// but does not parse.
pub fn validate() -> bool {
    match load_config() {
        Ok((_, path)) => {
            println!("{path}: OK");
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

/// `config show`: dump the resolved configuration as TOML.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("failed to render config: {e}"),
    }
}
