//! Configuration commands: `config path|list|get|set|init`.

use clap::Subcommand;
use tilekeep::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List every setting with its current value
    List,

    /// Print one setting
    Get {
        /// Setting name as section.key (e.g., server.port)
        key: String,
    },

    /// Change one setting and save the file
    Set {
        /// Setting name as section.key (e.g., server.port)
        key: String,

        /// New value
        value: String,
    },

    /// Write a commented configuration file with the current values
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::List => {
            print!("{}", listing(&ConfigFile::load()?));
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            println!("{}", display_value(&key.get(&ConfigFile::load()?)));
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load()?;
            key.set(&mut config, &value)
                .map_err(|e| CliError::Config(e.to_string()))?;
            config.save()?;
            println!("{} = {}", key, display_value(&key.get(&config)));
            Ok(())
        }
        ConfigCommands::Init => {
            let config = ConfigFile::load()?;
            config.save()?;
            println!("Wrote {}", config_file_path().display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown setting '{}'. Run 'tilekeep config list' for the available names.",
            key
        ))
    })
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// Settings grouped by section, INI style.
fn listing(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut section = "";
    for key in ConfigKey::all() {
        if key.section() != section {
            if !section.is_empty() {
                out.push('\n');
            }
            section = key.section();
            out.push_str(&format!("[{}]\n", section));
        }
        out.push_str(&format!(
            "  {} = {}\n",
            key.key_name(),
            display_value(&key.get(config))
        ));
    }
    out
}
