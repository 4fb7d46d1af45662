//! `wayfinder config ...`: inspect and edit `~/.wayfinder/config.ini`.

use std::path::Path;

use clap::Subcommand;
use wayfinder::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name as section.key, e.g. provider.search_url
        key: String,
    },

    /// Change one setting and write the file
    Set {
        /// Setting name as section.key, e.g. session.default_mode
        key: String,

        /// New value
        value: String,
    },

    /// Print every setting with its effective value
    List,

    /// Print where the settings file lives
    Path,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = lookup(&key)?;
            println!("{}", key.get(&ConfigFile::load()?));
        }
        ConfigCommands::Set { key, value } => {
            let key = lookup(&key)?;
            let config = set_in(&config_file_path(), key, &value)?;
            println!("{} = {}", key.name(), key.get(&config));
        }
        ConfigCommands::List => list(&ConfigFile::load()?),
        ConfigCommands::Path => {
            let path = config_file_path();
            let note = if path.exists() { "" } else { " (not created yet)" };
            println!("{}{}", path.display(), note);
        }
    }
    Ok(())
}

fn lookup(name: &str) -> Result<ConfigKey, CliError> {
    name.parse::<ConfigKey>().map_err(|_| {
        let known: Vec<String> = ConfigKey::all().iter().map(ConfigKey::name).collect();
        CliError::Config(format!(
            "no setting named '{}' (known: {})",
            name,
            known.join(", ")
        ))
    })
}

/// Apply one change to the file at `path` and write it back.
fn set_in(path: &Path, key: ConfigKey, value: &str) -> Result<ConfigFile, CliError> {
    let mut config = if path.exists() {
        ConfigFile::load_from(path)?
    } else {
        ConfigFile::default()
    };
    key.set(&mut config, value)?;

    // Thresholds are checked against each other, not just individually
    config
        .panel_config()
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;
    config.save_to(path)?;
    Ok(config)
}

fn list(config: &ConfigFile) {
    let width = ConfigKey::all()
        .iter()
        .map(|key| key.name().len())
        .max()
        .unwrap_or(0);

    let mut section = None;
    for key in ConfigKey::all() {
        if section.is_some() && section != Some(key.section()) {
            println!();
        }
        section = Some(key.section());
        println!("{:<width$}  {}", key.name(), key.get(config), width = width);
    }
}
