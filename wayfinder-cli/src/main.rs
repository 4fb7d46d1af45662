//! Wayfinder CLI - search places, plan trips and estimate travel times.
//!
//! Drives the `wayfinder` library from the terminal against OpenStreetMap
//! services, or against a small built-in gazetteer with `--offline`.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use wayfinder::config::ConfigFile;
use wayfinder::coord::Coordinate;
use wayfinder::logging::{init_logging, LogConfig};

use commands::common::ModeArg;
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "wayfinder", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Use the built-in gazetteer instead of network services
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Type text keystroke by keystroke and show the settled suggestions
    Complete {
        text: String,
    },

    /// Autocomplete suggestions for a query
    Search {
        text: String,
    },

    /// Resolve an address to a place
    Geocode {
        address: String,
    },

    /// Find the place nearest a coordinate
    Reverse {
        /// Coordinate as lat,lon
        #[arg(allow_hyphen_values = true)]
        coordinate: Coordinate,
    },

    /// Plan a trip through one or more stops (addresses or lat,lon)
    Trip {
        #[arg(allow_hyphen_values = true)]
        from: String,

        #[arg(allow_hyphen_values = true)]
        to: String,

        /// Intermediate stop, in order; repeatable
        #[arg(long, allow_hyphen_values = true)]
        via: Vec<String>,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Estimate travel time to an address
    Eta {
        address: String,

        /// Starting point as lat,lon (default: configured initial center)
        #[arg(long, allow_hyphen_values = true)]
        from: Option<Coordinate>,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Points of interest around a coordinate
    Nearby {
        /// Category to include; repeatable (default: any)
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Center as lat,lon (default: configured initial center)
        #[arg(long, allow_hyphen_values = true)]
        near: Option<Coordinate>,

        /// Search radius in meters
        #[arg(long)]
        radius: Option<f64>,
    },

    /// View or edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_verbosity(cli.verbose);
    if let Some(path) = &cli.log_file {
        log_config = log_config.with_log_file(path);
    }
    // Guard flushes the file writer on drop
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        command, offline, ..
    } = cli;

    if let Commands::Config(command) = command {
        return commands::config::run(command);
    }

    let config = ConfigFile::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(command, offline, &config))
}

async fn dispatch(command: Commands, offline: bool, config: &ConfigFile) -> Result<(), CliError> {
    use commands::{route, search};

    match command {
        Commands::Complete { text } => search::run_complete(&text, offline, config).await,
        Commands::Search { text } => search::run_search(&text, offline, config).await,
        Commands::Geocode { address } => search::run_geocode(&address, offline, config).await,
        Commands::Reverse { coordinate } => {
            search::run_reverse(coordinate, offline, config).await
        }
        Commands::Trip {
            from,
            to,
            via,
            mode,
        } => route::run_trip(&from, &to, &via, mode, offline, config).await,
        Commands::Eta {
            address,
            from,
            mode,
        } => route::run_eta(&address, from, mode, offline, config).await,
        Commands::Nearby {
            categories,
            near,
            radius,
        } => search::run_nearby(near, radius, categories, offline, config).await,
        Commands::Config(command) => commands::config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_trip_with_waypoints() {
        let cli = Cli::try_parse_from([
            "wayfinder",
            "--offline",
            "trip",
            "Times Square",
            "40.7061,-73.9969",
            "--via",
            "Empire State Building",
            "--via",
            "Katz's Delicatessen",
            "--mode",
            "walk",
        ])
        .unwrap();

        assert!(cli.offline);
        match cli.command {
            Commands::Trip { from, to, via, mode } => {
                assert_eq!(from, "Times Square");
                assert_eq!(to, "40.7061,-73.9969");
                assert_eq!(via.len(), 2);
                assert_eq!(mode, Some(ModeArg::Walking));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_negative_coordinate() {
        let cli = Cli::try_parse_from(["wayfinder", "reverse", "-33.8568,151.2153"]).unwrap();
        match cli.command {
            Commands::Reverse { coordinate } => {
                assert_eq!(coordinate, Coordinate::new(-33.8568, 151.2153));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["wayfinder", "-vv", "config", "path"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
