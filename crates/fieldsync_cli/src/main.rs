//! Fieldsync CLI
//!
//! Command-line tools for the Fieldsync sync server.
//!
//! # Commands
//!
//! - `serve` - Run the reference sync server against a zone file
//! - `validate` - Classify a point against a zone file
//! - `zones` - Inspect a zone file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Fieldsync command-line tools.
#[derive(Parser)]
#[command(name = "fieldsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the zone file (JSON array of zone rings)
    #[arg(global = true, short, long)]
    zones: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reference sync server
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:8700")]
        bind: String,

        /// Warning distance in meters
        #[arg(long, default_value_t = 100.0)]
        warning_meters: f64,

        /// Hard-reject distance in meters
        #[arg(long, default_value_t = 500.0)]
        hard_reject_meters: f64,
    },

    /// Classify a point against the zone file
    Validate {
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,

        /// Reported GPS accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,

        /// Warning distance in meters
        #[arg(long, default_value_t = 100.0)]
        warning_meters: f64,

        /// Hard-reject distance in meters
        #[arg(long, default_value_t = 500.0)]
        hard_reject_meters: f64,
    },

    /// Inspect the zone file
    Zones,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Serve {
            bind,
            warning_meters,
            hard_reject_meters,
        } => commands::serve::run(cli.zones, &bind, warning_meters, hard_reject_meters),
        Commands::Validate {
            lat,
            lon,
            accuracy,
            warning_meters,
            hard_reject_meters,
        } => commands::validate::run(
            cli.zones,
            lat,
            lon,
            accuracy,
            warning_meters,
            hard_reject_meters,
        ),
        Commands::Zones => commands::zones::run(cli.zones),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
