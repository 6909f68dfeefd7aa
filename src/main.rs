//! Inspection binary for the emulation engine
//!
//! Derives device identities and signs payloads offline, printing JSON to
//! stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! igemu device --seed my-account
//! igemu sign --payload '{"username":"someone"}' --seed my-account
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use igemu::{
    cli::{DeviceArgs, SignArgs, run_device, run_sign},
    config::ConfigLoader,
    utils::VERSION,
};

#[derive(Parser)]
#[command(author, about, long_about = None)]
#[command(name = "igemu")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Show version information
    #[arg(long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the device profile and user agents derived from a seed
    Device {
        /// Device seed
        #[arg(short, long)]
        seed: Option<String>,
    },
    /// Sign a payload and print the signed-body envelope
    Sign {
        /// JSON object or raw string to sign
        #[arg(short, long)]
        payload: String,

        /// Device seed
        #[arg(short, long)]
        seed: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", VERSION);
        return Ok(());
    }

    let settings = ConfigLoader::new().load(cli.config.as_deref())?;

    let default_level = if cli.verbose || settings.logging.verbose {
        "debug".to_string()
    } else {
        settings.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Command::Device { seed }) => run_device(DeviceArgs { seed }, &settings),
        Some(Command::Sign { payload, seed }) => run_sign(SignArgs { payload, seed }, &settings),
        None => {
            eprintln!("No command given, see --help");
            std::process::exit(2);
        }
    }
}
