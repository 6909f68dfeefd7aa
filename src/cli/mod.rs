//! Inspection command logic
//!
//! Each subcommand of the `igemu` binary lives in its own module and prints
//! a JSON document to stdout.

pub mod device;
pub mod sign;

pub use device::{DeviceArgs, run_device};
pub use sign::{SignArgs, run_sign};

use crate::config::Settings;

/// Seed from the command line, then the settings, then a fresh random one
pub(crate) fn resolve_seed(cli_seed: Option<String>, settings: &Settings) -> String {
    cli_seed
        .or_else(|| settings.device.seed.clone())
        .unwrap_or_else(|| {
            tracing::info!("No device seed configured, using a random one");
            uuid::Uuid::new_v4().to_string()
        })
}
