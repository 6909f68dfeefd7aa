//! `igemu device`: show the identity derived from a seed

use crate::config::Settings;
use crate::device::{DeviceDescriptor, DeviceProfile};
use crate::session::{DevicePayload, State};
use anyhow::{Context, Result};
use serde::Serialize;

/// Arguments for the device command
#[derive(Debug)]
pub struct DeviceArgs {
    pub seed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeviceReport {
    pub seed: String,
    pub device: DeviceProfile,
    pub descriptor: DeviceDescriptor,
    pub payload: DevicePayload,
    pub user_agents: UserAgents,
    pub client_session_id: String,
    pub pigeon_session_id: String,
    pub battery_level: u8,
    pub is_charging: bool,
}

#[derive(Debug, Serialize)]
pub struct UserAgents {
    pub app: String,
    pub web: String,
    pub fb: String,
}

/// Build the report for the device derived from `seed`
pub fn device_report(seed: &str, settings: &Settings) -> Result<DeviceReport> {
    let state = State::generate(seed, settings).context("Failed to build session state")?;
    Ok(DeviceReport {
        seed: seed.to_string(),
        device: state.device().clone(),
        descriptor: state.descriptor().clone(),
        payload: state.device_payload(),
        user_agents: UserAgents {
            app: state.app_user_agent(),
            web: state.web_user_agent(),
            fb: state.fb_user_agent(),
        },
        client_session_id: state.client_session_id(),
        pigeon_session_id: state.pigeon_session_id(),
        battery_level: state.battery_level(),
        is_charging: state.is_charging(),
    })
}

/// Print the device report as JSON
pub fn run_device(args: DeviceArgs, settings: &Settings) -> Result<()> {
    let seed = super::resolve_seed(args.seed, settings);
    let report = device_report(&seed, settings)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
