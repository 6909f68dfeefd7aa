//! Configuration management
//!
//! This module handles loading and managing configuration settings
//! for the library and the inspection binary.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{
    ApiSettings, DeviceSettings, LoggingSettings, RetrySettings, SessionSettings, Settings,
};
