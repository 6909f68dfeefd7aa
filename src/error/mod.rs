//! Error handling for the emulation engine
//!
//! This module defines error types and handling patterns used throughout the crate.

pub mod types;

pub use types::{Error, ErrorCategory, Result};
