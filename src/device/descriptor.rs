//! Parsed view of a hardware descriptor string

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Structured fields of a `api/release; dpi; WxH; manufacturer; model[; device; cpu]` string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Android API level, e.g. `24`
    pub android_version: String,
    /// Android release, e.g. `7.0`
    pub android_release: String,
    /// Screen density
    pub dpi: u32,
    /// Screen width in pixels
    pub width: u32,
    /// Screen height in pixels
    pub height: u32,
    /// Manufacturer field as written in the descriptor (may contain a `/brand` suffix)
    pub manufacturer: String,
    /// Model name
    pub model: String,
    /// Device codename
    pub device: Option<String>,
    /// CPU / board name
    pub cpu: Option<String>,
}

impl DeviceDescriptor {
    /// Parse a descriptor string
    ///
    /// Fails when the string does not carry the positional fields in the
    /// expected shape. Catalog descriptors always parse.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::device_descriptor(descriptor, reason);

        let parts: Vec<&str> = descriptor.split("; ").collect();
        if parts.len() < 5 {
            return Err(invalid("expected at least 5 fields separated by \"; \""));
        }

        let (android_version, android_release) = parts[0]
            .split_once('/')
            .ok_or_else(|| invalid("first field must be \"api/release\""))?;

        let dpi = parts[1]
            .strip_suffix("dpi")
            .and_then(|d| d.parse::<u32>().ok())
            .ok_or_else(|| invalid("second field must be \"<n>dpi\""))?;

        let (width, height) = parts[2]
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
            .ok_or_else(|| invalid("third field must be \"<width>x<height>\""))?;

        if parts[3].is_empty() || parts[4].is_empty() {
            return Err(invalid("manufacturer and model must not be empty"));
        }

        Ok(Self {
            android_version: android_version.to_string(),
            android_release: android_release.to_string(),
            dpi,
            width,
            height,
            manufacturer: parts[3].to_string(),
            model: parts[4].to_string(),
            device: parts.get(5).map(|s| s.to_string()),
            cpu: parts.get(6).map(|s| s.to_string()),
        })
    }

    /// Manufacturer without the `/brand` suffix
    pub fn manufacturer_name(&self) -> &str {
        self.manufacturer
            .split_once('/')
            .map_or(self.manufacturer.as_str(), |(name, _)| name)
    }
}
