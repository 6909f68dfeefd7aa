//! Crate version information

/// Crate version from the package manifest
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version string shown by the binary and in logs
pub fn get_version() -> &'static str {
    VERSION
}
