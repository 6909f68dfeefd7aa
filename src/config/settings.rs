//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the emulation engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Main configuration settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Vendor API configuration
    pub api: ApiSettings,
    /// Device identity configuration
    pub device: DeviceSettings,
    /// Session identifier configuration
    pub session: SessionSettings,
    /// Transport retry configuration
    pub retry: RetrySettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Vendor API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL every relative request path is joined onto
    pub base_url: String,
    /// Locale tag, e.g. `en_US`
    pub language: String,
    /// Seconds east of UTC; local offset when unset
    pub timezone_offset: Option<i32>,
    /// Outbound proxy URL
    pub proxy: Option<String>,
    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,
    /// Accept invalid TLS certificates
    pub disable_tls_verification: bool,
}

/// Device identity configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Seed the device profile is derived from; random when unset
    pub seed: Option<String>,
}

/// Session identifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Lifetime of the client session id salt in milliseconds
    pub client_session_id_lifetime_ms: u64,
    /// Lifetime of the pigeon session id salt in milliseconds
    pub pigeon_session_id_lifetime_ms: u64,
    /// Fixed client session id overriding the computed one
    pub fixed_session_id: Option<String>,
}

/// Transport retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt in milliseconds
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt
    pub factor: f64,
    /// Upper bound for a single delay in milliseconds
    pub max_delay_ms: u64,
    /// Add up to 50% random jitter to each delay
    pub jitter: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://i.instagram.com/".to_string(),
            language: "en_US".to_string(),
            timezone_offset: None,
            proxy: None,
            timeout_secs: 30,
            disable_tls_verification: false,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            client_session_id_lifetime_ms: 1_200_000,
            pigeon_session_id_lifetime_ms: 1_200_000,
            fixed_session_id: None,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 1_000,
            factor: 2.0,
            max_delay_ms: 30_000,
            jitter: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| crate::Error::config(format!("Invalid config file {:?}: {}", path, e)))
    }

    /// Apply environment variable overrides
    pub fn merge_with_env(self) -> crate::Result<Self> {
        self.merge_with_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn merge_with_vars<F>(mut self, lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("IG_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Some(language) = lookup("IG_LANGUAGE") {
            self.api.language = language;
        }

        if let Some(seed) = lookup("IG_DEVICE_SEED") {
            self.device.seed = Some(seed);
        }

        if let Some(timeout) = lookup("IG_TIMEOUT_SECS") {
            self.api.timeout_secs = timeout
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid timeout: {}", e)))?;
        }

        if let Some(attempts) = lookup("IG_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = attempts
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid max attempts: {}", e)))?;
        }

        // Explicit proxy first, then the conventional variables
        if self.api.proxy.is_none() || lookup("IG_PROXY").is_some() {
            if let Some(proxy) = ["IG_PROXY", "HTTPS_PROXY", "HTTP_PROXY", "ALL_PROXY"]
                .iter()
                .find_map(|key| lookup(key))
            {
                self.api.proxy = Some(proxy);
            }
        }

        Ok(self)
    }

    /// Check the settings for values the engine cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let base = Url::parse(&self.api.base_url)
            .map_err(|e| crate::Error::config(format!("Invalid base URL: {}", e)))?;
        if base.cannot_be_a_base() || base.host_str().is_none() {
            return Err(crate::Error::config("Base URL must be an absolute http(s) URL"));
        }

        if let Some(proxy) = &self.api.proxy {
            Url::parse(proxy)
                .map_err(|e| crate::Error::config(format!("Invalid proxy URL: {}", e)))?;
        }

        if self.api.timeout_secs == 0 {
            return Err(crate::Error::config("Timeout must be greater than zero"));
        }

        if self.retry.max_attempts == 0 {
            return Err(crate::Error::config("Retry max_attempts must be at least 1"));
        }

        if self.retry.factor.is_nan() || self.retry.factor < 1.0 {
            return Err(crate::Error::config("Retry factor must be at least 1.0"));
        }

        if self.session.client_session_id_lifetime_ms == 0
            || self.session.pigeon_session_id_lifetime_ms == 0
        {
            return Err(crate::Error::config("Session id lifetimes must be greater than zero"));
        }

        Ok(())
    }

    /// Configured proxy URL, if any
    pub fn get_proxy_url(&self) -> Option<String> {
        self.api.proxy.clone()
    }

    /// Default configuration file location
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("igemu").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url, "https://i.instagram.com/");
        assert_eq!(settings.api.language, "en_US");
        assert_eq!(settings.session.client_session_id_lifetime_ms, 1_200_000);
        assert_eq!(settings.session.pigeon_session_id_lifetime_ms, 1_200_000);
        assert_eq!(settings.retry.max_attempts, 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_creation() {
        let settings = Settings::new();
        assert_eq!(settings.api.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_merge_with_vars() {
        let settings = Settings::default()
            .merge_with_vars(vars(&[
                ("IG_LANGUAGE", "de_DE"),
                ("IG_DEVICE_SEED", "seed-1"),
                ("IG_TIMEOUT_SECS", "10"),
                ("IG_RETRY_MAX_ATTEMPTS", "3"),
            ]))
            .unwrap();

        assert_eq!(settings.api.language, "de_DE");
        assert_eq!(settings.device.seed.as_deref(), Some("seed-1"));
        assert_eq!(settings.api.timeout_secs, 10);
        assert_eq!(settings.retry.max_attempts, 3);
    }

    #[test]
    fn test_merge_with_invalid_number() {
        let result = Settings::default().merge_with_vars(vars(&[("IG_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_proxy_priority() {
        let settings = Settings::default()
            .merge_with_vars(vars(&[
                ("HTTP_PROXY", "http://proxy2:8080"),
                ("HTTPS_PROXY", "https://proxy1:8080"),
                ("ALL_PROXY", "socks5://proxy3:1080"),
            ]))
            .unwrap();
        assert_eq!(settings.get_proxy_url().unwrap(), "https://proxy1:8080");

        let settings = Settings::default()
            .merge_with_vars(vars(&[
                ("HTTP_PROXY", "http://proxy2:8080"),
                ("IG_PROXY", "http://explicit:1"),
            ]))
            .unwrap();
        assert_eq!(settings.get_proxy_url().unwrap(), "http://explicit:1");

        let mut configured = Settings::default();
        configured.api.proxy = Some("http://from-file:1".to_string());
        let settings = configured
            .merge_with_vars(vars(&[("HTTP_PROXY", "http://proxy2:8080")]))
            .unwrap();
        assert_eq!(settings.get_proxy_url().unwrap(), "http://from-file:1");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.api.base_url = "not a url".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.retry.max_attempts = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.retry.factor = 0.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.retry.factor = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.retry.factor = 1.0;
        assert!(settings.validate().is_ok());

        let mut settings = Settings::default();
        settings.api.timeout_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.session.pigeon_session_id_lifetime_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
[api]
language = "fr_FR"

[retry]
max_attempts = 2
"#,
        )
        .unwrap();

        assert_eq!(settings.api.language, "fr_FR");
        assert_eq!(settings.api.base_url, "https://i.instagram.com/");
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.retry.initial_delay_ms, 1_000);
    }
}
