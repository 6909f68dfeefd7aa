//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

/// Test helper functions
pub mod helpers {
    use igemu::{IgApiClient, Settings};
    use std::time::Duration;

    /// Settings pointing the transport at a mock server
    pub fn create_test_settings(base_url: &str) -> Settings {
        let mut settings = Settings::default();
        settings.api.base_url = base_url.to_string();
        settings.api.timeout_secs = 5;
        settings.device.seed = Some("integration-seed".to_string());
        settings.retry.initial_delay_ms = 10;
        settings
    }

    /// Client bound to `base_url`
    pub fn create_test_client(base_url: &str) -> IgApiClient {
        IgApiClient::new(&create_test_settings(base_url)).unwrap()
    }

    /// Client bound to `base_url` with `attempts` total attempts per request
    pub fn create_retrying_client(base_url: &str, attempts: u32) -> IgApiClient {
        let mut settings = create_test_settings(base_url);
        settings.retry.max_attempts = attempts;
        settings.retry.initial_delay_ms = 10;
        settings.retry.max_delay_ms = 20;
        IgApiClient::new(&settings).unwrap()
    }

    /// Short per-request deadline
    pub const SHORT_TIMEOUT: Duration = Duration::from_millis(200);
}
