//! Client facade
//!
//! Composes the session state and the transport for callers building
//! endpoint wrappers on top of them.

use crate::config::Settings;
use crate::request::Request;
use crate::session::State;
use crate::Result;
use std::sync::Arc;

/// Entry point bundling one session with its transport
#[derive(Debug, Clone)]
pub struct IgApiClient {
    pub state: Arc<State>,
    pub request: Request,
}

impl IgApiClient {
    /// Create a client from settings
    ///
    /// The device is derived from `settings.device.seed`, or from a fresh
    /// random seed when none is configured.
    pub fn new(settings: &Settings) -> Result<Self> {
        let seed = settings
            .device
            .seed
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let state = State::generate(&seed, settings)?;
        tracing::info!("Created client for device {}", state.device_id());
        Self::from_state(state, settings)
    }

    /// Create a client around an existing session state
    pub fn from_state(state: State, settings: &Settings) -> Result<Self> {
        let state = Arc::new(state);
        let request = Request::new(Arc::clone(&state), settings)?;
        Ok(Self { state, request })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceProfile;

    #[test]
    fn test_seeded_client_is_reproducible() {
        let mut settings = Settings::default();
        settings.device.seed = Some("client-seed".to_string());

        let first = IgApiClient::new(&settings).unwrap();
        let second = IgApiClient::new(&settings).unwrap();
        assert_eq!(first.state.device(), second.state.device());
        assert_eq!(first.state.device(), &DeviceProfile::generate("client-seed"));
    }

    #[test]
    fn test_unseeded_clients_differ() {
        let settings = Settings::default();
        let first = IgApiClient::new(&settings).unwrap();
        let second = IgApiClient::new(&settings).unwrap();
        assert_ne!(first.state.device_id(), second.state.device_id());
    }

    #[test]
    fn test_request_shares_state() {
        let client = IgApiClient::new(&Settings::default()).unwrap();
        assert!(Arc::ptr_eq(&client.state, client.request.state()));
    }
}
