//! Mobile API emulation engine
//!
//! Presents a synthetic but stable phone to a vendor's private mobile API:
//! a seeded device identity, per-session state (rotating ids, cookies,
//! checkpoint data), HMAC payload signing, and a transport that retries
//! transport failures and classifies every non-ok answer.
//!
//! # Architecture
//!
//! - [`device`]: seed to device profile, pure and reproducible
//! - [`session`]: mutable session state shared as `Arc<State>`
//! - [`request`]: signer and transport
//! - [`client`]: facade composing the above
//!
//! # Examples
//!
//! ```rust,no_run
//! use igemu::{IgApiClient, RequestOptions, Settings};
//! use serde_json::json;
//!
//! # async fn example() -> igemu::Result<()> {
//! let mut settings = Settings::default();
//! settings.device.seed = Some("my-account".to_string());
//! let client = IgApiClient::new(&settings)?;
//!
//! let signed = client.request.sign_post(json!({"username": "someone"}))?;
//! let response = client
//!     .request
//!     .send(RequestOptions::post("/api/v1/accounts/login/").with_signed_post(&signed))
//!     .await?;
//! println!("{}", response.body);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod request;
pub mod session;
pub mod types;
pub mod utils;

pub use client::IgApiClient;
pub use config::Settings;
pub use device::DeviceProfile;
pub use error::{Error, ErrorCategory, Result};
pub use request::{Request, RequestEnd, RetryPolicy};
pub use session::State;
pub use types::{IgResponse, Payload, RequestOptions, SignedPost};
