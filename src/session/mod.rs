//! Session state management
//!
//! This module holds everything that makes one logical session look like a
//! single consistent phone: protocol constants, rotating session ids, the
//! cookie jar and the checkpoint/challenge payloads received along the way.

pub mod constants;
pub mod cookie_jar;
pub mod state;

pub use constants::{ApplicationConstants, Capability};
pub use cookie_jar::{Cookie, CookieJar};
pub use state::{DevicePayload, SessionSalt, State};
