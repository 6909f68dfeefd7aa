//! Type definitions shared by the signer and the transport
//!
//! This module contains request payloads, request options and normalized responses.

pub mod request;
pub mod response;
pub mod serde_helpers;

pub use request::{CSRF_FIELD, Payload, RequestBody, RequestOptions, SignedPost};
pub use response::{
    ChallengeStateResponse, CheckpointChallenge, CheckpointResponse, IgResponse,
};
