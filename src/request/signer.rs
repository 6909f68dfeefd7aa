//! Payload signing
//!
//! Produces the `"<hex-hmac>.<payload>"` signature string and the signed-body
//! envelope the API expects on mutating endpoints.

use crate::session::State;
use crate::types::{Payload, SignedPost};
use crate::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signature string for `payload` under `key`
pub fn sign_with_key(key: &str, payload: &Payload) -> Result<String> {
    let serialized = payload.canonical_string()?;
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| Error::internal(format!("Invalid signing key: {}", e)))?;
    mac.update(serialized.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("{signature}.{serialized}"))
}

/// Signature string for `payload` under the session's signing key
pub fn sign(state: &State, payload: &Payload) -> Result<String> {
    sign_with_key(&state.constants().signature_key, payload)
}

/// Signed-body envelope for `payload`
///
/// Object payloads without a usable `_csrftoken` get the session's CSRF
/// token injected before signing; the payload is consumed.
pub fn sign_post(state: &State, mut payload: Payload) -> Result<SignedPost> {
    if payload.needs_csrf_token() {
        payload.set_csrf_token(state.cookie_csrf_token());
    }
    Ok(SignedPost {
        signed_body: sign(state, &payload)?,
        ig_sig_key_version: state.constants().signature_version.clone(),
    })
}
