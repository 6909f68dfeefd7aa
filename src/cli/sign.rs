//! `igemu sign`: sign a payload the way a POST body would be

use crate::config::Settings;
use crate::request::signer;
use crate::session::State;
use crate::types::{Payload, SignedPost};
use anyhow::{Context, Result};
use serde_json::Value;

/// Arguments for the sign command
#[derive(Debug)]
pub struct SignArgs {
    pub payload: String,
    pub seed: Option<String>,
}

/// JSON objects are signed as structured payloads, anything else verbatim
pub fn parse_payload(raw: &str) -> Payload {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Payload::Json(value),
        _ => Payload::Text(raw.to_string()),
    }
}

/// Signed envelope for `raw` under the session derived from `seed`
pub fn sign_payload(raw: &str, seed: &str, settings: &Settings) -> Result<SignedPost> {
    let state = State::generate(seed, settings).context("Failed to build session state")?;
    signer::sign_post(&state, parse_payload(raw)).context("Failed to sign payload")
}

/// Print the signed envelope as JSON
pub fn run_sign(args: SignArgs, settings: &Settings) -> Result<()> {
    let seed = super::resolve_seed(args.seed, settings);
    let signed = sign_payload(&args.payload, &seed, settings)?;
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload() {
        assert!(matches!(parse_payload(r#"{"a":1}"#), Payload::Json(_)));
        assert!(matches!(parse_payload("[1,2]"), Payload::Text(_)));
        assert!(matches!(parse_payload("plain"), Payload::Text(_)));
    }

    #[test]
    fn test_sign_payload() {
        let signed = sign_payload(r#"{"a":1}"#, "seed", &Settings::default()).unwrap();
        assert_eq!(signed.ig_sig_key_version, "4");
        assert!(signed.signed_body.ends_with(r#".{"_csrftoken":"missing","a":1}"#));

        let again = sign_payload(r#"{"a":1}"#, "other-seed", &Settings::default()).unwrap();
        assert_eq!(signed, again);
    }
}
