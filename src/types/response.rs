//! Response type definitions
//!
//! Normalized HTTP responses plus the typed payloads the session state keeps
//! around (checkpoint and challenge state).

use crate::types::serde_helpers::{deserialize_flexible_bool, deserialize_flexible_id};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized response returned by the transport
///
/// `body` is the decoded JSON document for JSON responses, or the raw body
/// as a JSON string when the content is not JSON (or is a tolerated
/// non-2xx decode failure).
#[derive(Debug, Clone)]
pub struct IgResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Decoded body
    pub body: Value,
}

impl IgResponse {
    /// Create a new response
    pub fn new(status: StatusCode, headers: HeaderMap, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Whether the body carries the literal `"ok"` status marker
    pub fn is_ok(&self) -> bool {
        self.body.get("status").and_then(Value::as_str) == Some("ok")
    }

    /// The body's `message` field, when it is a string
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// The body's `error_type` field, when it is a string
    pub fn error_type(&self) -> Option<&str> {
        self.body.get("error_type").and_then(Value::as_str)
    }

    /// First value of a response header
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Deserialize the body into a typed response
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    /// Short human-readable description used in error messages
    pub fn summary(&self) -> String {
        let detail = self
            .message()
            .or_else(|| self.error_type())
            .unwrap_or("no message");
        format!("{} ({})", self.status, detail)
    }
}

/// Typed view of the checkpoint body stored on `challenge_required`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub challenge: Option<CheckpointChallenge>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error_type: Option<String>,
}

/// Challenge descriptor nested in a checkpoint payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointChallenge {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_path: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub hide_webview_header: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub lock: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub logout: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flexible_bool")]
    pub native_flow: Option<bool>,
}

/// Challenge state returned while a checkpoint is being resolved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeStateResponse {
    #[serde(default)]
    pub step_name: Option<String>,
    #[serde(default)]
    pub step_data: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_flexible_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub nonce_code: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub status: String,
}
