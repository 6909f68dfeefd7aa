//! Request type definitions
//!
//! Payloads handed to the signer and the options the transport executes.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Anti-forgery field injected by [`crate::request::Request::sign_post`]
pub const CSRF_FIELD: &str = "_csrftoken";

/// Payload to be signed
///
/// Structured payloads are serialized to JSON; text payloads are signed verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured JSON payload
    Json(Value),
    /// Pre-serialized payload
    Text(String),
}

impl Payload {
    /// Serialized form the signature is computed over
    pub fn canonical_string(&self) -> crate::Result<String> {
        match self {
            Self::Json(value) => Ok(serde_json::to_string(value)?),
            Self::Text(text) => Ok(text.clone()),
        }
    }

    /// Whether the payload is a JSON object lacking a usable CSRF token
    pub fn needs_csrf_token(&self) -> bool {
        match self {
            Self::Json(Value::Object(map)) => match map.get(CSRF_FIELD) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Bool(b)) => !b,
                Some(_) => false,
            },
            _ => false,
        }
    }

    /// Set the CSRF token on an object payload; no-op otherwise
    pub fn set_csrf_token(&mut self, token: impl Into<String>) {
        if let Self::Json(Value::Object(map)) = self {
            map.insert(CSRF_FIELD.to_string(), Value::String(token.into()));
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self::Json(Value::Object(map))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Signed-body envelope sent as a form body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPost {
    /// `"<hex-signature>.<serialized-payload>"`
    pub signed_body: String,
    /// Signature scheme version
    pub ig_sig_key_version: String,
}

impl SignedPost {
    /// Form fields for the request body
    pub fn to_form(&self) -> Vec<(String, String)> {
        vec![
            ("ig_sig_key_version".to_string(), self.ig_sig_key_version.clone()),
            ("signed_body".to_string(), self.signed_body.clone()),
        ]
    }
}

/// Request body variants supported by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `application/json`
    Json(Value),
    /// Raw text body
    Text(String),
}

/// Caller-supplied options for a single request
///
/// Session-derived defaults (base URL, proxy, cookies, default headers)
/// are merged in by the transport; anything set here wins.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL, or an absolute URL
    pub url: String,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// Extra headers; override the defaults with the same name
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<RequestBody>,
    /// Deadline for each attempt
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create options for the given method and path
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Append a query pair
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a header, replacing an earlier one with the same name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Whether a header with this name was supplied
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Form-encoded body
    pub fn with_form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let form = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.body = Some(RequestBody::Form(form));
        self
    }

    /// Signed envelope as the form body
    pub fn with_signed_post(mut self, signed: &SignedPost) -> Self {
        self.body = Some(RequestBody::Form(signed.to_form()));
        self
    }

    /// JSON body
    pub fn with_json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Raw text body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(text.into()));
        self
    }

    /// Per-attempt deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_canonical_string() {
        let text = Payload::from("raw=body");
        assert_eq!(text.canonical_string().unwrap(), "raw=body");

        let json = Payload::from(json!({"count": 1}));
        assert_eq!(json.canonical_string().unwrap(), r#"{"count":1}"#);
    }

    #[test]
    fn test_payload_needs_csrf_token() {
        assert!(Payload::from(json!({})).needs_csrf_token());
        assert!(Payload::from(json!({"_csrftoken": ""})).needs_csrf_token());
        assert!(Payload::from(json!({"_csrftoken": null})).needs_csrf_token());
        assert!(!Payload::from(json!({"_csrftoken": "abc"})).needs_csrf_token());
        assert!(!Payload::from("text").needs_csrf_token());
        assert!(!Payload::from(json!([1, 2])).needs_csrf_token());
    }

    #[test]
    fn test_payload_set_csrf_token() {
        let mut payload = Payload::from(json!({"username": "u"}));
        payload.set_csrf_token("tok");
        assert_eq!(payload, Payload::from(json!({"username": "u", "_csrftoken": "tok"})));

        let mut text = Payload::from("keep");
        text.set_csrf_token("tok");
        assert_eq!(text, Payload::from("keep"));
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::post("api/v1/accounts/login/")
            .with_query("a", "1")
            .with_header("X-Test", "one")
            .with_header("x-test", "two")
            .with_form([("k", "v")])
            .with_timeout(Duration::from_secs(5));

        assert_eq!(options.method, Method::POST);
        assert_eq!(options.query, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(options.headers, vec![("x-test".to_string(), "two".to_string())]);
        assert!(options.has_header("X-TEST"));
        assert_eq!(
            options.body,
            Some(RequestBody::Form(vec![("k".to_string(), "v".to_string())]))
        );
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_signed_post_form() {
        let signed = SignedPost {
            signed_body: "sig.{}".to_string(),
            ig_sig_key_version: "4".to_string(),
        };
        let options = RequestOptions::post("x").with_signed_post(&signed);
        match options.body {
            Some(RequestBody::Form(form)) => {
                assert!(form.contains(&("signed_body".to_string(), "sig.{}".to_string())));
                assert!(form.contains(&("ig_sig_key_version".to_string(), "4".to_string())));
            }
            other => panic!("unexpected body: {:?}", other),
        }
    }
}
