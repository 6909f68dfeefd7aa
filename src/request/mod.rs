//! Signed, fault-tolerant transport
//!
//! [`Request`] merges session-derived headers and cookies into each call,
//! executes it under a [`RetryPolicy`], decodes the body without losing
//! integer precision and classifies every non-ok answer into an [`Error`].

pub mod classify;
pub mod json;
pub mod retry;
pub mod signer;

pub use classify::{category_of, classify};
pub use retry::{RetryOutcome, RetryPolicy};

use crate::config::Settings;
use crate::session::State;
use crate::types::{IgResponse, Payload, RequestBody, RequestOptions, SignedPost};
use crate::{Error, Result};
use rand::Rng;
use reqwest::header::{
    CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, LOCATION, SET_COOKIE,
};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use url::Url;

const END_CHANNEL_CAPACITY: usize = 64;
const MAX_REDIRECTS: usize = 10;

/// Notification published after every decoded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnd {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub attempts: u32,
}

/// Transport bound to one session
#[derive(Debug, Clone)]
pub struct Request {
    state: Arc<State>,
    http: Client,
    retry: RetryPolicy,
    end_tx: broadcast::Sender<RequestEnd>,
}

impl Request {
    /// Build the transport for `state`
    ///
    /// Proxy, timeout and TLS verification come from `settings`.
    pub fn new(state: Arc<State>, settings: &Settings) -> Result<Self> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(settings.api.timeout())
            .danger_accept_invalid_certs(settings.api.disable_tls_verification);

        if let Some(proxy) = state.proxy_url() {
            tracing::info!("Routing requests through proxy");
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        if settings.api.disable_tls_verification {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let (end_tx, _) = broadcast::channel(END_CHANNEL_CAPACITY);

        Ok(Self {
            state,
            http: builder
                .build()
                .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))?,
            retry: RetryPolicy::new(&settings.retry),
            end_tx,
        })
    }

    pub fn state(&self) -> &Arc<State> {
        &self.state
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn set_retry_policy(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Receiver for [`RequestEnd`] notifications
    ///
    /// Notifications sent while nobody listens are dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<RequestEnd> {
        self.end_tx.subscribe()
    }

    /// Signature string for `payload`
    pub fn sign(&self, payload: &Payload) -> Result<String> {
        signer::sign(&self.state, payload)
    }

    /// Signed-body envelope for `payload`, injecting the CSRF token if missing
    pub fn sign_post(&self, payload: impl Into<Payload>) -> Result<SignedPost> {
        signer::sign_post(&self.state, payload.into())
    }

    /// Headers every request carries unless the caller overrides them
    pub fn default_headers(&self) -> Vec<(String, String)> {
        let state = &self.state;
        let speed = rand::thread_rng().gen_range(1000..=3700u32);
        vec![
            ("User-Agent".to_string(), state.app_user_agent()),
            ("X-FB-HTTP-Engine".to_string(), "Liger".to_string()),
            ("X-IG-Connection-Type".to_string(), state.connection_type_header().to_string()),
            ("X-IG-Capabilities".to_string(), state.capabilities_header().to_string()),
            ("X-IG-Connection-Speed".to_string(), format!("{speed}kbps")),
            ("X-IG-Bandwidth-Speed-KBPS".to_string(), "-1.000".to_string()),
            ("X-IG-Bandwidth-TotalBytes-B".to_string(), "0".to_string()),
            ("X-IG-Bandwidth-TotalTime-MS".to_string(), "0".to_string()),
            ("X-IG-App-ID".to_string(), state.constants().fb_analytics_application_id.clone()),
            ("Accept".to_string(), "*/*".to_string()),
            ("Accept-Language".to_string(), state.language().replace('_', "-")),
        ]
    }

    /// Absolute URL for `options`, query included
    pub fn resolve_url(&self, options: &RequestOptions) -> Result<Url> {
        let mut url = match Url::parse(&options.url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self.state.api_url().join(&options.url)?,
            Err(e) => return Err(e.into()),
        };
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&options.query);
        }
        Ok(url)
    }

    /// Execute `options` and return the response if its body reports `"ok"`
    ///
    /// Redirects are followed here rather than by the HTTP client so the
    /// cookies set on every hop reach the session jar. Transport failures
    /// that outlast the retry policy surface as [`Error::Network`]; any other
    /// answer is classified.
    pub async fn send(&self, options: RequestOptions) -> Result<IgResponse> {
        let url = self.resolve_url(&options)?;
        let method = options.method.clone();

        let (exchange, attempts) = {
            // Cookies are read and written only while the jar cannot be swapped
            let _shared = self.state.exchange_guard().await;
            let headers = self.merged_headers(&options)?;
            let (options, start, headers) = (&options, &url, &headers);

            let outcome = self
                .retry
                .run(
                    move |attempt| {
                        tracing::debug!("{} {} (attempt {})", options.method, start, attempt + 1);
                        self.exchange(options, start, headers)
                    },
                    |_| true,
                )
                .await;

            let RetryOutcome { result, attempts } = outcome.map_err(|(e, attempts)| {
                tracing::warn!("{} {} failed after {} attempt(s): {}", method, url, attempts, e);
                Error::Network(e)
            })?;
            (result, attempts)
        };

        let Exchange {
            status,
            headers: response_headers,
            bytes,
            url: final_url,
        } = exchange;
        let body = decode_body(status, &response_headers, &bytes)?;

        // No receivers is fine
        let _ = self.end_tx.send(RequestEnd {
            method: method.clone(),
            url: url.to_string(),
            status,
            attempts,
        });

        let response = IgResponse::new(status, response_headers, body);
        if response.is_ok() {
            tracing::debug!("{} {} -> {}", method, final_url, status);
            Ok(response)
        } else {
            Err(classify(&self.state, response))
        }
    }

    /// [`Request::send`] followed by typed deserialization of the body
    pub async fn send_json<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T> {
        self.send(options).await?.json()
    }

    /// One attempt: the request plus every redirect hop it triggers
    async fn exchange(
        &self,
        options: &RequestOptions,
        start: &Url,
        headers: &HeaderMap,
    ) -> std::result::Result<Exchange, reqwest::Error> {
        let mut method = options.method.clone();
        let mut body = options.body.as_ref();
        let mut url = start.clone();
        let mut hops = 0;

        loop {
            let hop_headers = self.with_session_cookies(headers, &url);
            let response = self
                .build(&method, body, &url, &hop_headers, options.timeout)
                .send()
                .await?;
            let status = response.status();
            let response_headers = response.headers().clone();

            let stored = self.state.store_response_cookies(
                &url,
                response_headers
                    .get_all(SET_COOKIE)
                    .iter()
                    .filter_map(|v| v.to_str().ok()),
            );
            if stored > 0 {
                tracing::debug!("Stored {} cookie(s) from {}", stored, url);
            }

            match redirect_target(status, &response_headers, &url) {
                Some(next) if hops < MAX_REDIRECTS => {
                    hops += 1;
                    if switches_to_get(status, &method) {
                        method = Method::GET;
                        body = None;
                    }
                    tracing::debug!("Following {} redirect to {}", status, next);
                    url = next;
                }
                _ => {
                    let bytes = response.bytes().await?.to_vec();
                    return Ok(Exchange {
                        status,
                        headers: response_headers,
                        bytes,
                        url,
                    });
                }
            }
        }
    }

    /// Defaults overlaid with caller headers, caller wins
    fn merged_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.default_headers().iter().chain(options.headers.iter()) {
            headers.insert(header_name(name)?, header_value(name, value)?);
        }
        Ok(headers)
    }

    /// `headers` plus the jar's cookies for `url`, unless a Cookie header is already set
    fn with_session_cookies(&self, headers: &HeaderMap, url: &Url) -> HeaderMap {
        let mut headers = headers.clone();
        if headers.contains_key(COOKIE) {
            return headers;
        }
        if let Some(cookie) = self.state.cookie_header_for(url) {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(e) => tracing::warn!("Skipping unsendable Cookie header: {}", e),
            }
        }
        headers
    }

    fn build(
        &self,
        method: &Method,
        body: Option<&RequestBody>,
        url: &Url,
        headers: &HeaderMap,
        timeout: Option<Duration>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method.clone(), url.clone());
        builder = match body {
            Some(RequestBody::Form(fields)) => builder.form(fields),
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            None => builder,
        };
        // After the body so caller headers beat the body's content type
        builder = builder.headers(headers.clone());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

/// Final response of one attempt
struct Exchange {
    status: StatusCode,
    headers: HeaderMap,
    bytes: Vec<u8>,
    url: Url,
}

/// Where a redirect response points, resolved against the URL that produced it
fn redirect_target(status: StatusCode, headers: &HeaderMap, url: &Url) -> Option<Url> {
    if !status.is_redirection() || status == StatusCode::NOT_MODIFIED {
        return None;
    }
    let location = headers.get(LOCATION)?.to_str().ok()?;
    url.join(location).ok()
}

/// 303 always, and 301/302 for anything but GET/HEAD, are replayed as a bodiless GET
fn switches_to_get(status: StatusCode, method: &Method) -> bool {
    match status {
        StatusCode::SEE_OTHER => *method != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => {
            *method != Method::GET && *method != Method::HEAD
        }
        _ => false,
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::internal(format!("Invalid header name {:?}: {}", name, e)))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::internal(format!("Invalid value for header {:?}: {}", name, e)))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
}

/// JSON bodies are decoded when the content type says so; a decode failure is
/// fatal only for 2xx answers, otherwise the raw text is kept
fn decode_body(status: StatusCode, headers: &HeaderMap, bytes: &[u8]) -> Result<Value> {
    if !is_json(headers) {
        return Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()));
    }
    match json::decode(bytes) {
        Ok(value) => Ok(value),
        Err(e) if status.is_success() => Err(e.into()),
        Err(e) => {
            tracing::debug!("Keeping undecodable {} body as text: {}", status, e);
            Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Cookie;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> Request {
        let settings = Settings::default();
        let state = Arc::new(State::generate("request-tests", &settings).unwrap());
        Request::new(state, &settings).unwrap()
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        headers
    }

    #[test]
    fn test_default_headers() {
        let request = request();
        let headers = request.default_headers();
        let get = |name: &str| {
            headers
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(get("User-Agent"), request.state().app_user_agent());
        assert_eq!(get("X-IG-App-ID"), "567067343352427");
        assert_eq!(get("Accept-Language"), "en-US");
        assert_eq!(get("X-IG-Connection-Type"), "WIFI");
        assert_eq!(get("X-IG-Capabilities"), "3brTvw==");

        let speed: u32 = get("X-IG-Connection-Speed")
            .trim_end_matches("kbps")
            .parse()
            .unwrap();
        assert!((1000..=3700).contains(&speed));
    }

    #[test]
    fn test_caller_headers_win() {
        let request = request();
        let options = RequestOptions::get("/api/v1/test/")
            .with_header("user-agent", "custom")
            .with_header("Cookie", "a=b");
        let url = request.resolve_url(&options).unwrap();
        request
            .state()
            .insert_cookie(Cookie::new("csrftoken", "tok", "instagram.com"));
        let headers = request.with_session_cookies(&request.merged_headers(&options).unwrap(), &url);

        assert_eq!(headers.get("user-agent").unwrap(), "custom");
        assert_eq!(headers.get_all("user-agent").iter().count(), 1);
        assert_eq!(headers.get(COOKIE).unwrap(), "a=b");
        assert_eq!(headers.get("x-fb-http-engine").unwrap(), "Liger");
    }

    #[test]
    fn test_jar_cookies_fill_missing_cookie_header() {
        let request = request();
        request
            .state()
            .insert_cookie(Cookie::new("csrftoken", "tok", "instagram.com"));
        let options = RequestOptions::get("/api/v1/test/");
        let url = request.resolve_url(&options).unwrap();

        let headers = request.with_session_cookies(&request.merged_headers(&options).unwrap(), &url);
        assert_eq!(headers.get(COOKIE).unwrap(), "csrftoken=tok");

        let elsewhere = Url::parse("https://example.com/").unwrap();
        let headers = request.with_session_cookies(&HeaderMap::new(), &elsewhere);
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn test_redirect_target() {
        let url = Url::parse("https://i.instagram.com/api/v1/start/").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("../final/"));

        assert_eq!(
            redirect_target(StatusCode::FOUND, &headers, &url).unwrap().as_str(),
            "https://i.instagram.com/api/v1/final/"
        );
        assert!(redirect_target(StatusCode::OK, &headers, &url).is_none());
        assert!(redirect_target(StatusCode::NOT_MODIFIED, &headers, &url).is_none());
        assert!(redirect_target(StatusCode::FOUND, &HeaderMap::new(), &url).is_none());
    }

    #[rstest]
    #[case(StatusCode::SEE_OTHER, Method::POST, true)]
    #[case(StatusCode::SEE_OTHER, Method::HEAD, false)]
    #[case(StatusCode::FOUND, Method::POST, true)]
    #[case(StatusCode::MOVED_PERMANENTLY, Method::POST, true)]
    #[case(StatusCode::FOUND, Method::GET, false)]
    #[case(StatusCode::TEMPORARY_REDIRECT, Method::POST, false)]
    #[case(StatusCode::PERMANENT_REDIRECT, Method::POST, false)]
    fn test_switches_to_get(
        #[case] status: StatusCode,
        #[case] method: Method,
        #[case] expected: bool,
    ) {
        assert_eq!(switches_to_get(status, &method), expected);
    }

    #[tokio::test]
    async fn test_cookie_header_waits_for_jar_swap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/feed/"))
            .and(header("cookie", "sessionid=restored"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = Settings::default();
        settings.api.base_url = server.uri();
        let state = Arc::new(State::generate("request-tests", &settings).unwrap());
        let host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();
        state.insert_cookie(Cookie::new("sessionid", "old", host.as_str()));
        let request = Request::new(Arc::clone(&state), &settings).unwrap();

        // Stand in for a jar load that is already running
        let exclusive = state.exclusive_guard().await;
        let pending = tokio::spawn({
            let request = request.clone();
            async move { request.send(RequestOptions::get("/api/v1/feed/")).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!pending.is_finished());

        state.insert_cookie(Cookie::new("sessionid", "restored", host.as_str()));
        drop(exclusive);

        let response = pending.await.unwrap().unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[test]
    fn test_resolve_url() {
        let request = request();

        let url = request
            .resolve_url(&RequestOptions::get("/api/v1/users/1/info/").with_query("q", "a b"))
            .unwrap();
        assert_eq!(url.as_str(), "https://i.instagram.com/api/v1/users/1/info/?q=a+b");

        let url = request
            .resolve_url(&RequestOptions::get("https://www.instagram.com/x"))
            .unwrap();
        assert_eq!(url.as_str(), "https://www.instagram.com/x");
    }

    #[test]
    fn test_decode_body_rules() {
        let ok = StatusCode::OK;
        let bad = StatusCode::BAD_REQUEST;

        let value = decode_body(ok, &json_headers(), br#"{"pk":123456789012345678}"#).unwrap();
        assert_eq!(value, json!({"pk": "123456789012345678"}));

        assert!(decode_body(ok, &json_headers(), b"oops").is_err());

        let value = decode_body(bad, &json_headers(), b"oops").unwrap();
        assert_eq!(value, json!("oops"));

        let value = decode_body(ok, &HeaderMap::new(), br#"{"status":"ok"}"#).unwrap();
        assert_eq!(value, json!(r#"{"status":"ok"}"#));
    }

    #[test]
    fn test_sign_post_through_request() {
        let request = request();
        let signed = request.sign_post(json!({"x": 1})).unwrap();
        assert_eq!(signed.ig_sig_key_version, "4");
        assert!(signed.signed_body.contains(r#""_csrftoken":"missing""#));
    }
}
