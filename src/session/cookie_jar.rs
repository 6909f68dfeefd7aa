//! Cookie storage for a single session
//!
//! Manual RFC 6265 style jar: cookies are keyed by (domain, name), matched
//! against request URLs by domain suffix and path prefix, and serialized to
//! an opaque JSON string for the caller to persist.

use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

const SERIALIZED_VERSION: u32 = 1;

/// Upper bound for `Max-Age`, in seconds (400 days, as in RFC 6265bis)
const MAX_AGE_LIMIT: i64 = 400 * 24 * 60 * 60;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Lowercase domain without a leading dot
    pub domain: String,
    pub path: String,
    /// `None` for session cookies
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    /// Set when the cookie had no Domain attribute; only the exact host matches
    pub host_only: bool,
    pub same_site: Option<String>,
}

impl Cookie {
    /// Session cookie valid for `domain` and its subdomains
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: normalize_domain(&domain.into()),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            host_only: false,
            same_site: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Parse a `Set-Cookie` header received for `request_url`
    pub fn parse_set_cookie(header: &str, request_url: &Url, now: DateTime<Utc>) -> Result<Self> {
        let request_host = request_url
            .host_str()
            .ok_or_else(|| Error::cookie_parse("request URL has no host"))?
            .to_lowercase();

        let mut parts = header.split(';').map(str::trim);
        let (name, value) = parts
            .next()
            .and_then(|pair| pair.split_once('='))
            .ok_or_else(|| Error::cookie_parse("missing name=value pair"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::cookie_parse("empty cookie name"));
        }

        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'), request_host.clone());
        cookie.host_only = true;
        cookie.path = default_path(request_url);

        let mut max_age: Option<i64> = None;
        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            let val = val.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "domain" if !val.is_empty() => {
                    let domain = normalize_domain(val);
                    if !domain_matches(&request_host, &domain) {
                        return Err(Error::cookie_parse(format!(
                            "domain {domain} does not match host {request_host}"
                        )));
                    }
                    cookie.domain = domain;
                    cookie.host_only = false;
                }
                "path" if val.starts_with('/') => cookie.path = val.to_string(),
                "expires" => {
                    if let Some(expires) = parse_cookie_date(val) {
                        cookie.expires = Some(expires);
                    }
                }
                "max-age" => max_age = val.parse().ok(),
                "samesite" if !val.is_empty() => cookie.same_site = Some(val.to_string()),
                _ => {}
            }
        }

        // Max-Age takes precedence over Expires
        if let Some(seconds) = max_age {
            cookie.expires = Some(if seconds <= 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                Duration::try_seconds(seconds.min(MAX_AGE_LIMIT))
                    .and_then(|lifetime| now.checked_add_signed(lifetime))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            });
        }

        Ok(cookie)
    }

    /// Whether the cookie has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Whether the cookie would be sent with a request to `url` at `now`
    pub fn matches_url(&self, url: &Url, now: DateTime<Utc>) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        if self.is_expired(now) || (self.secure && url.scheme() != "https") {
            return false;
        }

        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };

        domain_ok && path_matches(url.path(), &self.path)
    }
}

/// Mutable cookie set keyed by (domain, name)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<(String, String), Cookie>,
}

#[derive(Serialize, Deserialize)]
struct SerializedJar {
    version: u32,
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cookie; an already expired cookie removes its entry instead
    pub fn store(&mut self, cookie: Cookie, now: DateTime<Utc>) {
        let key = (cookie.domain.clone(), cookie.name.clone());
        if cookie.is_expired(now) {
            self.cookies.remove(&key);
        } else {
            self.cookies.insert(key, cookie);
        }
    }

    /// Store every `Set-Cookie` value received for `request_url`
    ///
    /// Malformed headers are skipped. Returns the number of cookies applied.
    pub fn store_set_cookie_headers<'a>(
        &mut self,
        headers: impl IntoIterator<Item = &'a str>,
        request_url: &Url,
        now: DateTime<Utc>,
    ) -> usize {
        let mut applied = 0;
        for header in headers {
            match Cookie::parse_set_cookie(header, request_url, now) {
                Ok(cookie) => {
                    tracing::debug!("Storing cookie {} for {}", cookie.name, cookie.domain);
                    self.store(cookie, now);
                    applied += 1;
                }
                Err(e) => tracing::debug!("Ignoring Set-Cookie header: {}", e),
            }
        }
        applied
    }

    pub fn get(&self, domain: &str, name: &str) -> Option<&Cookie> {
        self.cookies
            .get(&(normalize_domain(domain), name.to_string()))
    }

    pub fn remove(&mut self, domain: &str, name: &str) -> Option<Cookie> {
        self.cookies
            .remove(&(normalize_domain(domain), name.to_string()))
    }

    /// Cookies sent with a request to `url`, most specific path first
    pub fn cookies_for_url(&self, url: &Url, now: DateTime<Utc>) -> Vec<&Cookie> {
        let mut matching: Vec<&Cookie> = self
            .cookies
            .values()
            .filter(|c| c.matches_url(url, now))
            .collect();
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        matching
    }

    /// Find a cookie by name among those matching `url`
    pub fn find(&self, url: &Url, name: &str, now: DateTime<Utc>) -> Option<&Cookie> {
        self.cookies_for_url(url, now)
            .into_iter()
            .find(|c| c.name == name)
    }

    /// Value of the `Cookie` request header for `url`
    pub fn cookie_header(&self, url: &Url, now: DateTime<Utc>) -> Option<String> {
        let cookies = self.cookies_for_url(url, now);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Drop cookies that expired at `now`
    pub fn remove_expired(&mut self, now: DateTime<Utc>) {
        self.cookies.retain(|_, c| !c.is_expired(now));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Opaque string form for persistence
    pub fn serialize(&self) -> Result<String> {
        let serialized = SerializedJar {
            version: SERIALIZED_VERSION,
            cookies: self.cookies.values().cloned().collect(),
        };
        Ok(serde_json::to_string(&serialized)?)
    }

    /// Rebuild a jar from [`CookieJar::serialize`] output
    pub fn deserialize(serialized: &str) -> Result<Self> {
        let parsed: SerializedJar = serde_json::from_str(serialized)?;
        if parsed.version != SERIALIZED_VERSION {
            return Err(Error::cookie_parse(format!(
                "unsupported cookie jar version {}",
                parsed.version
            )));
        }

        let cookies = parsed
            .cookies
            .into_iter()
            .map(|c| ((c.domain.clone(), c.name.clone()), c))
            .collect();
        Ok(Self { cookies })
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('.').to_lowercase()
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/')
                || request_path[cookie_path.len()..].starts_with('/')))
}

fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%a, %d %b %Y %H:%M:%S GMT",
        "%a, %d-%b-%Y %H:%M:%S GMT",
        "%a, %d-%b-%y %H:%M:%S GMT",
        "%A, %d-%b-%y %H:%M:%S GMT",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}
