//! Session state
//!
//! Single source of truth for everything that varies per logical session:
//! the device, protocol constants, rotating session-id salts, the cookie jar
//! and checkpoint/challenge payloads. Shared as `Arc<State>`; mutable parts
//! sit behind their own locks so header and signing computations can run in
//! parallel while writes to cookies and checkpoint data stay serialized.

use super::constants::ApplicationConstants;
use super::cookie_jar::{Cookie, CookieJar};
use crate::config::Settings;
use crate::device::{DeviceDescriptor, DeviceProfile, seeded_guid, seeded_rng};
use crate::types::{ChallengeStateResponse, CheckpointResponse};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Local, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use url::Url;

const CHARGING_BUCKET_MS: f64 = 10_800_000.0;

/// Salt feeding one of the rotating session identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSalt {
    pub value: String,
    pub lifetime: Duration,
    pub rotated_at: DateTime<Utc>,
}

impl SessionSalt {
    fn new(lifetime: Duration, now: DateTime<Utc>) -> Self {
        Self {
            value: now.timestamp_millis().to_string(),
            lifetime,
            rotated_at: now,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.rotated_at >= self.lifetime
    }

    fn rotate(&mut self, now: DateTime<Utc>) {
        self.value = now.timestamp_millis().to_string();
        self.rotated_at = now;
    }
}

/// Device fields sent in some request payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevicePayload {
    pub android_version: String,
    pub android_release: String,
    pub manufacturer: String,
    pub model: String,
}

/// Mutable per-session state
#[derive(Debug)]
pub struct State {
    constants: ApplicationConstants,
    language: String,
    timezone_offset: String,
    radio_type: String,
    capabilities_header: String,
    connection_type_header: String,
    api_url: Url,
    proxy_url: Option<String>,
    device: DeviceProfile,
    descriptor: DeviceDescriptor,
    client_session_salt: RwLock<SessionSalt>,
    pigeon_session_salt: RwLock<SessionSalt>,
    fixed_session_id: RwLock<Option<String>>,
    cookie_jar: RwLock<CookieJar>,
    checkpoint: RwLock<Option<Value>>,
    challenge: RwLock<Option<ChallengeStateResponse>>,
    // Requests hold it shared; jar (de)serialization holds it exclusively
    exchange_gate: tokio::sync::RwLock<()>,
}

impl State {
    /// Create the state for `device` using `settings`
    ///
    /// Fails when the device descriptor cannot be parsed or the configured
    /// base URL is invalid.
    pub fn new(device: DeviceProfile, settings: &Settings) -> Result<Self> {
        let descriptor = device.parse_descriptor()?;
        let api_url = Url::parse(&settings.api.base_url)?;
        let now = Utc::now();
        let timezone_offset = settings
            .api
            .timezone_offset
            .unwrap_or_else(|| Local::now().offset().local_minus_utc())
            .to_string();

        Ok(Self {
            constants: ApplicationConstants::default(),
            language: settings.api.language.clone(),
            timezone_offset,
            radio_type: "wifi-none".to_string(),
            capabilities_header: "3brTvw==".to_string(),
            connection_type_header: "WIFI".to_string(),
            api_url,
            proxy_url: settings.get_proxy_url(),
            device,
            descriptor,
            client_session_salt: RwLock::new(SessionSalt::new(
                Duration::milliseconds(settings.session.client_session_id_lifetime_ms as i64),
                now,
            )),
            pigeon_session_salt: RwLock::new(SessionSalt::new(
                Duration::milliseconds(settings.session.pigeon_session_id_lifetime_ms as i64),
                now,
            )),
            fixed_session_id: RwLock::new(settings.session.fixed_session_id.clone()),
            cookie_jar: RwLock::new(CookieJar::new()),
            checkpoint: RwLock::new(None),
            challenge: RwLock::new(None),
            exchange_gate: tokio::sync::RwLock::new(()),
        })
    }

    /// Generate the device for `seed` and build the state around it
    pub fn generate(seed: &str, settings: &Settings) -> Result<Self> {
        Self::new(DeviceProfile::generate(seed), settings)
    }

    /// Replace the device with the one derived from `seed`
    pub fn generate_device(&mut self, seed: &str) -> Result<()> {
        let device = DeviceProfile::generate(seed);
        self.descriptor = device.parse_descriptor()?;
        self.device = device;
        Ok(())
    }

    /// Replace the protocol constants
    pub fn with_constants(mut self, constants: ApplicationConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn constants(&self) -> &ApplicationConstants {
        &self.constants
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn timezone_offset(&self) -> &str {
        &self.timezone_offset
    }

    pub fn radio_type(&self) -> &str {
        &self.radio_type
    }

    pub fn capabilities_header(&self) -> &str {
        &self.capabilities_header
    }

    pub fn connection_type_header(&self) -> &str {
        &self.connection_type_header
    }

    /// Base URL of the API host; cookie lookups are scoped to it
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy_url.as_deref()
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn device_id(&self) -> &str {
        &self.device.device_id
    }

    pub fn is_experiment_enabled(&self, experiment: &str) -> bool {
        self.constants.is_experiment_enabled(experiment)
    }

    // -- rotating identifiers --------------------------------------------

    /// Current application session id, derived from the client salt
    pub fn client_session_id(&self) -> String {
        let salt = read(&self.client_session_salt).value.clone();
        self.salty_guid("clientSessionId", &salt)
    }

    /// The fixed override when set, otherwise [`State::client_session_id`]
    pub fn fixed_client_session_id(&self) -> String {
        read(&self.fixed_session_id)
            .clone()
            .unwrap_or_else(|| self.client_session_id())
    }

    pub fn set_fixed_session_id(&self, session_id: Option<String>) {
        *write(&self.fixed_session_id) = session_id;
    }

    /// Current pigeon (analytics) session id, derived from the pigeon salt
    pub fn pigeon_session_id(&self) -> String {
        let salt = read(&self.pigeon_session_salt).value.clone();
        self.salty_guid("pigeonSessionId", &salt)
    }

    pub fn client_session_salt(&self) -> SessionSalt {
        read(&self.client_session_salt).clone()
    }

    pub fn pigeon_session_salt(&self) -> SessionSalt {
        read(&self.pigeon_session_salt).clone()
    }

    /// Pin the client salt to a known value
    pub fn set_client_session_salt(&self, value: impl Into<String>) {
        write(&self.client_session_salt).value = value.into();
    }

    /// Pin the pigeon salt to a known value
    pub fn set_pigeon_session_salt(&self, value: impl Into<String>) {
        write(&self.pigeon_session_salt).value = value.into();
    }

    pub fn rotate_client_session_salt(&self, now: DateTime<Utc>) {
        write(&self.client_session_salt).rotate(now);
    }

    pub fn rotate_pigeon_session_salt(&self, now: DateTime<Utc>) {
        write(&self.pigeon_session_salt).rotate(now);
    }

    /// Rotate every salt whose lifetime elapsed at `now`
    ///
    /// Returns true when at least one salt changed.
    pub fn rotate_expired_salts(&self, now: DateTime<Utc>) -> bool {
        let mut rotated = false;
        for lock in [&self.client_session_salt, &self.pigeon_session_salt] {
            let mut salt = write(lock);
            if salt.is_expired(now) {
                salt.rotate(now);
                rotated = true;
            }
        }
        if rotated {
            tracing::debug!("Rotated expired session id salts");
        }
        rotated
    }

    fn salty_guid(&self, kind: &str, salt: &str) -> String {
        seeded_guid(&format!("{}{}{}", kind, self.device.device_id, salt))
    }

    // -- user agents and device views -------------------------------------

    /// User agent of the native application
    pub fn app_user_agent(&self) -> String {
        format!(
            "Instagram {} Android ({}; {}; {})",
            self.constants.app_version,
            self.device.descriptor,
            self.language,
            self.constants.app_version_code
        )
    }

    /// User agent of the in-app web view
    pub fn web_user_agent(&self) -> String {
        format!(
            "Mozilla/5.0 (Linux; Android {}; {} Build/{}; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/70.0.3538.110 Mobile Safari/537.36 {}",
            self.descriptor.android_release,
            self.descriptor.model,
            self.device.build,
            self.app_user_agent()
        )
    }

    /// User agent used by the embedded Facebook SDK
    ///
    /// The app reports a fixed density and system version here whatever the
    /// device descriptor says; only the resolution and names vary.
    pub fn fb_user_agent(&self) -> String {
        let manufacturer = self.descriptor.manufacturer.to_uppercase();
        let props = [
            ("FBAN", "InstagramForAndroid".to_string()),
            ("FBAV", self.constants.app_version.clone()),
            ("FBBV", self.constants.app_version_code.clone()),
            (
                "FBDM",
                format!(
                    "{{density=4.0,width={},height={}}}",
                    self.descriptor.width, self.descriptor.height
                ),
            ),
            ("FBLC", self.language.clone()),
            ("FBCR", String::new()),
            ("FBMF", manufacturer.clone()),
            ("FBBD", manufacturer),
            ("FBPN", "com.instagram.android".to_string()),
            ("FBDV", self.descriptor.model.to_uppercase()),
            ("FBSV", "7.0".to_string()),
            ("FBBK", "1".to_string()),
            ("FBCA", "armeabi-v7a:armeabi".to_string()),
        ];

        let body: String = props
            .iter()
            .map(|(key, value)| format!("{key}/{value};"))
            .collect();
        format!("[{body}]")
    }

    pub fn device_payload(&self) -> DevicePayload {
        DevicePayload {
            android_version: self.descriptor.android_version.clone(),
            android_release: self.descriptor.android_release.clone(),
            manufacturer: self.descriptor.manufacturer_name().to_string(),
            model: self.descriptor.model.clone(),
        }
    }

    // -- simulated telemetry ---------------------------------------------

    pub fn battery_level(&self) -> u8 {
        self.battery_level_at(Utc::now())
    }

    /// Battery percentage (1..=100) that drains on a per-device cadence
    pub fn battery_level_at(&self, now: DateTime<Utc>) -> u8 {
        let mut rng = seeded_rng(&self.device.device_id);
        let seconds_per_percent = f64::from(rng.gen_range(200..=600u32));
        let seconds = now.timestamp_millis() as f64 / 1000.0;
        let drained = (seconds / seconds_per_percent).round() as i64;
        (100 - drained.rem_euclid(100)) as u8
    }

    pub fn is_charging(&self) -> bool {
        self.is_charging_at(Utc::now())
    }

    /// Charging flag, stable within a three hour bucket
    pub fn is_charging_at(&self, now: DateTime<Utc>) -> bool {
        let bucket = (now.timestamp_millis() as f64 / CHARGING_BUCKET_MS).round() as i64;
        seeded_rng(&format!("{}{}", self.device.device_id, bucket)).gen_bool(0.5)
    }

    // -- cookies ------------------------------------------------------------

    /// Cookie named `name` visible to the API host, if any
    pub fn extract_cookie(&self, name: &str) -> Option<Cookie> {
        read(&self.cookie_jar)
            .find(&self.api_url, name, Utc::now())
            .cloned()
    }

    /// Value of the cookie named `name`
    pub fn extract_cookie_value(&self, name: &str) -> Result<String> {
        self.extract_cookie(name)
            .map(|cookie| cookie.value)
            .ok_or_else(|| Error::cookie_not_found(name))
    }

    /// CSRF token cookie, `"missing"` when absent
    pub fn cookie_csrf_token(&self) -> String {
        self.extract_cookie_value("csrftoken")
            .unwrap_or_else(|_| "missing".to_string())
    }

    /// Logged-in user id cookie, `"0"` when absent
    pub fn cookie_user_id(&self) -> String {
        self.extract_cookie_value("ds_user_id")
            .unwrap_or_else(|_| "0".to_string())
    }

    /// Logged-in username cookie
    pub fn cookie_username(&self) -> Result<String> {
        self.extract_cookie_value("ds_user")
    }

    /// Numeric id of the current user
    ///
    /// Prefers the cookie, then the user id of the stored challenge state.
    pub fn extract_user_id(&self) -> Result<String> {
        if let Ok(user_id) = self.extract_cookie_value("ds_user_id") {
            return Ok(user_id);
        }
        read(&self.challenge)
            .as_ref()
            .and_then(|challenge| challenge.user_id.clone())
            .ok_or(Error::UserIdNotFound)
    }

    /// Insert a cookie into the jar
    pub fn insert_cookie(&self, cookie: Cookie) {
        write(&self.cookie_jar).store(cookie, Utc::now());
    }

    /// Number of cookies currently held
    pub fn cookie_count(&self) -> usize {
        read(&self.cookie_jar).len()
    }

    pub(crate) fn cookie_header_for(&self, url: &Url) -> Option<String> {
        read(&self.cookie_jar).cookie_header(url, Utc::now())
    }

    pub(crate) fn store_response_cookies<'a>(
        &self,
        url: &Url,
        headers: impl IntoIterator<Item = &'a str>,
    ) -> usize {
        write(&self.cookie_jar).store_set_cookie_headers(headers, url, Utc::now())
    }

    pub(crate) async fn exchange_guard(&self) -> tokio::sync::RwLockReadGuard<'_, ()> {
        self.exchange_gate.read().await
    }

    pub(crate) async fn exclusive_guard(&self) -> tokio::sync::RwLockWriteGuard<'_, ()> {
        self.exchange_gate.write().await
    }

    /// Serialize the cookie jar for persistence
    ///
    /// Waits for in-flight requests to finish first.
    pub async fn serialize_cookie_jar(&self) -> Result<String> {
        let _exclusive = self.exclusive_guard().await;
        read(&self.cookie_jar).serialize()
    }

    /// Replace the cookie jar with a previously serialized one
    ///
    /// Waits for in-flight requests to finish first.
    pub async fn deserialize_cookie_jar(&self, serialized: &str) -> Result<()> {
        let _exclusive = self.exclusive_guard().await;
        let jar = CookieJar::deserialize(serialized)?;
        tracing::debug!("Restored cookie jar with {} cookies", jar.len());
        *write(&self.cookie_jar) = jar;
        Ok(())
    }

    // -- checkpoint / challenge -------------------------------------------

    /// Body of the last `challenge_required` response, exactly as received
    pub fn checkpoint(&self) -> Option<Value> {
        read(&self.checkpoint).clone()
    }

    /// Typed view of the stored checkpoint
    pub fn checkpoint_response(&self) -> Result<CheckpointResponse> {
        let body = self.checkpoint().ok_or(Error::NoCheckpoint)?;
        Ok(serde_json::from_value(body)?)
    }

    pub(crate) fn store_checkpoint(&self, body: &Value) {
        *write(&self.checkpoint) = Some(body.clone());
    }

    pub fn clear_checkpoint(&self) {
        *write(&self.checkpoint) = None;
    }

    /// API path of the stored checkpoint challenge
    pub fn challenge_url(&self) -> Result<String> {
        read(&self.checkpoint)
            .as_ref()
            .and_then(|checkpoint| checkpoint.pointer("/challenge/api_path"))
            .and_then(Value::as_str)
            .map(|api_path| format!("/api/v1{api_path}"))
            .ok_or(Error::NoCheckpoint)
    }

    pub fn challenge(&self) -> Option<ChallengeStateResponse> {
        read(&self.challenge).clone()
    }

    pub fn set_challenge(&self, challenge: ChallengeStateResponse) {
        *write(&self.challenge) = Some(challenge);
    }

    pub fn clear_challenge(&self) {
        *write(&self.challenge) = None;
    }
}

// A panic while holding one of these locks cannot leave the data half-written
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
