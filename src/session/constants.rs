//! Protocol constants of the emulated application build

use serde::{Deserialize, Serialize};

pub const SIGNATURE_KEY: &str = "937463b5272b5d60e9d20f0f8d7d192193dd95095a3ad43725d494300a5ea5fc";
pub const SIGNATURE_VERSION: &str = "4";
pub const BREADCRUMB_KEY: &str = "iN4$aGr0m";
pub const APP_VERSION: &str = "85.0.0.21.100";
pub const APP_VERSION_CODE: &str = "146536611";
pub const FACEBOOK_ANALYTICS_APPLICATION_ID: &str = "567067343352427";
pub const FACEBOOK_ORCA_APPLICATION_ID: &str = "124024574287414";
pub const FACEBOOK_OTA_FIELDS: &str = "update%7Bdownload_uri%2Cdownload_uri_delta_base%2Cversion_code_delta_base%2Cdownload_uri_delta%2Cfallback_to_full_update%2Cfile_size_delta%2Cversion_code%2Cpublished_date%2Cfile_size%2Cota_bundle_type%2Cresources_checksum%7D";
pub const LOGIN_EXPERIMENTS: &str = "ig_android_fci_onboarding_friend_search,ig_android_device_detection_info_upload,ig_android_sms_retriever_backtest_universe,ig_android_direct_add_direct_to_android_native_photo_share_sheet,ig_growth_android_profile_pic_prefill_with_fb_pic_2,ig_account_identity_logged_out_signals_global_holdout_universe,ig_android_login_identifier_fuzzy_match,ig_android_reliability_leak_fixes_h1_2019,ig_android_push_fcm,ig_android_show_login_info_reminder_universe,ig_android_email_fuzzy_matching_universe,ig_android_one_tap_aymh_redesign_universe,ig_android_direct_send_like_from_notification,ig_android_suma_landing_page,ig_android_session_scoped_logger,ig_android_smartlock_hints_universe,ig_android_account_switch_infra_universe";
pub const EXPERIMENTS: &str = "ig_android_ad_async_ads_universe,ig_android_direct_inbox_presence_refactor_universe,ig_android_feed_auto_share_to_facebook_dialog,ig_android_stories_viewer_responsiveness_universe,ig_android_camera_reduce_file_exif_reads,ig_android_live_use_rtc_upload_universe,ig_android_stories_music_search_typeahead,ig_android_direct_mutation_manager_media_3,ig_android_igtv_autoplay_on_prepare,ig_android_video_exoplayer_2,ig_android_profile_unified_follow_view,ig_android_save_all,ig_android_business_transaction_in_stories_consumer,ig_android_feed_seen_state_with_view_info,ig_android_insta_video_broadcaster_infra_perf,ig_android_biz_story_to_fb_page_improvement";

/// One entry of the supported-capabilities list sent with some requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub value: String,
}

/// Constants identifying the emulated application build
///
/// Defaults match the build the device catalog was captured against; callers
/// emulating a different build replace the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConstants {
    pub signature_key: String,
    pub signature_version: String,
    pub breadcrumb_key: String,
    pub app_version: String,
    pub app_version_code: String,
    pub fb_analytics_application_id: String,
    pub fb_ota_fields: String,
    pub fb_orca_application_id: String,
    pub login_experiments: String,
    pub experiments: String,
    pub supported_capabilities: Vec<Capability>,
}

impl Default for ApplicationConstants {
    fn default() -> Self {
        Self {
            signature_key: SIGNATURE_KEY.to_string(),
            signature_version: SIGNATURE_VERSION.to_string(),
            breadcrumb_key: BREADCRUMB_KEY.to_string(),
            app_version: APP_VERSION.to_string(),
            app_version_code: APP_VERSION_CODE.to_string(),
            fb_analytics_application_id: FACEBOOK_ANALYTICS_APPLICATION_ID.to_string(),
            fb_ota_fields: FACEBOOK_OTA_FIELDS.to_string(),
            fb_orca_application_id: FACEBOOK_ORCA_APPLICATION_ID.to_string(),
            login_experiments: LOGIN_EXPERIMENTS.to_string(),
            experiments: EXPERIMENTS.to_string(),
            supported_capabilities: default_capabilities(),
        }
    }
}

fn default_capabilities() -> Vec<Capability> {
    [
        ("SUPPORTED_SDK_VERSIONS", "13.0,14.0,15.0,16.0,17.0,18.0,19.0,20.0,21.0,22.0,23.0,24.0,25.0,26.0,27.0,28.0,29.0,30.0,31.0,32.0,33.0,34.0,35.0,36.0,37.0,38.0,39.0,40.0,41.0,42.0,43.0,44.0,45.0,46.0,47.0,48.0,49.0,50.0,51.0,52.0,53.0,54.0"),
        ("FACE_TRACKER_VERSION", "12"),
        ("segmentation", "segmentation_enabled"),
        ("COMPRESSION", "ETC2_COMPRESSION"),
        ("world_tracker", "world_tracker_enabled"),
        ("gyroscope", "gyroscope_enabled"),
    ]
    .into_iter()
    .map(|(name, value)| Capability {
        name: name.to_string(),
        value: value.to_string(),
    })
    .collect()
}

impl ApplicationConstants {
    /// Whether `experiment` is listed in the experiments constant
    pub fn is_experiment_enabled(&self, experiment: &str) -> bool {
        self.experiments.split(',').any(|e| e.trim() == experiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let constants = ApplicationConstants::default();
        assert_eq!(constants.signature_version, "4");
        assert_eq!(constants.signature_key.len(), 64);
        assert!(!constants.supported_capabilities.is_empty());
    }

    #[test]
    fn test_is_experiment_enabled() {
        let constants = ApplicationConstants::default();
        assert!(constants.is_experiment_enabled("ig_android_save_all"));
        assert!(!constants.is_experiment_enabled("ig_android_save"));
        assert!(!constants.is_experiment_enabled(""));
    }
}
