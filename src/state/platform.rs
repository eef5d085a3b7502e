//! User-agent classification for handoff pages.

use serde::Serialize;
use utoipa::ToSchema;

/// Mobile operating system family detected from a user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iPhone, iPad or iPod.
    Ios,
    /// Any Android device.
    Android,
    /// Desktop browsers and unrecognised devices.
    Other,
}

impl Platform {
    /// Classify a raw user-agent string.
    ///
    /// iOS device tokens are matched before the Android token so a UA that
    /// carries both is reported as iOS.
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ["iphone", "ipad", "ipod"].iter().any(|token| ua.contains(token)) {
            Platform::Ios
        } else if ua.contains("android") {
            Platform::Android
        } else {
            Platform::Other
        }
    }

    /// Display name of the store serving this platform.
    pub fn store_name(self) -> &'static str {
        match self {
            Platform::Android => "Google Play",
            Platform::Ios | Platform::Other => "App Store",
        }
    }
}

/// Whether the user agent looks like a phone or tablet.
///
/// Broader than [`Platform::detect`]: a generic `mobi` token counts, so an
/// unrecognised mobile browser is mobile with platform [`Platform::Other`].
pub fn is_mobile(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ["mobi", "android", "iphone", "ipad", "ipod"]
        .iter()
        .any(|token| ua.contains(token))
}

/// Everything a handoff page needs to know about the requesting device.
///
/// Derived once per page view and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceProfile {
    /// Platform used to pick the store link.
    pub platform: Platform,
    /// Gate for any automatic app-scheme launch.
    pub is_mobile: bool,
}

impl DeviceProfile {
    /// Build the profile from a user-agent header value, treating a missing header as desktop.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let ua = user_agent.unwrap_or_default();
        Self {
            platform: Platform::detect(ua),
            is_mobile: is_mobile(ua),
        }
    }
}
