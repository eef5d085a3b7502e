//! App-scheme and store URLs.

use crate::state::{game_id::GameId, platform::Platform};

/// Outbound URLs used by the handoff flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffLinks {
    scheme: String,
    ios_store_url: String,
    android_store_url: String,
}

impl HandoffLinks {
    /// Build the link set from a custom scheme (without `://`) and both store listings.
    pub fn new(
        scheme: impl Into<String>,
        ios_store_url: impl Into<String>,
        android_store_url: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            ios_store_url: ios_store_url.into(),
            android_store_url: android_store_url.into(),
        }
    }

    /// `{scheme}://game/{id}` with the identifier inserted as-is.
    pub fn app_url(&self, game_id: &GameId) -> String {
        format!("{}://game/{}", self.scheme, game_id)
    }

    /// Store listing for the platform. Only Android has its own target.
    pub fn store_url(&self, platform: Platform) -> &str {
        match platform {
            Platform::Android => &self.android_store_url,
            Platform::Ios | Platform::Other => &self.ios_store_url,
        }
    }

    /// iOS App Store listing.
    pub fn ios_store_url(&self) -> &str {
        &self.ios_store_url
    }

    /// Google Play listing.
    pub fn android_store_url(&self) -> &str {
        &self.android_store_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> HandoffLinks {
        HandoffLinks::new("nextquest", "https://ios.example", "https://play.example")
    }

    #[test]
    fn app_url_uses_scheme_and_identifier() {
        let id = GameId::parse(Some("42")).unwrap();
        assert_eq!(links().app_url(&id), "nextquest://game/42");
    }

    #[test]
    fn store_selection_defaults_to_ios() {
        let links = links();
        assert_eq!(links.store_url(Platform::Android), "https://play.example");
        assert_eq!(links.store_url(Platform::Ios), "https://ios.example");
        assert_eq!(links.store_url(Platform::Other), "https://ios.example");
    }
}
