//! Server-rendered pages: marketing copy and handoff views.

use askama::Template;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::preview::GamePreview,
    error::ServiceError,
    services::content::{self, Faq, Release},
    state::{
        SharedState,
        game_id::GameId,
        handoff::Entry,
        loop_guard::GuardKey,
        platform::{DeviceProfile, Platform},
    },
};

/// Which handoff view a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffMode {
    /// No usable game identifier.
    NotFound,
    /// Desktop: both store badges, no launch.
    StoreChooser,
    /// Mobile: launching the app.
    Opening,
    /// Mobile with the loop guard set: store view straight away.
    Fallback,
}

impl HandoffMode {
    fn as_str(self) -> &'static str {
        match self {
            HandoffMode::NotFound => "not-found",
            HandoffMode::StoreChooser => "chooser",
            HandoffMode::Opening => "opening",
            HandoffMode::Fallback => "fallback",
        }
    }
}

/// Everything needed to render one handoff page view.
#[derive(Debug, Clone)]
pub struct HandoffView {
    pub mode: HandoffMode,
    pub game_id: Option<GameId>,
    pub device: DeviceProfile,
    /// Ticket the relay script presents on `/handoff/ws`. Only mobile views get one.
    pub ticket: Option<Uuid>,
    /// Preview already in the cache, rendered inline.
    pub preview: Option<GamePreview>,
}

/// Pick the view for a handoff request, registering a socket ticket for mobile devices.
pub fn prepare_handoff(
    state: &SharedState,
    raw_id: Option<&str>,
    user_agent: Option<&str>,
    session_id: &str,
    key: GuardKey,
) -> HandoffView {
    let device = DeviceProfile::from_user_agent(user_agent);
    let Ok(game_id) = GameId::parse(raw_id) else {
        debug!(page = key.storage_key(), "handoff page without game id");
        return HandoffView {
            mode: HandoffMode::NotFound,
            game_id: None,
            device,
            ticket: None,
            preview: None,
        };
    };

    let guard = state.guards().guard(session_id, key);
    let mode = match Entry::resolve(&device, &guard) {
        Entry::StoreChooser => HandoffMode::StoreChooser,
        Entry::Restored => HandoffMode::Fallback,
        Entry::Launch => HandoffMode::Opening,
    };
    let ticket = (mode != HandoffMode::StoreChooser)
        .then(|| state.issue_ticket(game_id.clone(), device, session_id, key));

    HandoffView {
        mode,
        preview: state.previews().cached(&game_id),
        game_id: Some(game_id),
        device,
        ticket,
    }
}

struct PreviewCard {
    name: String,
    cover_url: String,
    details: String,
}

impl From<&GamePreview> for PreviewCard {
    fn from(preview: &GamePreview) -> Self {
        let mut details = Vec::new();
        if let Some(year) = preview.release_year {
            details.push(year.to_string());
        }
        if let Some(platforms) = preview.platform_names.as_ref().filter(|names| !names.is_empty()) {
            details.push(platforms.join(", "));
        }
        Self {
            name: preview.name.clone(),
            cover_url: preview.cover_url.clone().unwrap_or_default(),
            details: details.join(" · "),
        }
    }
}

#[derive(Template)]
#[template(path = "handoff.html")]
struct HandoffTemplate<'a> {
    year: i32,
    version: &'a str,
    mode: &'a str,
    game_id: String,
    ticket: String,
    store_url: &'a str,
    store_name: &'a str,
    is_android: bool,
    ios_store_url: &'a str,
    android_store_url: &'a str,
    preview: Option<PreviewCard>,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate<'a> {
    year: i32,
    version: &'a str,
    ios_store_url: &'a str,
    android_store_url: &'a str,
}

#[derive(Template)]
#[template(path = "changelog.html")]
struct ChangelogTemplate<'a> {
    year: i32,
    version: &'a str,
    releases: &'a [Release],
}

#[derive(Template)]
#[template(path = "support.html")]
struct SupportTemplate<'a> {
    year: i32,
    version: &'a str,
    email: &'a str,
    faqs: &'a [Faq],
}

#[derive(Template)]
#[template(path = "privacy.html")]
struct PrivacyTemplate<'a> {
    year: i32,
    version: &'a str,
}

#[derive(Template)]
#[template(path = "terms.html")]
struct TermsTemplate<'a> {
    year: i32,
    version: &'a str,
}

fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

/// Render a handoff view.
pub fn render_handoff(state: &SharedState, view: &HandoffView) -> Result<String, ServiceError> {
    let links = &state.handoff_settings().links;
    let template = HandoffTemplate {
        year: current_year(),
        version: content::APP_VERSION,
        mode: view.mode.as_str(),
        game_id: view.game_id.as_ref().map(GameId::to_string).unwrap_or_default(),
        ticket: view.ticket.map(|ticket| ticket.to_string()).unwrap_or_default(),
        store_url: links.store_url(view.device.platform),
        store_name: view.device.platform.store_name(),
        is_android: view.device.platform == Platform::Android,
        ios_store_url: links.ios_store_url(),
        android_store_url: links.android_store_url(),
        preview: view.preview.as_ref().map(PreviewCard::from),
    };
    Ok(template.render()?)
}

/// Render the landing page.
pub fn render_home(state: &SharedState) -> Result<String, ServiceError> {
    let links = &state.handoff_settings().links;
    let template = HomeTemplate {
        year: current_year(),
        version: content::APP_VERSION,
        ios_store_url: links.ios_store_url(),
        android_store_url: links.android_store_url(),
    };
    Ok(template.render()?)
}

/// Render the release history.
pub fn render_changelog() -> Result<String, ServiceError> {
    let template = ChangelogTemplate {
        year: current_year(),
        version: content::APP_VERSION,
        releases: content::RELEASES,
    };
    Ok(template.render()?)
}

/// Render the support page with its FAQ.
pub fn render_support() -> Result<String, ServiceError> {
    let template = SupportTemplate {
        year: current_year(),
        version: content::APP_VERSION,
        email: content::SUPPORT_EMAIL,
        faqs: content::FAQS,
    };
    Ok(template.render()?)
}

/// Render the privacy policy.
pub fn render_privacy() -> Result<String, ServiceError> {
    let template = PrivacyTemplate {
        year: current_year(),
        version: content::APP_VERSION,
    };
    Ok(template.render()?)
}

/// Render the terms of service.
pub fn render_terms() -> Result<String, ServiceError> {
    let template = TermsTemplate {
        year: current_year(),
        version: content::APP_VERSION,
    };
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        loop_guard::LoopGuardStore, scheduler::ManualScheduler, tests::test_state,
    };

    const IPHONE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
    const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0";

    #[test]
    fn blank_id_is_not_found() {
        let state = test_state(None, ManualScheduler::new());
        let view = prepare_handoff(&state, Some("   "), Some(IPHONE_UA), "s", GuardKey::Install);

        assert_eq!(view.mode, HandoffMode::NotFound);
        assert!(view.ticket.is_none());
        assert_eq!(state.pending_tickets(), 0);
    }

    #[test]
    fn desktop_gets_store_chooser_without_ticket() {
        let state = test_state(None, ManualScheduler::new());
        let view = prepare_handoff(&state, Some("42"), Some(DESKTOP_UA), "s", GuardKey::Install);

        assert_eq!(view.mode, HandoffMode::StoreChooser);
        assert!(view.ticket.is_none());
    }

    #[test]
    fn mobile_gets_opening_view_with_ticket() {
        let state = test_state(None, ManualScheduler::new());
        let view = prepare_handoff(&state, Some(" 42 "), Some(IPHONE_UA), "s", GuardKey::Install);

        assert_eq!(view.mode, HandoffMode::Opening);
        assert_eq!(view.game_id.as_ref().map(GameId::as_str), Some("42"));
        let ticket = view.ticket.unwrap();
        assert!(state.claim_ticket(&ticket).is_some());
    }

    #[test]
    fn loop_guard_restores_fallback_per_page() {
        let state = test_state(None, ManualScheduler::new());
        state.guards().guard("s", GuardKey::Install).set(None);

        let install = prepare_handoff(&state, Some("42"), Some(IPHONE_UA), "s", GuardKey::Install);
        assert_eq!(install.mode, HandoffMode::Fallback);
        assert!(install.ticket.is_some());

        let game = prepare_handoff(&state, Some("42"), Some(IPHONE_UA), "s", GuardKey::Game);
        assert_eq!(game.mode, HandoffMode::Opening);

        let other_session =
            prepare_handoff(&state, Some("42"), Some(IPHONE_UA), "t", GuardKey::Install);
        assert_eq!(other_session.mode, HandoffMode::Opening);
    }

    #[test]
    fn renders_handoff_views() {
        let state = test_state(None, ManualScheduler::new());

        let opening = prepare_handoff(&state, Some("42"), Some(IPHONE_UA), "s", GuardKey::Install);
        let html = render_handoff(&state, &opening).unwrap();
        assert!(html.contains("data-mode=\"opening\""));
        assert!(html.contains(&opening.ticket.unwrap().to_string()));
        assert!(html.contains("Opening NextQuest"));

        let missing = prepare_handoff(&state, None, Some(IPHONE_UA), "s", GuardKey::Install);
        let html = render_handoff(&state, &missing).unwrap();
        assert!(html.contains("Game Not Found"));
    }

    #[test]
    fn renders_cached_preview_inline() {
        let state = test_state(None, ManualScheduler::new());
        let mut view = prepare_handoff(&state, Some("7"), Some(DESKTOP_UA), "s", GuardKey::Game);
        view.preview = Some(GamePreview {
            id: "7".into(),
            name: "Celeste".into(),
            cover_url: None,
            release_year: Some(2018),
            platform_names: Some(vec!["PC".into(), "Switch".into()]),
        });

        let html = render_handoff(&state, &view).unwrap();
        assert!(html.contains("Celeste"));
        assert!(html.contains("2018 · PC, Switch"));
        assert!(html.contains("Choose Your Store"));
    }

    #[test]
    fn renders_static_pages() {
        let state = test_state(None, ManualScheduler::new());

        assert!(render_home(&state).unwrap().contains("Track Your Gaming Quest"));
        assert!(render_changelog().unwrap().contains("v1.1.1"));
        assert!(render_support().unwrap().contains("Can I use NextQuest offline?"));
        assert!(render_privacy().unwrap().contains("Privacy Policy"));
        assert!(render_terms().unwrap().contains("Terms of Service"));
    }
}
