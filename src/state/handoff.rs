//! Handoff controller: launch the app scheme, arm the fallback timer, cancel it
//! when the page is hidden and send the user to the store otherwise.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::state::{
    game_id::GameId,
    links::HandoffLinks,
    loop_guard::LoopGuardStore,
    platform::DeviceProfile,
    scheduler::{Scheduler, TimerId},
    state_machine::{HandoffEvent, HandoffPhase, HandoffStateMachine, Snapshot},
};

/// Side effects the controller asks the page to perform.
pub trait Navigator {
    /// Navigate to the custom-scheme URL. Nothing reports whether a handler existed.
    fn open_app(&mut self, url: &str);
    /// Replace the current page with a store listing.
    fn redirect_to_store(&mut self, url: &str);
}

/// Tunables shared by every controller.
#[derive(Debug, Clone)]
pub struct HandoffSettings {
    /// Scheme and store URLs.
    pub links: HandoffLinks,
    /// How long to wait for the app before falling back.
    pub fallback_delay: Duration,
    /// Lifetime of a loop-guard flag; `None` keeps it for the whole session.
    pub guard_ttl: Option<Duration>,
}

/// How a page view enters the handoff flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Not a mobile device: offer both stores, never launch.
    StoreChooser,
    /// An earlier fallback is recorded for this session: show the store view.
    Restored,
    /// Launch the app and arm the fallback timer.
    Launch,
}

impl Entry {
    /// Pick the entry for a device, consulting the loop guard before any launch.
    pub fn resolve(device: &DeviceProfile, guard: &impl LoopGuardStore) -> Self {
        if !device.is_mobile {
            Entry::StoreChooser
        } else if guard.get() {
            Entry::Restored
        } else {
            Entry::Launch
        }
    }
}

/// Drives one page view through idle → attempting → fallback | idle.
pub struct HandoffController<S, N, G> {
    game_id: GameId,
    device: DeviceProfile,
    settings: HandoffSettings,
    machine: HandoffStateMachine,
    pending_timer: Option<TimerId>,
    entry: Option<Entry>,
    auto_redirected: bool,
    scheduler: S,
    navigator: N,
    guard: G,
}

impl<S, N, G> HandoffController<S, N, G>
where
    S: Scheduler,
    N: Navigator,
    G: LoopGuardStore,
{
    /// Create an idle controller. Nothing happens until [`Self::start`].
    pub fn new(
        game_id: GameId,
        device: DeviceProfile,
        settings: HandoffSettings,
        scheduler: S,
        navigator: N,
        guard: G,
    ) -> Self {
        Self {
            game_id,
            device,
            settings,
            machine: HandoffStateMachine::new(),
            pending_timer: None,
            entry: None,
            auto_redirected: false,
            scheduler,
            navigator,
            guard,
        }
    }

    /// Current phase and transition count.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Current phase.
    pub fn phase(&self) -> HandoffPhase {
        self.machine.phase()
    }

    /// Store listing matching the detected platform.
    pub fn store_url(&self) -> &str {
        self.settings.links.store_url(self.device.platform)
    }

    /// Run the automatic entry step once; later calls return the first result.
    pub fn start(&mut self) -> Entry {
        if let Some(entry) = self.entry {
            return entry;
        }

        let entry = Entry::resolve(&self.device, &self.guard);
        self.entry = Some(entry);
        match entry {
            Entry::StoreChooser => {
                debug!(game_id = %self.game_id, "desktop device; skipping app launch");
            }
            Entry::Restored => {
                info!(game_id = %self.game_id, "loop guard set; showing store without launching");
                self.transition(HandoffEvent::GuardRestored);
            }
            Entry::Launch => self.launch(),
        }
        entry
    }

    /// User-initiated retry: launch again and re-arm the timer.
    pub fn retry(&mut self) {
        if !self.device.is_mobile {
            debug!(game_id = %self.game_id, "ignoring retry on desktop device");
            return;
        }
        self.launch();
    }

    /// User-initiated store redirect, bypassing the timer.
    pub fn go_to_store(&mut self) {
        self.cancel_timer();
        self.transition(HandoffEvent::StoreRequested);
        self.send_to_store();
    }

    /// A timer fired. Returns `false` when it was stale or superseded.
    pub fn on_timer_fired(&mut self, id: TimerId) -> bool {
        if self.pending_timer != Some(id) {
            debug!(game_id = %self.game_id, "ignoring superseded fallback timer");
            return false;
        }
        self.pending_timer = None;

        if self.machine.phase() != HandoffPhase::Attempting {
            return false;
        }

        self.transition(HandoffEvent::TimerElapsed);
        if self.auto_redirected {
            return true;
        }
        self.auto_redirected = true;
        info!(
            game_id = %self.game_id,
            platform = ?self.device.platform,
            "app did not take over; falling back to store"
        );
        self.send_to_store();
        true
    }

    /// The page became hidden: the app most likely intercepted the launch.
    pub fn on_visibility_hidden(&mut self) {
        self.cancel_timer();
        if self.machine.phase() == HandoffPhase::Attempting {
            debug!(game_id = %self.game_id, "page hidden while attempting; assuming app opened");
            self.transition(HandoffEvent::AppBackgrounded);
            self.guard.clear();
        }
    }

    /// Cancel anything still scheduled. Called when the page goes away.
    pub fn teardown(&mut self) {
        self.cancel_timer();
    }

    fn launch(&mut self) {
        self.cancel_timer();
        self.transition(HandoffEvent::Attempt);

        let url = self.settings.links.app_url(&self.game_id);
        debug!(game_id = %self.game_id, %url, "launching app scheme");
        self.navigator.open_app(&url);
        self.pending_timer = Some(self.scheduler.schedule(self.settings.fallback_delay));
    }

    fn send_to_store(&mut self) {
        self.guard.set(self.settings.guard_ttl);
        let url = self.settings.links.store_url(self.device.platform).to_string();
        self.navigator.redirect_to_store(&url);
    }

    fn cancel_timer(&mut self) {
        if let Some(id) = self.pending_timer.take() {
            self.scheduler.cancel(id);
        }
    }

    fn transition(&mut self, event: HandoffEvent) {
        if let Err(err) = self.machine.apply(event) {
            warn!(game_id = %self.game_id, error = %err, "ignoring handoff event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::state::{
        loop_guard::{GuardKey, SessionGuardStore, SessionLoopGuard},
        platform::Platform,
        scheduler::ManualScheduler,
    };

    const IOS_STORE: &str = "https://apps.apple.com/app/nextquest";
    const ANDROID_STORE: &str =
        "https://play.google.com/store/apps/details?id=com.nextquest";
    const DELAY: Duration = Duration::from_millis(900);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Nav {
        OpenApp(String),
        Store(String),
    }

    #[derive(Clone, Default)]
    struct RecordingNavigator(Arc<Mutex<Vec<Nav>>>);

    impl RecordingNavigator {
        fn calls(&self) -> Vec<Nav> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn open_app(&mut self, url: &str) {
            self.0.lock().unwrap().push(Nav::OpenApp(url.to_string()));
        }

        fn redirect_to_store(&mut self, url: &str) {
            self.0.lock().unwrap().push(Nav::Store(url.to_string()));
        }
    }

    fn settings(guard_ttl: Option<Duration>) -> HandoffSettings {
        HandoffSettings {
            links: HandoffLinks::new("nextquest", IOS_STORE, ANDROID_STORE),
            fallback_delay: DELAY,
            guard_ttl,
        }
    }

    struct Harness {
        clock: ManualScheduler,
        navigator: RecordingNavigator,
        guard: SessionLoopGuard,
        controller: HandoffController<ManualScheduler, RecordingNavigator, SessionLoopGuard>,
    }

    impl Harness {
        fn new(id: &str, device: DeviceProfile) -> Self {
            Self::with_guard(id, device, |_| {})
        }

        fn with_guard(id: &str, device: DeviceProfile, prepare: impl FnOnce(&SessionLoopGuard)) -> Self {
            let clock = ManualScheduler::new();
            let store = Arc::new(SessionGuardStore::new(Arc::new(clock.clone())));
            let guard = store.guard("session", GuardKey::Install);
            prepare(&guard);
            let navigator = RecordingNavigator::default();
            let controller = HandoffController::new(
                GameId::parse(Some(id)).unwrap(),
                device,
                settings(None),
                clock.clone(),
                navigator.clone(),
                guard.clone(),
            );
            Self {
                clock,
                navigator,
                guard,
                controller,
            }
        }

        fn advance(&mut self, by: Duration) {
            for id in self.clock.advance(by) {
                self.controller.on_timer_fired(id);
            }
        }
    }

    fn android() -> DeviceProfile {
        DeviceProfile {
            platform: Platform::Android,
            is_mobile: true,
        }
    }

    fn iphone() -> DeviceProfile {
        DeviceProfile {
            platform: Platform::Ios,
            is_mobile: true,
        }
    }

    fn desktop() -> DeviceProfile {
        DeviceProfile {
            platform: Platform::Other,
            is_mobile: false,
        }
    }

    #[test]
    fn android_falls_back_to_play_store_after_delay() {
        let mut h = Harness::new("42", android());

        assert_eq!(h.controller.start(), Entry::Launch);
        assert_eq!(h.controller.phase(), HandoffPhase::Attempting);
        assert_eq!(
            h.navigator.calls(),
            vec![Nav::OpenApp("nextquest://game/42".into())]
        );

        h.advance(DELAY);

        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
        assert_eq!(
            h.navigator.calls(),
            vec![
                Nav::OpenApp("nextquest://game/42".into()),
                Nav::Store(ANDROID_STORE.into()),
            ]
        );
        assert!(h.guard.get());
    }

    #[test]
    fn nothing_happens_before_the_delay_elapses() {
        let mut h = Harness::new("42", iphone());
        h.controller.start();
        h.advance(DELAY - Duration::from_millis(1));

        assert_eq!(h.controller.phase(), HandoffPhase::Attempting);
        assert_eq!(h.navigator.calls().len(), 1);
        assert!(!h.guard.get());
    }

    #[test]
    fn hidden_page_cancels_fallback() {
        let mut h = Harness::new("42", iphone());
        h.controller.start();
        h.advance(Duration::from_millis(300));

        h.controller.on_visibility_hidden();
        h.advance(DELAY * 2);

        assert_eq!(h.controller.phase(), HandoffPhase::Idle);
        assert_eq!(h.navigator.calls(), vec![Nav::OpenApp("nextquest://game/42".into())]);
        assert_eq!(h.clock.pending_count(), 0);
        assert!(!h.guard.get());
    }

    #[test]
    fn hidden_page_keeps_guard_outside_attempting() {
        let mut h = Harness::with_guard("42", iphone(), |guard| guard.set(None));
        assert_eq!(h.controller.start(), Entry::Restored);
        h.controller.on_visibility_hidden();
        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
        assert!(h.guard.get());
    }

    #[test]
    fn store_redirect_survives_page_hiding() {
        let mut h = Harness::new("42", iphone());
        h.controller.start();
        h.advance(DELAY);
        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
        assert!(h.guard.get());

        h.controller.on_visibility_hidden();
        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
        assert!(h.guard.get());
    }

    #[test]
    fn hidden_while_attempting_clears_guard() {
        let mut h = Harness::with_guard("42", iphone(), |guard| guard.set(None));
        h.controller.start();
        h.controller.retry();
        assert_eq!(h.controller.phase(), HandoffPhase::Attempting);

        h.controller.on_visibility_hidden();
        assert_eq!(h.controller.phase(), HandoffPhase::Idle);
        assert!(!h.guard.get());
    }

    #[test]
    fn existing_guard_skips_launch_and_timer() {
        let mut h = Harness::with_guard("42", iphone(), |guard| guard.set(None));

        assert_eq!(h.controller.start(), Entry::Restored);
        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
        assert!(h.navigator.calls().is_empty());
        assert_eq!(h.clock.pending_count(), 0);
    }

    #[test]
    fn desktop_gets_store_chooser_without_launch() {
        let mut h = Harness::new("42", desktop());

        assert_eq!(h.controller.start(), Entry::StoreChooser);
        h.controller.retry();
        h.advance(DELAY);

        assert_eq!(h.controller.phase(), HandoffPhase::Idle);
        assert!(h.navigator.calls().is_empty());
        assert_eq!(h.clock.pending_count(), 0);
    }

    #[test]
    fn unrecognised_mobile_falls_back_to_ios_store() {
        let mut h = Harness::new(
            "9",
            DeviceProfile {
                platform: Platform::Other,
                is_mobile: true,
            },
        );
        h.controller.start();
        h.advance(DELAY);

        assert_eq!(h.navigator.calls().last(), Some(&Nav::Store(IOS_STORE.into())));
    }

    #[test]
    fn start_only_launches_once() {
        let mut h = Harness::new("42", iphone());
        h.controller.start();
        h.controller.start();

        assert_eq!(h.navigator.calls().len(), 1);
        assert_eq!(h.clock.pending_count(), 1);
    }

    #[test]
    fn retry_supersedes_previous_timer() {
        let mut h = Harness::new("42", iphone());
        h.controller.start();
        h.advance(Duration::from_millis(600));

        h.controller.retry();
        assert_eq!(h.clock.pending_count(), 1);

        h.advance(Duration::from_millis(600));
        assert_eq!(h.controller.phase(), HandoffPhase::Attempting);

        h.advance(Duration::from_millis(300));
        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
        assert_eq!(
            h.navigator.calls(),
            vec![
                Nav::OpenApp("nextquest://game/42".into()),
                Nav::OpenApp("nextquest://game/42".into()),
                Nav::Store(IOS_STORE.into()),
            ]
        );
    }

    #[test]
    fn timer_redirect_happens_once_per_view() {
        let mut h = Harness::new("42", android());
        h.controller.start();
        h.advance(DELAY);
        h.controller.retry();
        h.advance(DELAY);

        let stores = h
            .navigator
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Nav::Store(_)))
            .count();
        assert_eq!(stores, 1);
        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
    }

    #[test]
    fn go_to_store_bypasses_timer_and_sets_guard() {
        let mut h = Harness::new("42", android());
        h.controller.start();
        h.controller.go_to_store();

        assert_eq!(h.controller.phase(), HandoffPhase::Fallback);
        assert_eq!(h.clock.pending_count(), 0);
        assert_eq!(h.navigator.calls().last(), Some(&Nav::Store(ANDROID_STORE.into())));
        assert!(h.guard.get());

        h.advance(DELAY);
        assert_eq!(h.navigator.calls().len(), 2);
    }

    #[test]
    fn teardown_cancels_pending_timer() {
        let mut h = Harness::new("42", iphone());
        h.controller.start();
        h.controller.teardown();
        h.advance(DELAY);

        assert_eq!(h.controller.phase(), HandoffPhase::Attempting);
        assert!(!h.guard.get());
    }
}
