//! Session-scoped "already fell back" flags.
//!
//! A set flag makes later loads of the same handoff page in the same browser
//! session go straight to the store view instead of launching the app scheme
//! again.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;

use crate::state::scheduler::Clock;

/// Set/get/clear access to a single loop-guard flag.
pub trait LoopGuardStore {
    /// Record the fallback. With `ttl` the flag lapses after that long.
    fn set(&self, ttl: Option<Duration>);
    /// Whether a live flag is recorded.
    fn get(&self) -> bool;
    /// Forget the flag.
    fn clear(&self);
}

/// Which handoff page a flag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardKey {
    /// `/install?gameId=`
    Install,
    /// Legacy `/game?id=` and `/game/{id}`.
    Game,
}

impl GuardKey {
    /// Storage key naming the flag.
    pub fn storage_key(self) -> &'static str {
        match self {
            GuardKey::Install => "nextquest-install-fallback",
            GuardKey::Game => "nextquest-game-fallback",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GuardEntry {
    created_at: Instant,
    expires_at: Option<Instant>,
}

impl GuardEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

type EntryKey = (String, GuardKey);

/// Process-wide table of loop-guard flags keyed by browser session and page.
pub struct SessionGuardStore {
    entries: DashMap<EntryKey, GuardEntry>,
    clock: Arc<dyn Clock>,
}

impl SessionGuardStore {
    /// Create an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Handle for one session's flag on one page.
    pub fn guard(self: &Arc<Self>, session_id: &str, key: GuardKey) -> SessionLoopGuard {
        SessionLoopGuard {
            store: Arc::clone(self),
            entry: (session_id.to_string(), key),
        }
    }

    /// Drop expired flags and flags older than `max_age`, returning how many were removed.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            !entry.is_expired(now) && now.saturating_duration_since(entry.created_at) < max_age
        });
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored flags, live or not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no flags.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set(&self, key: &EntryKey, ttl: Option<Duration>) {
        let now = self.clock.now();
        self.entries.insert(
            key.clone(),
            GuardEntry {
                created_at: now,
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
    }

    fn get(&self, key: &EntryKey) -> bool {
        let now = self.clock.now();
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            return false;
        }
        self.entries.contains_key(key)
    }

    fn clear(&self, key: &EntryKey) {
        self.entries.remove(key);
    }
}

/// [`LoopGuardStore`] bound to one session and page.
#[derive(Clone)]
pub struct SessionLoopGuard {
    store: Arc<SessionGuardStore>,
    entry: EntryKey,
}

impl LoopGuardStore for SessionLoopGuard {
    fn set(&self, ttl: Option<Duration>) {
        self.store.set(&self.entry, ttl);
    }

    fn get(&self) -> bool {
        self.store.get(&self.entry)
    }

    fn clear(&self) {
        self.store.clear(&self.entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::scheduler::ManualScheduler;

    fn store() -> (ManualScheduler, Arc<SessionGuardStore>) {
        let clock = ManualScheduler::new();
        let store = Arc::new(SessionGuardStore::new(Arc::new(clock.clone())));
        (clock, store)
    }

    #[test]
    fn persistent_flag_survives_until_cleared() {
        let (clock, store) = store();
        let guard = store.guard("session-a", GuardKey::Install);
        assert!(!guard.get());

        guard.set(None);
        clock.advance(Duration::from_secs(3600));
        assert!(guard.get());

        guard.clear();
        assert!(!guard.get());
    }

    #[test]
    fn development_flag_expires() {
        let (clock, store) = store();
        let guard = store.guard("session-a", GuardKey::Install);
        guard.set(Some(Duration::from_secs(300)));

        clock.advance(Duration::from_secs(299));
        assert!(guard.get());

        clock.advance(Duration::from_secs(1));
        assert!(!guard.get());
        assert!(store.is_empty());
    }

    #[test]
    fn flags_are_scoped_per_session_and_page() {
        let (_clock, store) = store();
        store.guard("session-a", GuardKey::Install).set(None);

        assert!(!store.guard("session-b", GuardKey::Install).get());
        assert!(!store.guard("session-a", GuardKey::Game).get());
        assert!(store.guard("session-a", GuardKey::Install).get());
    }

    #[test]
    fn sweep_removes_stale_and_expired_entries() {
        let (clock, store) = store();
        store.guard("old", GuardKey::Install).set(None);
        store.guard("short", GuardKey::Game).set(Some(Duration::from_secs(5)));
        clock.advance(Duration::from_secs(10));
        store.guard("fresh", GuardKey::Install).set(None);

        let removed = store.sweep(Duration::from_secs(8));

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.guard("fresh", GuardKey::Install).get());
    }
}
