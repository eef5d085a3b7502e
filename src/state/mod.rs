pub mod game_id;
pub mod handoff;
pub mod links;
pub mod loop_guard;
pub mod platform;
pub mod scheduler;
pub mod state_machine;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    services::preview::PreviewFetcher,
    state::{
        game_id::GameId,
        handoff::HandoffSettings,
        loop_guard::{GuardKey, SessionGuardStore},
        platform::DeviceProfile,
        scheduler::{Clock, SystemClock},
    },
};

pub type SharedState = Arc<AppState>;

/// How long a rendered handoff page may take to open its socket.
pub const TICKET_TTL: Duration = Duration::from_secs(10 * 60);

/// Everything a handoff socket needs, minted when the page is rendered.
#[derive(Debug, Clone)]
pub struct HandoffTicket {
    pub game_id: GameId,
    pub device: DeviceProfile,
    pub session_id: String,
    pub guard_key: GuardKey,
    issued_at: Instant,
}

/// Central application state shared by every route.
pub struct AppState {
    config: Arc<AppConfig>,
    settings: HandoffSettings,
    guards: Arc<SessionGuardStore>,
    previews: Arc<PreviewFetcher>,
    tickets: DashMap<Uuid, HandoffTicket>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build the state for `config` with an HTTP preview source and the system clock.
    pub fn new(config: AppConfig) -> SharedState {
        let previews = PreviewFetcher::from_config(&config);
        Self::with_parts(config, previews, Arc::new(SystemClock))
    }

    /// Build the state from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        previews: PreviewFetcher,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        let settings = config.handoff_settings();
        Arc::new(Self {
            config: Arc::new(config),
            settings,
            guards: Arc::new(SessionGuardStore::new(clock.clone())),
            previews: Arc::new(previews),
            tickets: DashMap::new(),
            clock,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Handoff tunables derived from the configuration.
    pub fn handoff_settings(&self) -> &HandoffSettings {
        &self.settings
    }

    /// Loop-guard flags for every browser session.
    pub fn guards(&self) -> &Arc<SessionGuardStore> {
        &self.guards
    }

    /// Shared preview fetcher and cache.
    pub fn previews(&self) -> &Arc<PreviewFetcher> {
        &self.previews
    }

    /// Register a handoff page view and return the ticket its socket must present.
    pub fn issue_ticket(
        &self,
        game_id: GameId,
        device: DeviceProfile,
        session_id: &str,
        guard_key: GuardKey,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.tickets.insert(
            id,
            HandoffTicket {
                game_id,
                device,
                session_id: session_id.to_string(),
                guard_key,
                issued_at: self.clock.now(),
            },
        );
        id
    }

    /// Take a ticket. Each ticket can be claimed once and only before it expires.
    pub fn claim_ticket(&self, id: &Uuid) -> Option<HandoffTicket> {
        let (_, ticket) = self.tickets.remove(id)?;
        let age = self.clock.now().saturating_duration_since(ticket.issued_at);
        if age >= TICKET_TTL {
            debug!(ticket = %id, "handoff ticket expired");
            return None;
        }
        Some(ticket)
    }

    /// Number of tickets not yet claimed.
    pub fn pending_tickets(&self) -> usize {
        self.tickets.len()
    }

    /// Drop tickets older than `max_age`, returning how many were removed.
    pub fn sweep_tickets(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let before = self.tickets.len();
        self.tickets
            .retain(|_, ticket| now.saturating_duration_since(ticket.issued_at) < max_age);
        before.saturating_sub(self.tickets.len())
    }
}
