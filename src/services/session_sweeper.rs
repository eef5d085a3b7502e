use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::{SharedState, TICKET_TTL};

const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Loop-guard flags outlive no browser session longer than this.
pub const GUARD_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodically drop stale loop-guard flags and unclaimed handoff tickets until `shutdown` fires.
pub async fn run(state: SharedState, shutdown: CancellationToken) {
    let mut ticker = interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("session sweeper stopped");
                break;
            }
            _ = ticker.tick() => {
                sweep_once(&state);
            }
        }
    }
}

/// One sweep pass, returning how many guard flags and tickets were removed.
pub fn sweep_once(state: &SharedState) -> (usize, usize) {
    let guards = state.guards().sweep(GUARD_MAX_AGE);
    let tickets = state.sweep_tickets(TICKET_TTL);
    if guards + tickets > 0 {
        debug!(guards, tickets, "swept stale handoff session data");
    }
    (guards, tickets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        game_id::GameId,
        loop_guard::{GuardKey, LoopGuardStore},
        platform::DeviceProfile,
        scheduler::ManualScheduler,
        tests::test_state,
    };

    #[test]
    fn sweeps_day_old_guards_and_abandoned_tickets() {
        let clock = ManualScheduler::new();
        let state = test_state(None, clock.clone());
        state.guards().guard("old", GuardKey::Install).set(None);
        state.issue_ticket(
            GameId::parse(Some("1")).unwrap(),
            DeviceProfile::from_user_agent(Some("iPhone")),
            "old",
            GuardKey::Install,
        );

        assert_eq!(sweep_once(&state), (0, 0));

        clock.advance(GUARD_MAX_AGE);
        state.guards().guard("fresh", GuardKey::Game).set(None);

        assert_eq!(sweep_once(&state), (1, 1));
        assert!(state.guards().guard("fresh", GuardKey::Game).get());
        assert_eq!(state.pending_tickets(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_shutdown() {
        let state = test_state(None, ManualScheduler::new());
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run(state, shutdown.clone()));

        tokio::time::sleep(SWEEP_INTERVAL * 2).await;
        shutdown.cancel();

        task.await.unwrap();
    }
}
