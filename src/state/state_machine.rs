//! Phase transitions for one handoff page view.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Phases of a single handoff page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HandoffPhase {
    /// Nothing in flight. Also the phase after the app appears to have opened.
    Idle,
    /// The app scheme was launched and the fallback timer is armed.
    Attempting,
    /// The store is being (or has been) offered instead of the app.
    Fallback,
}

/// Events that can be applied to the handoff state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffEvent {
    /// Launch the app scheme, automatically on first render or via retry.
    Attempt,
    /// The fallback timer ran out without the page being hidden.
    TimerElapsed,
    /// The page was hidden while attempting; the app most likely opened.
    AppBackgrounded,
    /// The user asked for the store directly.
    StoreRequested,
    /// A loop-guard flag from an earlier fallback was found at load.
    GuardRestored,
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in.
    pub from: HandoffPhase,
    /// Rejected event.
    pub event: HandoffEvent,
}

/// Snapshot of the handoff state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: HandoffPhase,
    /// Number of applied transitions.
    pub version: usize,
}

/// Idle → attempting → fallback | idle.
#[derive(Debug, Clone)]
pub struct HandoffStateMachine {
    phase: HandoffPhase,
    version: usize,
}

impl Default for HandoffStateMachine {
    fn default() -> Self {
        Self {
            phase: HandoffPhase::Idle,
            version: 0,
        }
    }
}

impl HandoffStateMachine {
    /// Create a machine in [`HandoffPhase::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> HandoffPhase {
        self.phase
    }

    /// Phase and version together.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: HandoffEvent) -> Result<HandoffPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    fn compute_transition(&self, event: HandoffEvent) -> Result<HandoffPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (_, HandoffEvent::Attempt) => HandoffPhase::Attempting,
            (HandoffPhase::Attempting, HandoffEvent::TimerElapsed) => HandoffPhase::Fallback,
            (HandoffPhase::Attempting, HandoffEvent::AppBackgrounded) => HandoffPhase::Idle,
            (_, HandoffEvent::StoreRequested) => HandoffPhase::Fallback,
            (HandoffPhase::Idle, HandoffEvent::GuardRestored) => HandoffPhase::Fallback,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_idle() {
        let sm = HandoffStateMachine::new();
        assert_eq!(sm.phase(), HandoffPhase::Idle);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn attempt_then_timer_reaches_fallback() {
        let mut sm = HandoffStateMachine::new();
        assert_eq!(sm.apply(HandoffEvent::Attempt), Ok(HandoffPhase::Attempting));
        assert_eq!(
            sm.apply(HandoffEvent::TimerElapsed),
            Ok(HandoffPhase::Fallback)
        );
        assert_eq!(sm.snapshot().version, 2);
    }

    #[test]
    fn backgrounding_while_attempting_returns_to_idle() {
        let mut sm = HandoffStateMachine::new();
        sm.apply(HandoffEvent::Attempt).unwrap();
        assert_eq!(
            sm.apply(HandoffEvent::AppBackgrounded),
            Ok(HandoffPhase::Idle)
        );
    }

    #[test]
    fn retry_is_allowed_from_every_phase() {
        let mut sm = HandoffStateMachine::new();
        sm.apply(HandoffEvent::Attempt).unwrap();
        assert_eq!(sm.apply(HandoffEvent::Attempt), Ok(HandoffPhase::Attempting));
        sm.apply(HandoffEvent::TimerElapsed).unwrap();
        assert_eq!(sm.apply(HandoffEvent::Attempt), Ok(HandoffPhase::Attempting));
    }

    #[test]
    fn guard_restore_only_from_idle() {
        let mut sm = HandoffStateMachine::new();
        assert_eq!(
            sm.apply(HandoffEvent::GuardRestored),
            Ok(HandoffPhase::Fallback)
        );
        let err = sm.apply(HandoffEvent::GuardRestored).unwrap_err();
        assert_eq!(err.from, HandoffPhase::Fallback);
        assert_eq!(err.event, HandoffEvent::GuardRestored);
    }

    #[test]
    fn timer_outside_attempting_is_rejected() {
        let mut sm = HandoffStateMachine::new();
        let err = sm.apply(HandoffEvent::TimerElapsed).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: HandoffPhase::Idle,
                event: HandoffEvent::TimerElapsed,
            }
        );
        assert_eq!(sm.snapshot().version, 0);
    }
}
