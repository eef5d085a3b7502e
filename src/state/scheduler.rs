//! Time sources and cancellable one-shot timers.
//!
//! The handoff controller never sleeps itself: it asks a [`Scheduler`] for a
//! timer and is told later which timer fired. Production code runs timers on
//! Tokio, tests drive a manual clock.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use tokio::{sync::mpsc, task::JoinHandle, time::sleep};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current monotonic time.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Handle identifying a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Schedules one-shot timers and cancels them before they fire.
pub trait Scheduler {
    /// Arm a timer that fires once after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerId;
    /// Cancel a timer. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// [`Scheduler`] spawning a Tokio task per timer.
///
/// Fired ids are delivered on the receiver returned by [`TokioScheduler::new`];
/// dropping the scheduler aborts every pending timer.
pub struct TokioScheduler {
    next_id: u64,
    fired_tx: mpsc::UnboundedSender<TimerId>,
    handles: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Create a scheduler together with the channel that receives fired timers.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            fired_tx,
            handles: HashMap::new(),
        };
        (scheduler, fired_rx)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.handles.retain(|_, handle| !handle.is_finished());

        self.next_id += 1;
        let id = TimerId(self.next_id);
        let tx = self.fired_tx.clone();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(id);
        });
        self.handles.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.handles.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
pub(crate) use self::manual::ManualScheduler;
