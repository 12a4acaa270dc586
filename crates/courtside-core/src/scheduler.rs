//! Cancellable tick timers.
//!
//! Delayed work (respawns, resets, spawn animations) is queued here instead
//! of being run by the host scheduler. Timers are keyed by due tick and then
//! by id, so timers that fall due on the same tick fire in the order they
//! were scheduled.
//!
//! A fired timer carries only a [`TimerAction`]. The simulation re-checks
//! the action's preconditions when it fires, and regions cancel the timers
//! they own when those preconditions go away.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::RegionName;

/// Handle of a scheduled timer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

impl fmt::Debug for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimerId({})", self.0)
    }
}

/// Work performed when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    /// Spawn a replacement ball after a basket.
    RespawnBall {
        /// Region to spawn in
        region: RegionName,
    },
    /// Create the ball at the end of a spawn animation.
    FinishSpawn {
        /// Region being animated
        region: RegionName,
    },
    /// Reset a won game.
    ResetGame {
        /// Region to reset
        region: RegionName,
    },
}

impl TimerAction {
    /// Region the action applies to.
    #[must_use]
    pub const fn region(&self) -> &RegionName {
        match self {
            Self::RespawnBall { region }
            | Self::FinishSpawn { region }
            | Self::ResetGame { region } => {
                region
            }
        }
    }
}

/// Queue of pending timers.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BTreeMap<(u64, TimerId), TimerAction>,
    due: BTreeMap<TimerId, u64>,
    next_id: u64,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `action` to fire `delay` ticks after `now`.
    pub fn schedule(&mut self, now: u64, delay: u64, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let at = now.saturating_add(delay);
        self.queue.insert((at, id), action);
        self.due.insert(id, at);
        id
    }

    /// Cancels a timer, returning its action if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> Option<TimerAction> {
        let at = self.due.remove(&id)?;
        self.queue.remove(&(at, id))
    }

    /// Returns true if the timer has neither fired nor been cancelled.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due.contains_key(&id)
    }

    /// Removes and returns every timer due at or before `now`, in firing order.
    pub fn drain_due(&mut self, now: u64) -> Vec<(TimerId, TimerAction)> {
        let later = self.queue.split_off(&(now.saturating_add(1), TimerId(0)));
        let fired = std::mem::replace(&mut self.queue, later);
        fired
            .into_iter()
            .map(|((_, id), action)| {
                self.due.remove(&id);
                (id, action)
            })
            .collect()
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.due.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    /// Cancels every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.due.clear();
    }
}
