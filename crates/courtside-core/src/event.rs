//! Events published to presentation layers.
//!
//! The simulation reports what happened through an [`EventSink`]:
//! baskets, wins, and every ball entering or leaving the world. Sinks are
//! fire-and-forget; the simulation never waits for or reads back from them.
//! Titles, particles and holograms are built by whoever consumes the events.
//!
//! # Usage
//!
//! [`RecordingSink`] keeps an in-memory log that can be drained with
//! [`RecordingSink::take_events`], typically once per tick.
//!
//! ```
//! use std::sync::Arc;
//! use courtside_core::event::{EventSink, GameEvent, RecordingSink};
//!
//! let sink = Arc::new(RecordingSink::new());
//! sink.emit(GameEvent::GameReset { region: "court1".into() });
//! assert_eq!(sink.take_events().len(), 1);
//! assert!(sink.is_empty());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::bounds::BlockPos;
use crate::entity::{BallId, PlayerId, RegionName};

// =============================================================================
// Event payloads
// =============================================================================

/// A basket detected at a hoop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    /// Player credited with the basket.
    pub player: PlayerId,
    /// Region the basket was scored in.
    pub region: RegionName,
    /// Hoop the ball went through.
    pub hoop: DVec3,
    /// Ball that scored (already removed when the event is published).
    pub ball: BallId,
    /// Host tick of detection.
    pub tick: u64,
}

/// A player reached the win threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEvent {
    /// Winner.
    pub player: PlayerId,
    /// Region the game was played in.
    pub region: RegionName,
    /// Winning score.
    pub score: u32,
    /// Winner's total wins in this region, including this one.
    pub total_wins: u32,
}

/// Why a live ball left the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Came to rest and became a marker (or was auto-picked up).
    Rested,
    /// Went through a hoop.
    Scored,
    /// Picked up by a player.
    PickedUp,
    /// Left the region box by more than the margin.
    OutOfBounds,
    /// Stopped on solid ground without resting normally.
    Stuck,
    /// A terrain query failed during its tick.
    TerrainFailure,
    /// Its region no longer exists.
    NoRegion,
    /// The last player left its region.
    RegionEmptied,
    /// Removed by a full cleanup.
    Cleared,
}

/// Everything the simulation reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A live ball was created.
    BallSpawned {
        /// New ball
        ball: BallId,
        /// Owning region
        region: RegionName,
        /// Spawn position
        position: DVec3,
    },
    /// A live ball was removed.
    BallRemoved {
        /// Removed ball
        ball: BallId,
        /// Region it belonged to
        region: RegionName,
        /// Last position
        position: DVec3,
        /// Why it was removed
        reason: RemovalReason,
    },
    /// A ball was thrown.
    BallThrown {
        /// Thrown ball
        ball: BallId,
        /// Thrower
        player: PlayerId,
        /// Launch velocity
        velocity: DVec3,
    },
    /// A player took a ball into hand.
    BallPickedUp {
        /// New holder
        player: PlayerId,
        /// Region of the ball
        region: RegionName,
    },
    /// A held ball left a player's hand without a throw.
    BallDropped {
        /// Former holder
        player: PlayerId,
        /// Region the ball landed in, `None` if it was discarded
        region: Option<RegionName>,
        /// Marker placed for it, `None` if no marker could be placed
        marker: Option<BlockPos>,
    },
    /// A basket was scored.
    Score(ScoreEvent),
    /// Points were awarded through the alternate scoring path.
    PointsAwarded {
        /// Player credited
        player: PlayerId,
        /// Region of the session
        region: RegionName,
        /// Points added
        points: u32,
        /// Score after the award
        score: u32,
    },
    /// A game was won.
    Win(WinEvent),
    /// A region's session was reset.
    GameReset {
        /// Region that was reset
        region: RegionName,
    },
}

impl GameEvent {
    /// Region the event concerns, if it has one.
    #[must_use]
    pub fn region(&self) -> Option<&RegionName> {
        match self {
            Self::BallSpawned { region, .. }
            | Self::BallRemoved { region, .. }
            | Self::BallPickedUp { region, .. }
            | Self::PointsAwarded { region, .. }
            | Self::GameReset { region } => Some(region),
            Self::Score(score) => Some(&score.region),
            Self::Win(win) => Some(&win.region),
            Self::BallDropped { region, .. } => region.as_ref(),
            Self::BallThrown { .. } => None,
        }
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Consumer of simulation events.
pub trait EventSink: Send + Sync {
    /// Publishes one event. Must not call back into the simulation.
    fn emit(&self, event: GameEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl EventSink for DiscardSink {
    fn emit(&self, _event: GameEvent) {}
}

/// Sink that records events in order.
///
/// The log is behind a `Mutex` to satisfy `Send + Sync`, although the
/// simulation only emits from its own thread.
#[derive(Debug, Default)]
pub struct RecordingSink {
    log: Mutex<Vec<GameEvent>>,
}

impl RecordingSink {
    /// Creates a sink with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns all recorded events in emission order.
    pub fn take_events(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns a copy of the log without draining it.
    #[must_use]
    pub fn events(&self) -> Vec<GameEvent> {
        self.lock().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clears the log without returning it.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<GameEvent>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: GameEvent) {
        self.lock().push(event);
    }
}
