//! Identifiers and the ball entity.
//!
//! - [`PlayerId`]: weak reference to a host-owned player
//! - [`RegionName`]: unique key of a region
//! - [`BallId`]: generation-checked handle into [`crate::arena::BallArena`]
//! - [`Ball`]: simulation state of one live ball
//!
//! # Ownership
//!
//! Players belong to the host; the core only stores their ids. Balls belong
//! to the arena; regions refer to their live ball by [`BallId`] and must
//! tolerate the handle going stale.
//!
//! # Example
//!
//! ```
//! use courtside_core::entity::{Ball, BallId, RegionName};
//! use glam::DVec3;
//!
//! let region = RegionName::new("court1");
//! let ball = Ball::new(BallId::new(0, 0), region, DVec3::new(5.0, 1.0, 5.0), 0);
//! assert!(!ball.thrown);
//! assert_eq!(ball.bounce_count, 0);
//! ```

pub mod components;

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

pub use components::Motion;

// =============================================================================
// PlayerId
// =============================================================================

/// Identifier of a host player.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Creates a player id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

impl From<u64> for PlayerId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// RegionName
// =============================================================================

/// Unique name of a region (court).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionName(String);

impl RegionName {
    /// Creates a region name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RegionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// =============================================================================
// BallId
// =============================================================================

/// Handle to a ball slot in the arena.
///
/// A slot index may be reused after its ball is removed, but the generation
/// is bumped on every removal, so an old handle never resolves to a new ball.
/// Handles order by slot index first, which is the deterministic processing
/// order of the tick loop.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId {
    index: u32,
    generation: u32,
}

impl BallId {
    /// Creates a handle from its parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for BallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BallId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for BallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Ball
// =============================================================================

/// Mutable simulation state of one live ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    id: BallId,
    /// Position and velocity.
    pub motion: Motion,
    /// True while the ball is in flight and ticked by the physics engine.
    pub thrown: bool,
    /// Ground contacts since the last throw.
    pub bounce_count: u32,
    /// Region the ball belongs to (looked up by name, never owned).
    pub region: RegionName,
    /// Player who last threw the ball.
    pub owner: Option<PlayerId>,
    /// Point where the flight crossed a hoop zone, pending the next score check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hoop_pass: Option<DVec3>,
    spawned_at: u64,
}

impl Ball {
    /// Creates a resting ball at `position`.
    #[must_use]
    pub fn new(id: BallId, region: RegionName, position: DVec3, tick: u64) -> Self {
        Self {
            id,
            motion: Motion::at(position),
            thrown: false,
            bounce_count: 0,
            region,
            owner: None,
            hoop_pass: None,
            spawned_at: tick,
        }
    }

    /// Handle of this ball.
    #[must_use]
    pub const fn id(&self) -> BallId {
        self.id
    }

    /// Tick on which the ball was created.
    #[must_use]
    pub const fn spawned_at(&self) -> u64 {
        self.spawned_at
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> DVec3 {
        self.motion.position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> DVec3 {
        self.motion.velocity
    }

    /// Puts the ball in flight with the given launch velocity.
    pub fn launch(&mut self, velocity: DVec3, thrower: PlayerId) {
        self.motion.velocity = velocity;
        self.thrown = true;
        self.bounce_count = 0;
        self.owner = Some(thrower);
        self.hoop_pass = None;
    }
}
