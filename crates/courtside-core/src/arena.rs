//! Generation-checked storage for live balls.
//!
//! The arena owns every [`Ball`]. Other parts of the simulation (regions,
//! timers, tick results) only hold [`BallId`] handles, and every lookup
//! checks the slot generation, so a handle to a removed ball resolves to
//! `None` even after its slot has been reused.
//!
//! # Iteration
//!
//! The tick loop never iterates the arena while mutating it. It takes a
//! snapshot with [`BallArena::ids`] (ascending slot order), computes results
//! against that snapshot, and then applies them one handle at a time.
//! Removing a ball only frees its slot; handles in the snapshot that point
//! at it simply stop resolving.
//!
//! # Example
//!
//! ```
//! use courtside_core::arena::BallArena;
//! use glam::DVec3;
//!
//! let mut arena = BallArena::new();
//! let first = arena.spawn("court1".into(), DVec3::new(5.0, 1.0, 5.0), 0);
//! assert!(arena.contains(first));
//!
//! arena.despawn(first);
//! let second = arena.spawn("court1".into(), DVec3::ZERO, 1);
//!
//! // Same slot, new generation: the old handle stays dead.
//! assert_eq!(first.index(), second.index());
//! assert!(arena.get(first).is_none());
//! assert!(arena.get(second).is_some());
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::entity::{Ball, BallId, RegionName};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    ball: Option<Ball>,
}

/// Owner of all live balls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallArena {
    slots: Vec<Slot>,
    /// Freed slot indices, reused lowest-first.
    free: Vec<u32>,
    live: usize,
}

impl BallArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resting ball in `region` at `position` and returns its handle.
    pub fn spawn(&mut self, region: RegionName, position: DVec3, tick: u64) -> BallId {
        let index = if let Some(index) = self.free.pop() {
            index
        } else {
            // At most one live ball per region, so the slot count stays tiny.
            #[allow(clippy::cast_possible_truncation)]
            let index = self.slots.len() as u32;
            self.slots.push(Slot::default());
            index
        };

        let slot = &mut self.slots[index as usize];
        let id = BallId::new(index, slot.generation);
        slot.ball = Some(Ball::new(id, region, position, tick));
        self.live += 1;
        id
    }

    /// Removes a ball, returning it if the handle was live.
    ///
    /// The slot generation is bumped so `id` can never resolve again.
    pub fn despawn(&mut self, id: BallId) -> Option<Ball> {
        let slot = self.slot_mut(id)?;
        let ball = slot.ball.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        // Keep reuse deterministic: lowest free index is popped first.
        self.free.sort_unstable_by(|a, b| b.cmp(a));
        self.live -= 1;
        Some(ball)
    }

    /// Returns the ball for a live handle.
    #[must_use]
    pub fn get(&self, id: BallId) -> Option<&Ball> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.ball.as_ref())
    }

    /// Returns the ball for a live handle, mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.slot_mut(id).and_then(|slot| slot.ball.as_mut())
    }

    /// Returns true if the handle refers to a live ball.
    #[must_use]
    pub fn contains(&self, id: BallId) -> bool {
        self.get(id).is_some()
    }

    /// Snapshot of live handles in ascending slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<BallId> {
        self.iter().map(Ball::id).collect()
    }

    /// Iterates live balls in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Ball> + '_ {
        self.slots.iter().filter_map(|slot| slot.ball.as_ref())
    }

    /// Live balls that belong to `region`.
    pub fn in_region<'a>(&'a self, region: &'a RegionName) -> impl Iterator<Item = &'a Ball> + 'a {
        self.iter().filter(move |ball| &ball.region == region)
    }

    /// Number of live balls.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns true if there are no live balls.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Removes every ball and invalidates every outstanding handle.
    pub fn clear(&mut self) -> Vec<Ball> {
        let ids = self.ids();
        ids.into_iter().filter_map(|id| self.despawn(id)).collect()
    }

    fn slot_mut(&mut self, id: BallId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
    }
}
