//! Courts and the directory that owns them.
//!
//! A [`Region`] combines fixed geometry (box, hoops, spawn point) with
//! mutable state: the players inside, the handle of its live ball, pending
//! timers, resting markers and its [`GameSession`]. The [`RegionDirectory`]
//! owns every region and the player to region membership map.
//!
//! # Geometry fallbacks
//!
//! Building a region never fails. [`Region::from_definition`] repairs a
//! definition instead of rejecting it:
//!
//! | Problem              | Repair                                         |
//! |----------------------|------------------------------------------------|
//! | no bounds            | [`Bounds::fallback_around`] the center         |
//! | no hoops             | two hoops at center ±10 on x, 3 blocks up      |
//! | more than two hoops  | the first two are kept                         |
//! | no spawn point       | the center                                     |
//!
//! # Example
//!
//! ```
//! use courtside_core::entity::PlayerId;
//! use courtside_core::region::{Region, RegionDefinition, RegionDirectory};
//! use glam::DVec3;
//!
//! let mut directory = RegionDirectory::new();
//! let def = RegionDefinition::around("court1", DVec3::new(10.0, 1.0, 10.0));
//! directory.insert(Region::from_definition(def, 10));
//!
//! directory.enter(PlayerId::new(1), &"court1".into()).unwrap();
//! assert_eq!(directory.region_of(PlayerId::new(1)).map(|r| r.as_str()), Some("court1"));
//! assert_eq!(directory.get(&"court1".into()).unwrap().hoops().len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::bounds::{BlockPos, Bounds};
use crate::entity::{BallId, PlayerId, RegionName};
use crate::error::CourtError;
use crate::scheduler::TimerId;
use crate::session::GameSession;
use crate::world::BoundsSource;

/// Horizontal offset of the default hoops from the center.
const DEFAULT_HOOP_OFFSET: f64 = 10.0;
/// Height of the default hoops above the center.
const DEFAULT_HOOP_HEIGHT: f64 = 3.0;
/// Most hoops a court can have.
pub const MAX_HOOPS: usize = 2;

// =============================================================================
// RegionDefinition
// =============================================================================

/// Load/save shape of a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    /// Unique name.
    pub name: RegionName,
    /// Center used for fallbacks.
    pub center: DVec3,
    /// Box, if known.
    #[serde(default)]
    pub bounds: Option<Bounds>,
    /// Hoop points.
    #[serde(default)]
    pub hoops: Vec<DVec3>,
    /// Ball spawn point.
    #[serde(default)]
    pub spawn: Option<DVec3>,
    /// Persisted win counts.
    #[serde(default)]
    pub wins: BTreeMap<PlayerId, u32>,
}

impl RegionDefinition {
    /// Definition with only a name and center; everything else falls back.
    #[must_use]
    pub fn around(name: impl Into<RegionName>, center: DVec3) -> Self {
        Self {
            name: name.into(),
            center,
            bounds: None,
            hoops: Vec::new(),
            spawn: None,
            wins: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Region
// =============================================================================

/// One court.
#[derive(Debug, Clone)]
pub struct Region {
    name: RegionName,
    center: DVec3,
    bounds: Bounds,
    defined_bounds: Option<Bounds>,
    bounds_fetched_at: Option<u64>,
    hoops: Vec<DVec3>,
    spawn: DVec3,
    players: BTreeSet<PlayerId>,
    pub(crate) live_ball: Option<BallId>,
    pub(crate) spawning: bool,
    pub(crate) pending_respawn: Option<TimerId>,
    pub(crate) pending_reset: Option<TimerId>,
    pub(crate) pending_spawn: Option<TimerId>,
    pub(crate) markers: BTreeSet<BlockPos>,
    session: GameSession,
}

impl Region {
    /// Builds a region, repairing missing or invalid geometry.
    #[must_use]
    pub fn from_definition(def: RegionDefinition, win_threshold: u32) -> Self {
        let RegionDefinition {
            name,
            center,
            bounds: defined_bounds,
            mut hoops,
            spawn,
            wins,
        } = def;

        let bounds = defined_bounds.unwrap_or_else(|| {
            warn!(region = %name, "no bounds defined, using fallback box");
            Bounds::fallback_around(center)
        });

        if hoops.is_empty() {
            warn!(region = %name, "no hoops defined, using default hoops");
            hoops = vec![
                center + DVec3::new(DEFAULT_HOOP_OFFSET, DEFAULT_HOOP_HEIGHT, 0.0),
                center + DVec3::new(-DEFAULT_HOOP_OFFSET, DEFAULT_HOOP_HEIGHT, 0.0),
            ];
        } else if hoops.len() > MAX_HOOPS {
            warn!(region = %name, count = hoops.len(), "too many hoops, keeping the first two");
            hoops.truncate(MAX_HOOPS);
        }

        let mut session = GameSession::new(win_threshold);
        session.set_wins(wins);

        Self {
            name,
            center,
            bounds,
            defined_bounds,
            bounds_fetched_at: None,
            hoops,
            spawn: spawn.unwrap_or(center),
            players: BTreeSet::new(),
            live_ball: None,
            spawning: false,
            pending_respawn: None,
            pending_reset: None,
            pending_spawn: None,
            markers: BTreeSet::new(),
            session,
        }
    }

    /// Unique name.
    #[must_use]
    pub const fn name(&self) -> &RegionName {
        &self.name
    }

    /// Center used for fallbacks.
    #[must_use]
    pub const fn center(&self) -> DVec3 {
        self.center
    }

    /// Current box (defined, fetched or fallback).
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Hoop points (one or two).
    #[must_use]
    pub fn hoops(&self) -> &[DVec3] {
        &self.hoops
    }

    /// Ball spawn point.
    #[must_use]
    pub const fn spawn(&self) -> DVec3 {
        self.spawn
    }

    /// Players inside, in id order.
    #[must_use]
    pub const fn players(&self) -> &BTreeSet<PlayerId> {
        &self.players
    }

    /// Returns true if `player` is inside.
    #[must_use]
    pub fn is_present(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    /// Returns true if nobody is inside.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Handle of the live ball. May be stale; resolve it through the arena.
    #[must_use]
    pub const fn live_ball(&self) -> Option<BallId> {
        self.live_ball
    }

    /// Returns true while a spawn animation is running.
    #[must_use]
    pub const fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Resting markers placed in this region.
    #[must_use]
    pub const fn markers(&self) -> &BTreeSet<BlockPos> {
        &self.markers
    }

    /// Scoring state.
    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    /// Scoring state, mutably.
    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    /// Hoop closest to `point`. Ties keep the first hoop.
    #[must_use]
    pub fn nearest_hoop(&self, point: DVec3) -> Option<DVec3> {
        crate::score::nearest_hoop(&self.hoops, point)
    }

    /// Save shape including the current win counts.
    #[must_use]
    pub fn definition(&self) -> RegionDefinition {
        RegionDefinition {
            name: self.name.clone(),
            center: self.center,
            bounds: self.defined_bounds,
            hoops: self.hoops.clone(),
            spawn: Some(self.spawn),
            wins: self.session.all_wins().clone(),
        }
    }

    /// Returns true if the fetched bounds are missing or older than `ttl` ticks.
    #[must_use]
    pub fn bounds_expired(&self, tick: u64, ttl: u64) -> bool {
        self.bounds_fetched_at
            .map_or(true, |at| tick.saturating_sub(at) >= ttl)
    }

    fn set_fetched_bounds(&mut self, bounds: Bounds, tick: u64) {
        self.bounds = bounds;
        self.bounds_fetched_at = Some(tick);
    }

    /// Box used when a live lookup fails.
    fn fallback_bounds(&self) -> Bounds {
        self.defined_bounds
            .unwrap_or_else(|| Bounds::fallback_around(self.center))
    }
}

// =============================================================================
// RegionDirectory
// =============================================================================

/// Owner of all regions and of player membership.
///
/// A player is in at most one region at a time.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    regions: BTreeMap<RegionName, Region>,
    membership: BTreeMap<PlayerId, RegionName>,
    log_checks: bool,
}

impl RegionDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables trace logging of membership checks.
    pub fn set_log_checks(&mut self, enabled: bool) {
        self.log_checks = enabled;
    }

    /// Adds a region, replacing any region with the same name.
    ///
    /// Players inside the replaced region stay members of the new one.
    pub fn insert(&mut self, mut region: Region) -> Option<Region> {
        let previous = self.regions.remove(region.name());
        if let Some(old) = &previous {
            for &player in old.players() {
                region.players.insert(player);
                region.session.add_player(player);
            }
        }
        debug!(region = %region.name(), "region registered");
        self.regions.insert(region.name().clone(), region);
        previous
    }

    /// Builds and adds regions from their definitions.
    pub fn load(&mut self, defs: impl IntoIterator<Item = RegionDefinition>, win_threshold: u32) {
        for def in defs {
            self.insert(Region::from_definition(def, win_threshold));
        }
    }

    /// Removes a region and the membership of everyone inside it.
    pub fn remove(&mut self, name: &RegionName) -> Option<Region> {
        let region = self.regions.remove(name)?;
        for player in region.players() {
            self.membership.remove(player);
        }
        Some(region)
    }

    /// Region by name.
    #[must_use]
    pub fn get(&self, name: &RegionName) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Region by name, mutably.
    pub fn get_mut(&mut self, name: &RegionName) -> Option<&mut Region> {
        self.regions.get_mut(name)
    }

    /// Returns true if a region is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &RegionName) -> bool {
        self.regions.contains_key(name)
    }

    /// Regions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.values()
    }

    /// Regions in name order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Region> + '_ {
        self.regions.values_mut()
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if there are no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Moves `player` into `name`, leaving any other region first.
    ///
    /// Returns the region that was left, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::UnknownRegion`] if no region has that name.
    pub fn enter(
        &mut self,
        player: PlayerId,
        name: &RegionName,
    ) -> Result<Option<RegionName>, CourtError> {
        if !self.regions.contains_key(name) {
            return Err(CourtError::UnknownRegion(name.clone()));
        }
        if self.membership.get(&player) == Some(name) {
            if self.log_checks {
                trace!(%player, region = %name, "already a member");
            }
            return Ok(None);
        }

        let left = self.leave(player);
        if let Some(region) = self.regions.get_mut(name) {
            region.players.insert(player);
            region.session.add_player(player);
        }
        self.membership.insert(player, name.clone());
        debug!(%player, region = %name, "player entered region");
        Ok(left)
    }

    /// Removes `player` from its region, returning the region's name.
    pub fn leave(&mut self, player: PlayerId) -> Option<RegionName> {
        let name = self.membership.remove(&player)?;
        if let Some(region) = self.regions.get_mut(&name) {
            region.players.remove(&player);
            region.session.remove_player(player);
        }
        debug!(%player, region = %name, "player left region");
        Some(name)
    }

    /// Region `player` is in.
    #[must_use]
    pub fn region_of(&self, player: PlayerId) -> Option<&RegionName> {
        let name = self.membership.get(&player);
        if self.log_checks {
            trace!(%player, region = ?name.map(RegionName::as_str), "region check");
        }
        name
    }

    /// First region, in name order, whose box contains `point`.
    #[must_use]
    pub fn region_at(&self, point: DVec3) -> Option<&Region> {
        let found = self.regions.values().find(|r| r.bounds().contains_point(point));
        if self.log_checks {
            trace!(?point, region = ?found.map(|r| r.name().as_str()), "point check");
        }
        found
    }

    /// Refreshes every region whose fetched bounds are older than `ttl` ticks.
    ///
    /// A failed or empty lookup falls back to the defined bounds, or the
    /// fallback box if none were defined, and is retried after `ttl` ticks.
    pub fn refresh_bounds(&mut self, source: &dyn BoundsSource, tick: u64, ttl: u64) {
        for region in self.regions.values_mut() {
            if !region.bounds_expired(tick, ttl) {
                continue;
            }
            let bounds = match source.region_bounds(region.name()) {
                Ok(Some(bounds)) => bounds,
                Ok(None) => {
                    warn!(
                        region = %region.name(),
                        "bounds source does not know region, using fallback"
                    );
                    region.fallback_bounds()
                }
                Err(err) => {
                    warn!(
                        region = %region.name(),
                        error = %err,
                        "bounds lookup failed, using fallback"
                    );
                    region.fallback_bounds()
                }
            };
            region.set_fetched_bounds(bounds, tick);
        }
    }

    /// Save shapes of every region, including current win counts.
    #[must_use]
    pub fn definitions(&self) -> Vec<RegionDefinition> {
        self.regions.values().map(Region::definition).collect()
    }
}
