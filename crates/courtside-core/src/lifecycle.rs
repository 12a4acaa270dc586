//! Ball creation, hand-offs and removal.
//!
//! The [`BallLifecycleManager`] owns the [`BallArena`] and the set of balls
//! held by players. Every path that creates a ball or moves it between the
//! world, a player's hand and a resting marker goes through it, so it is
//! the one place that enforces:
//!
//! > a region has at most one live ball, spawn animation or held ball.
//!
//! Guard failures (a second spawn, a pickup while holding) are not errors.
//! They come back as [`SpawnOutcome::Rejected`] or a [`PickupOutcome`]
//! variant and are logged at `trace` level.
//!
//! # Auto-drop
//!
//! Picking up a ball starts an [`AutoDropWatch`] for the holder. Once per
//! tick [`BallLifecycleManager::tick_auto_drop`] counts consecutive ticks
//! standing still and moving; when either reaches its limit the ball is
//! dropped at the holder's feet (if they are in a region) and the watch
//! ends. A watch whose holder went offline or no longer holds a ball ends
//! without doing anything.

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::arena::BallArena;
use crate::bounds::BlockPos;
use crate::config::GameConfig;
use crate::entity::{Ball, BallId, PlayerId, RegionName};
use crate::error::CourtError;
use crate::event::{GameEvent, RemovalReason};
use crate::physics::marker_slot;
use crate::region::{Region, RegionDirectory};
use crate::scheduler::{Scheduler, TimerAction};
use crate::world::Host;

// =============================================================================
// Outcomes
// =============================================================================

/// Why a spawn was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnBlocker {
    /// No region by that name.
    UnknownRegion,
    /// The region already has a live ball.
    LiveBall,
    /// A spawn animation is running.
    Animating,
    /// A present player holds the region's ball.
    BallHeld,
}

/// Result of a spawn request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// A ball was created.
    Spawned(BallId),
    /// A spawn animation started; the ball appears when it ends.
    Pending,
    /// Nothing happened.
    Rejected(SpawnBlocker),
}

/// Result of a pickup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupOutcome {
    /// The player now holds the ball.
    PickedUp,
    /// The player already holds a ball; nothing changed.
    AlreadyHolding,
    /// There is no ball or marker to take.
    NoBall,
    /// The player is not in the ball's region.
    NotPresent,
    /// The ball is out of reach.
    OutOfRange,
    /// The region already has a ball in play; the marker stays where it is.
    BallInPlay,
}

/// Idle tracking for one holder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoDropWatch {
    /// Position at the previous check.
    pub last_position: DVec3,
    /// Consecutive ticks standing still.
    pub still_ticks: u32,
    /// Consecutive ticks moving.
    pub move_ticks: u32,
}

impl AutoDropWatch {
    fn new(position: DVec3) -> Self {
        Self {
            last_position: position,
            still_ticks: 0,
            move_ticks: 0,
        }
    }
}

/// Borrowed simulation state the manager works against.
pub struct LifecycleCtx<'a> {
    /// All regions.
    pub regions: &'a mut RegionDirectory,
    /// Pending timers.
    pub scheduler: &'a mut Scheduler,
    /// Host collaborators.
    pub host: &'a Host,
    /// Active configuration.
    pub config: &'a GameConfig,
    /// Current host tick.
    pub tick: u64,
}

// =============================================================================
// BallLifecycleManager
// =============================================================================

/// Owner of every live and held ball.
#[derive(Debug, Clone, Default)]
pub struct BallLifecycleManager {
    arena: BallArena,
    held: BTreeMap<PlayerId, RegionName>,
    watches: BTreeMap<PlayerId, AutoDropWatch>,
}

impl BallLifecycleManager {
    /// Creates a manager with no balls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live balls.
    #[must_use]
    pub const fn arena(&self) -> &BallArena {
        &self.arena
    }

    /// Live balls, mutably. Used to write back physics results.
    pub fn arena_mut(&mut self) -> &mut BallArena {
        &mut self.arena
    }

    /// Region of the ball `player` holds.
    #[must_use]
    pub fn held_by(&self, player: PlayerId) -> Option<&RegionName> {
        self.held.get(&player)
    }

    /// Returns true if `player` holds a ball.
    #[must_use]
    pub fn is_holding(&self, player: PlayerId) -> bool {
        self.held.contains_key(&player)
    }

    /// Holders of balls that belong to `region`.
    #[must_use]
    pub fn holders_in(&self, region: &RegionName) -> BTreeSet<PlayerId> {
        self.held
            .iter()
            .filter(|(_, r)| *r == region)
            .map(|(p, _)| *p)
            .collect()
    }

    /// Auto-drop state of `player`.
    #[must_use]
    pub fn watch(&self, player: PlayerId) -> Option<&AutoDropWatch> {
        self.watches.get(&player)
    }

    /// Live ball of `region`, if its handle still resolves.
    #[must_use]
    pub fn live_in(&self, region: &Region) -> Option<BallId> {
        region.live_ball().filter(|&id| self.arena.contains(id))
    }

    /// Balls attributed to `region`: live, animating or held by someone present.
    #[must_use]
    pub fn balls_in(&self, region: &Region) -> usize {
        let live = usize::from(self.live_in(region).is_some());
        let animating = usize::from(region.is_spawning());
        let held = self
            .held
            .iter()
            .filter(|(p, r)| *r == region.name() && region.is_present(**p))
            .count();
        live + animating + held
    }

    // -------------------------------------------------------------------------
    // Spawning
    // -------------------------------------------------------------------------

    /// Spawns a ball at the region's spawn point if the region has none.
    ///
    /// A pending respawn timer is cancelled. With a spawn animation
    /// configured the ball appears when the animation timer fires.
    pub fn spawn_in_region(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        name: &RegionName,
    ) -> SpawnOutcome {
        let Some(region) = ctx.regions.get(name) else {
            trace!(region = %name, "spawn rejected: unknown region");
            return SpawnOutcome::Rejected(SpawnBlocker::UnknownRegion);
        };
        if let Some(blocker) = self.spawn_blocker(region) {
            trace!(region = %name, ?blocker, "spawn rejected");
            return SpawnOutcome::Rejected(blocker);
        }

        let delay = ctx.config.timing.spawn_animation;
        let Some(region) = ctx.regions.get_mut(name) else {
            return SpawnOutcome::Rejected(SpawnBlocker::UnknownRegion);
        };
        if let Some(timer) = region.pending_respawn.take() {
            ctx.scheduler.cancel(timer);
        }

        if delay > 0 {
            region.spawning = true;
            region.pending_spawn = Some(ctx.scheduler.schedule(
                ctx.tick,
                delay,
                TimerAction::FinishSpawn { region: name.clone() },
            ));
            debug!(region = %name, delay, "spawn animation started");
            return SpawnOutcome::Pending;
        }

        let spawn = region.spawn();
        SpawnOutcome::Spawned(self.create(ctx, name, spawn))
    }

    /// Ends a spawn animation and creates the ball if the region still has none.
    pub fn finish_spawn(&mut self, ctx: &mut LifecycleCtx<'_>, name: &RegionName) -> SpawnOutcome {
        let Some(region) = ctx.regions.get_mut(name) else {
            return SpawnOutcome::Rejected(SpawnBlocker::UnknownRegion);
        };
        region.spawning = false;
        region.pending_spawn = None;

        let Some(region) = ctx.regions.get(name) else {
            return SpawnOutcome::Rejected(SpawnBlocker::UnknownRegion);
        };
        if let Some(blocker) = self.spawn_blocker(region) {
            trace!(region = %name, ?blocker, "animated spawn dropped");
            return SpawnOutcome::Rejected(blocker);
        }
        let spawn = region.spawn();
        SpawnOutcome::Spawned(self.create(ctx, name, spawn))
    }

    fn spawn_blocker(&self, region: &Region) -> Option<SpawnBlocker> {
        if self.live_in(region).is_some() {
            Some(SpawnBlocker::LiveBall)
        } else if region.is_spawning() {
            Some(SpawnBlocker::Animating)
        } else if region.players().iter().any(|p| self.held.get(p) == Some(region.name())) {
            Some(SpawnBlocker::BallHeld)
        } else {
            None
        }
    }

    /// Puts a new resting ball into the world as the region's live ball.
    fn create(&mut self, ctx: &mut LifecycleCtx<'_>, name: &RegionName, position: DVec3) -> BallId {
        let id = self.arena.spawn(name.clone(), position, ctx.tick);
        if let Some(region) = ctx.regions.get_mut(name) {
            region.live_ball = Some(id);
        }
        debug!(region = %name, ball = %id, ?position, "ball spawned");
        ctx.host.events().emit(GameEvent::BallSpawned {
            ball: id,
            region: name.clone(),
            position,
        });
        id
    }

    /// Removes a live ball and clears its region's reference to it.
    pub fn remove_live(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        id: BallId,
        reason: RemovalReason,
    ) -> Option<Ball> {
        let ball = self.arena.despawn(id)?;
        if let Some(region) = ctx.regions.get_mut(&ball.region) {
            if region.live_ball == Some(id) {
                region.live_ball = None;
            }
        }
        debug!(region = %ball.region, ball = %id, ?reason, "ball removed");
        ctx.host.events().emit(GameEvent::BallRemoved {
            ball: id,
            region: ball.region.clone(),
            position: ball.position(),
            reason,
        });
        Some(ball)
    }

    // -------------------------------------------------------------------------
    // Throwing
    // -------------------------------------------------------------------------

    /// Launches a live ball along `direction`.
    ///
    /// Any ball held by `player` leaves their hand. The launch velocity is
    /// the normalized direction times the throw speed, plus the arc on y.
    ///
    /// # Errors
    ///
    /// [`CourtError::StaleBall`] if the ball is gone, and
    /// [`CourtError::NotInRegion`] if the player is not in its region.
    pub fn throw_ball(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        player: PlayerId,
        id: BallId,
        direction: DVec3,
    ) -> Result<DVec3, CourtError> {
        let ball_region = self.arena.get(id).ok_or(CourtError::StaleBall(id))?.region.clone();
        if ctx.regions.region_of(player) != Some(&ball_region) {
            return Err(CourtError::NotInRegion(player));
        }

        if self.held.remove(&player).is_some() {
            self.watches.remove(&player);
        }

        let throw = &ctx.config.throw;
        let mut velocity = direction.normalize_or_zero() * throw.velocity;
        velocity.y += throw.arc;

        let ball = self.arena.get_mut(id).ok_or(CourtError::StaleBall(id))?;
        ball.launch(velocity, player);
        debug!(%player, ball = %id, ?velocity, "ball thrown");
        ctx.host.events().emit(GameEvent::BallThrown {
            ball: id,
            player,
            velocity,
        });
        Ok(velocity)
    }

    /// Releases the ball `player` holds at head height and throws it.
    ///
    /// Returns `None` and keeps the ball in hand if the region already has a
    /// live ball.
    ///
    /// # Errors
    ///
    /// [`CourtError::NotHolding`] if the player holds nothing,
    /// [`CourtError::NotInRegion`] if they are not in the ball's region, and
    /// [`CourtError::UnknownRegion`] if that region was deleted.
    pub fn throw_held(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        player: PlayerId,
        direction: DVec3,
    ) -> Result<Option<BallId>, CourtError> {
        let name = self.held.get(&player).cloned().ok_or(CourtError::NotHolding(player))?;
        if ctx.regions.region_of(player) != Some(&name) {
            return Err(CourtError::NotInRegion(player));
        }
        let region = ctx
            .regions
            .get(&name)
            .ok_or_else(|| CourtError::UnknownRegion(name.clone()))?;
        if self.live_in(region).is_some() {
            trace!(%player, region = %name, "throw from hand rejected: live ball present");
            return Ok(None);
        }

        let feet = ctx.host.players().position(player).unwrap_or_else(|| region.spawn());
        let release = feet + DVec3::new(0.0, ctx.config.throw.release_height, 0.0);
        let id = self.create(ctx, &name, release);
        self.throw_ball(ctx, player, id, direction)?;
        Ok(Some(id))
    }

    // -------------------------------------------------------------------------
    // Pickup
    // -------------------------------------------------------------------------

    /// Takes a live ball into `player`'s hand.
    ///
    /// The ball leaves the world and its thrower attribution is dropped.
    pub fn pickup(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        player: PlayerId,
        id: BallId,
    ) -> PickupOutcome {
        if self.is_holding(player) {
            trace!(%player, "pickup rejected: already holding");
            return PickupOutcome::AlreadyHolding;
        }
        let Some(ball) = self.arena.get(id) else {
            trace!(%player, ball = %id, "pickup rejected: no live ball");
            return PickupOutcome::NoBall;
        };
        if ctx.regions.region_of(player) != Some(&ball.region) {
            trace!(%player, ball = %id, "pickup rejected: not in the ball's region");
            return PickupOutcome::NotPresent;
        }

        let Some(ball) = self.remove_live(ctx, id, RemovalReason::PickedUp) else {
            return PickupOutcome::NoBall;
        };
        self.give(ctx, player, ball.region);
        PickupOutcome::PickedUp
    }

    /// Picks up the live ball of `player`'s region if it is within reach.
    pub fn pickup_nearby(&mut self, ctx: &mut LifecycleCtx<'_>, player: PlayerId) -> PickupOutcome {
        if self.is_holding(player) {
            return PickupOutcome::AlreadyHolding;
        }
        let Some(region) = ctx.regions.region_of(player).and_then(|n| ctx.regions.get(n)) else {
            return PickupOutcome::NotPresent;
        };
        let Some(id) = self.live_in(region) else {
            return PickupOutcome::NoBall;
        };
        let Some(position) = ctx.host.players().position(player) else {
            return PickupOutcome::OutOfRange;
        };
        let in_reach = self
            .arena
            .get(id)
            .is_some_and(|ball| {
                ball.position().distance(position) <= ctx.config.pickup.effective_range()
            });
        if !in_reach {
            trace!(%player, ball = %id, "pickup rejected: out of range");
            return PickupOutcome::OutOfRange;
        }
        self.pickup(ctx, player, id)
    }

    /// Turns a resting marker of `player`'s region back into a held ball.
    ///
    /// Refused while the region has a live, animating or held ball. Markers
    /// never block a spawn, so a marker can outlast the ball that replaced it.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::Terrain`] if the marker cannot be removed.
    pub fn pickup_marker(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        player: PlayerId,
        block: BlockPos,
    ) -> Result<PickupOutcome, CourtError> {
        if self.is_holding(player) {
            return Ok(PickupOutcome::AlreadyHolding);
        }
        let Some(name) = ctx.regions.region_of(player).cloned() else {
            return Ok(PickupOutcome::NotPresent);
        };
        let Some(region) = ctx.regions.get(&name) else {
            return Ok(PickupOutcome::NotPresent);
        };
        if !region.markers.contains(&block) {
            return Ok(PickupOutcome::NoBall);
        }
        let in_play = self.balls_in(region);
        if in_play > 0 {
            trace!(
                %player,
                region = %name,
                %block,
                in_play,
                "marker pickup rejected: ball in play"
            );
            return Ok(PickupOutcome::BallInPlay);
        }
        let Some(region) = ctx.regions.get_mut(&name) else {
            return Ok(PickupOutcome::NotPresent);
        };

        ctx.host.terrain().remove_marker(block)?;
        region.markers.remove(&block);
        debug!(%player, region = %name, %block, "marker picked up");
        self.give(ctx, player, name);
        Ok(PickupOutcome::PickedUp)
    }

    /// Puts a ball in `player`'s hand and starts its auto-drop watch.
    fn give(&mut self, ctx: &mut LifecycleCtx<'_>, player: PlayerId, region: RegionName) {
        let position = ctx.host.players().position(player).unwrap_or_default();
        self.watches.insert(player, AutoDropWatch::new(position));
        debug!(%player, region = %region, "ball picked up");
        ctx.host.events().emit(GameEvent::BallPickedUp {
            player,
            region: region.clone(),
        });
        self.held.insert(player, region);
    }

    // -------------------------------------------------------------------------
    // Dropping
    // -------------------------------------------------------------------------

    /// Drops the held ball at `position`.
    ///
    /// Inside a region the ball becomes a resting marker there. Outside every
    /// region it is discarded. Returns the marker block, if one was placed.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::NotHolding`] if the player holds nothing.
    pub fn drop_at(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        player: PlayerId,
        position: DVec3,
    ) -> Result<Option<BlockPos>, CourtError> {
        if self.held.remove(&player).is_none() {
            return Err(CourtError::NotHolding(player));
        }
        self.watches.remove(&player);

        let Some(name) = ctx.regions.region_at(position).map(|r| r.name().clone()) else {
            debug!(%player, ?position, "drop outside every region, ball discarded");
            ctx.host.events().emit(GameEvent::BallDropped {
                player,
                region: None,
                marker: None,
            });
            return Ok(None);
        };

        let marker = self.place_marker(ctx, &name, BlockPos::containing(position));
        debug!(%player, region = %name, ?marker, "ball dropped");
        ctx.host.events().emit(GameEvent::BallDropped {
            player,
            region: Some(name),
            marker,
        });
        Ok(marker)
    }

    /// Discards the held ball without placing anything.
    pub fn discard_held(&mut self, ctx: &mut LifecycleCtx<'_>, player: PlayerId) -> bool {
        if self.held.remove(&player).is_none() {
            return false;
        }
        self.watches.remove(&player);
        debug!(%player, "held ball discarded");
        ctx.host.events().emit(GameEvent::BallDropped {
            player,
            region: None,
            marker: None,
        });
        true
    }

    /// Drops a holder's ball at their last known position, for quit and death.
    pub fn drop_at_last_position(&mut self, ctx: &mut LifecycleCtx<'_>, player: PlayerId) {
        if !self.is_holding(player) {
            return;
        }
        match ctx.host.players().position(player) {
            Some(position) => {
                // Holding was checked above, so this cannot fail.
                let _ = self.drop_at(ctx, player, position);
            }
            None => {
                self.discard_held(ctx, player);
            }
        }
    }

    /// Places a resting marker for `region` at or just above `block`.
    fn place_marker(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        region: &RegionName,
        block: BlockPos,
    ) -> Option<BlockPos> {
        let terrain = ctx.host.terrain();
        let slot = match marker_slot(block, terrain) {
            Ok(slot) => slot?,
            Err(err) => {
                warn!(region = %region, %block, error = %err, "marker slot lookup failed");
                return None;
            }
        };
        if let Err(err) = terrain.place_marker(slot) {
            warn!(region = %region, block = %slot, error = %err, "marker placement failed");
            return None;
        }
        if let Some(r) = ctx.regions.get_mut(region) {
            r.markers.insert(slot);
        }
        Some(slot)
    }

    // -------------------------------------------------------------------------
    // Physics outcomes
    // -------------------------------------------------------------------------

    /// Retires a ball that came to rest: a nearby free player catches it,
    /// otherwise it becomes a marker in `slot`.
    pub fn settle(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        id: BallId,
        slot: Option<BlockPos>,
        catcher: Option<PlayerId>,
    ) {
        let Some(ball) = self.remove_live(ctx, id, RemovalReason::Rested) else {
            return;
        };
        let region = ball.region;

        let catcher = catcher.filter(|&p| {
            !self.is_holding(p) && ctx.regions.get(&region).is_some_and(|r| r.is_present(p))
        });
        if let Some(player) = catcher {
            debug!(%player, region = %region, "ball caught on rest");
            self.give(ctx, player, region);
            return;
        }

        let Some(slot) = slot else {
            debug!(region = %region, "no free block for resting marker");
            return;
        };
        if let Err(err) = ctx.host.terrain().place_marker(slot) {
            warn!(region = %region, block = %slot, error = %err, "marker placement failed");
            return;
        }
        if let Some(r) = ctx.regions.get_mut(&region) {
            r.markers.insert(slot);
        }
    }

    /// Removes an abandoned ball and respawns its region immediately.
    pub fn abandon(
        &mut self,
        ctx: &mut LifecycleCtx<'_>,
        id: BallId,
        reason: RemovalReason,
    ) -> SpawnOutcome {
        let Some(ball) = self.remove_live(ctx, id, reason) else {
            return SpawnOutcome::Rejected(SpawnBlocker::UnknownRegion);
        };
        self.spawn_in_region(ctx, &ball.region)
    }

    // -------------------------------------------------------------------------
    // Auto-drop
    // -------------------------------------------------------------------------

    /// Advances every auto-drop watch by one tick. Returns the players whose
    /// watch ended this tick.
    pub fn tick_auto_drop(&mut self, ctx: &mut LifecycleCtx<'_>) -> Vec<PlayerId> {
        let timing = &ctx.config.timing;
        let epsilon_sq = timing.still_epsilon * timing.still_epsilon;
        let (still_limit, move_limit) = (timing.auto_drop_still, timing.auto_drop_moving);
        let mut ended = Vec::new();

        let players: Vec<PlayerId> = self.watches.keys().copied().collect();
        for player in players {
            let online = ctx.host.players().is_online(player);
            let position = ctx.host.players().position(player);
            let (Some(position), true, true) = (position, online, self.is_holding(player)) else {
                trace!(%player, "stale auto-drop watch cancelled");
                self.watches.remove(&player);
                ended.push(player);
                continue;
            };

            let Some(watch) = self.watches.get_mut(&player) else {
                continue;
            };
            if position.distance_squared(watch.last_position) < epsilon_sq {
                watch.still_ticks += 1;
                watch.move_ticks = 0;
            } else {
                watch.move_ticks += 1;
                watch.still_ticks = 0;
            }
            watch.last_position = position;

            if watch.still_ticks < still_limit && watch.move_ticks < move_limit {
                continue;
            }

            self.watches.remove(&player);
            ended.push(player);
            if ctx.regions.region_of(player).is_some() {
                debug!(%player, "auto-drop");
                // Holding was checked above.
                let _ = self.drop_at(ctx, player, position);
            }
        }
        ended
    }

    // -------------------------------------------------------------------------
    // Cleanup
    // -------------------------------------------------------------------------

    /// Clears a region nobody is in any more.
    ///
    /// Removes its live ball, held balls and markers, cancels its timers and
    /// resets its session.
    pub fn region_emptied(&mut self, ctx: &mut LifecycleCtx<'_>, name: &RegionName) {
        let live: Vec<BallId> = self.arena.in_region(name).map(Ball::id).collect();
        for id in live {
            self.remove_live(ctx, id, RemovalReason::RegionEmptied);
        }
        for player in self.holders_in(name) {
            self.discard_held(ctx, player);
        }

        let Some(region) = ctx.regions.get_mut(name) else {
            return;
        };
        for timer in [
            region.pending_respawn.take(),
            region.pending_reset.take(),
            region.pending_spawn.take(),
        ]
        .into_iter()
        .flatten()
        {
            ctx.scheduler.cancel(timer);
        }
        region.spawning = false;
        region.live_ball = None;

        let markers = std::mem::take(&mut region.markers);
        for block in markers {
            if let Err(err) = ctx.host.terrain().remove_marker(block) {
                warn!(region = %name, %block, error = %err, "marker removal failed");
            }
        }
        region.session_mut().reset(std::iter::empty::<PlayerId>());
        debug!(region = %name, "region emptied");
    }

    /// Removes every live ball, held ball, marker and timer.
    pub fn clear_all(&mut self, ctx: &mut LifecycleCtx<'_>) {
        for id in self.arena.ids() {
            self.remove_live(ctx, id, RemovalReason::Cleared);
        }
        let holders: Vec<PlayerId> = self.held.keys().copied().collect();
        for player in holders {
            self.discard_held(ctx, player);
        }
        self.watches.clear();
        ctx.scheduler.clear();

        for region in ctx.regions.iter_mut() {
            region.live_ball = None;
            region.spawning = false;
            region.pending_respawn = None;
            region.pending_reset = None;
            region.pending_spawn = None;
            for block in std::mem::take(&mut region.markers) {
                if let Err(err) = ctx.host.terrain().remove_marker(block) {
                    warn!(region = %region.name(), %block, error = %err, "marker removal failed");
                }
            }
        }
        debug!("all balls cleared");
    }
}
