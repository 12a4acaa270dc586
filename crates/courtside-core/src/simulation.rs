//! The per-tick phase loop.
//!
//! [`Simulation`] owns every region, ball and timer and advances them one
//! host tick per [`Simulation::step`]:
//!
//! 1. **TIMERS**: due respawns, resets and spawn animations fire
//! 2. **BOUNDS**: stale region bounds are refreshed from the [`BoundsSource`]
//!    (if one is attached)
//! 3. **PHYSICS**: every `physics_interval` ticks, each thrown ball is
//!    advanced in parallel against an immutable [`CourtSnapshot`] of its
//!    region; results are sorted by ball id
//! 4. **RESOLUTION**: results are applied in ball order: write back,
//!    rest, abandon or discard
//! 5. **SCORING**: every `score_check_every` physics steps, thrown balls are
//!    checked against their region's hoops. Each physics step records a
//!    hoop crossing on the ball, so a skipped check only delays a basket.
//!    A crossing on the step a flight ends is scored on that step
//! 6. **AUTO-DROP**: idle holders lose their ball
//!
//! Host callbacks (region entry, throws, pickups) are plain method calls
//! made between steps.
//!
//! # Determinism
//!
//! Regions, players and balls are iterated in key order and physics results
//! are sorted before they are applied, so the same inputs produce the same
//! events and ball states regardless of thread scheduling.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use courtside_core::bounds::{BlockPos, Bounds};
//! use courtside_core::config::GameConfig;
//! use courtside_core::error::TerrainError;
//! use courtside_core::entity::PlayerId;
//! use courtside_core::region::RegionDefinition;
//! use courtside_core::simulation::Simulation;
//! use courtside_core::world::{Host, PlayerRegistry, Terrain};
//! use glam::DVec3;
//!
//! struct Floor;
//! impl Terrain for Floor {
//!     fn is_solid(&self, block: BlockPos) -> Result<bool, TerrainError> { Ok(block.y <= 0) }
//!     fn place_marker(&self, _: BlockPos) -> Result<(), TerrainError> { Ok(()) }
//!     fn remove_marker(&self, _: BlockPos) -> Result<bool, TerrainError> { Ok(true) }
//! }
//!
//! struct Nobody;
//! impl PlayerRegistry for Nobody {
//!     fn position(&self, _: PlayerId) -> Option<DVec3> { None }
//!     fn is_online(&self, _: PlayerId) -> bool { false }
//! }
//!
//! let host = Host::new(Arc::new(Floor), Arc::new(Nobody));
//! let mut sim = Simulation::new(GameConfig::default(), host);
//! let mut court = RegionDefinition::around("court1", DVec3::new(10.0, 1.0, 10.0));
//! court.bounds = Some(Bounds::new(BlockPos::new(0, 0, 0), BlockPos::new(20, 10, 20)));
//! sim.add_region(court);
//! sim.spawn_ball(&"court1".into());
//!
//! for _ in 0..10 {
//!     sim.step();
//! }
//! assert_eq!(sim.tick(), 10);
//! assert_eq!(sim.balls().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::DVec3;
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::arena::BallArena;
use crate::bounds::BlockPos;
use crate::config::GameConfig;
use crate::entity::{Ball, BallId, PlayerId, RegionName};
use crate::error::CourtError;
use crate::event::{GameEvent, RemovalReason, WinEvent};
use crate::lifecycle::{BallLifecycleManager, LifecycleCtx, PickupOutcome, SpawnOutcome};
use crate::physics::{AbandonReason, CourtSnapshot, PhysicsEngine, TickOutcome, TickResult};
use crate::region::{Region, RegionDefinition, RegionDirectory};
use crate::scheduler::{Scheduler, TimerAction};
use crate::score::ScoreDetector;
use crate::session::ScoreOutcome;
use crate::world::{BoundsSource, Host};

// =============================================================================
// Simulation
// =============================================================================

/// Court simulation driven one host tick at a time.
pub struct Simulation {
    config: GameConfig,
    regions: RegionDirectory,
    lifecycle: BallLifecycleManager,
    scheduler: Scheduler,
    physics: PhysicsEngine,
    detector: ScoreDetector,
    host: Host,
    tick: u64,
    physics_steps: u64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("physics_steps", &self.physics_steps)
            .field("regions", &self.regions.len())
            .field("balls", &self.lifecycle.arena().len())
            .field("timers", &self.scheduler.len())
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation with no regions at tick 0.
    ///
    /// `config` is used as given; load it with [`GameConfig::load`] to have
    /// it validated. A zero interval in `timing` runs that phase every time.
    #[must_use]
    pub fn new(config: GameConfig, host: Host) -> Self {
        let mut regions = RegionDirectory::new();
        regions.set_log_checks(config.debug.log_region_checks);
        Self {
            physics: PhysicsEngine::new(config.physics.clone()),
            detector: ScoreDetector::new(&config.hoop),
            config,
            regions,
            lifecycle: BallLifecycleManager::new(),
            scheduler: Scheduler::new(),
            host,
            tick: 0,
            physics_steps: 0,
        }
    }

    /// Splits the simulation into the lifecycle manager and the context it
    /// works against.
    fn split(&mut self) -> (&mut BallLifecycleManager, LifecycleCtx<'_>) {
        (
            &mut self.lifecycle,
            LifecycleCtx {
                regions: &mut self.regions,
                scheduler: &mut self.scheduler,
                host: &self.host,
                config: &self.config,
                tick: self.tick,
            },
        )
    }

    // -------------------------------------------------------------------------
    // Tick loop
    // -------------------------------------------------------------------------

    /// Advances the simulation by one host tick.
    pub fn step(&mut self) {
        let tick = self.tick;

        // PHASE 1: TIMERS
        self.run_timers();

        // PHASE 2: BOUNDS
        if let Some(source) = self.host.bounds_source() {
            self.regions
                .refresh_bounds(source, tick, self.config.timing.bounds_cache);
        }

        let timing = &self.config.timing;
        let check_every = timing.score_check_every.max(1);
        if tick % timing.physics_interval.max(1) == 0 {
            // PHASE 3: PHYSICS
            let results = self.compute_physics();

            // PHASE 4: RESOLUTION
            let landed = self.apply_physics(results);
            self.physics_steps += 1;

            // PHASE 5: SCORING
            for (id, outcome) in landed {
                if !self.score_ball(id) {
                    let (lifecycle, mut ctx) = self.split();
                    end_flight(lifecycle, &mut ctx, id, outcome);
                }
            }
            if self.physics_steps % check_every == 0 {
                self.check_scores();
            }
        }

        // PHASE 6: AUTO-DROP
        let (lifecycle, mut ctx) = self.split();
        lifecycle.tick_auto_drop(&mut ctx);

        self.tick += 1;
    }

    /// Runs `ticks` steps.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    fn run_timers(&mut self) {
        for (id, action) in self.scheduler.drain_due(self.tick) {
            trace!(timer = ?id, ?action, "timer fired");
            match action {
                TimerAction::RespawnBall { region } => {
                    let Some(r) = self.regions.get_mut(&region) else {
                        continue;
                    };
                    if r.pending_respawn == Some(id) {
                        r.pending_respawn = None;
                    }
                    if r.session().is_won() {
                        debug!(region = %region, "respawn skipped, game is won");
                        continue;
                    }
                    let (lifecycle, mut ctx) = self.split();
                    lifecycle.spawn_in_region(&mut ctx, &region);
                }
                TimerAction::FinishSpawn { region } => {
                    let (lifecycle, mut ctx) = self.split();
                    lifecycle.finish_spawn(&mut ctx, &region);
                }
                TimerAction::ResetGame { region } => {
                    if let Some(r) = self.regions.get_mut(&region) {
                        if r.pending_reset == Some(id) {
                            r.pending_reset = None;
                        }
                    }
                    // The region may have been deleted since the win.
                    let _ = self.reset_game(&region);
                }
            }
        }
    }

    /// Advances every thrown ball against a snapshot of its region.
    fn compute_physics(&self) -> Vec<PhysicsJob> {
        let mut courts: BTreeMap<&RegionName, CourtSnapshot> = BTreeMap::new();
        let mut orphans = Vec::new();
        let mut flying: Vec<&Ball> = Vec::new();

        for ball in self.lifecycle.arena().iter().filter(|b| b.thrown) {
            match self.regions.get(&ball.region) {
                Some(region) => {
                    courts
                        .entry(region.name())
                        .or_insert_with(|| self.snapshot(region));
                    flying.push(ball);
                }
                None => orphans.push(PhysicsJob::Orphaned(ball.id())),
            }
        }

        let terrain = self.host.terrain();
        let mut results: Vec<TickResult> = flying
            .par_iter()
            .filter_map(|ball| {
                let court = courts.get(&ball.region)?;
                Some(self.physics.tick(ball, court, terrain))
            })
            .collect();

        // Apply in ball order regardless of worker scheduling.
        results.sort_by_key(|r| r.ball);

        orphans.extend(results.into_iter().map(PhysicsJob::Stepped));
        orphans
    }

    fn snapshot(&self, region: &Region) -> CourtSnapshot {
        CourtSnapshot {
            bounds: region.bounds(),
            center: region.center(),
            players: self.host.locate(region.players().iter().copied()),
            holders: self.lifecycle.holders_in(region.name()),
        }
    }

    /// Writes results back and records hoop crossings. Flights that end on
    /// a step with a crossing are returned unresolved so they can score.
    fn apply_physics(&mut self, jobs: Vec<PhysicsJob>) -> Vec<(BallId, TickOutcome)> {
        let detector = self.detector.clone();
        let (lifecycle, mut ctx) = self.split();
        let mut landed = Vec::new();
        for job in jobs {
            let result = match job {
                PhysicsJob::Orphaned(id) => {
                    warn!(ball = %id, "ball region no longer exists");
                    lifecycle.remove_live(&mut ctx, id, RemovalReason::NoRegion);
                    continue;
                }
                PhysicsJob::Stepped(result) => result,
            };
            let id = result.ball;

            if let TickOutcome::Failed(err) = &result.outcome {
                warn!(ball = %id, error = %err, "terrain query failed, removing ball");
                lifecycle.remove_live(&mut ctx, id, RemovalReason::TerrainFailure);
                continue;
            }

            let mut crossed = false;
            if let Some(ball) = lifecycle.arena_mut().get_mut(id) {
                if ball.hoop_pass.is_none() {
                    let hoops = ctx
                        .regions
                        .get(&ball.region)
                        .map(Region::hoops)
                        .unwrap_or_default();
                    let to = result.motion.position;
                    ball.hoop_pass = detector.swept_pass(ball.position(), to, hoops);
                    if let Some(pass) = ball.hoop_pass {
                        trace!(ball = %id, ?pass, "hoop crossing recorded");
                    }
                }
                crossed = ball.hoop_pass.is_some();
                ball.motion = result.motion;
                ball.bounce_count = result.bounce_count;
            }

            if crossed && result.removes_ball() {
                landed.push((id, result.outcome));
                continue;
            }
            match result.outcome {
                TickOutcome::Airborne => {
                    trace!(
                        ball = %id,
                        position = ?result.motion.position,
                        contacts = ?result.contacts,
                        "ball moved"
                    );
                }
                TickOutcome::Bounced { bounce, impact_speed } => {
                    debug!(ball = %id, bounce, impact_speed, "ball bounced");
                }
                outcome => end_flight(lifecycle, &mut ctx, id, outcome),
            }
        }
        landed
    }

    fn check_scores(&mut self) {
        let flying: Vec<BallId> = self
            .lifecycle
            .arena()
            .iter()
            .filter(|b| b.thrown)
            .map(Ball::id)
            .collect();

        for id in flying {
            self.score_ball(id);
        }
    }

    /// Scores `id` if it is in, or has crossed, a hoop zone. Returns true if
    /// the ball was removed as a basket.
    ///
    /// A crossing that nobody present can be credited with is forgotten.
    fn score_ball(&mut self, id: BallId) -> bool {
        let Some(ball) = self.lifecycle.arena().get(id) else {
            return false;
        };
        let Some(region) = self.regions.get(&ball.region) else {
            return false;
        };
        let players = self.host.locate(region.players().iter().copied());
        let Some(event) = self
            .detector
            .check_score(ball, region.name(), region.hoops(), &players, self.tick)
        else {
            if let Some(ball) = self.lifecycle.arena_mut().get_mut(id) {
                ball.hoop_pass = None;
            }
            return false;
        };

        let (lifecycle, mut ctx) = self.split();
        lifecycle.remove_live(&mut ctx, id, RemovalReason::Scored);

        let Some(region) = self.regions.get_mut(&event.region) else {
            return true;
        };
        let outcome = region.session_mut().add_score(event.player);
        let score = match outcome {
            ScoreOutcome::Locked => {
                debug!(
                    region = %event.region,
                    player = %event.player,
                    "basket ignored, game is won"
                );
                return true;
            }
            ScoreOutcome::Scored { score } | ScoreOutcome::Won { score, .. } => score,
        };

        info!(
            region = %event.region,
            player = %event.player,
            score,
            hoop = ?event.hoop,
            "basket scored"
        );
        self.host.events().emit(GameEvent::Score(event.clone()));
        let name = self.host.players().display_name(event.player);
        self.announce(&event.region, "SCORE!", &format!("{name} - {score} points"));

        if let ScoreOutcome::Won { .. } = outcome {
            self.finish_game(&event.region, event.player, outcome);
        } else if let Some(region) = self.regions.get_mut(&event.region) {
            if let Some(timer) = region.pending_respawn.take() {
                self.scheduler.cancel(timer);
            }
            region.pending_respawn = Some(self.scheduler.schedule(
                self.tick,
                self.config.timing.respawn_delay,
                TimerAction::RespawnBall {
                    region: event.region.clone(),
                },
            ));
        }
        true
    }

    /// Publishes a win and schedules the reset.
    fn finish_game(&mut self, name: &RegionName, winner: PlayerId, outcome: ScoreOutcome) {
        let ScoreOutcome::Won { score, total_wins } = outcome else {
            return;
        };
        info!(region = %name, player = %winner, score, total_wins, "game won");
        self.host.events().emit(GameEvent::Win(WinEvent {
            player: winner,
            region: name.clone(),
            score,
            total_wins,
        }));
        let display = self.host.players().display_name(winner);
        self.announce(name, "WINNER!", &format!("{display} has won!"));

        if let Some(region) = self.regions.get_mut(name) {
            if let Some(timer) = region.pending_respawn.take() {
                self.scheduler.cancel(timer);
            }
            if let Some(timer) = region.pending_reset.take() {
                self.scheduler.cancel(timer);
            }
            region.pending_reset = Some(self.scheduler.schedule(
                self.tick,
                self.config.timing.reset_delay,
                TimerAction::ResetGame { region: name.clone() },
            ));
        }
    }

    /// Shows a title to everyone in `region`.
    fn announce(&self, region: &RegionName, title: &str, subtitle: &str) {
        let Some(region) = self.regions.get(region) else {
            return;
        };
        for &player in region.players() {
            self.host
                .notifier()
                .notify(player, title, subtitle, self.config.titles);
        }
    }

    // -------------------------------------------------------------------------
    // Regions
    // -------------------------------------------------------------------------

    /// Adds a region, replacing any region of the same name.
    ///
    /// Balls and timers of a replaced region are cleared; its players stay.
    pub fn add_region(&mut self, def: RegionDefinition) {
        let name = def.name.clone();
        if self.regions.contains(&name) {
            let (lifecycle, mut ctx) = self.split();
            lifecycle.region_emptied(&mut ctx, &name);
        }
        self.regions
            .insert(Region::from_definition(def, self.config.scoring.win_threshold));
        info!(region = %name, "region added");
    }

    /// Adds every region in `defs`.
    pub fn load_regions(&mut self, defs: impl IntoIterator<Item = RegionDefinition>) {
        for def in defs {
            self.add_region(def);
        }
    }

    /// Deletes a region and everything in it.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::UnknownRegion`] if no region has that name.
    pub fn remove_region(&mut self, name: &RegionName) -> Result<RegionDefinition, CourtError> {
        if !self.regions.contains(name) {
            return Err(CourtError::UnknownRegion(name.clone()));
        }
        let (lifecycle, mut ctx) = self.split();
        lifecycle.region_emptied(&mut ctx, name);
        let region = self
            .regions
            .remove(name)
            .ok_or_else(|| CourtError::UnknownRegion(name.clone()))?;
        info!(region = %name, "region removed");
        Ok(region.definition())
    }

    /// Save shapes of every region, including win counts.
    #[must_use]
    pub fn region_definitions(&self) -> Vec<RegionDefinition> {
        self.regions.definitions()
    }

    // -------------------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------------------

    /// Records that `player` walked into `name`.
    ///
    /// An unknown region is created around the player's position. Entering
    /// a region leaves the previous one, discarding a ball held there.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::UnknownRegion`] if the region is unknown and
    /// the player's position is too.
    pub fn player_entered(
        &mut self,
        player: PlayerId,
        name: &RegionName,
    ) -> Result<(), CourtError> {
        if !self.regions.contains(name) {
            let center = self
                .host
                .players()
                .position(player)
                .ok_or_else(|| CourtError::UnknownRegion(name.clone()))?;
            info!(region = %name, ?center, "creating region on first entry");
            self.add_region(RegionDefinition::around(name.clone(), center));
        }
        if self.regions.region_of(player) == Some(name) {
            return Ok(());
        }

        if self.regions.region_of(player).is_some() {
            let (lifecycle, mut ctx) = self.split();
            lifecycle.discard_held(&mut ctx, player);
        }
        let was_empty = self.regions.get(name).is_some_and(Region::is_empty);
        let left = self.regions.enter(player, name)?;
        if let Some(old) = left {
            self.cleanup_if_empty(&old);
        }

        if was_empty && self.config.lifecycle.spawn_on_first_entry {
            let (lifecycle, mut ctx) = self.split();
            lifecycle.spawn_in_region(&mut ctx, name);
        }
        Ok(())
    }

    /// Records that `player` walked out of their region. Their held ball is
    /// discarded.
    pub fn player_left(&mut self, player: PlayerId) -> Option<RegionName> {
        if self.regions.region_of(player).is_none() {
            return None;
        }
        let (lifecycle, mut ctx) = self.split();
        lifecycle.discard_held(&mut ctx, player);
        let left = self.regions.leave(player)?;
        self.cleanup_if_empty(&left);
        Some(left)
    }

    /// Handles a disconnect: the held ball drops at the last known position,
    /// then the player leaves their region.
    pub fn player_disconnected(&mut self, player: PlayerId) -> Option<RegionName> {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.drop_at_last_position(&mut ctx, player);
        self.player_left(player)
    }

    /// Handles a death: the held ball drops at the last known position.
    pub fn player_died(&mut self, player: PlayerId) {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.drop_at_last_position(&mut ctx, player);
    }

    fn cleanup_if_empty(&mut self, name: &RegionName) {
        if self.regions.get(name).is_some_and(Region::is_empty) {
            let (lifecycle, mut ctx) = self.split();
            lifecycle.region_emptied(&mut ctx, name);
        }
    }

    // -------------------------------------------------------------------------
    // Ball operations
    // -------------------------------------------------------------------------

    /// Spawns a ball in `name` unless it already has one.
    pub fn spawn_ball(&mut self, name: &RegionName) -> SpawnOutcome {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.spawn_in_region(&mut ctx, name)
    }

    /// Throws a live ball along `direction` and returns the launch velocity.
    ///
    /// # Errors
    ///
    /// See [`BallLifecycleManager::throw_ball`].
    pub fn throw_ball(
        &mut self,
        player: PlayerId,
        ball: BallId,
        direction: DVec3,
    ) -> Result<DVec3, CourtError> {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.throw_ball(&mut ctx, player, ball, direction)
    }

    /// Throws the ball `player` holds.
    ///
    /// # Errors
    ///
    /// See [`BallLifecycleManager::throw_held`].
    pub fn throw_held(
        &mut self,
        player: PlayerId,
        direction: DVec3,
    ) -> Result<Option<BallId>, CourtError> {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.throw_held(&mut ctx, player, direction)
    }

    /// Takes a live ball into `player`'s hand.
    pub fn pickup(&mut self, player: PlayerId, ball: BallId) -> PickupOutcome {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.pickup(&mut ctx, player, ball)
    }

    /// Picks up the region's live ball if it is within pickup range.
    pub fn pickup_nearby(&mut self, player: PlayerId) -> PickupOutcome {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.pickup_nearby(&mut ctx, player)
    }

    /// Picks up a resting marker.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::Terrain`] if the marker cannot be removed.
    pub fn pickup_marker(
        &mut self,
        player: PlayerId,
        block: BlockPos,
    ) -> Result<PickupOutcome, CourtError> {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.pickup_marker(&mut ctx, player, block)
    }

    /// Drops the held ball at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::NotHolding`] if the player holds nothing.
    pub fn drop_at(
        &mut self,
        player: PlayerId,
        position: DVec3,
    ) -> Result<Option<BlockPos>, CourtError> {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.drop_at(&mut ctx, player, position)
    }

    /// Removes every ball, held ball, marker and timer.
    pub fn clear_all(&mut self) {
        let (lifecycle, mut ctx) = self.split();
        lifecycle.clear_all(&mut ctx);
        info!("simulation cleared");
    }

    // -------------------------------------------------------------------------
    // Scoring
    // -------------------------------------------------------------------------

    /// Adds points to `player`'s score in their region, outside hoop
    /// detection. `None` awards `points_per_basket`.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::NotInRegion`] if the player is in no region.
    pub fn award_points(
        &mut self,
        player: PlayerId,
        points: Option<u32>,
    ) -> Result<ScoreOutcome, CourtError> {
        let name = self
            .regions
            .region_of(player)
            .cloned()
            .ok_or(CourtError::NotInRegion(player))?;
        let points = points.unwrap_or(self.config.scoring.points_per_basket);
        let region = self
            .regions
            .get_mut(&name)
            .ok_or_else(|| CourtError::UnknownRegion(name.clone()))?;

        let outcome = region.session_mut().add_points(player, points);
        match outcome {
            ScoreOutcome::Locked => {
                debug!(region = %name, %player, points, "points ignored, game is won");
            }
            ScoreOutcome::Scored { score } | ScoreOutcome::Won { score, .. } => {
                info!(region = %name, %player, points, score, "points awarded");
                self.host.events().emit(GameEvent::PointsAwarded {
                    player,
                    region: name.clone(),
                    points,
                    score,
                });
                if let ScoreOutcome::Won { .. } = outcome {
                    self.finish_game(&name, player, outcome);
                }
            }
        }
        Ok(outcome)
    }

    /// Resets the game in `name` and spawns a fresh ball.
    ///
    /// Scores of present players go back to zero; win counts are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::UnknownRegion`] if no region has that name.
    pub fn reset_game(&mut self, name: &RegionName) -> Result<(), CourtError> {
        let region = self
            .regions
            .get_mut(name)
            .ok_or_else(|| CourtError::UnknownRegion(name.clone()))?;
        if let Some(timer) = region.pending_reset.take() {
            self.scheduler.cancel(timer);
        }
        let present: Vec<PlayerId> = region.players().iter().copied().collect();
        region.session_mut().reset(present);
        let threshold = region.session().win_threshold();

        info!(region = %name, "game reset");
        self.host
            .events()
            .emit(GameEvent::GameReset { region: name.clone() });
        self.announce(name, "New game", &format!("First to {threshold} wins"));

        let (lifecycle, mut ctx) = self.split();
        lifecycle.spawn_in_region(&mut ctx, name);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Swaps in a new configuration. In-flight balls keep their position and
    /// velocity; sessions pick up the new win threshold.
    ///
    /// # Errors
    ///
    /// Returns [`CourtError::Config`] if the config fails validation; the
    /// current config stays in effect.
    pub fn reload_config(&mut self, config: GameConfig) -> Result<(), CourtError> {
        config.validate()?;
        self.physics = PhysicsEngine::new(config.physics.clone());
        self.detector = ScoreDetector::new(&config.hoop);
        self.regions.set_log_checks(config.debug.log_region_checks);
        for region in self.regions.iter_mut() {
            region
                .session_mut()
                .set_win_threshold(config.scoring.win_threshold);
        }
        self.config = config;
        info!("configuration reloaded");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current host tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Physics steps run so far.
    #[must_use]
    pub const fn physics_steps(&self) -> u64 {
        self.physics_steps
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// All regions.
    #[must_use]
    pub const fn regions(&self) -> &RegionDirectory {
        &self.regions
    }

    /// Region by name.
    #[must_use]
    pub fn region(&self, name: &RegionName) -> Option<&Region> {
        self.regions.get(name)
    }

    /// Live balls.
    #[must_use]
    pub const fn balls(&self) -> &BallArena {
        self.lifecycle.arena()
    }

    /// Ball ownership and hand-offs.
    #[must_use]
    pub const fn lifecycle(&self) -> &BallLifecycleManager {
        &self.lifecycle
    }

    /// Pending timers.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Host collaborators.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// Attached bounds source, if any.
    #[must_use]
    pub fn bounds_source(&self) -> Option<&dyn BoundsSource> {
        self.host.bounds_source()
    }
}

/// Resolves a flight that ended this step: a rest settles the ball, an
/// abandon removes and respawns it.
fn end_flight(
    lifecycle: &mut BallLifecycleManager,
    ctx: &mut LifecycleCtx<'_>,
    id: BallId,
    outcome: TickOutcome,
) {
    match outcome {
        TickOutcome::Rested { marker, auto_pickup } => {
            debug!(ball = %id, ?marker, ?auto_pickup, "ball came to rest");
            if let Some(ball) = lifecycle.arena_mut().get_mut(id) {
                ball.thrown = false;
                ball.hoop_pass = None;
            }
            lifecycle.settle(ctx, id, marker, auto_pickup);
        }
        TickOutcome::Abandoned(reason) => {
            let reason = match reason {
                AbandonReason::OutOfBounds => RemovalReason::OutOfBounds,
                AbandonReason::Stuck => RemovalReason::Stuck,
            };
            debug!(ball = %id, ?reason, "ball abandoned, respawning");
            lifecycle.abandon(ctx, id, reason);
        }
        TickOutcome::Airborne | TickOutcome::Bounced { .. } | TickOutcome::Failed(_) => {}
    }
}

/// Physics work item for the resolution phase.
enum PhysicsJob {
    /// The ball's region is gone.
    Orphaned(BallId),
    /// A completed step.
    Stepped(TickResult),
}

// =============================================================================
// Tests
// =============================================================================
