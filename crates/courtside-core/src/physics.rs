//! Per-step ball physics.
//!
//! [`PhysicsEngine::tick`] advances one thrown ball by one physics step. It
//! is a pure function of the ball, an immutable [`CourtSnapshot`] of its
//! region and read-only terrain queries, so the simulation can run it for
//! every ball in parallel and apply the [`TickResult`]s afterwards.
//!
//! # Step order
//!
//! 1. **Abandon**: a ball more than `out_of_bounds_margin` blocks outside the
//!    box, or stuck (slower than `stuck_threshold` on solid ground), is given
//!    up and the step ends.
//! 2. **Gravity**: `vy -= gravity`.
//! 3. **Ground**: while falling, the blocks between the one below the ball
//!    and the one below its projected position are probed. On contact the
//!    ball either rests (bounce budget spent) or bounces, and the step ends.
//! 4. **Boundaries**: outside the box on X/Z the ball is sent back toward the
//!    center; otherwise, near an X/Z wall it is sent toward the nearest
//!    player, or reflected and amplified if nobody is there. Moving past a Y
//!    bound reflects `vy` with damping. Without a boundary hit, a solid block
//!    ahead reflects the horizontal components with damping.
//! 5. **Air resistance**, only when no boundary was hit.
//! 6. **Speed cap** (`max_speed`), if configured.
//! 7. **Rest**: a supported ball slower than `rest_threshold` on every axis
//!    rests and may be caught by a nearby player.
//! 8. **Commit**: `position += velocity`, clamped to the box grown by the
//!    out-of-bounds margin.
//!
//! Any terrain error ends the step with [`TickOutcome::Failed`]; the ball's
//! state in the result is unchanged.

use std::collections::BTreeSet;

use bitflags::bitflags;
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::bounds::{BlockPos, Bounds};
use crate::config::PhysicsConfig;
use crate::entity::{Ball, BallId, Motion, PlayerId};
use crate::error::TerrainError;
use crate::world::{nearest_player, Terrain};

bitflags! {
    /// Collisions that happened during one step.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Contacts: u8 {
        /// Touched the ground.
        const GROUND = 1 << 0;
        /// Hit a region boundary.
        const BOUNDARY = 1 << 1;
        /// Hit a solid block ahead.
        const BLOCK = 1 << 2;
        /// Velocity was capped at `max_speed`.
        const CLAMPED = 1 << 3;
        /// Committed position was clamped into the box.
        const CONTAINED = 1 << 4;
    }
}

// =============================================================================
// Inputs and results
// =============================================================================

/// Immutable view of a ball's region for one physics step.
#[derive(Debug, Clone, PartialEq)]
pub struct CourtSnapshot {
    /// Region box.
    pub bounds: Bounds,
    /// Target of the overshoot redirect.
    pub center: DVec3,
    /// Present, online players with known positions.
    pub players: Vec<(PlayerId, DVec3)>,
    /// Players that already hold a ball and cannot catch another.
    pub holders: BTreeSet<PlayerId>,
}

impl CourtSnapshot {
    /// Snapshot of an empty court.
    #[must_use]
    pub fn empty(bounds: Bounds) -> Self {
        Self {
            bounds,
            center: bounds.center(),
            players: Vec::new(),
            holders: BTreeSet::new(),
        }
    }
}

/// Why a ball was given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonReason {
    /// Left the box by more than the margin.
    OutOfBounds,
    /// Stopped on solid ground while still marked thrown.
    Stuck,
}

/// What a physics step did to a ball.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Still in flight.
    Airborne,
    /// Touched the ground and bounced.
    Bounced {
        /// Bounce count after this bounce
        bounce: u32,
        /// Downward speed at contact
        impact_speed: f64,
    },
    /// Stopped moving. The live ball must be removed.
    Rested {
        /// Block for the resting marker, `None` if no slot was free
        marker: Option<BlockPos>,
        /// Nearby player who catches the ball instead of a marker
        auto_pickup: Option<PlayerId>,
    },
    /// Given up. The live ball must be removed and the region respawned.
    Abandoned(AbandonReason),
    /// A terrain query failed. The live ball must be removed.
    Failed(TerrainError),
}

/// Result of one physics step for one ball.
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    /// Ball the result belongs to.
    pub ball: BallId,
    /// Position and velocity after the step.
    pub motion: Motion,
    /// Bounce count after the step.
    pub bounce_count: u32,
    /// Collisions during the step.
    pub contacts: Contacts,
    /// What happened.
    pub outcome: TickOutcome,
}

impl TickResult {
    /// Returns true if the ball leaves the world.
    #[must_use]
    pub const fn removes_ball(&self) -> bool {
        matches!(
            self.outcome,
            TickOutcome::Rested { .. } | TickOutcome::Abandoned(_) | TickOutcome::Failed(_)
        )
    }
}

// =============================================================================
// PhysicsEngine
// =============================================================================

/// Stateless ball integrator.
#[derive(Debug, Clone, Default)]
pub struct PhysicsEngine {
    config: PhysicsConfig,
}

impl PhysicsEngine {
    /// Creates an engine with the given constants.
    #[must_use]
    pub const fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    /// Constants in use.
    #[must_use]
    pub const fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advances `ball` by one physics step.
    ///
    /// Never panics and never mutates anything; a terrain failure is
    /// reported as [`TickOutcome::Failed`] for this ball only.
    #[must_use]
    pub fn tick(&self, ball: &Ball, court: &CourtSnapshot, terrain: &dyn Terrain) -> TickResult {
        let mut step = Step {
            motion: ball.motion,
            bounce_count: ball.bounce_count,
            contacts: Contacts::empty(),
        };
        match self.advance(&mut step, court, terrain) {
            Ok(outcome) => TickResult {
                ball: ball.id(),
                motion: step.motion,
                bounce_count: step.bounce_count,
                contacts: step.contacts,
                outcome,
            },
            Err(err) => TickResult {
                ball: ball.id(),
                motion: ball.motion,
                bounce_count: ball.bounce_count,
                contacts: Contacts::empty(),
                outcome: TickOutcome::Failed(err),
            },
        }
    }

    fn advance(
        &self,
        step: &mut Step,
        court: &CourtSnapshot,
        terrain: &dyn Terrain,
    ) -> Result<TickOutcome, TerrainError> {
        let cfg = &self.config;

        let block = step.motion.block();
        if !court.bounds.expanded(cfg.out_of_bounds_margin).contains_block(block) {
            return Ok(TickOutcome::Abandoned(AbandonReason::OutOfBounds));
        }
        if step.motion.is_slower_than(cfg.stuck_threshold) && terrain.is_solid(block.below())? {
            return Ok(TickOutcome::Abandoned(AbandonReason::Stuck));
        }

        step.motion.velocity.y -= cfg.gravity;

        if step.motion.velocity.y < 0.0 {
            if let Some(ground_y) = self.probe_ground(&step.motion, court.bounds, terrain)? {
                step.contacts |= Contacts::GROUND;
                return self.resolve_bounce(step, ground_y, terrain);
            }
        }

        let boundary_hit = self.apply_boundaries(&mut step.motion, court);
        if boundary_hit {
            step.contacts |= Contacts::BOUNDARY;
        } else {
            if self.probe_block_ahead(&mut step.motion, terrain)? {
                step.contacts |= Contacts::BLOCK;
            }
            step.motion.velocity *= cfg.air_resistance;
        }

        if let Some(max) = cfg.max_speed {
            if step.motion.velocity.length() > max {
                step.motion.velocity = step.motion.velocity.normalize_or_zero() * max;
                step.contacts |= Contacts::CLAMPED;
            }
        }

        let block = step.motion.block();
        if step.motion.is_slower_than(cfg.rest_threshold) && terrain.is_solid(block.below())? {
            step.motion.velocity = DVec3::ZERO;
            let marker = marker_slot(block, terrain)?;
            let auto_pickup = self.catcher(step.motion.position, court);
            return Ok(TickOutcome::Rested { marker, auto_pickup });
        }

        let next = step.motion.position + step.motion.velocity;
        let clamped = court.bounds.clamp_point(next, cfg.out_of_bounds_margin);
        if clamped != next {
            step.contacts |= Contacts::CONTAINED;
        }
        step.motion.position = clamped;
        Ok(TickOutcome::Airborne)
    }

    /// Top solid block hit by a fall this step, scanning downward.
    fn probe_ground(
        &self,
        motion: &Motion,
        bounds: Bounds,
        terrain: &dyn Terrain,
    ) -> Result<Option<i32>, TerrainError> {
        let start = motion.block().below();
        let projected = BlockPos::containing(motion.position + motion.velocity).below();
        let floor = bounds.min().y - self.config.out_of_bounds_margin - 1;
        let end = projected.y.max(floor).min(start.y);

        for y in (end..=start.y).rev() {
            if terrain.is_solid(BlockPos::new(start.x, y, start.z))? {
                return Ok(Some(y));
            }
        }
        Ok(None)
    }

    fn resolve_bounce(
        &self,
        step: &mut Step,
        ground_y: i32,
        terrain: &dyn Terrain,
    ) -> Result<TickOutcome, TerrainError> {
        let cfg = &self.config;
        let impact = step.motion.velocity.y.abs();
        step.motion.position.y = f64::from(ground_y + 1);

        if step.bounce_count >= cfg.max_bounces {
            step.motion.velocity = DVec3::ZERO;
            let marker = marker_slot(step.motion.block(), terrain)?;
            return Ok(TickOutcome::Rested {
                marker,
                auto_pickup: None,
            });
        }

        let mut rebound = bounce_speed(cfg, impact, step.bounce_count);
        if rebound < cfg.min_bounce_speed && impact > cfg.min_bounce_impact {
            rebound = cfg.min_bounce_speed;
        }
        step.motion.velocity.y = rebound;
        step.motion.velocity.x *= cfg.ground_friction;
        step.motion.velocity.z *= cfg.ground_friction;
        step.bounce_count += 1;

        Ok(TickOutcome::Bounced {
            bounce: step.bounce_count,
            impact_speed: impact,
        })
    }

    /// Applies the region boundary rules. Returns true if any fired.
    fn apply_boundaries(&self, motion: &mut Motion, court: &CourtSnapshot) -> bool {
        let cfg = &self.config;
        let block = motion.block();
        let (min, max) = (court.bounds.min(), court.bounds.max());
        let v = &mut motion.velocity;
        let mut hit = false;

        let outside_xz = block.x < min.x || block.x > max.x || block.z < min.z || block.z > max.z;
        if outside_xz {
            let toward_center = court.center - motion.position;
            let home = DVec3::new(toward_center.x, 0.0, toward_center.z).normalize_or_zero();
            v.x = home.x * cfg.overshoot_factor;
            v.z = home.z * cfg.overshoot_factor;
            v.y = v.y.abs() + cfg.upward_kick;
            hit = true;
        } else {
            let near_min_x = block.x <= min.x + cfg.wall_margin;
            let near_max_x = block.x >= max.x - cfg.wall_margin;
            let near_min_z = block.z <= min.z + cfg.wall_margin;
            let near_max_z = block.z >= max.z - cfg.wall_margin;

            if near_min_x || near_max_x || near_min_z || near_max_z {
                hit = true;
                let target = nearest_player(motion.position, &court.players)
                    .and_then(|(id, _)| court.players.iter().find(|(p, _)| *p == id))
                    .map(|&(_, pos)| pos);

                if let Some(target) = target {
                    let toward = (target - motion.position).normalize_or_zero();
                    v.x = toward.x * cfg.player_redirect_factor;
                    v.z = toward.z * cfg.player_redirect_factor;
                    v.y = v.y.abs() + cfg.upward_kick;
                } else {
                    // Only reflect an axis that is still heading into its wall.
                    if (near_min_x && v.x < 0.0) || (near_max_x && v.x > 0.0) {
                        v.x = -v.x * cfg.rebound_factor;
                    }
                    if (near_min_z && v.z < 0.0) || (near_max_z && v.z > 0.0) {
                        v.z = -v.z * cfg.rebound_factor;
                    }
                }
            }
        }

        if (block.y <= min.y && v.y < 0.0) || (block.y >= max.y && v.y > 0.0) {
            v.y = -v.y * cfg.vertical_damping;
            hit = true;
        }

        hit
    }

    /// Reflects horizontal velocity off a solid block half a step ahead.
    fn probe_block_ahead(
        &self,
        motion: &mut Motion,
        terrain: &dyn Terrain,
    ) -> Result<bool, TerrainError> {
        let cfg = &self.config;
        let v = motion.velocity;
        let ahead = BlockPos::containing(motion.position + DVec3::new(v.x, 0.0, v.z) * 0.5);
        if !terrain.is_solid(ahead)? {
            return Ok(false);
        }
        if v.x.abs() > cfg.block_probe_min_speed {
            motion.velocity.x = -v.x * cfg.block_damping;
        }
        if v.z.abs() > cfg.block_probe_min_speed {
            motion.velocity.z = -v.z * cfg.block_damping;
        }
        Ok(true)
    }

    /// Nearest non-holding player within the auto-pickup radius.
    fn catcher(&self, position: DVec3, court: &CourtSnapshot) -> Option<PlayerId> {
        let free: Vec<_> = court
            .players
            .iter()
            .filter(|(p, _)| !court.holders.contains(p))
            .copied()
            .collect();
        nearest_player(position, &free)
            .filter(|&(_, distance)| distance <= self.config.auto_pickup_radius)
            .map(|(player, _)| player)
    }
}

/// Mutable state threaded through one step.
struct Step {
    motion: Motion,
    bounce_count: u32,
    contacts: Contacts,
}

/// Rebound speed before the minimum-bounce floor: restitution, then one
/// energy-loss factor per earlier bounce.
#[must_use]
pub fn bounce_speed(config: &PhysicsConfig, impact: f64, earlier_bounces: u32) -> f64 {
    let decay = (1.0 - config.energy_loss).powi(i32::try_from(earlier_bounces).unwrap_or(i32::MAX));
    impact * config.restitution * decay
}

/// Marker block for a ball resting in `block`: that block if free, else the
/// one above, else none.
pub(crate) fn marker_slot(
    block: BlockPos,
    terrain: &dyn Terrain,
) -> Result<Option<BlockPos>, TerrainError> {
    if !terrain.is_solid(block)? {
        return Ok(Some(block));
    }
    let above = block.above();
    if !terrain.is_solid(above)? {
        return Ok(Some(above));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::RegionName;
    use std::sync::Mutex;

    /// Solid at or below `floor`, plus listed blocks.
    struct Floor {
        floor: i32,
        extra: BTreeSet<BlockPos>,
    }

    impl Floor {
        fn flat(floor: i32) -> Self {
            Self {
                floor,
                extra: BTreeSet::new(),
            }
        }
    }

    impl Terrain for Floor {
        fn is_solid(&self, block: BlockPos) -> Result<bool, TerrainError> {
            Ok(block.y <= self.floor || self.extra.contains(&block))
        }

        fn place_marker(&self, _block: BlockPos) -> Result<(), TerrainError> {
            Ok(())
        }

        fn remove_marker(&self, _block: BlockPos) -> Result<bool, TerrainError> {
            Ok(false)
        }
    }

    struct Broken(Mutex<usize>);

    impl Terrain for Broken {
        fn is_solid(&self, block: BlockPos) -> Result<bool, TerrainError> {
            *self.0.lock().unwrap() += 1;
            Err(TerrainError::QueryFailed {
                at: block,
                reason: "chunk unloaded".into(),
            })
        }

        fn place_marker(&self, _block: BlockPos) -> Result<(), TerrainError> {
            Ok(())
        }

        fn remove_marker(&self, _block: BlockPos) -> Result<bool, TerrainError> {
            Ok(false)
        }
    }

    fn court() -> CourtSnapshot {
        CourtSnapshot::empty(Bounds::new(BlockPos::new(0, 0, 0), BlockPos::new(20, 10, 20)))
    }

    fn thrown_ball(position: DVec3, velocity: DVec3) -> Ball {
        let mut ball = Ball::new(BallId::new(0, 0), RegionName::new("court1"), position, 0);
        ball.launch(velocity, PlayerId::new(1));
        ball
    }

    fn engine() -> PhysicsEngine {
        PhysicsEngine::new(PhysicsConfig::default())
    }

    mod flight_tests {
        use super::*;

        #[test]
        fn gravity_and_air_resistance_then_commit() {
            let ball = thrown_ball(DVec3::new(10.5, 5.5, 10.5), DVec3::new(0.2, 0.5, 0.0));
            let result = engine().tick(&ball, &court(), &Floor::flat(0));

            assert_eq!(result.outcome, TickOutcome::Airborne);
            let expected_v = DVec3::new(0.2, 0.42, 0.0) * 0.995;
            assert!((result.motion.velocity - expected_v).length() < 1e-12);
            assert!((result.motion.position - (ball.position() + expected_v)).length() < 1e-12);
            assert!(result.contacts.is_empty());
        }

        #[test]
        fn block_ahead_reflects_with_damping() {
            let mut terrain = Floor::flat(0);
            terrain.extra.insert(BlockPos::new(11, 5, 10));
            let ball = thrown_ball(DVec3::new(10.5, 5.5, 10.5), DVec3::new(1.0, 0.5, 0.05));
            let result = engine().tick(&ball, &court(), &terrain);

            assert!(result.contacts.contains(Contacts::BLOCK));
            assert!((result.motion.velocity.x - (-0.75 * 0.995)).abs() < 1e-12);
            // Below the probe threshold, so not reflected.
            assert!((result.motion.velocity.z - 0.05 * 0.995).abs() < 1e-12);
        }

        #[test]
        fn speed_is_capped() {
            let mut config = PhysicsConfig::default();
            config.max_speed = Some(1.0);
            let ball = thrown_ball(DVec3::new(10.5, 5.5, 10.5), DVec3::new(3.0, 0.0, 0.0));
            let result = PhysicsEngine::new(config).tick(&ball, &court(), &Floor::flat(0));
            assert!(result.contacts.contains(Contacts::CLAMPED));
            assert!((result.motion.velocity.length() - 1.0).abs() < 1e-9);
        }
    }

    mod ground_tests {
        use super::*;

        #[test]
        fn first_bounce_uses_restitution() {
            let ball = thrown_ball(DVec3::new(10.5, 1.2, 10.5), DVec3::new(0.4, -0.32, 0.0));
            let result = engine().tick(&ball, &court(), &Floor::flat(0));

            match result.outcome {
                TickOutcome::Bounced { bounce, impact_speed } => {
                    assert_eq!(bounce, 1);
                    assert!((impact_speed - 0.4).abs() < 1e-12);
                }
                other => panic!("expected bounce, got {other:?}"),
            }
            assert!((result.motion.velocity.y - 0.3).abs() < 1e-12);
            assert!((result.motion.velocity.x - 0.34).abs() < 1e-12);
            assert!((result.motion.position.y - 1.0).abs() < f64::EPSILON);
            assert_eq!(result.bounce_count, 1);
        }

        #[test]
        fn later_bounces_decay_progressively() {
            let config = PhysicsConfig::default();
            let first = bounce_speed(&config, 1.0, 0);
            let second = bounce_speed(&config, 1.0, 1);
            let third = bounce_speed(&config, 1.0, 2);
            assert!((first - 0.75).abs() < 1e-12);
            assert!((second - 0.75 * 0.85).abs() < 1e-12);
            assert!(third < second);
        }

        #[test]
        fn hard_impact_keeps_minimum_bounce() {
            let mut ball = thrown_ball(DVec3::new(10.5, 1.5, 10.5), DVec3::new(0.0, -0.6, 0.0));
            ball.bounce_count = 1;
            let mut config = PhysicsConfig::default();
            config.max_bounces = 5;
            config.energy_loss = 0.9;
            let result = PhysicsEngine::new(config).tick(&ball, &court(), &Floor::flat(0));
            assert!((result.motion.velocity.y - 0.3).abs() < 1e-12);
        }

        #[test]
        fn spent_bounces_rest_on_the_ground() {
            let mut ball = thrown_ball(DVec3::new(10.5, 1.1, 10.5), DVec3::new(0.3, -0.5, 0.0));
            ball.bounce_count = 2;
            let result = engine().tick(&ball, &court(), &Floor::flat(0));

            assert_eq!(
                result.outcome,
                TickOutcome::Rested {
                    marker: Some(BlockPos::new(10, 1, 10)),
                    auto_pickup: None,
                }
            );
            assert_eq!(result.motion.velocity, DVec3::ZERO);
            assert!(result.removes_ball());
        }

        #[test]
        fn fast_fall_does_not_tunnel() {
            let ball = thrown_ball(DVec3::new(10.5, 4.5, 10.5), DVec3::new(0.0, -3.0, 0.0));
            let result = engine().tick(&ball, &court(), &Floor::flat(0));
            assert!(matches!(result.outcome, TickOutcome::Bounced { .. }));
            assert!((result.motion.position.y - 1.0).abs() < f64::EPSILON);
        }
    }

    mod boundary_tests {
        use super::*;

        #[test]
        fn overshoot_is_sent_back_toward_center() {
            let mut court = court();
            court.center = DVec3::new(10.0, 1.0, 10.5);
            let ball = thrown_ball(DVec3::new(21.5, 5.5, 10.5), DVec3::new(0.5, 0.0, 0.0));
            let result = engine().tick(&ball, &court, &Floor::flat(0));

            assert!(result.contacts.contains(Contacts::BOUNDARY));
            let v = result.motion.velocity;
            assert!(v.x < 0.0);
            assert!(v.z.abs() < 1e-12);
            assert!(v.y > 1.0);
        }

        #[test]
        fn near_wall_without_players_reflects_and_amplifies() {
            let mut config = PhysicsConfig::default();
            config.max_speed = None;
            let ball = thrown_ball(DVec3::new(1.5, 5.5, 10.5), DVec3::new(-0.4, 0.5, 0.0));
            let result = PhysicsEngine::new(config).tick(&ball, &court(), &Floor::flat(0));

            assert!((result.motion.velocity.x - 0.8).abs() < 1e-12);
            // No air resistance after a boundary hit.
            assert!((result.motion.velocity.y - 0.42).abs() < 1e-12);
        }

        #[test]
        fn near_wall_redirects_toward_nearest_player() {
            let mut court = court();
            court.players = vec![
                (PlayerId::new(1), DVec3::new(10.5, 5.5, 10.5)),
                (PlayerId::new(2), DVec3::new(19.0, 5.5, 19.0)),
            ];
            let mut config = PhysicsConfig::default();
            config.max_speed = None;
            let ball = thrown_ball(DVec3::new(1.5, 5.5, 10.5), DVec3::new(-0.4, 0.0, 0.0));
            let result = PhysicsEngine::new(config).tick(&ball, &court, &Floor::flat(0));

            let v = result.motion.velocity;
            assert!((v.x - 3.0).abs() < 1e-12);
            assert!(v.z.abs() < 1e-12);
            assert!((v.y - (0.08 + 1.5)).abs() < 1e-12);
        }

        #[test]
        fn rising_past_ceiling_reflects_vertically() {
            let ball = thrown_ball(DVec3::new(10.5, 10.5, 10.5), DVec3::new(0.0, 0.6, 0.2));
            let result = engine().tick(&ball, &court(), &Floor::flat(0));
            assert!(result.contacts.contains(Contacts::BOUNDARY));
            assert!((result.motion.velocity.y - (-0.52 * 0.75)).abs() < 1e-12);
        }

        #[test]
        fn committed_position_is_contained() {
            let mut config = PhysicsConfig::default();
            config.max_speed = None;
            let ball = thrown_ball(DVec3::new(10.5, 5.5, 10.5), DVec3::new(0.0, 0.0, 15.0));
            let result = PhysicsEngine::new(config).tick(&ball, &court(), &Floor::flat(0));

            assert!(result.contacts.contains(Contacts::CONTAINED));
            let grown = court().bounds.expanded(1);
            assert!(grown.contains_point(result.motion.position));
            assert!(!court().bounds.contains_point(result.motion.position));
        }
    }

    mod abandon_tests {
        use super::*;

        #[test]
        fn far_outside_is_abandoned() {
            let ball = thrown_ball(DVec3::new(23.0, 5.0, 10.0), DVec3::X);
            let result = engine().tick(&ball, &court(), &Floor::flat(0));
            assert_eq!(result.outcome, TickOutcome::Abandoned(AbandonReason::OutOfBounds));
            assert_eq!(result.motion, ball.motion);
        }

        #[test]
        fn one_block_outside_is_not_abandoned() {
            let ball = thrown_ball(DVec3::new(21.5, 5.5, 10.5), DVec3::ZERO);
            let result = engine().tick(&ball, &court(), &Floor::flat(0));
            assert!(!matches!(result.outcome, TickOutcome::Abandoned(_)));
        }

        #[test]
        fn motionless_on_ground_is_stuck() {
            let ball = thrown_ball(DVec3::new(10.5, 1.0, 10.5), DVec3::ZERO);
            let result = engine().tick(&ball, &court(), &Floor::flat(0));
            assert_eq!(result.outcome, TickOutcome::Abandoned(AbandonReason::Stuck));
        }

        #[test]
        fn terrain_failure_leaves_state_untouched() {
            let terrain = Broken(Mutex::new(0));
            let ball = thrown_ball(DVec3::new(10.5, 5.5, 10.5), DVec3::new(0.0, -0.5, 0.0));
            let result = engine().tick(&ball, &court(), &terrain);
            assert!(matches!(result.outcome, TickOutcome::Failed(_)));
            assert_eq!(result.motion, ball.motion);
            assert_eq!(*terrain.0.lock().unwrap(), 1);
        }
    }

    mod rest_tests {
        use super::*;

        #[test]
        fn slow_supported_ball_rests_and_is_caught() {
            let mut court = court();
            court.players = vec![(PlayerId::new(7), DVec3::new(12.0, 1.0, 10.5))];
            let ball = thrown_ball(DVec3::new(10.5, 1.3, 10.5), DVec3::new(0.02, 0.1, 0.0));
            let result = engine().tick(&ball, &court, &Floor::flat(0));

            assert_eq!(
                result.outcome,
                TickOutcome::Rested {
                    marker: Some(BlockPos::new(10, 1, 10)),
                    auto_pickup: Some(PlayerId::new(7)),
                }
            );
        }

        #[test]
        fn holders_do_not_catch() {
            let mut court = court();
            court.players = vec![(PlayerId::new(7), DVec3::new(12.0, 1.0, 10.5))];
            court.holders.insert(PlayerId::new(7));
            let ball = thrown_ball(DVec3::new(10.5, 1.3, 10.5), DVec3::new(0.02, 0.1, 0.0));
            let result = engine().tick(&ball, &court, &Floor::flat(0));
            assert!(matches!(result.outcome, TickOutcome::Rested { auto_pickup: None, .. }));
        }

        #[test]
        fn slow_ball_in_the_air_keeps_flying() {
            let ball = thrown_ball(DVec3::new(10.5, 6.5, 10.5), DVec3::new(0.0, 0.1, 0.0));
            let result = engine().tick(&ball, &court(), &Floor::flat(0));
            assert_eq!(result.outcome, TickOutcome::Airborne);
        }

        #[test]
        fn marker_moves_up_when_block_is_taken() {
            let mut terrain = Floor::flat(0);
            terrain.extra.insert(BlockPos::new(10, 1, 10));
            assert_eq!(
                marker_slot(BlockPos::new(10, 1, 10), &terrain).unwrap(),
                Some(BlockPos::new(10, 2, 10))
            );
            terrain.extra.insert(BlockPos::new(10, 2, 10));
            assert_eq!(marker_slot(BlockPos::new(10, 1, 10), &terrain).unwrap(), None);
        }
    }
}
