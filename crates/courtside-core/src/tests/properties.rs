//! Property tests for the physics and lifecycle invariants.

use glam::DVec3;
use proptest::prelude::*;

use super::helpers::*;
use crate::bounds::{BlockPos, Bounds};
use crate::config::PhysicsConfig;
use crate::entity::{Ball, BallId, PlayerId, RegionName};
use crate::event::GameEvent;
use crate::lifecycle::PickupOutcome;
use crate::physics::{CourtSnapshot, PhysicsEngine, TickOutcome};
use crate::session::{GameSession, ScoreOutcome};

const ALICE: PlayerId = PlayerId::new(1);
const BOB: PlayerId = PlayerId::new(2);

fn thrown(position: DVec3, velocity: DVec3) -> Ball {
    let mut ball = Ball::new(BallId::new(0, 0), RegionName::new("court1"), position, 0);
    ball.launch(velocity, ALICE);
    ball
}

// =============================================================================
// Physics
// =============================================================================

proptest! {
    #[test]
    fn bounces_count_up_and_decay(
        height in 1.0f64..9.9,
        vy in -1.5f64..1.5,
        drift in -0.01f64..0.01,
        max_bounces in 1u32..8,
    ) {
        let config = PhysicsConfig { max_bounces, ..PhysicsConfig::default() };
        let gravity = config.gravity;
        let engine = PhysicsEngine::new(config);
        let court = CourtSnapshot::empty(Bounds::new(
            BlockPos::new(0, 0, 0),
            BlockPos::new(20, 40, 20),
        ));
        let terrain = GridTerrain::flat(0);
        let mut ball = thrown(DVec3::new(10.5, 1.0 + height, 10.5), DVec3::new(drift, vy, -drift));

        let mut last_rebound: Option<f64> = None;
        let mut finished = false;
        for _ in 0..5_000 {
            let result = engine.tick(&ball, &court, &terrain);
            if let TickOutcome::Bounced { bounce, .. } = result.outcome {
                prop_assert_eq!(bounce, ball.bounce_count + 1);
                prop_assert_eq!(result.bounce_count, bounce);
                prop_assert!(bounce <= max_bounces);

                let rebound = result.motion.velocity.y;
                // A rebound slower than one step of gravity never leaves the
                // ground, so the next contact is not a comparable bounce.
                if let Some(previous) = last_rebound.filter(|&v| v >= gravity) {
                    prop_assert!(
                        rebound <= previous + 1e-9,
                        "rebound grew: {previous} -> {rebound}"
                    );
                }
                last_rebound = Some(rebound);
            }
            if result.removes_ball() {
                prop_assert!(!matches!(result.outcome, TickOutcome::Failed(_)));
                prop_assert!(result.bounce_count <= max_bounces);
                finished = true;
                break;
            }
            ball.motion = result.motion;
            ball.bounce_count = result.bounce_count;
        }
        prop_assert!(finished, "ball never settled");
    }

    #[test]
    fn live_ball_stays_within_one_block_of_the_box(
        x in 0.5f64..9.5,
        y in 1.0f64..4.5,
        z in 0.5f64..9.5,
        vx in -3.0f64..3.0,
        vy in -3.0f64..3.0,
        vz in -3.0f64..3.0,
    ) {
        let bounds = Bounds::new(BlockPos::new(0, 0, 0), BlockPos::new(10, 5, 10));
        let allowed = bounds.expanded(1);
        let engine = PhysicsEngine::new(PhysicsConfig::default());
        let court = CourtSnapshot::empty(bounds);
        let terrain = GridTerrain::flat(0);
        let mut ball = thrown(DVec3::new(x, y, z), DVec3::new(vx, vy, vz));

        for _ in 0..300 {
            let result = engine.tick(&ball, &court, &terrain);
            if result.removes_ball() {
                break;
            }
            prop_assert!(
                allowed.contains_point(result.motion.position),
                "ball escaped to {:?}",
                result.motion.position
            );
            ball.motion = result.motion;
            ball.bounce_count = result.bounce_count;
        }
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Spawn,
    Throw(usize, u8),
    PickupNearby(usize),
    PickupMarker(usize),
    ThrowHeld(usize, u8),
    Drop(usize),
    Leave(usize),
    Join(usize),
    Step(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Spawn),
        (0..2usize, 0..8u8).prop_map(|(p, d)| Op::Throw(p, d)),
        (0..2usize).prop_map(Op::PickupNearby),
        (0..2usize).prop_map(Op::PickupMarker),
        (0..2usize, 0..8u8).prop_map(|(p, d)| Op::ThrowHeld(p, d)),
        (0..2usize).prop_map(Op::Drop),
        (0..2usize).prop_map(Op::Leave),
        (0..2usize).prop_map(Op::Join),
        (1..30u8).prop_map(Op::Step),
    ]
}

/// One of eight compass directions, tilted upward.
fn compass(d: u8) -> DVec3 {
    let angle = f64::from(d) * std::f64::consts::FRAC_PI_4;
    DVec3::new(angle.cos(), 1.0, angle.sin())
}

const HOMES: [(PlayerId, DVec3); 2] = [
    (ALICE, DVec3::new(5.0, 1.0, 5.0)),
    (BOB, DVec3::new(12.0, 1.0, 8.0)),
];

fn apply(fx: &mut Fixture, op: &Op) {
    let court = RegionName::new("court1");
    match *op {
        Op::Spawn => {
            fx.sim.spawn_ball(&court);
        }
        Op::Throw(p, d) => {
            let live = fx.sim.region(&court).and_then(|r| fx.sim.lifecycle().live_in(r));
            if let Some(id) = live {
                let _ = fx.sim.throw_ball(HOMES[p].0, id, compass(d));
            }
        }
        Op::PickupNearby(p) => {
            fx.sim.pickup_nearby(HOMES[p].0);
        }
        Op::PickupMarker(p) => {
            let marker = fx
                .sim
                .region(&court)
                .and_then(|r| r.markers().iter().next().copied());
            if let Some(block) = marker {
                let _ = fx.sim.pickup_marker(HOMES[p].0, block);
            }
        }
        Op::ThrowHeld(p, d) => {
            let _ = fx.sim.throw_held(HOMES[p].0, compass(d));
        }
        Op::Drop(p) => {
            let _ = fx.sim.drop_at(HOMES[p].0, HOMES[p].1);
        }
        Op::Leave(p) => {
            fx.sim.player_left(HOMES[p].0);
        }
        Op::Join(p) => fx.join(HOMES[p].0, HOMES[p].1),
        Op::Step(n) => fx.sim.run(u64::from(n)),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn at_most_one_live_ball_per_region(ops in prop::collection::vec(op(), 1..40)) {
        let mut fx = Fixture::court1();
        for (player, home) in HOMES {
            fx.join(player, home);
        }
        let court = RegionName::new("court1");

        for op in &ops {
            apply(&mut fx, op);

            let in_world = fx.sim.balls().in_region(&court).count();
            prop_assert!(in_world <= 1, "{in_world} live balls after {op:?}");
            let region = fx.sim.region(&court).unwrap();
            if let Some(id) = region.live_ball() {
                prop_assert!(fx.sim.balls().contains(id), "dangling live ball after {op:?}");
            }
            prop_assert_eq!(fx.sim.lifecycle().live_in(region).is_some(), in_world == 1);

            // Live, animating and held together.
            let in_play = fx.sim.lifecycle().balls_in(region);
            prop_assert!(in_play <= 1, "{in_play} balls in play after {op:?}");
            let holders = fx.sim.lifecycle().holders_in(&court).len();
            prop_assert!(holders <= 1, "{holders} holders after {op:?}");
        }
    }

    #[test]
    fn repeated_pickup_takes_one_ball(attempts in 1usize..6) {
        let mut fx = Fixture::court1();
        fx.join(ALICE, DVec3::new(5.5, 1.0, 5.5));
        let id = fx.spawn();

        let outcomes: Vec<PickupOutcome> =
            (0..attempts).map(|_| fx.sim.pickup(ALICE, id)).collect();
        prop_assert_eq!(outcomes[0], PickupOutcome::PickedUp);
        prop_assert!(outcomes[1..].iter().all(|o| *o == PickupOutcome::AlreadyHolding));
        prop_assert!(fx.sim.lifecycle().is_holding(ALICE));
        prop_assert!(fx.sim.balls().is_empty());
        let pickups = count_events(&fx.events.events(), |e| {
            matches!(e, GameEvent::BallPickedUp { .. })
        });
        prop_assert_eq!(pickups, 1);
    }

    #[test]
    fn session_is_won_exactly_once(
        threshold in 1u32..15,
        awards in prop::collection::vec((0u64..3, 1u32..4), 1..60),
    ) {
        let mut session = GameSession::new(threshold);
        let mut won = 0;
        for (player, points) in awards {
            let outcome = session.add_points(PlayerId::new(player), points);
            match outcome {
                ScoreOutcome::Won { score, total_wins } => {
                    prop_assert_eq!(won, 0);
                    prop_assert!(score >= threshold);
                    prop_assert_eq!(total_wins, 1);
                    won += 1;
                }
                ScoreOutcome::Locked => prop_assert_eq!(won, 1),
                ScoreOutcome::Scored { score } => {
                    prop_assert_eq!(won, 0);
                    prop_assert!(score < threshold);
                }
            }
        }
        prop_assert_eq!(session.is_won(), won == 1);
    }
}

#[test]
fn ninth_to_tenth_basket_wins_once() {
    let mut session = GameSession::new(10);
    for _ in 0..9 {
        assert!(matches!(session.add_score(ALICE), ScoreOutcome::Scored { .. }));
    }
    assert_eq!(
        session.add_score(ALICE),
        ScoreOutcome::Won { score: 10, total_wins: 1 }
    );
    assert_eq!(session.add_score(ALICE), ScoreOutcome::Locked);
    assert_eq!(session.add_score(BOB), ScoreOutcome::Locked);
    assert_eq!(session.score(ALICE), 10);
}
