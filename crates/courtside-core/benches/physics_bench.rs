use std::collections::BTreeMap;
use std::sync::Arc;

use courtside_core::bounds::{BlockPos, Bounds};
use courtside_core::config::{GameConfig, PhysicsConfig};
use courtside_core::entity::{Ball, BallId, PlayerId, RegionName};
use courtside_core::error::TerrainError;
use courtside_core::physics::{CourtSnapshot, PhysicsEngine};
use courtside_core::region::RegionDefinition;
use courtside_core::world::{Host, PlayerRegistry, Terrain};
use courtside_core::Simulation;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec3;

struct Floor;

impl Terrain for Floor {
    fn is_solid(&self, block: BlockPos) -> Result<bool, TerrainError> {
        Ok(block.y <= 0)
    }

    fn place_marker(&self, _block: BlockPos) -> Result<(), TerrainError> {
        Ok(())
    }

    fn remove_marker(&self, _block: BlockPos) -> Result<bool, TerrainError> {
        Ok(true)
    }
}

struct Standing(BTreeMap<PlayerId, DVec3>);

impl PlayerRegistry for Standing {
    fn position(&self, player: PlayerId) -> Option<DVec3> {
        self.0.get(&player).copied()
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.0.contains_key(&player)
    }
}

fn court_at(i: u32) -> DVec3 {
    DVec3::new(f64::from(i) * 100.0, 1.0, 0.0)
}

fn bench_single_ball_tick(c: &mut Criterion) {
    let engine = PhysicsEngine::new(PhysicsConfig::default());
    let mut court = CourtSnapshot::empty(Bounds::new(
        BlockPos::new(0, 0, 0),
        BlockPos::new(20, 10, 20),
    ));
    court.players = vec![(PlayerId::new(1), DVec3::new(5.0, 1.0, 5.0))];
    let mut ball = Ball::new(
        BallId::new(0, 0),
        RegionName::new("court1"),
        DVec3::new(10.0, 5.0, 10.0),
        0,
    );
    ball.launch(DVec3::new(0.8, 0.3, 0.6), PlayerId::new(1));

    c.bench_function("physics_tick", |b| {
        b.iter(|| black_box(engine.tick(black_box(&ball), &court, &Floor)))
    });
}

fn bench_simulation_step(c: &mut Criterion) {
    const COURTS: u32 = 32;

    let players: BTreeMap<PlayerId, DVec3> = (0..COURTS)
        .map(|i| (PlayerId::new(u64::from(i)), court_at(i) + DVec3::new(-3.0, 0.0, 2.0)))
        .collect();
    let host = Host::new(Arc::new(Floor), Arc::new(Standing(players)));
    let mut sim = Simulation::new(GameConfig::default(), host);

    let mut courts = Vec::new();
    for i in 0..COURTS {
        let name = RegionName::new(format!("court{i}"));
        sim.add_region(RegionDefinition::around(name.clone(), court_at(i)));
        let player = PlayerId::new(u64::from(i));
        let _ = sim.player_entered(player, &name);
        sim.spawn_ball(&name);
        courts.push((player, name));
    }

    c.bench_function("simulation_step_32_courts", |b| {
        b.iter(|| {
            for (player, name) in &courts {
                let live = sim.region(name).and_then(|r| sim.lifecycle().live_in(r));
                match live {
                    Some(id) if sim.balls().get(id).is_some_and(|ball| !ball.thrown) => {
                        let _ = sim.throw_ball(*player, id, DVec3::new(1.0, 1.0, 0.5));
                    }
                    Some(_) => {}
                    None => {
                        sim.spawn_ball(name);
                    }
                }
            }
            sim.step();
        })
    });
}

criterion_group!(benches, bench_single_ball_tick, bench_simulation_step);
criterion_main!(benches);
