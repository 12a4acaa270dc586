//! Host stubs and fixture builders shared by the test modules.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use glam::DVec3;

use crate::bounds::{BlockPos, Bounds};
use crate::config::{GameConfig, TitleTiming};
use crate::entity::{BallId, PlayerId, RegionName};
use crate::error::TerrainError;
use crate::event::{GameEvent, RecordingSink};
use crate::lifecycle::SpawnOutcome;
use crate::region::RegionDefinition;
use crate::simulation::Simulation;
use crate::world::{Host, Notifier, PlayerRegistry, Terrain};

// =============================================================================
// Terrain
// =============================================================================

/// Block grid with an optional flat floor, extra solid blocks and blocks
/// whose queries fail.
#[derive(Debug, Default)]
pub struct GridTerrain {
    floor: Option<i32>,
    solid: RwLock<BTreeSet<BlockPos>>,
    failing: RwLock<BTreeSet<BlockPos>>,
    markers: Mutex<BTreeSet<BlockPos>>,
}

impl GridTerrain {
    /// Everything at or below `floor_y` is solid.
    pub fn flat(floor_y: i32) -> Self {
        Self {
            floor: Some(floor_y),
            ..Self::default()
        }
    }

    /// Nothing is solid.
    pub fn open() -> Self {
        Self::default()
    }

    /// Makes one block solid.
    pub fn add_solid(&self, block: BlockPos) {
        self.solid.write().unwrap_or_else(PoisonError::into_inner).insert(block);
    }

    /// Makes queries of `block` fail.
    pub fn fail_at(&self, block: BlockPos) {
        self.failing.write().unwrap_or_else(PoisonError::into_inner).insert(block);
    }

    /// Returns true if a marker sits in `block`.
    pub fn has_marker(&self, block: BlockPos) -> bool {
        self.markers.lock().unwrap_or_else(PoisonError::into_inner).contains(&block)
    }

    /// Number of markers in the world.
    pub fn marker_count(&self) -> usize {
        self.markers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Terrain for GridTerrain {
    fn is_solid(&self, block: BlockPos) -> Result<bool, TerrainError> {
        if self.failing.read().unwrap_or_else(PoisonError::into_inner).contains(&block) {
            return Err(TerrainError::QueryFailed {
                at: block,
                reason: "chunk not loaded".to_owned(),
            });
        }
        let floor = self.floor.is_some_and(|y| block.y <= y);
        Ok(floor || self.solid.read().unwrap_or_else(PoisonError::into_inner).contains(&block))
    }

    fn place_marker(&self, block: BlockPos) -> Result<(), TerrainError> {
        self.markers.lock().unwrap_or_else(PoisonError::into_inner).insert(block);
        Ok(())
    }

    fn remove_marker(&self, block: BlockPos) -> Result<bool, TerrainError> {
        Ok(self.markers.lock().unwrap_or_else(PoisonError::into_inner).remove(&block))
    }
}

// =============================================================================
// Players
// =============================================================================

/// Player registry backed by a map of (position, online).
#[derive(Debug, Default)]
pub struct StubPlayers {
    players: RwLock<BTreeMap<PlayerId, (DVec3, bool)>>,
}

impl StubPlayers {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a player, registering them online if unknown.
    pub fn set_position(&self, player: PlayerId, position: DVec3) {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        players
            .entry(player)
            .and_modify(|(pos, _)| *pos = position)
            .or_insert((position, true));
    }

    /// Changes a player's online status, keeping their last position.
    pub fn set_online(&self, player: PlayerId, online: bool) {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, status)) = players.get_mut(&player) {
            *status = online;
        }
    }

    /// Forgets a player entirely.
    pub fn remove(&self, player: PlayerId) {
        self.players.write().unwrap_or_else(PoisonError::into_inner).remove(&player);
    }
}

impl PlayerRegistry for StubPlayers {
    fn position(&self, player: PlayerId) -> Option<DVec3> {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .map(|(pos, _)| *pos)
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .is_some_and(|(_, online)| *online)
    }

    fn display_name(&self, player: PlayerId) -> String {
        format!("P{}", player.as_u64())
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// One title shown to one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    /// Recipient.
    pub player: PlayerId,
    /// Title line.
    pub title: String,
    /// Subtitle line.
    pub subtitle: String,
}

/// Notifier that records every title.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    titles: Mutex<Vec<Title>>,
}

impl RecordingNotifier {
    /// All titles shown so far.
    pub fn titles(&self) -> Vec<Title> {
        self.titles.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Titles shown to `player` with the given title line.
    pub fn count(&self, player: PlayerId, title: &str) -> usize {
        self.titles()
            .iter()
            .filter(|t| t.player == player && t.title == title)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, player: PlayerId, title: &str, subtitle: &str, _timing: TitleTiming) {
        self.titles.lock().unwrap_or_else(PoisonError::into_inner).push(Title {
            player,
            title: title.to_owned(),
            subtitle: subtitle.to_owned(),
        });
    }
}

// =============================================================================
// Courts
// =============================================================================

/// "court1": box X[0,20] Y[0,10] Z[0,20], hoop at (10,3,10), spawn at (5,1,5).
pub fn court1_def() -> RegionDefinition {
    RegionDefinition {
        name: RegionName::new("court1"),
        center: DVec3::new(10.0, 1.0, 10.0),
        bounds: Some(Bounds::new(BlockPos::new(0, 0, 0), BlockPos::new(20, 10, 20))),
        hoops: vec![DVec3::new(10.0, 3.0, 10.0)],
        spawn: Some(DVec3::new(5.0, 1.0, 5.0)),
        wins: BTreeMap::new(),
    }
}

/// Simulation wired to recording stubs over a floor at y = 0.
pub struct Fixture {
    /// The simulation under test.
    pub sim: Simulation,
    /// World blocks.
    pub terrain: Arc<GridTerrain>,
    /// Player positions.
    pub players: Arc<StubPlayers>,
    /// Event log.
    pub events: Arc<RecordingSink>,
    /// Title log.
    pub notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    /// Fixture with no regions.
    pub fn new(config: GameConfig) -> Self {
        Self::with_host(config, |host| host)
    }

    /// Fixture with no regions whose host is adjusted by `customize`.
    pub fn with_host(config: GameConfig, customize: impl FnOnce(Host) -> Host) -> Self {
        let terrain = Arc::new(GridTerrain::flat(0));
        let players = Arc::new(StubPlayers::new());
        let events = Arc::new(RecordingSink::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let host = Host::new(terrain.clone(), players.clone())
            .with_events(events.clone())
            .with_notifier(notifier.clone());
        Self {
            sim: Simulation::new(config, customize(host)),
            terrain,
            players,
            events,
            notifier,
        }
    }

    /// Default config with "court1" loaded.
    pub fn court1() -> Self {
        let mut fixture = Self::new(GameConfig::default());
        fixture.sim.add_region(court1_def());
        fixture
    }

    /// Places `player` at `position` and walks them into "court1".
    pub fn join(&mut self, player: PlayerId, position: DVec3) {
        self.players.set_position(player, position);
        self.sim
            .player_entered(player, &RegionName::new("court1"))
            .expect("court1 entry");
    }

    /// Spawns the court1 ball and returns its handle.
    pub fn spawn(&mut self) -> BallId {
        match self.sim.spawn_ball(&RegionName::new("court1")) {
            SpawnOutcome::Spawned(id) => id,
            other => panic!("expected a spawn, got {other:?}"),
        }
    }

    /// Steps until `done` holds or `max` ticks pass. Returns the ticks run.
    pub fn run_until(&mut self, max: u64, mut done: impl FnMut(&Self) -> bool) -> Option<u64> {
        for ran in 0..max {
            if done(self) {
                return Some(ran);
            }
            self.sim.step();
        }
        done(self).then_some(max)
    }
}

/// Number of recorded events matching `pred`.
pub fn count_events(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
