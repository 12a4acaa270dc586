//! Courtside scrimmage: headless bots playing on one court.
//!
//! Runs the simulation against a flat world with a single hoop. Bots walk to
//! the ball, pick it up, hold it for a while and shoot at the hoop with some
//! aim jitter. The final scoreboard is printed to stdout as JSON; logs go to
//! stderr.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::{bail, Context, Result};
use courtside_core::bounds::{BlockPos, Bounds};
use courtside_core::config::{GameConfig, TitleTiming};
use courtside_core::entity::{PlayerId, RegionName};
use courtside_core::error::TerrainError;
use courtside_core::event::{EventSink, GameEvent};
use courtside_core::lifecycle::PickupOutcome;
use courtside_core::region::RegionDefinition;
use courtside_core::world::{Host, Notifier, PlayerRegistry, Terrain};
use courtside_core::Simulation;
use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, Level};

const COURT: &str = "scrimmage";
const HOOP: DVec3 = DVec3::new(10.0, 3.0, 10.0);

// =============================================================================
// World stubs
// =============================================================================

/// Flat ground at y = 0 that remembers where markers sit.
#[derive(Default)]
struct FlatWorld {
    markers: Mutex<Vec<BlockPos>>,
}

impl Terrain for FlatWorld {
    fn is_solid(&self, block: BlockPos) -> Result<bool, TerrainError> {
        Ok(block.y <= 0)
    }

    fn place_marker(&self, block: BlockPos) -> Result<(), TerrainError> {
        self.markers.lock().unwrap_or_else(PoisonError::into_inner).push(block);
        Ok(())
    }

    fn remove_marker(&self, block: BlockPos) -> Result<bool, TerrainError> {
        let mut markers = self.markers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = markers.len();
        markers.retain(|m| *m != block);
        Ok(markers.len() != before)
    }
}

/// Bot positions, moved by the driver between ticks.
#[derive(Default)]
struct Bots {
    positions: RwLock<BTreeMap<PlayerId, DVec3>>,
}

impl Bots {
    fn place(&self, bot: PlayerId, position: DVec3) {
        self.positions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(bot, position);
    }
}

impl PlayerRegistry for Bots {
    fn position(&self, player: PlayerId) -> Option<DVec3> {
        self.positions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .copied()
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.position(player).is_some()
    }

    fn display_name(&self, player: PlayerId) -> String {
        format!("bot-{}", player.as_u64())
    }
}

/// Counts events by kind and logs the interesting ones.
#[derive(Default)]
struct Tally {
    counts: Mutex<BTreeMap<&'static str, u64>>,
}

impl EventSink for Tally {
    fn emit(&self, event: GameEvent) {
        let kind = match &event {
            GameEvent::BallSpawned { .. } => "spawned",
            GameEvent::BallRemoved { .. } => "removed",
            GameEvent::BallThrown { .. } => "thrown",
            GameEvent::BallPickedUp { .. } => "picked_up",
            GameEvent::BallDropped { .. } => "dropped",
            GameEvent::Score(score) => {
                info!(player = %score.player, tick = score.tick, "basket");
                "scores"
            }
            GameEvent::PointsAwarded { .. } => "points_awarded",
            GameEvent::Win(win) => {
                info!(
                    player = %win.player,
                    score = win.score,
                    total_wins = win.total_wins,
                    "game won"
                );
                "wins"
            }
            GameEvent::GameReset { .. } => "resets",
        };
        *self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default() += 1;
    }
}

/// Logs every title at debug level.
struct TitleLog;

impl Notifier for TitleLog {
    fn notify(&self, player: PlayerId, title: &str, subtitle: &str, _timing: TitleTiming) {
        debug!(%player, title, subtitle, "title");
    }
}

// =============================================================================
// Arguments
// =============================================================================

struct Args {
    config: Option<String>,
    ticks: u64,
    seed: u64,
    players: u64,
    verbose: bool,
}

fn find_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match find_arg(args, flag) {
        Some(raw) => raw.parse().with_context(|| format!("invalid value for {flag}: {raw}")),
        None => Ok(default),
    }
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: courtside [options]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --config <path>   Game config JSON (default: built-in defaults)");
        eprintln!("  --ticks <n>       Host ticks to simulate (default: 6000)");
        eprintln!("  --seed <n>        Bot RNG seed (default: 42)");
        eprintln!("  --players <n>     Number of bots (default: 4)");
        eprintln!("  --verbose         Debug logging");
        std::process::exit(0);
    }
    let parsed = Args {
        config: find_arg(&args, "--config"),
        ticks: parse_arg(&args, "--ticks", 6_000)?,
        seed: parse_arg(&args, "--seed", 42)?,
        players: parse_arg(&args, "--players", 4)?,
        verbose: args.iter().any(|a| a == "--verbose"),
    };
    if parsed.players == 0 {
        bail!("--players must be at least 1");
    }
    Ok(parsed)
}

// =============================================================================
// Scrimmage
// =============================================================================

#[derive(Serialize)]
struct Scoreboard {
    ticks: u64,
    seed: u64,
    scores: BTreeMap<String, u32>,
    wins: BTreeMap<String, u32>,
    events: BTreeMap<&'static str, u64>,
}

/// Per-bot shooting state.
struct Shooter {
    hold_ticks: u32,
}

fn court() -> RegionDefinition {
    let mut def = RegionDefinition::around(COURT, DVec3::new(10.0, 1.0, 10.0));
    def.bounds = Some(Bounds::new(BlockPos::new(0, 0, 0), BlockPos::new(20, 10, 20)));
    def.hoops = vec![HOOP];
    def.spawn = Some(DVec3::new(10.0, 1.0, 4.0));
    def
}

fn random_spot(rng: &mut ChaCha8Rng) -> DVec3 {
    DVec3::new(rng.gen_range(3.0..17.0), 1.0, rng.gen_range(3.0..17.0))
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => GameConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => GameConfig::default(),
    };

    let level = if config.debug.log_region_checks {
        Level::TRACE
    } else if args.verbose || config.debug.enabled {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let bots = Arc::new(Bots::default());
    let tally = Arc::new(Tally::default());
    let host = Host::new(Arc::new(FlatWorld::default()), bots.clone())
        .with_events(tally.clone())
        .with_notifier(Arc::new(TitleLog));
    let mut sim = Simulation::new(config, host);
    sim.add_region(court());

    let name = RegionName::new(COURT);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut shooters: BTreeMap<PlayerId, Shooter> = BTreeMap::new();
    for n in 1..=args.players {
        let bot = PlayerId::new(n);
        bots.place(bot, random_spot(&mut rng));
        sim.player_entered(bot, &name)?;
        shooters.insert(bot, Shooter { hold_ticks: 0 });
    }
    sim.spawn_ball(&name);
    info!(bots = args.players, ticks = args.ticks, seed = args.seed, "scrimmage started");

    for _ in 0..args.ticks {
        drive_bots(&mut sim, &bots, &mut shooters, &mut rng)?;
        sim.step();
    }

    let region = sim
        .region(&name)
        .context("scrimmage court disappeared")?;
    let players = sim.host().players();
    let board = Scoreboard {
        ticks: sim.tick(),
        seed: args.seed,
        scores: region
            .session()
            .scores()
            .iter()
            .map(|(p, s)| (players.display_name(*p), *s))
            .collect(),
        wins: region
            .session()
            .all_wins()
            .iter()
            .map(|(p, w)| (players.display_name(*p), *w))
            .collect(),
        events: tally.counts.lock().unwrap_or_else(PoisonError::into_inner).clone(),
    };
    println!("{}", serde_json::to_string_pretty(&board)?);
    Ok(())
}

/// One tick of bot decisions: fetch a loose ball, then shoot when ready.
fn drive_bots(
    sim: &mut Simulation,
    bots: &Bots,
    shooters: &mut BTreeMap<PlayerId, Shooter>,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    let name = RegionName::new(COURT);
    let Some(region) = sim.region(&name) else {
        return Ok(());
    };

    // A resting ball or marker draws a random bot, who walks there and takes it.
    let resting = sim
        .lifecycle()
        .live_in(region)
        .and_then(|id| sim.balls().get(id))
        .filter(|ball| !ball.thrown)
        .map(|ball| ball.position());
    let marker = region.markers().iter().next().copied();
    let anyone_holding = shooters.keys().any(|p| sim.lifecycle().is_holding(*p));

    if !anyone_holding {
        let fetcher = *shooters
            .keys()
            .nth(rng.gen_range(0..shooters.len()))
            .context("no bots")?;
        if let Some(position) = resting {
            bots.place(fetcher, position);
            if sim.pickup_nearby(fetcher) == PickupOutcome::PickedUp {
                debug!(bot = %fetcher, "fetched ball");
            }
        } else if let Some(block) = marker {
            bots.place(fetcher, block.corner() + DVec3::new(0.5, 0.0, 0.5));
            sim.pickup_marker(fetcher, block)?;
        }
    }

    for (&bot, shooter) in shooters.iter_mut() {
        if !sim.lifecycle().is_holding(bot) {
            shooter.hold_ticks = 0;
            continue;
        }
        shooter.hold_ticks += 1;
        if shooter.hold_ticks < rng.gen_range(5..40) {
            continue;
        }

        // Step back to a shooting spot and aim at the hoop.
        let spot = random_spot(rng);
        bots.place(bot, spot);
        let jitter = DVec3::new(
            rng.gen_range(-0.4..0.4),
            rng.gen_range(-0.2..0.6),
            rng.gen_range(-0.4..0.4),
        );
        let aim = (HOOP - spot).normalize_or_zero() + jitter;
        if let Some(ball) = sim.throw_held(bot, aim)? {
            debug!(%bot, %ball, ?aim, "shot");
        }
        shooter.hold_ticks = 0;
    }
    Ok(())
}
