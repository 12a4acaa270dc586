//! Host collaborators.
//!
//! The simulation never touches the game world directly. Everything it needs
//! from the host goes through these traits:
//!
//! - [`Terrain`]: solid-block queries and resting-marker placement
//! - [`PlayerRegistry`]: player positions and online status
//! - [`Notifier`]: title/subtitle display
//! - [`BoundsSource`]: live region bounds (optional, cached by the directory)
//! - [`EventSink`]: event publication (see [`crate::event`])
//!
//! They are bundled in a [`Host`] that is handed to
//! [`crate::simulation::Simulation::new`]. All traits are `Send + Sync` so
//! the physics phase can query terrain from worker threads.

use std::fmt;
use std::sync::Arc;

use glam::DVec3;

use crate::bounds::{BlockPos, Bounds};
use crate::config::TitleTiming;
use crate::entity::{PlayerId, RegionName};
use crate::error::TerrainError;
use crate::event::{DiscardSink, EventSink};

/// Block queries and marker placement.
pub trait Terrain: Send + Sync {
    /// Returns true if the block stops a ball.
    ///
    /// # Errors
    ///
    /// Returns a [`TerrainError`] if the world cannot answer.
    fn is_solid(&self, block: BlockPos) -> Result<bool, TerrainError>;

    /// Places a resting-ball marker in `block`.
    ///
    /// # Errors
    ///
    /// Returns a [`TerrainError`] if the block cannot be changed.
    fn place_marker(&self, block: BlockPos) -> Result<(), TerrainError>;

    /// Removes the marker in `block`, returning whether one was there.
    ///
    /// # Errors
    ///
    /// Returns a [`TerrainError`] if the block cannot be changed.
    fn remove_marker(&self, block: BlockPos) -> Result<bool, TerrainError>;
}

/// Read access to host players.
pub trait PlayerRegistry: Send + Sync {
    /// Current position of the player's feet, `None` if unknown.
    fn position(&self, player: PlayerId) -> Option<DVec3>;

    /// Returns true if the player is connected.
    fn is_online(&self, player: PlayerId) -> bool;

    /// Name used in titles.
    fn display_name(&self, player: PlayerId) -> String {
        player.to_string()
    }
}

/// Title display for a single player.
pub trait Notifier: Send + Sync {
    /// Shows a title and subtitle.
    fn notify(&self, player: PlayerId, title: &str, subtitle: &str, timing: TitleTiming);
}

/// Notifier that shows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _player: PlayerId, _title: &str, _subtitle: &str, _timing: TitleTiming) {}
}

/// Live source of region bounds (for example a region-protection plugin).
pub trait BoundsSource: Send + Sync {
    /// Current bounds of a region, `Ok(None)` if the host does not know it.
    ///
    /// # Errors
    ///
    /// Returns a [`TerrainError`] if the lookup fails.
    fn region_bounds(&self, region: &RegionName) -> Result<Option<Bounds>, TerrainError>;
}

/// Bundle of host collaborators.
#[derive(Clone)]
pub struct Host {
    terrain: Arc<dyn Terrain>,
    players: Arc<dyn PlayerRegistry>,
    notifier: Arc<dyn Notifier>,
    events: Arc<dyn EventSink>,
    bounds: Option<Arc<dyn BoundsSource>>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("bounds_source", &self.bounds.is_some())
            .finish_non_exhaustive()
    }
}

impl Host {
    /// Creates a host with silent notifications and discarded events.
    #[must_use]
    pub fn new(terrain: Arc<dyn Terrain>, players: Arc<dyn PlayerRegistry>) -> Self {
        Self {
            terrain,
            players,
            notifier: Arc::new(SilentNotifier),
            events: Arc::new(DiscardSink),
            bounds: None,
        }
    }

    /// Replaces the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Attaches a live bounds source.
    #[must_use]
    pub fn with_bounds_source(mut self, source: Arc<dyn BoundsSource>) -> Self {
        self.bounds = Some(source);
        self
    }

    /// Terrain queries.
    #[must_use]
    pub fn terrain(&self) -> &dyn Terrain {
        self.terrain.as_ref()
    }

    /// Player queries.
    #[must_use]
    pub fn players(&self) -> &dyn PlayerRegistry {
        self.players.as_ref()
    }

    /// Title display.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Event publication.
    #[must_use]
    pub fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }

    /// Live bounds source, if attached.
    #[must_use]
    pub fn bounds_source(&self) -> Option<&dyn BoundsSource> {
        self.bounds.as_deref()
    }

    /// Online players from `members` with a known position, in the given order.
    pub fn locate(&self, members: impl IntoIterator<Item = PlayerId>) -> Vec<(PlayerId, DVec3)> {
        members
            .into_iter()
            .filter(|&player| self.players.is_online(player))
            .filter_map(|player| self.players.position(player).map(|pos| (player, pos)))
            .collect()
    }
}

/// Nearest entry of `candidates` to `point`. Ties keep the earlier entry.
#[must_use]
pub fn nearest_player(point: DVec3, candidates: &[(PlayerId, DVec3)]) -> Option<(PlayerId, f64)> {
    candidates.iter().fold(None, |best, &(player, pos)| {
        let distance = pos.distance(point);
        match best {
            Some((_, d)) if d <= distance => best,
            _ => Some((player, distance)),
        }
    })
}
