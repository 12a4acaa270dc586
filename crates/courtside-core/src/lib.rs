//! # Courtside Core
//!
//! Simulation core for a block-world basketball mini-game.
//!
//! This crate owns the game rules: ball flight and bounces, hoop
//! detection, per-court scoring and the hand-offs of a ball between the
//! world, a player's hand and a resting marker. Everything host-specific
//! (terrain, players, titles) sits behind the traits in [`world`].
//!
//! ## Architecture
//!
//! - **Regions**: named courts with a box, hoops, a spawn point and members
//!   ([`region`])
//! - **Balls**: generation-checked handles into a [`BallArena`] owned by the
//!   [`BallLifecycleManager`] ([`entity`], [`arena`], [`lifecycle`])
//! - **Physics**: a pure per-step integrator run in parallel ([`physics`])
//! - **Scoring**: hoop detection feeding a per-region [`GameSession`]
//!   ([`score`], [`session`])
//! - **Loop**: [`Simulation`] runs timers, physics, resolution, scoring and
//!   auto-drop once per host tick ([`simulation`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courtside_core::{GameConfig, Host, Simulation};
//!
//! let config = GameConfig::load("courtside.json")?;
//! let mut sim = Simulation::new(config, Host::new(terrain, players));
//! sim.load_regions(saved_regions);
//! loop {
//!     sim.step();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod bounds;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod physics;
pub mod region;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod simulation;
pub mod world;

#[cfg(test)]
mod tests;

pub use arena::BallArena;
pub use bounds::{BlockPos, Bounds};
pub use config::GameConfig;
pub use entity::{Ball, BallId, PlayerId, RegionName};
pub use error::{ConfigError, CourtError, TerrainError};
pub use event::{EventSink, GameEvent, RecordingSink};
pub use lifecycle::BallLifecycleManager;
pub use physics::PhysicsEngine;
pub use region::{Region, RegionDefinition, RegionDirectory};
pub use score::ScoreDetector;
pub use session::GameSession;
pub use simulation::Simulation;
pub use world::Host;
