//! Error types for the court simulation.
//!
//! Errors are split by where they originate:
//! - [`TerrainError`]: a host world query failed
//! - [`ConfigError`]: configuration could not be read or is out of range
//! - [`CourtError`]: a caller asked for something the simulation cannot do
//!
//! Invariant guards (a second ball in a region, a pickup while already
//! holding) are not errors. They come back as outcome enums such as
//! [`crate::lifecycle::SpawnOutcome`] and are only logged.

use thiserror::Error;

use crate::bounds::BlockPos;
use crate::entity::{BallId, PlayerId, RegionName};

/// A host world query failed.
///
/// Terrain errors are never retried. A ball whose tick hits one is removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerrainError {
    /// The world backing a region is not loaded.
    #[error("world `{0}` is not available")]
    WorldUnavailable(String),

    /// A single block query failed.
    #[error("block query at {at} failed: {reason}")]
    QueryFailed {
        /// Block that was queried
        at: BlockPos,
        /// Host-provided reason
        reason: String,
    },
}

/// Configuration could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`crate::config::GameConfig`].
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Errors surfaced to callers of [`crate::simulation::Simulation`].
#[derive(Debug, Error)]
pub enum CourtError {
    /// No region is registered under this name.
    #[error("unknown region `{0}`")]
    UnknownRegion(RegionName),

    /// The ball handle no longer refers to a live ball.
    #[error("ball {0} is no longer live")]
    StaleBall(BallId),

    /// The player is not a member of any region.
    #[error("player {0} is not in a region")]
    NotInRegion(PlayerId),

    /// The player does not hold a ball.
    #[error("player {0} is not holding a ball")]
    NotHolding(PlayerId),

    /// A world query failed.
    #[error(transparent)]
    Terrain(#[from] TerrainError),

    /// A configuration reload was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_error_display_names_block() {
        let err = TerrainError::QueryFailed {
            at: BlockPos::new(1, 2, 3),
            reason: "chunk unloaded".into(),
        };
        assert_eq!(err.to_string(), "block query at (1, 2, 3) failed: chunk unloaded");
    }

    #[test]
    fn court_error_wraps_terrain_error() {
        let err: CourtError = TerrainError::WorldUnavailable("world_nether".into()).into();
        assert!(matches!(err, CourtError::Terrain(_)));
        assert_eq!(err.to_string(), "world `world_nether` is not available");
    }

    #[test]
    fn config_error_from_json() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ConfigError = parse.into();
        assert!(err.to_string().starts_with("invalid config JSON"));
    }
}
