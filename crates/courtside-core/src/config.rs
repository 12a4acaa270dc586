//! Tunable constants for the court simulation.
//!
//! [`GameConfig`] is supplied once at startup (or on a full reload) and is
//! passed explicitly to every component that needs it. Every section has
//! serde defaults, so a config file only needs the keys it overrides:
//!
//! ```
//! use courtside_core::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "physics": { "max_bounces": 4 } }"#).unwrap();
//! assert_eq!(config.physics.max_bounces, 4);
//! assert!((config.physics.gravity - 0.08).abs() < f64::EPSILON);
//! assert_eq!(config.scoring.win_threshold, 10);
//! ```
//!
//! All durations are in host ticks (20 per second).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// =============================================================================
// Sections
// =============================================================================

/// Ball flight, bounce and collision constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration per physics step.
    pub gravity: f64,
    /// Ground contacts allowed before the ball comes to rest.
    pub max_bounces: u32,
    /// Fraction of impact speed returned on the first bounce.
    pub restitution: f64,
    /// Extra fraction lost per earlier bounce.
    pub energy_loss: f64,
    /// Floor for the rebound speed of a hard impact.
    pub min_bounce_speed: f64,
    /// Impact speed above which `min_bounce_speed` applies.
    pub min_bounce_impact: f64,
    /// Horizontal velocity kept on a bounce.
    pub ground_friction: f64,
    /// Velocity kept per step while airborne.
    pub air_resistance: f64,
    /// Speed below which a thrown ball comes to rest.
    pub rest_threshold: f64,
    /// Speed below which a ball on solid ground counts as stuck.
    pub stuck_threshold: f64,
    /// Blocks outside the region box before a ball is abandoned.
    pub out_of_bounds_margin: i32,
    /// Distance in blocks from an X/Z boundary that triggers a hard rebound.
    pub wall_margin: i32,
    /// Speed toward the center for a ball outside the box.
    pub overshoot_factor: f64,
    /// Speed toward the nearest player on a hard rebound.
    pub player_redirect_factor: f64,
    /// Amplification of a reflected axis when no player is present.
    pub rebound_factor: f64,
    /// Upward speed added by a hard rebound.
    pub upward_kick: f64,
    /// Damping of vertical velocity reflected off the Y bounds.
    pub vertical_damping: f64,
    /// Damping of horizontal velocity reflected off a solid block.
    pub block_damping: f64,
    /// Horizontal speed below which a block hit does not reflect that axis.
    pub block_probe_min_speed: f64,
    /// Radius of the auto-pickup scan when a ball comes to rest.
    pub auto_pickup_radius: f64,
    /// Speed cap applied after collisions. `None` leaves rebounds unbounded.
    pub max_speed: Option<f64>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.08,
            max_bounces: 2,
            restitution: 0.75,
            energy_loss: 0.15,
            min_bounce_speed: 0.3,
            min_bounce_impact: 0.5,
            ground_friction: 0.85,
            air_resistance: 0.995,
            rest_threshold: 0.05,
            stuck_threshold: 0.01,
            out_of_bounds_margin: 1,
            wall_margin: 2,
            overshoot_factor: 2.0,
            player_redirect_factor: 3.0,
            rebound_factor: 2.0,
            upward_kick: 1.5,
            vertical_damping: 0.75,
            block_damping: 0.75,
            block_probe_min_speed: 0.1,
            auto_pickup_radius: 3.0,
            max_speed: Some(3.5),
        }
    }
}

/// Launch parameters of a throw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowConfig {
    /// Launch speed along the facing direction.
    pub velocity: f64,
    /// Extra upward speed added to the launch.
    pub arc: f64,
    /// Height above the player's feet where a held ball is released.
    pub release_height: f64,
}

impl Default for ThrowConfig {
    fn default() -> Self {
        Self {
            velocity: 1.2,
            arc: 0.3,
            release_height: 1.5,
        }
    }
}

/// Proximity pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// Nominal pickup range.
    pub range: f64,
    /// Multiplier applied to `range` for proximity pickup.
    pub range_multiplier: f64,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            range: 2.0,
            range_multiplier: 2.0,
        }
    }
}

impl PickupConfig {
    /// Range actually used for proximity pickup.
    #[must_use]
    pub fn effective_range(&self) -> f64 {
        self.range * self.range_multiplier
    }
}

/// Hoop detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoopConfig {
    /// Maximum distance from the hoop point for a basket.
    pub detection_radius: f64,
    /// Maximum vertical distance from the hoop point for a basket.
    pub score_height: f64,
}

impl Default for HoopConfig {
    fn default() -> Self {
        Self {
            detection_radius: 1.5,
            score_height: 2.0,
        }
    }
}

/// Session scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score that wins a game.
    pub win_threshold: u32,
    /// Default point value of the alternate scoring path.
    pub points_per_basket: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            win_threshold: 10,
            points_per_basket: 2,
        }
    }
}

/// Scheduling and timeouts, in host ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Host ticks between physics steps.
    pub physics_interval: u64,
    /// Physics steps between score checks.
    pub score_check_every: u64,
    /// Delay between a basket and the replacement ball.
    pub respawn_delay: u64,
    /// Delay between a win and the game reset.
    pub reset_delay: u64,
    /// Length of the spawn animation. Zero spawns immediately.
    pub spawn_animation: u64,
    /// Ticks a holder may stand still before the ball is dropped.
    pub auto_drop_still: u32,
    /// Ticks a holder may keep moving before the ball is dropped.
    pub auto_drop_moving: u32,
    /// Movement per tick below which a holder counts as standing still.
    pub still_epsilon: f64,
    /// How long fetched region bounds stay valid.
    pub bounds_cache: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            physics_interval: 2,
            score_check_every: 2,
            respawn_delay: 20,
            reset_delay: 100,
            spawn_animation: 0,
            auto_drop_still: 60,
            auto_drop_moving: 100,
            still_epsilon: 0.1,
            bounds_cache: 100,
        }
    }
}

/// Title display timing, in host ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleTiming {
    /// Fade-in duration.
    pub fade_in: u32,
    /// Time fully shown.
    pub stay: u32,
    /// Fade-out duration.
    pub fade_out: u32,
}

impl Default for TitleTiming {
    fn default() -> Self {
        Self {
            fade_in: 10,
            stay: 60,
            fade_out: 20,
        }
    }
}

/// Ball lifecycle switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Spawn a ball when the first player enters an empty region.
    pub spawn_on_first_entry: bool,
}

/// Diagnostic switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Verbose lifecycle logging.
    pub enabled: bool,
    /// Log every region membership check.
    pub log_region_checks: bool,
}

// =============================================================================
// GameConfig
// =============================================================================

/// Complete configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Ball physics.
    pub physics: PhysicsConfig,
    /// Throw launch.
    pub throw: ThrowConfig,
    /// Proximity pickup.
    pub pickup: PickupConfig,
    /// Hoop detection.
    pub hoop: HoopConfig,
    /// Session scoring.
    pub scoring: ScoringConfig,
    /// Scheduling.
    pub timing: TimingConfig,
    /// Title timing.
    pub titles: TitleTiming,
    /// Lifecycle switches.
    pub lifecycle: LifecycleConfig,
    /// Diagnostics.
    pub debug: DebugConfig,
}

impl GameConfig {
    /// Parses and validates a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`GameConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the config as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        non_negative("physics.gravity", p.gravity)?;
        unit_interval("physics.restitution", p.restitution)?;
        unit_interval("physics.ground_friction", p.ground_friction)?;
        unit_interval("physics.air_resistance", p.air_resistance)?;
        unit_interval("physics.vertical_damping", p.vertical_damping)?;
        unit_interval("physics.block_damping", p.block_damping)?;
        if !(0.0..1.0).contains(&p.energy_loss) {
            return Err(invalid("physics.energy_loss", "must be in [0, 1)"));
        }
        positive("physics.rest_threshold", p.rest_threshold)?;
        non_negative("physics.stuck_threshold", p.stuck_threshold)?;
        non_negative("physics.auto_pickup_radius", p.auto_pickup_radius)?;
        if p.out_of_bounds_margin < 0 || p.wall_margin < 0 {
            return Err(invalid("physics.out_of_bounds_margin", "margins must not be negative"));
        }
        if let Some(max) = p.max_speed {
            positive("physics.max_speed", max)?;
        }

        positive("hoop.detection_radius", self.hoop.detection_radius)?;
        non_negative("hoop.score_height", self.hoop.score_height)?;
        non_negative("pickup.range", self.pickup.effective_range())?;

        if self.scoring.win_threshold == 0 {
            return Err(invalid("scoring.win_threshold", "must be at least 1"));
        }

        let t = &self.timing;
        if t.physics_interval == 0 {
            return Err(invalid("timing.physics_interval", "must be at least 1"));
        }
        if t.score_check_every == 0 {
            return Err(invalid("timing.score_check_every", "must be at least 1"));
        }
        if t.auto_drop_still == 0 || t.auto_drop_moving == 0 {
            return Err(invalid(
                "timing.auto_drop_still",
                "auto-drop thresholds must be at least 1",
            ));
        }
        non_negative("timing.still_epsilon", t.still_epsilon)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive number"))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must not be negative"))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be in (0, 1]"))
    }
}
