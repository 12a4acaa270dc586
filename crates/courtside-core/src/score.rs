//! Hoop proximity scoring.
//!
//! A ball scores when it is within `detection_radius` of its region's
//! nearer hoop and within `score_height` of it vertically. The basket is
//! credited to the present player nearest the ball, not to the thrower.
//!
//! Score checks run less often than physics steps, so each step's path is
//! swept with [`ScoreDetector::swept_pass`] and a crossing is kept on the
//! ball until the next check.

use glam::DVec3;

use crate::config::HoopConfig;
use crate::entity::{Ball, PlayerId, RegionName};
use crate::event::ScoreEvent;
use crate::world::nearest_player;

/// Basket detector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDetector {
    detection_radius: f64,
    score_height: f64,
}

impl Default for ScoreDetector {
    fn default() -> Self {
        Self::new(&HoopConfig::default())
    }
}

impl ScoreDetector {
    /// Creates a detector from hoop settings.
    #[must_use]
    pub fn new(config: &HoopConfig) -> Self {
        Self {
            detection_radius: config.detection_radius,
            score_height: config.score_height,
        }
    }

    /// Returns true if `position` is inside the scoring zone of `hoop`.
    #[must_use]
    pub fn in_zone(&self, position: DVec3, hoop: DVec3) -> bool {
        position.distance(hoop) <= self.detection_radius
            && (position.y - hoop.y).abs() <= self.score_height
    }

    /// Point of the path `from..to` nearest the nearer of `hoops`, if that
    /// point is inside the hoop's scoring zone.
    #[must_use]
    pub fn swept_pass(&self, from: DVec3, to: DVec3, hoops: &[DVec3]) -> Option<DVec3> {
        let (point, hoop) = hoops
            .iter()
            .map(|&hoop| (closest_on_segment(from, to, hoop), hoop))
            .min_by(|a, b| {
                a.0.distance_squared(a.1)
                    .total_cmp(&b.0.distance_squared(b.1))
            })?;
        self.in_zone(point, hoop).then_some(point)
    }

    /// Checks `ball` against the nearer of `hoops`.
    ///
    /// A recorded [`Ball::hoop_pass`] is checked in place of the current
    /// position. `players` are the present players of the ball's region.
    /// Returns `None` if the ball is not in a scoring zone or nobody is
    /// present to credit.
    #[must_use]
    pub fn check_score(
        &self,
        ball: &Ball,
        region: &RegionName,
        hoops: &[DVec3],
        players: &[(PlayerId, DVec3)],
        tick: u64,
    ) -> Option<ScoreEvent> {
        let position = ball.hoop_pass.unwrap_or_else(|| ball.position());
        let hoop = nearest_hoop(hoops, position)?;

        if !self.in_zone(position, hoop) {
            return None;
        }

        let (player, _) = nearest_player(position, players)?;
        Some(ScoreEvent {
            player,
            region: region.clone(),
            hoop,
            ball: ball.id(),
            tick,
        })
    }
}

/// Hoop in `hoops` closest to `point`. Ties keep the earlier hoop.
#[must_use]
pub fn nearest_hoop(hoops: &[DVec3], point: DVec3) -> Option<DVec3> {
    hoops.iter().copied().fold(None, |best, hoop| match best {
        Some(b) if b.distance_squared(point) <= hoop.distance_squared(point) => best,
        _ => Some(hoop),
    })
}

fn closest_on_segment(from: DVec3, to: DVec3, point: DVec3) -> DVec3 {
    let path = to - from;
    let length_sq = path.length_squared();
    if length_sq <= f64::EPSILON {
        return from;
    }
    let t = ((point - from).dot(path) / length_sq).clamp(0.0, 1.0);
    from + path * t
}
