//! Component data shared by balls and the physics engine.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::bounds::BlockPos;

/// Kinematic state: where a ball is and how fast it moves per physics step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Motion {
    /// World position in block units.
    pub position: DVec3,
    /// Displacement per physics step.
    pub velocity: DVec3,
}

impl Motion {
    /// Motion at rest at `position`.
    #[must_use]
    pub const fn at(position: DVec3) -> Self {
        Self {
            position,
            velocity: DVec3::ZERO,
        }
    }

    /// Block containing the position.
    #[must_use]
    pub fn block(&self) -> BlockPos {
        BlockPos::containing(self.position)
    }

    /// Returns true if every velocity component is below `threshold` in magnitude.
    #[must_use]
    pub fn is_slower_than(&self, threshold: f64) -> bool {
        self.velocity.abs().max_element() < threshold
    }
}
