//! Block coordinates and axis-aligned region boxes.
//!
//! Regions live on the host's block grid, so their boxes are integer and
//! inclusive on both ends. A point belongs to the block that contains it,
//! found by flooring every axis.
//!
//! # Example
//!
//! ```
//! use courtside_core::bounds::{BlockPos, Bounds};
//! use glam::DVec3;
//!
//! let court = Bounds::new(BlockPos::new(0, 0, 0), BlockPos::new(20, 10, 20));
//! assert!(court.contains_block(BlockPos::containing(DVec3::new(5.5, 1.0, 5.5))));
//! assert!(!court.contains_block(BlockPos::new(21, 1, 5)));
//! ```

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

// =============================================================================
// BlockPos
// =============================================================================

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate
    pub x: i32,
    /// Y coordinate (up)
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the block containing `point`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn containing(point: DVec3) -> Self {
        let p = point.floor();
        Self::new(p.x as i32, p.y as i32, p.z as i32)
    }

    /// Returns the block offset by the given amounts.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the block directly below.
    #[must_use]
    pub const fn below(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Returns the block directly above.
    #[must_use]
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Returns the minimum corner of the block as a point.
    #[must_use]
    pub fn corner(self) -> DVec3 {
        DVec3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// =============================================================================
// Bounds
// =============================================================================

/// Horizontal half-extent of the fallback box.
pub const FALLBACK_HALF_WIDTH: i32 = 20;
/// Depth of the fallback box below its center.
pub const FALLBACK_BELOW: i32 = 5;
/// Height of the fallback box above its center.
pub const FALLBACK_ABOVE: i32 = 10;

/// Inclusive integer bounding box of a region.
///
/// Always well-formed: [`Bounds::new`] swaps corners so that `min <= max` on
/// every axis, and deserialization goes through the same constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawBounds", into = "RawBounds")]
pub struct Bounds {
    min: BlockPos,
    max: BlockPos,
}

#[derive(Serialize, Deserialize)]
struct RawBounds {
    min: BlockPos,
    max: BlockPos,
}

impl From<RawBounds> for Bounds {
    fn from(raw: RawBounds) -> Self {
        Self::new(raw.min, raw.max)
    }
}

impl From<Bounds> for RawBounds {
    fn from(bounds: Bounds) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
        }
    }
}

impl Bounds {
    /// Creates bounds from two opposite corners in any order.
    #[must_use]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Box used when a region's real bounds are missing or cannot be fetched:
    /// ±20 blocks horizontally, 5 below and 10 above the center.
    #[must_use]
    pub fn fallback_around(center: DVec3) -> Self {
        let c = BlockPos::containing(center);
        Self::new(
            c.offset(-FALLBACK_HALF_WIDTH, -FALLBACK_BELOW, -FALLBACK_HALF_WIDTH),
            c.offset(FALLBACK_HALF_WIDTH, FALLBACK_ABOVE, FALLBACK_HALF_WIDTH),
        )
    }

    /// Minimum corner.
    #[must_use]
    pub const fn min(&self) -> BlockPos {
        self.min
    }

    /// Maximum corner.
    #[must_use]
    pub const fn max(&self) -> BlockPos {
        self.max
    }

    /// Geometric center, treating `max` as inclusive.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min.corner() + self.max.corner() + DVec3::ONE) * 0.5
    }

    /// Returns true if `block` lies inside the box.
    #[must_use]
    pub const fn contains_block(&self, block: BlockPos) -> bool {
        block.x >= self.min.x
            && block.x <= self.max.x
            && block.y >= self.min.y
            && block.y <= self.max.y
            && block.z >= self.min.z
            && block.z <= self.max.z
    }

    /// Returns true if the block containing `point` lies inside the box.
    #[must_use]
    pub fn contains_point(&self, point: DVec3) -> bool {
        self.contains_block(BlockPos::containing(point))
    }

    /// Returns the box grown by `margin` blocks on every side.
    #[must_use]
    pub const fn expanded(&self, margin: i32) -> Self {
        Self {
            min: self.min.offset(-margin, -margin, -margin),
            max: self.max.offset(margin, margin, margin),
        }
    }

    /// Clamps `point` so that its block stays within the box grown by `margin`.
    #[must_use]
    pub fn clamp_point(&self, point: DVec3, margin: i32) -> DVec3 {
        let grown = self.expanded(margin);
        let lo = grown.min.corner();
        // Largest point whose floor is still the max block.
        let hi = grown.max.corner() + DVec3::splat(1.0 - 1e-9);
        point.clamp(lo, hi)
    }
}
