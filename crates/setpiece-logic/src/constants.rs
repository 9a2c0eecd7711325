//! Placement constants — working zone, facing yaws, tuning profiles.
//!
//! Plain `f32` constants with no engine dependency. Both the resolver
//! library and the native simtest use these.

use std::f32::consts::{FRAC_PI_2, PI};

/// Half extent of the working zone along x. Scenes are composed inside
/// this fixed sub-rectangle of the world, not against the world boundary.
pub const ZONE_HALF_WIDTH: f32 = 60.0;
/// Half extent of the working zone along z.
pub const ZONE_HALF_DEPTH: f32 = 60.0;

/// Distance from the zone center to a named position ("north", "east", ...).
pub const NAMED_OFFSET: f32 = 35.0;

/// Fixed yaw constants. `rotation = 0` faces south; the forward vector of
/// a yaw θ is `(sin θ, cos θ)`, so south is +z and north is -z.
pub mod facing {
    use super::{FRAC_PI_2, PI};

    pub const SOUTH: f32 = 0.0;
    pub const NORTH: f32 = PI;
    pub const EAST: f32 = FRAC_PI_2;
    pub const WEST: f32 = -FRAC_PI_2;
    /// The camera sits south of the zone.
    pub const TOWARD_CAMERA: f32 = SOUTH;
}

/// Visual scale → real-world size conversion. Used for collision radii
/// when no measured size is available; never the raw scale itself.
pub const SCALE_TO_SIZE: f32 = 2.5;

/// Margin kept between edge bands and the zone corners.
pub const EDGE_MARGIN: f32 = 5.0;

/// Default minimum spacing for cluster placement.
pub const CLUSTER_MIN_SPACING: f32 = 5.0;

/// Candidate attempts per frontier point in Poisson-disk sampling.
pub const POISSON_MAX_ATTEMPTS: u32 = 30;

/// Wall-attached decorations sit this fraction of the structure depth
/// outside the surface, so the offset scales with building size.
pub const ATTACH_OFFSET_RATIO: f32 = 0.05;

/// Buffer used when scattered atmosphere avoids structure footprints.
pub const SCATTER_FOOTPRINT_BUFFER: f32 = 1.5;

/// Density multipliers applied to requested atmosphere counts.
pub mod density {
    pub const SPARSE: f32 = 0.5;
    pub const MEDIUM: f32 = 1.0;
    pub const HIGH: f32 = 1.5;
}

/// Tuning profile for the spiral collision search.
#[derive(Debug, Clone, Copy)]
pub struct SpiralProfile {
    /// Added to the structure's own footprint radius for the first ring.
    pub base_offset: f32,
    /// Footprint inflation used by the overlap test.
    pub buffer: f32,
    /// Attempt budget before placing with residual overlap.
    pub max_attempts: u32,
    /// Radial growth per completed 8-attempt ring.
    pub growth: f32,
}

/// Explicit coordinates are trusted: stay close, give up sooner.
pub const SPIRAL_PRECISE: SpiralProfile = SpiralProfile {
    base_offset: 2.0,
    buffer: 1.0,
    max_attempts: 24,
    growth: 0.5,
};

/// Keyword placement gets more room to wander.
pub const SPIRAL_KEYWORD: SpiralProfile = SpiralProfile {
    base_offset: 6.0,
    buffer: 2.0,
    max_attempts: 40,
    growth: 0.75,
};
