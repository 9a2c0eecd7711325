//! Ground-plane geometry shared by every resolver.
//!
//! The scene is composed on the x/z plane; y is height and is assigned by
//! relationship logic only (terrain snapping happens downstream). All types
//! here are plain data with no engine dependency.

use serde::Deserialize;

use crate::constants::{SCALE_TO_SIZE, ZONE_HALF_DEPTH, ZONE_HALF_WIDTH};

/// A point on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub z: f32,
}

impl Point2 {
    pub fn new(x: f32, z: f32) -> Self {
        Point2 { x, z }
    }

    pub fn distance(&self, other: Point2) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// World position plus yaw. `rotation = 0` faces south (+z); the forward
/// vector of yaw θ is `(sin θ, cos θ)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: f32,
}

/// Forward vector of a yaw, as a ground-plane point offset.
pub fn forward(rotation: f32) -> Point2 {
    Point2::new(rotation.sin(), rotation.cos())
}

/// Rightward vector of a yaw (perpendicular to forward).
pub fn rightward(rotation: f32) -> Point2 {
    Point2::new(rotation.cos(), -rotation.sin())
}

/// Yaw that looks from `from` toward `to`.
pub fn yaw_toward(from: Point2, to: Point2) -> f32 {
    (to.x - from.x).atan2(to.z - from.z)
}

/// Axis-aligned footprint/height box in world units. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Bounds { width, height, depth }
    }

    /// Half diagonal of the width×depth footprint.
    pub fn footprint_radius(&self) -> f32 {
        (self.width * self.width + self.depth * self.depth).sqrt() / 2.0
    }
}

/// Axis-aligned rectangle on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl Rect {
    pub fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Rect { min_x, min_z, max_x, max_z }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    pub fn center(&self) -> Point2 {
        Point2::new((self.min_x + self.max_x) / 2.0, (self.min_z + self.max_z) / 2.0)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    pub fn clamp(&self, p: Point2) -> Point2 {
        Point2::new(p.x.clamp(self.min_x, self.max_x), p.z.clamp(self.min_z, self.max_z))
    }
}

/// The fixed working zone where scenes are composed.
pub fn working_zone() -> Rect {
    Rect::new(-ZONE_HALF_WIDTH, -ZONE_HALF_DEPTH, ZONE_HALF_WIDTH, ZONE_HALF_DEPTH)
}

/// Footprint overlap test for structures. Axis-aligned on width×depth only,
/// each box inflated by `buffer`. Footprints are frequently non-square, so
/// this is the required structure collision test — the center-distance check
/// is for small props only.
pub fn footprints_overlap(a: &Bounds, pa: Point2, b: &Bounds, pb: Point2, buffer: f32) -> bool {
    let a_half_w = a.width / 2.0 + buffer;
    let a_half_d = a.depth / 2.0 + buffer;
    let b_half_w = b.width / 2.0 + buffer;
    let b_half_d = b.depth / 2.0 + buffer;

    (pa.x - pb.x).abs() < a_half_w + b_half_w && (pa.z - pb.z).abs() < a_half_d + b_half_d
}

/// True when a point falls inside a structure footprint inflated by `buffer`.
pub fn point_in_footprint(p: Point2, bounds: &Bounds, pos: Point2, buffer: f32) -> bool {
    (p.x - pos.x).abs() < bounds.width / 2.0 + buffer
        && (p.z - pos.z).abs() < bounds.depth / 2.0 + buffer
}

/// Lightweight projection of a placement used for distance checks.
#[derive(Debug, Clone, Copy)]
pub struct CollisionEntry {
    pub position: Point2,
    pub radius: f32,
}

impl CollisionEntry {
    pub fn new(position: Point2, radius: f32) -> Self {
        CollisionEntry { position, radius }
    }

    pub fn clears(&self, p: Point2, own_radius: f32, buffer: f32) -> bool {
        self.position.distance(p) >= self.radius + own_radius + buffer
    }
}

/// Collision radius for an asset. Derived from its real-world size when the
/// measurement collaborator supplied one, otherwise converted from the
/// visual scale — never the raw scale multiplier itself.
pub fn collision_radius(real_world_size: Option<f32>, scale: f32) -> f32 {
    match real_world_size {
        Some(size) if size > 0.0 => size / 2.0,
        _ => scale * SCALE_TO_SIZE / 2.0,
    }
}

/// Coarse asset categories used by the bounds estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Structure,
    #[default]
    Decoration,
    Nature,
    Character,
}

/// Estimate a footprint/height box from a single real-world size number.
/// Buildings are modeled taller-and-narrower than wide; nature items
/// (trees, cacti) narrower still.
pub fn estimate_bounds(category: AssetCategory, real_world_size: f32) -> Bounds {
    let s = real_world_size.max(0.1);
    match category {
        AssetCategory::Structure => Bounds::new(s * 0.8, s * 1.1, s * 0.8),
        AssetCategory::Decoration => Bounds::new(s * 0.9, s * 0.9, s * 0.9),
        AssetCategory::Nature => Bounds::new(s * 0.4, s * 1.2, s * 0.4),
        AssetCategory::Character => Bounds::new(s * 0.5, s, s * 0.5),
    }
}

/// Scale measured normalized bounds into world space.
pub fn scale_bounds(measured: &Bounds, scale: f32) -> Bounds {
    Bounds::new(measured.width * scale, measured.height * scale, measured.depth * scale)
}
