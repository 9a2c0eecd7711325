//! Stateless point-generation primitives.
//!
//! Poisson-disk, cluster, ring, edge-band, and grid distributions over the
//! ground plane. Every function takes the caller's RNG so tests can fix a
//! seed; nothing here touches a process-wide generator.

use std::f32::consts::{SQRT_2, TAU};
use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::constants::{CLUSTER_MIN_SPACING, EDGE_MARGIN, POISSON_MAX_ATTEMPTS};
use crate::geometry::{working_zone, Point2, Rect};

/// Uniform draw in `[-amount, amount)`, tolerating a zero amount.
pub(crate) fn jitter(rng: &mut impl Rng, amount: f32) -> f32 {
    if amount > 0.0 {
        rng.gen_range(-amount..amount)
    } else {
        0.0
    }
}

// ── Poisson-disk ────────────────────────────────────────────────────────

/// Poisson-disk sampling over `zone` with a guaranteed pairwise minimum
/// distance. Grows points from an active frontier; a frontier point retires
/// after `POISSON_MAX_ATTEMPTS` failed candidates in the annulus
/// `[min_distance, 2·min_distance]`.
///
/// Returning fewer than `target_count` points is an accepted outcome, not
/// an error — the zone may simply be too small for the requested density.
/// Callers must tolerate partial results.
pub fn poisson_disk(
    rng: &mut impl Rng,
    zone: &Rect,
    target_count: usize,
    min_distance: f32,
) -> Vec<Point2> {
    if target_count == 0 || zone.width() <= 0.0 || zone.depth() <= 0.0 {
        return Vec::new();
    }
    let min_distance = min_distance.max(0.01);

    // Spatial hash: cell size min_distance/√2 guarantees at most one point
    // per cell, so the validity check only scans a 5×5 neighborhood.
    let cell = min_distance / SQRT_2;
    let cols = (zone.width() / cell).ceil() as usize + 1;
    let rows = (zone.depth() / cell).ceil() as usize + 1;
    let mut grid: Vec<Option<usize>> = vec![None; cols * rows];

    let cell_of = |p: Point2| -> (usize, usize) {
        let cx = (((p.x - zone.min_x) / cell).floor() as usize).min(cols - 1);
        let cz = (((p.z - zone.min_z) / cell).floor() as usize).min(rows - 1);
        (cx, cz)
    };

    let mut points: Vec<Point2> = Vec::with_capacity(target_count);
    let mut active: Vec<usize> = Vec::new();

    let first = Point2::new(
        rng.gen_range(zone.min_x..zone.max_x),
        rng.gen_range(zone.min_z..zone.max_z),
    );
    let (fx, fz) = cell_of(first);
    grid[fz * cols + fx] = Some(0);
    points.push(first);
    active.push(0);

    while !active.is_empty() && points.len() < target_count {
        let slot = rng.gen_range(0..active.len());
        let around = points[active[slot]];

        let mut placed = false;
        for _ in 0..POISSON_MAX_ATTEMPTS {
            let angle = rng.gen_range(0.0..TAU);
            let radius = rng.gen_range(min_distance..min_distance * 2.0);
            let candidate = Point2::new(
                around.x + angle.sin() * radius,
                around.z + angle.cos() * radius,
            );
            if !zone.contains(candidate) {
                continue;
            }
            let (cx, cz) = cell_of(candidate);
            if neighborhood_clear(&grid, &points, cols, rows, cx, cz, candidate, min_distance) {
                let idx = points.len();
                grid[cz * cols + cx] = Some(idx);
                points.push(candidate);
                active.push(idx);
                placed = true;
                break;
            }
        }
        if !placed {
            active.swap_remove(slot);
        }
    }

    if points.len() < target_count {
        log::warn!(
            "poisson-disk under-count: {} of {} points (zone {:.0}x{:.0}, min_distance {:.1})",
            points.len(),
            target_count,
            zone.width(),
            zone.depth(),
            min_distance
        );
    }
    points
}

fn neighborhood_clear(
    grid: &[Option<usize>],
    points: &[Point2],
    cols: usize,
    rows: usize,
    cx: usize,
    cz: usize,
    candidate: Point2,
    min_distance: f32,
) -> bool {
    for dz in -2i32..=2 {
        for dx in -2i32..=2 {
            let nx = cx as i32 + dx;
            let nz = cz as i32 + dz;
            if nx < 0 || nz < 0 || nx >= cols as i32 || nz >= rows as i32 {
                continue;
            }
            if let Some(idx) = grid[nz as usize * cols + nx as usize] {
                if points[idx].distance(candidate) < min_distance {
                    return false;
                }
            }
        }
    }
    true
}

// ── Cluster ─────────────────────────────────────────────────────────────

/// Rejection-sampled cluster inside a disk. Radius is drawn as
/// `radius·√u` for area-uniform density; gives up after `count × 20`
/// attempts, so the result may hold fewer than `count` points.
pub fn cluster(
    rng: &mut impl Rng,
    center: Point2,
    count: usize,
    radius: f32,
    min_spacing: f32,
) -> Vec<Point2> {
    let mut accepted: Vec<Point2> = Vec::with_capacity(count);
    let budget = count * 20;
    let mut attempts = 0;

    while accepted.len() < count && attempts < budget {
        attempts += 1;
        let angle = rng.gen_range(0.0..TAU);
        let r = radius * rng.gen::<f32>().sqrt();
        let p = Point2::new(center.x + angle.sin() * r, center.z + angle.cos() * r);
        if accepted.iter().all(|q| q.distance(p) >= min_spacing) {
            accepted.push(p);
        }
    }
    accepted
}

/// Cluster with the default minimum spacing.
pub fn cluster_default(rng: &mut impl Rng, center: Point2, count: usize, radius: f32) -> Vec<Point2> {
    cluster(rng, center, count, radius, CLUSTER_MIN_SPACING)
}

// ── Ring ────────────────────────────────────────────────────────────────

/// A ring sample: a position plus a facing that looks back at the center.
#[derive(Debug, Clone, Copy)]
pub struct RingPoint {
    pub position: Point2,
    pub rotation: f32,
}

/// Exactly `count` angularly even points on a circle. `jitter` scales both
/// an angular and a radial perturbation; the facing gets a small variance
/// of its own so rings don't look stamped.
pub fn ring(rng: &mut impl Rng, center: Point2, count: usize, radius: f32, jit: f32) -> Vec<RingPoint> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let base = i as f32 / count.max(1) as f32 * TAU;
        let angle = base + jitter(rng, 0.25 * jit);
        let r = radius + jitter(rng, jit);
        let position = Point2::new(center.x + angle.sin() * r, center.z + angle.cos() * r);
        let rotation = crate::geometry::yaw_toward(position, center) + jitter(rng, 0.1);
        out.push(RingPoint { position, rotation });
    }
    out
}

// ── Edge band ───────────────────────────────────────────────────────────

/// A side of the working zone. Closed enum: anything else is a data error
/// at the parsing boundary, not a runtime condition to tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    North,
    South,
    East,
    West,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEdgeError(pub String);

impl fmt::Display for ParseEdgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown edge direction '{}'", self.0)
    }
}

impl std::error::Error for ParseEdgeError {}

impl FromStr for Edge {
    type Err = ParseEdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" | "n" | "north" => Ok(Edge::North),
            "S" | "s" | "south" => Ok(Edge::South),
            "E" | "e" | "east" => Ok(Edge::East),
            "W" | "w" | "west" => Ok(Edge::West),
            other => Err(ParseEdgeError(other.to_string())),
        }
    }
}

/// Rectangular band of the given depth along one side of the working zone.
/// North is -z. The band hugs the zone edge, not the far-away world edge.
pub fn edge_band_rect(edge: Edge, depth: f32) -> Rect {
    let zone = working_zone();
    let m = EDGE_MARGIN;
    match edge {
        Edge::North => Rect::new(zone.min_x + m, zone.min_z, zone.max_x - m, zone.min_z + depth),
        Edge::South => Rect::new(zone.min_x + m, zone.max_z - depth, zone.max_x - m, zone.max_z),
        Edge::East => Rect::new(zone.max_x - depth, zone.min_z + m, zone.max_x, zone.max_z - m),
        Edge::West => Rect::new(zone.min_x, zone.min_z + m, zone.min_x + depth, zone.max_z - m),
    }
}

/// Poisson-disk points inside an edge band, followed by a perpendicular
/// jitter to break up visible straight lines.
pub fn edge_band(rng: &mut impl Rng, edge: Edge, count: usize, depth: f32) -> Vec<Point2> {
    let band = edge_band_rect(edge, depth);
    if count == 0 {
        return Vec::new();
    }

    let spacing = ((band.width() * band.depth()) / count as f32).sqrt().clamp(2.0, 6.0);
    let mut points = poisson_disk(rng, &band, count, spacing);

    let wobble = depth * 0.2;
    for p in &mut points {
        match edge {
            Edge::North | Edge::South => p.z = (p.z + jitter(rng, wobble)).clamp(band.min_z, band.max_z),
            Edge::East | Edge::West => p.x = (p.x + jitter(rng, wobble)).clamp(band.min_x, band.max_x),
        }
    }
    points
}

// ── Grid ────────────────────────────────────────────────────────────────

/// Evenly spaced interior grid points (not touching the boundary) with
/// positional noise proportional to the cell size.
pub fn grid_points(rng: &mut impl Rng, zone: &Rect, rows: usize, cols: usize, noise: f32) -> Vec<Point2> {
    let mut out = Vec::with_capacity(rows * cols);
    if rows == 0 || cols == 0 {
        return out;
    }
    let step_x = zone.width() / (cols + 1) as f32;
    let step_z = zone.depth() / (rows + 1) as f32;
    for r in 0..rows {
        for c in 0..cols {
            let x = zone.min_x + step_x * (c + 1) as f32 + jitter(rng, noise * step_x * 0.4);
            let z = zone.min_z + step_z * (r + 1) as f32 + jitter(rng, noise * step_z * 0.4);
            out.push(zone.clamp(Point2::new(x, z)));
        }
    }
    out
}
