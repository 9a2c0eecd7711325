//! Ambient element resolution.
//!
//! Fills the scene around the structures: flanking pairs, lines of items
//! between points or structures, scattered ground cover, background
//! framing, and edge-following rows. Scattered placement is the only
//! family filtered against the running collision list — a tumbleweed may
//! hug a wall, but it must not spawn inside one.

use std::f32::consts::{PI, TAU};

use rand::Rng;

use crate::constants::{density, SCATTER_FOOTPRINT_BUFFER};
use crate::geometry::{
    point_in_footprint, working_zone, yaw_toward, CollisionEntry, Point2,
};
use crate::plan::AtmosphereSpec;
use crate::registry::{SceneRegistry, Side, Surface};
use crate::sampling::{edge_band, jitter, poisson_disk, ring, Edge};

/// One resolved atmosphere pose, always at ground level.
#[derive(Debug, Clone, Copy)]
pub struct AtmospherePoint {
    pub position: Point2,
    pub rotation: f32,
}

/// A path for `Along` placement.
#[derive(Debug, Clone)]
pub enum AlongPath {
    /// Straight line between explicit endpoints.
    Points { from: Point2, to: Point2 },
    /// Line between two registered structures' centers, trimmed clear of
    /// both footprints.
    Between(String, String),
    /// Following one structure face, string form `"id.side"`.
    EdgeOf { target: String, surface: Surface },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScatterZone {
    Everywhere,
    Edges,
}

/// Closed relationship enum for atmosphere entries.
#[derive(Debug, Clone)]
pub enum AtmosphereRelationship {
    Flanking { target: String, side: Side, distance: f32, spacing: f32 },
    Along(AlongPath),
    Scattered { zone: ScatterZone, around: Option<String>, avoid_structures: bool, min_distance: f32 },
    Framing { edge: Edge },
    AdjacentTo { target: String, side: Side, spacing: f32 },
}

impl AtmosphereRelationship {
    /// Parsing boundary for the open relationship tag. `None` means the
    /// entry is unknown or incomplete; the caller warns and skips it.
    pub fn parse(spec: &AtmosphereSpec) -> Option<AtmosphereRelationship> {
        match spec.relationship.as_str() {
            "flanking" => Some(AtmosphereRelationship::Flanking {
                target: spec.target.clone()?,
                side: spec.side.as_deref().and_then(Side::parse).unwrap_or(Side::Front),
                distance: spec.min_distance.unwrap_or(1.5),
                spacing: spec.spacing.unwrap_or(3.0),
            }),
            "along" => {
                let path = if let Some(along) = spec.along.as_deref() {
                    let (target, side) = along.split_once('.')?;
                    AlongPath::EdgeOf {
                        target: target.to_string(),
                        surface: Surface::parse(side)?,
                    }
                } else if let (Some(from), Some(to)) = (spec.from, spec.to) {
                    AlongPath::Points {
                        from: Point2::new(from[0], from[1]),
                        to: Point2::new(to[0], to[1]),
                    }
                } else if let Some([a, b]) = spec.between.clone() {
                    AlongPath::Between(a, b)
                } else {
                    return None;
                };
                Some(AtmosphereRelationship::Along(path))
            }
            "scattered" => {
                let (zone, around) = match spec.zone.as_deref() {
                    None | Some("everywhere") => (ScatterZone::Everywhere, None),
                    Some("edges") => (ScatterZone::Edges, None),
                    Some(id) => (ScatterZone::Everywhere, Some(id.to_string())),
                };
                Some(AtmosphereRelationship::Scattered {
                    zone,
                    around,
                    avoid_structures: spec.avoid_structures,
                    min_distance: spec.min_distance.unwrap_or(4.0),
                })
            }
            "framing" => {
                let edge = match spec.side.as_deref() {
                    None => Edge::North,
                    Some(s) => s.parse::<Edge>().unwrap_or_else(|e| {
                        log::warn!("{}, framing the north edge", e);
                        Edge::North
                    }),
                };
                Some(AtmosphereRelationship::Framing { edge })
            }
            "adjacent_to" => Some(AtmosphereRelationship::AdjacentTo {
                target: spec.target.clone()?,
                side: spec.side.as_deref().and_then(Side::parse).unwrap_or(Side::Front),
                spacing: spec.spacing.unwrap_or(2.5),
            }),
            _ => None,
        }
    }
}

/// Density tag → count multiplier. Unknown tags warn and read as medium.
pub fn density_multiplier(tag: Option<&str>) -> f32 {
    match tag {
        None | Some("medium") => density::MEDIUM,
        Some("sparse") => density::SPARSE,
        Some("high") => density::HIGH,
        Some(other) => {
            log::warn!("unknown density '{}', using medium", other);
            density::MEDIUM
        }
    }
}

/// Resolve one atmosphere entry. `collisions` is the running collision
/// list; `own_radius` is the item's collision radius, used only by the
/// scattered filter.
pub fn resolve_atmosphere(
    rng: &mut impl Rng,
    relationship: &AtmosphereRelationship,
    spec: &AtmosphereSpec,
    registry: &SceneRegistry,
    collisions: &[CollisionEntry],
    own_radius: f32,
) -> Vec<AtmospherePoint> {
    let multiplier = density_multiplier(spec.density.as_deref());
    let scaled = |base: usize| -> usize {
        let requested = spec.count.unwrap_or(base);
        ((requested as f32 * multiplier).round() as usize).max(1)
    };

    match relationship {
        AtmosphereRelationship::Flanking { target, side, distance, spacing } => {
            flanking(registry, target, *side, *distance, *spacing, scaled(2))
        }
        AtmosphereRelationship::Along(path) => along(rng, path, registry, scaled(6)),
        AtmosphereRelationship::Scattered { zone, around, avoid_structures, min_distance } => {
            scattered(
                rng,
                *zone,
                around.as_deref(),
                *avoid_structures,
                *min_distance,
                scaled(12),
                registry,
                collisions,
                own_radius,
            )
        }
        AtmosphereRelationship::Framing { edge } => framing(rng, *edge, scaled(8)),
        AtmosphereRelationship::AdjacentTo { target, side, spacing } => {
            adjacent_row(registry, target, *side, *spacing, scaled(4))
        }
    }
}

/// Symmetric points straddling a structure adjacency point, offset along
/// the face's lateral axis and facing outward.
fn flanking(
    registry: &SceneRegistry,
    target: &str,
    side: Side,
    distance: f32,
    spacing: f32,
    count: usize,
) -> Vec<AtmospherePoint> {
    let Some(adj) = registry.adjacent_position(target, side, distance) else {
        return Vec::new();
    };
    let outward = adj.facing + PI;
    let lateral = crate::geometry::rightward(outward);

    (0..count)
        .map(|i| {
            // 0 → +1, 1 → -1, 2 → +2, 3 → -2, ...
            let k = (i / 2 + 1) as f32;
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let t = sign * k * spacing;
            AtmospherePoint {
                position: Point2::new(adj.position.x + lateral.x * t, adj.position.z + lateral.z * t),
                rotation: outward,
            }
        })
        .collect()
}

fn along(
    rng: &mut impl Rng,
    path: &AlongPath,
    registry: &SceneRegistry,
    count: usize,
) -> Vec<AtmospherePoint> {
    match path {
        AlongPath::Points { from, to } => line(rng, *from, *to, count),
        AlongPath::Between(a, b) => {
            let (Some(sa), Some(sb)) = (registry.get(a), registry.get(b)) else {
                log::warn!("along-between references unknown structure '{}' or '{}'", a, b);
                return Vec::new();
            };
            let from = sa.position;
            let to = sb.position;
            let len = from.distance(to);
            if len < 1e-3 {
                return Vec::new();
            }
            // Trim both ends clear of the structure footprints.
            let t0 = (sa.bounds.footprint_radius() / len).min(0.45);
            let t1 = 1.0 - (sb.bounds.footprint_radius() / len).min(0.45);
            let lerp = |t: f32| Point2::new(from.x + (to.x - from.x) * t, from.z + (to.z - from.z) * t);
            line(rng, lerp(t0), lerp(t1), count)
        }
        AlongPath::EdgeOf { target, surface } => (0..count)
            .filter_map(|i| {
                let h = (i + 1) as f32 / (count + 1) as f32;
                registry.surface_position(target, *surface, h, 0.0)
            })
            .map(|sp| {
                let out = crate::geometry::forward(sp.normal);
                AtmospherePoint {
                    position: Point2::new(sp.position.x + out.x, sp.position.z + out.z),
                    rotation: sp.normal,
                }
            })
            .collect(),
    }
}

/// Evenly spaced points on a segment with small positional jitter, all
/// facing down the line.
fn line(rng: &mut impl Rng, from: Point2, to: Point2, count: usize) -> Vec<AtmospherePoint> {
    let heading = yaw_toward(from, to);
    (0..count)
        .map(|i| {
            let t = if count > 1 { i as f32 / (count - 1) as f32 } else { 0.5 };
            AtmospherePoint {
                position: Point2::new(
                    from.x + (to.x - from.x) * t + jitter(rng, 0.5),
                    from.z + (to.z - from.z) * t + jitter(rng, 0.5),
                ),
                rotation: heading,
            }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn scattered(
    rng: &mut impl Rng,
    zone: ScatterZone,
    around: Option<&str>,
    avoid_structures: bool,
    min_distance: f32,
    count: usize,
    registry: &SceneRegistry,
    collisions: &[CollisionEntry],
    own_radius: f32,
) -> Vec<AtmospherePoint> {
    // Oversample, then filter down to the requested count.
    let candidates: Vec<AtmospherePoint> = if let Some(id) = around {
        let Some(s) = registry.get(id) else {
            log::warn!("scatter around unknown structure '{}'", id);
            return Vec::new();
        };
        let radius = s.bounds.footprint_radius() + min_distance;
        ring(rng, s.position, count * 2, radius, min_distance * 0.5)
            .into_iter()
            .map(|rp| AtmospherePoint { position: rp.position, rotation: rp.rotation })
            .collect()
    } else {
        match zone {
            ScatterZone::Everywhere => poisson_disk(rng, &working_zone(), count * 2, min_distance)
                .into_iter()
                .map(|p| AtmospherePoint { position: p, rotation: rng.gen_range(0.0..TAU) })
                .collect(),
            ScatterZone::Edges => {
                let per_edge = (count * 2 + 3) / 4;
                let mut band_points = Vec::new();
                for edge in [Edge::North, Edge::South, Edge::East, Edge::West] {
                    band_points.extend(edge_band(rng, edge, per_edge, 10.0));
                }
                band_points
                    .into_iter()
                    .map(|p| AtmospherePoint { position: p, rotation: rng.gen_range(0.0..TAU) })
                    .collect()
            }
        }
    };

    candidates
        .into_iter()
        .filter(|ap| collisions.iter().all(|c| c.clears(ap.position, own_radius, 0.5)))
        .filter(|ap| {
            !avoid_structures
                || registry.structures().all(|(_, s)| {
                    !point_in_footprint(ap.position, &s.bounds, s.position, SCATTER_FOOTPRINT_BUFFER)
                })
        })
        .take(count)
        .collect()
}

/// Background fill along one zone edge, facing the scene interior.
fn framing(rng: &mut impl Rng, edge: Edge, count: usize) -> Vec<AtmospherePoint> {
    let center = working_zone().center();
    edge_band(rng, edge, count, 12.0)
        .into_iter()
        .map(|p| AtmospherePoint { position: p, rotation: yaw_toward(p, center) })
        .collect()
}

/// Fixed-spacing row along one structure face, each item facing away.
fn adjacent_row(
    registry: &SceneRegistry,
    target: &str,
    side: Side,
    spacing: f32,
    count: usize,
) -> Vec<AtmospherePoint> {
    let surface = match side {
        Side::Front => Surface::Front,
        Side::Back => Surface::Back,
        Side::Left => Surface::Left,
        Side::Right => Surface::Right,
    };
    let Some(s) = registry.get(target) else {
        return Vec::new();
    };
    let face_width = match side {
        Side::Front | Side::Back => s.bounds.width,
        Side::Left | Side::Right => s.bounds.depth,
    };

    (0..count)
        .filter_map(|i| {
            let centered = i as f32 - (count - 1) as f32 / 2.0;
            let h = 0.5 + centered * spacing / face_width.max(0.1);
            if !(0.0..=1.0).contains(&h) {
                return None;
            }
            registry.surface_position(target, surface, h, 0.0)
        })
        .map(|sp| {
            let out = crate::geometry::forward(sp.normal);
            AtmospherePoint {
                position: Point2::new(sp.position.x + out.x, sp.position.z + out.z),
                rotation: sp.normal,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{AssetCategory, Bounds};
    use crate::registry::RegisteredStructure;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(21)
    }

    fn registry() -> SceneRegistry {
        let mut reg = SceneRegistry::new();
        reg.register(
            "diner",
            RegisteredStructure {
                position: Point2::default(),
                rotation: 0.0,
                bounds: Bounds::new(10.0, 6.0, 8.0),
                category: AssetCategory::Structure,
            },
        );
        reg.register(
            "barn",
            RegisteredStructure {
                position: Point2::new(40.0, 0.0),
                rotation: 0.0,
                bounds: Bounds::new(8.0, 7.0, 8.0),
                category: AssetCategory::Structure,
            },
        );
        reg
    }

    fn spec(json: &str) -> AtmosphereSpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_unknown_relationship_is_none() {
        let s = spec(r#"{"prompt": "fog", "relationship": "hovering"}"#);
        assert!(AtmosphereRelationship::parse(&s).is_none());
    }

    #[test]
    fn test_flanking_is_symmetric_about_adjacency_point() {
        let reg = registry();
        let s = spec(r#"{"prompt": "torch", "relationship": "flanking", "target": "diner", "count": 2}"#);
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 0.5);
        assert_eq!(points.len(), 2);
        let mid_x = (points[0].position.x + points[1].position.x) / 2.0;
        assert!(mid_x.abs() < 1e-4, "pair straddles the front center, mid x {}", mid_x);
        assert!((points[0].position.z - points[1].position.z).abs() < 1e-4);
    }

    #[test]
    fn test_along_points_spans_endpoints() {
        let reg = SceneRegistry::new();
        let s = spec(
            r#"{"prompt": "stone", "relationship": "along", "from": [-20.0, 0.0], "to": [20.0, 0.0], "count": 5}"#,
        );
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 0.3);
        assert_eq!(points.len(), 5);
        assert!(points.first().unwrap().position.x < points.last().unwrap().position.x);
    }

    #[test]
    fn test_along_between_avoids_both_footprints() {
        let reg = registry();
        let s = spec(
            r#"{"prompt": "lantern", "relationship": "along", "between": ["diner", "barn"], "count": 6}"#,
        );
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 0.3);
        assert_eq!(points.len(), 6);
        for ap in &points {
            // diner footprint ends at x = 5, barn starts at x = 36
            assert!(ap.position.x > 5.0 && ap.position.x < 36.0, "point {:?} inside a structure", ap.position);
        }
    }

    #[test]
    fn test_along_edge_string_form() {
        let reg = registry();
        let s = spec(r#"{"prompt": "ivy", "relationship": "along", "along": "diner.left", "count": 3}"#);
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 0.2);
        assert_eq!(points.len(), 3);
        for ap in &points {
            assert!(ap.position.x < -5.0, "left face of width 10 is past x = -5, got {:?}", ap.position);
        }
    }

    #[test]
    fn test_along_malformed_edge_is_none() {
        let s = spec(r#"{"prompt": "ivy", "relationship": "along", "along": "dinerleft"}"#);
        assert!(AtmosphereRelationship::parse(&s).is_none());
    }

    #[test]
    fn test_scattered_avoids_structures_when_asked() {
        let reg = registry();
        let s = spec(
            r#"{"prompt": "tumbleweed", "relationship": "scattered", "count": 20, "avoid_structures": true}"#,
        );
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 0.5);
        for ap in &points {
            for (_, st) in reg.structures() {
                assert!(
                    !point_in_footprint(ap.position, &st.bounds, st.position, SCATTER_FOOTPRINT_BUFFER),
                    "scatter point {:?} landed in a footprint",
                    ap.position
                );
            }
        }
    }

    #[test]
    fn test_scattered_respects_collision_list() {
        let reg = SceneRegistry::new();
        let blocker = CollisionEntry::new(Point2::default(), 20.0);
        let s = spec(r#"{"prompt": "cactus", "relationship": "scattered", "count": 15}"#);
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[blocker], 1.0);
        for ap in &points {
            assert!(ap.position.distance(Point2::default()) >= 21.0, "point {:?} inside blocked disc", ap.position);
        }
    }

    #[test]
    fn test_scattered_density_scales_count() {
        let reg = SceneRegistry::new();
        let sparse = spec(
            r#"{"prompt": "grass", "relationship": "scattered", "count": 20, "density": "sparse", "min_distance": 2.0}"#,
        );
        let rel = AtmosphereRelationship::parse(&sparse).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &sparse, &reg, &[], 0.2);
        assert!(points.len() <= 10, "sparse halves the requested count, got {}", points.len());
    }

    #[test]
    fn test_scattered_around_structure_rings_it() {
        let reg = registry();
        let s = spec(r#"{"prompt": "barrel", "relationship": "scattered", "zone": "diner", "count": 6}"#);
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 0.5);
        assert!(!points.is_empty());
        for ap in &points {
            let d = ap.position.distance(Point2::default());
            assert!(d > 5.0 && d < 16.0, "ring distance {} out of band", d);
        }
    }

    #[test]
    fn test_framing_faces_scene_interior() {
        let s = spec(r#"{"prompt": "mesa", "relationship": "framing", "count": 4}"#);
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let reg = SceneRegistry::new();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 1.0);
        assert!(!points.is_empty());
        for ap in &points {
            // north edge, looking south toward the center
            assert!(ap.position.z < -35.0);
            assert!(ap.rotation.abs() < std::f32::consts::FRAC_PI_2, "must face the interior");
        }
    }

    #[test]
    fn test_framing_unknown_side_degrades_to_north() {
        let s = spec(r#"{"prompt": "mesa", "relationship": "framing", "side": "diagonal"}"#);
        let rel = AtmosphereRelationship::parse(&s).expect("framing still parses");
        assert!(matches!(rel, AtmosphereRelationship::Framing { edge: Edge::North }));
    }

    #[test]
    fn test_adjacent_row_faces_away() {
        let reg = registry();
        let s = spec(
            r#"{"prompt": "planter", "relationship": "adjacent_to", "target": "diner", "count": 3, "spacing": 2.0}"#,
        );
        let rel = AtmosphereRelationship::parse(&s).unwrap();
        let points = resolve_atmosphere(&mut rng(), &rel, &s, &reg, &[], 0.4);
        assert_eq!(points.len(), 3);
        for ap in &points {
            assert!(ap.rotation.abs() < 1e-5, "front row faces south, away from the wall");
            assert!(ap.position.z > 4.0);
        }
    }
}
