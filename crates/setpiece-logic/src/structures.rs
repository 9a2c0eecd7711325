//! Structure placement resolution.
//!
//! Turns one structure's position/facing spec into a world pose, then runs
//! an iterative spiral search to clear footprint overlap against every
//! structure registered so far. The final pose and footprint are registered
//! before returning so later entries see them.

use std::f32::consts::FRAC_PI_4;

use crate::constants::{facing, SpiralProfile, NAMED_OFFSET, SPIRAL_KEYWORD, SPIRAL_PRECISE};
use crate::geometry::{footprints_overlap, working_zone, AssetCategory, Bounds, Point2};
use crate::plan::{PositionSpec, StructureSpec};
use crate::registry::{RegisteredStructure, SceneRegistry, Side};

/// Resolved pose for one structure, ground level, plus the exhaustion flag.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedStructure {
    pub position: Point2,
    pub rotation: f32,
    pub unresolved_overlap: bool,
}

/// Fixed offset from the zone center for a named position keyword.
pub fn named_offset(keyword: &str) -> Option<Point2> {
    let d = NAMED_OFFSET;
    let diag = NAMED_OFFSET / std::f32::consts::SQRT_2;
    // North is -z, south is +z.
    match keyword {
        "center" | "middle" => Some(Point2::new(0.0, 0.0)),
        "north" => Some(Point2::new(0.0, -d)),
        "south" => Some(Point2::new(0.0, d)),
        "east" => Some(Point2::new(d, 0.0)),
        "west" => Some(Point2::new(-d, 0.0)),
        "northeast" | "NE" => Some(Point2::new(diag, -diag)),
        "northwest" | "NW" => Some(Point2::new(-diag, -diag)),
        "southeast" | "SE" => Some(Point2::new(diag, diag)),
        "southwest" | "SW" => Some(Point2::new(-diag, diag)),
        _ => None,
    }
}

/// Fixed yaw for a facing keyword.
pub fn parse_facing(keyword: &str) -> Option<f32> {
    match keyword {
        "north" => Some(facing::NORTH),
        "south" => Some(facing::SOUTH),
        "east" => Some(facing::EAST),
        "west" => Some(facing::WEST),
        "toward_camera" => Some(facing::TOWARD_CAMERA),
        _ => None,
    }
}

/// Resolve one structure against everything registered so far, register the
/// result, and return it.
pub fn resolve_structure(
    spec: &StructureSpec,
    bounds: &Bounds,
    registry: &mut SceneRegistry,
) -> ResolvedStructure {
    let zone = working_zone();

    // Resolution order: explicit → named keyword → relative → zone center.
    let (candidate, inherited_facing, profile) = match &spec.position {
        Some(PositionSpec::Explicit([x, z])) => {
            // Caller's coordinates are trusted; clamp into the zone and use
            // the tight profile.
            (zone.clamp(Point2::new(*x, *z)), None, SPIRAL_PRECISE)
        }
        Some(PositionSpec::Named(keyword)) => {
            let offset = named_offset(keyword).unwrap_or_else(|| {
                log::warn!("unknown position keyword '{}', using zone center", keyword);
                Point2::new(0.0, 0.0)
            });
            let c = zone.center();
            (Point2::new(c.x + offset.x, c.z + offset.z), None, SPIRAL_KEYWORD)
        }
        Some(PositionSpec::Relative { relative_to, side, distance }) => {
            let side = side
                .as_deref()
                .and_then(Side::parse)
                .unwrap_or(Side::Front);
            let distance = distance.unwrap_or(bounds.footprint_radius() + 2.0);
            match registry.adjacent_position(relative_to, side, distance) {
                Some(adj) => (adj.position, Some(adj.facing), SPIRAL_KEYWORD),
                None => {
                    log::warn!(
                        "structure '{}' is relative to unknown '{}', using zone center",
                        spec.id,
                        relative_to
                    );
                    (zone.center(), None, SPIRAL_KEYWORD)
                }
            }
        }
        None => (zone.center(), None, SPIRAL_KEYWORD),
    };

    let rotation = spec
        .facing
        .as_deref()
        .and_then(parse_facing)
        .or(inherited_facing)
        .unwrap_or(facing::SOUTH);

    let (position, unresolved_overlap) = clear_overlap(candidate, bounds, registry, profile);
    if unresolved_overlap {
        log::warn!(
            "structure '{}': spiral search exhausted after {} attempts, placing with possible overlap",
            spec.id,
            profile.max_attempts
        );
    }

    registry.register(
        &spec.id,
        RegisteredStructure {
            position,
            rotation,
            bounds: *bounds,
            category: AssetCategory::Structure,
        },
    );

    ResolvedStructure { position, rotation, unresolved_overlap }
}

/// Spiral collision resolution. Each attempt displaces from the *original*
/// candidate (not cumulatively): 45° per attempt, radial offset
/// `(own_radius + base_offset) × (1 + ⌊attempt/8⌋ × growth)`. After the
/// budget is exhausted the last-tried position is returned flagged.
fn clear_overlap(
    original: Point2,
    bounds: &Bounds,
    registry: &SceneRegistry,
    profile: SpiralProfile,
) -> (Point2, bool) {
    let own_radius = bounds.footprint_radius();
    let mut candidate = original;

    for attempt in 0..=profile.max_attempts {
        let collides = registry
            .structures()
            .any(|(_, s)| footprints_overlap(bounds, candidate, &s.bounds, s.position, profile.buffer));
        if !collides {
            return (candidate, false);
        }
        if attempt == profile.max_attempts {
            break;
        }
        let step = attempt + 1;
        let angle = step as f32 * FRAC_PI_4;
        let offset = (own_radius + profile.base_offset) * (1.0 + (step / 8) as f32 * profile.growth);
        candidate = Point2::new(original.x + angle.sin() * offset, original.z + angle.cos() * offset);
    }
    // Exhausted: the last-tried (and tested) position, flagged.
    (candidate, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::working_zone;

    fn spec(id: &str, position: Option<PositionSpec>) -> StructureSpec {
        StructureSpec {
            id: id.to_string(),
            prompt: format!("a {}", id),
            position,
            facing: None,
            scale: 1.0,
        }
    }

    #[test]
    fn test_explicit_position_is_clamped_into_zone() {
        let mut reg = SceneRegistry::new();
        let bounds = Bounds::new(8.0, 6.0, 8.0);
        let resolved = resolve_structure(
            &spec("barn", Some(PositionSpec::Explicit([500.0, -500.0]))),
            &bounds,
            &mut reg,
        );
        let zone = working_zone();
        assert!(zone.contains(resolved.position));
    }

    #[test]
    fn test_named_center_lands_at_zone_center() {
        let mut reg = SceneRegistry::new();
        let resolved = resolve_structure(
            &spec("diner", Some(PositionSpec::Named("center".into()))),
            &Bounds::new(10.0, 6.0, 8.0),
            &mut reg,
        );
        assert!(resolved.position.x.abs() < 1e-5);
        assert!(resolved.position.z.abs() < 1e-5);
        assert!(!resolved.unresolved_overlap);
    }

    #[test]
    fn test_named_north_offsets_negative_z() {
        let mut reg = SceneRegistry::new();
        let resolved = resolve_structure(
            &spec("barn", Some(PositionSpec::Named("north".into()))),
            &Bounds::new(8.0, 6.0, 8.0),
            &mut reg,
        );
        assert!(resolved.position.z < -30.0);
    }

    #[test]
    fn test_relative_placement_lands_beside_target() {
        let mut reg = SceneRegistry::new();
        resolve_structure(
            &spec("diner", Some(PositionSpec::Named("center".into()))),
            &Bounds::new(10.0, 6.0, 8.0),
            &mut reg,
        );
        let resolved = resolve_structure(
            &spec(
                "kiosk",
                Some(PositionSpec::Relative {
                    relative_to: "diner".into(),
                    side: Some("left".into()),
                    distance: Some(6.0),
                }),
            ),
            &Bounds::new(3.0, 3.0, 3.0),
            &mut reg,
        );
        // Left of an unrotated structure is -x
        assert!(resolved.position.x < -5.0, "expected west of diner, got {:?}", resolved.position);
    }

    #[test]
    fn test_identical_requests_resolve_without_overlap() {
        let mut reg = SceneRegistry::new();
        let bounds = Bounds::new(10.0, 6.0, 10.0);
        let a = resolve_structure(&spec("a", Some(PositionSpec::Explicit([0.0, 0.0]))), &bounds, &mut reg);
        let b = resolve_structure(&spec("b", Some(PositionSpec::Explicit([0.0, 0.0]))), &bounds, &mut reg);
        assert!(!a.unresolved_overlap);
        assert!(!b.unresolved_overlap);
        assert!(
            !footprints_overlap(&bounds, a.position, &bounds, b.position, 1.0),
            "spiral search must separate identical requests: {:?} vs {:?}",
            a.position,
            b.position
        );
    }

    #[test]
    fn test_three_structures_pairwise_clear() {
        let mut reg = SceneRegistry::new();
        let bounds = Bounds::new(12.0, 8.0, 12.0);
        let mut placed = Vec::new();
        for id in ["a", "b", "c"] {
            let r = resolve_structure(
                &spec(id, Some(PositionSpec::Named("center".into()))),
                &bounds,
                &mut reg,
            );
            placed.push(r.position);
        }
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                assert!(
                    !footprints_overlap(&bounds, placed[i], &bounds, placed[j], 1.0),
                    "structures {} and {} overlap",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_exhausted_search_returns_last_tested_position() {
        // A blocker covering the whole zone makes every attempt collide.
        let mut reg = SceneRegistry::new();
        reg.register(
            "wall",
            RegisteredStructure {
                position: Point2::default(),
                rotation: 0.0,
                bounds: Bounds::new(400.0, 10.0, 400.0),
                category: AssetCategory::Structure,
            },
        );
        let bounds = Bounds::new(10.0, 6.0, 10.0);
        let resolved =
            resolve_structure(&spec("shed", Some(PositionSpec::Explicit([0.0, 0.0]))), &bounds, &mut reg);
        assert!(resolved.unresolved_overlap);

        // The final pose is the candidate tested on the last attempt: the
        // displacement for step = max_attempts (24 → angle 6π, due +z at
        // ring multiplier 2.5), not a never-tested step-25 candidate.
        let expected_offset = (bounds.footprint_radius() + 2.0) * 2.5;
        assert!(resolved.position.x.abs() < 0.01, "got x {}", resolved.position.x);
        assert!(
            (resolved.position.z - expected_offset).abs() < 1e-3,
            "expected z {}, got {}",
            expected_offset,
            resolved.position.z
        );
    }

    #[test]
    fn test_facing_keyword_sets_rotation() {
        let mut reg = SceneRegistry::new();
        let mut s = spec("diner", Some(PositionSpec::Named("center".into())));
        s.facing = Some("east".into());
        let resolved = resolve_structure(&s, &Bounds::new(8.0, 6.0, 8.0), &mut reg);
        assert!((resolved.rotation - facing::EAST).abs() < 1e-5);
    }

    #[test]
    fn test_registered_after_resolution() {
        let mut reg = SceneRegistry::new();
        resolve_structure(
            &spec("diner", Some(PositionSpec::Named("center".into()))),
            &Bounds::new(8.0, 6.0, 8.0),
            &mut reg,
        );
        assert!(reg.get("diner").is_some());
    }
}
