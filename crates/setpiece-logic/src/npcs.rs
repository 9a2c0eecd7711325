//! Character placement resolution.
//!
//! NPCs anchor to a structure or an arrangement. The reference resolves to
//! a point and a facing; a lateral offset spreads multiple characters
//! sharing one anchor. Characters always stand at ground level and their
//! behavior tag passes through untouched.

use rand::Rng;

use crate::geometry::{rightward, working_zone, yaw_toward, Point2};
use crate::plan::NpcSpec;
use crate::registry::{SceneRegistry, Side};
use crate::sampling::jitter;

/// One resolved character pose.
#[derive(Debug, Clone)]
pub struct NpcPose {
    pub position: Point2,
    pub rotation: f32,
    pub behavior: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NpcRelationship {
    AtEntrance,
    Near,
    Within,
}

impl NpcRelationship {
    fn parse(s: &str) -> Option<NpcRelationship> {
        match s {
            "at_entrance" => Some(NpcRelationship::AtEntrance),
            "near" | "" => Some(NpcRelationship::Near),
            "within" | "inside" => Some(NpcRelationship::Within),
            _ => None,
        }
    }
}

/// Resolve one NPC spec. A missing or unknown target degrades to a random
/// point near the zone center rather than dropping the character.
pub fn resolve_npc(rng: &mut impl Rng, spec: &NpcSpec, registry: &SceneRegistry) -> NpcPose {
    let relationship = match NpcRelationship::parse(&spec.relationship) {
        Some(rel) => rel,
        None => {
            log::warn!("unknown npc relationship '{}', treating as near", spec.relationship);
            NpcRelationship::Near
        }
    };

    let (position, rotation) = spec
        .target
        .as_deref()
        .and_then(|target| anchor(rng, relationship, target, registry))
        .unwrap_or_else(|| {
            if let Some(target) = spec.target.as_deref() {
                log::warn!("npc target '{}' not found, placing near zone center", target);
            }
            let c = working_zone().center();
            let p = Point2::new(c.x + jitter(rng, 8.0), c.z + jitter(rng, 8.0));
            (p, rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI))
        });

    // Lateral spread, perpendicular to the resolved facing.
    let lateral = rightward(rotation);
    let position = Point2::new(
        position.x + lateral.x * spec.lateral_offset,
        position.z + lateral.z * spec.lateral_offset,
    );

    NpcPose { position, rotation, behavior: spec.behavior.clone() }
}

/// Resolve the reference point against a structure first, then an
/// arrangement of the same name.
fn anchor(
    rng: &mut impl Rng,
    relationship: NpcRelationship,
    target: &str,
    registry: &SceneRegistry,
) -> Option<(Point2, f32)> {
    if let Some(s) = registry.get(target) {
        let s = s.clone();
        return Some(match relationship {
            NpcRelationship::AtEntrance => {
                let adj = registry.adjacent_position(target, Side::Front, 1.5)?;
                (adj.position, adj.facing)
            }
            NpcRelationship::Near => {
                let adj = registry.adjacent_position(
                    target,
                    Side::Front,
                    s.bounds.depth.max(3.0),
                )?;
                let p = Point2::new(
                    adj.position.x + jitter(rng, 2.0),
                    adj.position.z + jitter(rng, 2.0),
                );
                (p, yaw_toward(p, s.position))
            }
            NpcRelationship::Within => {
                let p = Point2::new(
                    s.position.x + jitter(rng, s.bounds.width * 0.3),
                    s.position.z + jitter(rng, s.bounds.depth * 0.3),
                );
                (p, rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI))
            }
        });
    }

    let arrangement = registry.arrangement(target)?;
    Some(match relationship {
        NpcRelationship::Within if !arrangement.item_positions.is_empty() => {
            let slot = rng.gen_range(0..arrangement.item_positions.len());
            let item = arrangement.item_positions[slot];
            let p = Point2::new(item.x + jitter(rng, 0.8), item.z + jitter(rng, 0.8));
            (p, yaw_toward(p, arrangement.center))
        }
        _ => {
            let p = Point2::new(
                arrangement.center.x + jitter(rng, arrangement.radius * 0.5),
                arrangement.center.z + jitter(rng, arrangement.radius * 0.5),
            );
            (p, yaw_toward(p, arrangement.center))
        }
    })
}
