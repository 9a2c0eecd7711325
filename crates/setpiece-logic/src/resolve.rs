//! Five-phase scene resolution orchestrator.
//!
//! Structures → decorations → arrangements → atmosphere → NPCs, in that
//! fixed order so every later phase sees every earlier footprint. All
//! state lives in locals passed explicitly; one call, one registry, one
//! collision list.

use rand::Rng;

use crate::arrangements::resolve_arrangement;
use crate::atmosphere::{resolve_atmosphere, AtmosphereRelationship};
use crate::constants::SCALE_TO_SIZE;
use crate::decorations::{resolve_decoration, Relationship};
use crate::geometry::{collision_radius, estimate_bounds, scale_bounds, Bounds, CollisionEntry};
use crate::npcs::resolve_npc;
use crate::plan::{
    AssetInfo, AssetLookup, MeasuredBounds, Placement, PlacementKind, Plan,
};
use crate::registry::SceneRegistry;
use crate::structures::resolve_structure;

/// The resolver's output: placements in insertion order plus the distinct
/// library ids referenced, in first-use order.
#[derive(Debug, Default)]
pub struct SceneResolution {
    pub placements: Vec<Placement>,
    pub library_ids: Vec<String>,
}

impl SceneResolution {
    fn push(&mut self, placement: Placement) {
        if !self.library_ids.contains(&placement.library_id) {
            self.library_ids.push(placement.library_id.clone());
        }
        self.placements.push(placement);
    }
}

/// A collision entry tagged with the structure it belongs to, when any.
/// Decorations skip entries sharing their own target so a sign and an
/// awning on the same wall don't reject each other.
struct TaggedEntry {
    structure: Option<String>,
    entry: CollisionEntry,
}

/// Resolve a full plan into world placements. `existing` carries obstacles
/// from outside this pass (e.g. a previously resolved neighboring scene).
pub fn resolve_scene(
    rng: &mut impl Rng,
    plan: &Plan,
    assets: &AssetLookup,
    measurements: &MeasuredBounds,
    existing: &[CollisionEntry],
) -> SceneResolution {
    log::info!(
        "resolving scene: {} structures, {} decorations, {} arrangements, {} atmosphere, {} npcs",
        plan.structures.len(),
        plan.decorations.len(),
        plan.arrangements.len(),
        plan.atmosphere.len(),
        plan.npcs.len()
    );

    let mut registry = SceneRegistry::new();
    let mut out = SceneResolution::default();
    let mut entries: Vec<TaggedEntry> = existing
        .iter()
        .map(|e| TaggedEntry { structure: None, entry: *e })
        .collect();

    // ── Phase 1: structures ─────────────────────────────────────────────
    for spec in &plan.structures {
        let Some(info) = lookup(assets, &spec.prompt) else {
            continue;
        };
        let scale = info.scale * spec.scale;
        let bounds = bounds_for(info, measurements, scale);
        let resolved = resolve_structure(spec, &bounds, &mut registry);

        entries.push(TaggedEntry {
            structure: Some(spec.id.clone()),
            entry: CollisionEntry::new(resolved.position, bounds.footprint_radius()),
        });

        let mut placement = Placement::new(
            &info.library_id,
            [resolved.position.x, 0.0, resolved.position.z],
            resolved.rotation,
            scale,
            PlacementKind::Structure,
        );
        placement.unresolved_overlap = resolved.unresolved_overlap;
        out.push(placement);
    }

    // ── Phase 2: decorations ────────────────────────────────────────────
    for spec in &plan.decorations {
        let Some(info) = lookup(assets, &spec.prompt) else {
            continue;
        };
        let Some(relationship) = Relationship::parse(spec) else {
            log::warn!("unknown decoration relationship '{}', skipping '{}'", spec.relationship, spec.prompt);
            continue;
        };
        let scale = info.scale * spec.scale;
        let bounds = bounds_for(info, measurements, scale);
        let radius = collision_radius(info.real_world_size, scale);

        let poses = resolve_decoration(rng, &relationship, &spec.target, &bounds, &registry);
        if poses.is_empty() {
            log::warn!("decoration '{}' produced no poses (target '{}')", spec.prompt, spec.target);
        }
        for pose in poses {
            // Same-target entries never reject each other; everything else
            // does.
            let blocked = entries.iter().any(|t| {
                t.structure.as_deref() != Some(spec.target.as_str())
                    && !t.entry.clears(pose.position, radius, 0.5)
            });
            if blocked {
                log::warn!("decoration '{}' pose rejected by collision", spec.prompt);
                continue;
            }
            entries.push(TaggedEntry {
                structure: Some(spec.target.clone()),
                entry: CollisionEntry::new(pose.position, radius),
            });
            let mut placement = Placement::new(
                &info.library_id,
                [pose.position.x, pose.y, pose.position.z],
                pose.rotation,
                scale,
                PlacementKind::Decoration,
            );
            placement.tilt = pose.tilt;
            out.push(placement);
        }
    }

    // ── Phase 3: arrangements ───────────────────────────────────────────
    for spec in &plan.arrangements {
        let layout = resolve_arrangement(rng, spec, &mut registry);
        for item in layout.items {
            let Some(info) = lookup(assets, &item.prompt) else {
                continue;
            };
            let scale = info.scale * spec.scale;
            let radius = collision_radius(info.real_world_size, scale);
            entries.push(TaggedEntry {
                structure: None,
                entry: CollisionEntry::new(item.position, radius),
            });
            out.push(Placement::new(
                &info.library_id,
                [item.position.x, 0.0, item.position.z],
                item.rotation,
                scale,
                PlacementKind::Arrangement,
            ));
        }
    }

    // ── Phase 4: atmosphere ─────────────────────────────────────────────
    for spec in &plan.atmosphere {
        let Some(info) = lookup(assets, &spec.prompt) else {
            continue;
        };
        let Some(relationship) = AtmosphereRelationship::parse(spec) else {
            log::warn!("unknown atmosphere relationship '{}', skipping '{}'", spec.relationship, spec.prompt);
            continue;
        };
        let scale = info.scale * spec.scale;
        let radius = collision_radius(info.real_world_size, scale);
        let flat: Vec<CollisionEntry> = entries.iter().map(|t| t.entry).collect();

        for point in resolve_atmosphere(rng, &relationship, spec, &registry, &flat, radius) {
            entries.push(TaggedEntry {
                structure: None,
                entry: CollisionEntry::new(point.position, radius),
            });
            out.push(Placement::new(
                &info.library_id,
                [point.position.x, 0.0, point.position.z],
                point.rotation,
                scale,
                PlacementKind::Atmosphere,
            ));
        }
    }

    // ── Phase 5: NPCs ───────────────────────────────────────────────────
    for spec in &plan.npcs {
        let Some(info) = lookup(assets, &spec.prompt) else {
            continue;
        };
        let pose = resolve_npc(rng, spec, &registry);
        let mut placement = Placement::new(
            &info.library_id,
            [pose.position.x, 0.0, pose.position.z],
            pose.rotation,
            info.scale * spec.scale,
            PlacementKind::Npc,
        );
        placement.behavior = pose.behavior;
        out.push(placement);
    }

    log::info!(
        "scene resolved: {} placements across {} distinct assets",
        out.placements.len(),
        out.library_ids.len()
    );
    out
}

fn lookup<'a>(assets: &'a AssetLookup, prompt: &str) -> Option<&'a AssetInfo> {
    let found = assets.get(prompt);
    if found.is_none() {
        log::warn!("no asset resolved for prompt '{}', skipping", prompt);
    }
    found
}

/// Footprint box for collision and surface math: measured bounds scaled
/// into world space when available, otherwise estimated from the asset
/// category and size.
fn bounds_for(info: &AssetInfo, measurements: &MeasuredBounds, scale: f32) -> Bounds {
    if let Some(measured) = measurements.get(&info.library_id) {
        return scale_bounds(measured, scale);
    }
    let size = match info.real_world_size {
        Some(size) if size > 0.0 => size,
        _ => scale * SCALE_TO_SIZE,
    };
    estimate_bounds(info.category, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{AssetCategory, Point2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn assets() -> AssetLookup {
        let mut map = HashMap::new();
        for (prompt, id, size, category) in [
            ("a 50s diner", "bld_diner", 12.0, AssetCategory::Structure),
            ("a red barn", "bld_barn", 10.0, AssetCategory::Structure),
            ("neon sign", "dec_sign", 2.0, AssetCategory::Decoration),
            ("cactus", "nat_cactus", 2.5, AssetCategory::Nature),
            ("picnic table", "dec_table", 2.0, AssetCategory::Decoration),
            ("a line cook", "chr_cook", 1.8, AssetCategory::Character),
        ] {
            map.insert(
                prompt.to_string(),
                AssetInfo {
                    library_id: id.to_string(),
                    scale: 1.0,
                    real_world_size: Some(size),
                    category,
                },
            );
        }
        map
    }

    fn plan(json: &str) -> Plan {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_plan_resolves_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = resolve_scene(&mut rng, &Plan::default(), &assets(), &HashMap::new(), &[]);
        assert!(out.placements.is_empty());
        assert!(out.library_ids.is_empty());
    }

    #[test]
    fn test_unresolvable_prompt_is_skipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = plan(r#"{"structures": [{"id": "x", "prompt": "a moon base"}]}"#);
        let out = resolve_scene(&mut rng, &p, &assets(), &HashMap::new(), &[]);
        assert!(out.placements.is_empty(), "unknown prompt contributes nothing");
    }

    #[test]
    fn test_library_ids_distinct_in_first_use_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = plan(
            r#"{
                "structures": [
                    {"id": "d1", "prompt": "a 50s diner", "position": "west"},
                    {"id": "d2", "prompt": "a 50s diner", "position": "east"},
                    {"id": "b", "prompt": "a red barn", "position": "north"}
                ]
            }"#,
        );
        let out = resolve_scene(&mut rng, &p, &assets(), &HashMap::new(), &[]);
        assert_eq!(out.placements.len(), 3);
        assert_eq!(out.library_ids, vec!["bld_diner".to_string(), "bld_barn".to_string()]);
    }

    #[test]
    fn test_same_target_decorations_tolerate_each_other() {
        let mut rng = StdRng::seed_from_u64(5);
        let p = plan(
            r#"{
                "structures": [{"id": "diner", "prompt": "a 50s diner", "position": "center"}],
                "decorations": [
                    {"prompt": "neon sign", "target": "diner", "relationship": "attached_to", "surface": "front", "vertical": 0.8},
                    {"prompt": "neon sign", "target": "diner", "relationship": "attached_to", "surface": "front", "vertical": 0.4}
                ]
            }"#,
        );
        let out = resolve_scene(&mut rng, &p, &assets(), &HashMap::new(), &[]);
        let signs = out
            .placements
            .iter()
            .filter(|pl| pl.kind == PlacementKind::Decoration)
            .count();
        assert_eq!(signs, 2, "same-wall decorations must not reject each other");
    }

    #[test]
    fn test_existing_collisions_block_scatter() {
        let mut rng = StdRng::seed_from_u64(8);
        let p = plan(
            r#"{"atmosphere": [{"prompt": "cactus", "relationship": "scattered", "count": 10}]}"#,
        );
        let wall = CollisionEntry::new(Point2::new(0.0, 0.0), 50.0);
        let out = resolve_scene(&mut rng, &p, &assets(), &HashMap::new(), &[wall]);
        for pl in &out.placements {
            let d = (pl.position[0].powi(2) + pl.position[2].powi(2)).sqrt();
            assert!(d >= 50.0, "scatter at {:.1} inside the blocked disc", d);
        }
    }

    #[test]
    fn test_measured_bounds_override_estimate() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut measurements: MeasuredBounds = HashMap::new();
        measurements.insert("bld_diner".to_string(), Bounds::new(20.0, 4.0, 20.0));
        let p = plan(
            r#"{
                "structures": [{"id": "diner", "prompt": "a 50s diner", "position": "center"}],
                "npcs": [{"prompt": "a line cook", "target": "diner", "relationship": "at_entrance"}]
            }"#,
        );
        let out = resolve_scene(&mut rng, &p, &assets(), &measurements, &[]);
        let npc = out
            .placements
            .iter()
            .find(|pl| pl.kind == PlacementKind::Npc)
            .expect("npc placed");
        // depth 20 → entrance at z = 10 + 1.5
        assert!((npc.position[2] - 11.5).abs() < 1e-3, "entrance must honor measured depth, z {}", npc.position[2]);
    }

    #[test]
    fn test_npc_behavior_survives_resolution() {
        let mut rng = StdRng::seed_from_u64(4);
        let p = plan(
            r#"{
                "structures": [{"id": "diner", "prompt": "a 50s diner", "position": "center"}],
                "npcs": [{"prompt": "a line cook", "target": "diner", "relationship": "at_entrance", "behavior": "idle_chat"}]
            }"#,
        );
        let out = resolve_scene(&mut rng, &p, &assets(), &HashMap::new(), &[]);
        let npc = out.placements.iter().find(|pl| pl.kind == PlacementKind::Npc).unwrap();
        assert_eq!(npc.behavior.as_deref(), Some("idle_chat"));
    }
}
