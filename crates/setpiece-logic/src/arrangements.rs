//! Multi-item arrangement layout.
//!
//! An arrangement groups several item kinds into one named composition
//! (a picnic, a campfire circle, a market row). The pattern tag decides
//! the point layout; items are assigned to points in declaration order,
//! each kind filling its count before the next begins. The group centroid
//! is registered so NPCs and later entries can reference it by name.

use rand::Rng;

use crate::constants::CLUSTER_MIN_SPACING;
use crate::geometry::{working_zone, yaw_toward, Point2};
use crate::plan::ArrangementSpec;
use crate::registry::{Arrangement, SceneRegistry, Side};
use crate::sampling::{cluster, jitter, ring};

/// One laid-out item: which prompt it came from plus its pose.
#[derive(Debug, Clone)]
pub struct ArrangedItem {
    pub prompt: String,
    pub position: Point2,
    pub rotation: f32,
}

#[derive(Debug, Clone)]
pub struct ArrangementLayout {
    pub center: Point2,
    pub items: Vec<ArrangedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Cluster,
    Grid,
    Row,
    Circle,
}

impl Pattern {
    /// Unknown patterns degrade to cluster rather than dropping the group.
    fn parse(s: &str) -> Pattern {
        match s {
            "grid" => Pattern::Grid,
            "row" | "line" => Pattern::Row,
            "circle" | "ring" => Pattern::Circle,
            "cluster" => Pattern::Cluster,
            other => {
                if !other.is_empty() {
                    log::warn!("unknown arrangement pattern '{}', using cluster", other);
                }
                Pattern::Cluster
            }
        }
    }
}

/// Lay out one arrangement, register its centroid, and return the items.
pub fn resolve_arrangement(
    rng: &mut impl Rng,
    spec: &ArrangementSpec,
    registry: &mut SceneRegistry,
) -> ArrangementLayout {
    let center = arrangement_center(spec, registry);
    let total: usize = spec.items.iter().map(|i| i.count).sum();

    let mut items = Vec::with_capacity(total);
    if total > 0 {
        let pattern = Pattern::parse(&spec.pattern);
        let poses = layout_points(rng, pattern, center, total, spec.radius);

        // Declaration order: each kind fills its count before the next.
        let mut prompts = spec.items.iter().flat_map(|i| std::iter::repeat(&i.prompt).take(i.count));
        for (position, rotation) in poses {
            // poses never exceeds total, so the zip cannot starve
            if let Some(prompt) = prompts.next() {
                items.push(ArrangedItem { prompt: prompt.clone(), position, rotation });
            }
        }
    }

    registry.register_arrangement(
        &spec.name,
        Arrangement {
            center,
            radius: spec.radius,
            item_positions: items.iter().map(|i| i.position).collect(),
        },
    );

    ArrangementLayout { center, items }
}

fn arrangement_center(spec: &ArrangementSpec, registry: &SceneRegistry) -> Point2 {
    let Some(target) = spec.target.as_deref() else {
        return working_zone().center();
    };
    let side = spec.side.as_deref().and_then(Side::parse).unwrap_or(Side::Front);
    let distance = spec.distance.unwrap_or(spec.radius + 2.0);
    match registry.adjacent_position(target, side, distance) {
        Some(adj) => adj.position,
        None => {
            log::warn!("arrangement '{}' targets unknown structure '{}'", spec.name, target);
            working_zone().center()
        }
    }
}

fn layout_points(
    rng: &mut impl Rng,
    pattern: Pattern,
    center: Point2,
    total: usize,
    radius: f32,
) -> Vec<(Point2, f32)> {
    match pattern {
        Pattern::Cluster => cluster(rng, center, total, radius, CLUSTER_MIN_SPACING.min(radius))
            .into_iter()
            .map(|p| (p, yaw_toward(p, center)))
            .collect(),
        Pattern::Circle => ring(rng, center, total, radius, 0.3)
            .into_iter()
            .map(|rp| (rp.position, rp.rotation))
            .collect(),
        Pattern::Row => {
            // Spread across the diameter, small jitter, all facing south.
            let span = radius * 2.0;
            let step = if total > 1 { span / (total - 1) as f32 } else { 0.0 };
            (0..total)
                .map(|i| {
                    let x = center.x - radius + step * i as f32 + jitter(rng, 0.4);
                    (Point2::new(x, center.z + jitter(rng, 0.4)), jitter(rng, 0.2))
                })
                .collect()
        }
        Pattern::Grid => {
            let side = (total as f32).sqrt().ceil() as usize;
            let step = if side > 1 { radius * 2.0 / (side - 1) as f32 } else { 0.0 };
            let mut out = Vec::with_capacity(total);
            'rows: for r in 0..side {
                for c in 0..side {
                    if out.len() >= total {
                        break 'rows;
                    }
                    let x = center.x - radius + step * c as f32 + jitter(rng, 0.3);
                    let z = center.z - radius + step * r as f32 + jitter(rng, 0.3);
                    out.push((Point2::new(x, z), jitter(rng, 0.2)));
                }
            }
            out
        }
    }
}
