//! Decoration relationship resolution.
//!
//! Positions items relative to a single registered structure: surface
//! attachment, adjacency, leaning, hanging, the generalized anchor+offset
//! attachment, and on-top placement. One spec can fan out to several poses
//! (mirrored pairs, rows, clusters); unknown relationship tags produce no
//! poses and are reported by the caller, never fatal.

use std::f32::consts::TAU;

use rand::Rng;

use crate::constants::ATTACH_OFFSET_RATIO;
use crate::geometry::{forward, rightward, yaw_toward, Bounds, Point2};
use crate::plan::DecorationSpec;
use crate::registry::{SceneRegistry, Side, Surface};
use crate::sampling::{cluster, jitter};

/// One resolved decoration pose. `tilt` is an extra lean angle for the
/// consumer to apply on a second rotation axis.
#[derive(Debug, Clone, Copy)]
pub struct DecorationPose {
    pub position: Point2,
    pub y: f32,
    pub rotation: f32,
    pub tilt: Option<f32>,
}

/// Anchor for the generalized attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Front,
    Back,
    Left,
    Right,
    Top,
    Center,
    Perimeter,
}

impl Anchor {
    fn parse(s: &str) -> Option<Anchor> {
        match s {
            "front" => Some(Anchor::Front),
            "back" => Some(Anchor::Back),
            "left" => Some(Anchor::Left),
            "right" => Some(Anchor::Right),
            "top" => Some(Anchor::Top),
            "center" => Some(Anchor::Center),
            "perimeter" => Some(Anchor::Perimeter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FacingMode {
    TowardParent,
    Away,
    Inherit,
    Cardinal(f32),
    Random,
}

impl FacingMode {
    fn parse(s: &str) -> Option<FacingMode> {
        match s {
            "toward_parent" => Some(FacingMode::TowardParent),
            "away" => Some(FacingMode::Away),
            "inherit" => Some(FacingMode::Inherit),
            "random" => Some(FacingMode::Random),
            other => crate::structures::parse_facing(other).map(FacingMode::Cardinal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrangeMode {
    Single,
    Row,
    Column,
    Cluster,
    Grid,
}

impl ArrangeMode {
    fn parse(s: &str) -> Option<ArrangeMode> {
        match s {
            "single" => Some(ArrangeMode::Single),
            "row" => Some(ArrangeMode::Row),
            "column" => Some(ArrangeMode::Column),
            "cluster" => Some(ArrangeMode::Cluster),
            "grid" => Some(ArrangeMode::Grid),
            _ => None,
        }
    }
}

/// Generalized anchor+offset attachment parameters.
#[derive(Debug, Clone, Copy)]
pub struct V2Attachment {
    pub anchor: Anchor,
    /// `[forward, sideways]` offset in the anchor's local frame.
    pub offset: [f32; 2],
    pub height_ratio: f32,
    pub facing: FacingMode,
    pub arrange: ArrangeMode,
    pub count: usize,
    pub spacing: f32,
    pub radius: f32,
}

/// Closed relationship enum, built from the plan's open string tag.
#[derive(Debug, Clone, Copy)]
pub enum Relationship {
    AttachedTo { surface: Surface, horizontal: f32, vertical: f32, count: usize, mirrored: bool },
    AdjacentTo { side: Side, distance: Option<f32>, count: usize, horizontal: Option<f32> },
    LeaningAgainst { surface: Surface, tilt_degrees: f32 },
    HangingFrom { drop: f32 },
    V2(V2Attachment),
    OnTopOf { count: usize },
}

impl Relationship {
    /// Parsing boundary: open plan strings in, closed enum out. `None`
    /// means an unrecognized relationship — the caller warns and skips.
    pub fn parse(spec: &DecorationSpec) -> Option<Relationship> {
        match spec.relationship.as_str() {
            "attached_to" => Some(Relationship::AttachedTo {
                surface: spec.surface.as_deref().and_then(Surface::parse)?,
                horizontal: spec.horizontal.unwrap_or(0.5),
                vertical: spec.vertical,
                count: spec.count.unwrap_or(1),
                mirrored: spec.mirrored,
            }),
            "adjacent_to" => Some(Relationship::AdjacentTo {
                side: spec.side.as_deref().and_then(Side::parse).unwrap_or(Side::Front),
                distance: spec.distance,
                count: spec.count.unwrap_or(1),
                horizontal: spec.horizontal,
            }),
            "leaning_against" => Some(Relationship::LeaningAgainst {
                surface: spec.surface.as_deref().and_then(Surface::parse).unwrap_or(Surface::Front),
                tilt_degrees: spec.tilt_degrees.unwrap_or(12.0),
            }),
            "hanging_from" => Some(Relationship::HangingFrom { drop: spec.drop.unwrap_or(0.5) }),
            "v2_attachment" => Some(Relationship::V2(V2Attachment {
                anchor: spec.anchor.as_deref().and_then(Anchor::parse).unwrap_or(Anchor::Front),
                offset: spec.offset.unwrap_or([0.0, 0.0]),
                height_ratio: spec.height_ratio.unwrap_or(0.0),
                facing: spec
                    .facing
                    .as_deref()
                    .and_then(FacingMode::parse)
                    .unwrap_or(FacingMode::Away),
                arrange: spec
                    .arrangement
                    .as_deref()
                    .and_then(ArrangeMode::parse)
                    .unwrap_or(ArrangeMode::Single),
                count: spec.count.unwrap_or(1),
                spacing: spec.spacing.unwrap_or(1.5),
                radius: spec.radius.unwrap_or(3.0),
            })),
            "on_top_of" => Some(Relationship::OnTopOf { count: spec.count.unwrap_or(1) }),
            _ => None,
        }
    }
}

/// Resolve a relationship against its target structure. Empty when the
/// target is unknown.
pub fn resolve_decoration(
    rng: &mut impl Rng,
    relationship: &Relationship,
    target: &str,
    deco_bounds: &Bounds,
    registry: &SceneRegistry,
) -> Vec<DecorationPose> {
    let Some(structure) = registry.get(target) else {
        return Vec::new();
    };
    let structure = structure.clone();

    match *relationship {
        Relationship::AttachedTo { surface, horizontal, vertical, count, mirrored } => {
            attached_to(registry, target, &structure.bounds, surface, horizontal, vertical, count, mirrored)
        }
        Relationship::AdjacentTo { side, distance, count, horizontal } => {
            adjacent_to(registry, target, deco_bounds, side, distance, count, horizontal)
        }
        Relationship::LeaningAgainst { surface, tilt_degrees } => {
            leaning_against(registry, target, &structure.bounds, surface, tilt_degrees)
        }
        Relationship::HangingFrom { drop } => hanging_from(registry, target, drop),
        Relationship::V2(ref v2) => v2_attachment(rng, registry, target, &structure, v2),
        Relationship::OnTopOf { count } => on_top_of(rng, registry, target, deco_bounds, count),
    }
}

/// Offset a surface point outward along its normal. The default offset is
/// proportional to the structure depth so it scales with building size.
fn push_outward(position: Point2, normal: f32, amount: f32) -> Point2 {
    let out = forward(normal);
    Point2::new(position.x + out.x * amount, position.z + out.z * amount)
}

#[allow(clippy::too_many_arguments)]
fn attached_to(
    registry: &SceneRegistry,
    target: &str,
    structure_bounds: &Bounds,
    surface: Surface,
    horizontal: f32,
    vertical: f32,
    count: usize,
    mirrored: bool,
) -> Vec<DecorationPose> {
    let offset = structure_bounds.depth * ATTACH_OFFSET_RATIO;
    let fractions: Vec<f32> = if mirrored {
        vec![horizontal, 1.0 - horizontal]
    } else if count > 1 {
        // Evenly spaced row across the face
        (0..count).map(|i| (i + 1) as f32 / (count + 1) as f32).collect()
    } else {
        vec![horizontal]
    };

    fractions
        .into_iter()
        .filter_map(|h| registry.surface_position(target, surface, h, vertical))
        .map(|sp| DecorationPose {
            position: push_outward(sp.position, sp.normal, offset),
            y: sp.y,
            rotation: sp.normal,
            tilt: None,
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn adjacent_to(
    registry: &SceneRegistry,
    target: &str,
    deco_bounds: &Bounds,
    side: Side,
    distance: Option<f32>,
    count: usize,
    horizontal: Option<f32>,
) -> Vec<DecorationPose> {
    let distance = distance.unwrap_or(deco_bounds.depth.max(2.0));

    // An externally supplied horizontal fraction spreads the item along the
    // face instead of using the face center.
    if let Some(h) = horizontal {
        let surface = match side {
            Side::Front => Surface::Front,
            Side::Back => Surface::Back,
            Side::Left => Surface::Left,
            Side::Right => Surface::Right,
        };
        return registry
            .surface_position(target, surface, h, 0.0)
            .map(|sp| DecorationPose {
                position: push_outward(sp.position, sp.normal, distance),
                y: 0.0,
                rotation: sp.normal + std::f32::consts::PI,
                tilt: None,
            })
            .into_iter()
            .collect();
    }

    let Some(adj) = registry.adjacent_position(target, side, distance) else {
        return Vec::new();
    };

    if count <= 1 {
        return vec![DecorationPose { position: adj.position, y: 0.0, rotation: adj.facing, tilt: None }];
    }

    // Perpendicular row centered on the adjacency point.
    let spacing = deco_bounds.width.max(1.0) * 1.5;
    let lateral = rightward(adj.facing);
    (0..count)
        .map(|i| {
            let t = i as f32 - (count - 1) as f32 / 2.0;
            DecorationPose {
                position: Point2::new(
                    adj.position.x + lateral.x * t * spacing,
                    adj.position.z + lateral.z * t * spacing,
                ),
                y: 0.0,
                rotation: adj.facing,
                tilt: None,
            }
        })
        .collect()
}

fn leaning_against(
    registry: &SceneRegistry,
    target: &str,
    structure_bounds: &Bounds,
    surface: Surface,
    tilt_degrees: f32,
) -> Vec<DecorationPose> {
    let offset = structure_bounds.depth * ATTACH_OFFSET_RATIO;
    registry
        .surface_position(target, surface, 0.5, 0.0)
        .map(|sp| DecorationPose {
            position: push_outward(sp.position, sp.normal, offset),
            y: 0.0,
            rotation: sp.normal,
            tilt: Some(tilt_degrees.to_radians()),
        })
        .into_iter()
        .collect()
}

fn hanging_from(registry: &SceneRegistry, target: &str, drop: f32) -> Vec<DecorationPose> {
    registry
        .surface_position(target, Surface::Roof, 0.5, 0.5)
        .map(|sp| DecorationPose {
            position: sp.position,
            y: (sp.y - drop).max(0.0),
            rotation: sp.normal,
            tilt: None,
        })
        .into_iter()
        .collect()
}

fn v2_attachment(
    rng: &mut impl Rng,
    registry: &SceneRegistry,
    target: &str,
    structure: &crate::registry::RegisteredStructure,
    v2: &V2Attachment,
) -> Vec<DecorationPose> {
    // Anchor → base point and outward yaw.
    let (base, normal, base_y) = match v2.anchor {
        Anchor::Front | Anchor::Back | Anchor::Left | Anchor::Right => {
            let surface = match v2.anchor {
                Anchor::Front => Surface::Front,
                Anchor::Back => Surface::Back,
                Anchor::Left => Surface::Left,
                _ => Surface::Right,
            };
            let Some(sp) = registry.surface_position(target, surface, 0.5, 0.0) else {
                return Vec::new();
            };
            (sp.position, sp.normal, 0.0)
        }
        Anchor::Top => {
            let Some(sp) = registry.surface_position(target, Surface::Roof, 0.5, 0.5) else {
                return Vec::new();
            };
            (sp.position, sp.normal, sp.y)
        }
        Anchor::Center => (structure.position, structure.rotation, 0.0),
        Anchor::Perimeter => {
            let surface = [Surface::Front, Surface::Back, Surface::Left, Surface::Right]
                [rng.gen_range(0..4)];
            let h = rng.gen_range(0.1..0.9);
            let Some(sp) = registry.surface_position(target, surface, h, 0.0) else {
                return Vec::new();
            };
            (sp.position, sp.normal, 0.0)
        }
    };

    // [forward, sideways] in the anchor's local frame.
    let fwd = forward(normal);
    let right = rightward(normal);
    let anchored = Point2::new(
        base.x + fwd.x * v2.offset[0] + right.x * v2.offset[1],
        base.z + fwd.z * v2.offset[0] + right.z * v2.offset[1],
    );

    // height_ratio only applies to wall-mounted items. A forward offset
    // beyond 1 m means a ground item (furniture) that must stay at y = 0
    // no matter what height hint the plan carries.
    let y = if v2.anchor == Anchor::Top {
        base_y
    } else if v2.offset[0] <= 1.0 {
        v2.height_ratio.clamp(0.0, 1.0) * structure.bounds.height
    } else {
        0.0
    };

    let yaw = |rng: &mut dyn rand::RngCore, p: Point2| -> f32 {
        match v2.facing {
            FacingMode::TowardParent => yaw_toward(p, structure.position),
            FacingMode::Away => normal,
            FacingMode::Inherit => structure.rotation,
            FacingMode::Cardinal(angle) => angle,
            FacingMode::Random => rng.gen_range(0.0..TAU),
        }
    };

    let primary_facing = yaw(&mut *rng, anchored);
    let points: Vec<Point2> = match v2.arrange {
        ArrangeMode::Single => vec![anchored],
        ArrangeMode::Row => line_fan(anchored, rightward(primary_facing), v2.count, v2.spacing),
        ArrangeMode::Column => line_fan(anchored, forward(primary_facing), v2.count, v2.spacing),
        ArrangeMode::Cluster => cluster(rng, anchored, v2.count, v2.radius, 1.0),
        ArrangeMode::Grid => grid_fan(anchored, normal, v2.count, v2.spacing),
    };

    points
        .into_iter()
        .map(|p| DecorationPose { position: p, y, rotation: yaw(&mut *rng, p), tilt: None })
        .collect()
}

/// `count` points centered on `origin`, spread along `axis`.
fn line_fan(origin: Point2, axis: Point2, count: usize, spacing: f32) -> Vec<Point2> {
    (0..count.max(1))
        .map(|i| {
            let t = i as f32 - (count.max(1) - 1) as f32 / 2.0;
            Point2::new(origin.x + axis.x * t * spacing, origin.z + axis.z * t * spacing)
        })
        .collect()
}

/// Local 2-D grid rotated into the anchor frame, truncated to `count`.
fn grid_fan(origin: Point2, normal: f32, count: usize, spacing: f32) -> Vec<Point2> {
    let side = (count.max(1) as f32).sqrt().ceil() as usize;
    let fwd = forward(normal);
    let right = rightward(normal);
    let mut out = Vec::with_capacity(count);
    'rows: for r in 0..side {
        for c in 0..side {
            if out.len() >= count {
                break 'rows;
            }
            let u = c as f32 - (side - 1) as f32 / 2.0;
            let v = r as f32 - (side - 1) as f32 / 2.0;
            out.push(Point2::new(
                origin.x + (right.x * u + fwd.x * v) * spacing,
                origin.z + (right.z * u + fwd.z * v) * spacing,
            ));
        }
    }
    out
}

fn on_top_of(
    rng: &mut impl Rng,
    registry: &SceneRegistry,
    target: &str,
    deco_bounds: &Bounds,
    count: usize,
) -> Vec<DecorationPose> {
    (0..count.max(1))
        .filter_map(|_| {
            let h = rng.gen_range(0.3..0.7);
            let v = rng.gen_range(0.3..0.7);
            let sp = registry.surface_position(target, Surface::Roof, h, v)?;
            Some(DecorationPose {
                position: sp.position,
                y: sp.y + deco_bounds.height / 2.0,
                rotation: sp.normal + jitter(rng, 0.3),
                tilt: None,
            })
        })
        .collect()
}
