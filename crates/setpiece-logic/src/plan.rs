//! Scene plan input model and the resolver's output types.
//!
//! A `Plan` is what the content-generation collaborator hands us: five
//! ordered sequences of entries, each referencing an asset by a free-text
//! prompt key. Relationship, anchor, pattern, and facing tags arrive as
//! open strings here; each resolver converts them to a closed enum at its
//! own parsing boundary so the vocabulary can grow without crashing older
//! resolvers — unknown tags warn and contribute zero placements.

use std::collections::HashMap;

use serde::Deserialize;

use crate::geometry::{AssetCategory, Bounds};

fn default_scale() -> f32 {
    1.0
}

fn default_item_count() -> usize {
    1
}

fn default_arrangement_radius() -> f32 {
    6.0
}

/// The resolver's input: five ordered sequences, resolved in this order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub structures: Vec<StructureSpec>,
    #[serde(default)]
    pub decorations: Vec<DecorationSpec>,
    #[serde(default)]
    pub arrangements: Vec<ArrangementSpec>,
    #[serde(default)]
    pub atmosphere: Vec<AtmosphereSpec>,
    #[serde(default)]
    pub npcs: Vec<NpcSpec>,
}

/// Where a structure wants to stand. Explicit coordinates are trusted and
/// clamped into the working zone; keywords map to fixed offsets from the
/// zone center; `relative_to` delegates to the registry adjacency query.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PositionSpec {
    Explicit([f32; 2]),
    Relative {
        relative_to: String,
        #[serde(default)]
        side: Option<String>,
        #[serde(default)]
        distance: Option<f32>,
    },
    Named(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructureSpec {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub position: Option<PositionSpec>,
    #[serde(default)]
    pub facing: Option<String>,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecorationSpec {
    pub prompt: String,
    /// Id of the structure this decoration relates to.
    pub target: String,
    /// Open relationship tag: attached_to, adjacent_to, leaning_against,
    /// hanging_from, v2_attachment, on_top_of, ...
    pub relationship: String,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    /// Fraction across a face; resolvers fall back to the face center.
    #[serde(default)]
    pub horizontal: Option<f32>,
    #[serde(default)]
    pub vertical: f32,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub mirrored: bool,
    #[serde(default)]
    pub distance: Option<f32>,
    #[serde(default)]
    pub tilt_degrees: Option<f32>,
    #[serde(default)]
    pub drop: Option<f32>,
    // v2_attachment fields
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub offset: Option<[f32; 2]>,
    #[serde(default)]
    pub height_ratio: Option<f32>,
    #[serde(default)]
    pub facing: Option<String>,
    #[serde(default)]
    pub arrangement: Option<String>,
    #[serde(default)]
    pub spacing: Option<f32>,
    #[serde(default)]
    pub radius: Option<f32>,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArrangementItem {
    pub prompt: String,
    #[serde(default = "default_item_count")]
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArrangementSpec {
    pub name: String,
    /// Open pattern tag: cluster, grid, row, circle. Unknown patterns fall
    /// back to cluster.
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub items: Vec<ArrangementItem>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub distance: Option<f32>,
    #[serde(default = "default_arrangement_radius")]
    pub radius: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtmosphereSpec {
    pub prompt: String,
    /// Open relationship tag: flanking, along, scattered, framing,
    /// adjacent_to, ...
    pub relationship: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    /// sparse | medium | high
    #[serde(default)]
    pub density: Option<String>,
    /// "everywhere" (default), "edges", or a structure id to scatter around.
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub from: Option<[f32; 2]>,
    #[serde(default)]
    pub to: Option<[f32; 2]>,
    #[serde(default)]
    pub between: Option<[String; 2]>,
    /// String form "id.side" for following one structure edge.
    #[serde(default)]
    pub along: Option<String>,
    #[serde(default)]
    pub avoid_structures: bool,
    #[serde(default)]
    pub min_distance: Option<f32>,
    #[serde(default)]
    pub spacing: Option<f32>,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpcSpec {
    pub prompt: String,
    /// Structure id or arrangement name.
    #[serde(default)]
    pub target: Option<String>,
    /// Open relationship tag: at_entrance, near, within.
    #[serde(default)]
    pub relationship: String,
    /// Spreads multiple NPCs sharing one reference point, applied
    /// perpendicular to the resolved facing.
    #[serde(default)]
    pub lateral_offset: f32,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default = "default_scale")]
    pub scale: f32,
}

// ── Asset resolution inputs ─────────────────────────────────────────────

/// What the caller-supplied prompt lookup yields for one asset.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetInfo {
    pub library_id: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Real-world size in world units, when the generation pipeline knows it.
    #[serde(default)]
    pub real_world_size: Option<f32>,
    #[serde(default)]
    pub category: AssetCategory,
}

/// prompt → asset lookup supplied by the content-generation collaborator.
pub type AssetLookup = HashMap<String, AssetInfo>;

/// library_id → measured bounds in normalized asset-local units, supplied
/// by the measurement collaborator. Scaled by the world scale when used.
pub type MeasuredBounds = HashMap<String, Bounds>;

// ── Output ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Structure,
    Decoration,
    Arrangement,
    Atmosphere,
    Npc,
}

/// One resolved element. Immutable once appended; the output list keeps
/// insertion order for deterministic downstream rendering.
#[derive(Debug, Clone)]
pub struct Placement {
    pub library_id: String,
    pub position: [f32; 3],
    pub rotation: f32,
    pub scale: f32,
    pub kind: PlacementKind,
    /// Extra lean rotation in radians, for the consumer to apply on a
    /// second axis (leaning decorations only).
    pub tilt: Option<f32>,
    /// Behavior tag passed through for NPC placements.
    pub behavior: Option<String>,
    /// Set when the spiral search exhausted its budget and the structure
    /// was placed with possible residual overlap. Non-fatal diagnostic.
    pub unresolved_overlap: bool,
}

impl Placement {
    pub fn new(library_id: &str, position: [f32; 3], rotation: f32, scale: f32, kind: PlacementKind) -> Self {
        Placement {
            library_id: library_id.to_string(),
            position,
            rotation,
            scale,
            kind,
            tilt: None,
            behavior: None,
            unresolved_overlap: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parses_minimal_json() {
        let plan: Plan = serde_json::from_str(r#"{"structures": [{"id": "diner", "prompt": "a 50s diner"}]}"#).unwrap();
        assert_eq!(plan.structures.len(), 1);
        assert!(plan.decorations.is_empty());
        assert_eq!(plan.structures[0].scale, 1.0);
    }

    #[test]
    fn test_position_spec_forms() {
        let explicit: StructureSpec =
            serde_json::from_str(r#"{"id": "a", "prompt": "p", "position": [3.0, -4.0]}"#).unwrap();
        assert!(matches!(explicit.position, Some(PositionSpec::Explicit([x, z])) if x == 3.0 && z == -4.0));

        let named: StructureSpec =
            serde_json::from_str(r#"{"id": "a", "prompt": "p", "position": "northeast"}"#).unwrap();
        assert!(matches!(named.position, Some(PositionSpec::Named(ref s)) if s == "northeast"));

        let relative: StructureSpec = serde_json::from_str(
            r#"{"id": "a", "prompt": "p", "position": {"relative_to": "diner", "side": "left", "distance": 8.0}}"#,
        )
        .unwrap();
        assert!(matches!(relative.position, Some(PositionSpec::Relative { .. })));
    }

    #[test]
    fn test_decoration_defaults() {
        let spec: DecorationSpec = serde_json::from_str(
            r#"{"prompt": "neon sign", "target": "diner", "relationship": "attached_to", "surface": "front"}"#,
        )
        .unwrap();
        assert_eq!(spec.horizontal, None);
        assert_eq!(spec.vertical, 0.0);
        assert!(!spec.mirrored);
    }

    #[test]
    fn test_arrangement_item_count_default() {
        let spec: ArrangementSpec = serde_json::from_str(
            r#"{"name": "picnic", "pattern": "circle", "items": [{"prompt": "chair", "count": 4}, {"prompt": "table"}]}"#,
        )
        .unwrap();
        assert_eq!(spec.items[0].count, 4);
        assert_eq!(spec.items[1].count, 1);
        assert_eq!(spec.radius, 6.0);
    }
}
