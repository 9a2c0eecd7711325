//! In-memory catalog of structures and arrangements placed so far.
//!
//! One registry lives per resolution pass and is passed explicitly through
//! the orchestrator — never a module-level singleton, so parallel test
//! passes cannot interfere. Surface and adjacency queries account for the
//! structure's yaw.

use std::collections::HashMap;

use crate::geometry::{forward, AssetCategory, Bounds, Point2};

/// One registered structure. Immutable after registration; identity is its
/// id and no two structures share an id within one pass.
#[derive(Debug, Clone)]
pub struct RegisteredStructure {
    pub position: Point2,
    pub rotation: f32,
    pub bounds: Bounds,
    pub category: AssetCategory,
}

/// A named group centroid recorded for later NPC/decoration lookups.
/// Not used for collision.
#[derive(Debug, Clone)]
pub struct Arrangement {
    pub center: Point2,
    pub radius: f32,
    pub item_positions: Vec<Point2>,
}

/// A face of a structure's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Front,
    Back,
    Left,
    Right,
    Roof,
}

impl Surface {
    /// Parse an open surface tag; `top` aliases `roof`.
    pub fn parse(s: &str) -> Option<Surface> {
        match s {
            "front" => Some(Surface::Front),
            "back" => Some(Surface::Back),
            "left" => Some(Surface::Left),
            "right" => Some(Surface::Right),
            "roof" | "top" => Some(Surface::Roof),
            _ => None,
        }
    }
}

/// A side for adjacency queries; `entrance` aliases `front`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Left,
    Right,
}

impl Side {
    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "front" | "entrance" => Some(Side::Front),
            "back" => Some(Side::Back),
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }

    /// Outward normal yaw offset from the structure's own rotation.
    fn normal_offset(self) -> f32 {
        use std::f32::consts::{FRAC_PI_2, PI};
        match self {
            Side::Front => 0.0,
            Side::Back => PI,
            Side::Left => -FRAC_PI_2,
            Side::Right => FRAC_PI_2,
        }
    }
}

/// A point on a structure face, with the outward-facing normal yaw so
/// callers can offset further outward or orient an attached decoration.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    pub position: Point2,
    pub y: f32,
    pub normal: f32,
}

/// A point beside a structure, facing back toward it.
#[derive(Debug, Clone, Copy)]
pub struct AdjacentPoint {
    pub position: Point2,
    pub facing: f32,
}

#[derive(Debug, Default)]
pub struct SceneRegistry {
    structures: HashMap<String, RegisteredStructure>,
    arrangements: HashMap<String, Arrangement>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores pose and footprint. Idempotent overwrite by id.
    pub fn register(&mut self, id: &str, structure: RegisteredStructure) {
        self.structures.insert(id.to_string(), structure);
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredStructure> {
        self.structures.get(id)
    }

    pub fn structures(&self) -> impl Iterator<Item = (&String, &RegisteredStructure)> {
        self.structures.iter()
    }

    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    pub fn register_arrangement(&mut self, name: &str, arrangement: Arrangement) {
        self.arrangements.insert(name.to_string(), arrangement);
    }

    pub fn arrangement(&self, name: &str) -> Option<&Arrangement> {
        self.arrangements.get(name)
    }

    /// Point on the named face of the structure's box, in world space.
    /// `horizontal` sweeps across the face as seen facing the surface
    /// (0 = left edge), `vertical` sweeps base (0) to full height (1).
    /// `Roof` returns a point on the top plane, `horizontal` across the
    /// width and `vertical` across the depth.
    pub fn surface_position(
        &self,
        id: &str,
        surface: Surface,
        horizontal: f32,
        vertical: f32,
    ) -> Option<SurfacePoint> {
        let s = self.structures.get(id)?;
        let h = horizontal.clamp(0.0, 1.0);
        let v = vertical.clamp(0.0, 1.0);
        let hw = s.bounds.width / 2.0;
        let hd = s.bounds.depth / 2.0;

        // Local frame: +z is the structure's forward (front face), +x its right.
        let (lx, lz, y, normal_offset) = match surface {
            Surface::Front => ((h - 0.5) * s.bounds.width, hd, v * s.bounds.height, 0.0),
            Surface::Back => (
                (0.5 - h) * s.bounds.width,
                -hd,
                v * s.bounds.height,
                std::f32::consts::PI,
            ),
            Surface::Left => (
                -hw,
                (h - 0.5) * s.bounds.depth,
                v * s.bounds.height,
                -std::f32::consts::FRAC_PI_2,
            ),
            Surface::Right => (
                hw,
                (0.5 - h) * s.bounds.depth,
                v * s.bounds.height,
                std::f32::consts::FRAC_PI_2,
            ),
            Surface::Roof => (
                (h - 0.5) * s.bounds.width,
                (v - 0.5) * s.bounds.depth,
                s.bounds.height,
                0.0,
            ),
        };

        Some(SurfacePoint {
            position: local_to_world(s.position, s.rotation, lx, lz),
            y,
            normal: s.rotation + normal_offset,
        })
    }

    /// Point `distance` beyond the named face's center, facing back toward
    /// the structure.
    pub fn adjacent_position(&self, id: &str, side: Side, distance: f32) -> Option<AdjacentPoint> {
        let s = self.structures.get(id)?;
        let half = match side {
            Side::Front | Side::Back => s.bounds.depth / 2.0,
            Side::Left | Side::Right => s.bounds.width / 2.0,
        };
        let normal = s.rotation + side.normal_offset();
        let out = forward(normal);
        let reach = half + distance;
        Some(AdjacentPoint {
            position: Point2::new(s.position.x + out.x * reach, s.position.z + out.z * reach),
            facing: normal + std::f32::consts::PI,
        })
    }
}

/// Rotate a structure-local offset into world space. Local +z maps to the
/// structure's forward vector, local +x to its right.
pub fn local_to_world(origin: Point2, rotation: f32, lx: f32, lz: f32) -> Point2 {
    let (sin, cos) = rotation.sin_cos();
    Point2::new(origin.x + lx * cos + lz * sin, origin.z - lx * sin + lz * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn registry_with(pos: Point2, rotation: f32) -> SceneRegistry {
        let mut reg = SceneRegistry::new();
        reg.register(
            "diner",
            RegisteredStructure {
                position: pos,
                rotation,
                bounds: Bounds::new(10.0, 6.0, 8.0),
                category: AssetCategory::Structure,
            },
        );
        reg
    }

    #[test]
    fn test_register_is_idempotent_overwrite() {
        let mut reg = registry_with(Point2::default(), 0.0);
        reg.register(
            "diner",
            RegisteredStructure {
                position: Point2::new(5.0, 5.0),
                rotation: 0.0,
                bounds: Bounds::new(4.0, 4.0, 4.0),
                category: AssetCategory::Structure,
            },
        );
        assert_eq!(reg.structure_count(), 1);
        assert_eq!(reg.get("diner").unwrap().position.x, 5.0);
    }

    #[test]
    fn test_get_missing_is_none() {
        let reg = registry_with(Point2::default(), 0.0);
        assert!(reg.get("saloon").is_none());
    }

    #[test]
    fn test_front_surface_center_unrotated() {
        // Front face is +z (south) for rotation 0; depth 8 → face at z = 4
        let reg = registry_with(Point2::default(), 0.0);
        let sp = reg.surface_position("diner", Surface::Front, 0.5, 0.5).unwrap();
        assert!(sp.position.x.abs() < 1e-5);
        assert!((sp.position.z - 4.0).abs() < 1e-5);
        assert!((sp.y - 3.0).abs() < 1e-5, "vertical 0.5 of height 6 is 3");
        assert!(sp.normal.abs() < 1e-5);
    }

    #[test]
    fn test_horizontal_sweeps_face() {
        let reg = registry_with(Point2::default(), 0.0);
        let left = reg.surface_position("diner", Surface::Front, 0.0, 0.0).unwrap();
        let right = reg.surface_position("diner", Surface::Front, 1.0, 0.0).unwrap();
        assert!((left.position.x - right.position.x).abs() > 9.9, "sweep spans the width");
        assert!((left.position.z - right.position.z).abs() < 1e-5);
    }

    #[test]
    fn test_side_face_sweep_starts_at_viewer_left() {
        // Facing the west wall the viewer looks +x, so their left is -z;
        // facing the east wall they look -x and their left is +z.
        let reg = registry_with(Point2::default(), 0.0);
        let left0 = reg.surface_position("diner", Surface::Left, 0.0, 0.0).unwrap();
        let left1 = reg.surface_position("diner", Surface::Left, 1.0, 0.0).unwrap();
        assert!((left0.position.z + 4.0).abs() < 1e-5, "left-face h=0 is the north end, got z {}", left0.position.z);
        assert!((left1.position.z - 4.0).abs() < 1e-5);

        let right0 = reg.surface_position("diner", Surface::Right, 0.0, 0.0).unwrap();
        assert!((right0.position.z - 4.0).abs() < 1e-5, "right-face h=0 is the south end, got z {}", right0.position.z);
    }

    #[test]
    fn test_surface_accounts_for_yaw() {
        // Facing east: front face normal points east (+x), face at x = +4
        let reg = registry_with(Point2::default(), FRAC_PI_2);
        let sp = reg.surface_position("diner", Surface::Front, 0.5, 0.0).unwrap();
        assert!((sp.position.x - 4.0).abs() < 1e-4, "front face moved to +x, got {:?}", sp.position);
        assert!(sp.position.z.abs() < 1e-4);
        assert!((sp.normal - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_roof_point_on_top_plane() {
        let reg = registry_with(Point2::new(2.0, 3.0), 0.0);
        let sp = reg.surface_position("diner", Surface::Roof, 0.5, 0.5).unwrap();
        assert!((sp.y - 6.0).abs() < 1e-5);
        assert!((sp.position.x - 2.0).abs() < 1e-5);
        assert!((sp.position.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_adjacent_faces_back_toward_structure() {
        let reg = registry_with(Point2::default(), 0.0);
        let ap = reg.adjacent_position("diner", Side::Front, 3.0).unwrap();
        // depth/2 + 3 = 7 south of center
        assert!((ap.position.z - 7.0).abs() < 1e-5);
        // facing north, back toward the structure
        let diff = (ap.facing - PI).abs();
        assert!(diff < 1e-5, "expected north facing, got {}", ap.facing);
    }

    #[test]
    fn test_entrance_aliases_front() {
        assert_eq!(Side::parse("entrance"), Some(Side::Front));
        assert_eq!(Surface::parse("top"), Some(Surface::Roof));
        assert_eq!(Surface::parse("chimney"), None);
    }

    #[test]
    fn test_arrangement_roundtrip() {
        let mut reg = SceneRegistry::new();
        reg.register_arrangement(
            "picnic",
            Arrangement {
                center: Point2::new(1.0, 2.0),
                radius: 5.0,
                item_positions: vec![Point2::new(0.0, 0.0)],
            },
        );
        let a = reg.arrangement("picnic").unwrap();
        assert_eq!(a.item_positions.len(), 1);
        assert!(reg.arrangement("campfire").is_none());
    }
}
