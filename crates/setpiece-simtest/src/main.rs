//! Setpiece Headless Resolution Harness
//!
//! Validates the placement engine against a bundled demo plan without any
//! engine or rendering. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p setpiece-simtest
//!   cargo run -p setpiece-simtest -- --verbose

use rand::rngs::StdRng;
use rand::SeedableRng;

use setpiece_logic::geometry::{
    footprints_overlap, point_in_footprint, working_zone, Bounds, Point2,
};
use setpiece_logic::plan::{AssetLookup, PlacementKind, Plan};
use setpiece_logic::registry::{RegisteredStructure, SceneRegistry, Side, Surface};
use setpiece_logic::resolve::{resolve_scene, SceneResolution};
use setpiece_logic::sampling::{cluster, poisson_disk, ring};

// ── Demo scene (same JSON a generation service would send) ──────────────
const PLAN_JSON: &str = include_str!("../../../data/demo_plan.json");
const ASSETS_JSON: &str = include_str!("../../../data/demo_assets.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Setpiece Resolution Harness ===\n");

    let mut results = Vec::new();

    // 1. Demo plan and asset table parse
    results.extend(validate_demo_data(verbose));

    // 2. Sampling invariants
    results.extend(validate_sampling(verbose));

    // 3. Registry surface/adjacency math
    results.extend(validate_registry(verbose));

    // 4. Full pipeline over the demo plan
    results.extend(validate_pipeline(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_demo() -> Option<(Plan, AssetLookup)> {
    let plan: Plan = serde_json::from_str(PLAN_JSON).ok()?;
    let assets: AssetLookup = serde_json::from_str(ASSETS_JSON).ok()?;
    Some((plan, assets))
}

fn resolve_demo(seed: u64) -> Option<SceneResolution> {
    let (plan, assets) = load_demo()?;
    let mut rng = StdRng::seed_from_u64(seed);
    Some(resolve_scene(
        &mut rng,
        &plan,
        &assets,
        &std::collections::HashMap::new(),
        &[],
    ))
}

// ── 1. Demo data ────────────────────────────────────────────────────────

fn validate_demo_data(_verbose: bool) -> Vec<TestResult> {
    println!("--- Demo Data ---");
    let mut results = Vec::new();

    let plan: Result<Plan, _> = serde_json::from_str(PLAN_JSON);
    let assets: Result<AssetLookup, _> = serde_json::from_str(ASSETS_JSON);

    results.push(TestResult {
        name: "plan_parse".into(),
        passed: plan.is_ok(),
        detail: match &plan {
            Ok(p) => format!(
                "{} structures, {} decorations, {} arrangements, {} atmosphere, {} npcs",
                p.structures.len(),
                p.decorations.len(),
                p.arrangements.len(),
                p.atmosphere.len(),
                p.npcs.len()
            ),
            Err(e) => format!("JSON parse error: {}", e),
        },
    });

    results.push(TestResult {
        name: "assets_parse".into(),
        passed: assets.is_ok(),
        detail: match &assets {
            Ok(a) => format!("{} assets", a.len()),
            Err(e) => format!("JSON parse error: {}", e),
        },
    });

    if let (Ok(plan), Ok(assets)) = (plan, assets) {
        // Every prompt the plan references must resolve to an asset
        let mut missing = Vec::new();
        for s in &plan.structures {
            if !assets.contains_key(&s.prompt) {
                missing.push(s.prompt.clone());
            }
        }
        for d in &plan.decorations {
            if !assets.contains_key(&d.prompt) {
                missing.push(d.prompt.clone());
            }
        }
        for a in &plan.arrangements {
            for item in &a.items {
                if !assets.contains_key(&item.prompt) {
                    missing.push(item.prompt.clone());
                }
            }
        }
        results.push(TestResult {
            name: "all_prompts_resolve".into(),
            passed: missing.is_empty(),
            detail: if missing.is_empty() {
                "every plan prompt has an asset".into()
            } else {
                format!("unresolved prompts: {:?}", missing)
            },
        });
    }

    results
}

// ── 2. Sampling ─────────────────────────────────────────────────────────

fn validate_sampling(_verbose: bool) -> Vec<TestResult> {
    println!("--- Sampling ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(7);

    let points = poisson_disk(&mut rng, &working_zone(), 60, 5.0);
    let mut min_pair = f32::MAX;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            min_pair = min_pair.min(points[i].distance(points[j]));
        }
    }
    results.push(TestResult {
        name: "poisson_min_distance".into(),
        passed: points.len() > 10 && min_pair >= 5.0 - 1e-3,
        detail: format!("{} points, closest pair {:.2}", points.len(), min_pair),
    });

    let ring_points = ring(&mut rng, Point2::default(), 8, 6.0, 0.5);
    results.push(TestResult {
        name: "ring_exact_count".into(),
        passed: ring_points.len() == 8,
        detail: format!("{} of 8 ring points", ring_points.len()),
    });

    let clustered = cluster(&mut rng, Point2::default(), 6, 10.0, 2.0);
    let in_radius = clustered
        .iter()
        .all(|p| Point2::default().distance(*p) <= 10.0 + 1e-3);
    results.push(TestResult {
        name: "cluster_within_radius".into(),
        passed: in_radius,
        detail: format!("{} cluster points inside radius 10", clustered.len()),
    });

    results
}

// ── 3. Registry ─────────────────────────────────────────────────────────

fn validate_registry(_verbose: bool) -> Vec<TestResult> {
    println!("--- Registry ---");
    let mut results = Vec::new();

    let mut reg = SceneRegistry::new();
    reg.register(
        "diner",
        RegisteredStructure {
            position: Point2::default(),
            rotation: 0.0,
            bounds: Bounds::new(10.0, 6.0, 8.0),
            category: setpiece_logic::geometry::AssetCategory::Structure,
        },
    );

    let front = reg.surface_position("diner", Surface::Front, 0.5, 0.5);
    let front_ok = front
        .map(|sp| (sp.position.z - 4.0).abs() < 1e-4 && (sp.y - 3.0).abs() < 1e-4)
        .unwrap_or(false);
    results.push(TestResult {
        name: "surface_front_center".into(),
        passed: front_ok,
        detail: "front face at depth/2, mid height".into(),
    });

    let adj = reg.adjacent_position("diner", Side::Left, 3.0);
    let adj_ok = adj
        .map(|a| (a.position.x + 8.0).abs() < 1e-4 && a.position.z.abs() < 1e-4)
        .unwrap_or(false);
    results.push(TestResult {
        name: "adjacent_left_offset".into(),
        passed: adj_ok,
        detail: "left adjacency at width/2 + distance".into(),
    });

    results
}

// ── 4. Pipeline ─────────────────────────────────────────────────────────

fn validate_pipeline(verbose: bool) -> Vec<TestResult> {
    println!("--- Pipeline ---");
    let mut results = Vec::new();

    let Some(out) = resolve_demo(42) else {
        results.push(TestResult {
            name: "pipeline_ran".into(),
            passed: false,
            detail: "demo data failed to load".into(),
        });
        return results;
    };

    let count = |kind: PlacementKind| out.placements.iter().filter(|p| p.kind == kind).count();

    results.push(TestResult {
        name: "all_structures_placed".into(),
        passed: count(PlacementKind::Structure) == 3,
        detail: format!("{} of 3 structures", count(PlacementKind::Structure)),
    });

    results.push(TestResult {
        name: "all_npcs_placed".into(),
        passed: count(PlacementKind::Npc) == 3,
        detail: format!("{} of 3 npcs", count(PlacementKind::Npc)),
    });

    results.push(TestResult {
        name: "arrangement_complete".into(),
        passed: count(PlacementKind::Arrangement) == 5,
        detail: format!("{} of 5 patio items", count(PlacementKind::Arrangement)),
    });

    let no_flagged = out.placements.iter().all(|p| !p.unresolved_overlap);
    results.push(TestResult {
        name: "no_unresolved_overlap".into(),
        passed: no_flagged,
        detail: if no_flagged {
            "spiral search cleared every structure".into()
        } else {
            "at least one structure flagged".into()
        },
    });

    // Structure footprints pairwise clear (estimated 0.8 ratio of size).
    let sizes = [("bld_diner_01", 14.0_f32), ("bld_gas_02", 12.0), ("bld_tower_01", 8.0)];
    let structures: Vec<(Point2, Bounds)> = out
        .placements
        .iter()
        .filter(|p| p.kind == PlacementKind::Structure)
        .map(|p| {
            let size = sizes
                .iter()
                .find(|(id, _)| *id == p.library_id)
                .map(|(_, s)| *s)
                .unwrap_or(10.0);
            (
                Point2::new(p.position[0], p.position[2]),
                Bounds::new(size * 0.8, 1.0, size * 0.8),
            )
        })
        .collect();
    let mut overlaps = 0;
    for i in 0..structures.len() {
        for j in (i + 1)..structures.len() {
            if footprints_overlap(&structures[i].1, structures[i].0, &structures[j].1, structures[j].0, 0.0)
            {
                overlaps += 1;
            }
        }
    }
    results.push(TestResult {
        name: "structures_pairwise_clear".into(),
        passed: overlaps == 0,
        detail: format!("{} overlapping pairs", overlaps),
    });

    // Scattered cacti stay out of every structure footprint.
    let mut intrusions = 0;
    for p in out.placements.iter().filter(|p| p.library_id == "nat_cactus_saguaro") {
        let pos = Point2::new(p.position[0], p.position[2]);
        for (spos, sbounds) in &structures {
            if point_in_footprint(pos, sbounds, *spos, 0.0) {
                intrusions += 1;
            }
        }
    }
    results.push(TestResult {
        name: "scatter_avoids_structures".into(),
        passed: intrusions == 0,
        detail: format!("{} cacti inside footprints", intrusions),
    });

    // Same seed, same output.
    let again = resolve_demo(42).map(|r| r.placements);
    let deterministic = again
        .as_ref()
        .map(|b| {
            b.len() == out.placements.len()
                && b.iter()
                    .zip(&out.placements)
                    .all(|(x, y)| x.position == y.position && x.library_id == y.library_id)
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "seeded_determinism".into(),
        passed: deterministic,
        detail: format!("{} placements reproduced", out.placements.len()),
    });

    if verbose {
        for p in &out.placements {
            println!(
                "    {:?} {} at ({:.1}, {:.1}, {:.1}) yaw {:.2}",
                p.kind, p.library_id, p.position[0], p.position[1], p.position[2], p.rotation
            );
        }
    }

    results
}
