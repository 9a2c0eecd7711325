//! Pure scene placement logic for Setpiece.
//!
//! This crate turns qualitative scene plans ("a diner facing the camera,
//! a neon sign on its front wall, cacti scattered around") into concrete
//! world transforms. It is independent of any database, engine, or
//! runtime: functions take plain data plus a caller-supplied RNG and
//! return results, making them unit-testable and portable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`arrangements`] | Multi-item group layout (cluster, grid, row, circle) |
//! | [`atmosphere`] | Ambient fill: flanking, along, scattered, framing |
//! | [`constants`] | Working zone, facing yaws, tuning profiles |
//! | [`decorations`] | Structure-relative placement (attach, adjacent, lean, hang) |
//! | [`geometry`] | Ground-plane math, bounds, footprint collision tests |
//! | [`npcs`] | Character placement relative to structures and arrangements |
//! | [`plan`] | Scene plan input model and placement output types |
//! | [`registry`] | Per-pass catalog of placed structures and arrangements |
//! | [`resolve`] | Five-phase orchestrator producing the placement list |
//! | [`sampling`] | Poisson-disk, cluster, ring, edge-band, grid sampling |
//! | [`structures`] | Structure positioning and spiral collision resolution |

pub mod arrangements;
pub mod atmosphere;
pub mod constants;
pub mod decorations;
pub mod geometry;
pub mod npcs;
pub mod plan;
pub mod registry;
pub mod resolve;
pub mod sampling;
pub mod structures;
