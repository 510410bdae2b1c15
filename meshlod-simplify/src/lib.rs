//! Mesh simplification for LOD generation.
//!
//! This crate reduces triangle meshes by iterative edge collapse driven by
//! quadric error metrics: every vertex accumulates the squared-distance
//! error of the planes of its incident faces, every edge is scored by the
//! summed quadric of its endpoints, and the cheapest topologically safe
//! collapse is applied until the configured error or size thresholds are
//! met.
//!
//! # Example
//!
//! ```
//! use meshlod_core::grid;
//! use meshlod_simplify::{simplify_mesh, SimplifyParams};
//!
//! let mesh = grid(8);
//! let params = SimplifyParams::with_target_triangles(24);
//! let lod = simplify_mesh(&mesh, &params).unwrap();
//! assert!(lod.triangle_count() <= mesh.triangle_count());
//! ```

pub mod params;
pub mod quadric;
pub mod solver;

mod adjacency;
mod compact;
mod simplify;

pub use params::{SimplifyParams, SimplifyStats};
pub use quadric::Quadric;
pub use simplify::{simplify_mesh, Simplifier};
