//! Mesh adjacency for edge-collapse decimation.
//!
//! Every triangle is logically stored three times, once per incident vertex,
//! as a [`Corner`] recording the other two vertices in winding order. That
//! arena-plus-index layout buys O(1) incident-triangle iteration at the cost
//! of triplicated storage; output emission deduplicates by emitting each
//! triangle only from its minimum-index owner.
//!
//! Edges live in a flat arena, addressed through a hash map keyed by the
//! normalized `(low, high)` vertex pair. Insertion is find-or-create plus a
//! reference-count bump, never an overwrite; a count climbing past 2 flags
//! the record non-manifold instead of creating a duplicate.

use meshlod_core::Point3f;
use std::collections::HashMap;

/// One triangle as seen from its owning vertex: the other two vertex
/// indices, in winding order. Triangle `(owner, a, b)` has the original
/// face orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Corner {
    pub a: u32,
    pub b: u32,
}

/// Authoritative state of one candidate collapse edge.
#[derive(Debug, Clone)]
pub(crate) struct EdgeRecord {
    /// Normalized endpoints, `v0 < v1`.
    pub v0: u32,
    pub v1: u32,
    /// Number of live triangles referencing this edge.
    pub ref_count: u32,
    /// Cached best collapse position.
    pub candidate: Point3f,
    /// Cached collapse error at `candidate`.
    pub error: f64,
    /// Interpolation factor of `candidate` along v0 -> v1, for attributes.
    pub lerp: f32,
    /// Collapse keeps v0 when true, v1 otherwise.
    pub keep_low: bool,
    pub collapsed: bool,
    pub non_manifold: bool,
}

impl EdgeRecord {
    fn new(v0: u32, v1: u32) -> Self {
        Self {
            v0,
            v1,
            ref_count: 0,
            candidate: Point3f::origin(),
            error: 0.0,
            lerp: 0.0,
            keep_low: true,
            collapsed: false,
            non_manifold: false,
        }
    }

    /// Open (boundary) edges are referenced by fewer than 2 triangles.
    pub fn is_open(&self) -> bool {
        self.ref_count < 2
    }
}

/// Normalize a vertex pair to `(low, high)`.
pub(crate) fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Per-vertex triangle fans plus the edge arena and its hash map.
pub(crate) struct Adjacency {
    pub fans: Vec<Vec<Corner>>,
    pub edges: Vec<EdgeRecord>,
    pub edge_map: HashMap<(u32, u32), u32>,
}

impl Adjacency {
    /// Build adjacency from a triangle index buffer.
    ///
    /// Degenerate (repeated-index) triangles are a caller precondition,
    /// checked in debug builds only.
    pub fn build(indices: &[u32], vertex_count: usize) -> Self {
        let triangle_count = indices.len() / 3;
        let mut adj = Adjacency {
            fans: vec![Vec::new(); vertex_count],
            edges: Vec::with_capacity(triangle_count * 2),
            edge_map: HashMap::with_capacity(triangle_count * 2),
        };

        for tri in indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
            debug_assert!(
                i0 != i1 && i1 != i2 && i0 != i2,
                "degenerate input triangle ({}, {}, {})",
                i0,
                i1,
                i2
            );
            adj.fans[i0 as usize].push(Corner { a: i1, b: i2 });
            adj.fans[i1 as usize].push(Corner { a: i2, b: i0 });
            adj.fans[i2 as usize].push(Corner { a: i0, b: i1 });

            adj.reference_edge(i0, i1);
            adj.reference_edge(i1, i2);
            adj.reference_edge(i2, i0);
        }

        adj
    }

    /// Find-or-create the record for a pair and bump its reference count.
    fn reference_edge(&mut self, a: u32, b: u32) {
        let key = edge_key(a, b);
        let edges = &mut self.edges;
        let idx = *self.edge_map.entry(key).or_insert_with(|| {
            edges.push(EdgeRecord::new(key.0, key.1));
            (edges.len() - 1) as u32
        });
        let rec = &mut edges[idx as usize];
        rec.ref_count += 1;
        if rec.ref_count > 2 {
            rec.non_manifold = true;
        }
    }

    /// Look up the live record index for a pair.
    pub fn edge_index(&self, a: u32, b: u32) -> Option<u32> {
        self.edge_map.get(&edge_key(a, b)).copied()
    }

    /// Distinct 1-ring of a vertex, collected from its fan.
    pub fn neighbors(&self, v: u32) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.fans[v as usize].len() * 2);
        for corner in &self.fans[v as usize] {
            if !out.contains(&corner.a) {
                out.push(corner.a);
            }
            if !out.contains(&corner.b) {
                out.push(corner.b);
            }
        }
        out
    }

    /// Number of live triangle copies owned by `v` that reference `w`.
    pub fn fan_edge_refs(&self, v: u32, w: u32) -> u32 {
        self.fans[v as usize]
            .iter()
            .filter(|c| c.a == w || c.b == w)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlod_core::{grid, unit_cube};

    #[test]
    fn test_fan_copies_triple_count() {
        let cube = unit_cube();
        let adj = Adjacency::build(&cube.indices, cube.vertex_count());
        let copies: usize = adj.fans.iter().map(Vec::len).sum();
        assert_eq!(copies, cube.triangle_count() * 3);
    }

    #[test]
    fn test_closed_mesh_has_no_open_edges() {
        let cube = unit_cube();
        let adj = Adjacency::build(&cube.indices, cube.vertex_count());
        // Cube: E = V + F - 2 = 8 + 12 - 2 = 18
        assert_eq!(adj.edges.len(), 18);
        for edge in &adj.edges {
            assert_eq!(edge.ref_count, 2);
            assert!(!edge.is_open());
            assert!(!edge.non_manifold);
        }
    }

    #[test]
    fn test_grid_boundary_edges_open() {
        let mesh = grid(3);
        let adj = Adjacency::build(&mesh.indices, mesh.vertex_count());
        let open = adj.edges.iter().filter(|e| e.is_open()).count();
        // 3x3 grid perimeter: 8 boundary edges.
        assert_eq!(open, 8);
    }

    #[test]
    fn test_edge_keys_normalized() {
        let mesh = grid(3);
        let adj = Adjacency::build(&mesh.indices, mesh.vertex_count());
        for edge in &adj.edges {
            assert!(edge.v0 < edge.v1);
        }
        assert_eq!(adj.edge_index(1, 0), adj.edge_index(0, 1));
    }

    #[test]
    fn test_non_manifold_flagged_not_duplicated() {
        // Three triangles sharing edge (0, 1).
        let indices = vec![0, 1, 2, 1, 0, 3, 0, 1, 4];
        let adj = Adjacency::build(&indices, 5);
        let idx = adj.edge_index(0, 1).unwrap();
        let rec = &adj.edges[idx as usize];
        assert_eq!(rec.ref_count, 3);
        assert!(rec.non_manifold);
        // Still exactly one record for the pair.
        assert_eq!(
            adj.edges.iter().filter(|e| e.v0 == 0 && e.v1 == 1).count(),
            1
        );
    }

    #[test]
    fn test_neighbors() {
        let mesh = grid(3);
        let adj = Adjacency::build(&mesh.indices, mesh.vertex_count());
        // Center vertex of a 3x3 grid touches 6 of its 8 ring neighbors.
        let mut ring = adj.neighbors(4);
        ring.sort_unstable();
        assert_eq!(ring, vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn test_fan_corner_winding() {
        let indices = vec![2, 5, 9];
        let adj = Adjacency::build(&indices, 10);
        assert_eq!(adj.fans[2][0], Corner { a: 5, b: 9 });
        assert_eq!(adj.fans[5][0], Corner { a: 9, b: 2 });
        assert_eq!(adj.fans[9][0], Corner { a: 2, b: 5 });
    }
}
