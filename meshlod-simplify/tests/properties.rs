//! End-to-end behavioral properties of the simplifier, checked on small
//! procedurally built meshes.

use meshlod_core::{grid, unit_cube, AttributeKind, Mesh, Point3f, VertexAttribute};
use meshlod_simplify::{simplify_mesh, Simplifier, SimplifyParams};
use std::collections::HashMap;

/// Interleave positions with a per-vertex texcoord mapping the grid onto
/// the unit square.
fn textured_grid(n: usize) -> Mesh {
    let base = grid(n);
    let extent = (n - 1) as f32;
    let mut vertices = Vec::with_capacity(base.vertex_count() * 5);
    for v in 0..base.vertex_count() {
        let p = base.position(v);
        vertices.extend_from_slice(&[p.x, p.y, p.z, p.x / extent, p.y / extent]);
    }
    Mesh::from_buffers(
        vertices,
        base.indices.clone(),
        5,
        vec![
            VertexAttribute {
                offset_floats: 0,
                kind: AttributeKind::Position,
            },
            VertexAttribute {
                offset_floats: 3,
                kind: AttributeKind::TexCoord,
            },
        ],
    )
}

/// Count triangle incidence per undirected edge.
fn edge_incidence(mesh: &Mesh) -> HashMap<(u32, u32), u32> {
    let mut counts = HashMap::new();
    for t in mesh.indices.chunks(3) {
        for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            let key = (a.min(b), a.max(b));
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

#[test]
fn default_params_leave_mesh_untouched() {
    let mesh = textured_grid(4);
    let out = simplify_mesh(&mesh, &SimplifyParams::default()).unwrap();
    assert_eq!(out.vertex_count(), mesh.vertex_count());
    assert_eq!(out.triangle_count(), mesh.triangle_count());
    assert_eq!(out.stride_floats, mesh.stride_floats);
    assert_eq!(out.vertices, mesh.vertices);
}

#[test]
fn triangle_count_tracks_collapses() {
    let mesh = grid(6);
    let sim = Simplifier::new(&mesh, SimplifyParams::with_target_triangles(16)).unwrap();
    let (out, stats) = sim.run_with_stats();
    assert_eq!(stats.input_triangles, mesh.triangle_count());
    assert_eq!(stats.output_triangles, out.triangle_count());
    assert!(stats.collapses > 0);
    // Each collapse drops one boundary or two interior triangles.
    let dropped = stats.input_triangles - stats.output_triangles;
    assert!(dropped >= stats.collapses);
    assert!(dropped <= 2 * stats.collapses);
}

#[test]
fn flat_mesh_stays_planar() {
    let mesh = grid(6);
    let out = simplify_mesh(&mesh, &SimplifyParams::with_max_error(1e-6)).unwrap();
    assert!(out.triangle_count() < mesh.triangle_count());
    // grid(6) spans 0..=5 in x and y.
    for v in 0..out.vertex_count() {
        let p = out.position(v);
        assert!(p.z.abs() < 1e-6);
        assert!((-1e-4..=5.0 + 1e-4).contains(&p.x));
        assert!((-1e-4..=5.0 + 1e-4).contains(&p.y));
    }
}

#[test]
fn closed_mesh_stays_manifold() {
    let cube = unit_cube();
    let out = simplify_mesh(&cube, &SimplifyParams::with_max_error(10.0)).unwrap();
    assert!(out.triangle_count() < cube.triangle_count());
    assert!(out.vertex_count() >= 5);
    // A closed input stays closed: every surviving edge borders exactly
    // two triangles.
    for (&edge, &count) in &edge_incidence(&out) {
        assert_eq!(count, 2, "edge {edge:?} has incidence {count}");
    }
}

#[test]
fn boundary_corners_survive_interior_collapses() {
    // Interior collapses are free on a flat grid while boundary vertices
    // carry the open-edge penalty, so a mild triangle budget is met from
    // the interior first.
    let mesh = grid(4);
    let out = simplify_mesh(&mesh, &SimplifyParams::with_target_triangles(12)).unwrap();
    assert!(out.triangle_count() <= 12);
    // grid(4) spans 0..=3, so these are its four extreme corners.
    for corner in [
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(3.0, 0.0, 0.0),
        Point3f::new(0.0, 3.0, 0.0),
        Point3f::new(3.0, 3.0, 0.0),
    ] {
        let found = (0..out.vertex_count())
            .any(|v| (out.position(v) - corner).norm() < 1e-5);
        assert!(found, "corner {corner:?} was collapsed away");
    }
}

#[test]
fn attributes_follow_collapsed_vertices() {
    let mesh = textured_grid(6);
    let out = simplify_mesh(&mesh, &SimplifyParams::with_target_triangles(20)).unwrap();
    assert!(out.triangle_count() < mesh.triangle_count());
    assert_eq!(out.stride_floats, 5);
    assert_eq!(out.attributes, mesh.attributes);
    // Texcoords were seeded on the unit square and interpolate linearly
    // along collapsed edges, so they stay inside it.
    for v in 0..out.vertex_count() {
        let data = out.vertex(v);
        assert!((-1e-4..=1.0 + 1e-4).contains(&data[3]));
        assert!((-1e-4..=1.0 + 1e-4).contains(&data[4]));
    }
}

#[test]
fn vertex_budget_is_met_or_floored() {
    let mesh = grid(5);
    let sim = Simplifier::new(&mesh, SimplifyParams::with_target_vertices(8)).unwrap();
    let (out, stats) = sim.run_with_stats();
    assert!(out.vertex_count() >= 5);
    assert!(out.vertex_count() < mesh.vertex_count());
    assert_eq!(
        mesh.vertex_count() - out.vertex_count(),
        stats.collapses
    );
}
