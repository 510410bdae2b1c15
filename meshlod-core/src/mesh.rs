//! Mesh data structures and functionality
//!
//! A [`Mesh`] is a plain value: one interleaved `f32` vertex buffer with a
//! fixed per-vertex stride, a declared attribute layout, and a `u32` triangle
//! index buffer. Attribute slot 0 must be a 3-float position at offset 0;
//! this is a precondition checked in debug builds only.

use crate::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};

/// The semantic of one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// 3-float position. Required in slot 0 at offset 0.
    Position,
    /// 3-float normal.
    Normal,
    /// 2-float texture coordinate.
    TexCoord,
    /// 4-float color.
    Color,
    /// Uninterpreted float data.
    UserData,
}

impl AttributeKind {
    /// Number of floats this attribute occupies.
    pub fn float_count(&self) -> usize {
        match self {
            AttributeKind::Position => 3,
            AttributeKind::Normal => 3,
            AttributeKind::TexCoord => 2,
            AttributeKind::Color => 4,
            AttributeKind::UserData => 1,
        }
    }
}

/// One entry of a mesh's vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexAttribute {
    /// Offset of this attribute within a vertex, in floats.
    pub offset_floats: usize,
    /// What the floats at that offset mean.
    pub kind: AttributeKind,
}

impl VertexAttribute {
    pub fn new(offset_floats: usize, kind: AttributeKind) -> Self {
        Self {
            offset_floats,
            kind,
        }
    }
}

/// An indexed triangle mesh with an interleaved vertex buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    /// Interleaved vertex data, `stride_floats` floats per vertex.
    pub vertices: Vec<f32>,
    /// Triangle list indices, three per triangle.
    pub indices: Vec<u32>,
    /// Floats per vertex.
    pub stride_floats: usize,
    /// Attribute layout. Slot 0 is always a 3-float position at offset 0.
    pub attributes: Vec<VertexAttribute>,
}

impl Mesh {
    /// Create a mesh from raw buffers and an explicit layout.
    pub fn from_buffers(
        vertices: Vec<f32>,
        indices: Vec<u32>,
        stride_floats: usize,
        attributes: Vec<VertexAttribute>,
    ) -> Self {
        debug_assert!(stride_floats >= 3);
        debug_assert!(vertices.len() % stride_floats == 0);
        debug_assert!(indices.len() % 3 == 0);
        debug_assert!(
            matches!(
                attributes.first(),
                Some(VertexAttribute {
                    offset_floats: 0,
                    kind: AttributeKind::Position,
                })
            ),
            "attribute slot 0 must be a 3-float position at offset 0"
        );
        Self {
            vertices,
            indices,
            stride_floats,
            attributes,
        }
    }

    /// Create a position-only mesh.
    pub fn with_positions(positions: Vec<Point3f>, indices: Vec<u32>) -> Self {
        let mut vertices = Vec::with_capacity(positions.len() * 3);
        for p in &positions {
            vertices.extend_from_slice(&[p.x, p.y, p.z]);
        }
        Self::from_buffers(
            vertices,
            indices,
            3,
            vec![VertexAttribute::new(0, AttributeKind::Position)],
        )
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        if self.stride_floats == 0 {
            return 0;
        }
        self.vertices.len() / self.stride_floats
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if the mesh has no vertices or no triangles.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// All floats of one vertex.
    pub fn vertex(&self, index: usize) -> &[f32] {
        let start = index * self.stride_floats;
        &self.vertices[start..start + self.stride_floats]
    }

    /// Position of one vertex (attribute slot 0).
    pub fn position(&self, index: usize) -> Point3f {
        let v = self.vertex(index);
        Point3f::new(v[0], v[1], v[2])
    }

    /// Overwrite the position of one vertex.
    pub fn set_position(&mut self, index: usize, p: Point3f) {
        let start = index * self.stride_floats;
        self.vertices[start] = p.x;
        self.vertices[start + 1] = p.y;
        self.vertices[start + 2] = p.z;
    }

    /// Axis-aligned bounds over all vertex positions, or `None` when empty.
    pub fn bounds(&self) -> Option<(Point3f, Point3f)> {
        if self.vertex_count() == 0 {
            return None;
        }
        let mut min = self.position(0);
        let mut max = min;
        for i in 1..self.vertex_count() {
            let p = self.position(i);
            for c in 0..3 {
                min[c] = min[c].min(p[c]);
                max[c] = max[c].max(p[c]);
            }
        }
        Some((min, max))
    }

    /// Face normal of one triangle (unnormalized cross product).
    pub fn face_normal(&self, tri: usize) -> Vector3f {
        let i0 = self.indices[tri * 3] as usize;
        let i1 = self.indices[tri * 3 + 1] as usize;
        let i2 = self.indices[tri * 3 + 2] as usize;
        let p0 = self.position(i0);
        (self.position(i1) - p0).cross(&(self.position(i2) - p0))
    }
}

/// Interpolate all floats of two vertices: `(1 - t) * a + t * b`.
///
/// `a` and `b` must have the same length; the result is written into `out`.
pub fn lerp_vertex(out: &mut [f32], a: &[f32], b: &[f32], t: f32) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(out.len(), a.len());
    for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
        *o = x + (y - x) * t;
    }
}

/// An axis-aligned unit cube: 8 vertices, 12 triangles, outward winding.
pub fn unit_cube() -> Mesh {
    let positions = vec![
        Point3f::new(0.0, 0.0, 0.0),
        Point3f::new(1.0, 0.0, 0.0),
        Point3f::new(1.0, 1.0, 0.0),
        Point3f::new(0.0, 1.0, 0.0),
        Point3f::new(0.0, 0.0, 1.0),
        Point3f::new(1.0, 0.0, 1.0),
        Point3f::new(1.0, 1.0, 1.0),
        Point3f::new(0.0, 1.0, 1.0),
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, // bottom (z = 0)
        4, 5, 6, 4, 6, 7, // top (z = 1)
        0, 1, 5, 0, 5, 4, // front (y = 0)
        2, 3, 7, 2, 7, 6, // back (y = 1)
        1, 2, 6, 1, 6, 5, // right (x = 1)
        3, 0, 4, 3, 4, 7, // left (x = 0)
    ];
    Mesh::with_positions(positions, indices)
}

/// A flat `n` x `n` vertex grid in the z = 0 plane, `2 * (n-1)^2` triangles.
pub fn grid(n: usize) -> Mesh {
    let mut positions = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            positions.push(Point3f::new(x as f32, y as f32, 0.0));
        }
    }
    let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
    for y in 0..(n - 1) {
        for x in 0..(n - 1) {
            let tl = (y * n + x) as u32;
            let tr = tl + 1;
            let bl = tl + n as u32;
            let br = bl + 1;
            indices.extend_from_slice(&[tl, bl, tr]);
            indices.extend_from_slice(&[tr, bl, br]);
        }
    }
    Mesh::with_positions(positions, indices)
}
