//! Output compaction: rebuild dense vertex and index buffers from the
//! surviving fans once collapsing has finished.

use crate::adjacency::Corner;
use meshlod_core::Mesh;

/// Emit a dense mesh containing only the live vertices.
///
/// Vertex data is copied at full stride in original order, so the output
/// keeps the source layout and attribute set. Each surviving triangle is
/// stored three times across the fans; it is emitted exactly once, by the
/// corner whose owning vertex carries the smallest index.
pub(crate) fn compact(source: &Mesh, fans: &[Vec<Corner>], removed: &[bool]) -> Mesh {
    let stride = source.stride_floats;
    let vertex_count = source.vertex_count();
    debug_assert_eq!(fans.len(), vertex_count);
    debug_assert_eq!(removed.len(), vertex_count);

    let mut remap = vec![u32::MAX; vertex_count];
    let mut live = 0u32;
    for v in 0..vertex_count {
        if !removed[v] {
            remap[v] = live;
            live += 1;
        }
    }

    let mut vertices = Vec::with_capacity(live as usize * stride);
    let mut indices = Vec::new();
    for v in 0..vertex_count {
        if removed[v] {
            continue;
        }
        vertices.extend_from_slice(source.vertex(v));
        for corner in &fans[v] {
            let v = v as u32;
            if v < corner.a && v < corner.b {
                indices.extend_from_slice(&[
                    remap[v as usize],
                    remap[corner.a as usize],
                    remap[corner.b as usize],
                ]);
            }
        }
    }

    Mesh::from_buffers(vertices, indices, stride, source.attributes.clone())
}
