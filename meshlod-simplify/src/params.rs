//! Simplification parameters and run statistics.

use serde::{Deserialize, Serialize};

/// Parameters for one simplification run. A pure value; nothing global.
///
/// The run keeps collapsing while the cheapest candidate stays below
/// `max_error` or either live count is still above its bound, and always
/// stops before the live vertex count would drop below 5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplifyParams {
    /// Collapse while the cheapest candidate error is below this.
    pub max_error: f64,

    /// Weight multiplier for the extra plane quadrics pinned to open
    /// (boundary) edges. Larger values resist boundary erosion.
    pub open_edge_penalty: f64,

    /// Damping factor (< 1) applied to the merged quadric after each
    /// collapse, bounding error growth over long collapse chains.
    pub integration_penalty: f64,

    /// Collapse while more than this many vertices remain live.
    pub max_vertex_count: usize,

    /// Collapse while more than this many triangles remain live.
    pub max_triangle_count: usize,

    /// Optional per-vertex importance weights scaling each accumulated
    /// vertex quadric. Silently ignored when its length does not match
    /// the input vertex count.
    pub vertex_weights: Option<Vec<f32>>,
}

impl Default for SimplifyParams {
    fn default() -> Self {
        Self {
            max_error: 0.0,
            open_edge_penalty: 100.0,
            integration_penalty: 0.9,
            max_vertex_count: usize::MAX,
            max_triangle_count: usize::MAX,
            vertex_weights: None,
        }
    }
}

impl SimplifyParams {
    /// Params collapsing down to a triangle budget.
    #[must_use]
    pub fn with_target_triangles(count: usize) -> Self {
        Self {
            max_triangle_count: count,
            ..Default::default()
        }
    }

    /// Params collapsing down to a vertex budget.
    #[must_use]
    pub fn with_target_vertices(count: usize) -> Self {
        Self {
            max_vertex_count: count,
            ..Default::default()
        }
    }

    /// Params collapsing every edge cheaper than `max_error`.
    #[must_use]
    pub fn with_max_error(max_error: f64) -> Self {
        Self {
            max_error,
            ..Default::default()
        }
    }

    /// Set the open-edge penalty multiplier.
    #[must_use]
    pub fn open_edge_penalty(mut self, penalty: f64) -> Self {
        self.open_edge_penalty = penalty;
        self
    }

    /// Set the per-collapse quadric damping factor.
    #[must_use]
    pub fn integration_penalty(mut self, penalty: f64) -> Self {
        self.integration_penalty = penalty;
        self
    }

    /// Attach per-vertex importance weights.
    #[must_use]
    pub fn vertex_weights(mut self, weights: Vec<f32>) -> Self {
        self.vertex_weights = Some(weights);
        self
    }
}

/// Statistics from one simplification run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimplifyStats {
    /// Triangles in the input mesh.
    pub input_triangles: usize,
    /// Triangles in the output mesh.
    pub output_triangles: usize,
    /// Edge collapses performed.
    pub collapses: usize,
    /// Queue candidates rejected by the validity guards.
    pub rejected: usize,
}
