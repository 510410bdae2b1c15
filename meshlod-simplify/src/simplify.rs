//! Edge-collapse simplification driver.
//!
//! A [`Simplifier`] is built fresh for one run over one mesh: it owns a
//! working copy of the vertex data, the adjacency structure, the per-vertex
//! quadrics, and a lazily-invalidated min-error queue of collapse
//! candidates. Candidates are validated against the authoritative edge
//! records at pop time, so neighbor edits only ever push fresh entries
//! instead of patching heap positions.

use crate::adjacency::{edge_key, Adjacency};
use crate::compact::compact;
use crate::params::{SimplifyParams, SimplifyStats};
use crate::quadric::Quadric;
use meshlod_core::{lerp_vertex, AttributeKind, Error, Mesh, Point3f, Result, VertexAttribute};
use nalgebra::Point3;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::{debug, info};

/// Runs never collapse past this many live vertices.
const MIN_LIVE_VERTICES: usize = 5;

/// Floor for the area weight of face quadrics, keeping degenerate slivers
/// from contributing singular zero-weight terms.
const MIN_TRIANGLE_AREA: f64 = 1.0e-12;

/// One queue candidate: a value copy of the edge's error at push time.
/// Multiple stale copies of the same edge may coexist; the pop loop
/// discards any whose error no longer matches the edge record.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    error: f64,
    edge: u32,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.error.total_cmp(&other.error) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: smallest error first
        other.error.total_cmp(&self.error)
    }
}

/// One edge-collapse simplification run.
///
/// Construct with [`Simplifier::new`], consume with [`Simplifier::run`] or
/// [`Simplifier::run_with_stats`]. All state is owned by the run and
/// discarded afterwards.
pub struct Simplifier {
    mesh: Mesh,
    params: SimplifyParams,
    adj: Adjacency,
    quadrics: Vec<Quadric>,
    removed: Vec<bool>,
    heap: BinaryHeap<QueueEntry>,
    scratch: Vec<f32>,
    live_vertices: usize,
    live_triangles: usize,
    stats: SimplifyStats,
}

impl Simplifier {
    /// Build adjacency, accumulate quadrics, and seed the collapse queue.
    ///
    /// Fails only on an empty mesh; numerically degenerate geometry is
    /// defused locally during the run rather than reported.
    pub fn new(mesh: &Mesh, params: SimplifyParams) -> Result<Self> {
        if mesh.is_empty() {
            return Err(Error::InvalidData(
                "cannot simplify an empty mesh".to_string(),
            ));
        }
        if !matches!(
            mesh.attributes.first(),
            Some(VertexAttribute {
                offset_floats: 0,
                kind: AttributeKind::Position,
            })
        ) {
            return Err(Error::InvalidData(
                "vertex layout must start with a 3-float position".to_string(),
            ));
        }

        let vertex_count = mesh.vertex_count();
        let triangle_count = mesh.triangle_count();
        let adj = Adjacency::build(&mesh.indices, vertex_count);
        let edge_count = adj.edges.len();

        let mut sim = Self {
            mesh: mesh.clone(),
            params,
            adj,
            quadrics: vec![Quadric::default(); vertex_count],
            removed: vec![false; vertex_count],
            heap: BinaryHeap::with_capacity(edge_count * 2),
            scratch: vec![0.0; mesh.stride_floats],
            live_vertices: vertex_count,
            live_triangles: triangle_count,
            stats: SimplifyStats {
                input_triangles: triangle_count,
                ..Default::default()
            },
        };

        sim.accumulate_quadrics();
        for ei in 0..edge_count as u32 {
            sim.evaluate_edge(ei);
        }
        debug!(edges = edge_count, "collapse queue seeded");
        Ok(sim)
    }

    /// Run to termination and emit the compacted output mesh.
    pub fn run(self) -> Mesh {
        self.run_with_stats().0
    }

    /// Run to termination, returning the output mesh and run statistics.
    pub fn run_with_stats(mut self) -> (Mesh, SimplifyStats) {
        info!(
            vertices = self.live_vertices,
            triangles = self.live_triangles,
            max_error = self.params.max_error,
            "starting simplification"
        );

        while self.step().is_some() {}

        let out = compact(&self.mesh, &self.adj.fans, &self.removed);
        self.stats.output_triangles = out.triangle_count();

        info!(
            vertices = out.vertex_count(),
            triangles = out.triangle_count(),
            collapses = self.stats.collapses,
            rejected = self.stats.rejected,
            "simplification complete"
        );

        (out, self.stats)
    }

    /// Pop candidates until one collapse is applied, returning its accepted
    /// error, or `None` once the run has terminated.
    fn step(&mut self) -> Option<f64> {
        while let Some(entry) = self.heap.pop() {
            {
                let rec = &self.adj.edges[entry.edge as usize];
                // Lazy invalidation: drop entries that no longer reflect
                // the authoritative record.
                if rec.collapsed || rec.ref_count == 0 {
                    continue;
                }
                if entry.error.to_bits() != rec.error.to_bits() {
                    continue;
                }
            }

            if self.live_vertices <= MIN_LIVE_VERTICES {
                return None;
            }
            let keep_going = entry.error < self.params.max_error
                || self.live_vertices > self.params.max_vertex_count
                || self.live_triangles > self.params.max_triangle_count;
            if !keep_going {
                return None;
            }

            if !self.collapse_is_valid(entry.edge) {
                self.stats.rejected += 1;
                continue;
            }

            self.collapse(entry.edge);
            self.stats.collapses += 1;
            return Some(entry.error);
        }
        None
    }

    fn position(&self, v: u32) -> Point3<f64> {
        let p = self.mesh.position(v as usize);
        Point3::new(f64::from(p.x), f64::from(p.y), f64::from(p.z))
    }

    // ========================================================
    // Quadric accumulation
    // ========================================================

    /// Sum face quadrics into each vertex, pin open fan edges with penalty
    /// planes, and apply the optional external importance weights.
    fn accumulate_quadrics(&mut self) {
        let weights = match &self.params.vertex_weights {
            Some(w) if w.len() == self.quadrics.len() => Some(w.as_slice()),
            Some(w) => {
                debug!(
                    weights = w.len(),
                    vertices = self.quadrics.len(),
                    "vertex weight count mismatch; weights ignored"
                );
                None
            }
            None => None,
        };

        for v in 0..self.quadrics.len() as u32 {
            let pv = self.position(v);
            let mut q = Quadric::default();

            for corner in &self.adj.fans[v as usize] {
                let pa = self.position(corner.a);
                let pb = self.position(corner.b);
                q += Quadric::from_triangle(pv, pa, pb, MIN_TRIANGLE_AREA);

                // Face quadrics alone under-constrain open boundaries; pin
                // each open fan edge with a plane perpendicular to the face,
                // through the edge.
                let face_normal = (pa - pv).cross(&(pb - pv));
                for (w, pw) in [(corner.a, pa), (corner.b, pb)] {
                    let idx = self.adj.edge_map[&edge_key(v, w)] as usize;
                    if !self.adj.edges[idx].is_open() {
                        continue;
                    }
                    let edge = pw - pv;
                    let cross = edge.cross(&face_normal);
                    let len = cross.norm();
                    if len <= f64::MIN_POSITIVE {
                        continue;
                    }
                    let normal = cross / len;
                    q += Quadric::from_plane(
                        normal,
                        -normal.dot(&pv.coords),
                        self.params.open_edge_penalty * edge.norm_squared(),
                    );
                }
            }

            if let Some(w) = weights {
                q.scale(f64::from(w[v as usize]));
            }
            self.quadrics[v as usize] = q;
        }
    }

    // ========================================================
    // Edge error evaluation
    // ========================================================

    /// Recompute an edge's best collapse candidate and push a fresh queue
    /// entry. The quadric-optimal point is accepted only when it strictly
    /// beats both endpoints and stays within one edge length of each,
    /// which keeps near-singular quadrics from proposing runaway points.
    fn evaluate_edge(&mut self, ei: u32) {
        let rec = &self.adj.edges[ei as usize];
        if rec.collapsed || rec.ref_count == 0 {
            return;
        }
        let (v0, v1) = (rec.v0, rec.v1);

        let q = self.quadrics[v0 as usize] + self.quadrics[v1 as usize];
        let p0 = self.position(v0);
        let p1 = self.position(v1);
        let e0 = q.error_at(p0);
        let e1 = q.error_at(p1);

        let keep_low = e0 <= e1;
        let (mut error, mut candidate, mut lerp) = if keep_low {
            (e0, p0, 0.0)
        } else {
            (e1, p1, 1.0)
        };

        let edge_len2 = (p1 - p0).norm_squared();
        if let Some(x) = q.minimizer() {
            let ex = q.error_at(x);
            if ex < e0
                && ex < e1
                && (x - p0).norm_squared() <= edge_len2
                && (x - p1).norm_squared() <= edge_len2
            {
                error = ex;
                candidate = x;
                lerp = if edge_len2 > 0.0 {
                    ((x - p0).dot(&(p1 - p0)) / edge_len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
            }
        }

        // Quadric sums can round a hair negative on near-flat geometry; an
        // exact-zero threshold must see those as zero.
        let error = error.max(0.0);

        let rec = &mut self.adj.edges[ei as usize];
        rec.error = error;
        rec.candidate = Point3f::new(candidate.x as f32, candidate.y as f32, candidate.z as f32);
        rec.lerp = lerp as f32;
        rec.keep_low = keep_low;
        self.heap.push(QueueEntry { error, edge: ei });
    }

    // ========================================================
    // Validity guards
    // ========================================================

    /// Guards run only against the current best candidate, amortizing
    /// their cost against collapses rather than queued edges.
    fn collapse_is_valid(&self, ei: u32) -> bool {
        let rec = &self.adj.edges[ei as usize];
        if rec.non_manifold {
            return false;
        }

        // Shark-fin guard: merging endpoints whose 1-rings share more than
        // the two edge apexes would tear the surface.
        let ring0 = self.adj.neighbors(rec.v0);
        let ring1 = self.adj.neighbors(rec.v1);
        let shared = ring0.iter().filter(|v| ring1.contains(v)).count();
        if shared > 2 {
            return false;
        }

        let p = rec.candidate;
        let candidate = Point3::new(f64::from(p.x), f64::from(p.y), f64::from(p.z));
        !self.flips_normal(rec.v0, rec.v1, candidate) && !self.flips_normal(rec.v1, rec.v0, candidate)
    }

    /// Would moving `v` to `candidate` flip any of its surviving incident
    /// triangles? Triangles touching `other` are excluded; those collapse
    /// with the edge.
    fn flips_normal(&self, v: u32, other: u32, candidate: Point3<f64>) -> bool {
        let pv = self.position(v);
        for corner in &self.adj.fans[v as usize] {
            if corner.a == other || corner.b == other {
                continue;
            }
            let pa = self.position(corner.a);
            let pb = self.position(corner.b);
            let before = (pa - pv).cross(&(pb - pv));
            let after = (pa - candidate).cross(&(pb - candidate));
            if before.dot(&after) < 0.0 {
                return true;
            }
        }
        false
    }

    // ========================================================
    // Collapse execution
    // ========================================================

    /// Merge the edge's endpoints into its selected keep vertex, drop the
    /// triangles that degenerate, retarget the neighborhood's edge records,
    /// and refresh their collapse candidates.
    fn collapse(&mut self, ei: u32) {
        let rec = self.adj.edges[ei as usize].clone();
        let (keep, remove) = if rec.keep_low {
            (rec.v0, rec.v1)
        } else {
            (rec.v1, rec.v0)
        };

        // Merged quadric, damped so error cannot compound without bound
        // across long collapse chains.
        let mut merged = self.quadrics[keep as usize] + self.quadrics[remove as usize];
        merged.scale(self.params.integration_penalty);
        self.quadrics[keep as usize] = merged;

        let neighborhood = self.adj.neighbors(remove);

        // Rewrite every triangle copy referencing the removed vertex and
        // drop the copies that degenerate.
        let mut removed_copies = 0usize;
        for &w in &neighborhood {
            self.adj.fans[w as usize].retain_mut(|c| {
                if c.a == remove {
                    c.a = keep;
                }
                if c.b == remove {
                    c.b = keep;
                }
                let degenerate = c.a == w || c.b == w || c.a == c.b;
                if degenerate {
                    removed_copies += 1;
                }
                !degenerate
            });
        }

        let remove_fan = std::mem::take(&mut self.adj.fans[remove as usize]);
        for c in remove_fan {
            if c.a == keep || c.b == keep {
                // This triangle collapsed with the edge.
                removed_copies += 1;
            } else {
                self.adj.fans[keep as usize].push(c);
            }
        }

        debug_assert!(removed_copies % 3 == 0);
        self.live_triangles -= removed_copies / 3;

        // The collapsed edge's record retires with its hash entry.
        self.adj.edge_map.remove(&edge_key(keep, remove));
        self.adj.edges[ei as usize].collapsed = true;

        // Retarget or merge every (remove, w) entry into (keep, w).
        for &w in &neighborhood {
            if w == keep {
                continue;
            }
            let Some(old_idx) = self.adj.edge_map.remove(&edge_key(remove, w)) else {
                continue;
            };
            let new_key = edge_key(keep, w);
            let new_refs = self.adj.fan_edge_refs(keep, w);

            if let Some(&survivor) = self.adj.edge_map.get(&new_key) {
                // Duplicate key: the retargeted record folds into the
                // survivor instead of overwriting it.
                self.adj.edges[old_idx as usize].collapsed = true;
                let surv = &mut self.adj.edges[survivor as usize];
                surv.ref_count = new_refs;
                if new_refs > 2 {
                    surv.non_manifold = true;
                }
                if new_refs == 0 {
                    surv.collapsed = true;
                    self.adj.edge_map.remove(&new_key);
                }
            } else {
                let moved = &mut self.adj.edges[old_idx as usize];
                moved.v0 = new_key.0;
                moved.v1 = new_key.1;
                moved.ref_count = new_refs;
                if new_refs > 2 {
                    moved.non_manifold = true;
                }
                if new_refs == 0 {
                    moved.collapsed = true;
                } else {
                    self.adj.edge_map.insert(new_key, old_idx);
                }
            }
        }

        // Apply the winning position, interpolating the remaining vertex
        // attributes along the original edge.
        let stride = self.mesh.stride_floats;
        let base0 = rec.v0 as usize * stride;
        let base1 = rec.v1 as usize * stride;
        {
            let verts = &self.mesh.vertices;
            let (a, b) = (
                &verts[base0..base0 + stride],
                &verts[base1..base1 + stride],
            );
            lerp_vertex(&mut self.scratch, a, b, rec.lerp);
        }
        let keep_base = keep as usize * stride;
        self.mesh.vertices[keep_base..keep_base + stride].copy_from_slice(&self.scratch);
        self.mesh
            .set_position(keep as usize, rec.candidate);

        self.removed[remove as usize] = true;
        self.live_vertices -= 1;

        // Refresh collapse candidates around the merged vertex; the stale
        // queue copies fall out at pop time.
        for w in self.adj.neighbors(keep) {
            if let Some(idx) = self.adj.edge_index(keep, w) {
                self.evaluate_edge(idx);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn live_counts(&self) -> (usize, usize) {
        (self.live_vertices, self.live_triangles)
    }
}

/// Simplify a mesh in one call with the given parameters.
pub fn simplify_mesh(mesh: &Mesh, params: &SimplifyParams) -> Result<Mesh> {
    Ok(Simplifier::new(mesh, params.clone())?.run())
}
