//! Quadric error metric.
//!
//! A [`Quadric`] is the 10-coefficient symmetric quadratic form representing
//! `sum of weight * (plane distance)^2` over a set of weighted planes. Vertex
//! error is the sum of the quadrics of its incident faces, and the error of
//! collapsing an edge is the sum of its endpoint quadrics, so the whole
//! metric folds into coefficient-wise addition.

use crate::solver::Cholesky3;
use nalgebra::{Point3, Vector3};
use std::ops::{Add, AddAssign};

/// Symmetric quadratic form `v^T Q v` for homogeneous `v = [x, y, z, 1]`,
/// stored as the 10 unique coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadric {
    xx: f64,
    xy: f64,
    xz: f64,
    xd: f64,
    yy: f64,
    yz: f64,
    yd: f64,
    zz: f64,
    zd: f64,
    dd: f64,
}

impl Quadric {
    /// Quadric of a single plane `n . p + dist = 0`, scaled by `weight`.
    ///
    /// `normal` should be unit length for the form to measure true distances.
    pub fn from_plane(normal: Vector3<f64>, dist: f64, weight: f64) -> Self {
        let (a, b, c) = (normal.x, normal.y, normal.z);
        Self {
            xx: weight * a * a,
            xy: weight * a * b,
            xz: weight * a * c,
            xd: weight * a * dist,
            yy: weight * b * b,
            yz: weight * b * c,
            yd: weight * b * dist,
            zz: weight * c * c,
            zd: weight * c * dist,
            dd: weight * dist * dist,
        }
    }

    /// Area-weighted quadric of a triangle's supporting plane.
    ///
    /// The area weight is clamped below by `min_area` so degenerate slivers
    /// still contribute a nonzero, nonsingular term. A triangle whose normal
    /// cannot be normalized contributes nothing.
    pub fn from_triangle(
        p0: Point3<f64>,
        p1: Point3<f64>,
        p2: Point3<f64>,
        min_area: f64,
    ) -> Self {
        let cross = (p1 - p0).cross(&(p2 - p0));
        let len = cross.norm();
        if len <= f64::MIN_POSITIVE {
            return Self::default();
        }
        let normal = cross / len;
        let area = (0.5 * len).max(min_area);
        Self::from_plane(normal, -normal.dot(&p0.coords), area)
    }

    /// Scale all coefficients, e.g. by an external importance weight.
    pub fn scale(&mut self, w: f64) {
        self.xx *= w;
        self.xy *= w;
        self.xz *= w;
        self.xd *= w;
        self.yy *= w;
        self.yz *= w;
        self.yd *= w;
        self.zz *= w;
        self.zd *= w;
        self.dd *= w;
    }

    /// Evaluate the form at a point.
    pub fn error_at(&self, p: Point3<f64>) -> f64 {
        let (x, y, z) = (p.x, p.y, p.z);
        self.xx * x * x
            + self.yy * y * y
            + self.zz * z * z
            + 2.0 * (self.xy * x * y + self.xz * x * z + self.yz * y * z)
            + 2.0 * (self.xd * x + self.yd * y + self.zd * z)
            + self.dd
    }

    /// The point minimizing the form, found by solving the implied
    /// `A x = -b` system, or `None` when the decomposition is degenerate.
    pub fn minimizer(&self) -> Option<Point3<f64>> {
        let chol = Cholesky3::decompose(self.xx, self.xy, self.yy, self.xz, self.yz, self.zz);
        if !chol.is_valid() {
            return None;
        }
        let x = chol.solve([-self.xd, -self.yd, -self.zd]);
        Some(Point3::new(x[0], x[1], x[2]))
    }
}

impl Add for Quadric {
    type Output = Quadric;

    fn add(mut self, rhs: Quadric) -> Quadric {
        self += rhs;
        self
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Quadric) {
        self.xx += rhs.xx;
        self.xy += rhs.xy;
        self.xz += rhs.xz;
        self.xd += rhs.xd;
        self.yy += rhs.yy;
        self.yz += rhs.yz;
        self.yd += rhs.yd;
        self.zz += rhs.zz;
        self.zd += rhs.zd;
        self.dd += rhs.dd;
    }
}
