//! Guarded 3x3 symmetric linear solve.
//!
//! Quadric minimization reduces to solving `A x = b` for a symmetric 3x3
//! matrix A. The decomposition here is `A = L * L^T` with every square root
//! and reciprocal guarded, so near-singular quadrics produce a detectably
//! invalid decomposition instead of NaN or runaway values.

/// Reciprocal substituted when a diagonal entry is too close to zero.
const GUARD_RECIP: f64 = 1.0e20;

/// Diagonal entries below this magnitude are treated as zero.
const DIAG_EPSILON: f64 = 1.0e-12;

/// Decompositions whose summed diagonal reciprocals exceed this bound are
/// degenerate; callers fall back to endpoint-only collapse candidates.
const MAX_RECIP_SUM: f64 = 1.0e12;

fn guarded_sqrt(x: f64) -> f64 {
    x.max(0.0).sqrt()
}

fn guarded_recip(x: f64) -> f64 {
    if x.abs() < DIAG_EPSILON {
        GUARD_RECIP
    } else {
        1.0 / x
    }
}

/// Lower-triangular Cholesky factor of a symmetric 3x3 matrix, with cached
/// guarded diagonal reciprocals.
#[derive(Debug, Clone, Copy)]
pub struct Cholesky3 {
    l10: f64,
    l20: f64,
    l21: f64,
    recip: [f64; 3],
}

impl Cholesky3 {
    /// Decompose a symmetric matrix given as its lower triangle:
    ///
    /// ```text
    /// [ a00          ]
    /// [ a10  a11     ]
    /// [ a20  a21 a22 ]
    /// ```
    pub fn decompose(a00: f64, a10: f64, a11: f64, a20: f64, a21: f64, a22: f64) -> Self {
        let l00 = guarded_sqrt(a00);
        let r0 = guarded_recip(l00);
        let l10 = a10 * r0;
        let l20 = a20 * r0;

        let l11 = guarded_sqrt(a11 - l10 * l10);
        let r1 = guarded_recip(l11);
        let l21 = (a21 - l20 * l10) * r1;

        let l22 = guarded_sqrt(a22 - l20 * l20 - l21 * l21);
        let r2 = guarded_recip(l22);

        Self {
            l10,
            l20,
            l21,
            recip: [r0, r1, r2],
        }
    }

    /// Whether the decomposition is usable. Any guarded reciprocal pushes the
    /// sum past the bound, as does a merely near-singular diagonal.
    pub fn is_valid(&self) -> bool {
        self.recip[0] + self.recip[1] + self.recip[2] < MAX_RECIP_SUM
    }

    /// Solve `L y = b` by forward substitution.
    pub fn forward_sub(&self, b: [f64; 3]) -> [f64; 3] {
        let y0 = b[0] * self.recip[0];
        let y1 = (b[1] - self.l10 * y0) * self.recip[1];
        let y2 = (b[2] - self.l20 * y0 - self.l21 * y1) * self.recip[2];
        [y0, y1, y2]
    }

    /// Solve `L^T x = y` by back substitution.
    pub fn back_sub(&self, y: [f64; 3]) -> [f64; 3] {
        let x2 = y[2] * self.recip[2];
        let x1 = (y[1] - self.l21 * x2) * self.recip[1];
        let x0 = (y[0] - self.l10 * x1 - self.l20 * x2) * self.recip[0];
        [x0, x1, x2]
    }

    /// Solve `A x = b` using both substitutions.
    pub fn solve(&self, b: [f64; 3]) -> [f64; 3] {
        self.back_sub(self.forward_sub(b))
    }
}
