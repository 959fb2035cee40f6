//! Quadric error algebra
//!
//! A quadric is the symmetric 4x4 matrix `Q` of the quadratic form
//! `v^T Q v`, `v = [x, y, z, 1]`, that measures the summed squared distance
//! of a point to a set of planes. Only the upper triangle is stored:
//!
//! ```text
//! [ m0 m1 m2 m3 ]
//! [    m4 m5 m6 ]
//! [       m7 m8 ]
//! [          m9 ]
//! ```
//!
//! Quadrics add component-wise, which is what lets vertex quadrics be
//! accumulated incrementally as edges collapse.

use nalgebra::Matrix3;
use qemcrate_core::{Point3d, Vector3d};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

/// Below this determinant the 3x3 system is treated as singular.
pub const DETERMINANT_TOLERANCE: f64 = 1e-10;

/// Minimum length for a normal or edge direction to be considered well defined.
pub(crate) const DIRECTION_EPSILON: f64 = 1e-12;

/// Symmetric error quadric stored as the 10 upper-triangle coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SymmetricMatrix {
    m: [f64; 10],
}

impl SymmetricMatrix {
    /// The quadric of the empty plane set; zero error everywhere.
    pub const ZERO: Self = Self { m: [0.0; 10] };

    /// Quadric of the plane `ax + by + cz + d = 0`.
    ///
    /// `(a, b, c)` should be unit length for the error to be a squared distance.
    pub fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            m: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    /// Quadric of the plane with unit `normal` passing through `point`.
    pub fn from_point_normal(point: &Point3d, normal: &Vector3d) -> Self {
        let d = -normal.dot(&point.coords);
        Self::from_plane(normal.x, normal.y, normal.z, d)
    }

    /// Face-plane quadric of a triangle, or `None` for a zero-area triangle.
    pub fn from_triangle(p0: &Point3d, p1: &Point3d, p2: &Point3d) -> Option<Self> {
        triangle_normal(p0, p1, p2).map(|n| Self::from_point_normal(p0, &n))
    }

    /// Penalty quadric for a border edge `a -> b` of a face with unit `face_normal`.
    ///
    /// The constraint plane contains the edge and is perpendicular to the face,
    /// so sliding along the boundary is free while leaving it is expensive.
    pub fn border_plane(a: &Point3d, b: &Point3d, face_normal: &Vector3d, weight: f64) -> Self {
        match (b - a).cross(face_normal).try_normalize(DIRECTION_EPSILON) {
            Some(n) => Self::from_point_normal(a, &n) * weight,
            None => Self::ZERO,
        }
    }

    /// The raw upper-triangle coefficients.
    pub fn coefficients(&self) -> &[f64; 10] {
        &self.m
    }

    /// Error of `p` under this quadric; never negative.
    pub fn error(&self, p: &Point3d) -> f64 {
        let m = &self.m;
        let (x, y, z) = (p.x, p.y, p.z);
        let e = m[0] * x * x
            + 2.0 * m[1] * x * y
            + 2.0 * m[2] * x * z
            + 2.0 * m[3] * x
            + m[4] * y * y
            + 2.0 * m[5] * y * z
            + 2.0 * m[6] * y
            + m[7] * z * z
            + 2.0 * m[8] * z
            + m[9];
        e.max(0.0)
    }

    fn linear_part(&self) -> Matrix3<f64> {
        let m = &self.m;
        Matrix3::new(
            m[0], m[1], m[2], //
            m[1], m[4], m[5], //
            m[2], m[5], m[7],
        )
    }

    /// Determinant of the upper-left 3x3 block.
    pub fn determinant(&self) -> f64 {
        self.linear_part().determinant()
    }

    /// Point minimizing the error, or `None` when the system is singular.
    pub fn minimizer(&self) -> Option<Point3d> {
        let a = self.linear_part();
        if a.determinant().abs() < DETERMINANT_TOLERANCE {
            return None;
        }
        let rhs = Vector3d::new(-self.m[3], -self.m[6], -self.m[8]);
        let x = a.lu().solve(&rhs)?;
        x.iter().all(|c| c.is_finite()).then(|| Point3d::from(x))
    }

    /// Collapse target for the segment `a`-`b` and its error.
    ///
    /// Uses the algebraic minimizer when it exists and beats the fallback
    /// candidates; otherwise the cheapest of endpoint `a`, endpoint `b` and
    /// the midpoint, first one winning ties.
    pub fn optimal_collapse(&self, a: &Point3d, b: &Point3d) -> (Point3d, f64) {
        let mid = Point3d::from((a.coords + b.coords) * 0.5);
        let mut best = (*a, self.error(a));
        for p in [*b, mid] {
            let e = self.error(&p);
            if e < best.1 {
                best = (p, e);
            }
        }

        match self.minimizer() {
            // An ill-conditioned solve can land far away with a worse error.
            Some(p) => {
                let e = self.error(&p);
                if e <= best.1 {
                    (p, e)
                } else {
                    best
                }
            }
            None => best,
        }
    }
}

/// Unit normal of a triangle, `None` when the triangle has no area.
pub fn triangle_normal(p0: &Point3d, p1: &Point3d, p2: &Point3d) -> Option<Vector3d> {
    (p1 - p0).cross(&(p2 - p0)).try_normalize(DIRECTION_EPSILON)
}

impl Add for SymmetricMatrix {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for SymmetricMatrix {
    fn add_assign(&mut self, rhs: Self) {
        for (l, r) in self.m.iter_mut().zip(rhs.m) {
            *l += r;
        }
    }
}

impl Mul<f64> for SymmetricMatrix {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        for c in &mut self.m {
            *c *= rhs;
        }
        self
    }
}

impl Sum for SymmetricMatrix {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, q| acc + q)
    }
}
