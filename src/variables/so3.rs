use std::fmt;
use std::ops::Mul;

use crate::linalg::{Matrix3, Vector3, Vector4, VectorX};
use crate::variables::{LieGroup, Variable};

/// Rotation in SO(3), stored internally as a unit quaternion `[x, y, z, w]`.
#[derive(Clone)]
pub struct SO3 {
    xyzw: Vector4,
}

impl SO3 {
    pub fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> Self {
        SO3 {
            xyzw: Vector4::new(x, y, z, w),
        }
        .normalized()
    }

    fn normalized(self) -> Self {
        SO3 {
            xyzw: self.xyzw / self.xyzw.norm(),
        }
    }

    pub fn from_matrix(mat: &Matrix3) -> Self {
        let trace = mat[(0, 0)] + mat[(1, 1)] + mat[(2, 2)];
        let mut xyzw = Vector4::zeros();

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            xyzw[3] = 0.25 / s;
            xyzw[0] = (mat[(2, 1)] - mat[(1, 2)]) * s;
            xyzw[1] = (mat[(0, 2)] - mat[(2, 0)]) * s;
            xyzw[2] = (mat[(1, 0)] - mat[(0, 1)]) * s;
        } else if mat[(0, 0)] > mat[(1, 1)] && mat[(0, 0)] > mat[(2, 2)] {
            let s = 2.0 * (1.0 + mat[(0, 0)] - mat[(1, 1)] - mat[(2, 2)]).sqrt();
            xyzw[3] = (mat[(2, 1)] - mat[(1, 2)]) / s;
            xyzw[0] = 0.25 * s;
            xyzw[1] = (mat[(0, 1)] + mat[(1, 0)]) / s;
            xyzw[2] = (mat[(0, 2)] + mat[(2, 0)]) / s;
        } else if mat[(1, 1)] > mat[(2, 2)] {
            let s = 2.0 * (1.0 + mat[(1, 1)] - mat[(0, 0)] - mat[(2, 2)]).sqrt();
            xyzw[3] = (mat[(0, 2)] - mat[(2, 0)]) / s;
            xyzw[0] = (mat[(0, 1)] + mat[(1, 0)]) / s;
            xyzw[1] = 0.25 * s;
            xyzw[2] = (mat[(1, 2)] + mat[(2, 1)]) / s;
        } else {
            let s = 2.0 * (1.0 + mat[(2, 2)] - mat[(0, 0)] - mat[(1, 1)]).sqrt();
            xyzw[3] = (mat[(1, 0)] - mat[(0, 1)]) / s;
            xyzw[0] = (mat[(0, 2)] + mat[(2, 0)]) / s;
            xyzw[1] = (mat[(1, 2)] + mat[(2, 1)]) / s;
            xyzw[2] = 0.25 * s;
        }

        SO3 { xyzw }.normalized()
    }

    pub fn to_matrix(&self) -> Matrix3 {
        let q = self.xyzw;
        let (q1, q2, q3, q0) = (q[0], q[1], q[2], q[3]);

        Matrix3::new(
            1.0 - 2.0 * (q2 * q2 + q3 * q3),
            2.0 * (q1 * q2 - q0 * q3),
            2.0 * (q1 * q3 + q0 * q2),
            2.0 * (q1 * q2 + q0 * q3),
            1.0 - 2.0 * (q1 * q1 + q3 * q3),
            2.0 * (q2 * q3 - q0 * q1),
            2.0 * (q1 * q3 - q0 * q2),
            2.0 * (q2 * q3 + q0 * q1),
            1.0 - 2.0 * (q1 * q1 + q2 * q2),
        )
    }

    pub fn apply(&self, v: &Vector3) -> Vector3 {
        let qv = SO3::from_xyzw_unnormalized(v[0], v[1], v[2], 0.0);
        let rotated = &(&self.inverse() * &qv) * self;
        Vector3::new(rotated.xyzw[0], rotated.xyzw[1], rotated.xyzw[2])
    }

    fn from_xyzw_unnormalized(x: f64, y: f64, z: f64, w: f64) -> Self {
        SO3 {
            xyzw: Vector4::new(x, y, z, w),
        }
    }

    pub fn xyzw(&self) -> Vector4 {
        self.xyzw
    }

    /// Right Jacobian of `Exp` at `phi`: the linearization that maps a small
    /// tangent-space perturbation `d` to the corresponding perturbation of
    /// `Exp(phi + d)` relative to `Exp(phi)`, i.e. `Exp(phi + d) ~=
    /// Exp(phi) . Exp(Jr(phi) d)`.
    pub fn right_jacobian(phi: &Vector3) -> Matrix3 {
        let theta = phi.norm();
        let what = crate::linalg::hat(phi);

        if theta < 1e-6 {
            Matrix3::identity() - 0.5 * what + (what * what) / 6.0
        } else {
            let theta2 = theta * theta;
            let a = (1.0 - theta.cos()) / theta2;
            let b = (theta - theta.sin()) / (theta2 * theta);
            Matrix3::identity() - a * what + b * (what * what)
        }
    }

    /// Inverse of [`right_jacobian`], used to map a covariance expressed in
    /// the tangent space at one linearization point into another.
    pub fn right_jacobian_inverse(phi: &Vector3) -> Matrix3 {
        let theta = phi.norm();
        let what = crate::linalg::hat(phi);

        if theta < 1e-6 {
            Matrix3::identity() + 0.5 * what + (what * what) / 12.0
        } else {
            let half = theta / 2.0;
            let cot_half = half.cos() / half.sin();
            let c = (1.0 / (theta * theta)) - cot_half / (2.0 * theta);
            Matrix3::identity() + 0.5 * what + c * (what * what)
        }
    }
}

impl Variable for SO3 {
    fn dim(&self) -> usize {
        3
    }

    fn oplus(&self, delta: &VectorX) -> Self {
        self.compose(&Self::exp(delta))
    }
}

impl LieGroup for SO3 {
    fn identity() -> Self {
        SO3 {
            xyzw: Vector4::new(0.0, 0.0, 0.0, 1.0),
        }
    }

    fn compose(&self, other: &Self) -> Self {
        self * other
    }

    fn inverse(&self) -> Self {
        SO3 {
            xyzw: Vector4::new(-self.xyzw[0], -self.xyzw[1], -self.xyzw[2], self.xyzw[3]),
        }
    }

    fn exp(xi: &VectorX) -> Self {
        assert_eq!(xi.len(), 3, "SO3 tangent vector must have dimension 3");
        let mut xyzw = Vector4::zeros();

        let theta = xi.norm();
        if theta < 1e-2 {
            let scale = 0.5 - theta * theta / 48.0;
            xyzw[0] = xi[0] * scale;
            xyzw[1] = xi[1] * scale;
            xyzw[2] = xi[2] * scale;
            xyzw[3] = 1.0 - theta * theta / 8.0;
        } else {
            let half = theta / 2.0;
            let sin_half = half.sin();
            xyzw[0] = xi[0] * sin_half / theta;
            xyzw[1] = xi[1] * sin_half / theta;
            xyzw[2] = xi[2] * sin_half / theta;
            xyzw[3] = half.cos();
        }

        SO3 { xyzw }.normalized()
    }

    fn log(&self) -> VectorX {
        let xi = Vector3::new(self.xyzw[0], self.xyzw[1], self.xyzw[2]);
        let w = self.xyzw[3];

        let norm_v = xi.norm();
        if norm_v < 1e-9 {
            return VectorX::zeros(3);
        }
        let angle = 2.0 * norm_v.atan2(w);
        let scale = angle / norm_v;
        VectorX::from_vec(vec![xi[0] * scale, xi[1] * scale, xi[2] * scale])
    }
}

impl Mul for SO3 {
    type Output = SO3;
    fn mul(self, other: Self) -> SO3 {
        &self * &other
    }
}

impl Mul for &SO3 {
    type Output = SO3;

    fn mul(self, other: Self) -> SO3 {
        let (x0, y0, z0, w0) = (self.xyzw[0], self.xyzw[1], self.xyzw[2], self.xyzw[3]);
        let (x1, y1, z1, w1) = (other.xyzw[0], other.xyzw[1], other.xyzw[2], other.xyzw[3]);

        SO3 {
            xyzw: Vector4::new(
                w0 * x1 + x0 * w1 + y0 * z1 - z0 * y1,
                w0 * y1 - x0 * z1 + y0 * w1 + z0 * x1,
                w0 * z1 + x0 * y1 - y0 * x1 + z0 * w1,
                w0 * w1 - x0 * x1 - y0 * y1 - z0 * z1,
            ),
        }
    }
}

impl fmt::Display for SO3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SO3({:.3}, {:.3}, {:.3}, {:.3})",
            self.xyzw[0], self.xyzw[1], self.xyzw[2], self.xyzw[3]
        )
    }
}

impl fmt::Debug for SO3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
