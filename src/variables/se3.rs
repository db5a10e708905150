use std::fmt;

use crate::linalg::{Matrix3, Vector3, VectorX};
use crate::variables::{hat, LieGroup, Variable, SO3};

/// Rigid-body pose in SE(3): a rotation plus a translation.
#[derive(Clone, Debug)]
pub struct SE3 {
    pub rot: SO3,
    pub xyz: Vector3,
}

impl SE3 {
    pub fn new(rot: SO3, xyz: Vector3) -> Self {
        SE3 { rot, xyz }
    }

    pub fn rotation(&self) -> &SO3 {
        &self.rot
    }

    pub fn translation(&self) -> &Vector3 {
        &self.xyz
    }
}

impl Variable for SE3 {
    fn dim(&self) -> usize {
        6
    }

    fn oplus(&self, delta: &VectorX) -> Self {
        self.compose(&Self::exp(delta))
    }
}

impl LieGroup for SE3 {
    fn identity() -> Self {
        SE3 {
            rot: SO3::identity(),
            xyz: Vector3::zeros(),
        }
    }

    fn compose(&self, other: &Self) -> Self {
        SE3 {
            rot: self.rot.compose(&other.rot),
            xyz: self.rot.apply(&other.xyz) + self.xyz,
        }
    }

    fn inverse(&self) -> Self {
        let inv_rot = self.rot.inverse();
        SE3 {
            xyz: -inv_rot.apply(&self.xyz),
            rot: inv_rot,
        }
    }

    fn exp(xi: &VectorX) -> Self {
        assert_eq!(xi.len(), 6, "SE3 tangent vector must have dimension 6");
        let w = Vector3::new(xi[0], xi[1], xi[2]);
        let rho = Vector3::new(xi[3], xi[4], xi[5]);

        let rot = SO3::exp(&VectorX::from_vec(vec![w[0], w[1], w[2]]));

        let theta2 = w.norm_squared();
        let what = hat(&w);
        let v = if theta2 < 1e-8 {
            Matrix3::identity() + 0.5 * what + (1.0 / 6.0) * what * what
        } else {
            let theta = theta2.sqrt();
            let a = (1.0 - theta.cos()) / theta2;
            let b = (theta - theta.sin()) / (theta2 * theta);
            Matrix3::identity() + a * what + b * what * what
        };

        SE3 {
            rot,
            xyz: v * rho,
        }
    }

    fn log(&self) -> VectorX {
        let w = self.rot.log();
        let w3 = Vector3::new(w[0], w[1], w[2]);
        let theta2 = w3.norm_squared();
        let what = hat(&w3);

        let v_inv = if theta2 < 1e-8 {
            Matrix3::identity() - 0.5 * what + (1.0 / 12.0) * what * what
        } else {
            let theta = theta2.sqrt();
            let half = theta / 2.0;
            let coeff = (1.0 - half * half.cos() / half.sin()) / theta2;
            Matrix3::identity() - 0.5 * what + coeff * what * what
        };

        let rho = v_inv * self.xyz;
        VectorX::from_vec(vec![w3[0], w3[1], w3[2], rho[0], rho[1], rho[2]])
    }
}

impl fmt::Display for SE3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SE3(R={}, p=[{:.3}, {:.3}, {:.3}])",
            self.rot, self.xyz[0], self.xyz[1], self.xyz[2]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixcompare::assert_matrix_eq;

    #[test]
    fn exp_log_roundtrip() {
        let xi = VectorX::from_vec(vec![0.1, -0.2, 0.3, 1.0, 2.0, -1.5]);
        let p = SE3::exp(&xi);
        assert_matrix_eq!(p.log(), xi, comp = abs, tol = 1e-8);
    }

    #[test]
    fn inverse_composes_to_identity() {
        let xi = VectorX::from_vec(vec![0.3, 0.1, -0.2, 1.0, -2.0, 0.5]);
        let p = SE3::exp(&xi);
        let id = p.compose(&p.inverse());
        assert_matrix_eq!(id.log(), VectorX::zeros(6), comp = abs, tol = 1e-8);
    }
}
