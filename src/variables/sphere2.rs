use std::fmt;

use crate::linalg::{Vector3, VectorX};
use crate::variables::Variable;

/// A unit direction in R^3, used for the Vicon-frame gravity direction.
///
/// This is a 2-DoF manifold variable (the direction, not the magnitude of
/// gravity). The tangent plane basis is rebuilt from scratch at every
/// retraction rather than carried incrementally, so there's no "chart" state
/// to track between calls -- but the basis itself is chosen from one of two
/// poles (+Z or +X) depending on which is more than 70 degrees from the
/// current direction, so the basis never degenerates near either pole.
const CHART_SWAP_DEG: f64 = 70.0;

#[derive(Clone, Debug)]
pub struct Sphere2 {
    dir: Vector3,
}

impl Sphere2 {
    pub fn from_unchecked(dir: Vector3) -> Self {
        Sphere2 { dir: dir.normalize() }
    }

    pub fn from_vec(dir: Vector3) -> Self {
        assert!(dir.norm() > 1e-9, "gravity direction must be nonzero");
        Sphere2 { dir: dir.normalize() }
    }

    pub fn direction(&self) -> Vector3 {
        self.dir
    }

    fn pole(&self) -> Vector3 {
        let z = Vector3::new(0.0, 0.0, 1.0);
        let angle_to_z = self.dir.dot(&z).clamp(-1.0, 1.0).acos().to_degrees();
        if angle_to_z < CHART_SWAP_DEG {
            z
        } else {
            Vector3::new(1.0, 0.0, 0.0)
        }
    }

    /// An orthonormal basis for the tangent plane at the current direction.
    pub fn tangent_basis(&self) -> (Vector3, Vector3) {
        let pole = self.pole();
        let b1 = self.dir.cross(&pole).normalize();
        let b2 = self.dir.cross(&b1).normalize();
        (b1, b2)
    }
}

impl Variable for Sphere2 {
    fn dim(&self) -> usize {
        2
    }

    fn oplus(&self, delta: &VectorX) -> Self {
        assert_eq!(delta.len(), 2, "Sphere2 tangent vector must have dimension 2");
        let (b1, b2) = self.tangent_basis();
        let theta = delta.norm();

        let new_dir = if theta < 1e-9 {
            self.dir
        } else {
            let tangent = b1 * delta[0] + b2 * delta[1];
            self.dir * theta.cos() + tangent * (theta.sin() / theta)
        };

        Sphere2::from_unchecked(new_dir)
    }
}

impl fmt::Display for Sphere2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Sphere2([{:.4}, {:.4}, {:.4}])", self.dir[0], self.dir[1], self.dir[2])
    }
}
