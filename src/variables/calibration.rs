use std::fmt;

use crate::linalg::VectorX;
use crate::variables::{LieGroup, Sphere2, Variable, SO3};

/// The single graph node holding everything the IMU residual needs beyond a
/// robot state: the IMU-to-Vicon extrinsic rotation, the Vicon-frame gravity
/// direction, and the scalar IMU-to-Vicon time offset. Bundling them keeps
/// the IMU factor within a fixed, small arity instead of depending on three
/// separate calibration nodes.
#[derive(Clone, Debug)]
pub struct Calibration {
    /// Rotation taking a vector in the IMU body frame to the Vicon frame.
    pub r_iv: SO3,
    /// Unit gravity direction expressed in the Vicon frame.
    pub gravity_dir: Sphere2,
    /// Seconds to add to an IMU timestamp to align it with the Vicon clock.
    pub t_off: f64,
}

impl Calibration {
    pub fn new(r_iv: SO3, gravity_dir: Sphere2, t_off: f64) -> Self {
        Self {
            r_iv,
            gravity_dir,
            t_off,
        }
    }

    pub fn identity_with_gravity(gravity_dir: Sphere2) -> Self {
        Self {
            r_iv: SO3::identity(),
            gravity_dir,
            t_off: 0.0,
        }
    }
}

impl Variable for Calibration {
    fn dim(&self) -> usize {
        6
    }

    fn oplus(&self, delta: &VectorX) -> Self {
        assert_eq!(delta.len(), 6, "Calibration tangent vector must have dimension 6");
        let d_rot = VectorX::from_vec(vec![delta[0], delta[1], delta[2]]);
        let d_grav = VectorX::from_vec(vec![delta[3], delta[4]]);

        Calibration {
            r_iv: self.r_iv.oplus(&d_rot),
            gravity_dir: self.gravity_dir.oplus(&d_grav),
            t_off: self.t_off + delta[5],
        }
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Calibration(R_IV={}, gravity={}, t_off={:.9})",
            self.r_iv, self.gravity_dir, self.t_off
        )
    }
}
