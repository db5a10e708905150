use core::fmt;

use crate::error::Result;
use crate::factors::Residual;
use crate::linalg::VectorX;
use crate::variables::{Calibration, ImuBias, Key, LieGroup, Values, SE3};

/// Unary prior on a pose node: `residual = log(prior^-1 . x)`.
#[derive(Clone, Debug)]
pub struct PriorPose {
    key: Key,
    prior: SE3,
}

impl PriorPose {
    pub fn new(key: Key, prior: SE3) -> Self {
        Self { key, prior }
    }
}

impl Residual for PriorPose {
    fn keys(&self) -> &[Key] {
        std::slice::from_ref(&self.key)
    }

    fn dim_out(&self) -> usize {
        6
    }

    fn residual(&self, values: &Values) -> Result<VectorX> {
        Ok(self.prior.ominus(values.get(&self.key).as_pose()))
    }
}

impl fmt::Display for PriorPose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PriorPose({}, {})", self.key, self.prior)
    }
}

/// Unary prior on an IMU bias node: `residual = x - prior`.
#[derive(Clone, Debug)]
pub struct PriorBias {
    key: Key,
    prior: ImuBias,
}

impl PriorBias {
    pub fn new(key: Key, prior: ImuBias) -> Self {
        Self { key, prior }
    }
}

impl Residual for PriorBias {
    fn keys(&self) -> &[Key] {
        std::slice::from_ref(&self.key)
    }

    fn dim_out(&self) -> usize {
        6
    }

    fn residual(&self, values: &Values) -> Result<VectorX> {
        let diff = values.get(&self.key).as_bias() - &self.prior;
        Ok(VectorX::from_vec(vec![
            diff.gyro[0],
            diff.gyro[1],
            diff.gyro[2],
            diff.accel[0],
            diff.accel[1],
            diff.accel[2],
        ]))
    }
}

impl fmt::Display for PriorBias {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PriorBias({}, {})", self.key, self.prior)
    }
}

/// Unary prior on the calibration node: rotation part via `ominus`, gravity
/// direction and time offset via their own tangent-space subtraction.
#[derive(Clone, Debug)]
pub struct PriorCalib {
    key: Key,
    prior: Calibration,
}

impl PriorCalib {
    pub fn new(key: Key, prior: Calibration) -> Self {
        Self { key, prior }
    }
}

impl Residual for PriorCalib {
    fn keys(&self) -> &[Key] {
        std::slice::from_ref(&self.key)
    }

    // 3 (rotation tangent) + 3 (embedded gravity direction, over-parameterized
    // since Sphere2 has no ominus of its own) + 1 (time offset)
    fn dim_out(&self) -> usize {
        7
    }

    fn residual(&self, values: &Values) -> Result<VectorX> {
        let x = values.get(&self.key).as_calib();
        let rot = self.prior.r_iv.ominus(&x.r_iv);
        let grav_diff = self.prior.gravity_dir.direction() - x.gravity_dir.direction();
        let t_diff = self.prior.t_off - x.t_off;
        Ok(VectorX::from_vec(vec![
            rot[0],
            rot[1],
            rot[2],
            grav_diff[0],
            grav_diff[1],
            grav_diff[2],
            t_diff,
        ]))
    }
}

impl fmt::Display for PriorCalib {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PriorCalib({}, {})", self.key, self.prior)
    }
}
