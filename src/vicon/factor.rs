use std::fmt;
use std::sync::Arc;

use crate::dtype;
use crate::error::Result;
use crate::factors::Residual;
use crate::linalg::VectorX;
use crate::variables::{Key, LieGroup, Values};

use super::Interpolator;

/// Vicon pose factor linking a single state node to the interpolated
/// motion-capture trajectory through the extrinsic rotation and time offset.
///
/// Re-interpolates from the raw pose buffer on every evaluation for the same
/// reason [`ImuFactor`](crate::imu::ImuFactor) re-preintegrates: `t_off` is
/// an optimized variable, so the bracketing pair used at `t_k + t_off` moves
/// as the solver iterates.
#[derive(Clone)]
pub struct ViconFactor {
    keys: [Key; 2],
    interpolator: Arc<Interpolator>,
    t: dtype,
}

impl ViconFactor {
    /// `keys` order: `[pose_k, calib]`.
    pub fn new(keys: [Key; 2], interpolator: Arc<Interpolator>, t: dtype) -> Self {
        Self { keys, interpolator, t }
    }
}

impl fmt::Debug for ViconFactor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ViconFactor(t={})", self.t)
    }
}

impl Residual for ViconFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim_out(&self) -> usize {
        6
    }

    fn residual(&self, values: &Values) -> Result<VectorX> {
        let pose_k = values.get(&self.keys[0]).as_pose();
        let calib = values.get(&self.keys[1]).as_calib();

        let toff = calib.t_off;
        // t_off is itself an optimized variable, so a step that nudges it can
        // legitimately push this query outside the buffered Vicon data;
        // surface that as an error rather than panicking.
        let (measured_rot, measured_pos, _cov) = self.interpolator.interpolate(self.t + toff)?;

        // With the IMU-to-Vicon position arm held at zero (spec default),
        // the marker frame's predicted orientation and the body pose's
        // predicted position coincide with the raw state up to the
        // extrinsic rotation.
        let predicted_rot = pose_k.rotation().compose(&calib.r_iv);
        let predicted_pos = *pose_k.translation();

        let r_rot = measured_rot.ominus(&predicted_rot);
        let r_pos = predicted_pos - measured_pos;

        Ok(VectorX::from_vec(vec![
            r_rot[0], r_rot[1], r_rot[2], r_pos[0], r_pos[1], r_pos[2],
        ]))
    }
}
