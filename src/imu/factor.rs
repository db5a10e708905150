use std::fmt;
use std::sync::Arc;

use crate::dtype;
use crate::error::Result;
use crate::factors::Residual;
use crate::linalg::VectorX;
use crate::variables::{Key, LieGroup, Values};

use super::ImuPropagator;

/// IMU preintegration factor linking two consecutive state nodes through
/// the extrinsic rotation, gravity, and time offset.
///
/// Re-preintegrates from the raw buffer on every evaluation rather than
/// caching a bias-linearized [`PreintMeasurement`](super::PreintMeasurement)
/// and correcting it in place: `t_off` is itself an optimized variable, and
/// a changing `t_off` moves which raw samples fall in `[t_k, t_{k+1}]`, so a
/// cached measurement would go stale on every iteration that touches it
/// anyway. The propagator's bias-correction fast path
/// ([`PreintMeasurement::correct_for_bias`](super::PreintMeasurement::correct_for_bias))
/// stays available for callers that hold `t_off` fixed.
#[derive(Clone)]
pub struct ImuFactor {
    keys: [Key; 7],
    propagator: Arc<ImuPropagator>,
    t1: dtype,
    t2: dtype,
}

impl ImuFactor {
    /// `keys` order: `[pose_k, vel_k, bias_k, pose_k1, vel_k1, bias_k1, calib]`.
    pub fn new(keys: [Key; 7], propagator: Arc<ImuPropagator>, t1: dtype, t2: dtype) -> Self {
        Self {
            keys,
            propagator,
            t1,
            t2,
        }
    }
}

impl fmt::Debug for ImuFactor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ImuFactor([{}, {}])", self.t1, self.t2)
    }
}

impl Residual for ImuFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim_out(&self) -> usize {
        9
    }

    fn residual(&self, values: &Values) -> Result<VectorX> {
        let pose_k = values.get(&self.keys[0]).as_pose();
        let vel_k = values.get(&self.keys[1]).as_vel();
        let bias_k = values.get(&self.keys[2]).as_bias();
        let pose_k1 = values.get(&self.keys[3]).as_pose();
        let vel_k1 = values.get(&self.keys[4]).as_vel();
        let calib = values.get(&self.keys[6]).as_calib();

        let toff = calib.t_off;
        // t_off is itself an optimized variable, so a step that nudges it can
        // legitimately push this interval outside the buffered IMU data;
        // surface that as an error rather than panicking.
        let meas = self.propagator.preintegrate(self.t1 + toff, self.t2 + toff, bias_k.gyro, bias_k.accel)?;

        let dt = meas.dt;
        let r_k = pose_k.rotation();
        let r_k_t = r_k.inverse();
        let gravity_imu = calib.r_iv.inverse().apply(&(calib.gravity_dir.direction() * 9.81));

        let dv_true = r_k_t.apply(&(vel_k1 - vel_k - gravity_imu * dt));
        let dp_true = r_k_t.apply(&(pose_k1.translation() - pose_k.translation() - vel_k * dt - 0.5 * gravity_imu * dt * dt));
        let dr_true = r_k_t.compose(pose_k1.rotation());

        let r_phi = meas.delta_r.ominus(&dr_true);
        let r_v = dv_true - meas.delta_v;
        let r_p = dp_true - meas.delta_p;

        Ok(VectorX::from_vec(vec![
            r_phi[0], r_phi[1], r_phi[2], r_v[0], r_v[1], r_v[2], r_p[0], r_p[1], r_p[2],
        ]))
    }
}
