use crate::dtype;
use crate::error::Result;
use crate::linalg::{Matrix6, Vector3, VectorX};
use crate::variables::{LieGroup, SO3};

use super::buffer::{PoseBuffer, PoseSample};

/// An interpolated Vicon pose at a query time, with its propagated 6x6
/// covariance (rotation block, position block) and the constant body-rate
/// and linear-velocity the spline has over the bracketing interval -- the
/// time-derivative the solver needs to form the time-offset Jacobian
/// analytically (spec §4.2 "Time offset").
#[derive(Debug, Clone)]
pub struct InterpolatedPose {
    pub rot: SO3,
    pub pos: Vector3,
    /// 6x6 covariance over tangent order `[rotation, position]`.
    pub cov: Matrix6,
    pub angular_velocity: Vector3,
    pub linear_velocity: Vector3,
}

/// Owns the [`PoseBuffer`] and answers interpolation queries.
#[derive(Debug, Clone, Default)]
pub struct Interpolator {
    buffer: PoseBuffer,
}

impl Interpolator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_pose(&mut self, sample: PoseSample) -> Result<()> {
        self.buffer.feed(sample)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn time_range(&self) -> Option<(dtype, dtype)> {
        self.buffer.time_range()
    }

    pub fn buffer(&self) -> &PoseBuffer {
        &self.buffer
    }

    /// Interpolated pose and covariance at `t`, without the rate terms.
    pub fn interpolate(&self, t: dtype) -> Result<(SO3, Vector3, Matrix6)> {
        let full = self.interpolate_with_rates(t)?;
        Ok((full.rot, full.pos, full.cov))
    }

    pub fn interpolate_with_rates(&self, t: dtype) -> Result<InterpolatedPose> {
        let (a, b) = self.buffer.bracket(t)?;

        if (a.t - b.t).abs() < 1e-15 {
            return Ok(InterpolatedPose {
                rot: a.rot.clone(),
                pos: a.pos,
                cov: stack_cov(&a.cov_rot, &a.cov_pos),
                angular_velocity: Vector3::zeros(),
                linear_velocity: Vector3::zeros(),
            });
        }

        let dt = b.t - a.t;
        let lambda = (t - a.t) / dt;

        // theta: relative rotation from a to b, in a's tangent frame.
        //
        // q and -q represent the same rotation, so the buffered samples'
        // quaternion signs are arbitrary; if the relative rotation's own
        // quaternion ends up with a negative w, its principal log is the
        // "long way around" (angle near 2*pi instead of near 0). Negate it
        // to the equivalent w >= 0 representation first so `log` always
        // takes the shortest arc between a and b.
        let relative = a.rot.inverse().compose(&b.rot);
        let relative_xyzw = relative.xyzw();
        let relative = if relative_xyzw[3] < 0.0 {
            SO3::from_xyzw(-relative_xyzw[0], -relative_xyzw[1], -relative_xyzw[2], -relative_xyzw[3])
        } else {
            relative
        };
        let theta = relative.log();
        let theta3 = Vector3::new(theta[0], theta[1], theta[2]);

        let rot = a.rot.compose(&SO3::exp(&(theta.clone() * lambda)));
        let pos = (1.0 - lambda) * a.pos + lambda * b.pos;

        // Covariance: transport each endpoint's tangent-space covariance into
        // the tangent frame at `rot` via the relative rotation between that
        // endpoint and `rot`, weighted quadratically the way a linear blend
        // weights variances. `theta` is a single axis shared by both Ad
        // rotations below, so `rot^-1 . Ra = Exp(-lambda*theta)` and
        // `rot^-1 . Rb = Exp((1-lambda)*theta)` are exact, not first-order.
        let ad_a = SO3::exp(&(theta.clone() * -lambda)).to_matrix();
        let ad_b = SO3::exp(&(theta.clone() * (1.0 - lambda))).to_matrix();
        let cov_rot = (1.0 - lambda).powi(2) * ad_a * a.cov_rot * ad_a.transpose()
            + lambda.powi(2) * ad_b * b.cov_rot * ad_b.transpose();

        // Position covariance: convex blend. The spec's bilinear coupling
        // term between rotation and position arises from a nonzero
        // IMU-to-Vicon position arm; with the arm held at zero (the default,
        // spec §9 open question (b)) that coupling term vanishes exactly, so
        // it is omitted here rather than computed and added as zero.
        let cov_pos = (1.0 - lambda).powi(2) * a.cov_pos + lambda.powi(2) * b.cov_pos;

        let jr_inv = SO3::right_jacobian_inverse(&(theta3 * lambda));
        let angular_velocity = jr_inv * (theta3 / dt);
        let linear_velocity = (b.pos - a.pos) / dt;

        Ok(InterpolatedPose {
            rot,
            pos,
            cov: stack_cov(&cov_rot, &cov_pos),
            angular_velocity,
            linear_velocity,
        })
    }
}

fn stack_cov(cov_rot: &crate::linalg::Matrix3, cov_pos: &crate::linalg::Matrix3) -> Matrix6 {
    let mut cov = Matrix6::zeros();
    cov.fixed_view_mut::<3, 3>(0, 0).copy_from(cov_rot);
    cov.fixed_view_mut::<3, 3>(3, 3).copy_from(cov_pos);
    cov
}
