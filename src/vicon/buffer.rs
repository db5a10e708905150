use crate::dtype;
use crate::error::{EstimatorError, Result};
use crate::linalg::{Matrix3, Vector3, Vector4};
use crate::variables::SO3;

/// A single Vicon pose reading with per-sample covariance.
#[derive(Debug, Clone)]
pub struct PoseSample {
    pub t: dtype,
    pub rot: SO3,
    pub pos: Vector3,
    pub cov_rot: Matrix3,
    pub cov_pos: Matrix3,
}

impl PoseSample {
    /// Builds a sample from a raw `[x, y, z, w]` quaternion, renormalizing
    /// silently within `1e-6` of unit norm and rejecting otherwise (spec
    /// §4.2 contract).
    pub fn new(t: dtype, xyzw: Vector4, pos: Vector3, cov_rot: Matrix3, cov_pos: Matrix3) -> Result<Self> {
        let norm = xyzw.norm();
        if (norm - 1.0).abs() > 1e-6 {
            return Err(EstimatorError::NonUnitQuaternion { t, norm });
        }
        let rot = SO3::from_xyzw(xyzw[0], xyzw[1], xyzw[2], xyzw[3]);
        Ok(Self {
            t,
            rot,
            pos,
            cov_rot,
            cov_pos,
        })
    }
}

/// Ordered buffer of Vicon pose samples, exclusively owned by the
/// interpolator. Mirrors [`ImuBuffer`](crate::imu::ImuBuffer)'s monotone
/// ingestion contract.
#[derive(Debug, Clone, Default)]
pub struct PoseBuffer {
    samples: Vec<PoseSample>,
}

impl PoseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, sample: PoseSample) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if sample.t <= last.t {
                return Err(EstimatorError::NonMonotonicSample { t: sample.t, last: last.t });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn time_range(&self) -> Option<(dtype, dtype)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => Some((a.t, b.t)),
            _ => None,
        }
    }

    pub fn samples(&self) -> &[PoseSample] {
        &self.samples
    }

    /// The bracketing pair `(a, b)` with `a.t <= t <= b.t`, found by binary
    /// search. Fails with [`EstimatorError::OutOfRange`] if `t` lies
    /// strictly outside the buffered extents -- no extrapolation.
    pub fn bracket(&self, t: dtype) -> Result<(&PoseSample, &PoseSample)> {
        let (lo, hi) = self
            .time_range()
            .ok_or_else(|| EstimatorError::OutOfRange { t, lo: dtype::NAN, hi: dtype::NAN })?;
        if t < lo || t > hi {
            return Err(EstimatorError::OutOfRange { t, lo, hi });
        }

        let idx = self.samples.partition_point(|s| s.t < t);
        if idx < self.samples.len() && (self.samples[idx].t - t).abs() < 1e-12 {
            let j = if idx + 1 < self.samples.len() { idx + 1 } else { idx };
            return Ok((&self.samples[idx], &self.samples[j]));
        }
        Ok((&self.samples[idx - 1], &self.samples[idx]))
    }
}
