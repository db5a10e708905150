//! IMU preintegration between successive reference timestamps.
//!
//! [`ImuPropagator`] owns the ordered sample buffer ([`ImuBuffer`]) and turns
//! a `[t1, t2]` query plus the current bias estimate into a
//! [`PreintMeasurement`]: a relative `(ΔR, Δv, Δp)` motion, its 15x15
//! covariance, and the Jacobians needed to first-order correct the
//! measurement when the bias estimate drifts without re-slicing the buffer.

mod buffer;
pub use buffer::{ImuBuffer, ImuSample};

mod preintegration;
pub use preintegration::{ImuParams, PreintMeasurement};

mod factor;
pub use factor::ImuFactor;

use crate::dtype;
use crate::error::Result;
use crate::linalg::Vector3;

/// Owns the IMU sample buffer and produces preintegrated measurements.
#[derive(Debug, Clone)]
pub struct ImuPropagator {
    buffer: ImuBuffer,
    params: ImuParams,
}

impl ImuPropagator {
    pub fn new(params: ImuParams) -> Self {
        Self {
            buffer: ImuBuffer::new(),
            params,
        }
    }

    pub fn feed_imu(&mut self, t: dtype, gyro: Vector3, accel: Vector3) -> Result<()> {
        self.buffer.feed(t, gyro, accel)
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

    pub fn buffer(&self) -> &ImuBuffer {
        &self.buffer
    }

    pub fn params(&self) -> &ImuParams {
        &self.params
    }

    /// Preintegrate `[t1, t2]` from scratch, linearized exactly at `(bg, ba)`.
    pub fn preintegrate(&self, t1: dtype, t2: dtype, bg: Vector3, ba: Vector3) -> Result<PreintMeasurement> {
        let slice = self.buffer.slice_interval(t1, t2)?;
        Ok(preintegration::preintegrate_slice(&slice, bg, ba, &self.params))
    }

    /// Rough specific-force average over the whole buffer, used by the
    /// solver to seed the initial gravity direction before the first
    /// optimization iteration (spec's "coarse first-iteration alignment of
    /// accel averages").
    pub fn mean_accel(&self) -> Option<Vector3> {
        let samples = self.buffer.samples();
        if samples.is_empty() {
            return None;
        }
        let sum: Vector3 = samples.iter().map(|s| s.accel).sum();
        Some(sum / samples.len() as dtype)
    }

    /// Total excitation `∫‖ω‖ dt` over `[t1, t2]`, used by the solver's
    /// observability guard (spec §4.3 "negligible rotation excitation").
    pub fn rotation_excitation(&self, t1: dtype, t2: dtype) -> dtype {
        let samples = self.buffer.samples();
        let mut total = 0.0;
        for pair in samples.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.t < t1 || a.t > t2 {
                continue;
            }
            let dt = b.t - a.t;
            let mean_speed = 0.5 * (a.gyro.norm() + b.gyro.norm());
            total += mean_speed * dt;
        }
        total
    }
}
