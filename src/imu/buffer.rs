use crate::dtype;
use crate::error::{EstimatorError, Result};
use crate::linalg::Vector3;

/// A single IMU reading: angular rate and specific force at one instant.
///
/// Immutable once ingested; the buffer enforces strict time ordering at the
/// point of insertion rather than sorting after the fact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    pub t: dtype,
    pub gyro: Vector3,
    pub accel: Vector3,
}

impl ImuSample {
    pub fn new(t: dtype, gyro: Vector3, accel: Vector3) -> Self {
        Self { t, gyro, accel }
    }

    /// Linear interpolation of gyro/accel between two samples, used to
    /// synthesize a boundary sample when a preintegration interval's
    /// endpoint falls strictly between two buffered readings.
    pub fn lerp(a: &ImuSample, b: &ImuSample, t: dtype) -> ImuSample {
        debug_assert!(b.t > a.t);
        let lambda = (t - a.t) / (b.t - a.t);
        ImuSample {
            t,
            gyro: a.gyro + lambda * (b.gyro - a.gyro),
            accel: a.accel + lambda * (b.accel - a.accel),
        }
    }
}

/// Ordered buffer of IMU samples, exclusively owned by the propagator.
///
/// Ingestion enforces strict monotonicity in `t`; a sample at or before the
/// last buffered timestamp is rejected (the caller is told, the sample is
/// dropped) rather than silently collapsing duplicates into an update.
#[derive(Debug, Clone, Default)]
pub struct ImuBuffer {
    samples: Vec<ImuSample>,
}

impl ImuBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, t: dtype, gyro: Vector3, accel: Vector3) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if t <= last.t {
                return Err(EstimatorError::NonMonotonicSample { t, last: last.t });
            }
        }
        self.samples.push(ImuSample::new(t, gyro, accel));
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

    pub fn samples(&self) -> &[ImuSample] {
        &self.samples
    }

    /// Index of the first sample with `t >= query`, i.e. the standard
    /// binary-search insertion point (`partition_point`).
    fn lower_bound(&self, query: dtype) -> usize {
        self.samples.partition_point(|s| s.t < query)
    }

    /// All samples whose timestamp lies within `[t1, t2]`, with boundary
    /// samples synthesized by linear interpolation when `t1`/`t2` fall
    /// strictly between two buffered readings. Fails with
    /// [`EstimatorError::InsufficientData`] unless the buffer straddles the
    /// interval and contains at least two raw samples inside it.
    pub fn slice_interval(&self, t1: dtype, t2: dtype) -> Result<Vec<ImuSample>> {
        if t2 <= t1 {
            return Err(EstimatorError::InsufficientData(format!(
                "preintegration interval [{t1}, {t2}] is empty or inverted"
            )));
        }

        let (lo, hi) = self.time_range().ok_or_else(|| {
            EstimatorError::InsufficientData("IMU buffer is empty".to_string())
        })?;
        if t1 < lo || t2 > hi {
            return Err(EstimatorError::InsufficientData(format!(
                "preintegration interval [{t1}, {t2}] is not covered by buffered IMU data [{lo}, {hi}]"
            )));
        }

        const EPS: dtype = 1e-12;

        // i1: first buffered index with t >= t1.
        let i1 = self.lower_bound(t1);
        let (left, interior_start) = if (self.samples[i1].t - t1).abs() < EPS {
            (self.samples[i1], i1 + 1)
        } else {
            let a = self.samples[i1 - 1];
            let b = self.samples[i1];
            (ImuSample::lerp(&a, &b, t1), i1)
        };

        // i2: first buffered index with t >= t2.
        let i2 = self.lower_bound(t2);
        let (right, interior_end) = if i2 < self.samples.len() && (self.samples[i2].t - t2).abs() < EPS {
            (self.samples[i2], i2)
        } else {
            let a = self.samples[i2 - 1];
            let b = self.samples[i2];
            (ImuSample::lerp(&a, &b, t2), i2)
        };

        let mut out = Vec::with_capacity(interior_end.saturating_sub(interior_start) + 2);
        out.push(left);
        out.extend_from_slice(&self.samples[interior_start.min(interior_end)..interior_end]);
        out.push(right);

        out.dedup_by(|a, b| (a.t - b.t).abs() < EPS);

        if out.len() < 2 {
            return Err(EstimatorError::InsufficientData(format!(
                "fewer than two IMU samples available in [{t1}, {t2}]"
            )));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: dtype) -> Vector3 {
        Vector3::new(x, x, x)
    }

    #[test]
    fn monotone_feed_accumulates() {
        let mut buf = ImuBuffer::new();
        for i in 0..5 {
            buf.feed(i as dtype * 0.01, v(0.0), v(0.0)).unwrap();
        }
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn non_monotone_feed_is_rejected_and_buffer_unchanged() {
        let mut buf = ImuBuffer::new();
        buf.feed(1.0, v(0.0), v(0.0)).unwrap();
        buf.feed(2.0, v(0.0), v(0.0)).unwrap();
        let err = buf.feed(1.5, v(0.0), v(0.0));
        assert!(err.is_err());
        assert_eq!(buf.len(), 2);

        let err = buf.feed(2.0, v(0.0), v(0.0));
        assert!(err.is_err());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn slice_interval_synthesizes_boundaries() {
        let mut buf = ImuBuffer::new();
        for i in 0..10 {
            buf.feed(i as dtype * 0.1, v(i as dtype), v(0.0)).unwrap();
        }
        let slice = buf.slice_interval(0.25, 0.75).unwrap();
        assert!((slice.first().unwrap().t - 0.25).abs() < 1e-12);
        assert!((slice.last().unwrap().t - 0.75).abs() < 1e-12);
        assert!(slice.len() >= 2);
    }

    #[test]
    fn slice_interval_out_of_buffer_range_is_insufficient_data() {
        let mut buf = ImuBuffer::new();
        buf.feed(1.0, v(0.0), v(0.0)).unwrap();
        buf.feed(2.0, v(0.0), v(0.0)).unwrap();
        assert!(buf.slice_interval(0.0, 1.5).is_err());
        assert!(buf.slice_interval(1.0, 3.0).is_err());
    }
}
