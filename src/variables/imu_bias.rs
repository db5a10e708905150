use std::fmt;
use std::ops::Sub;

use crate::linalg::{Vector3, VectorX};
use crate::variables::Variable;

/// Gyroscope and accelerometer bias, treated as a flat vector space (no
/// group structure beyond ordinary addition).
#[derive(Clone, Debug, Default)]
pub struct ImuBias {
    pub gyro: Vector3,
    pub accel: Vector3,
}

impl ImuBias {
    pub fn new(gyro: Vector3, accel: Vector3) -> Self {
        Self { gyro, accel }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// L-infinity norm of the difference to another bias estimate, used by
    /// the re-linearization threshold.
    pub fn max_abs_diff(&self, other: &Self) -> (f64, f64) {
        let dg = (self.gyro - other.gyro).abs().max();
        let da = (self.accel - other.accel).abs().max();
        (dg, da)
    }
}

impl Variable for ImuBias {
    fn dim(&self) -> usize {
        6
    }

    fn oplus(&self, delta: &VectorX) -> Self {
        assert_eq!(delta.len(), 6);
        ImuBias {
            gyro: self.gyro + Vector3::new(delta[0], delta[1], delta[2]),
            accel: self.accel + Vector3::new(delta[3], delta[4], delta[5]),
        }
    }
}

impl Sub for &ImuBias {
    type Output = ImuBias;
    fn sub(self, other: &ImuBias) -> ImuBias {
        ImuBias {
            gyro: self.gyro - other.gyro,
            accel: self.accel - other.accel,
        }
    }
}

impl fmt::Display for ImuBias {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ImuBias(gyro=[{:.5}, {:.5}, {:.5}], accel=[{:.5}, {:.5}, {:.5}])",
            self.gyro[0], self.gyro[1], self.gyro[2], self.accel[0], self.accel[1], self.accel[2]
        )
    }
}
