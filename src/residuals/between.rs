use core::fmt;

use crate::error::Result;
use crate::factors::Residual;
use crate::linalg::VectorX;
use crate::variables::{Key, Values};

/// Bias random-walk link between two consecutive bias nodes:
/// `residual = (b2 - b1) / sqrt(dt)`, pre-scaled by the caller so the noise
/// model can stay a plain identity-sigma Gaussian.
#[derive(Clone, Debug)]
pub struct BetweenBias {
    keys: [Key; 2],
}

impl BetweenBias {
    pub fn new(key1: Key, key2: Key) -> Self {
        Self {
            keys: [key1, key2],
        }
    }
}

impl Residual for BetweenBias {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim_out(&self) -> usize {
        6
    }

    fn residual(&self, values: &Values) -> Result<VectorX> {
        let b1 = values.get(&self.keys[0]).as_bias();
        let b2 = values.get(&self.keys[1]).as_bias();
        let diff = b2 - b1;
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

impl fmt::Display for BetweenBias {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BetweenBias({}, {})", self.keys[0], self.keys[1])
    }
}
