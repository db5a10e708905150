use core::fmt;

use super::NoiseModel;
use crate::linalg::{MatrixX, VectorX};

/// A noise model that leaves the residual untouched -- equal weighting in a
/// [Factor](crate::factors::Factor).
#[derive(Clone, Debug)]
pub struct UnitNoise {
    dim: usize,
}

impl UnitNoise {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl NoiseModel for UnitNoise {
    fn dim(&self) -> usize {
        self.dim
    }

    fn whiten_vec(&self, v: &VectorX) -> VectorX {
        v.clone()
    }

    fn whiten_mat(&self, m: &MatrixX) -> MatrixX {
        m.clone()
    }
}

impl fmt::Display for UnitNoise {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UnitNoise{}", self.dim)
    }
}
