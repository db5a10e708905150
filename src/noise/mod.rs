//! Noise models: whitening transforms applied to a residual before it enters
//! the cost function, used when constructing a [Factor](crate::factors::Factor).

use std::fmt::Debug;

use crate::linalg::{MatrixX, VectorX};

/// A noise model maps a raw residual (and its Jacobian) into whitened space,
/// where the cost is a plain sum of squares.
pub trait NoiseModel: Debug {
    /// The dimension of residual this noise model whitens.
    fn dim(&self) -> usize;

    fn whiten_vec(&self, v: &VectorX) -> VectorX;

    fn whiten_mat(&self, m: &MatrixX) -> MatrixX;
}

mod gaussian;
pub use gaussian::GaussianNoise;

mod unit;
pub use unit::UnitNoise;
