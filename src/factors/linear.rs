use crate::dtype;
use crate::linalg::{MatrixX, VectorX};
use crate::variables::Key;

/// A factor linearized at the current estimate: `a * delta ~= b` in the
/// tangent space of the variables named by `keys`, in the same order.
#[derive(Debug, Clone)]
pub struct LinearFactor {
    keys: Vec<Key>,
    a: MatrixX,
    b: VectorX,
}

impl LinearFactor {
    pub fn new(keys: Vec<Key>, a: MatrixX, b: VectorX) -> Self {
        assert_eq!(a.nrows(), b.len());
        Self { keys, a, b }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn a(&self) -> &MatrixX {
        &self.a
    }

    pub fn b(&self) -> &VectorX {
        &self.b
    }

    /// `||a * delta - b||^2` at `delta = 0`, i.e. the whitened residual norm.
    pub fn error(&self) -> dtype {
        self.b.norm_squared() / 2.0
    }
}
