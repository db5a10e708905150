use std::fmt::Debug;

use crate::error::Result;
use crate::linalg::{MatrixX, VectorX};
use crate::variables::{numerical_jacobian, Key, Values};

/// A residual function bound to a fixed list of graph node keys.
///
/// Implementors read whichever concrete [Var](crate::variables::Var)
/// variants they expect out of `values` via `keys()` (panicking, like a
/// failed `unpack`, if a key resolves to the wrong variant) and return the
/// whitened-before-noise residual vector. A factor whose residual depends on
/// a buffer lookup at a value that may fall outside what's buffered (e.g. a
/// time-offset-shifted timestamp) returns `Err` instead of panicking, since
/// that lookup can go out of range as a normal consequence of the optimized
/// variable moving, not a programmer error. [jacobian] has a default
/// implementation via central differences on each variable's tangent space;
/// override it only where a closed-form Jacobian is worth the bookkeeping.
pub trait Residual: Debug {
    fn keys(&self) -> &[Key];

    fn dim_out(&self) -> usize;

    fn residual(&self, values: &Values) -> Result<VectorX>;

    fn jacobian(&self, values: &Values) -> Result<(VectorX, MatrixX)> {
        let vars: Vec<_> = self.keys().iter().map(|k| values.get(k).clone()).collect();
        numerical_jacobian(&vars, |perturbed| {
            let mut local = values.clone();
            for (k, v) in self.keys().iter().zip(perturbed.iter()) {
                local.insert(*k, v.clone());
            }
            self.residual(&local)
        })
    }
}
