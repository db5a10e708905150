//! Linear algebra helpers.
//!
//! This module re-aliases [nalgebra] types to default to our [dtype](crate::dtype).
//! The central-difference Jacobian helper lives in
//! [crate::variables::numerical_jacobian], since it perturbs variables via
//! their `oplus`.

mod nalgebra_wrap;
pub use nalgebra_wrap::*;

/// The result of differentiating a function: the value at the linearization
/// point plus the Jacobian there.
#[derive(Debug, Clone)]
pub struct DiffResult<V, G> {
    pub value: V,
    pub diff: G,
}

/// Skew-symmetric "hat" operator mapping R^3 to so(3).
pub fn hat(w: &Vector3) -> Matrix3 {
    Matrix3::new(0.0, -w.z, w.y, w.z, 0.0, -w.x, -w.y, w.x, 0.0)
}
