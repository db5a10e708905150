use crate::linalg::VectorX;

/// A manifold-valued variable that can be retracted by a tangent-space
/// perturbation.
///
/// `oplus` is the generalized `+` of optimization on manifolds: given a
/// local tangent vector (expressed in this variable's own tangent space),
/// it returns the retracted variable. Every residual's Jacobian is taken
/// with respect to these tangent coordinates, never with respect to the
/// variable's internal representation directly.
pub trait Variable: Clone + std::fmt::Debug {
    /// Dimension of this variable's tangent space.
    fn dim(&self) -> usize;

    fn oplus(&self, delta: &VectorX) -> Self;
}

/// A [Variable] that additionally forms a Lie group, giving it an identity
/// element, a composition operator, and the exponential/logarithm maps
/// between the group and its tangent space at the identity.
pub trait LieGroup: Variable {
    fn identity() -> Self;

    fn compose(&self, other: &Self) -> Self;

    fn inverse(&self) -> Self;

    fn exp(xi: &VectorX) -> Self;

    fn log(&self) -> VectorX;

    /// `self^-1 . other`, expressed in the tangent space at `self`.
    fn ominus(&self, other: &Self) -> VectorX {
        self.inverse().compose(other).log()
    }
}
