use std::collections::HashMap;
use std::fmt;

use crate::linalg::{MatrixX, Vector3, VectorX};
use crate::variables::{Calibration, ImuBias, Key, Variable, SE3};

/// A graph node value. The solver optimizes over a handful of concrete
/// variable types (poses, velocities, IMU biases, and the single calibration
/// node); wrapping them in one enum lets [Values] and [Factor](crate::factors::Factor)
/// stay non-generic instead of threading five type parameters through every
/// container, at the cost of a panicking downcast at each residual's entry
/// point -- the same tradeoff the teacher's own variable-enum dispatch makes.
#[derive(Clone, Debug)]
pub enum Var {
    Pose(SE3),
    Vel(Vector3),
    Bias(ImuBias),
    Calib(Calibration),
}

impl Var {
    pub fn as_pose(&self) -> &SE3 {
        match self {
            Var::Pose(p) => p,
            other => panic!("expected Var::Pose, found {other:?}"),
        }
    }

    pub fn as_vel(&self) -> &Vector3 {
        match self {
            Var::Vel(v) => v,
            other => panic!("expected Var::Vel, found {other:?}"),
        }
    }

    pub fn as_bias(&self) -> &ImuBias {
        match self {
            Var::Bias(b) => b,
            other => panic!("expected Var::Bias, found {other:?}"),
        }
    }

    pub fn as_calib(&self) -> &Calibration {
        match self {
            Var::Calib(c) => c,
            other => panic!("expected Var::Calib, found {other:?}"),
        }
    }
}

impl Variable for Var {
    fn dim(&self) -> usize {
        match self {
            Var::Pose(p) => p.dim(),
            Var::Vel(_) => 3,
            Var::Bias(b) => b.dim(),
            Var::Calib(c) => c.dim(),
        }
    }

    fn oplus(&self, delta: &VectorX) -> Self {
        match self {
            Var::Pose(p) => Var::Pose(p.oplus(delta)),
            Var::Vel(v) => Var::Vel(v + Vector3::new(delta[0], delta[1], delta[2])),
            Var::Bias(b) => Var::Bias(b.oplus(delta)),
            Var::Calib(c) => Var::Calib(c.oplus(delta)),
        }
    }
}

/// A map of graph node keys to their current estimate.
#[derive(Clone, Debug, Default)]
pub struct Values {
    map: HashMap<Key, Var>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Key, value: Var) {
        self.map.insert(key, value);
    }

    pub fn get(&self, key: &Key) -> &Var {
        self.map
            .get(key)
            .unwrap_or_else(|| panic!("key not found in Values: {key}"))
    }

    pub fn get_mut(&mut self, key: &Key) -> &mut Var {
        self.map
            .get_mut(key)
            .unwrap_or_else(|| panic!("key not found in Values: {key}"))
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Var)> {
        self.map.iter()
    }

    /// Apply a tangent-space update `delta`, laid out according to `order`,
    /// in place.
    pub fn oplus_mut(&mut self, order: &crate::containers::Order, delta: &VectorX) {
        for (key, idx) in order.iter() {
            let local = delta.rows(idx.idx, idx.dim).clone_owned();
            let updated = self.get(key).oplus(&local);
            self.map.insert(*key, updated);
        }
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (key, value) in self.map.iter() {
            write!(f, "{key}: {value:?}, ")?;
        }
        write!(f, "}}")
    }
}

/// Central-difference Jacobian of `f` with respect to the tangent space of
/// each variable in `vars`, evaluated at the given values.
///
/// This is the fallback used by every residual that doesn't hand-derive an
/// analytic Jacobian: perturb each component of each variable's tangent
/// vector by +/- `eps` via `oplus`, re-evaluate, and divide by `2 * eps`.
/// `f` is fallible so residuals that re-query a buffer at a perturbed,
/// time-offset-shifted timestamp can surface an out-of-range error instead
/// of panicking.
pub fn numerical_jacobian<F>(vars: &[Var], f: F) -> crate::error::Result<(VectorX, MatrixX)>
where
    F: Fn(&[Var]) -> crate::error::Result<VectorX>,
{
    const EPS: f64 = 1e-6;

    let dims: Vec<usize> = vars.iter().map(|v| v.dim()).collect();
    let total_dim: usize = dims.iter().sum();

    let r0 = f(vars)?;
    let mut jac = MatrixX::zeros(r0.len(), total_dim);

    let mut offset = 0;
    for (i, dim) in dims.iter().enumerate() {
        for j in 0..*dim {
            let mut tangent = VectorX::zeros(*dim);

            tangent[j] = EPS;
            let mut perturbed = vars.to_vec();
            perturbed[i] = vars[i].oplus(&tangent);
            let r_plus = f(&perturbed)?;

            tangent[j] = -EPS;
            perturbed[i] = vars[i].oplus(&tangent);
            let r_minus = f(&perturbed)?;

            let col = (r_plus - r_minus) / (2.0 * EPS);
            jac.column_mut(offset + j).copy_from(&col);
        }
        offset += dim;
    }

    Ok((r0, jac))
}
