//! Graph node types: the [Variable]/[LieGroup] traits, the concrete pose,
//! velocity, bias, gravity-direction and calibration types, and the [Var]
//! enum and [Values] map that let the solver hold all of them at once.

mod base;
pub use base::{LieGroup, Variable};

mod key;
pub use key::{Key, B, C, V, X};

mod so3;
pub use so3::SO3;

mod se3;
pub use se3::SE3;

mod imu_bias;
pub use imu_bias::ImuBias;

mod sphere2;
pub use sphere2::Sphere2;

mod calibration;
pub use calibration::Calibration;

mod var;
pub use var::{numerical_jacobian, Var, Values};

pub use crate::linalg::{Vector2, Vector3, Vector4, Vector6, VectorX};
