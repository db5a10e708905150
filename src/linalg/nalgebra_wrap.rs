// Re-export the nalgebra types this crate uses, pinned to our dtype.
use nalgebra as na;
pub use nalgebra::{Const, Dyn};

use crate::dtype;

pub type Vector2 = na::Vector2<dtype>;
pub type Vector3 = na::Vector3<dtype>;
pub type Vector4 = na::Vector4<dtype>;
pub type Vector6 = na::SVector<dtype, 6>;
pub type VectorX = na::DVector<dtype>;

pub type Matrix3 = na::Matrix3<dtype>;
pub type Matrix3x6 = na::Matrix3x6<dtype>;
pub type Matrix4 = na::Matrix4<dtype>;
pub type Matrix6 = na::SMatrix<dtype, 6, 6>;
pub type MatrixX = na::DMatrix<dtype>;

pub type VectorView3<'a> = na::MatrixView<'a, dtype, na::Const<3>, na::Const<1>>;
pub type VectorViewX<'a> = na::DVectorView<'a, dtype>;
pub type MatrixViewX<'a> = na::DMatrixView<'a, dtype>;
