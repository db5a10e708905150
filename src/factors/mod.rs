//! Residuals bound to graph node keys, wrapped with a
//! [NoiseModel](crate::noise::NoiseModel) and [RobustCost](crate::robust::RobustCost)
//! into a [Factor].

mod residual;
pub use residual::Residual;

mod factor;
pub use factor::{Factor, FactorBuilder};

mod linear;
pub use linear::LinearFactor;
