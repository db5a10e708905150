//! Vicon pose interpolation between successive reference timestamps.
//!
//! [`Interpolator`] owns the ordered pose buffer ([`PoseBuffer`]) and turns a
//! query time into a SLERP/linear blend of the bracketing samples, with a
//! propagated 6x6 covariance and the constant rates the solver needs to form
//! the time-offset Jacobian.

mod buffer;
pub use buffer::{PoseBuffer, PoseSample};

mod interpolation;
pub use interpolation::{InterpolatedPose, Interpolator};

mod factor;
pub use factor::ViconFactor;
