//! Batch estimation of the IMU-to-Vicon extrinsic rotation, Vicon-frame
//! gravity direction, a scalar time offset, and the full state trajectory
//! from asynchronous IMU and motion-capture streams.
//!
//! The crate is organized the way the factor-graph estimator it grew out of
//! is organized: manifold-aware [variables], a generic [factors]/[containers]
//! graph container, [noise] models and [robust] kernels for weighting
//! residuals, and [optimizers] that linearize and solve the graph. On top of
//! that sit the three domain components described in the calibration
//! pipeline: [imu] preintegration, [vicon] pose interpolation, and the
//! [solver] that wires everything into a single batch estimate.

#[allow(non_camel_case_types)]
#[cfg(not(feature = "f32"))]
pub type dtype = f64;

#[allow(non_camel_case_types)]
#[cfg(feature = "f32")]
pub type dtype = f32;

pub mod config;
pub mod containers;
pub mod error;
pub mod factors;
pub mod imu;
pub mod io;
pub mod linalg;
pub mod noise;
pub mod optimizers;
pub mod residuals;
pub mod robust;
pub mod solver;
pub mod variables;
pub mod vicon;

pub use error::EstimatorError;
