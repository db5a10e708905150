//! Optimizers for solving the calibration problem's nonlinear least squares.
//!
//! Given
//! $$
//! \Theta^* = \argmin_{\Theta} \sum_{i} \rho_i(\|r_i(\Theta)\|_{\Sigma_i})
//! $$
//! both optimizers here linearize to
//! $$
//! \Delta \Theta = \argmin_{\Delta \Theta} \sum_{i} \|A_i (\Delta \Theta)_i - b_i\|^2
//! $$
//! and solve the resulting dense normal equations. [GaussNewton] solves them
//! directly; [LevenMarquardt] adds a backed-off diagonal damping term to
//! guarantee a descent direction even when the linearization is poor.

mod traits;
pub use traits::{OptError, OptObserver, OptObserverVec, OptParams, OptResult, Optimizer};

mod linear_system;
pub use linear_system::assemble_normal_equations;

mod gauss_newton;
pub use gauss_newton::GaussNewton;

mod levenberg_marquardt;
pub use levenberg_marquardt::{LevenMarquardt, LevenParams};
