//! Error taxonomy for the calibration pipeline.
//!
//! Every fallible entry point in the crate returns [`EstimatorError`]. The
//! adapter binary maps each variant to one of the process exit codes in the
//! README: insufficient data (1), a query outside the covered time range
//! (2), a numerical failure during preintegration or linearization (3), or a
//! malformed configuration (4).

use thiserror::Error;

use crate::dtype;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("sample at t={t} is not after the last buffered sample at t={last}")]
    NonMonotonicSample { t: dtype, last: dtype },

    #[error("pose at t={t} has non-unit quaternion (norm={norm})")]
    NonUnitQuaternion { t: dtype, norm: dtype },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("requested time t={t} is outside the buffered range [{lo}, {hi}]")]
    OutOfRange { t: dtype, lo: dtype, hi: dtype },

    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EstimatorError {
    /// Exit code this error maps to at the process boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            EstimatorError::InsufficientData(_) => 1,
            EstimatorError::OutOfRange { .. } => 2,
            EstimatorError::NonMonotonicSample { .. } => 2,
            EstimatorError::NonUnitQuaternion { .. } => 2,
            EstimatorError::NumericalFailure(_) => 3,
            EstimatorError::Config(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
