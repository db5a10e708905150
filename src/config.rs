//! Run configuration.
//!
//! A single [`Config`] is built once (TOML file, optionally overridden by
//! CLI flags) and passed by value into the core estimator — there is no
//! global/process-wide state anywhere in this crate.

use serde::Deserialize;

use crate::dtype;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ImuNoiseConfig {
    pub gyroscope_noise_density: dtype,
    pub accelerometer_noise_density: dtype,
    pub gyroscope_random_walk: dtype,
    pub accelerometer_random_walk: dtype,
}

impl Default for ImuNoiseConfig {
    fn default() -> Self {
        Self {
            gyroscope_noise_density: 1.6968e-4,
            accelerometer_noise_density: 2.0e-3,
            gyroscope_random_walk: 1.9393e-5,
            accelerometer_random_walk: 3.0e-3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ViconConfig {
    /// Used only when `use_manual_sigmas` is true and the input stream
    /// carries no per-pose covariance.
    pub use_manual_sigmas: bool,
    pub rotation_sigma_rad: dtype,
    pub position_sigma_m: dtype,
}

impl Default for ViconConfig {
    fn default() -> Self {
        Self {
            use_manual_sigmas: false,
            rotation_sigma_rad: 1.0e-3,
            position_sigma_m: 1.0e-3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EstimationConfig {
    pub estimate_toff: bool,
    pub estimate_extrinsic_rotation: bool,
    pub estimate_gravity: bool,
    pub estimate_position_arm: bool,
    pub max_iterations: usize,
    pub relative_tol: dtype,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            estimate_toff: true,
            estimate_extrinsic_rotation: true,
            estimate_gravity: true,
            estimate_position_arm: false,
            max_iterations: 100,
            relative_tol: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IoConfig {
    pub imu_path: String,
    pub vicon_path: String,
    pub reference_times_path: String,
    pub states_out_path: String,
    pub info_out_path: String,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            imu_path: "imu.csv".into(),
            vicon_path: "vicon.csv".into(),
            reference_times_path: "reference_times.csv".into(),
            states_out_path: "states.csv".into(),
            info_out_path: "info.txt".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub verbosity: u8,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { verbosity: 0 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub imu_noise: ImuNoiseConfig,
    pub vicon: ViconConfig,
    pub estimation: EstimationConfig,
    pub io: IoConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> crate::error::Result<Self> {
        toml::from_str(s).map_err(|e| crate::error::EstimatorError::Config(e.to_string()))
    }
}
