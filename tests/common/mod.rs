//! Synthetic-data generator shared by the end-to-end scenario tests.
//!
//! Builds a [`Solver`] fed with noise-free IMU/Vicon streams for a rigid
//! body rotating in place about a fixed axis, derived directly from the
//! forward model the IMU and Vicon residuals invert (not an independent
//! physics simulation), so that every residual evaluates to zero at the
//! truth values used to generate it.

use vicon_imu_calibrate::config::Config;
use vicon_imu_calibrate::linalg::{Matrix3, Vector3, VectorX};
use vicon_imu_calibrate::solver::Solver;
use vicon_imu_calibrate::variables::{LieGroup, Sphere2, SE3, SO3};
use vicon_imu_calibrate::vicon::PoseSample;

pub struct TruthCalibration {
    pub r_iv: SO3,
    pub gravity_dir: Sphere2,
    pub t_off: f64,
}

impl Default for TruthCalibration {
    fn default() -> Self {
        Self {
            r_iv: SO3::identity(),
            gravity_dir: Sphere2::from_vec(Vector3::new(0.0, 0.0, -1.0)),
            t_off: 0.0,
        }
    }
}

fn body_rotation(omega_body: Vector3, t: f64) -> SO3 {
    SO3::exp(&VectorX::from_vec(vec![omega_body[0] * t, omega_body[1] * t, omega_body[2] * t]))
}

/// Feeds `solver` with a body rotating in place at a constant body-frame
/// rate `omega_body`, held at the origin (zero velocity, zero position),
/// over `[0, window_s]` at 50 ms reference spacing. Returns the reference
/// timestamps used.
pub fn build_rotating_in_place(solver: &mut Solver, omega_body: Vector3, truth: &TruthCalibration, window_s: f64) -> Vec<f64> {
    const REF_DT: f64 = 0.05;
    const MARGIN: f64 = 0.15;
    const IMU_DT: f64 = 1.0 / 200.0;
    const VICON_DT: f64 = 1.0 / 100.0;

    let n_nodes = (window_s / REF_DT).round() as usize + 1;
    let reference_times: Vec<f64> = (0..n_nodes).map(|k| k as f64 * REF_DT).collect();

    let gravity_imu = truth.r_iv.inverse().apply(&(truth.gravity_dir.direction() * 9.81));

    let t0 = reference_times[0] - MARGIN;
    let t1 = *reference_times.last().unwrap() + MARGIN;

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        let rot = body_rotation(omega_body, physical_t);
        // Stationary: v_world == 0, so the specific force sensed in the
        // body frame is entirely the (rotating-through) gravity reaction.
        let accel = -rot.inverse().apply(&gravity_imu);
        solver.feed_imu(physical_t, omega_body, accel).unwrap();
        t += IMU_DT;
    }

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        let rot = body_rotation(omega_body, physical_t).compose(&truth.r_iv);
        let xyzw = rot.xyzw();
        let sample = PoseSample::new(
            physical_t,
            xyzw,
            Vector3::zeros(),
            Matrix3::identity() * 1e-8,
            Matrix3::identity() * 1e-8,
        )
        .unwrap();
        solver.feed_vicon(sample).unwrap();
        t += VICON_DT;
    }

    reference_times
}

pub fn default_config() -> Config {
    Config::default()
}

/// Feeds `solver` with a body held at a fixed orientation (`R_IV` from
/// `truth`, no body rotation) translating along x as
/// `p(t) = amplitude * sin(2*pi*freq*t)`, over `[0, window_s]` at 50 ms
/// reference spacing. Returns the reference timestamps used.
///
/// Matches spec.md's S3 scenario: sinusoidal acceleration with no rotation,
/// used to check position/velocity recovery in isolation from the
/// orientation estimate.
pub fn build_sinusoidal_translation(solver: &mut Solver, amplitude: f64, freq_hz: f64, truth: &TruthCalibration, window_s: f64) -> Vec<f64> {
    const REF_DT: f64 = 0.05;
    const MARGIN: f64 = 0.15;
    const IMU_DT: f64 = 1.0 / 200.0;
    const VICON_DT: f64 = 1.0 / 100.0;

    let n_nodes = (window_s / REF_DT).round() as usize + 1;
    let reference_times: Vec<f64> = (0..n_nodes).map(|k| k as f64 * REF_DT).collect();
    let omega = 2.0 * std::f64::consts::PI * freq_hz;

    let gravity_world = truth.gravity_dir.direction() * 9.81;

    let t0 = reference_times[0] - MARGIN;
    let t1 = *reference_times.last().unwrap() + MARGIN;

    let pos_world = |t: f64| Vector3::new(amplitude * (omega * t).sin(), 0.0, 0.0);
    let accel_world = |t: f64| Vector3::new(-amplitude * omega * omega * (omega * t).sin(), 0.0, 0.0);

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        // Body frame is IMU axis-aligned with Vicon (no rotation in this
        // scenario), so the sensed specific force is just world-frame
        // translational acceleration minus gravity.
        let accel = accel_world(physical_t) - gravity_world;
        solver.feed_imu(physical_t, Vector3::zeros(), accel).unwrap();
        t += IMU_DT;
    }

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        let xyzw = truth.r_iv.xyzw();
        let sample = PoseSample::new(
            physical_t,
            xyzw,
            pos_world(physical_t),
            Matrix3::identity() * 1e-8,
            Matrix3::identity() * 1e-8,
        )
        .unwrap();
        solver.feed_vicon(sample).unwrap();
        t += VICON_DT;
    }

    reference_times
}

/// Like [`build_rotating_in_place`], but perturbs every fed IMU and Vicon
/// sample with zero-mean Gaussian noise at the configured noise densities
/// (discretized the same way [`crate`]'s own preintegration recursion
/// treats them: density / sqrt(dt) for the per-sample standard deviation),
/// for spec.md's S5 "noisy inputs" scenario.
pub fn build_rotating_in_place_noisy(
    solver: &mut Solver,
    omega_body: Vector3,
    truth: &TruthCalibration,
    window_s: f64,
    config: &Config,
    seed: u64,
) -> Vec<f64> {
    use rand::{rngs::StdRng, SeedableRng};
    use rand_distr::{Distribution, Normal};

    const REF_DT: f64 = 0.05;
    const MARGIN: f64 = 0.15;
    const IMU_DT: f64 = 1.0 / 200.0;
    const VICON_DT: f64 = 1.0 / 100.0;

    let n_nodes = (window_s / REF_DT).round() as usize + 1;
    let reference_times: Vec<f64> = (0..n_nodes).map(|k| k as f64 * REF_DT).collect();

    let gravity_imu = truth.r_iv.inverse().apply(&(truth.gravity_dir.direction() * 9.81));

    let t0 = reference_times[0] - MARGIN;
    let t1 = *reference_times.last().unwrap() + MARGIN;

    let mut rng = StdRng::seed_from_u64(seed);
    let gyro_sigma = config.imu_noise.gyroscope_noise_density / IMU_DT.sqrt();
    let accel_sigma = config.imu_noise.accelerometer_noise_density / IMU_DT.sqrt();
    let gyro_noise = Normal::new(0.0, gyro_sigma).unwrap();
    let accel_noise = Normal::new(0.0, accel_sigma).unwrap();
    let rot_noise = Normal::new(0.0, config.vicon.rotation_sigma_rad).unwrap();
    let pos_noise = Normal::new(0.0, config.vicon.position_sigma_m).unwrap();

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        let rot = body_rotation(omega_body, physical_t);
        let accel = -rot.inverse().apply(&gravity_imu);
        let noisy_gyro = omega_body + Vector3::new(gyro_noise.sample(&mut rng), gyro_noise.sample(&mut rng), gyro_noise.sample(&mut rng));
        let noisy_accel = accel + Vector3::new(accel_noise.sample(&mut rng), accel_noise.sample(&mut rng), accel_noise.sample(&mut rng));
        solver.feed_imu(physical_t, noisy_gyro, noisy_accel).unwrap();
        t += IMU_DT;
    }

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        let rot = body_rotation(omega_body, physical_t).compose(&truth.r_iv);
        let perturb = SO3::exp(&VectorX::from_vec(vec![
            rot_noise.sample(&mut rng),
            rot_noise.sample(&mut rng),
            rot_noise.sample(&mut rng),
        ]));
        let xyzw = rot.compose(&perturb).xyzw();
        let pos = Vector3::new(pos_noise.sample(&mut rng), pos_noise.sample(&mut rng), pos_noise.sample(&mut rng));
        let cov_rot = Matrix3::identity() * config.vicon.rotation_sigma_rad.powi(2);
        let cov_pos = Matrix3::identity() * config.vicon.position_sigma_m.powi(2);
        let sample = PoseSample::new(physical_t, xyzw, pos, cov_rot, cov_pos).unwrap();
        solver.feed_vicon(sample).unwrap();
        t += VICON_DT;
    }

    reference_times
}

/// Builds a graph and an exact-truth [`Values`](vicon_imu_calibrate::variables::Values)
/// assignment directly, without going through [`Solver`]'s own
/// Vicon-interpolation-based initializer: used by optimizer-level invariant
/// tests that need to start from (or measure distance to) the truth itself,
/// rather than from whatever the production initializer would reconstruct.
///
/// No calibration prior is added (unlike `Solver::build_and_solve`'s graph):
/// these tests are about the bare optimizer/gradient, not the observability
/// guard.
pub fn build_truth_graph_and_values(
    omega_body: Vector3,
    truth: &TruthCalibration,
    reference_times: &[f64],
) -> (vicon_imu_calibrate::containers::Graph, vicon_imu_calibrate::variables::Values) {
    use std::sync::Arc;

    use vicon_imu_calibrate::containers::Graph;
    use vicon_imu_calibrate::factors::Factor;
    use vicon_imu_calibrate::imu::{ImuFactor, ImuParams, ImuPropagator};
    use vicon_imu_calibrate::residuals::BetweenBias;
    use vicon_imu_calibrate::variables::{Calibration, ImuBias, Var, Values, B, C, V, X};
    use vicon_imu_calibrate::vicon::{Interpolator, ViconFactor};

    const MARGIN: f64 = 0.15;
    const IMU_DT: f64 = 1.0 / 200.0;
    const VICON_DT: f64 = 1.0 / 100.0;

    let mut propagator = ImuPropagator::new(ImuParams::default());
    let mut interpolator = Interpolator::new();

    let gravity_imu = truth.r_iv.inverse().apply(&(truth.gravity_dir.direction() * 9.81));

    let t0 = reference_times[0] - MARGIN;
    let t1 = *reference_times.last().unwrap() + MARGIN;

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        let rot = body_rotation(omega_body, physical_t);
        let accel = -rot.inverse().apply(&gravity_imu);
        propagator.feed_imu(physical_t, omega_body, accel).unwrap();
        t += IMU_DT;
    }

    let mut t = t0;
    while t <= t1 {
        let physical_t = t + truth.t_off;
        let rot = body_rotation(omega_body, physical_t).compose(&truth.r_iv);
        let xyzw = rot.xyzw();
        let sample = PoseSample::new(
            physical_t,
            xyzw,
            Vector3::zeros(),
            Matrix3::identity() * 1e-8,
            Matrix3::identity() * 1e-8,
        )
        .unwrap();
        interpolator.feed_pose(sample).unwrap();
        t += VICON_DT;
    }

    let propagator = Arc::new(propagator);
    let interpolator = Arc::new(interpolator);

    let n_nodes = reference_times.len();
    let mut graph = Graph::new();

    for k in 0..n_nodes.saturating_sub(1) {
        let keys = [
            X(k as u64),
            V(k as u64),
            B(k as u64),
            X(k as u64 + 1),
            V(k as u64 + 1),
            B(k as u64 + 1),
            C(0),
        ];
        let imu_factor = Factor::new(ImuFactor::new(keys, propagator.clone(), reference_times[k], reference_times[k + 1])).build();
        graph.add_factor(imu_factor);

        let bias_factor = Factor::new(BetweenBias::new(B(k as u64), B(k as u64 + 1))).build();
        graph.add_factor(bias_factor);
    }

    for (k, &tk) in reference_times.iter().enumerate() {
        let vicon_factor = Factor::new(ViconFactor::new([X(k as u64), C(0)], interpolator.clone(), tk)).build();
        graph.add_factor(vicon_factor);
    }

    let mut values = Values::new();
    for (k, &tk) in reference_times.iter().enumerate() {
        let physical_t = tk + truth.t_off;
        let pose = SE3::new(body_rotation(omega_body, physical_t), Vector3::zeros());
        values.insert(X(k as u64), Var::Pose(pose));
        values.insert(V(k as u64), Var::Vel(Vector3::zeros()));
        values.insert(B(k as u64), Var::Bias(ImuBias::zero()));
    }
    values.insert(C(0), Var::Calib(Calibration::new(truth.r_iv.clone(), truth.gravity_dir.clone(), truth.t_off)));

    (graph, values)
}
