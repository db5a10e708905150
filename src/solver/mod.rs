//! Graph construction and optimization: wires the IMU propagator and Vicon
//! interpolator into a factor graph over a set of reference timestamps,
//! solves it with Levenberg-Marquardt, and extracts marginal covariances.

mod init;

mod outcome;
pub use outcome::{NodeResult, SolveOutcome};

use std::sync::Arc;

use crate::config::{Config, EstimationConfig};
use crate::containers::{Graph, Order};
use crate::dtype;
use crate::error::{EstimatorError, Result};
use crate::factors::Factor;
use crate::imu::{ImuFactor, ImuParams, ImuPropagator};
use crate::linalg::{Matrix6, MatrixX};
use crate::noise::GaussianNoise;
use crate::optimizers::{assemble_normal_equations, LevenMarquardt, OptError, OptParams, Optimizer};
use crate::residuals::{BetweenBias, PriorCalib};
use crate::variables::{Values, B, C, V, X};
use crate::vicon::{Interpolator, PoseSample, ViconFactor};

/// Rotation excitation (spec.md §4.3) below which calibration unknowns are
/// held fixed and only the trajectory is optimized.
const EXCITATION_GUARD_RAD: dtype = 0.5;
/// Node-count guard: below this, the problem is too short to observe the
/// calibration unknowns either.
const NODE_COUNT_GUARD: usize = 5;

/// Owns the IMU/Vicon buffers and reference timestamps, and builds +
/// optimizes the calibration factor graph on demand.
///
/// Ingestion (`feed_imu`/`feed_vicon`/`set_reference_times`) and
/// optimization (`build_and_solve`) are strictly sequenced by the caller,
/// matching spec.md §5's single-threaded, batch concurrency model: nothing
/// here prevents calling `feed_imu` after a solve, but doing so only affects
/// a subsequent, independent `build_and_solve`.
#[derive(Debug, Clone)]
pub struct Solver {
    propagator: ImuPropagator,
    interpolator: Interpolator,
    reference_times: Vec<dtype>,
    config: Config,
}

impl Solver {
    pub fn new(config: Config) -> Self {
        let imu_params = ImuParams {
            gyro_noise_density: config.imu_noise.gyroscope_noise_density,
            accel_noise_density: config.imu_noise.accelerometer_noise_density,
            gyro_random_walk: config.imu_noise.gyroscope_random_walk,
            accel_random_walk: config.imu_noise.accelerometer_random_walk,
            ..ImuParams::default()
        };
        Self {
            propagator: ImuPropagator::new(imu_params),
            interpolator: Interpolator::new(),
            reference_times: Vec::new(),
            config,
        }
    }

    pub fn feed_imu(&mut self, t: dtype, gyro: crate::linalg::Vector3, accel: crate::linalg::Vector3) -> Result<()> {
        self.propagator.feed_imu(t, gyro, accel)
    }

    pub fn feed_vicon(&mut self, sample: PoseSample) -> Result<()> {
        self.interpolator.feed_pose(sample)
    }

    pub fn set_reference_times(&mut self, times: Vec<dtype>) -> Result<()> {
        if times.is_empty() {
            return Err(EstimatorError::InsufficientData("reference time set is empty".to_string()));
        }
        for pair in times.windows(2) {
            if pair[1] <= pair[0] {
                return Err(EstimatorError::InsufficientData(
                    "reference times must be strictly increasing".to_string(),
                ));
            }
        }
        self.reference_times = times;
        Ok(())
    }

    pub fn build_and_solve(&self) -> Result<SolveOutcome> {
        self.build_and_solve_cancellable(&|| false)
    }

    /// Same as [`Solver::build_and_solve`], but polls `should_stop` between
    /// LM iterations; cooperative cancellation (spec.md §5) that returns the
    /// best state found so far with [`SolveOutcome::cancelled`] set, rather
    /// than an error.
    pub fn build_and_solve_cancellable(&self, should_stop: &dyn Fn() -> bool) -> Result<SolveOutcome> {
        if self.propagator.is_empty() {
            return Err(EstimatorError::InsufficientData("IMU buffer is empty".to_string()));
        }
        if self.interpolator.is_empty() {
            return Err(EstimatorError::InsufficientData("Vicon buffer is empty".to_string()));
        }
        if self.reference_times.is_empty() {
            return Err(EstimatorError::InsufficientData("reference time set is empty".to_string()));
        }

        let t = &self.reference_times;
        let n_nodes = t.len();
        let values0 = init::initial_values(t, &self.interpolator, &self.propagator)?;

        let propagator = Arc::new(self.propagator.clone());
        let interpolator = Arc::new(self.interpolator.clone());

        let (window_lo, window_hi) = (t[0], t[n_nodes - 1]);
        let excitation = propagator.rotation_excitation(window_lo, window_hi);
        let calibration_held_fixed = n_nodes < NODE_COUNT_GUARD || excitation < EXCITATION_GUARD_RAD;

        let mut graph = Graph::new();

        for k in 0..n_nodes.saturating_sub(1) {
            let dt = t[k + 1] - t[k];
            let keys = [X(k as u64), V(k as u64), B(k as u64), X(k as u64 + 1), V(k as u64 + 1), B(k as u64 + 1), C(0)];

            let imu_cov9 = propagator
                .preintegrate(t[k], t[k + 1], crate::linalg::Vector3::zeros(), crate::linalg::Vector3::zeros())
                .map(|m| m.cov.view((0, 0), (9, 9)).clone_owned())
                .unwrap_or_else(|_| MatrixX::identity(9, 9));
            let imu_factor = Factor::new(ImuFactor::new(keys, propagator.clone(), t[k], t[k + 1]))
                .set_noise(GaussianNoise::from_matrix_cov(&imu_cov9))
                .build();
            graph.add_factor(imu_factor);

            let gw2 = self.config.imu_noise.gyroscope_random_walk.powi(2) * dt;
            let aw2 = self.config.imu_noise.accelerometer_random_walk.powi(2) * dt;
            let bias_cov = crate::linalg::VectorX::from_vec(vec![gw2, gw2, gw2, aw2, aw2, aw2]);
            let bias_factor = Factor::new(BetweenBias::new(B(k as u64), B(k as u64 + 1)))
                .set_noise(GaussianNoise::from_vec_cov(&bias_cov))
                .build();
            graph.add_factor(bias_factor);
        }

        for k in 0..n_nodes {
            let (_, _, cov6) = interpolator.interpolate(t[k])?;
            let vicon_factor = Factor::new(ViconFactor::new([X(k as u64), C(0)], interpolator.clone(), t[k]))
                .set_noise(GaussianNoise::from_matrix_cov(&matrix6_to_dyn(&cov6)))
                .build();
            graph.add_factor(vicon_factor);
        }

        if let Some(sigmas) = calibration_prior_sigmas(&self.config.estimation, calibration_held_fixed) {
            let calib0 = values0.get(&C(0)).as_calib().clone();
            let prior = Factor::new(PriorCalib::new(C(0), calib0))
                .set_noise(GaussianNoise::from_diag_sigmas(&sigmas))
                .build();
            graph.add_factor(prior);
        }

        let params = OptParams {
            max_iterations: self.config.estimation.max_iterations,
            error_tol_relative: self.config.estimation.relative_tol,
            ..OptParams::default()
        };
        let mut optimizer = LevenMarquardt::new(graph);
        optimizer.params_base = params;

        let (values, converged, cancelled, iterations, final_cost) = run_to_completion(&mut optimizer, values0, should_stop)?;

        let order = Order::from_values(&values);
        let linear = optimizer_graph_linearize(&optimizer, &values)?;
        let (ata, _atb) = assemble_normal_equations(&linear, &order);
        let cov_full = ata
            .cholesky()
            .ok_or_else(|| EstimatorError::NumericalFailure("final information matrix is not positive definite".to_string()))?
            .inverse();

        let mut node_covariances = Vec::with_capacity(n_nodes);
        for (k, &tk) in t.iter().enumerate() {
            node_covariances.push(NodeResult {
                t: tk,
                covariance: node_covariance(&cov_full, &order, k as u64),
            });
        }
        let calibration_covariance = node_covariance_for(&cov_full, &order, &[C(0)]);

        Ok(SolveOutcome {
            values,
            reference_times: t.clone(),
            converged,
            cancelled,
            iterations,
            final_cost,
            calibration_held_fixed,
            node_covariances,
            calibration_covariance,
        })
    }
}

fn matrix6_to_dyn(m: &Matrix6) -> MatrixX {
    MatrixX::from_fn(6, 6, |r, c| m[(r, c)])
}

/// Tight/loose sigmas for the bundled `Calibration` node's prior, used to
/// hold specific sub-blocks fixed when the observability guard trips or the
/// config excludes that unknown from estimation. `None` means no prior is
/// needed (every unknown is free).
fn calibration_prior_sigmas(cfg: &EstimationConfig, hold_all_fixed: bool) -> Option<[dtype; 7]> {
    const TIGHT: dtype = 1e-9;
    const LOOSE: dtype = 1e6;

    if hold_all_fixed {
        return Some([TIGHT; 7]);
    }
    if cfg.estimate_extrinsic_rotation && cfg.estimate_gravity && cfg.estimate_toff {
        return None;
    }
    let rot = if cfg.estimate_extrinsic_rotation { LOOSE } else { TIGHT };
    let grav = if cfg.estimate_gravity { LOOSE } else { TIGHT };
    let toff = if cfg.estimate_toff { LOOSE } else { TIGHT };
    Some([rot, rot, rot, grav, grav, grav, toff])
}

fn node_covariance(cov_full: &MatrixX, order: &Order, k: u64) -> MatrixX {
    node_covariance_for(cov_full, order, &[X(k), V(k), B(k)])
}

fn node_covariance_for(cov_full: &MatrixX, order: &Order, keys: &[crate::variables::Key]) -> MatrixX {
    let mut idxs = Vec::new();
    for key in keys {
        let blk = order.get(key).expect("key missing from order when extracting marginal covariance");
        idxs.extend(blk.idx..blk.idx + blk.dim);
    }
    MatrixX::from_fn(idxs.len(), idxs.len(), |r, c| cov_full[(idxs[r], idxs[c])])
}

/// Parameter-step tolerance for spec.md §4.3's third stopping criterion
/// ("relative parameter change < 1e-7"), applied to the RMS per-coordinate
/// tangent-space step size ([`LevenMarquardt::last_step_rms`]).
const PARAM_STEP_TOL: dtype = 1e-7;

/// Re-run the optimizer's linearize-solve-retract loop with the same
/// stopping criteria as [`Optimizer::optimize`](crate::optimizers::Optimizer::optimize),
/// plus the parameter-step criterion, and additionally track the iteration
/// count the spec's Info file reports.
///
/// `should_stop` is polled once per iteration, before that iteration's step;
/// a cancelled run returns the best (most recently accepted) state found so
/// far rather than an error, with `converged = false` and the cancelled flag
/// set.
fn run_to_completion(
    optimizer: &mut LevenMarquardt,
    mut values: Values,
    should_stop: &dyn Fn() -> bool,
) -> Result<(Values, bool, bool, usize, dtype)> {
    let params = optimizer.params_base.clone();

    let mut error_old = optimizer.error(&values)?;
    if error_old <= params.error_tol {
        return Ok((values, true, false, 0, error_old));
    }

    let mut error_new = error_old;
    for i in 1..=params.max_iterations {
        if should_stop() {
            return Ok((values, false, true, i - 1, error_new));
        }

        error_old = error_new;
        values = optimizer.step(values, i).map_err(map_opt_error)?;
        error_new = optimizer.error(&values)?;

        let abs = error_old - error_new;
        let rel = abs / error_old;
        let step_converged = optimizer.last_step_rms().is_some_and(|rms| rms <= PARAM_STEP_TOL);
        if error_new <= params.error_tol || abs <= params.error_tol_absolute || rel <= params.error_tol_relative || step_converged {
            return Ok((values, true, false, i, error_new));
        }
    }
    Ok((values, false, false, params.max_iterations, error_new))
}

fn map_opt_error(e: OptError) -> EstimatorError {
    match e {
        OptError::MaxIterations(_) => EstimatorError::NumericalFailure("unexpected max-iterations error mid-step".to_string()),
        OptError::InvalidSystem => EstimatorError::NumericalFailure("normal equations are not positive definite".to_string()),
        OptError::FailedToStep => EstimatorError::NumericalFailure("Levenberg-Marquardt damping escalated past its limit".to_string()),
        OptError::Residual(e) => e,
    }
}

fn optimizer_graph_linearize(optimizer: &LevenMarquardt, values: &Values) -> Result<Vec<crate::factors::LinearFactor>> {
    optimizer.graph().linearize(values)
}
