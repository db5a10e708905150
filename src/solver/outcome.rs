use crate::dtype;
use crate::linalg::MatrixX;
use crate::variables::Values;

/// Per-node result: the state itself plus its 15x15 marginal covariance over
/// tangent order `[dphi, dv, dp, dbg, dba]`, extracted from the inverse of
/// the final information matrix.
#[derive(Debug, Clone)]
pub struct NodeResult {
    pub t: dtype,
    pub covariance: MatrixX,
}

/// Result of [`Solver::build_and_solve`](super::Solver::build_and_solve).
///
/// `converged` distinguishes a clean stop (cost or parameter tolerance met)
/// from hitting the iteration cap; the latter is surfaced as a flag rather
/// than an error (spec's `ConvergenceFailure` is "non-fatal, results
/// returned with a flag"). `cancelled` is set when a `should_stop` callback
/// (see [`Solver::build_and_solve_cancellable`](super::Solver::build_and_solve_cancellable))
/// requested an early stop; `values` then holds the best state from the last
/// accepted iteration before the stop, and `converged` is `false`.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub values: Values,
    pub reference_times: Vec<dtype>,
    pub converged: bool,
    pub cancelled: bool,
    pub iterations: usize,
    pub final_cost: dtype,
    pub calibration_held_fixed: bool,
    pub node_covariances: Vec<NodeResult>,
    pub calibration_covariance: MatrixX,
}
