use crate::dtype;
use crate::error::EstimatorError;
use crate::variables::Values;

/// Error types for optimizers.
#[derive(Debug)]
pub enum OptError {
    MaxIterations(Values),
    InvalidSystem,
    FailedToStep,
    /// A factor's residual could not be evaluated at the current values
    /// (e.g. a time-offset-shifted buffer lookup fell out of range).
    Residual(EstimatorError),
}

/// Result type for optimizers.
pub type OptResult = Result<Values, OptError>;

// ------------------------- Optimizer Params ------------------------- //
/// Stopping criteria shared by every [Optimizer].
#[derive(Debug, Clone)]
pub struct OptParams {
    pub max_iterations: usize,
    pub error_tol_relative: dtype,
    pub error_tol_absolute: dtype,
    pub error_tol: dtype,
}

impl Default for OptParams {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            error_tol_relative: 1e-6,
            error_tol_absolute: 1e-6,
            error_tol: 0.0,
        }
    }
}

// ------------------------- Optimizer Observers ------------------------- //
/// Observer trait for optimization, called once after every step.
pub trait OptObserver {
    fn on_step(&self, values: &Values, iter: usize);
}

/// Observer collection, notified in registration order.
#[derive(Default)]
pub struct OptObserverVec {
    observers: Vec<Box<dyn OptObserver>>,
}

impl OptObserverVec {
    pub fn add(&mut self, callback: impl OptObserver + 'static) {
        self.observers.push(Box::new(callback));
    }

    pub fn notify(&self, values: &Values, idx: usize) {
        for callback in &self.observers {
            callback.on_step(values, idx);
        }
    }
}

// ------------------------- Actual Trait Impl ------------------------- //
/// Core trait for a nonlinear least-squares optimizer: a single linearize-
/// and-solve [step], and the outer loop in [optimize] that repeats it against
/// shared stopping criteria.
pub trait Optimizer {
    fn params(&self) -> &OptParams;

    /// Perform a single linearize-solve-retract step.
    fn step(&mut self, values: Values, idx: usize) -> OptResult;

    /// Compute the (nonlinear) error of the current values.
    fn error(&self, values: &Values) -> crate::error::Result<dtype>;

    fn init(&mut self, _values: &Values) {}

    fn optimize(&mut self, mut values: Values) -> OptResult {
        self.init(&values);

        let mut error_old = self.error(&values).map_err(OptError::Residual)?;
        if error_old <= self.params().error_tol {
            log::info!("Error is already below tolerance, skipping optimization");
            return Ok(values);
        }

        log::info!(
            "{:^5} | {:^12} | {:^12} | {:^12}",
            "Iter",
            "Error",
            "ErrorAbs",
            "ErrorRel"
        );
        log::info!(
            "{:^5} | {:^12} | {:^12} | {:^12}",
            "-----",
            "------------",
            "------------",
            "------------"
        );
        log::info!(
            "{:^5} | {:^12.4e} | {:^12} | {:^12}",
            0,
            error_old,
            "-",
            "-"
        );

        let mut error_new = error_old;
        for i in 1..self.params().max_iterations + 1 {
            error_old = error_new;
            values = self.step(values, i)?;

            error_new = self.error(&values).map_err(OptError::Residual)?;

            let error_decrease_abs = error_old - error_new;
            let error_decrease_rel = error_decrease_abs / error_old;

            log::info!(
                "{:^5} | {:^12.4e} | {:^12.4e} | {:^12.4e}",
                i,
                error_new,
                error_decrease_abs,
                error_decrease_rel
            );

            if error_new <= self.params().error_tol {
                log::info!("Error is below tolerance, stopping optimization");
                return Ok(values);
            }
            if error_decrease_abs <= self.params().error_tol_absolute {
                log::info!("Error decrease is below absolute tolerance, stopping optimization");
                return Ok(values);
            }
            if error_decrease_rel <= self.params().error_tol_relative {
                log::info!("Error decrease is below relative tolerance, stopping optimization");
                return Ok(values);
            }
        }

        Err(OptError::MaxIterations(values))
    }
}
