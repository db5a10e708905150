use crate::containers::{Graph, Order};
use crate::dtype;
use crate::optimizers::linear_system::assemble_normal_equations;
use crate::optimizers::{OptError, OptParams, OptResult, Optimizer};
use crate::variables::Values;

/// Plain Gauss-Newton: linearize, solve the normal equations once, retract.
/// No damping, no step-size control -- relies on the calibration problem
/// being well-conditioned near a good initial guess.
pub struct GaussNewton {
    graph: Graph,
    pub params: OptParams,
}

impl GaussNewton {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            params: OptParams::default(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl Optimizer for GaussNewton {
    fn params(&self) -> &OptParams {
        &self.params
    }

    fn error(&self, values: &Values) -> crate::error::Result<dtype> {
        self.graph.error(values)
    }

    fn step(&mut self, mut values: Values, _idx: usize) -> OptResult {
        let order = Order::from_values(&values);
        let linear = self.graph.linearize(&values).map_err(OptError::Residual)?;
        let (ata, atb) = assemble_normal_equations(&linear, &order);

        let chol = ata.cholesky().ok_or(OptError::InvalidSystem)?;
        let dx = chol.solve(&atb);

        values.oplus_mut(&order, &dx);
        Ok(values)
    }
}
