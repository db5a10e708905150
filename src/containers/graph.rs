use crate::dtype;
use crate::error::Result;
use crate::factors::{Factor, LinearFactor};
use crate::variables::Values;

/// The full set of factors in the calibration problem: IMU preintegration
/// links, interpolated Vicon pose priors, bias random-walk links, and a
/// single prior (or none, if the initial guess is left unconstrained) on the
/// [Calibration](crate::variables::Calibration) node.
#[derive(Default)]
pub struct Graph {
    factors: Vec<Factor>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_factor(&mut self, factor: Factor) {
        self.factors.push(factor);
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Factor> {
        self.factors.iter()
    }

    pub fn error(&self, values: &Values) -> Result<dtype> {
        self.factors.iter().map(|f| f.error(values)).sum()
    }

    pub fn linearize(&self, values: &Values) -> Result<Vec<LinearFactor>> {
        self.factors.iter().map(|f| f.linearize(values)).collect()
    }
}
