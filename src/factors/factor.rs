use crate::dtype;
use crate::error::Result;
use crate::factors::{LinearFactor, Residual};
use crate::noise::{GaussianNoise, NoiseModel};
use crate::robust::{RobustCost, L2};
use crate::variables::{Key, Values};

/// A single weighted, robustified residual in the graph.
pub struct Factor {
    keys: Vec<Key>,
    residual: Box<dyn Residual>,
    noise: Box<dyn NoiseModel>,
    robust: Box<dyn RobustCost>,
}

impl Factor {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(residual: impl Residual + 'static) -> FactorBuilder {
        let keys = residual.keys().to_vec();
        FactorBuilder {
            keys,
            residual: Box::new(residual),
            noise: None,
            robust: None,
        }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn error(&self, values: &Values) -> Result<dtype> {
        let r = self.residual.residual(values)?;
        let r = self.noise.whiten_vec(&r);
        let norm2 = r.norm_squared();
        Ok(norm2 * self.robust.weight(norm2) / 2.0)
    }

    pub fn linearize(&self, values: &Values) -> Result<LinearFactor> {
        let (r, h) = self.residual.jacobian(values)?;
        let norm2 = r.norm_squared();
        let weight = self.robust.weight(norm2);
        let a = self.noise.whiten_mat(&h) * weight.sqrt();
        let b = -(self.noise.whiten_vec(&r) * weight.sqrt());
        Ok(LinearFactor::new(self.keys.clone(), a, b))
    }
}

pub struct FactorBuilder {
    keys: Vec<Key>,
    residual: Box<dyn Residual>,
    noise: Option<Box<dyn NoiseModel>>,
    robust: Option<Box<dyn RobustCost>>,
}

impl FactorBuilder {
    pub fn set_noise(mut self, noise: impl NoiseModel + 'static) -> Self {
        assert_eq!(
            noise.dim(),
            self.residual.dim_out(),
            "noise dimension must match residual dimension"
        );
        self.noise = Some(Box::new(noise));
        self
    }

    pub fn set_robust(mut self, robust: impl RobustCost + 'static) -> Self {
        self.robust = Some(Box::new(robust));
        self
    }

    pub fn build(self) -> Factor {
        let dim = self.residual.dim_out();
        Factor {
            keys: self.keys,
            residual: self.residual,
            noise: self
                .noise
                .unwrap_or_else(|| Box::new(GaussianNoise::identity(dim))),
            robust: self.robust.unwrap_or_else(|| Box::new(L2)),
        }
    }
}
