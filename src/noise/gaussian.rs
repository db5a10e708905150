use std::fmt;

use super::NoiseModel;
use crate::dtype;
use crate::linalg::{MatrixX, VectorX};

/// A Gaussian noise model, represented by a square-root information matrix.
#[derive(Clone, Debug)]
pub struct GaussianNoise {
    sqrt_inf: MatrixX,
}

impl NoiseModel for GaussianNoise {
    fn dim(&self) -> usize {
        self.sqrt_inf.nrows()
    }

    fn whiten_vec(&self, v: &VectorX) -> VectorX {
        &self.sqrt_inf * v
    }

    fn whiten_mat(&self, m: &MatrixX) -> MatrixX {
        &self.sqrt_inf * m
    }
}

impl GaussianNoise {
    pub fn identity(dim: usize) -> Self {
        Self {
            sqrt_inf: MatrixX::identity(dim, dim),
        }
    }

    pub fn from_scalar_sigma(dim: usize, sigma: dtype) -> Self {
        Self {
            sqrt_inf: MatrixX::from_diagonal_element(dim, dim, 1.0 / sigma),
        }
    }

    pub fn from_scalar_cov(dim: usize, cov: dtype) -> Self {
        Self {
            sqrt_inf: MatrixX::from_diagonal_element(dim, dim, 1.0 / cov.sqrt()),
        }
    }

    pub fn from_vec_sigma(sigma: &VectorX) -> Self {
        let diag = sigma.map(|x| 1.0 / x);
        Self {
            sqrt_inf: MatrixX::from_diagonal(&diag),
        }
    }

    pub fn from_vec_cov(cov: &VectorX) -> Self {
        let diag = cov.map(|x| 1.0 / x.sqrt());
        Self {
            sqrt_inf: MatrixX::from_diagonal(&diag),
        }
    }

    pub fn from_vec_inf(inf: &VectorX) -> Self {
        let diag = inf.map(|x| x.sqrt());
        Self {
            sqrt_inf: MatrixX::from_diagonal(&diag),
        }
    }

    pub fn from_matrix_cov(cov: &MatrixX) -> Self {
        let sqrt_inf = cov
            .clone()
            .try_inverse()
            .expect("matrix inversion failed when creating sqrt covariance")
            .cholesky()
            .expect("cholesky failed when creating sqrt information")
            .l()
            .transpose();
        Self { sqrt_inf }
    }

    pub fn from_matrix_inf(inf: &MatrixX) -> Self {
        let sqrt_inf = inf
            .clone()
            .cholesky()
            .expect("cholesky failed when creating sqrt information")
            .l()
            .transpose();
        Self { sqrt_inf }
    }

    pub fn from_diag_sigmas(sigmas: &[dtype]) -> Self {
        Self::from_vec_sigma(&VectorX::from_row_slice(sigmas))
    }

    pub fn from_diag_covs(covs: &[dtype]) -> Self {
        Self::from_vec_cov(&VectorX::from_row_slice(covs))
    }
}

impl fmt::Display for GaussianNoise {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GaussianNoise{}: {}", self.dim(), self.sqrt_inf)
    }
}
