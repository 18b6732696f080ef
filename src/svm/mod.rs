pub mod kernel;

use linfa::prelude::*;
use linfa_svm::Svm;
use nalgebra as na;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{JudgerError, Result};
use crate::types::Label;
pub use kernel::KernelKind;

const STOPPING_TOLERANCE: f64 = 1e-3;

/// One point of the hyperparameter grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    pub kernel: KernelKind,
    #[serde(rename = "C")]
    pub c: f64,
    pub gamma: f64,
}

impl ModelConfiguration {
    pub fn rbf(c: f64, gamma: f64) -> ModelConfiguration {
        ModelConfiguration {
            kernel: KernelKind::Rbf,
            c,
            gamma,
        }
    }
}

/// Binary C-support vector classifier trained with `linfa-svm`.
///
/// Only the dual solution is kept; decision values are evaluated on nalgebra rows so
/// that precomputed distance matrices can be reused.
#[derive(Debug, Clone)]
pub struct Svc {
    config: ModelConfiguration,
    support_vectors: na::DMatrix<f64>,
    /// Row of each support vector in the training matrix.
    support_indices: Vec<usize>,
    /// `alpha_i * y_i` for every support vector.
    dual_coef: Vec<f64>,
    rho: f64,
}

fn to_records(x: &na::DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((x.nrows(), x.ncols()), |(i, j)| x[(i, j)])
}

impl Svc {
    /// Fits on the rows of `x`.
    pub fn fit(x: &na::DMatrix<f64>, labels: &[Label], config: &ModelConfiguration) -> Result<Svc> {
        let n = labels.len();
        if x.nrows() != n {
            return Err(JudgerError::malformed(
                "svm input",
                format!("{} rows but {} labels", x.nrows(), n),
            ));
        }
        let successes = labels.iter().filter(|l| **l == Label::Success).count();
        if successes == 0 || successes == n {
            return Err(JudgerError::NoConvergence(format!(
                "{} training samples hold a single class",
                n
            )));
        }
        let positive = |v: f64| v > 0.0 && v.is_finite();
        if !positive(config.c) || !positive(config.gamma) {
            return Err(JudgerError::NoConvergence(format!(
                "C and gamma must be positive, got C = {}, gamma = {}",
                config.c, config.gamma
            )));
        }

        let targets: Array1<bool> = labels.iter().map(|l| *l == Label::Success).collect();
        let dataset = Dataset::new(to_records(x), targets);
        // linfa's gaussian kernel is exp(-|a - b|^2 / eps)
        let model = Svm::<_, bool>::params()
            .pos_neg_weights(config.c, config.c)
            .gaussian_kernel(1.0 / config.gamma)
            .eps(STOPPING_TOLERANCE)
            .fit(&dataset)
            .map_err(|e| {
                JudgerError::NoConvergence(format!(
                    "C = {:e}, gamma = {:e}: {}",
                    config.c, config.gamma, e
                ))
            })?;
        if !model.rho.is_finite() || model.alpha.iter().any(|a| !a.is_finite()) {
            return Err(JudgerError::NoConvergence(format!(
                "non-finite solution for C = {:e}, gamma = {:e}",
                config.c, config.gamma
            )));
        }

        // alpha holds y_i * alpha_i for every training row
        let (support_indices, dual_coef): (Vec<usize>, Vec<f64>) = model
            .alpha
            .iter()
            .enumerate()
            .filter(|(_, a)| **a != 0.0)
            .map(|(i, a)| (i, *a))
            .unzip();
        log::trace!("fit C = {:e}, gamma = {:e}: {}", config.c, config.gamma, model);
        Ok(Svc {
            config: *config,
            support_vectors: x.select_rows(&support_indices),
            support_indices,
            dual_coef,
            rho: model.rho,
        })
    }

    pub fn config(&self) -> &ModelConfiguration {
        &self.config
    }

    pub fn n_support(&self) -> usize {
        self.support_indices.len()
    }

    pub fn support_indices(&self) -> &[usize] {
        &self.support_indices
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Signed distance to the boundary for every row of `x`; positive means success.
    pub fn decision_function(&self, x: &na::DMatrix<f64>) -> Vec<f64> {
        let k = self
            .config
            .kernel
            .matrix(self.config.gamma, x, &self.support_vectors);
        self.decision_from_kernel(&k)
    }

    /// Decision values from squared distances between the query rows and every row of
    /// the matrix this model was trained on.
    pub fn decision_from_squared_distances(&self, d2: &na::DMatrix<f64>) -> Vec<f64> {
        (0..d2.nrows())
            .map(|r| {
                self.support_indices
                    .iter()
                    .zip(&self.dual_coef)
                    .map(|(&s, coef)| {
                        coef * self
                            .config
                            .kernel
                            .from_squared_distance(self.config.gamma, d2[(r, s)])
                    })
                    .sum::<f64>()
                    - self.rho
            })
            .collect()
    }

    fn decision_from_kernel(&self, k: &na::DMatrix<f64>) -> Vec<f64> {
        (0..k.nrows())
            .map(|r| {
                self.dual_coef
                    .iter()
                    .enumerate()
                    .map(|(s, coef)| coef * k[(r, s)])
                    .sum::<f64>()
                    - self.rho
            })
            .collect()
    }

    pub fn predict(&self, x: &na::DMatrix<f64>) -> Vec<Label> {
        self.decision_function(x)
            .into_iter()
            .map(Label::from_decision)
            .collect()
    }

    /// Mean accuracy on `x`.
    pub fn score(&self, x: &na::DMatrix<f64>, labels: &[Label]) -> f64 {
        accuracy(&self.predict(x), labels)
    }
}

/// Fraction of positions where `predicted` equals `truth`.
pub fn accuracy(predicted: &[Label], truth: &[Label]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(truth)
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / truth.len() as f64
}
