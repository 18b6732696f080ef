use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Similarity function between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// `exp(-gamma * |a - b|^2)`
    #[default]
    Rbf,
}

/// Squared euclidean distance between every row of `a` and every row of `b`.
pub fn squared_distances(a: &na::DMatrix<f64>, b: &na::DMatrix<f64>) -> na::DMatrix<f64> {
    let dims = a.ncols();
    na::DMatrix::from_fn(a.nrows(), b.nrows(), |i, j| {
        (0..dims)
            .map(|k| {
                let d = a[(i, k)] - b[(j, k)];
                d * d
            })
            .sum()
    })
}

impl KernelKind {
    pub fn from_squared_distance(&self, gamma: f64, d2: f64) -> f64 {
        match self {
            KernelKind::Rbf => (-gamma * d2).exp(),
        }
    }

    /// Kernel values from a precomputed squared distance matrix.
    pub fn matrix_from_squared_distances(
        &self,
        gamma: f64,
        d2: &na::DMatrix<f64>,
    ) -> na::DMatrix<f64> {
        d2.map(|d| self.from_squared_distance(gamma, d))
    }

    /// Rows of `a` against rows of `b`.
    pub fn matrix(&self, gamma: f64, a: &na::DMatrix<f64>, b: &na::DMatrix<f64>) -> na::DMatrix<f64> {
        self.matrix_from_squared_distances(gamma, &squared_distances(a, b))
    }
}
