use indicatif::ParallelProgressIterator;
use nalgebra as na;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{JudgerError, Result};
use crate::split::TrainTestIndices;
use crate::svm::{self, KernelKind, ModelConfiguration, Svc, kernel::squared_distances};
use crate::types::Label;
use crate::util::{logspace, mean_std};

/// Values taken by one hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridAxis {
    /// `num` points from `10^start` to `10^stop`.
    LogSpace { start: f64, stop: f64, num: usize },
    Values(Vec<f64>),
}

impl GridAxis {
    pub fn values(&self) -> Vec<f64> {
        match self {
            GridAxis::LogSpace { start, stop, num } => logspace(*start, *stop, *num),
            GridAxis::Values(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub kernel: KernelKind,
    pub c_grid: GridAxis,
    pub gamma_grid: GridAxis,
    pub cv_splits: usize,
    pub cv_test_fraction: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::Rbf,
            c_grid: GridAxis::LogSpace {
                start: -4.0,
                stop: 5.0,
                num: 10,
            },
            gamma_grid: GridAxis::LogSpace {
                start: -9.0,
                stop: 3.0,
                num: 13,
            },
            cv_splits: 10,
            cv_test_fraction: 0.2,
        }
    }
}

/// Cartesian product `C x gamma` for a fixed kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperParameterGrid {
    pub kernel: KernelKind,
    pub c_values: Vec<f64>,
    pub gamma_values: Vec<f64>,
}

impl HyperParameterGrid {
    pub fn from_config(config: &SearchConfig) -> HyperParameterGrid {
        HyperParameterGrid {
            kernel: config.kernel,
            c_values: config.c_grid.values(),
            gamma_values: config.gamma_grid.values(),
        }
    }

    pub fn len(&self) -> usize {
        self.c_values.len() * self.gamma_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// C is the outer axis, gamma the inner one. This order breaks ties.
    pub fn configurations(&self) -> Vec<ModelConfiguration> {
        self.c_values
            .iter()
            .flat_map(|&c| {
                self.gamma_values.iter().map(move |&gamma| ModelConfiguration {
                    kernel: self.kernel,
                    c,
                    gamma,
                })
            })
            .collect()
    }
}

/// Repeated random train/validation partitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShuffleSplit {
    pub n_splits: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl ShuffleSplit {
    pub fn new(n_splits: usize, test_fraction: f64, seed: u64) -> ShuffleSplit {
        ShuffleSplit {
            n_splits,
            test_fraction,
            seed,
        }
    }

    /// `ceil(n * test_fraction)` validation rows per split. Indices keep the
    /// shuffled order, so a prefix of `train` is itself a random subset.
    pub fn split(&self, n: usize) -> Result<Vec<TrainTestIndices>> {
        if self.n_splits == 0 || !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(JudgerError::malformed(
                "cross-validation configuration",
                format!(
                    "need at least one split and a fraction in (0, 1), got {} and {}",
                    self.n_splits, self.test_fraction
                ),
            ));
        }
        let n_test = (n as f64 * self.test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(JudgerError::DegenerateSplit(format!(
                "cannot hold out {} of {} samples for validation",
                n_test, n
            )));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Ok((0..self.n_splits)
            .map(|_| {
                let mut permutation: Vec<usize> = (0..n).collect();
                permutation.shuffle(&mut rng);
                let train = permutation.split_off(n_test);
                TrainTestIndices {
                    train,
                    test: permutation,
                }
            })
            .collect())
    }
}

/// One cross-validation split with the validation distances every configuration needs.
pub(crate) struct Fold {
    train_x: na::DMatrix<f64>,
    train_labels: Vec<Label>,
    validation_labels: Vec<Label>,
    validation_d2: na::DMatrix<f64>,
}

impl Fold {
    pub(crate) fn new(dataset: &Dataset, split: &TrainTestIndices) -> Fold {
        let train_x = dataset.features().select_rows(&split.train);
        let validation_x = dataset.features().select_rows(&split.test);
        Fold {
            validation_d2: squared_distances(&validation_x, &train_x),
            train_labels: split.train.iter().map(|&i| dataset.labels()[i]).collect(),
            validation_labels: split.test.iter().map(|&i| dataset.labels()[i]).collect(),
            train_x,
        }
    }

    /// Validation accuracy of `config` trained on this fold.
    pub(crate) fn score(&self, config: &ModelConfiguration) -> Result<f64> {
        let model = Svc::fit(&self.train_x, &self.train_labels, config)?;
        let predicted: Vec<Label> = model
            .decision_from_squared_distances(&self.validation_d2)
            .into_iter()
            .map(Label::from_decision)
            .collect();
        Ok(svm::accuracy(&predicted, &self.validation_labels))
    }
}

/// Cross-validation result of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub index: usize,
    pub config: ModelConfiguration,
    pub fold_scores: Vec<f64>,
    pub mean_score: Option<f64>,
    pub std_score: Option<f64>,
    /// Set when some fold could not be fit; the candidate is then never selected.
    pub error: Option<String>,
}

fn score_candidate(index: usize, config: ModelConfiguration, folds: &[Fold]) -> CandidateScore {
    let mut fold_scores = Vec::with_capacity(folds.len());
    for fold in folds {
        match fold.score(&config) {
            Ok(s) => fold_scores.push(s),
            Err(e) => {
                log::debug!(
                    "C = {:e}, gamma = {:e} discarded: {}",
                    config.c,
                    config.gamma,
                    e
                );
                return CandidateScore {
                    index,
                    config,
                    fold_scores,
                    mean_score: None,
                    std_score: None,
                    error: Some(e.to_string()),
                };
            }
        }
    }
    let (mean, std) = mean_std(&fold_scores);
    log::debug!(
        "C = {:e}, gamma = {:e}: {:.4} (+/- {:.4})",
        config.c,
        config.gamma,
        mean,
        std
    );
    CandidateScore {
        index,
        config,
        fold_scores,
        mean_score: Some(mean),
        std_score: Some(std),
        error: None,
    }
}

pub struct GridSearchOutcome {
    pub best: ModelConfiguration,
    pub best_index: usize,
    pub best_score: f64,
    /// Every grid point in enumeration order.
    pub candidates: Vec<CandidateScore>,
    /// The winner refit on the whole training subset.
    pub model: Svc,
}

/// Exhaustive search over the grid, scored by shuffle-split cross-validation.
///
/// Candidates are evaluated in parallel and ranked in grid order: the first
/// configuration with the highest mean validation accuracy wins.
pub fn grid_search(
    train: &Dataset,
    config: &SearchConfig,
    seed: u64,
) -> Result<GridSearchOutcome> {
    let grid = HyperParameterGrid::from_config(config);
    if grid.is_empty() {
        return Err(JudgerError::malformed(
            "search configuration",
            "hyperparameter grid is empty",
        ));
    }
    let splits =
        ShuffleSplit::new(config.cv_splits, config.cv_test_fraction, seed).split(train.len())?;
    let folds: Vec<Fold> = splits.par_iter().map(|s| Fold::new(train, s)).collect();

    log::info!(
        "grid search over {} configurations x {} folds on {} samples",
        grid.len(),
        folds.len(),
        train.len()
    );
    let configurations = grid.configurations();
    let mut candidates: Vec<CandidateScore> = configurations
        .par_iter()
        .enumerate()
        .progress_count(configurations.len() as u64)
        .map(|(index, c)| score_candidate(index, *c, &folds))
        .collect();
    candidates.sort_by_key(|c| c.index);

    let mut best: Option<(usize, f64)> = None;
    for c in &candidates {
        if let Some(score) = c.mean_score {
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((c.index, score));
            }
        }
    }
    let failed = candidates.iter().filter(|c| c.error.is_some()).count();
    let Some((best_index, best_score)) = best else {
        return Err(JudgerError::NoConvergence(format!(
            "none of the {} configurations could be fit",
            candidates.len()
        )));
    };
    if failed > 0 {
        log::warn!("{} of {} configurations could not be fit", failed, candidates.len());
    }

    let best_config = candidates[best_index].config;
    log::info!(
        "best configuration: C = {:e}, gamma = {:e}, cv accuracy = {:.4}",
        best_config.c,
        best_config.gamma,
        best_score
    );
    let model = Svc::fit(train.features(), train.labels(), &best_config)?;
    Ok(GridSearchOutcome {
        best: best_config,
        best_index,
        best_score,
        candidates,
        model,
    })
}
