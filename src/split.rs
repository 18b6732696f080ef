use nalgebra as na;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{JudgerError, Result};
use crate::types::Label;

/// What to do with a training column that has (numerically) zero spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Divide by 1 instead; the column becomes `(x - mean) * scale`.
    UnitStd,
    /// Fail with `NormalizationError`.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub normalization_scale: f64,
    pub zero_variance: ZeroVariancePolicy,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            normalization_scale: 1000.0,
            zero_variance: ZeroVariancePolicy::UnitStd,
        }
    }
}

/// Disjoint row indices into one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainTestIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified random partition with `round(n * test_fraction)` rows in test.
///
/// The test quota is shared between the classes in proportion to their size
/// (largest remainder first, failures before successes on ties), and each class is
/// shuffled with its own draw from a ChaCha RNG seeded by `seed`.
pub fn stratified_split(
    labels: &[Label],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestIndices> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(JudgerError::malformed(
            "split configuration",
            format!("test_fraction must lie in (0, 1), got {}", test_fraction),
        ));
    }
    let n = labels.len();
    if n == 0 {
        return Err(JudgerError::EmptyDataset);
    }
    let n_test = (n as f64 * test_fraction).round() as usize;

    let classes = [Label::Failure, Label::Success];
    let members: Vec<Vec<usize>> = classes
        .iter()
        .map(|c| (0..n).filter(|&i| labels[i] == *c).collect())
        .collect();

    let ideal: Vec<f64> = members
        .iter()
        .map(|m| m.len() as f64 * n_test as f64 / n as f64)
        .collect();
    let mut quota: Vec<usize> = ideal.iter().map(|q| q.floor() as usize).collect();
    let mut remaining = n_test.saturating_sub(quota.iter().sum());
    let mut by_remainder: Vec<usize> = (0..classes.len()).collect();
    // stable sort keeps class order on equal remainders
    by_remainder.sort_by(|&a, &b| {
        let ra = ideal[a] - ideal[a].floor();
        let rb = ideal[b] - ideal[b].floor();
        rb.total_cmp(&ra)
    });
    for k in by_remainder {
        if remaining == 0 {
            break;
        }
        if quota[k] < members[k].len() {
            quota[k] += 1;
            remaining -= 1;
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (mut m, q) in members.into_iter().zip(quota) {
        m.shuffle(&mut rng);
        test.extend_from_slice(&m[..q]);
        train.extend_from_slice(&m[q..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestIndices { train, test })
}

/// Per-column z-score parameters taken from the training rows only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParameters {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
    pub scale: f64,
}

impl NormalizationParameters {
    /// Population mean and standard deviation of every column of `train`.
    pub fn fit(train: &Dataset, scale: f64, policy: ZeroVariancePolicy) -> Result<Self> {
        let x = train.features();
        let n = x.nrows();
        if n == 0 {
            return Err(JudgerError::EmptyDataset);
        }
        let mut means = Vec::with_capacity(x.ncols());
        let mut stds = Vec::with_capacity(x.ncols());
        for (j, name) in train.feature_names().iter().enumerate() {
            let column = x.column(j);
            let mut mean = column.sum() / n as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            let mut std = var.sqrt();
            if !mean.is_finite() || !std.is_finite() {
                return Err(JudgerError::NormalizationError {
                    feature: name.clone(),
                    reason: "training values are not finite".to_string(),
                });
            }
            if std <= 1e-12 * mean.abs().max(1.0) {
                match policy {
                    ZeroVariancePolicy::Reject => {
                        return Err(JudgerError::NormalizationError {
                            feature: name.clone(),
                            reason: format!("zero variance over {} training rows", n),
                        });
                    }
                    ZeroVariancePolicy::UnitStd => {
                        log::warn!(
                            "feature `{}` is constant ({}) in the training subset, using std = 1",
                            name,
                            mean
                        );
                        std = 1.0;
                        // every training row maps to exactly 0
                        mean = column[0];
                    }
                }
            }
            means.push(mean);
            stds.push(std);
        }
        Ok(NormalizationParameters { means, stds, scale })
    }

    /// `((x - mean) / std) * scale` for every entry.
    pub fn transform(&self, features: &na::DMatrix<f64>) -> na::DMatrix<f64> {
        let mut out = features.clone();
        for (j, mut column) in out.column_iter_mut().enumerate() {
            let (mean, std) = (self.means[j], self.stds[j]);
            column.apply(|v| *v = ((*v - mean) / std) * self.scale);
        }
        out
    }

    pub fn transform_dataset(&self, dataset: &Dataset) -> Result<Dataset> {
        if dataset.num_features() != self.means.len() {
            return Err(JudgerError::malformed(
                "normalization",
                format!(
                    "fitted on {} features, applied to {}",
                    self.means.len(),
                    dataset.num_features()
                ),
            ));
        }
        dataset.with_features(self.transform(dataset.features()))
    }
}

/// Output of the split stage. Raw subsets are kept for the prediction table.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub indices: TrainTestIndices,
    pub train: Dataset,
    pub test: Dataset,
    pub normalization: NormalizationParameters,
    pub train_normalized: Dataset,
    pub test_normalized: Dataset,
}

fn check_subset(name: &str, subset: &Dataset) -> Result<()> {
    if subset.len() < 2 {
        return Err(JudgerError::DegenerateSplit(format!(
            "{} subset has {} samples",
            name,
            subset.len()
        )));
    }
    let (failures, successes) = subset.class_counts();
    if failures == 0 || successes == 0 {
        return Err(JudgerError::DegenerateSplit(format!(
            "{} subset holds a single class ({} failures, {} successes)",
            name, failures, successes
        )));
    }
    Ok(())
}

/// Partitions `dataset` and normalizes both halves with train-only statistics.
pub fn split_and_normalize(
    dataset: &Dataset,
    config: &SplitConfig,
    seed: u64,
) -> Result<SplitDataset> {
    let indices = stratified_split(dataset.labels(), config.test_fraction, seed)?;
    let train = dataset.subset(&indices.train);
    let test = dataset.subset(&indices.test);
    check_subset("train", &train)?;
    check_subset("test", &test)?;

    let normalization =
        NormalizationParameters::fit(&train, config.normalization_scale, config.zero_variance)?;
    let train_normalized = normalization.transform_dataset(&train)?;
    let test_normalized = normalization.transform_dataset(&test)?;
    log::info!(
        "split {} samples into {} train / {} test",
        dataset.len(),
        train.len(),
        test.len()
    );
    Ok(SplitDataset {
        indices,
        train,
        test,
        normalization,
        train_normalized,
        test_normalized,
    })
}
