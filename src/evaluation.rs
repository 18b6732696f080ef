use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{JudgerError, Result};
use crate::model_selection::ShuffleSplit;
use crate::svm::{ModelConfiguration, Svc};
use crate::types::Label;
use crate::util::{linspace, mean_std};

/// Which subset the ROC curve is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RocSubset {
    /// In-sample diagnostic of the fit.
    Train,
    /// Held-out estimate.
    Test,
}

/// Which model output is thresholded along the ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RocScores {
    /// Signed distance to the boundary: one point per distinct value.
    Decision,
    /// Hard 0/1 predictions: a single operating point.
    Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Fractions of the cross-validation training size, ascending, in (0, 1].
    pub train_sizes: Vec<f64>,
    pub roc_subset: RocSubset,
    pub roc_scores: RocScores,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            train_sizes: linspace(0.1, 1.0, 10),
            roc_subset: RocSubset::Train,
            roc_scores: RocScores::Label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningCurvePoint {
    pub train_size: usize,
    pub train_mean: f64,
    pub train_std: f64,
    pub validation_mean: f64,
    pub validation_std: f64,
    /// Splits whose fit succeeded at this size.
    pub n_fits: usize,
}

/// Training and validation accuracy of `config` as the training set grows.
///
/// Every split of `cv` trains on a prefix of its (shuffled) training indices, so the
/// sizes are nested within a split.
pub fn learning_curve(
    dataset: &Dataset,
    config: &ModelConfiguration,
    train_sizes: &[f64],
    cv: &ShuffleSplit,
) -> Result<Vec<LearningCurvePoint>> {
    if let Some(f) = train_sizes.iter().find(|f| !(**f > 0.0 && **f <= 1.0)) {
        return Err(JudgerError::malformed(
            "learning curve configuration",
            format!("train size fraction {} is outside (0, 1]", f),
        ));
    }
    let splits = cv.split(dataset.len())?;
    let n_max = splits.first().map(|s| s.train.len()).unwrap_or(0);
    let mut sizes: Vec<usize> = train_sizes
        .iter()
        .map(|f| ((f * n_max as f64) as usize).max(1))
        .collect();
    sizes.sort_unstable();
    sizes.dedup();
    log::info!(
        "learning curve: sizes {:?} over {} splits",
        sizes,
        splits.len()
    );

    let x = dataset.features();
    let labels = dataset.labels();
    // scores[split][size]
    let scores: Vec<Vec<Option<(f64, f64)>>> = splits
        .par_iter()
        .map(|split| {
            let validation_x = x.select_rows(&split.test);
            let validation_labels: Vec<Label> = split.test.iter().map(|&i| labels[i]).collect();
            sizes
                .iter()
                .map(|&size| {
                    let rows = &split.train[..size];
                    let train_x = x.select_rows(rows);
                    let train_labels: Vec<Label> = rows.iter().map(|&i| labels[i]).collect();
                    match Svc::fit(&train_x, &train_labels, config) {
                        Ok(model) => Some((
                            model.score(&train_x, &train_labels),
                            model.score(&validation_x, &validation_labels),
                        )),
                        Err(e) => {
                            log::debug!("learning curve fit on {} samples failed: {}", size, e);
                            None
                        }
                    }
                })
                .collect()
        })
        .collect();

    let mut points = Vec::with_capacity(sizes.len());
    for (k, &size) in sizes.iter().enumerate() {
        let (train_scores, validation_scores): (Vec<f64>, Vec<f64>) =
            scores.iter().filter_map(|s| s[k]).unzip();
        if train_scores.is_empty() {
            log::warn!("learning curve: no split could be fit on {} samples, size dropped", size);
            continue;
        }
        if train_scores.len() < scores.len() {
            log::warn!(
                "learning curve: {} of {} fits failed on {} samples",
                scores.len() - train_scores.len(),
                scores.len(),
                size
            );
        }
        let (train_mean, train_std) = mean_std(&train_scores);
        let (validation_mean, validation_std) = mean_std(&validation_scores);
        points.push(LearningCurvePoint {
            train_size: size,
            train_mean,
            train_std,
            validation_mean,
            validation_std,
            n_fits: train_scores.len(),
        });
    }
    Ok(points)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Score threshold of each point; the first is +inf.
    pub thresholds: Vec<f64>,
    pub auc: f64,
}

/// Trapezoidal area under `y(x)`.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}

/// ROC points for every distinct score, from (0, 0) to (1, 1).
///
/// A sample is predicted successful at threshold `t` when its score is `>= t`.
pub fn roc_curve(labels: &[Label], scores: &[f64]) -> Result<RocCurve> {
    if labels.len() != scores.len() {
        return Err(JudgerError::malformed(
            "roc input",
            format!("{} labels but {} scores", labels.len(), scores.len()),
        ));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(JudgerError::malformed("roc input", "scores must be finite"));
    }
    let positives = labels.iter().filter(|l| **l == Label::Success).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(JudgerError::DegenerateSplit(format!(
            "roc needs both classes, got {} failures and {} successes",
            negatives, positives
        )));
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];
    let (mut tp, mut fp) = (0usize, 0usize);
    for (k, &i) in order.iter().enumerate() {
        match labels[i] {
            Label::Success => tp += 1,
            Label::Failure => fp += 1,
        }
        let last_of_tie = order.get(k + 1).is_none_or(|&next| scores[next] != scores[i]);
        if last_of_tie {
            fpr.push(fp as f64 / negatives as f64);
            tpr.push(tp as f64 / positives as f64);
            thresholds.push(scores[i]);
        }
    }
    let area = auc(&fpr, &tpr);
    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
        auc: area,
    })
}

/// ROC of an already fitted model over `subset`.
pub fn model_roc(model: &Svc, subset: &Dataset, scores: RocScores) -> Result<RocCurve> {
    let values: Vec<f64> = match scores {
        RocScores::Decision => model.decision_function(subset.features()),
        RocScores::Label => model
            .predict(subset.features())
            .into_iter()
            .map(|l| l.as_u8() as f64)
            .collect(),
    };
    roc_curve(subset.labels(), &values)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(predicted: &[Label], truth: &[Label]) -> ConfusionMatrix {
        let mut m = ConfusionMatrix::default();
        for (p, t) in predicted.iter().zip(truth) {
            match (p, t) {
                (Label::Success, Label::Success) => m.true_positive += 1,
                (Label::Success, Label::Failure) => m.false_positive += 1,
                (Label::Failure, Label::Success) => m.false_negative += 1,
                (Label::Failure, Label::Failure) => m.true_negative += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.true_positive + self.true_negative) as f64 / self.total() as f64
    }
}

/// Predictions of the selected model on the held-out subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeldOutEvaluation {
    pub predicted: Vec<Label>,
    pub decision_values: Vec<f64>,
    pub confusion: ConfusionMatrix,
}

pub fn evaluate_held_out(model: &Svc, test: &Dataset) -> HeldOutEvaluation {
    let decision_values = model.decision_function(test.features());
    let predicted: Vec<Label> = decision_values
        .iter()
        .map(|&v| Label::from_decision(v))
        .collect();
    let confusion = ConfusionMatrix::from_predictions(&predicted, test.labels());
    log::info!(
        "held-out accuracy {:.2}% (TP {}, FP {}, FN {}, TN {})",
        confusion.accuracy() * 100.0,
        confusion.true_positive,
        confusion.false_positive,
        confusion.false_negative,
        confusion.true_negative
    );
    HeldOutEvaluation {
        predicted,
        decision_values,
        confusion,
    }
}
