//! The full run: assemble, split and normalize, search, evaluate.
//!
//! Each stage takes the previous stage's output by reference and returns a new value.

use std::path::Path;

use crate::config::JudgerConfig;
use crate::dataset::Dataset;
use crate::error::{JudgerError, Result};
use crate::evaluation::{
    HeldOutEvaluation, LearningCurvePoint, RocCurve, RocSubset, evaluate_held_out, learning_curve,
    model_roc,
};
use crate::io;
use crate::model_selection::{GridSearchOutcome, ShuffleSplit, grid_search};
use crate::split::{SplitDataset, split_and_normalize};
use crate::types::Sample;
use crate::visualization::{render_learning_curve, render_roc_curve};

pub const DATA_FILE: &str = "Data.csv";
pub const LEARNING_CURVE_FILE: &str = "LearningCurve.png";
pub const ROC_FILE: &str = "ROC.png";
pub const PREDICTIONS_FILE: &str = "PredictData.csv";
pub const ANALYSIS_RESULT_FILE: &str = "AnalysisResult.txt";
pub const REPORT_FILE: &str = "report.json";
pub const CONFIG_FILE: &str = "config.json";

pub struct AnalysisOutcome {
    pub dataset: Dataset,
    pub split: SplitDataset,
    pub search: GridSearchOutcome,
    pub learning_curve: Vec<LearningCurvePoint>,
    pub roc_subset: RocSubset,
    pub roc: RocCurve,
    pub held_out: HeldOutEvaluation,
}

/// Runs every stage on samples in the given order.
pub fn run(samples: &[Sample], config: &JudgerConfig) -> Result<AnalysisOutcome> {
    config.validate()?;
    let dataset = Dataset::from_samples(samples)?;
    let (failures, successes) = dataset.class_counts();
    log::info!(
        "assembled {} samples x {} features ({} successes, {} failures)",
        dataset.len(),
        dataset.num_features(),
        successes,
        failures
    );
    run_on_dataset(dataset, config)
}

pub fn run_on_dataset(dataset: Dataset, config: &JudgerConfig) -> Result<AnalysisOutcome> {
    config.validate()?;
    if dataset.is_empty() {
        return Err(JudgerError::EmptyDataset);
    }
    let split = split_and_normalize(&dataset, &config.split, config.random_seed)?;
    let search = grid_search(&split.train_normalized, &config.search, config.random_seed)?;

    let cv = ShuffleSplit::new(
        config.search.cv_splits,
        config.search.cv_test_fraction,
        config.random_seed,
    );
    let learning_curve = learning_curve(
        &split.train_normalized,
        &search.best,
        &config.curves.train_sizes,
        &cv,
    )?;

    let roc_subset = config.curves.roc_subset;
    let roc_data = match roc_subset {
        RocSubset::Train => {
            log::info!("ROC on the training subset measures fit quality, not generalization");
            &split.train_normalized
        }
        RocSubset::Test => &split.test_normalized,
    };
    let roc = model_roc(&search.model, roc_data, config.curves.roc_scores)?;
    log::info!("ROC AUC {:.4} over {} points", roc.auc, roc.fpr.len());

    let held_out = evaluate_held_out(&search.model, &split.test_normalized);
    Ok(AnalysisOutcome {
        dataset,
        split,
        search,
        learning_curve,
        roc_subset,
        roc,
        held_out,
    })
}

/// Writes tables, report and (optionally) plots into `output_dir`, creating it.
pub fn write_artifacts(
    outcome: &AnalysisOutcome,
    config: &JudgerConfig,
    output_dir: &Path,
    render_plots: bool,
    timestamp: &str,
) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| JudgerError::io(output_dir.display().to_string(), e))?;
    io::write_data_table(&output_dir.join(DATA_FILE), &outcome.dataset)?;
    io::write_predictions(
        &output_dir.join(PREDICTIONS_FILE),
        &outcome.split.test,
        &outcome.held_out,
    )?;
    io::write_analysis_result(
        &output_dir.join(ANALYSIS_RESULT_FILE),
        &outcome.held_out.confusion,
    )?;
    io::write_report(&output_dir.join(REPORT_FILE), outcome, timestamp)?;
    io::object_to_json(&output_dir.join(CONFIG_FILE), config)?;
    if render_plots {
        render_learning_curve(&output_dir.join(LEARNING_CURVE_FILE), &outcome.learning_curve)?;
        render_roc_curve(&output_dir.join(ROC_FILE), &outcome.roc)?;
    }
    log::info!("results written to {}", output_dir.display());
    Ok(())
}
