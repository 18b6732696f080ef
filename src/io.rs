use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::dataset::Dataset;
use crate::error::{JudgerError, Result};
use crate::evaluation::{ConfusionMatrix, HeldOutEvaluation, LearningCurvePoint, RocCurve, RocSubset};
use crate::model_selection::CandidateScore;
use crate::pipeline::AnalysisOutcome;
use crate::split::NormalizationParameters;
use crate::svm::ModelConfiguration;

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| JudgerError::io(path.display().to_string(), e))
}

fn finish(mut writer: BufWriter<File>, path: &Path) -> Result<()> {
    writer
        .flush()
        .map_err(|e| JudgerError::io(path.display().to_string(), e))
}

/// Serializes an object to a pretty JSON file.
pub fn object_to_json<T: Serialize>(output_path: &Path, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)
        .map_err(|e| JudgerError::malformed(output_path.display().to_string(), e))?;
    std::fs::write(output_path, j).map_err(|e| JudgerError::io(output_path.display().to_string(), e))
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let origin = file_path.display().to_string();
    let contents = std::fs::read_to_string(file_path)
        .map_err(|e| JudgerError::malformed(origin.clone(), format!("cannot read: {}", e)))?;
    serde_json::from_str(&contents).map_err(|e| JudgerError::malformed(origin, e))
}

/// Feature table: a header of feature names then `Label`, every cell followed by a comma.
pub fn write_data_table(output_path: &Path, dataset: &Dataset) -> Result<()> {
    let mut s = String::new();
    for name in dataset.feature_names() {
        s += name;
        s += ",";
    }
    s += "Label,\n";
    let x = dataset.features();
    for (i, label) in dataset.labels().iter().enumerate() {
        for j in 0..x.ncols() {
            s += &format!("{},", x[(i, j)]);
        }
        s += &format!("{},\n", label.as_u8());
    }
    let mut file = create(output_path)?;
    file.write_all(s.as_bytes())
        .map_err(|e| JudgerError::io(output_path.display().to_string(), e))?;
    finish(file, output_path)
}

/// Held-out predictions next to the raw test features; `*` marks a misclassified row.
pub fn write_predictions(
    output_path: &Path,
    test: &Dataset,
    held_out: &HeldOutEvaluation,
) -> Result<()> {
    let mut file = create(output_path)?;
    let io_err = |e| JudgerError::io(output_path.display().to_string(), e);
    for name in test.feature_names() {
        write!(file, "{},", name).map_err(io_err)?;
    }
    writeln!(file, "real_value,predict_value,outliers").map_err(io_err)?;
    let x = test.features();
    for (i, (truth, predicted)) in test.labels().iter().zip(&held_out.predicted).enumerate() {
        for j in 0..x.ncols() {
            write!(file, "{},", x[(i, j)]).map_err(io_err)?;
        }
        let flag = if truth == predicted { "" } else { "*" };
        writeln!(file, "{},{},{}", truth.as_u8(), predicted.as_u8(), flag).map_err(io_err)?;
    }
    finish(file, output_path)
}

/// Confusion counts and accuracy of the held-out predictions as plain text.
pub fn write_analysis_result(output_path: &Path, confusion: &ConfusionMatrix) -> Result<()> {
    let mut s = String::new();
    s += "**************** judger predict result ****************\n";
    s += format!("TP = {}\n", confusion.true_positive).as_str();
    s += format!("FP = {}\n", confusion.false_positive).as_str();
    s += format!("FN = {}\n", confusion.false_negative).as_str();
    s += format!("TN = {}\n", confusion.true_negative).as_str();
    s += format!("Accuracy = {}%\n", confusion.accuracy() * 100.0).as_str();
    std::fs::write(output_path, s).map_err(|e| JudgerError::io(output_path.display().to_string(), e))
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    timestamp: String,
    feature_names: &'a [String],
    sample_count: usize,
    success_count: usize,
    train_count: usize,
    test_count: usize,
    normalization: &'a NormalizationParameters,
    selected: &'a ModelConfiguration,
    cv_accuracy: f64,
    support_vectors: usize,
    grid: &'a [CandidateScore],
    learning_curve: &'a [LearningCurvePoint],
    roc_subset: RocSubset,
    roc: &'a RocCurve,
    held_out: &'a ConfusionMatrix,
    held_out_accuracy: f64,
}

/// Everything a run produced, as one JSON document.
pub fn write_report(output_path: &Path, outcome: &AnalysisOutcome, timestamp: &str) -> Result<()> {
    let report = AnalysisReport {
        timestamp: timestamp.to_string(),
        feature_names: outcome.dataset.feature_names(),
        sample_count: outcome.dataset.len(),
        success_count: outcome.dataset.class_counts().1,
        train_count: outcome.split.train.len(),
        test_count: outcome.split.test.len(),
        normalization: &outcome.split.normalization,
        selected: &outcome.search.best,
        cv_accuracy: outcome.search.best_score,
        support_vectors: outcome.search.model.n_support(),
        grid: &outcome.search.candidates,
        learning_curve: &outcome.learning_curve,
        roc_subset: outcome.roc_subset,
        roc: &outcome.roc,
        held_out: &outcome.held_out.confusion,
        held_out_accuracy: outcome.held_out.confusion.accuracy(),
    };
    object_to_json(output_path, &report)
}
