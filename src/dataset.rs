use std::collections::HashSet;

use nalgebra as na;

use crate::error::{JudgerError, Result};
use crate::types::{FeatureSet, Label, Sample};

/// Feature matrix (one row per sample) with its parallel label column.
#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    features: na::DMatrix<f64>,
    labels: Vec<Label>,
}

impl Dataset {
    pub fn new(
        feature_names: Vec<String>,
        features: na::DMatrix<f64>,
        labels: Vec<Label>,
    ) -> Result<Dataset> {
        if features.nrows() != labels.len() {
            return Err(JudgerError::malformed(
                "dataset",
                format!("{} rows but {} labels", features.nrows(), labels.len()),
            ));
        }
        if features.ncols() != feature_names.len() {
            return Err(JudgerError::malformed(
                "dataset",
                format!(
                    "{} columns but {} feature names",
                    features.ncols(),
                    feature_names.len()
                ),
            ));
        }
        Ok(Dataset {
            feature_names,
            features,
            labels,
        })
    }

    /// Assembles samples in the given order.
    pub fn from_samples(samples: &[Sample]) -> Result<Dataset> {
        let mut assembler = DatasetAssembler::new();
        for s in samples {
            assembler.push(&s.origin, &s.features, s.label)?;
        }
        assembler.finish()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn features(&self) -> &na::DMatrix<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Rows at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            features: self.features.select_rows(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Same rows and labels with a different feature matrix, e.g. after normalization.
    pub fn with_features(&self, features: na::DMatrix<f64>) -> Result<Dataset> {
        Dataset::new(self.feature_names.clone(), features, self.labels.clone())
    }

    /// (failures, successes)
    pub fn class_counts(&self) -> (usize, usize) {
        let successes = self.labels.iter().filter(|l| **l == Label::Success).count();
        (self.labels.len() - successes, successes)
    }
}

/// Builds a [`Dataset`] row by row, fixing the column order from the first feature set.
#[derive(Debug, Default)]
pub struct DatasetAssembler {
    feature_names: Option<Vec<String>>,
    values: Vec<f64>,
    labels: Vec<Label>,
}

impl DatasetAssembler {
    pub fn new() -> DatasetAssembler {
        DatasetAssembler::default()
    }

    /// Canonical column order, once the first sample has been pushed.
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Appends one sample; values are looked up by name, never by position.
    pub fn push(&mut self, origin: &str, features: &FeatureSet, label: Label) -> Result<()> {
        if self.feature_names.is_none() {
            if features.is_empty() {
                return Err(JudgerError::SchemaMismatch {
                    sample: origin.to_string(),
                    missing: Vec::new(),
                    unexpected: Vec::new(),
                });
            }
            let names: Vec<String> = features.names().map(str::to_string).collect();
            log::debug!("feature schema fixed by {}: {:?}", origin, names);
            self.feature_names = Some(names);
        }
        let names = self.feature_names.get_or_insert_with(Vec::new);

        let known: HashSet<&str> = names.iter().map(String::as_str).collect();
        let unexpected: Vec<String> = features
            .names()
            .filter(|n| !known.contains(n))
            .map(str::to_string)
            .collect();
        let missing: Vec<String> = names
            .iter()
            .filter(|n| features.get(n).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(JudgerError::SchemaMismatch {
                sample: origin.to_string(),
                missing,
                unexpected,
            });
        }

        // every name was checked above
        self.values.extend(names.iter().filter_map(|n| features.get(n)));
        self.labels.push(label);
        Ok(())
    }

    pub fn finish(self) -> Result<Dataset> {
        let Some(feature_names) = self.feature_names else {
            return Err(JudgerError::EmptyDataset);
        };
        let features =
            na::DMatrix::from_row_slice(self.labels.len(), feature_names.len(), &self.values);
        Dataset::new(feature_names, features, self.labels)
    }
}
