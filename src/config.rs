use serde::{Deserialize, Serialize};

use crate::data_loader::DatasetLayout;
use crate::error::{JudgerError, Result};
use crate::evaluation::CurveConfig;
use crate::label::LabelThresholds;
use crate::model_selection::SearchConfig;
use crate::split::SplitConfig;

/// Every tunable of a run. Serialized flat, e.g.
/// `{"move_threshold": 5.0, "test_fraction": 0.2, "c_grid": {"start": -4, "stop": 5, "num": 10}}`;
/// absent keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgerConfig {
    #[serde(flatten)]
    pub thresholds: LabelThresholds,
    #[serde(flatten)]
    pub split: SplitConfig,
    #[serde(flatten)]
    pub search: SearchConfig,
    #[serde(flatten)]
    pub curves: CurveConfig,
    pub random_seed: u64,
    pub layout: DatasetLayout,
}

impl Default for JudgerConfig {
    fn default() -> Self {
        Self {
            thresholds: LabelThresholds::default(),
            split: SplitConfig::default(),
            search: SearchConfig::default(),
            curves: CurveConfig::default(),
            random_seed: 1,
            layout: DatasetLayout::default(),
        }
    }
}

fn invalid(reason: String) -> JudgerError {
    JudgerError::malformed("configuration", reason)
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must lie in (0, 1), got {}", name, value)))
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{} must be positive, got {}", name, value)))
    }
}

impl JudgerConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("move_threshold", self.thresholds.move_threshold)?;
        check_positive("rotate_threshold", self.thresholds.rotate_threshold)?;
        check_fraction("test_fraction", self.split.test_fraction)?;
        check_positive("normalization_scale", self.split.normalization_scale)?;
        check_fraction("cv_test_fraction", self.search.cv_test_fraction)?;
        if self.search.cv_splits == 0 {
            return Err(invalid("cv_splits must be at least 1".to_string()));
        }
        for (name, axis) in [("c_grid", &self.search.c_grid), ("gamma_grid", &self.search.gamma_grid)] {
            let values = axis.values();
            if values.is_empty() {
                return Err(invalid(format!("{} is empty", name)));
            }
            for v in values {
                check_positive(name, v)?;
            }
        }
        if self.curves.train_sizes.is_empty() {
            return Err(invalid("train_sizes is empty".to_string()));
        }
        if let Some(f) = self
            .curves
            .train_sizes
            .iter()
            .find(|f| !(**f > 0.0 && **f <= 1.0))
        {
            return Err(invalid(format!("train size fraction {} is outside (0, 1]", f)));
        }
        Ok(())
    }
}
