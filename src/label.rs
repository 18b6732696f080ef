use serde::{Deserialize, Serialize};

use crate::types::{Label, Pose};

/// Pose error bounds below which a relocalization counts as successful.
///
/// Both thresholds use the units of the pose files; `rotate_threshold` is compared
/// against the raw `phi` difference without wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelThresholds {
    pub move_threshold: f64,
    pub rotate_threshold: f64,
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            move_threshold: 5.0,
            rotate_threshold: 5.0,
        }
    }
}

impl LabelThresholds {
    pub fn new(move_threshold: f64, rotate_threshold: f64) -> LabelThresholds {
        LabelThresholds {
            move_threshold,
            rotate_threshold,
        }
    }

    /// Success iff every coordinate error is strictly below its threshold.
    pub fn derive(&self, reference: &Pose, predicted: &Pose) -> Label {
        let dx = (reference.x - predicted.x).abs();
        let dy = (reference.y - predicted.y).abs();
        let dphi = (reference.phi - predicted.phi).abs();
        if dx < self.move_threshold && dy < self.move_threshold && dphi < self.rotate_threshold
        {
            Label::Success
        } else {
            Label::Failure
        }
    }
}
