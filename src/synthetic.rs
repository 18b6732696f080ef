//! Synthetic relocalization telemetry with a known linear decision boundary.

use std::path::Path;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::data_loader::DatasetLayout;
use crate::error::{JudgerError, Result};
use crate::label::LabelThresholds;
use crate::types::{FeatureSet, Pose, Sample};

pub const INFORMATIVE_FEATURES: [&str; 2] = ["avg_hit_conf", "max_ser_conf"];

/// Successful iff `avg_hit_conf + max_ser_conf > BOUNDARY`.
const BOUNDARY: f64 = 100.0;
/// No sample is drawn closer than this to the boundary.
const MARGIN: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    pub scenes: usize,
    pub positions_per_scene: usize,
    /// Extra uniform features unrelated to the label.
    pub noise_features: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            scenes: 4,
            positions_per_scene: 25,
            noise_features: 1,
            seed: 0,
        }
    }
}

fn pose_error(rng: &mut ChaCha8Rng, success: bool, thresholds: &LabelThresholds) -> (f64, f64, f64) {
    if success {
        let m = thresholds.move_threshold * 0.5;
        let r = thresholds.rotate_threshold * 0.5;
        (
            rng.random_range(-m..m),
            rng.random_range(-m..m),
            rng.random_range(-r..r),
        )
    } else {
        let sign = |rng: &mut ChaCha8Rng| if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let dx = sign(&mut *rng) * rng.random_range(2.0..10.0) * thresholds.move_threshold;
        (dx, rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))
    }
}

/// Samples whose pose error, and hence label, follows the informative features.
///
/// Feature keys are inserted in a shuffled order per sample.
pub fn generate_samples(config: &SyntheticConfig, thresholds: &LabelThresholds) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut samples = Vec::with_capacity(config.scenes * config.positions_per_scene);
    for scene in 0..config.scenes {
        for position in 0..config.positions_per_scene {
            let (a, b) = loop {
                let a: f64 = rng.random_range(0.0..100.0);
                let b: f64 = rng.random_range(0.0..100.0);
                if (a + b - BOUNDARY).abs() >= MARGIN {
                    break (a, b);
                }
            };
            let success = a + b > BOUNDARY;

            let mut entries: Vec<(String, f64)> = vec![
                (INFORMATIVE_FEATURES[0].to_string(), a),
                (INFORMATIVE_FEATURES[1].to_string(), b),
            ];
            for k in 0..config.noise_features {
                entries.push((format!("noise_{}", k), rng.random_range(0.0..100.0)));
            }
            entries.shuffle(&mut rng);

            let reference = Pose::new(
                rng.random_range(-500.0..500.0),
                rng.random_range(-500.0..500.0),
                rng.random_range(0.0..360.0),
            );
            let (dx, dy, dphi) = pose_error(&mut rng, success, thresholds);
            let predicted = Pose::new(reference.x + dx, reference.y + dy, reference.phi + dphi);
            samples.push(Sample {
                origin: format!("scene_{:02}/position_{:04}", scene, position),
                features: entries.into_iter().collect::<FeatureSet>(),
                label: thresholds.derive(&reference, &predicted),
                reference,
                predicted,
            });
        }
    }
    samples
}

/// Writes `samples` below `work_dir` in the layout the data loader reads.
pub fn write_samples(work_dir: &Path, layout: &DatasetLayout, samples: &[Sample]) -> Result<()> {
    for sample in samples {
        let (scene, position) = sample.origin.split_once('/').ok_or_else(|| {
            JudgerError::malformed(sample.origin.clone(), "origin is not `scene/position`")
        })?;
        let dir = layout.position_dir(work_dir, scene, position);
        std::fs::create_dir_all(&dir).map_err(|e| JudgerError::io(dir.display().to_string(), e))?;

        let features: serde_json::Map<String, serde_json::Value> = sample
            .features
            .names()
            .filter_map(|n| sample.features.get(n).map(|v| (n.to_string(), v.into())))
            .collect();
        crate::io::object_to_json(&dir.join(&layout.reference_pose_file), &sample.reference)?;
        crate::io::object_to_json(&dir.join(&layout.predicted_pose_file), &sample.predicted)?;
        crate::io::object_to_json(&dir.join(&layout.feature_file), &features)?;
    }
    Ok(())
}
