use std::path::{Path, PathBuf};

use glob::glob;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{JudgerError, Result};
use crate::label::LabelThresholds;
use crate::types::{FeatureSet, Pose, Sample};

/// Where the per-position documents live below the work directory:
/// `<data_dir>/<scene>/<scene_subdir>/<position>/<file>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    pub data_dir: String,
    /// Empty when positions sit directly below the scene folder.
    pub scene_subdir: String,
    pub reference_pose_file: String,
    pub predicted_pose_file: String,
    pub feature_file: String,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            data_dir: "Data".to_string(),
            scene_subdir: "RelocalizationData".to_string(),
            reference_pose_file: "RefPose.json".to_string(),
            predicted_pose_file: "PredictPose.json".to_string(),
            feature_file: "EigenVector.json".to_string(),
        }
    }
}

impl DatasetLayout {
    pub fn data_root(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(&self.data_dir)
    }

    /// Folder of one position, the inverse of [`find_position_dirs`].
    pub fn position_dir(&self, work_dir: &Path, scene: &str, position: &str) -> PathBuf {
        let mut dir = self.data_root(work_dir).join(scene);
        if !self.scene_subdir.is_empty() {
            dir.push(&self.scene_subdir);
        }
        dir.join(position)
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let origin = path.display().to_string();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| JudgerError::malformed(origin.clone(), format!("cannot read: {}", e)))?;
    serde_json::from_str(&contents).map_err(|e| JudgerError::malformed(origin, e))
}

/// Directory entries matching `pattern`, sorted. Plain files are skipped with a warning.
fn glob_dirs(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).map_err(|e| JudgerError::malformed(pattern, e))?;
    let mut dirs = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| JudgerError::malformed(e.path().display().to_string(), e))?;
        if path.is_dir() {
            dirs.push(path);
        } else {
            log::warn!("ignoring {}: not a directory", path.display());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Position folders in lexicographic order.
///
/// Every scene must contain `scene_subdir` when one is configured.
pub fn find_position_dirs(work_dir: &Path, layout: &DatasetLayout) -> Result<Vec<PathBuf>> {
    let root = layout.data_root(work_dir);
    if !root.is_dir() {
        return Err(JudgerError::malformed(
            root.display().to_string(),
            "data directory does not exist",
        ));
    }
    let scenes = glob_dirs(&format!("{}/*", glob::Pattern::escape(&root.to_string_lossy())))?;
    let mut positions = Vec::new();
    for scene in scenes {
        let scene_dir = if layout.scene_subdir.is_empty() {
            scene
        } else {
            let dir = scene.join(&layout.scene_subdir);
            if !dir.is_dir() {
                return Err(JudgerError::malformed(
                    scene.display().to_string(),
                    format!("scene has no `{}` directory", layout.scene_subdir),
                ));
            }
            dir
        };
        let pattern = format!("{}/*", glob::Pattern::escape(&scene_dir.to_string_lossy()));
        positions.extend(glob_dirs(&pattern)?);
    }
    positions.sort();
    Ok(positions)
}

/// `scene/position` relative to the data root.
fn position_origin(dir: &Path, root: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads the three documents of one position and derives its label.
pub fn load_position(
    dir: &Path,
    origin: &str,
    layout: &DatasetLayout,
    thresholds: &LabelThresholds,
) -> Result<Sample> {
    log::trace!("loading {}", origin);
    let reference_path = dir.join(&layout.reference_pose_file);
    let predicted_path = dir.join(&layout.predicted_pose_file);
    let feature_path = dir.join(&layout.feature_file);
    let reference = Pose::from_json(
        &read_json(&reference_path)?,
        &reference_path.display().to_string(),
    )?;
    let predicted = Pose::from_json(
        &read_json(&predicted_path)?,
        &predicted_path.display().to_string(),
    )?;
    let features = FeatureSet::from_json(
        &read_json(&feature_path)?,
        &feature_path.display().to_string(),
    )?;
    Ok(Sample {
        origin: origin.to_string(),
        label: thresholds.derive(&reference, &predicted),
        features,
        reference,
        predicted,
    })
}

/// Loads every position below `work_dir`.
///
/// Positions are read in parallel; the result keeps the sorted path order and the
/// first failing position (in that order) aborts the load.
pub fn load_samples(
    work_dir: &Path,
    layout: &DatasetLayout,
    thresholds: &LabelThresholds,
) -> Result<Vec<Sample>> {
    let root = layout.data_root(work_dir);
    let dirs = find_position_dirs(work_dir, layout)?;
    log::info!("found {} positions below {}", dirs.len(), root.display());
    let samples: Vec<Result<Sample>> = dirs
        .par_iter()
        .progress_count(dirs.len() as u64)
        .map(|dir| load_position(dir, &position_origin(dir, &root), layout, thresholds))
        .collect();
    samples.into_iter().collect()
}
