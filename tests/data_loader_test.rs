use std::fs;

use relocalization_judger::JudgerError;
use relocalization_judger::data_loader::{DatasetLayout, find_position_dirs, load_samples};
use relocalization_judger::dataset::Dataset;
use relocalization_judger::io::{object_from_json, object_to_json, write_data_table};
use relocalization_judger::label::LabelThresholds;
use relocalization_judger::synthetic::{SyntheticConfig, generate_samples, write_samples};
use relocalization_judger::types::Pose;
use tempfile::TempDir;

fn small_config() -> SyntheticConfig {
    SyntheticConfig {
        scenes: 2,
        positions_per_scene: 6,
        noise_features: 2,
        seed: 5,
    }
}

#[test]
fn test_load_written_samples() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DatasetLayout::default();
    let thresholds = LabelThresholds::default();
    let samples = generate_samples(&small_config(), &thresholds);
    write_samples(temp_dir.path(), &layout, &samples).unwrap();

    assert_eq!(find_position_dirs(temp_dir.path(), &layout).unwrap().len(), 12);
    let loaded = load_samples(temp_dir.path(), &layout, &thresholds).unwrap();
    assert_eq!(loaded.len(), samples.len());
    // generated origins are already in lexicographic order
    for (a, b) in samples.iter().zip(&loaded) {
        assert!(b.origin.starts_with(a.origin.split('/').next().unwrap()));
        assert!(b.origin.ends_with(a.origin.split('/').next_back().unwrap()));
        assert_eq!(a.label, b.label);
        assert_eq!(a.reference, b.reference);
        assert_eq!(a.features, b.features);
    }
}

#[test]
fn test_flat_layout() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DatasetLayout {
        scene_subdir: String::new(),
        ..DatasetLayout::default()
    };
    let thresholds = LabelThresholds::default();
    let samples = generate_samples(&small_config(), &thresholds);
    write_samples(temp_dir.path(), &layout, &samples).unwrap();
    let loaded = load_samples(temp_dir.path(), &layout, &thresholds).unwrap();
    assert_eq!(loaded[0].origin, "scene_00/position_0000");
}

#[test]
fn test_missing_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        load_samples(
            temp_dir.path(),
            &DatasetLayout::default(),
            &LabelThresholds::default()
        ),
        Err(JudgerError::MalformedInput { .. })
    ));
}

#[test]
fn test_missing_pose_file() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DatasetLayout::default();
    let thresholds = LabelThresholds::default();
    let samples = generate_samples(&small_config(), &thresholds);
    write_samples(temp_dir.path(), &layout, &samples).unwrap();
    let dir = layout.position_dir(temp_dir.path(), "scene_01", "position_0003");
    fs::remove_file(dir.join(&layout.predicted_pose_file)).unwrap();

    assert!(matches!(
        load_samples(temp_dir.path(), &layout, &thresholds),
        Err(JudgerError::MalformedInput { .. })
    ));
}

#[test]
fn test_pose_without_phi() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DatasetLayout::default();
    let thresholds = LabelThresholds::default();
    let samples = generate_samples(&small_config(), &thresholds);
    write_samples(temp_dir.path(), &layout, &samples).unwrap();
    let dir = layout.position_dir(temp_dir.path(), "scene_00", "position_0002");
    fs::write(dir.join(&layout.reference_pose_file), r#"{"x": 1.0, "y": 2.0}"#).unwrap();

    match load_samples(temp_dir.path(), &layout, &thresholds) {
        Err(JudgerError::MissingField { field, .. }) => assert_eq!(field, "phi"),
        other => panic!("unexpected result {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_data_table_format() {
    let temp_dir = TempDir::new().unwrap();
    let samples = generate_samples(
        &SyntheticConfig {
            scenes: 1,
            positions_per_scene: 3,
            noise_features: 0,
            seed: 1,
        },
        &LabelThresholds::default(),
    );
    let dataset = Dataset::from_samples(&samples).unwrap();
    let path = temp_dir.path().join("Data.csv");
    write_data_table(&path, &dataset).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    let header = format!("{},Label,", dataset.feature_names().join(","));
    assert_eq!(lines[0], header);
    for (line, label) in lines[1..].iter().zip(dataset.labels()) {
        assert!(line.ends_with(&format!("{},", label.as_u8())));
        assert_eq!(line.matches(',').count(), dataset.num_features() + 1);
    }
}

#[test]
fn test_json_round_trip_and_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pose.json");
    let pose = Pose::new(1.0, -2.0, 3.5);
    object_to_json(&path, &pose).unwrap();
    let back: Pose = object_from_json(&path).unwrap();
    assert_eq!(back, pose);

    fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        object_from_json::<Pose>(&path),
        Err(JudgerError::MalformedInput { .. })
    ));
}

#[test]
fn test_scene_without_subdir() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DatasetLayout::default();
    let thresholds = LabelThresholds::default();
    let samples = generate_samples(&small_config(), &thresholds);
    write_samples(temp_dir.path(), &layout, &samples).unwrap();
    // positions placed directly below the scene
    let stray = layout.data_root(temp_dir.path()).join("scene_99").join("position_0000");
    fs::create_dir_all(&stray).unwrap();

    match load_samples(temp_dir.path(), &layout, &thresholds) {
        Err(JudgerError::MalformedInput { origin, reason }) => {
            assert!(origin.ends_with("scene_99"));
            assert!(reason.contains("RelocalizationData"));
        }
        other => panic!("unexpected result {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_stray_file_in_data_root() {
    let temp_dir = TempDir::new().unwrap();
    let layout = DatasetLayout::default();
    let thresholds = LabelThresholds::default();
    let samples = generate_samples(&small_config(), &thresholds);
    write_samples(temp_dir.path(), &layout, &samples).unwrap();
    fs::write(layout.data_root(temp_dir.path()).join("notes.txt"), "x").unwrap();

    assert_eq!(find_position_dirs(temp_dir.path(), &layout).unwrap().len(), 12);
}
