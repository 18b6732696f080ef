use relocalization_judger::JudgerError;
use relocalization_judger::dataset::{Dataset, DatasetAssembler};
use relocalization_judger::types::{FeatureSet, Label};
use serde_json::json;

fn features(entries: &[(&str, f64)]) -> FeatureSet {
    entries.iter().map(|(n, v)| (*n, *v)).collect()
}

#[test]
fn test_columns_follow_first_sample() {
    let mut assembler = DatasetAssembler::new();
    assembler
        .push("s/0", &features(&[("A", 1.0), ("B", 2.0)]), Label::Success)
        .unwrap();
    assembler
        .push("s/1", &features(&[("B", 4.0), ("A", 3.0)]), Label::Failure)
        .unwrap();
    let dataset = assembler.finish().unwrap();

    assert_eq!(dataset.feature_names(), &["A".to_string(), "B".to_string()]);
    let x = dataset.features();
    assert_eq!((x[(0, 0)], x[(0, 1)]), (1.0, 2.0));
    assert_eq!((x[(1, 0)], x[(1, 1)]), (3.0, 4.0));
    assert_eq!(dataset.labels(), &[Label::Success, Label::Failure]);
    assert_eq!(dataset.class_counts(), (1, 1));
}

#[test]
fn test_schema_mismatch() {
    let mut assembler = DatasetAssembler::new();
    assembler
        .push("s/0", &features(&[("A", 1.0), ("B", 2.0)]), Label::Success)
        .unwrap();
    let err = assembler
        .push("s/1", &features(&[("A", 1.0), ("C", 2.0)]), Label::Success)
        .unwrap_err();
    match err {
        JudgerError::SchemaMismatch {
            sample,
            missing,
            unexpected,
        } => {
            assert_eq!(sample, "s/1");
            assert_eq!(missing, vec!["B".to_string()]);
            assert_eq!(unexpected, vec!["C".to_string()]);
        }
        e => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn test_extra_feature_is_mismatch() {
    let mut assembler = DatasetAssembler::new();
    assembler
        .push("s/0", &features(&[("A", 1.0)]), Label::Success)
        .unwrap();
    assert!(matches!(
        assembler.push("s/1", &features(&[("A", 1.0), ("B", 2.0)]), Label::Failure),
        Err(JudgerError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_empty_assembler() {
    assert!(matches!(
        DatasetAssembler::new().finish(),
        Err(JudgerError::EmptyDataset)
    ));
}

#[test]
fn test_empty_first_feature_set() {
    let mut assembler = DatasetAssembler::new();
    assert!(matches!(
        assembler.push("s/0", &FeatureSet::new(), Label::Success),
        Err(JudgerError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_feature_set_keeps_document_order() {
    let value = json!({"zeta": 1.0, "alpha": 2, "mid": -3.5});
    let set = FeatureSet::from_json(&value, "doc").unwrap();
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    assert_eq!(set.get("alpha"), Some(2.0));
}

#[test]
fn test_feature_set_rejects_non_numbers() {
    let err = FeatureSet::from_json(&json!({"a": "high"}), "doc").unwrap_err();
    assert!(matches!(err, JudgerError::MalformedInput { .. }));
    let err = FeatureSet::from_json(&json!([1, 2]), "doc").unwrap_err();
    assert!(matches!(err, JudgerError::MalformedInput { .. }));
}

#[test]
fn test_subset_selects_rows() {
    let x = nalgebra::DMatrix::from_row_slice(3, 1, &[10.0, 20.0, 30.0]);
    let dataset = Dataset::new(
        vec!["f".to_string()],
        x,
        vec![Label::Failure, Label::Success, Label::Failure],
    )
    .unwrap();
    let subset = dataset.subset(&[2, 0]);
    assert_eq!(subset.len(), 2);
    assert_eq!(subset.features()[(0, 0)], 30.0);
    assert_eq!(subset.labels(), &[Label::Failure, Label::Failure]);
}

#[test]
fn test_dataset_shape_checked() {
    let x = nalgebra::DMatrix::zeros(2, 2);
    assert!(Dataset::new(vec!["a".to_string()], x, vec![Label::Success; 2]).is_err());
}
