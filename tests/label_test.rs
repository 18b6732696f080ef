use relocalization_judger::JudgerError;
use relocalization_judger::label::LabelThresholds;
use relocalization_judger::types::{Label, Pose};
use serde_json::json;

#[test]
fn test_small_error_is_success() {
    let thresholds = LabelThresholds::default();
    let reference = Pose::new(0.0, 0.0, 0.0);
    let predicted = Pose::new(4.0, 4.0, 4.0);
    assert_eq!(thresholds.derive(&reference, &predicted), Label::Success);
}

#[test]
fn test_threshold_is_exclusive() {
    let thresholds = LabelThresholds::default();
    let reference = Pose::new(0.0, 0.0, 0.0);
    assert_eq!(
        thresholds.derive(&reference, &Pose::new(5.0, 0.0, 0.0)),
        Label::Failure
    );
    assert_eq!(
        thresholds.derive(&reference, &Pose::new(0.0, 0.0, -5.0)),
        Label::Failure
    );
}

#[test]
fn test_each_axis_can_fail() {
    let thresholds = LabelThresholds::new(1.0, 2.0);
    let reference = Pose::new(10.0, 20.0, 30.0);
    assert_eq!(
        thresholds.derive(&reference, &Pose::new(10.5, 20.5, 31.0)),
        Label::Success
    );
    assert_eq!(
        thresholds.derive(&reference, &Pose::new(10.5, 18.5, 31.0)),
        Label::Failure
    );
    assert_eq!(
        thresholds.derive(&reference, &Pose::new(10.5, 20.5, 32.5)),
        Label::Failure
    );
}

#[test]
fn test_pose_from_json() {
    let pose = Pose::from_json(&json!({"x": 1.5, "y": -2.0, "phi": 90, "extra": "ignored"}), "p")
        .unwrap();
    assert_eq!(pose, Pose::new(1.5, -2.0, 90.0));
}

#[test]
fn test_pose_missing_field() {
    let err = Pose::from_json(&json!({"x": 1.0, "y": 2.0}), "scene/pos").unwrap_err();
    match err {
        JudgerError::MissingField { origin, field } => {
            assert_eq!(origin, "scene/pos");
            assert_eq!(field, "phi");
        }
        e => panic!("unexpected error {:?}", e),
    }
}

#[test]
fn test_label_from_decision() {
    assert_eq!(Label::from_decision(0.3), Label::Success);
    assert_eq!(Label::from_decision(0.0), Label::Failure);
    assert_eq!(Label::from_decision(-1.0), Label::Failure);
    assert_eq!(Label::Success.as_u8(), 1);
    assert_eq!(Label::Failure.sign(), -1.0);
}
