use nalgebra as na;
use relocalization_judger::JudgerError;
use relocalization_judger::svm::kernel::squared_distances;
use relocalization_judger::svm::{KernelKind, ModelConfiguration, Svc, accuracy};
use relocalization_judger::types::Label;

/// Two clusters around (-2, -2) and (2, 2).
fn clusters() -> (na::DMatrix<f64>, Vec<Label>) {
    let offsets = [(0.0, 0.0), (0.3, -0.2), (-0.4, 0.1), (0.2, 0.4), (-0.1, -0.3)];
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (center, label) in [(-2.0, Label::Failure), (2.0, Label::Success)] {
        for (dx, dy) in offsets {
            rows.push(center + dx);
            rows.push(center + dy);
            labels.push(label);
        }
    }
    (na::DMatrix::from_row_slice(labels.len(), 2, &rows), labels)
}

#[test]
fn test_rbf_kernel_values() {
    let a = na::DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
    let d2 = squared_distances(&a, &a);
    assert_eq!(d2[(0, 1)], 2.0);
    assert_eq!(d2[(1, 1)], 0.0);
    let k = KernelKind::Rbf.matrix(0.5, &a, &a);
    assert!((k[(0, 1)] - (-1.0f64).exp()).abs() < 1e-12);
    assert_eq!(k[(0, 0)], 1.0);
}

#[test]
fn test_separable_clusters() {
    let (x, labels) = clusters();
    let model = Svc::fit(&x, &labels, &ModelConfiguration::rbf(10.0, 0.5)).unwrap();
    assert_eq!(model.score(&x, &labels), 1.0);
    assert!(model.n_support() > 0);
    assert!(model.n_support() <= labels.len());

    let queries = na::DMatrix::from_row_slice(2, 2, &[-3.0, -2.5, 2.5, 3.0]);
    assert_eq!(model.predict(&queries), vec![Label::Failure, Label::Success]);

    let decision = model.decision_function(&queries);
    assert!(decision[0] < 0.0 && decision[1] > 0.0);
}

#[test]
fn test_precomputed_distances_match_direct_decision() {
    let (x, labels) = clusters();
    let model = Svc::fit(&x, &labels, &ModelConfiguration::rbf(1.0, 0.2)).unwrap();
    let queries = na::DMatrix::from_row_slice(3, 2, &[0.1, 0.2, -1.0, 1.5, 4.0, -4.0]);
    let direct = model.decision_function(&queries);
    let cached = model.decision_from_squared_distances(&squared_distances(&queries, &x));
    for (a, b) in direct.iter().zip(&cached) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_small_c_fits() {
    let (x, labels) = clusters();
    let c = 0.05;
    let model = Svc::fit(&x, &labels, &ModelConfiguration::rbf(c, 0.5)).unwrap();
    assert!(model.rho().is_finite());
    assert!(model.support_indices().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_single_class_fails() {
    let (x, _) = clusters();
    let labels = vec![Label::Success; x.nrows()];
    assert!(matches!(
        Svc::fit(&x, &labels, &ModelConfiguration::rbf(1.0, 1.0)),
        Err(JudgerError::NoConvergence(_))
    ));
}

#[test]
fn test_non_positive_parameters_fail() {
    let (x, labels) = clusters();
    assert!(matches!(
        Svc::fit(&x, &labels, &ModelConfiguration::rbf(0.0, 1.0)),
        Err(JudgerError::NoConvergence(_))
    ));
    assert!(matches!(
        Svc::fit(&x, &labels, &ModelConfiguration::rbf(1.0, -1.0)),
        Err(JudgerError::NoConvergence(_))
    ));
}

#[test]
fn test_accuracy() {
    let truth = [Label::Success, Label::Failure, Label::Success, Label::Failure];
    let predicted = [Label::Success, Label::Success, Label::Success, Label::Failure];
    assert_eq!(accuracy(&predicted, &truth), 0.75);
    assert_eq!(accuracy(&[], &[]), 0.0);
}

#[test]
fn test_rbf_separates_xor() {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (cx, cy) in [(-1.0, -1.0), (1.0, 1.0), (-1.0, 1.0), (1.0, -1.0)] {
        let label = if cx * cy > 0.0 { Label::Success } else { Label::Failure };
        for (dx, dy) in [(0.0, 0.0), (0.1, -0.1), (-0.1, 0.05)] {
            rows.push(cx + dx);
            rows.push(cy + dy);
            labels.push(label);
        }
    }
    let x = na::DMatrix::from_row_slice(labels.len(), 2, &rows);
    let model = Svc::fit(&x, &labels, &ModelConfiguration::rbf(100.0, 2.0)).unwrap();
    assert_eq!(model.score(&x, &labels), 1.0);
    assert!(model.support_indices().iter().all(|&i| i < labels.len()));
}
