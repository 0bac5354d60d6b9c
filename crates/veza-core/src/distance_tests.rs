//! Tests for squared-L2 distance.

use crate::distance::l2_sq;
use crate::error::Error;

#[test]
fn test_l2_sq_basic() {
    let a = vec![0.0, 0.0];
    let b = vec![3.0, 4.0];
    let d = l2_sq(&a, &b).unwrap();
    assert!((d - 25.0).abs() < 1e-6);
}

#[test]
fn test_l2_sq_identical_vectors() {
    let a = vec![1.0, 2.0, 3.0];
    let d = l2_sq(&a, &a).unwrap();
    assert!(d.abs() < 1e-9);
}

#[test]
fn test_l2_sq_is_squared_not_rooted() {
    // [1.9, 0] vs [2, 0] -> 0.01, not 0.1
    let q = vec![1.9, 0.0];
    let v = vec![2.0, 0.0];
    let d = l2_sq(&q, &v).unwrap();
    assert!((d - 0.01).abs() < 1e-6);
}

#[test]
fn test_l2_sq_dimension_mismatch() {
    let a = vec![1.0, 2.0];
    let b = vec![1.0, 2.0, 3.0];
    let err = l2_sq(&a, &b).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
    assert!(!err.is_recoverable());
}

#[test]
fn test_l2_sq_symmetry() {
    let a = vec![0.5, -1.5, 2.0];
    let b = vec![-0.25, 1.0, 0.0];
    let d1 = l2_sq(&a, &b).unwrap();
    let d2 = l2_sq(&b, &a).unwrap();
    assert!((d1 - d2).abs() < 1e-6);
}
