//! Singleton dimensions and contiguous views

use super::fixtures::*;
use legacy_nn_utils::{add_singleton_dimension, contiguous_view, DType, Error, Tensor};

#[test]
fn test_singleton_in_the_middle() {
    let t = zeros(&[4, 5]);
    let view = add_singleton_dimension(&t, 1, None).unwrap();
    assert_eq!(view.shape(), vec![4, 1, 5]);
    assert!(view.shares_storage(&t));
    assert_eq!(view.storage_offset(), t.storage_offset());

    view.fill(2.0).unwrap();
    assert!(t.to_vec_f64().iter().all(|&v| v == 2.0));
}

#[test]
fn test_singleton_rebinds_given_view() {
    let t = doubles(&[1.0, 2.0, 3.0], &[3]);
    let holder = Tensor::new(ty(DType::Double));
    let view = add_singleton_dimension(&t, 0, Some(&holder)).unwrap();
    assert!(view.same(&holder));
    assert_eq!(holder.shape(), vec![1, 3]);
    assert_eq!(holder.to_vec_f64(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_singleton_on_transposed_input_keeps_strides() {
    let t = doubles(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).transpose(0, 1).unwrap();
    let view = add_singleton_dimension(&t, 2, None).unwrap();
    assert_eq!(view.shape(), vec![3, 2, 1]);
    assert_eq!(view.to_vec_f64(), t.to_vec_f64());
}

#[test]
fn test_singleton_rejects_unbound_tensor() {
    let t = Tensor::new(ty(DType::Float));
    let err = add_singleton_dimension(&t, 0, None).unwrap_err();
    assert!(matches!(err, Error::InvalidView(_)));
}

#[test]
fn test_contiguous_input_is_viewed_without_copy() {
    let input = doubles(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let output = contiguous_view(None, &input, &[3, 2]).unwrap();
    assert_eq!(output.shape(), vec![3, 2]);
    assert!(output.shares_storage(&input));
    assert_eq!(output.to_vec_f64(), input.to_vec_f64());
}

#[test]
fn test_inferred_size() {
    let input = zeros(&[2, 6]);
    let output = contiguous_view(None, &input, &[-1, 4]).unwrap();
    assert_eq!(output.shape(), vec![3, 4]);
}

#[test]
fn test_non_contiguous_input_is_copied() {
    let input = doubles(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).transpose(0, 1).unwrap();
    assert!(!input.is_contiguous());

    let output = contiguous_view(None, &input, &[6]).unwrap();
    assert_eq!(output.shape(), vec![6]);
    assert!(!output.shares_storage(&input));
    assert_eq!(output.to_vec_f64(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_copy_path_detaches_aliasing_output() {
    let base = doubles(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
    let input = base.transpose(0, 1).unwrap();
    let output = contiguous_view(Some(base.clone()), &input, &[4]).unwrap();

    assert!(output.same(&base));
    assert!(!output.shares_storage(&input));
    assert_eq!(output.to_vec_f64(), vec![1.0, 3.0, 2.0, 4.0]);
    assert_eq!(input.to_vec_f64(), vec![1.0, 3.0, 2.0, 4.0]);
}

#[test]
fn test_copy_path_with_input_as_output() {
    let input = doubles(&[1.0, 2.0, 3.0, 4.0], &[2, 2]).transpose(0, 1).unwrap();
    let output = contiguous_view(Some(input.clone()), &input, &[2, 2]).unwrap();
    assert!(!output.same(&input));
    assert!(!output.shares_storage(&input));
    assert!(output.is_contiguous());
}

#[test]
fn test_reuses_output_storage_on_copy_path() {
    let input = doubles(&[1.0, 2.0, 3.0, 4.0], &[2, 2]).transpose(0, 1).unwrap();
    let output = zeros(&[8]);
    let storage = output.storage().unwrap();
    let result = contiguous_view(Some(output), &input, &[4, 1]).unwrap();
    assert!(result.storage().unwrap().same(&storage));
    assert_eq!(result.shape(), vec![4, 1]);
}

#[test]
fn test_rejects_impossible_sizes() {
    let input = zeros(&[2, 3]);
    assert!(contiguous_view(None, &input, &[4, 2]).is_err());
    assert!(contiguous_view(None, &input, &[-1, -1]).is_err());
}
