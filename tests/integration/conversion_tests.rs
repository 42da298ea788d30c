//! Type conversion: aliasing, idempotence and cache reuse

use super::fixtures::*;
use super::init_test_logging;
use approx::assert_relative_eq;
use legacy_nn_utils::{
    add_singleton_dimension, convert_tensor, recursive_type, ConversionCache, DType, Nested, Tensor,
};

#[test]
fn test_aliased_tensors_share_converted_storage() {
    init_test_logging();

    let a = doubles(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let b = a.transpose(0, 1).unwrap();
    assert!(a.shares_storage(&b));

    let mut params = Nested::from(vec![a.clone(), b.clone()]);
    let mut cache = ConversionCache::new();
    recursive_type(&mut params, &ty(DType::Float), Some(&mut cache)).unwrap();

    let converted = params.tensors();
    let (ca, cb) = (converted[0], converted[1]);
    assert_eq!(ca.dtype(), DType::Float);
    assert_eq!(cb.dtype(), DType::Float);
    assert!(ca.storage().unwrap().same(&cb.storage().unwrap()));
    assert!(!ca.shares_storage(&a));
    assert_eq!(cache.storage_entries(), 1);
    assert_eq!(cache.tensor_entries(), 2);

    // writes through one converted view are seen by the other
    ca.fill(7.0).unwrap();
    assert_eq!(cb.to_vec_f64(), vec![7.0; 6]);
    assert_eq!(a.to_vec_f64(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_conversion_is_idempotent_per_tensor() {
    let t = doubles(&[0.5, 1.5], &[2]);
    let mut cache = ConversionCache::new();

    let first = convert_tensor(&t, &ty(DType::Float), &mut cache).unwrap();
    let second = convert_tensor(&t, &ty(DType::Float), &mut cache).unwrap();
    assert!(first.same(&second));
    assert_eq!(first.id(), second.id());

    // the same tensor twice in one sequence maps to one converted tensor
    let mut params = Nested::from(vec![t.clone(), t]);
    recursive_type(&mut params, &ty(DType::Float), Some(&mut cache)).unwrap();
    let converted = params.tensors();
    assert!(converted[0].same(converted[1]));
    assert!(converted[0].same(&first));
}

#[test]
fn test_cache_reuse_across_calls() {
    let shared = doubles(&[1.0, 2.0, 3.0, 4.0], &[4]);
    let column = add_singleton_dimension(&shared, 1, None).unwrap();

    let mut first_graph = Nested::from(vec![shared.clone()]);
    let mut second_graph = Nested::Seq(vec![Nested::Scalar(0.1), Nested::from(vec![column])]);

    let mut cache = ConversionCache::new();
    recursive_type(&mut first_graph, &ty(DType::Float), Some(&mut cache)).unwrap();
    recursive_type(&mut second_graph, &ty(DType::Float), Some(&mut cache)).unwrap();

    let a = first_graph.tensors()[0].clone();
    let b = second_graph.tensors()[0].clone();
    assert!(a.shares_storage(&b));
    assert_eq!(b.shape(), vec![4, 1]);
    assert_eq!(cache.storage_entries(), 1);
}

#[test]
fn test_separate_caches_do_not_share() {
    let shared = doubles(&[1.0, 2.0], &[2]);
    let mut first = Nested::from(shared.clone());
    let mut second = Nested::from(shared);

    recursive_type(&mut first, &ty(DType::Float), Some(&mut ConversionCache::new())).unwrap();
    recursive_type(&mut second, &ty(DType::Float), Some(&mut ConversionCache::new())).unwrap();
    assert!(!first.tensors()[0].shares_storage(second.tensors()[0]));
}

#[test]
fn test_modules_share_tied_weights() {
    init_test_logging();

    let weight = doubles(&[0.25, -0.5, 0.75, 1.0], &[2, 2]);
    let encoder = Linear::with_weight(weight.clone(), 2);
    let decoder = Linear::with_weight(weight.transpose(0, 1).unwrap(), 2);
    let (encoder_view, decoder_view) = (encoder.clone(), decoder.clone());

    let mut model = Nested::composite(Sequential {
        children: vec![Box::new(encoder), Box::new(decoder)],
    });
    recursive_type(&mut model, &ty(DType::Float), None).unwrap();

    let enc = encoder_view.weight();
    let dec = decoder_view.weight();
    assert_eq!(enc.dtype(), DType::Float);
    assert!(enc.shares_storage(&dec));
    assert!(!encoder_view.bias().shares_storage(&decoder_view.bias()));
    assert_eq!(encoder_view.buffer("output").unwrap().dtype(), DType::Float);

    let values = dec.to_vec_f64();
    assert_relative_eq!(values[1], 0.75);
    assert_relative_eq!(values[2], -0.5);
}

#[test]
fn test_mixed_graph_with_modules_and_tensors() {
    let weight = doubles(&[1.0, 2.0], &[1, 2]);
    let layer = Linear::with_weight(weight.clone(), 1);
    let handle = layer.clone();

    let mut graph = Nested::Seq(vec![
        Nested::composite(layer),
        Nested::from(weight),
        Nested::Absent,
    ]);
    recursive_type(&mut graph, &ty(DType::Half), None).unwrap();

    let items = graph.as_seq().unwrap();
    let loose = items[1].as_tensor().unwrap();
    assert_eq!(loose.dtype(), DType::Half);
    assert!(loose.same(&handle.weight()));
    assert!(items[2].is_absent());
}

#[test]
fn test_narrowing_conversion_saturates() {
    let t = doubles(&[-1.0, 127.9, 300.0], &[3]);
    let mut cache = ConversionCache::new();
    let bytes = convert_tensor(&t, &ty(DType::Byte), &mut cache).unwrap();
    assert_eq!(bytes.to_vec_f64(), vec![0.0, 127.0, 255.0]);
}

#[test]
fn test_conversion_keeps_offset_into_larger_storage() {
    let base = doubles(&[1.0, 2.0, 3.0, 4.0, 5.0], &[5]);
    let tail = Tensor::new(ty(DType::Double));
    tail.set(&base.storage().unwrap(), 3, &[2], &[1]).unwrap();

    let mut cache = ConversionCache::new();
    let converted = convert_tensor(&tail, &ty(DType::Int), &mut cache).unwrap();
    assert_eq!(converted.storage_offset(), 3);
    assert_eq!(converted.storage().unwrap().len(), 5);
    assert_eq!(converted.to_vec_f64(), vec![4.0, 5.0]);
}
