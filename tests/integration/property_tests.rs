//! Property-based checks over random nested structures

use super::fixtures::*;
use legacy_nn_utils::{
    recursive_add_scaled, recursive_copy, recursive_fill, recursive_resize_as, recursive_type, ConversionCache,
    DType, Nested,
};
use proptest::prelude::*;

fn shape() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..4, 1..4)
}

/// Trees of tensors at least two sequence levels deep
fn tree() -> impl Strategy<Value = ShapeTree> {
    let leaf = shape().prop_map(ShapeTree::Leaf);
    let nested = leaf.prop_recursive(3, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(ShapeTree::Seq)
    });
    prop::collection::vec(prop::collection::vec(nested, 0..3).prop_map(ShapeTree::Seq), 1..3)
        .prop_map(ShapeTree::Seq)
}

fn dtype() -> impl Strategy<Value = DType> {
    prop::sample::select(DType::ALL.to_vec())
}

proptest! {
    #[test]
    fn resize_as_mirrors_any_structure(template in tree(), start in tree()) {
        let source = build(&template);
        let mut t1 = build(&start);
        recursive_resize_as(&mut t1, &source).unwrap();
        prop_assert_eq!(shape_tree(&t1), template);
    }

    #[test]
    fn copy_reproduces_values(template in tree(), value in -100.0f64..100.0) {
        let source = build(&template);
        recursive_fill(&source, value).unwrap();
        let mut t1 = Nested::Absent;
        recursive_copy(&mut t1, &source).unwrap();
        prop_assert_eq!(shape_tree(&t1), template);
        for tensor in t1.tensors() {
            prop_assert!(tensor.to_vec_f64().iter().all(|&v| v == value));
        }
    }

    #[test]
    fn add_scaled_matches_arithmetic(template in tree(), a in -10i32..10, b in -10i32..10, scale in -4i32..4) {
        let t2 = build(&template);
        recursive_fill(&t2, f64::from(b)).unwrap();
        let mut t1 = build(&template);
        recursive_fill(&t1, f64::from(a)).unwrap();
        recursive_add_scaled(&mut t1, f64::from(scale), &t2).unwrap();
        let expected = f64::from(a + scale * b);
        for tensor in t1.tensors() {
            prop_assert!(tensor.to_vec_f64().iter().all(|&v| v == expected));
        }
    }

    #[test]
    fn conversion_keeps_structure_and_type(template in tree(), target in dtype()) {
        let mut value = build(&template);
        let mut cache = ConversionCache::new();
        recursive_type(&mut value, &ty(target), Some(&mut cache)).unwrap();
        prop_assert_eq!(shape_tree(&value), template);
        for tensor in value.tensors() {
            prop_assert_eq!(tensor.dtype(), target);
        }
    }
}
