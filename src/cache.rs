//! Identity-keyed cache used by type conversion
//!
//! The cache remembers, for every source tensor and storage, the converted
//! counterpart it produced. Keying on identity rather than value is what makes
//! two tensors that shared a storage before conversion share one converted
//! storage afterwards.
//!
//! The cache can be handed from one conversion run to the next to preserve
//! sharing across several independently converted graphs:
//!
//! ```
//! use legacy_nn_utils::{recursive_type, ConversionCache, DType, Nested, Tensor, TensorType};
//!
//! let weight = Tensor::from_slice(&[1.0f64, 2.0], &[2]).unwrap();
//! let target = TensorType::new(DType::Float);
//! let mut cache = ConversionCache::new();
//!
//! let mut first = Nested::from(weight.clone());
//! let mut second = Nested::from(vec![weight]);
//! recursive_type(&mut first, &target, Some(&mut cache)).unwrap();
//! recursive_type(&mut second, &target, Some(&mut cache)).unwrap();
//! assert!(first.tensors()[0].same(second.tensors()[0]));
//! ```
//!
//! The cache is not synchronized. It is meant for one sequential traversal at
//! a time; callers converting graphs concurrently must give each thread its own
//! cache and partition the graphs so they share no storages.

use std::collections::HashMap;

use crate::tensor::{Storage, StorageId, StorageType, Tensor, TensorId, TensorType};

/// Converted tensors and storages, keyed by source identity and target type
#[derive(Debug, Default)]
pub struct ConversionCache {
    tensors: HashMap<(TensorId, TensorType), Tensor>,
    storages: HashMap<(StorageId, StorageType), Storage>,
}

impl ConversionCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Converted counterpart of tensor `id` for `target`
    pub fn tensor(&self, id: TensorId, target: &TensorType) -> Option<&Tensor> {
        self.tensors.get(&(id, target.clone()))
    }

    /// Converted counterpart of storage `id` for `target`
    pub fn storage(&self, id: StorageId, target: &StorageType) -> Option<&Storage> {
        self.storages.get(&(id, target.clone()))
    }

    /// Record the converted counterpart of tensor `id`
    pub fn insert_tensor(&mut self, id: TensorId, target: TensorType, converted: Tensor) -> Option<Tensor> {
        self.tensors.insert((id, target), converted)
    }

    /// Record the converted counterpart of storage `id`
    pub fn insert_storage(&mut self, id: StorageId, target: StorageType, converted: Storage) -> Option<Storage> {
        self.storages.insert((id, target), converted)
    }

    /// Number of cached tensors
    pub fn tensor_entries(&self) -> usize {
        self.tensors.len()
    }

    /// Number of cached storages
    pub fn storage_entries(&self) -> usize {
        self.storages.len()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.tensors.len() + self.storages.len()
    }

    /// Whether nothing has been converted through this cache yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
