//! Tensor data model: element types, shared storages and strided views
//!
//! This module provides:
//! - Type tags (`torch.FloatTensor`) and the storage tag deriver
//! - Identity-carrying storages that tensors may alias
//! - Tensor views with the in-place primitives the recursive utilities need

pub mod base;
pub mod dtype;
pub mod storage;

pub use self::base::{contiguous_strides, infer_sizes, numel_of, Tensor, TensorId};
pub use self::dtype::{storage_type_name, DType, Element, StorageType, TensorType, DEFAULT_NAMESPACE};
pub use self::storage::{Storage, StorageData, StorageId};
