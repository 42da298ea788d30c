//! Legacy nn utilities
//!
//! Recursive helpers over possibly-nested collections of tensors, as used by
//! legacy nn modules: aliasing-preserving type conversion, shape-matching
//! resize, fill, in-place scaled addition, copy, singleton-dimension views,
//! contiguous views and clearing of transient buffers.
//!
//! Type conversion threads an explicit [`ConversionCache`] through the whole
//! traversal so that tensors sharing a storage before conversion share one
//! converted storage afterwards:
//!
//! ```
//! use legacy_nn_utils::{recursive_type, ConversionCache, DType, Nested, Tensor, TensorType};
//!
//! let base = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
//! let transposed = base.transpose(0, 1).unwrap();
//! let mut params = Nested::from(vec![base, transposed]);
//!
//! let mut cache = ConversionCache::new();
//! recursive_type(&mut params, &TensorType::new(DType::Float), Some(&mut cache)).unwrap();
//!
//! let converted = params.tensors();
//! assert_eq!(converted[0].dtype(), DType::Float);
//! assert!(converted[0].shares_storage(converted[1]));
//! ```
//!
//! Everything here is single-threaded and synchronous.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod nested;
pub mod tensor;
pub mod utils;

// Re-exports
pub use cache::ConversionCache;
pub use config::{Config, LoggingConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use nested::{Convertible, Nested};
pub use tensor::{storage_type_name, DType, Storage, StorageId, StorageType, Tensor, TensorId, TensorType};
pub use utils::{
    add_singleton_dimension, clear, contiguous_view, convert_tensor, recursive_add, recursive_add_scaled,
    recursive_copy, recursive_fill, recursive_resize_as, recursive_type, AttributeTable, Attributes,
};
