//! Recursive utilities over nested tensors
//!
//! This module provides:
//! - Aliasing-preserving type conversion of tensors, sequences and composites
//! - Structure-preserving resize, fill, scaled add and copy
//! - Singleton-dimension and contiguous views
//! - Clearing of transient attributes

pub mod clear;
pub mod convert;
pub mod recursive;
pub mod view;

pub use clear::{clear, AttributeTable, Attributes};
pub use convert::{convert_tensor, recursive_type};
pub use recursive::{recursive_add, recursive_add_scaled, recursive_copy, recursive_fill, recursive_resize_as};
pub use view::{add_singleton_dimension, contiguous_view};
