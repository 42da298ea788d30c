//! Nested values traversed by the recursive utilities
//!
//! A [`Nested`] is either a tensor, an ordered sequence of further nested
//! values, a composite object (module or criterion) that knows how to convert
//! itself, a plain scalar, or an absent placeholder.

use std::fmt;

use crate::cache::ConversionCache;
use crate::error::Result;
use crate::tensor::{Tensor, TensorType};

/// Capability of composite objects (modules, criteria) to change the type of
/// the tensors they own
///
/// Implementations convert their own tensors and children in place, threading
/// `cache` through so storages shared across the whole graph stay shared.
#[cfg_attr(test, mockall::automock)]
pub trait Convertible {
    /// Convert every owned tensor to `target`
    fn convert(&mut self, target: &TensorType, cache: &mut ConversionCache) -> Result<()>;
}

/// A tensor, a sequence of nested values, or another leaf
pub enum Nested {
    /// A tensor leaf
    Tensor(Tensor),
    /// An ordered sequence
    Seq(Vec<Nested>),
    /// A module or criterion
    Composite(Box<dyn Convertible>),
    /// A plain number
    Scalar(f64),
    /// Placeholder for a slot not filled yet
    Absent,
}

impl Nested {
    /// Name of the variant, as used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Nested::Tensor(_) => "tensor",
            Nested::Seq(_) => "sequence",
            Nested::Composite(_) => "composite",
            Nested::Scalar(_) => "scalar",
            Nested::Absent => "absent",
        }
    }

    /// Wrap a composite object
    pub fn composite(value: impl Convertible + 'static) -> Self {
        Nested::Composite(Box::new(value))
    }

    /// The tensor, if this is a tensor leaf
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Nested::Tensor(tensor) => Some(tensor),
            _ => None,
        }
    }

    /// The items, if this is a sequence
    pub fn as_seq(&self) -> Option<&[Nested]> {
        match self {
            Nested::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Mutable items, if this is a sequence
    pub fn as_seq_mut(&mut self) -> Option<&mut Vec<Nested>> {
        match self {
            Nested::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is the absent placeholder
    pub fn is_absent(&self) -> bool {
        matches!(self, Nested::Absent)
    }

    /// Every tensor leaf in depth-first order
    pub fn tensors(&self) -> Vec<&Tensor> {
        let mut out = Vec::new();
        self.collect_tensors(&mut out);
        out
    }

    fn collect_tensors<'a>(&'a self, out: &mut Vec<&'a Tensor>) {
        match self {
            Nested::Tensor(tensor) => out.push(tensor),
            Nested::Seq(items) => items.iter().for_each(|item| item.collect_tensors(out)),
            _ => {}
        }
    }

    /// Number of items [`take_seq`](Self::take_seq) would hand out
    pub(crate) fn seq_len(&self) -> usize {
        match self {
            Nested::Seq(items) => items.len(),
            Nested::Absent => 0,
            _ => 1,
        }
    }

    /// Take the items out, wrapping any other value into a one-element
    /// sequence; an absent slot yields no items
    ///
    /// Leaves `Absent` behind; callers put the sequence back.
    pub(crate) fn take_seq(&mut self) -> Vec<Nested> {
        match std::mem::replace(self, Nested::Absent) {
            Nested::Seq(items) => items,
            Nested::Absent => Vec::new(),
            other => vec![other],
        }
    }
}

impl Default for Nested {
    fn default() -> Self {
        Nested::Absent
    }
}

impl From<Tensor> for Nested {
    fn from(tensor: Tensor) -> Self {
        Nested::Tensor(tensor)
    }
}

impl From<Vec<Nested>> for Nested {
    fn from(items: Vec<Nested>) -> Self {
        Nested::Seq(items)
    }
}

impl From<Vec<Tensor>> for Nested {
    fn from(tensors: Vec<Tensor>) -> Self {
        Nested::Seq(tensors.into_iter().map(Nested::Tensor).collect())
    }
}

impl From<f64> for Nested {
    fn from(value: f64) -> Self {
        Nested::Scalar(value)
    }
}

impl fmt::Debug for Nested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nested::Tensor(tensor) => fmt::Debug::fmt(tensor, f),
            Nested::Seq(items) => f.debug_list().entries(items).finish(),
            Nested::Composite(_) => f.write_str("Composite(..)"),
            Nested::Scalar(value) => write!(f, "Scalar({})", value),
            Nested::Absent => f.write_str("Absent"),
        }
    }
}
