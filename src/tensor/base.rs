//! Strided tensor views over shared storages

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::dtype::{DType, Element, TensorType};
use super::storage::Storage;
use crate::error::{Error, Result};

static NEXT_TENSOR_ID: AtomicU64 = AtomicU64::new(1);

/// Identity token of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(u64);

impl TensorId {
    fn next() -> Self {
        Self(NEXT_TENSOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor#{}", self.0)
    }
}

/// Row-major strides for `shape`
pub fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    let mut acc = 1usize;
    for (stride, size) in strides.iter_mut().zip(shape.iter()).rev() {
        *stride = acc;
        acc = acc.saturating_mul((*size).max(1));
    }
    strides
}

/// Element count of `shape`; rank-0 shapes hold no elements
pub fn numel_of(shape: &[usize]) -> usize {
    if shape.is_empty() {
        0
    } else {
        shape.iter().product()
    }
}

/// Resolve view sizes where at most one entry is `-1`
pub fn infer_sizes(sizes: &[isize], numel: usize) -> Result<Vec<usize>> {
    let mut inferred = None;
    let mut known = 1usize;
    for (dim, &size) in sizes.iter().enumerate() {
        match size {
            -1 if inferred.is_none() => inferred = Some(dim),
            -1 => return Err(Error::invalid_view("only one dimension can be inferred")),
            size if size < 0 => {
                return Err(Error::invalid_view(format!("invalid size {} at dimension {}", size, dim)))
            }
            size => known *= size as usize,
        }
    }

    let mut resolved: Vec<usize> = sizes.iter().map(|&size| size.max(0) as usize).collect();
    if let Some(dim) = inferred {
        if known == 0 || numel % known != 0 {
            return Err(Error::size_mismatch(format!(
                "cannot infer dimension {} of {:?} from {} elements",
                dim, sizes, numel
            )));
        }
        resolved[dim] = numel / known;
    }

    if numel_of(&resolved) != numel {
        return Err(Error::size_mismatch(format!(
            "view of size {:?} does not match {} elements",
            resolved, numel
        )));
    }
    Ok(resolved)
}

#[derive(Clone)]
struct TensorInner {
    ty: TensorType,
    shape: Vec<usize>,
    stride: Vec<usize>,
    offset: usize,
    storage: Option<Storage>,
}

impl TensorInner {
    fn empty(ty: TensorType) -> Self {
        Self {
            ty,
            shape: Vec::new(),
            stride: Vec::new(),
            offset: 0,
            storage: None,
        }
    }

    /// Storage positions of every element, in row-major logical order
    fn storage_indices(&self) -> Vec<usize> {
        let numel = numel_of(&self.shape);
        let mut indices = Vec::with_capacity(numel);
        if numel == 0 {
            return indices;
        }

        let rank = self.shape.len();
        let mut counter = vec![0usize; rank];
        let mut position = self.offset;
        loop {
            indices.push(position);

            let mut dim = rank;
            loop {
                if dim == 0 {
                    return indices;
                }
                dim -= 1;
                counter[dim] += 1;
                position += self.stride[dim];
                if counter[dim] < self.shape[dim] {
                    break;
                }
                position -= self.stride[dim] * counter[dim];
                counter[dim] = 0;
            }
        }
    }
}

/// Shared handle to a strided view over a [`Storage`]
///
/// Cloning the handle gives the same tensor: mutations such as [`resize`],
/// [`set`] or [`fill`] are visible through every clone. Distinct tensors
/// may view one storage.
///
/// [`resize`]: Tensor::resize
/// [`set`]: Tensor::set
/// [`fill`]: Tensor::fill
#[derive(Clone)]
pub struct Tensor {
    id: TensorId,
    inner: Arc<RwLock<TensorInner>>,
}

impl Tensor {
    /// Empty tensor of type `ty`, bound to no storage
    pub fn new(ty: TensorType) -> Self {
        Self {
            id: TensorId::next(),
            inner: Arc::new(RwLock::new(TensorInner::empty(ty))),
        }
    }

    /// Empty tensor of the same type as `self`
    pub fn new_like(&self) -> Self {
        Self::new(self.tensor_type())
    }

    /// Zero-filled contiguous tensor
    pub fn zeros(ty: TensorType, shape: &[usize]) -> Result<Self> {
        let tensor = Self::new(ty);
        tensor.resize(shape)?;
        Ok(tensor)
    }

    /// Contiguous tensor of `T`'s dtype holding `values`
    pub fn from_slice<T: Element>(values: &[T], shape: &[usize]) -> Result<Self> {
        if numel_of(shape) != values.len() {
            return Err(Error::size_mismatch(format!(
                "{} values cannot fill shape {:?}",
                values.len(),
                shape
            )));
        }
        let tensor = Self::new(TensorType::new(T::DTYPE));
        if !values.is_empty() {
            let storage = Storage::from_slice(values);
            tensor.set(&storage, 0, shape, &contiguous_strides(shape))?;
        }
        Ok(tensor)
    }

    /// Contiguous tensor of type `ty` holding `values`
    pub fn from_values(ty: TensorType, values: &[f64], shape: &[usize]) -> Result<Self> {
        let source = Self::from_slice(values, shape)?;
        let tensor = Self::zeros(ty, shape)?;
        tensor.copy_from(&source)?;
        Ok(tensor)
    }

    /// Identity token
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Whether both handles are the same tensor
    pub fn same(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether both tensors view one storage
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        match (self.storage(), other.storage()) {
            (Some(a), Some(b)) => a.same(&b),
            _ => false,
        }
    }

    /// Type tag
    pub fn tensor_type(&self) -> TensorType {
        self.inner.read().ty.clone()
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.inner.read().ty.dtype()
    }

    /// Sizes of every dimension
    pub fn shape(&self) -> Vec<usize> {
        self.inner.read().shape.clone()
    }

    /// Strides of every dimension
    pub fn stride(&self) -> Vec<usize> {
        self.inner.read().stride.clone()
    }

    /// Size of dimension `dim`
    pub fn size(&self, dim: usize) -> Option<usize> {
        self.inner.read().shape.get(dim).copied()
    }

    /// Stride of dimension `dim`
    pub fn stride_at(&self, dim: usize) -> Option<usize> {
        self.inner.read().stride.get(dim).copied()
    }

    /// Offset of the first element within the storage
    pub fn storage_offset(&self) -> usize {
        self.inner.read().offset
    }

    /// Number of dimensions
    pub fn dim(&self) -> usize {
        self.inner.read().shape.len()
    }

    /// Number of elements
    pub fn numel(&self) -> usize {
        numel_of(&self.inner.read().shape)
    }

    /// Backing storage, if bound
    pub fn storage(&self) -> Option<Storage> {
        self.inner.read().storage.clone()
    }

    /// Whether elements sit in row-major order with no gaps
    ///
    /// Tensors without elements are always contiguous.
    pub fn is_contiguous(&self) -> bool {
        let inner = self.inner.read();
        if numel_of(&inner.shape) == 0 {
            return true;
        }
        let mut expected = 1usize;
        for (&size, &stride) in inner.shape.iter().zip(inner.stride.iter()).rev() {
            // singleton dimensions never step
            if size == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= size;
        }
        true
    }

    /// Rebind the view onto `storage`
    pub fn set(&self, storage: &Storage, offset: usize, shape: &[usize], stride: &[usize]) -> Result<()> {
        if shape.len() != stride.len() {
            return Err(Error::invalid_view(format!(
                "shape {:?} and stride {:?} differ in rank",
                shape, stride
            )));
        }

        let mut inner = self.inner.write();
        if inner.ty.dtype() != storage.dtype() {
            return Err(Error::type_mismatch(
                inner.ty.storage_type().to_string(),
                storage.storage_type().to_string(),
            ));
        }

        if numel_of(shape) > 0 {
            let last = shape
                .iter()
                .zip(stride.iter())
                .fold(offset, |acc, (&size, &step)| acc + (size.saturating_sub(1)) * step);
            if last >= storage.len() {
                return Err(Error::invalid_view(format!(
                    "view reaches element {} of {} with {} elements",
                    last,
                    storage.id(),
                    storage.len()
                )));
            }
        }

        inner.shape = shape.to_vec();
        inner.stride = stride.to_vec();
        inner.offset = offset;
        inner.storage = Some(storage.clone());
        Ok(())
    }

    /// Detach from the storage, leaving an empty tensor of the same type
    pub fn set_empty(&self) {
        let mut inner = self.inner.write();
        let ty = inner.ty.clone();
        *inner = TensorInner::empty(ty);
    }

    /// Resize to `shape` with contiguous strides
    ///
    /// The storage grows in place when too small; an unbound tensor gets a
    /// fresh storage. Element values are unspecified afterwards.
    pub fn resize(&self, shape: &[usize]) -> Result<()> {
        let mut inner = self.inner.write();
        let numel = numel_of(shape);
        inner.stride = contiguous_strides(shape);
        inner.shape = shape.to_vec();

        if numel == 0 {
            return Ok(());
        }
        match inner.storage.clone() {
            Some(storage) => {
                let needed = inner.offset + numel;
                if storage.len() < needed {
                    debug!(storage = %storage.id(), from = storage.len(), to = needed, "growing storage");
                    storage.resize(needed);
                }
            }
            None => {
                let storage = Storage::new(inner.ty.storage_type(), numel);
                debug!(tensor = %self.id, storage = %storage.id(), numel, "allocating storage");
                inner.offset = 0;
                inner.storage = Some(storage);
            }
        }
        Ok(())
    }

    /// Resize to the shape of `other`
    pub fn resize_as(&self, other: &Tensor) -> Result<()> {
        if self.same(other) {
            return Ok(());
        }
        let shape = other.shape();
        self.resize(&shape)
    }

    /// Set every element to `value`
    pub fn fill(&self, value: f64) -> Result<()> {
        let (indices, storage) = self.writable_layout()?;
        if let Some(storage) = storage {
            storage.with_data_mut(|data| {
                for index in indices {
                    data.set(index, value);
                }
            });
        }
        Ok(())
    }

    /// `self += value * other`, element by element in logical order
    pub fn add_scaled(&self, value: f64, other: &Tensor) -> Result<()> {
        self.check_numel(other, "add")?;
        let addend = other.to_vec_f64();
        let (indices, storage) = self.writable_layout()?;
        if let Some(storage) = storage {
            storage.with_data_mut(|data| {
                for (index, rhs) in indices.into_iter().zip(addend) {
                    let lhs = data.get(index).unwrap_or_default();
                    data.set(index, lhs + value * rhs);
                }
            });
        }
        Ok(())
    }

    /// Copy the values of `other`, converting between element types
    pub fn copy_from(&self, other: &Tensor) -> Result<()> {
        self.check_numel(other, "copy")?;
        let values = other.to_vec_f64();
        let (indices, storage) = self.writable_layout()?;
        if let Some(storage) = storage {
            storage.with_data_mut(|data| {
                for (index, value) in indices.into_iter().zip(values) {
                    data.set(index, value);
                }
            });
        }
        Ok(())
    }

    /// Become a zero-copy view of the contiguous tensor `src` with `sizes`
    ///
    /// One entry of `sizes` may be `-1`; it is inferred from the element count.
    pub fn view_from(&self, src: &Tensor, sizes: &[isize]) -> Result<()> {
        if !src.is_contiguous() {
            return Err(Error::invalid_view("cannot view a non-contiguous tensor"));
        }
        let source = src.inner.read().clone();
        let shape = infer_sizes(sizes, numel_of(&source.shape))?;
        let stride = contiguous_strides(&shape);

        let mut inner = self.inner.write();
        inner.ty = source.ty;
        inner.shape = shape;
        inner.stride = stride;
        inner.offset = source.offset;
        inner.storage = source.storage;
        Ok(())
    }

    /// Zero-copy view with dimensions `dim0` and `dim1` swapped
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Tensor> {
        let mut layout = self.inner.read().clone();
        let rank = layout.shape.len();
        for dim in [dim0, dim1] {
            if dim >= rank {
                return Err(Error::InvalidDimension { dim, rank });
            }
        }
        layout.shape.swap(dim0, dim1);
        layout.stride.swap(dim0, dim1);
        Ok(Self {
            id: TensorId::next(),
            inner: Arc::new(RwLock::new(layout)),
        })
    }

    /// Values in row-major logical order
    pub fn to_vec_f64(&self) -> Vec<f64> {
        let (indices, storage) = self.layout();
        match storage {
            Some(storage) => storage.with_data(|data| {
                indices
                    .into_iter()
                    .map(|index| data.get(index).unwrap_or_default())
                    .collect()
            }),
            None => Vec::new(),
        }
    }

    fn layout(&self) -> (Vec<usize>, Option<Storage>) {
        let inner = self.inner.read();
        (inner.storage_indices(), inner.storage.clone())
    }

    /// Like `layout`, but fails when the storage shrank below the view
    fn writable_layout(&self) -> Result<(Vec<usize>, Option<Storage>)> {
        let (indices, storage) = self.layout();
        if let (Some(storage), Some(&last)) = (&storage, indices.iter().max()) {
            if last >= storage.len() {
                return Err(Error::size_mismatch(format!(
                    "{} reaches element {} of {} with {} elements",
                    self.id,
                    last,
                    storage.id(),
                    storage.len()
                )));
            }
        }
        Ok((indices, storage))
    }

    fn check_numel(&self, other: &Tensor, op: &str) -> Result<()> {
        let (lhs, rhs) = (self.numel(), other.numel());
        if lhs != rhs {
            return Err(Error::size_mismatch(format!(
                "cannot {} a tensor of {} elements into one of {}",
                op, rhs, lhs
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Tensor")
            .field("id", &self.id)
            .field("type", &inner.ty.to_string())
            .field("shape", &inner.shape)
            .field("stride", &inner.stride)
            .field("offset", &inner.offset)
            .field("storage", &inner.storage.as_ref().map(Storage::id))
            .finish()
    }
}
