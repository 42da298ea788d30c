//! Flat typed buffers shared between tensors

use half::f16;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::dtype::{DType, Element, StorageType};
use crate::error::{Error, Result};

static NEXT_STORAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity token of a storage, stable for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageId(u64);

impl StorageId {
    fn next() -> Self {
        Self(NEXT_STORAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage#{}", self.0)
    }
}

/// Element buffer, one variant per [`DType`]
#[derive(Debug, Clone, PartialEq)]
pub enum StorageData {
    /// `u8` elements
    Byte(Vec<u8>),
    /// `i8` elements
    Char(Vec<i8>),
    /// `i16` elements
    Short(Vec<i16>),
    /// `i32` elements
    Int(Vec<i32>),
    /// `i64` elements
    Long(Vec<i64>),
    /// `f16` elements
    Half(Vec<f16>),
    /// `f32` elements
    Float(Vec<f32>),
    /// `f64` elements
    Double(Vec<f64>),
}

macro_rules! with_buffer {
    ($data:expr, $buf:ident => $body:expr) => {
        match $data {
            StorageData::Byte($buf) => $body,
            StorageData::Char($buf) => $body,
            StorageData::Short($buf) => $body,
            StorageData::Int($buf) => $body,
            StorageData::Long($buf) => $body,
            StorageData::Half($buf) => $body,
            StorageData::Float($buf) => $body,
            StorageData::Double($buf) => $body,
        }
    };
}

impl StorageData {
    /// Zero-initialised buffer of `len` elements
    pub fn zeros(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::Byte => StorageData::Byte(vec![0; len]),
            DType::Char => StorageData::Char(vec![0; len]),
            DType::Short => StorageData::Short(vec![0; len]),
            DType::Int => StorageData::Int(vec![0; len]),
            DType::Long => StorageData::Long(vec![0; len]),
            DType::Half => StorageData::Half(vec![f16::ZERO; len]),
            DType::Float => StorageData::Float(vec![0.0; len]),
            DType::Double => StorageData::Double(vec![0.0; len]),
        }
    }

    /// Element type of the buffer
    pub fn dtype(&self) -> DType {
        match self {
            StorageData::Byte(_) => DType::Byte,
            StorageData::Char(_) => DType::Char,
            StorageData::Short(_) => DType::Short,
            StorageData::Int(_) => DType::Int,
            StorageData::Long(_) => DType::Long,
            StorageData::Half(_) => DType::Half,
            StorageData::Float(_) => DType::Float,
            StorageData::Double(_) => DType::Double,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        with_buffer!(self, buf => buf.len())
    }

    /// Whether the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` as `f64`
    pub fn get(&self, index: usize) -> Option<f64> {
        with_buffer!(self, buf => buf.get(index).map(|value| value.to_f64()))
    }

    /// Store `value` at `index`, converting to the buffer's element type
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: f64) {
        with_buffer!(self, buf => buf[index] = Element::from_f64(value))
    }

    /// Grow (zero-filled) or shrink to `len` elements
    pub fn resize(&mut self, len: usize) {
        with_buffer!(self, buf => buf.resize(len, Default::default()))
    }

    /// Every element as `f64`, in buffer order
    pub fn to_vec_f64(&self) -> Vec<f64> {
        with_buffer!(self, buf => buf.iter().map(|value| value.to_f64()).collect())
    }
}

/// Shared handle to a typed buffer
///
/// Cloning the handle aliases the buffer; the identity token survives resizes
/// and copies.
#[derive(Clone)]
pub struct Storage {
    id: StorageId,
    ty: StorageType,
    data: Arc<RwLock<StorageData>>,
}

impl Storage {
    /// Zero-initialised storage of `len` elements
    pub fn new(ty: StorageType, len: usize) -> Self {
        let data = StorageData::zeros(ty.dtype(), len);
        Self {
            id: StorageId::next(),
            ty,
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Storage in the default namespace holding `values`
    pub fn from_slice<T: Element>(values: &[T]) -> Self {
        let storage = Self::new(StorageType::new(T::DTYPE), values.len());
        storage.with_data_mut(|data| {
            for (index, value) in values.iter().enumerate() {
                data.set(index, value.to_f64());
            }
        });
        storage
    }

    /// Identity token
    pub fn id(&self) -> StorageId {
        self.id
    }

    /// Storage type tag
    pub fn storage_type(&self) -> &StorageType {
        &self.ty
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.ty.dtype()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the storage holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` as `f64`
    pub fn get(&self, index: usize) -> Option<f64> {
        self.data.read().get(index)
    }

    /// Store `value` at `index`
    pub fn set(&self, index: usize, value: f64) -> Result<()> {
        let mut data = self.data.write();
        if index >= data.len() {
            return Err(Error::size_mismatch(format!(
                "index {} out of bounds for {} of {} elements",
                index,
                self.id,
                data.len()
            )));
        }
        data.set(index, value);
        Ok(())
    }

    /// Resize in place, keeping the identity token
    pub fn resize(&self, len: usize) {
        self.data.write().resize(len);
    }

    /// Copy every element of `src`, converting between element types
    pub fn copy_from(&self, src: &Storage) -> Result<()> {
        if self.same(src) {
            return Ok(());
        }
        if self.len() != src.len() {
            return Err(Error::size_mismatch(format!(
                "cannot copy {} elements into a storage of {}",
                src.len(),
                self.len()
            )));
        }

        if self.dtype() == src.dtype() {
            let values = src.data.read().clone();
            *self.data.write() = values;
        } else {
            let values = src.to_vec_f64();
            self.with_data_mut(|data| {
                for (index, value) in values.into_iter().enumerate() {
                    data.set(index, value);
                }
            });
        }
        Ok(())
    }

    /// Every element as `f64`
    pub fn to_vec_f64(&self) -> Vec<f64> {
        self.data.read().to_vec_f64()
    }

    /// Whether both handles refer to the same buffer
    pub fn same(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&StorageData) -> R) -> R {
        f(&self.data.read())
    }

    pub(crate) fn with_data_mut<R>(&self, f: impl FnOnce(&mut StorageData) -> R) -> R {
        f(&mut self.data.write())
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("id", &self.id)
            .field("type", &self.ty.to_string())
            .field("len", &self.len())
            .finish()
    }
}
