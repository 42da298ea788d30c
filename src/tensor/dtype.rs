//! Element types and the dotted type tags used by the legacy framework
//!
//! A tensor type tag looks like `torch.FloatTensor`; the matching storage tag
//! is obtained by swapping the `Tensor` suffix for `Storage`.

use half::f16;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Namespace used when a type tag is built from a bare [`DType`]
pub const DEFAULT_NAMESPACE: &str = "torch";

const TENSOR_SUFFIX: &str = "Tensor";
const STORAGE_SUFFIX: &str = "Storage";

/// Element type of a tensor or storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// Unsigned 8-bit integer
    Byte,
    /// Signed 8-bit integer
    Char,
    /// Signed 16-bit integer
    Short,
    /// Signed 32-bit integer
    Int,
    /// Signed 64-bit integer
    Long,
    /// IEEE half precision
    Half,
    /// Single precision
    Float,
    /// Double precision
    Double,
}

impl DType {
    /// All element types, in tag order
    pub const ALL: [DType; 8] = [
        DType::Byte,
        DType::Char,
        DType::Short,
        DType::Int,
        DType::Long,
        DType::Half,
        DType::Float,
        DType::Double,
    ];

    /// Prefix used in type tags (`Float` in `torch.FloatTensor`)
    pub fn name(&self) -> &'static str {
        match self {
            DType::Byte => "Byte",
            DType::Char => "Char",
            DType::Short => "Short",
            DType::Int => "Int",
            DType::Long => "Long",
            DType::Half => "Half",
            DType::Float => "Float",
            DType::Double => "Double",
        }
    }

    /// Look a dtype up by its tag prefix
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|dtype| dtype.name() == name)
    }

    /// Size of one element in bytes
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::Byte | DType::Char => 1,
            DType::Short | DType::Half => 2,
            DType::Int | DType::Float => 4,
            DType::Long | DType::Double => 8,
        }
    }

    /// Whether the dtype holds floating point values
    pub fn is_floating_point(&self) -> bool {
        matches!(self, DType::Half | DType::Float | DType::Double)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rust scalar backing a [`DType`]
///
/// Values move between element types through `f64`; conversions that fall
/// outside the destination range saturate.
pub trait Element: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// The dtype this scalar stores
    const DTYPE: DType;

    /// Convert from `f64`
    fn from_f64(value: f64) -> Self;

    /// Convert to `f64`
    fn to_f64(self) -> f64;
}

macro_rules! primitive_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn from_f64(value: f64) -> Self {
                    <f64 as AsPrimitive<$ty>>::as_(value)
                }

                #[inline]
                fn to_f64(self) -> f64 {
                    <$ty as AsPrimitive<f64>>::as_(self)
                }
            }
        )*
    };
}

primitive_element! {
    u8 => Byte,
    i8 => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl Element for f16 {
    const DTYPE: DType = DType::Half;

    #[inline]
    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }
}

/// Split `ns.NameSuffix` into its namespace and dtype
fn parse_tag(name: &str, suffix: &str) -> Result<(String, DType)> {
    let (namespace, type_name) = name
        .rsplit_once('.')
        .ok_or_else(|| Error::invalid_type_name(name))?;
    if namespace.is_empty() {
        return Err(Error::invalid_type_name(name));
    }
    let prefix = type_name
        .strip_suffix(suffix)
        .ok_or_else(|| Error::invalid_type_name(name))?;
    let dtype = DType::from_name(prefix).ok_or_else(|| Error::invalid_type_name(name))?;
    Ok((namespace.to_string(), dtype))
}

/// Tensor type tag, e.g. `torch.FloatTensor`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TensorType {
    namespace: String,
    dtype: DType,
}

impl TensorType {
    /// Tag in the default namespace
    pub fn new(dtype: DType) -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE, dtype)
    }

    /// Tag in an explicit namespace
    pub fn with_namespace(namespace: impl Into<String>, dtype: DType) -> Self {
        Self {
            namespace: namespace.into(),
            dtype,
        }
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Namespace part of the tag
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Storage tag paired with this tensor tag
    pub fn storage_type(&self) -> StorageType {
        StorageType::with_namespace(self.namespace.clone(), self.dtype)
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.namespace, self.dtype.name(), TENSOR_SUFFIX)
    }
}

impl FromStr for TensorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, dtype) = parse_tag(s, TENSOR_SUFFIX)?;
        Ok(Self { namespace, dtype })
    }
}

impl TryFrom<String> for TensorType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TensorType> for String {
    fn from(value: TensorType) -> Self {
        value.to_string()
    }
}

/// Storage type tag, e.g. `torch.FloatStorage`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageType {
    namespace: String,
    dtype: DType,
}

impl StorageType {
    /// Tag in the default namespace
    pub fn new(dtype: DType) -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE, dtype)
    }

    /// Tag in an explicit namespace
    pub fn with_namespace(namespace: impl Into<String>, dtype: DType) -> Self {
        Self {
            namespace: namespace.into(),
            dtype,
        }
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Namespace part of the tag
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.namespace, self.dtype.name(), STORAGE_SUFFIX)
    }
}

impl FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (namespace, dtype) = parse_tag(s, STORAGE_SUFFIX)?;
        Ok(Self { namespace, dtype })
    }
}

/// Derive a storage tag from a tensor tag by textual substitution
pub fn storage_type_name(tensor_type: &str) -> String {
    tensor_type.replace(TENSOR_SUFFIX, STORAGE_SUFFIX)
}
