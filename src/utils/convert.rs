//! Aliasing-preserving type conversion

use tracing::{debug, instrument, trace};

use crate::cache::ConversionCache;
use crate::error::Result;
use crate::nested::Nested;
use crate::tensor::{Storage, Tensor, TensorType};

/// Convert every tensor in `param` to `target`, in place
///
/// Sequences are converted element by element, composite objects are asked to
/// convert themselves with the same cache, and tensors go through
/// [`convert_tensor`]. Scalars and absent slots pass through untouched.
///
/// Pass the same `cache` to several calls to keep storages shared across
/// graphs converted separately. With `None` a fresh cache is used for this
/// call only.
#[instrument(skip_all, fields(target = %target))]
pub fn recursive_type(
    param: &mut Nested,
    target: &TensorType,
    cache: Option<&mut ConversionCache>,
) -> Result<()> {
    match cache {
        Some(cache) => convert_nested(param, target, cache),
        None => convert_nested(param, target, &mut ConversionCache::new()),
    }
}

fn convert_nested(param: &mut Nested, target: &TensorType, cache: &mut ConversionCache) -> Result<()> {
    match param {
        Nested::Seq(items) => {
            for item in items.iter_mut() {
                convert_nested(item, target, cache)?;
            }
        }
        Nested::Composite(object) => object.convert(target, cache)?,
        Nested::Tensor(tensor) => {
            let converted = convert_tensor(tensor, target, cache)?;
            *tensor = converted;
        }
        Nested::Scalar(_) | Nested::Absent => {}
    }
    Ok(())
}

/// Converted counterpart of `tensor`
///
/// Returns `tensor` itself when it already has the target type. Otherwise the
/// result is looked up by tensor identity, and on a miss built over a storage
/// looked up by storage identity, so every tensor aliasing one storage ends up
/// aliasing one converted storage.
pub fn convert_tensor(tensor: &Tensor, target: &TensorType, cache: &mut ConversionCache) -> Result<Tensor> {
    if tensor.tensor_type() == *target {
        return Ok(tensor.clone());
    }

    if let Some(converted) = cache.tensor(tensor.id(), target) {
        trace!(source = %tensor.id(), converted = %converted.id(), "tensor cache hit");
        return Ok(converted.clone());
    }

    let converted = Tensor::new(target.clone());
    if let Some(storage) = tensor.storage() {
        let storage = convert_storage(&storage, target, cache)?;
        converted.set(
            &storage,
            tensor.storage_offset(),
            &tensor.shape(),
            &tensor.stride(),
        )?;
    }
    cache.insert_tensor(tensor.id(), target.clone(), converted.clone());
    Ok(converted)
}

fn convert_storage(storage: &Storage, target: &TensorType, cache: &mut ConversionCache) -> Result<Storage> {
    let storage_type = target.storage_type();
    if let Some(converted) = cache.storage(storage.id(), &storage_type) {
        trace!(source = %storage.id(), converted = %converted.id(), "storage cache hit");
        return Ok(converted.clone());
    }

    let converted = Storage::new(storage_type.clone(), storage.len());
    converted.copy_from(storage)?;
    debug!(
        source = %storage.id(),
        converted = %converted.id(),
        len = storage.len(),
        to = %storage_type,
        "converted storage"
    );
    cache.insert_storage(storage.id(), storage_type, converted.clone());
    Ok(converted)
}
