//! Zero-copy view helpers

use tracing::debug;

use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// View of `t` with a size-1 dimension inserted at `dim`
///
/// The result aliases `t`'s storage with the same offset. When `view` is given
/// it is rebound and returned, otherwise a fresh tensor of `t`'s type is used.
pub fn add_singleton_dimension(t: &Tensor, dim: usize, view: Option<&Tensor>) -> Result<Tensor> {
    let rank = t.dim();
    if dim > rank {
        return Err(Error::InvalidDimension { dim, rank });
    }
    let storage = t
        .storage()
        .ok_or_else(|| Error::invalid_view(format!("{} is not bound to a storage", t.id())))?;

    let mut shape = t.shape();
    let mut stride = t.stride();
    shape.insert(dim, 1);
    stride.insert(dim, 1);

    let view = view.cloned().unwrap_or_else(|| t.new_like());
    view.set(&storage, t.storage_offset(), &shape, &stride)?;
    Ok(view)
}

/// `input` viewed with `sizes`, copying first only when `input` is not
/// contiguous
///
/// On the view path `output` aliases `input`'s storage. On the copy path it
/// never does: an `output` that shares `input`'s storage is detached first, and
/// `input` itself passed as `output` is replaced by a fresh tensor.
pub fn contiguous_view(output: Option<Tensor>, input: &Tensor, sizes: &[isize]) -> Result<Tensor> {
    let mut output = output.unwrap_or_else(|| input.new_like());

    if input.is_contiguous() {
        output.view_from(input, sizes)?;
        return Ok(output);
    }

    if output.same(input) {
        output = input.new_like();
    } else if output.shares_storage(input) {
        output.set_empty();
    }
    debug!(input = %input.id(), output = %output.id(), "copying non-contiguous input before view");
    output.resize_as(input)?;
    output.copy_from(input)?;
    let copied = output.clone();
    output.view_from(&copied, sizes)?;
    Ok(output)
}
