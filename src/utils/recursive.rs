//! Structure-preserving traversals: resize, fill, scaled add and copy
//!
//! Each operation walks a destination and a source (or template) in lock
//! step. Sequences recurse element-wise; tensors are mutated in place; any
//! other leaf is a [`TypeMismatch`](crate::Error::TypeMismatch).

use tracing::instrument;

use crate::error::{Error, Result};
use crate::nested::Nested;
use crate::tensor::Tensor;

const NESTED: &str = "nested tensors or sequences";

fn mismatch(t1: &Nested, t2: &Nested) -> Error {
    Error::type_mismatch(NESTED, format!("{} and {}", t1.kind(), t2.kind()))
}

/// Tensor in `slot`, replacing any other value by an empty tensor like `template`
fn tensor_in_slot(slot: &mut Nested, template: &Tensor) -> Tensor {
    match slot {
        Nested::Tensor(tensor) => tensor.clone(),
        _ => {
            let tensor = template.new_like();
            *slot = Nested::Tensor(tensor.clone());
            tensor
        }
    }
}

/// Run `f` over the items of `t1` (wrapped into a sequence if needed) and put
/// them back even when `f` fails
fn with_items<F>(t1: &mut Nested, f: F) -> Result<()>
where
    F: FnOnce(&mut Vec<Nested>) -> Result<()>,
{
    let mut items = t1.take_seq();
    let result = f(&mut items);
    *t1 = Nested::Seq(items);
    result
}

/// Reshape `t1` so it mirrors the structure and tensor shapes of `t2`
///
/// Sequences are padded with fresh slots or truncated to `t2`'s length. Tensor
/// values are unspecified afterwards.
#[instrument(skip_all)]
pub fn recursive_resize_as(t1: &mut Nested, t2: &Nested) -> Result<()> {
    match t2 {
        Nested::Seq(targets) => with_items(t1, |items| {
            if items.len() < targets.len() {
                items.resize_with(targets.len(), Nested::default);
            }
            for (item, target) in items.iter_mut().zip(targets) {
                recursive_resize_as(item, target)?;
            }
            items.truncate(targets.len());
            Ok(())
        }),
        Nested::Tensor(target) => tensor_in_slot(t1, target).resize_as(target),
        _ => Err(mismatch(t1, t2)),
    }
}

/// Fill every tensor in `t` with `value`
pub fn recursive_fill(t: &Nested, value: f64) -> Result<()> {
    match t {
        Nested::Seq(items) => items.iter().try_for_each(|item| recursive_fill(item, value)),
        Nested::Tensor(tensor) => tensor.fill(value),
        other => Err(Error::type_mismatch("tensor or sequence thereof", other.kind())),
    }
}

/// `t1 += t2`, element-wise over matching structures
pub fn recursive_add(t1: &mut Nested, t2: &Nested) -> Result<()> {
    recursive_add_scaled(t1, 1.0, t2)
}

/// `t1 += value * t2`, element-wise over matching structures
///
/// A bare `t1` facing a sequence is wrapped into a one-element sequence first;
/// it must then be at least as long as `t2`.
#[instrument(skip(t1, t2))]
pub fn recursive_add_scaled(t1: &mut Nested, value: f64, t2: &Nested) -> Result<()> {
    if let Nested::Seq(sources) = t2 {
        let available = t1.seq_len();
        if available < sources.len() {
            return Err(Error::size_mismatch(format!(
                "cannot add a sequence of {} into a sequence of {}",
                sources.len(),
                available
            )));
        }
        return with_items(t1, |items| {
            for (item, source) in items.iter_mut().zip(sources) {
                recursive_add_scaled(item, value, source)?;
            }
            Ok(())
        });
    }

    match (t1, t2) {
        (Nested::Tensor(dst), Nested::Tensor(src)) => dst.add_scaled(value, src),
        (t1, t2) => Err(mismatch(t1, t2)),
    }
}

/// Copy the structure and values of `t2` into `t1`
///
/// Missing slots of `t1` are created; tensors are resized to `t2`'s shapes
/// before the values are copied.
#[instrument(skip_all)]
pub fn recursive_copy(t1: &mut Nested, t2: &Nested) -> Result<()> {
    match t2 {
        Nested::Seq(sources) => with_items(t1, |items| {
            if items.len() < sources.len() {
                items.resize_with(sources.len(), Nested::default);
            }
            for (item, source) in items.iter_mut().zip(sources) {
                recursive_copy(item, source)?;
            }
            Ok(())
        }),
        Nested::Tensor(source) => {
            let tensor = tensor_in_slot(t1, source);
            tensor.resize_as(source)?;
            tensor.copy_from(source)
        }
        _ => Err(mismatch(t1, t2)),
    }
}
