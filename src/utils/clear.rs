//! Dropping transient buffers before serialization

use std::collections::HashMap;
use tracing::trace;

use crate::nested::Nested;

/// Named attributes of a module-like object
pub trait Attributes {
    /// Mutable access to attribute `name`
    fn attribute_mut(&mut self, name: &str) -> Option<&mut Nested>;

    /// Remove attribute `name`, returning its value
    fn remove_attribute(&mut self, name: &str) -> Option<Nested>;
}

/// A plain name-to-value attribute map
#[derive(Debug, Default)]
pub struct AttributeTable {
    entries: HashMap<String, Nested>,
}

impl AttributeTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set attribute `name`, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Nested>) -> Option<Nested> {
        self.entries.insert(name.into(), value.into())
    }

    /// Attribute `name`
    pub fn get(&self, name: &str) -> Option<&Nested> {
        self.entries.get(name)
    }

    /// Whether attribute `name` is set
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attribute is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attribute names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over every attribute value mutably
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Nested> {
        self.entries.values_mut()
    }
}

impl Attributes for AttributeTable {
    fn attribute_mut(&mut self, name: &str) -> Option<&mut Nested> {
        self.entries.get_mut(name)
    }

    fn remove_attribute(&mut self, name: &str) -> Option<Nested> {
        self.entries.remove(name)
    }
}

/// Clear the attributes `names` of `obj`
///
/// Tensors are detached from their storage, sequences are emptied, and any
/// other value is removed. Names `obj` does not have are skipped. See
/// [`clear!`](crate::clear!) for the variadic form.
pub fn clear<'a, O, S>(obj: &'a mut O, names: &[S]) -> &'a mut O
where
    O: Attributes + ?Sized,
    S: AsRef<str>,
{
    for name in names {
        clear_attribute(obj, name.as_ref());
    }
    obj
}

fn clear_attribute<O: Attributes + ?Sized>(obj: &mut O, name: &str) {
    let remove = match obj.attribute_mut(name) {
        None => {
            trace!(name, "no such attribute");
            return;
        }
        Some(Nested::Tensor(tensor)) => {
            tensor.set_empty();
            false
        }
        Some(Nested::Seq(items)) => {
            items.clear();
            false
        }
        Some(_) => true,
    };
    if remove {
        obj.remove_attribute(name);
    }
}

/// Variadic form of [`clear`](crate::utils::clear)
///
/// ```
/// use legacy_nn_utils::{clear, AttributeTable, Nested};
///
/// let mut module = AttributeTable::new();
/// module.insert("_buffer", Nested::Seq(vec![Nested::Scalar(1.0)]));
/// module.insert("_scale", 2.0);
/// clear!(&mut module, "_buffer", "_scale", "_missing");
/// assert!(module.get("_buffer").unwrap().as_seq().unwrap().is_empty());
/// assert!(!module.contains("_scale"));
/// ```
#[macro_export]
macro_rules! clear {
    ($obj:expr $(, $name:expr)* $(,)?) => {{
        let names: &[&str] = &[$($name),*];
        $crate::utils::clear($obj, names)
    }};
}
