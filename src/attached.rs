//! Small per-object key/value store.
//!
//! Unlike the [`Registry`](crate::Registry), attached data belongs to one
//! object and is dropped with it. Keys default to the value's type path.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::RegistryKey;

type AnyBox = Box<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct AttachedData {
    values: Mutex<HashMap<RegistryKey, AnyBox>>,
}

impl AttachedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `value` under its type key, replacing any previous one.
    pub fn attach<V: Send + Sync + 'static>(&self, value: V) {
        self.attach_with_key(RegistryKey::of::<V>(), value);
    }

    pub fn attach_with_key<V: Send + Sync + 'static>(&self, key: impl Into<RegistryKey>, value: V) {
        let key: RegistryKey = key.into();
        let previous = self.values.lock().insert(key, Box::new(value));
        drop(previous);
    }

    /// Removes the value under `key`. Returns whether one existed.
    pub fn detach(&self, key: impl Into<RegistryKey>) -> bool {
        let key: RegistryKey = key.into();
        let removed = self.values.lock().remove(&key);
        removed.is_some()
    }

    /// Copy of the value under `key`, if present and of type `V`.
    pub fn attached_value<V: Clone + 'static>(&self, key: impl Into<RegistryKey>) -> Option<V> {
        let key: RegistryKey = key.into();
        self.values
            .lock()
            .get(&key)
            .and_then(|value| value.downcast_ref::<V>())
            .cloned()
    }

    pub fn attached_value_or<V: Clone + 'static>(&self, key: impl Into<RegistryKey>, default: V) -> V {
        self.attached_value(key).unwrap_or(default)
    }

    /// Copy of the value attached under `V`'s type key.
    pub fn attached<V: Clone + 'static>(&self) -> Option<V> {
        self.attached_value(RegistryKey::of::<V>())
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl fmt::Debug for AttachedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedData")
            .field("len", &self.len())
            .finish()
    }
}

/// An object carrying an [`AttachedData`] store.
pub trait DataAttachable {
    fn attached_data(&self) -> &AttachedData;

    fn attach<V: Send + Sync + 'static>(&self, value: V) {
        self.attached_data().attach(value);
    }

    fn attached_value<V: Clone + 'static>(&self, key: impl Into<RegistryKey>) -> Option<V> {
        self.attached_data().attached_value(key)
    }

    fn attached_value_or<V: Clone + 'static>(&self, key: impl Into<RegistryKey>, default: V) -> V {
        self.attached_data().attached_value_or(key, default)
    }
}
