//! Convenience traits layered on a [`Registry`].
//!
//! These let an object manage its own presence in a registry: keep itself
//! alive until told otherwise ([`InstanceKeepable`]), live exactly as long as
//! some host ([`LiveTogether`]), or keep other objects alive by key
//! ([`ObjectKeeping`]). All of them go through [`ValueKeepable::keeper`],
//! which defaults to the process-wide registry.

use std::any::Any;
use std::sync::Arc;

use crate::{shared, Mode, Registry, RegistryKey, ReleaseHost};

/// Chooses the registry the other keeping traits work against.
pub trait ValueKeepable {
    fn keeper(&self) -> &Registry {
        shared()
    }
}

/// An object that can pin itself in the registry.
///
/// Once kept, the instance is not released until [`drop_instance`] is called.
///
/// ```rust
/// use std::sync::Arc;
/// use value_keeper::{InstanceKeepable, ValueKeepable};
///
/// struct Downloader;
/// impl ValueKeepable for Downloader {}
/// impl InstanceKeepable for Downloader {}
///
/// let downloader = Arc::new(Downloader);
/// let watcher = Arc::downgrade(&downloader);
///
/// downloader.keep_instance();
/// drop(downloader);
/// assert!(watcher.upgrade().is_some());
///
/// watcher.upgrade().unwrap().drop_instance();
/// assert!(watcher.upgrade().is_none());
/// ```
///
/// [`drop_instance`]: InstanceKeepable::drop_instance
pub trait InstanceKeepable: ValueKeepable + Any + Send + Sync {
    fn keep_instance(self: &Arc<Self>)
    where
        Self: Sized,
    {
        self.keeper().set_value(
            RegistryKey::instance_of(&**self),
            Arc::clone(self),
            Mode::Strong,
        );
    }

    fn drop_instance(&self) {
        self.keeper().remove_value(RegistryKey::instance_of(self));
    }

    fn is_instance_kept(&self) -> bool {
        self.keeper().contains(RegistryKey::instance_of(self))
    }
}

/// An object whose lifetime follows another object's.
pub trait LiveTogether: ValueKeepable + Any + Send + Sync {
    /// Keeps `self` alive until `host` is destroyed.
    fn live_together(self: &Arc<Self>, host: &dyn ReleaseHost)
    where
        Self: Sized,
    {
        self.keeper().set_value(
            RegistryKey::instance_of(&**self),
            Arc::clone(self),
            Mode::Host(host),
        );
    }
}

/// An object that keeps other objects alive without owning them in a field.
pub trait ObjectKeeping: ValueKeepable {
    fn keep_object<O: Send + Sync + 'static>(&self, key: impl Into<RegistryKey>, object: Arc<O>) {
        self.keeper().set_value(key, object, Mode::Strong);
    }

    fn kept_object<O: Send + Sync + 'static>(&self, key: impl Into<RegistryKey>) -> Option<Arc<O>> {
        self.keeper().get_value(key)
    }

    fn drop_object(&self, key: impl Into<RegistryKey>) {
        self.keeper().remove_value(key);
    }

    /// Drops the object kept under `O`'s type-derived key.
    fn drop_object_of<O: ?Sized>(&self) {
        self.drop_object(RegistryKey::of::<O>());
    }
}

/// Creates `value`, stores it in the process-wide registry under its type
/// key, and hands it back.
///
/// With [`Mode::Weak`] the stored entry lives exactly as long as the returned
/// `Arc` and its clones.
pub fn global_value<T: Send + Sync + 'static>(value: T, mode: Mode<'_>) -> Arc<T> {
    let value = Arc::new(value);
    shared().set_typed(Arc::clone(&value), mode);
    value
}

/// Reads back a value stored by [`global_value`].
pub fn global<T: Send + Sync + 'static>() -> Option<Arc<T>> {
    shared().get_typed()
}
