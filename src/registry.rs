//! A keyed registry for sharing instances across unrelated parts of a program.
//!
//! Every entry is stored under a [`RegistryKey`] with one of three lifetimes
//! ([`Mode`]): held strongly, observed weakly, or held until a host object is
//! destroyed. A process-wide instance is available through [`shared`] and the
//! free functions of this module; [`Registry::new`] builds isolated ones.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use value_keeper::{Mode, Registry};
//!
//! let registry = Registry::new();
//!
//! let config = Arc::new("postgres://localhost".to_string());
//! registry.set_value("config", config.clone(), Mode::Weak);
//! assert_eq!(registry.get_value::<String>("config"), Some(config.clone()));
//!
//! // Weak entries vanish with their last owner.
//! drop(config);
//! assert!(registry.get_value::<String>("config").is_none());
//! ```

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock, Weak},
};

use parking_lot::Mutex;

use crate::{RegistryError, RegistryEvent, RegistryKey, ReleaseHost, TraceCallback};

type AnyArc = Arc<dyn Any + Send + Sync>;
type AnyWeak = Weak<dyn Any + Send + Sync>;

/// Ownership policy of a registry entry.
#[derive(Clone, Copy, Default)]
pub enum Mode<'h> {
    /// The registry owns the value until it is replaced or removed.
    Strong,
    /// The registry only observes the value; it disappears with its last owner.
    #[default]
    Weak,
    /// The registry owns the value until the host is destroyed.
    ///
    /// Binding a value to a host that the value itself owns forms a cycle:
    /// the host is then only released by an explicit `remove_value`.
    Host(&'h dyn ReleaseHost),
}

impl Mode<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Strong => "strong",
            Mode::Weak => "weak",
            Mode::Host(_) => "host",
        }
    }
}

impl fmt::Debug for Mode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

enum Slot {
    Strong(AnyArc),
    Weak(AnyWeak),
    Host(AnyArc),
}

impl Slot {
    fn is_alive(&self) -> bool {
        match self {
            Slot::Weak(weak) => weak.strong_count() > 0,
            Slot::Strong(_) | Slot::Host(_) => true,
        }
    }

    fn upgrade(&self) -> Option<AnyArc> {
        match self {
            Slot::Strong(value) | Slot::Host(value) => Some(Arc::clone(value)),
            Slot::Weak(weak) => weak.upgrade(),
        }
    }
}

struct Entry {
    slot: Slot,
    /// Distinguishes successive entries stored under the same key.
    stamp: u64,
}

#[derive(Default)]
struct Table {
    entries: HashMap<RegistryKey, Entry>,
    next_stamp: u64,
}

impl Table {
    /// Drops weak entries whose referent is gone and returns how many.
    ///
    /// Releasing a dead `Weak` never runs a destructor, so this is safe to do
    /// with the lock held.
    fn compact(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.slot.is_alive());
        before - self.entries.len()
    }

    fn stamp(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }
}

#[derive(Default)]
struct Inner {
    table: Mutex<Table>,
    trace: Mutex<Option<Arc<TraceCallback>>>,
}

/// Handle to a keyed store of shared values.
///
/// Cloning the handle shares the same table. All operations take one lock
/// for their whole read-modify-write (compaction included); values leaving
/// the table are dropped only after that lock is released, so destructors may
/// call back into the registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------------------------------
    // Tracing
    // ---------------------------------------------------------------------------------------------

    /// Set a tracing callback for this registry's operations.
    pub fn set_trace_callback(&self, callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
        *self.inner.trace.lock() = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    pub fn clear_trace_callback(&self) {
        *self.inner.trace.lock() = None;
    }

    fn emit_event(&self, event: &RegistryEvent) {
        let callback = self.inner.trace.lock().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    fn emit_compaction(&self, purged: usize) {
        if purged > 0 {
            tracing::debug!(purged, "purged expired weak entries");
            self.emit_event(&RegistryEvent::Compact { purged });
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Registry
    // ---------------------------------------------------------------------------------------------

    /// Stores `value` under `key`, replacing whatever was there.
    ///
    /// With [`Mode::Weak`] the registry keeps only a weak reference; if the
    /// passed `Arc` was the last owner the value is dropped before this
    /// returns. With [`Mode::Host`] a removal callback is queued on the host's
    /// [`ReleasePool`](crate::ReleasePool) before this returns.
    pub fn set_value<T: Send + Sync + 'static>(
        &self,
        key: impl Into<RegistryKey>,
        value: Arc<T>,
        mode: Mode<'_>,
    ) {
        let key: RegistryKey = key.into();
        let value: AnyArc = value;
        let slot = match mode {
            Mode::Strong => Slot::Strong(Arc::clone(&value)),
            Mode::Weak => Slot::Weak(Arc::downgrade(&value)),
            Mode::Host(_) => Slot::Host(Arc::clone(&value)),
        };

        let (purged, stamp, displaced) = {
            let mut table = self.inner.table.lock();
            let purged = table.compact();
            let stamp = table.stamp();
            let displaced = table.entries.insert(key.clone(), Entry { slot, stamp });
            (purged, stamp, displaced)
        };

        if let Mode::Host(host) = mode {
            host.release_pool()
                .on_release(self.removal_callback(key.clone(), stamp));
        }

        tracing::trace!(key = %key, mode = mode.name(), "value stored");
        self.emit_compaction(purged);
        self.emit_event(&RegistryEvent::Set {
            key,
            mode: mode.name(),
        });

        drop(displaced);
        drop(value);
    }

    /// Stores `value` strongly under `key`.
    pub fn register<T: Send + Sync + 'static>(&self, key: impl Into<RegistryKey>, value: T) {
        self.set_value(key, Arc::new(value), Mode::Strong);
    }

    /// Looks up `key` as a `T`.
    ///
    /// Returns `None` when nothing is stored, when a weak referent is gone, or
    /// when the stored value is not a `T`.
    pub fn get_value<T: Send + Sync + 'static>(
        &self,
        key: impl Into<RegistryKey>,
    ) -> Option<Arc<T>> {
        self.try_get_value(key).ok()
    }

    /// Like [`get_value`](Self::get_value), but says why nothing was found.
    ///
    /// [`RegistryError::Expired`] is only observable when the last owner of
    /// a weak value drops it concurrently with the lookup; otherwise the
    /// compaction preceding every lookup has already purged the entry.
    pub fn try_get_value<T: Send + Sync + 'static>(
        &self,
        key: impl Into<RegistryKey>,
    ) -> Result<Arc<T>, RegistryError> {
        let key: RegistryKey = key.into();

        let (purged, lookup) = {
            let mut table = self.inner.table.lock();
            let purged = table.compact();
            let lookup = table.entries.get(&key).map(|entry| entry.slot.upgrade());
            (purged, lookup)
        };

        let result = match lookup {
            None => Err(RegistryError::NotFound { key: key.clone() }),
            Some(None) => Err(RegistryError::Expired { key: key.clone() }),
            Some(Some(value)) => {
                value
                    .downcast::<T>()
                    .map_err(|_| RegistryError::TypeMismatch {
                        key: key.clone(),
                        expected: std::any::type_name::<T>(),
                    })
            }
        };

        tracing::trace!(key = %key, found = result.is_ok(), "value requested");
        self.emit_compaction(purged);
        self.emit_event(&RegistryEvent::Get {
            key,
            found: result.is_ok(),
        });

        result
    }

    /// Looks up `key` and clones the value out of its `Arc`.
    pub fn get_cloned<T: Send + Sync + Clone + 'static>(
        &self,
        key: impl Into<RegistryKey>,
    ) -> Option<T> {
        self.get_value::<T>(key).map(|value| (*value).clone())
    }

    /// Removes the entry for `key`. Returns whether one existed.
    pub fn remove_value(&self, key: impl Into<RegistryKey>) -> bool {
        let key: RegistryKey = key.into();

        let (purged, removed) = {
            let mut table = self.inner.table.lock();
            let purged = table.compact();
            (purged, table.entries.remove(&key))
        };

        let found = removed.is_some();
        tracing::trace!(key = %key, found, "value removed");
        self.emit_compaction(purged);
        self.emit_event(&RegistryEvent::Remove { key, found });

        drop(removed);
        found
    }

    /// Checks whether a live value is stored under `key`, whatever its type.
    pub fn contains(&self, key: impl Into<RegistryKey>) -> bool {
        let key: RegistryKey = key.into();

        let (purged, found) = {
            let mut table = self.inner.table.lock();
            let purged = table.compact();
            let found = table
                .entries
                .get(&key)
                .is_some_and(|entry| entry.slot.is_alive());
            (purged, found)
        };

        self.emit_compaction(purged);
        self.emit_event(&RegistryEvent::Contains { key, found });

        found
    }

    /// Purges weak entries whose referent is gone. Returns how many.
    pub fn compact(&self) -> usize {
        let purged = self.inner.table.lock().compact();
        self.emit_compaction(purged);
        purged
    }

    /// Number of entries after compaction.
    pub fn len(&self) -> usize {
        let (purged, len) = {
            let mut table = self.inner.table.lock();
            (table.compact(), table.entries.len())
        };
        self.emit_compaction(purged);
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry. Host callbacks for removed entries become no-ops.
    ///
    /// Primarily intended for testing.
    #[doc(hidden)]
    pub fn clear(&self) {
        self.emit_event(&RegistryEvent::Clear);

        let entries = std::mem::take(&mut self.inner.table.lock().entries);
        drop(entries);
    }

    // ---------------------------------------------------------------------------------------------
    // Type-derived keys
    // ---------------------------------------------------------------------------------------------

    /// [`set_value`](Self::set_value) under [`RegistryKey::of::<T>()`](RegistryKey::of).
    pub fn set_typed<T: Send + Sync + 'static>(&self, value: Arc<T>, mode: Mode<'_>) {
        self.set_value(RegistryKey::of::<T>(), value, mode);
    }

    pub fn get_typed<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get_value(RegistryKey::of::<T>())
    }

    pub fn remove_typed<T: Send + Sync + 'static>(&self) -> bool {
        self.remove_value(RegistryKey::of::<T>())
    }

    // ---------------------------------------------------------------------------------------------
    // Host teardown
    // ---------------------------------------------------------------------------------------------

    /// Callback queued on a host pool for the entry `(key, stamp)`.
    ///
    /// Holds the registry weakly; does nothing once the registry is gone.
    fn removal_callback(&self, key: RegistryKey, stamp: u64) -> impl FnOnce() + Send + 'static {
        let inner = Arc::downgrade(&self.inner);
        move || {
            if let Some(inner) = inner.upgrade() {
                Registry { inner }.release_entry(key, stamp);
            }
        }
    }

    /// Removes `key` only if it still holds the entry stamped `stamp`.
    fn release_entry(&self, key: RegistryKey, stamp: u64) {
        let released = {
            let mut table = self.inner.table.lock();
            match table.entries.get(&key) {
                Some(entry) if entry.stamp == stamp => table.entries.remove(&key),
                _ => None,
            }
        };

        let Some(entry) = released else {
            return;
        };

        tracing::debug!(key = %key, "host destroyed; bound entry released");
        self.emit_event(&RegistryEvent::Release { key });
        drop(entry);
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.inner.table.lock().entries.len())
            .finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Process-wide registry
// -------------------------------------------------------------------------------------------------

static SHARED: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-wide registry used by the free functions of this crate.
pub fn shared() -> &'static Registry {
    &SHARED
}

/// Stores `value` under `key` in the process-wide registry.
///
/// ```
/// use std::sync::Arc;
/// use value_keeper::{get_value, set_value, Mode};
///
/// set_value("greeting", Arc::new("Hello".to_string()), Mode::Strong);
/// let greeting: Arc<String> = get_value("greeting").unwrap();
/// assert_eq!(&*greeting, "Hello");
/// ```
pub fn set_value<T: Send + Sync + 'static>(key: impl Into<RegistryKey>, value: Arc<T>, mode: Mode<'_>) {
    SHARED.set_value(key, value, mode);
}

/// Stores `value` strongly under `key` in the process-wide registry.
pub fn register<T: Send + Sync + 'static>(key: impl Into<RegistryKey>, value: T) {
    SHARED.register(key, value);
}

/// Looks up `key` in the process-wide registry.
pub fn get_value<T: Send + Sync + 'static>(key: impl Into<RegistryKey>) -> Option<Arc<T>> {
    SHARED.get_value(key)
}

pub fn get_cloned<T: Send + Sync + Clone + 'static>(key: impl Into<RegistryKey>) -> Option<T> {
    SHARED.get_cloned(key)
}

/// Removes `key` from the process-wide registry.
pub fn remove_value(key: impl Into<RegistryKey>) -> bool {
    SHARED.remove_value(key)
}

pub fn contains(key: impl Into<RegistryKey>) -> bool {
    SHARED.contains(key)
}

/// Sets a tracing callback on the process-wide registry.
///
/// # Example
/// ```rust
/// use value_keeper::{clear_trace_callback, set_trace_callback};
///
/// set_trace_callback(|event| println!("[registry-trace] {event}"));
/// clear_trace_callback();
/// ```
pub fn set_trace_callback(callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
    SHARED.set_trace_callback(callback);
}

pub fn clear_trace_callback() {
    SHARED.clear_trace_callback();
}

#[doc(hidden)]
pub fn clear() {
    SHARED.clear();
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
