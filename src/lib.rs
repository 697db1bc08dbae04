//! # Value Keeper
//!
//! A process-wide registry that lets unrelated parts of a program share
//! instances by key, with a choice of lifetime for every entry:
//!
//! - **Strong**: the registry keeps the value alive until it is replaced or removed.
//! - **Weak**: the registry only observes the value; it disappears with its last owner.
//! - **Host**: the value lives until an unrelated host object is destroyed.
//!
//! Hosts announce their destruction through a [`ReleasePool`], a list of
//! callbacks fired exactly once when the pool (and thus its host) is dropped.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use value_keeper::{get_value, set_value, Mode, ReleaseHost, ReleasePool};
//!
//! struct Screen {
//!     pool: ReleasePool,
//! }
//!
//! impl ReleaseHost for Screen {
//!     fn release_pool(&self) -> &ReleasePool {
//!         &self.pool
//!     }
//! }
//!
//! let screen = Screen { pool: ReleasePool::new() };
//! set_value("presenter", Arc::new("presenter".to_string()), Mode::Host(&screen));
//! assert!(get_value::<String>("presenter").is_some());
//!
//! drop(screen);
//! assert!(get_value::<String>("presenter").is_none());
//! ```
//!
//! ## Main Functions
//!
//! - [`set_value`] / [`register`] - Store a value in the process-wide registry
//! - [`get_value`] / [`get_cloned`] - Retrieve a value by key
//! - [`remove_value`] - Remove an entry
//! - [`contains`] - Check whether a key holds a live value
//! - [`set_trace_callback`] - Observe registry operations
//! - [`Registry::new`] and [`define_registry!`] - Isolated registries

mod attached;
mod keeping;
mod macros;
mod registry;
mod registry_error;
mod registry_event;
mod registry_key;
mod release_pool;

pub use attached::{AttachedData, DataAttachable};
pub use keeping::{
    global, global_value, InstanceKeepable, LiveTogether, ObjectKeeping, ValueKeepable,
};
pub use registry::{
    clear, clear_trace_callback, contains, get_cloned, get_value, register, remove_value,
    set_trace_callback, set_value, shared, Mode, Registry,
};
pub use registry_error::{CallbackFailure, RegistryError, ReleaseError};
pub use registry_event::{RegistryEvent, TraceCallback};
pub use registry_key::RegistryKey;
pub use release_pool::{ReleaseCallback, ReleaseHost, ReleasePool};
