//! Destruction notification for arbitrary host objects.
//!
//! A [`ReleasePool`] is a list of callbacks that fire exactly once, in
//! registration order, when the pool is dropped. A host embeds one and shares
//! its lifetime, so anything holding `&host` can ask to be told when the host
//! goes away without either side keeping the other alive.
//!
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use value_keeper::{ReleaseHost, ReleasePool};
//!
//! struct Session {
//!     pool: ReleasePool,
//! }
//!
//! impl ReleaseHost for Session {
//!     fn release_pool(&self) -> &ReleasePool {
//!         &self.pool
//!     }
//! }
//!
//! let closed = Arc::new(AtomicBool::new(false));
//! let session = Session { pool: ReleasePool::new() };
//!
//! let flag = closed.clone();
//! session.release_pool().on_release(move || flag.store(true, Ordering::SeqCst));
//!
//! drop(session);
//! assert!(closed.load(Ordering::SeqCst));
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;

use crate::{CallbackFailure, ReleaseError};

/// A callback queued on a [`ReleasePool`].
pub type ReleaseCallback = Box<dyn FnOnce() + Send + 'static>;

/// Callbacks fired once when the owning host is destroyed.
///
/// Creating a pool does not allocate; storage is reserved on the first
/// [`on_release`](ReleasePool::on_release).
pub struct ReleasePool {
    callbacks: Mutex<Vec<ReleaseCallback>>,
}

impl ReleasePool {
    pub const fn new() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Queues `callback` to run when the pool is released.
    ///
    /// Callbacks run in the order they were added. There is no way to
    /// unregister one; a callback that may become obsolete should check its
    /// own guard condition when it runs.
    pub fn on_release(&self, callback: impl FnOnce() + Send + 'static) {
        self.callbacks.lock().push(Box::new(callback));
    }

    /// Number of callbacks waiting to fire.
    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.lock().is_empty()
    }

    /// Fires every callback now and reports the ones that panicked.
    ///
    /// Equivalent to dropping the pool, except that failures are returned
    /// to the caller instead of being logged.
    pub fn release(mut self) -> Result<(), ReleaseError> {
        let callbacks = std::mem::take(self.callbacks.get_mut());
        fire(callbacks)
    }
}

impl Default for ReleasePool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ReleasePool {
    fn drop(&mut self) {
        let callbacks = std::mem::take(self.callbacks.get_mut());
        if callbacks.is_empty() {
            return;
        }

        if let Err(err) = fire(callbacks) {
            for failure in &err.failures {
                tracing::error!(
                    index = failure.index,
                    message = %failure.message,
                    "release callback panicked; continued with remaining callbacks",
                );
            }
        }
    }
}

impl fmt::Debug for ReleasePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleasePool")
            .field("pending", &self.len())
            .finish()
    }
}

/// Runs all callbacks in order; a panicking callback never stops the rest.
fn fire(callbacks: Vec<ReleaseCallback>) -> Result<(), ReleaseError> {
    let mut failures = Vec::new();

    for (index, callback) in callbacks.into_iter().enumerate() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
            failures.push(CallbackFailure {
                index,
                message: panic_message(payload.as_ref()),
            });
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ReleaseError { failures })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// An object that announces its own destruction through a [`ReleasePool`].
///
/// Implementors own the pool (typically as a plain field) so that it is
/// dropped together with them.
pub trait ReleaseHost {
    fn release_pool(&self) -> &ReleasePool;
}

impl ReleaseHost for ReleasePool {
    fn release_pool(&self) -> &ReleasePool {
        self
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> ReleaseCallback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |n: u32| {
            let sink = sink.clone();
            Box::new(move || sink.lock().push(n)) as ReleaseCallback
        };
        (log, make)
    }

    #[test]
    fn test_new_pool_is_empty() {
        let pool = ReleasePool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_drop_fires_in_registration_order() {
        let (log, make) = recorder();
        let pool = ReleasePool::new();
        pool.on_release(make(1));
        pool.on_release(make(2));
        pool.on_release(make(3));
        assert_eq!(pool.len(), 3);

        assert!(log.lock().is_empty());
        drop(pool);
        assert_eq!(*log.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_callbacks_fire_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let pool = ReleasePool::new();
        for _ in 0..4 {
            let count = count.clone();
            pool.on_release(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert!(pool.release().is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_panicking_callback_does_not_skip_others() {
        let (log, make) = recorder();
        let pool = ReleasePool::new();
        pool.on_release(|| panic!("first callback failed"));
        pool.on_release(make(2));
        pool.on_release(make(3));

        let err = pool.release().unwrap_err();
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].index, 0);
        assert_eq!(err.failures[0].message, "first callback failed");
        assert_eq!(*log.lock(), vec![2, 3]);
    }

    #[test]
    fn test_panicking_callback_on_drop_is_contained() {
        let (log, make) = recorder();
        let pool = ReleasePool::new();
        pool.on_release(make(1));
        pool.on_release(|| panic!("{}", String::from("formatted failure")));
        pool.on_release(make(3));

        drop(pool);
        assert_eq!(*log.lock(), vec![1, 3]);
    }

    #[test]
    fn test_host_drop_fires_pool() {
        struct Host {
            pool: ReleasePool,
        }

        impl ReleaseHost for Host {
            fn release_pool(&self) -> &ReleasePool {
                &self.pool
            }
        }

        let (log, make) = recorder();
        let host = Host {
            pool: ReleasePool::default(),
        };
        host.release_pool().on_release(make(7));

        drop(host);
        assert_eq!(*log.lock(), vec![7]);
    }

    #[test]
    fn test_debug_shows_pending_count() {
        let pool = ReleasePool::new();
        pool.on_release(|| {});
        assert_eq!(format!("{pool:?}"), "ReleasePool { pending: 1 }");
    }
}
