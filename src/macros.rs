//! Macros for creating named, isolated registries.

/// Creates a module holding its own static [`Registry`](crate::Registry).
///
/// The module exposes free functions mirroring the registry's operations,
/// plus `registry()` for anything that wants the handle itself (for example
/// a [`ValueKeepable::keeper`](crate::ValueKeepable::keeper) override).
///
/// # Examples
///
/// ```rust
/// use value_keeper::{define_registry, Mode};
/// use std::sync::Arc;
///
/// define_registry!(services);
///
/// services::register("db", "postgresql://localhost".to_string());
/// let db: Arc<String> = services::get_value("db").unwrap();
/// assert_eq!(&*db, "postgresql://localhost");
///
/// let cache = Arc::new(64u32);
/// services::set_value("cache", cache.clone(), Mode::Weak);
/// drop(cache);
/// assert!(!services::contains("cache"));
/// ```
///
/// # Multiple Registries
///
/// Each invocation is completely isolated:
///
/// ```rust
/// use value_keeper::define_registry;
///
/// define_registry!(database);
/// define_registry!(cache);
///
/// database::register("url", "db_connection".to_string());
/// assert!(database::contains("url"));
/// assert!(!cache::contains("url"));
/// ```
#[macro_export]
macro_rules! define_registry {
    ($name:ident) => {
        pub mod $name {
            use std::sync::{Arc, LazyLock};

            static REGISTRY: LazyLock<$crate::Registry> = LazyLock::new($crate::Registry::new);

            /// The registry handle behind this module.
            pub fn registry() -> &'static $crate::Registry {
                &REGISTRY
            }

            /// Store a value under `key` with the given mode.
            pub fn set_value<T: Send + Sync + 'static>(
                key: impl Into<$crate::RegistryKey>,
                value: Arc<T>,
                mode: $crate::Mode<'_>,
            ) {
                REGISTRY.set_value(key, value, mode)
            }

            /// Store a value strongly under `key`.
            pub fn register<T: Send + Sync + 'static>(key: impl Into<$crate::RegistryKey>, value: T) {
                REGISTRY.register(key, value)
            }

            /// Retrieve a value from the registry.
            pub fn get_value<T: Send + Sync + 'static>(
                key: impl Into<$crate::RegistryKey>,
            ) -> Option<Arc<T>> {
                REGISTRY.get_value(key)
            }

            /// Retrieve a cloned value from the registry.
            pub fn get_cloned<T: Send + Sync + Clone + 'static>(
                key: impl Into<$crate::RegistryKey>,
            ) -> Option<T> {
                REGISTRY.get_cloned(key)
            }

            /// Remove the entry for `key`, if any.
            pub fn remove_value(key: impl Into<$crate::RegistryKey>) -> bool {
                REGISTRY.remove_value(key)
            }

            /// Check if a live value is stored under `key`.
            pub fn contains(key: impl Into<$crate::RegistryKey>) -> bool {
                REGISTRY.contains(key)
            }

            /// Set a tracing callback for registry operations.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::RegistryEvent) + Send + Sync + 'static,
            ) {
                REGISTRY.set_trace_callback(callback)
            }

            /// Clear the tracing callback.
            pub fn clear_trace_callback() {
                REGISTRY.clear_trace_callback()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::Mode;
    use std::sync::Arc;

    #[test]
    fn test_define_registry_macro() {
        define_registry!(test_reg);

        test_reg::register("answer", 100i32);
        let value: Arc<i32> = test_reg::get_value("answer").unwrap();
        assert_eq!(*value, 100);
        assert_eq!(test_reg::get_cloned::<i32>("answer"), Some(100));

        assert!(test_reg::contains("answer"));
        assert!(test_reg::remove_value("answer"));
        assert!(!test_reg::contains("answer"));
    }

    #[test]
    fn test_multiple_registries() {
        define_registry!(reg_a);
        define_registry!(reg_b);

        reg_a::set_value("n", Arc::new(1i32), Mode::Strong);
        reg_b::set_value("n", Arc::new(2i32), Mode::Strong);

        assert_eq!(reg_a::get_cloned::<i32>("n"), Some(1));
        assert_eq!(reg_b::get_cloned::<i32>("n"), Some(2));
        assert_eq!(reg_a::registry().len(), 1);
    }

    #[test]
    fn test_tracing() {
        define_registry!(trace_test);

        use parking_lot::Mutex;
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();

        trace_test::set_trace_callback(move |event| {
            events_clone.lock().push(format!("{}", event));
        });

        trace_test::register("k", 42i32);
        let _: Option<Arc<i32>> = trace_test::get_value("k");
        let _ = trace_test::contains("k");
        trace_test::clear_trace_callback();

        let recorded = events.lock();
        assert_eq!(recorded.len(), 3);
        assert!(recorded[0].contains("set"));
        assert!(recorded[1].contains("get"));
        assert!(recorded[2].contains("contains"));
    }
}
