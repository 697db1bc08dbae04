//! Integration tests for the kinds of values a registry can hold:
//! primitives, strings, trait objects, function pointers and closures.
//!
//! NOTE: All tests use #[serial] because they share the same registry (values).
//! Running them in parallel could cause interference.

use serial_test::serial;
use std::sync::Arc;
use value_keeper::{define_registry, Mode, Registry, RegistryError, RegistryKey};

define_registry!(values);

trait Logger: Send + Sync {
    fn name(&self) -> &str;
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn name(&self) -> &str {
        "ConsoleLogger"
    }
}

#[test]
#[serial]
fn test_primitives_and_strings() {
    values::register("int", 42i32);
    values::register("text", "hello".to_string());
    values::register("tuple", (1u8, "one"));

    assert_eq!(values::get_cloned::<i32>("int"), Some(42));
    assert_eq!(values::get_cloned::<String>("text").as_deref(), Some("hello"));
    assert_eq!(values::get_cloned::<(u8, &str)>("tuple"), Some((1, "one")));
}

#[test]
#[serial]
fn test_trait_object() {
    // Trait objects go in behind an extra Arc, as the registry stores `Arc<T>`.
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger);
    values::register("logger", logger);

    let logger: Arc<dyn Logger> = values::get_cloned("logger").unwrap();
    assert_eq!(logger.name(), "ConsoleLogger");
}

#[test]
#[serial]
fn test_weak_trait_object() {
    let logger: Arc<Arc<dyn Logger>> = Arc::new(Arc::new(ConsoleLogger));
    values::set_value("weak_logger", logger.clone(), Mode::Weak);

    let found: Arc<Arc<dyn Logger>> = values::get_value("weak_logger").unwrap();
    assert_eq!(found.name(), "ConsoleLogger");

    drop(found);
    drop(logger);
    assert!(values::get_value::<Arc<dyn Logger>>("weak_logger").is_none());
}

#[test]
#[serial]
fn test_function_pointer_and_closure() {
    let multiply_by_two: fn(i32) -> i32 = |x| x * 2;
    values::register("double", multiply_by_two);

    let multiplier = 3;
    let triple: Box<dyn Fn(i32) -> i32 + Send + Sync> = Box::new(move |x| x * multiplier);
    values::register("triple", triple);

    let double: Arc<fn(i32) -> i32> = values::get_value("double").unwrap();
    assert_eq!(double(21), 42);

    let triple: Arc<Box<dyn Fn(i32) -> i32 + Send + Sync>> = values::get_value("triple").unwrap();
    assert_eq!(triple(14), 42);
}

#[test]
fn test_type_mismatch_is_absent() {
    let registry = Registry::new();
    registry.register("n", 7u64);

    assert!(registry.get_value::<u32>("n").is_none());
    assert!(matches!(
        registry.try_get_value::<u32>("n"),
        Err(RegistryError::TypeMismatch { expected: "u32", .. })
    ));
    assert_eq!(registry.get_cloned::<u64>("n"), Some(7));
}

#[test]
fn test_instance_and_named_keys_do_not_collide() {
    let registry = Registry::new();
    let object = Arc::new(5u8);
    let identity = RegistryKey::instance_of(&*object);

    registry.set_value(identity.clone(), object.clone(), Mode::Strong);
    registry.register(identity.to_string(), "by name");

    assert_eq!(registry.get_cloned::<u8>(identity.clone()), Some(5));
    assert_eq!(
        registry.get_cloned::<&str>(identity.to_string()),
        Some("by name")
    );
    assert_eq!(registry.len(), 2);
}
