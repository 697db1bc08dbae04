use thiserror::Error;

use crate::RegistryKey;

/// Why a typed lookup produced no value.
///
/// Only returned by [`Registry::try_get_value`](crate::Registry::try_get_value);
/// the plain read path reports all of these as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("No value registered for key: {key}")]
    NotFound { key: RegistryKey },

    #[error("Weakly held value for key {key} has been dropped")]
    Expired { key: RegistryKey },

    #[error("Value for key {key} is not of type {expected}")]
    TypeMismatch {
        key: RegistryKey,
        expected: &'static str,
    },
}

/// A release callback that panicked while its pool was torn down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("release callback #{index} panicked: {message}")]
pub struct CallbackFailure {
    /// Position of the callback in registration order.
    pub index: usize,
    pub message: String,
}

/// Failures collected while firing a [`ReleasePool`](crate::ReleasePool).
///
/// Every callback has already run by the time this is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} release callback(s) failed", failures.len())]
pub struct ReleaseError {
    pub failures: Vec<CallbackFailure>,
}
