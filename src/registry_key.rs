//! Keys identifying registry entries.
//!
//! The registry treats keys as opaque. Two helpers derive keys without the
//! caller spelling them out: [`RegistryKey::of`] names a type, and
//! [`RegistryKey::instance_of`] names one particular object by address.

use std::borrow::Cow;
use std::fmt;

/// Opaque key for one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryKey {
    /// A named key, usually a string literal or a type path.
    Name(Cow<'static, str>),
    /// The identity of a live object (its address).
    Instance(usize),
}

impl RegistryKey {
    /// Default key for values of type `T`: its full type path.
    ///
    /// ```rust
    /// use value_keeper::RegistryKey;
    ///
    /// assert_eq!(RegistryKey::of::<String>().to_string(), "alloc::string::String");
    /// ```
    pub fn of<T: ?Sized>() -> Self {
        RegistryKey::Name(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// Identity key for `value`.
    ///
    /// Only unique while `value` is alive; an address may be reused after the
    /// object is freed.
    pub fn instance_of<T: ?Sized>(value: &T) -> Self {
        RegistryKey::Instance(value as *const T as *const () as usize)
    }
}

impl From<&'static str> for RegistryKey {
    fn from(name: &'static str) -> Self {
        RegistryKey::Name(Cow::Borrowed(name))
    }
}

impl From<String> for RegistryKey {
    fn from(name: String) -> Self {
        RegistryKey::Name(Cow::Owned(name))
    }
}

impl From<&RegistryKey> for RegistryKey {
    fn from(key: &RegistryKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKey::Name(name) => f.write_str(name),
            RegistryKey::Instance(addr) => write!(f, "instance@{addr:#x}"),
        }
    }
}
