use std::fmt;

use crate::RegistryKey;

/// Events emitted by a registry during operations.
///
/// These events are passed to the tracing callback set via
/// [`Registry::set_trace_callback`](crate::Registry::set_trace_callback).
///
/// # Examples
///
/// ```rust
/// use value_keeper::RegistryEvent;
///
/// let event = RegistryEvent::Get { key: "config".into(), found: true };
/// assert_eq!(event.to_string(), "get { key: config, found: true }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A value was stored.
    Set {
        key: RegistryKey,
        /// `strong`, `weak` or `host`.
        mode: &'static str,
    },

    /// A value was requested.
    Get { key: RegistryKey, found: bool },

    /// A key existence check was performed.
    Contains { key: RegistryKey, found: bool },

    /// An explicit removal was requested.
    Remove { key: RegistryKey, found: bool },

    /// Compaction purged dead weak entries.
    Compact { purged: usize },

    /// A host was destroyed and its bound entry removed.
    Release { key: RegistryKey },

    /// The registry was cleared.
    Clear,
}

/// Callback receiving every [`RegistryEvent`] of one registry.
///
/// Never invoked while the registry's table lock is held, so it may call back
/// into the registry.
pub type TraceCallback = dyn Fn(&RegistryEvent) + Send + Sync + 'static;

impl fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEvent::Set { key, mode } => {
                write!(f, "set {{ key: {key}, mode: {mode} }}")
            }
            RegistryEvent::Get { key, found } => {
                write!(f, "get {{ key: {key}, found: {found} }}")
            }
            RegistryEvent::Contains { key, found } => {
                write!(f, "contains {{ key: {key}, found: {found} }}")
            }
            RegistryEvent::Remove { key, found } => {
                write!(f, "remove {{ key: {key}, found: {found} }}")
            }
            RegistryEvent::Compact { purged } => write!(f, "compact {{ purged: {purged} }}"),
            RegistryEvent::Release { key } => write!(f, "release {{ key: {key} }}"),
            RegistryEvent::Clear => write!(f, "Clearing the Registry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_event_display() {
        let event = RegistryEvent::Set {
            key: "db".into(),
            mode: "weak",
        };
        assert_eq!(event.to_string(), "set { key: db, mode: weak }");

        let event = RegistryEvent::Remove {
            key: "db".into(),
            found: false,
        };
        assert_eq!(event.to_string(), "remove { key: db, found: false }");

        let event = RegistryEvent::Contains {
            key: "u8".into(),
            found: true,
        };
        assert_eq!(event.to_string(), "contains { key: u8, found: true }");

        assert_eq!(
            RegistryEvent::Compact { purged: 3 }.to_string(),
            "compact { purged: 3 }"
        );
        assert_eq!(
            RegistryEvent::Release { key: "v".into() }.to_string(),
            "release { key: v }"
        );
        assert_eq!(RegistryEvent::Clear.to_string(), "Clearing the Registry");
    }

    #[test]
    fn test_registry_event_clone() {
        let event = RegistryEvent::Get {
            key: "i32".into(),
            found: true,
        };
        assert_eq!(event.clone(), event);
    }
}
