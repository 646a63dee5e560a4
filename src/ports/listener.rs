// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property change notification.
//!
//! Listeners registered with the configuration manager are told about every
//! value-to-value transition whose old and new values are not equal.

use crate::domain::{DomainName, Value};
use std::sync::Arc;

/// A single property transition.
#[derive(Clone, Debug)]
pub struct PropertyChange {
    /// The domain holding the property
    pub domain: DomainName,
    /// The property name
    pub name: String,
    /// The value before the write, if any
    pub old: Option<Value>,
    /// The value after the write, if any
    pub new: Option<Value>,
}

impl PropertyChange {
    /// Returns `true` if the transition is a real change.
    ///
    /// Two absent values are equal; otherwise [`Value`] equality applies.
    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

/// Type alias for change notification callbacks.
///
/// Callbacks run synchronously on the writing thread and should not block.
///
/// # Examples
///
/// ```rust
/// use modwire::ports::{ChangeCallback, PropertyChange};
/// use std::sync::Arc;
///
/// let callback: ChangeCallback = Arc::new(|change: &PropertyChange| {
///     println!("{}.{} changed", change.domain, change.name);
/// });
/// ```
pub type ChangeCallback = Arc<dyn Fn(&PropertyChange) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn change(old: Option<Value>, new: Option<Value>) -> PropertyChange {
        PropertyChange {
            domain: DomainName::from("app"),
            name: "port".to_string(),
            old,
            new,
        }
    }

    #[test]
    fn test_absent_to_absent_is_not_a_change() {
        assert!(!change(None, None).is_change());
    }

    #[test]
    fn test_equal_values_are_not_a_change() {
        assert!(!change(Some(Value::from(1)), Some(Value::from(1))).is_change());
    }

    #[test]
    fn test_transitions_are_changes() {
        assert!(change(None, Some(Value::from(1))).is_change());
        assert!(change(Some(Value::from(1)), None).is_change());
        assert!(change(Some(Value::from(1)), Some(Value::from(2))).is_change());
    }

    #[test]
    fn test_callback_invocation() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let callback: ChangeCallback = Arc::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        callback(&change(None, Some(Value::from(1))));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
