// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property source trait definition.
//!
//! This module defines the `PropertySource` trait, the port through which the
//! engine reads and writes `(domain, name) -> value` properties. The
//! configuration manager, in-memory override maps and module contexts all
//! present this interface.

use crate::domain::{DomainName, Result, Value};

/// A readable and writable store of properties grouped by domain.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; writes go through `&self`, so
/// implementations use interior mutability.
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::PropertyMap;
/// use modwire::domain::{DomainName, Value};
/// use modwire::ports::PropertySource;
///
/// let map = PropertyMap::new();
/// map.set_property(&DomainName::from("app"), "port", Some(Value::from(8080))).unwrap();
///
/// let value = map.get_str("app", "port").unwrap().unwrap();
/// assert_eq!(value.get::<i32>(), Some(8080));
/// ```
pub trait PropertySource: Send + Sync {
    /// Returns the name of this source, used in logs and error messages.
    fn name(&self) -> &str;

    /// Retrieves the value of `name` in `domain`.
    ///
    /// * `Ok(Some(Value))` - The property exists
    /// * `Ok(None)` - The property does not exist in this source
    /// * `Err(ModuleError)` - The source failed
    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>>;

    /// Stores `value` under `name` in `domain`, returning the previous value.
    ///
    /// Passing `None` removes the mapping.
    fn set_property(
        &self,
        domain: &DomainName,
        name: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>>;

    /// Lists the domains currently held by this source.
    fn domains(&self) -> Vec<DomainName>;

    /// Retrieves a property by string domain name.
    ///
    /// This is a convenience method equivalent to
    /// `get_property(&DomainName::from(domain), name)`.
    fn get_str(&self, domain: &str, name: &str) -> Result<Option<Value>> {
        self.get_property(&DomainName::from(domain), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    // Test implementation of PropertySource for testing purposes
    struct TestSource {
        values: RwLock<HashMap<(DomainName, String), Value>>,
    }

    impl TestSource {
        fn new() -> Self {
            Self {
                values: RwLock::new(HashMap::new()),
            }
        }
    }

    impl PropertySource for TestSource {
        fn name(&self) -> &str {
            "test-source"
        }

        fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
            Ok(self
                .values
                .read()
                .unwrap()
                .get(&(domain.clone(), name.to_string()))
                .cloned())
        }

        fn set_property(
            &self,
            domain: &DomainName,
            name: &str,
            value: Option<Value>,
        ) -> Result<Option<Value>> {
            let mut values = self.values.write().unwrap();
            let key = (domain.clone(), name.to_string());
            Ok(match value {
                Some(v) => values.insert(key, v),
                None => values.remove(&key),
            })
        }

        fn domains(&self) -> Vec<DomainName> {
            self.values
                .read()
                .unwrap()
                .keys()
                .map(|(d, _)| d.clone())
                .collect()
        }
    }

    #[test]
    fn test_property_source_get_missing() {
        let source = TestSource::new();
        assert!(source.get_str("app", "port").unwrap().is_none());
    }

    #[test]
    fn test_property_source_set_then_get() {
        let source = TestSource::new();
        let domain = DomainName::from("app");
        source.set_property(&domain, "port", Some(Value::from(1))).unwrap();
        assert_eq!(source.get_str("app", "port").unwrap(), Some(Value::from(1)));
        assert_eq!(source.domains(), vec![domain]);
    }

    #[test]
    fn test_property_source_set_none_removes() {
        let source = TestSource::new();
        let domain = DomainName::from("app");
        source.set_property(&domain, "port", Some(Value::from(1))).unwrap();
        let previous = source.set_property(&domain, "port", None).unwrap();
        assert_eq!(previous, Some(Value::from(1)));
        assert!(source.get_property(&domain, "port").unwrap().is_none());
    }

    #[test]
    fn test_property_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn PropertySource>>();
    }
}
