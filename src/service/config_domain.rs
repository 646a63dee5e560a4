// SPDX-License-Identifier: MIT OR Apache-2.0

//! A named, thread-safe bag of properties.

use crate::domain::{DomainName, Value};
use dashmap::DashMap;
use std::collections::HashMap;

/// The properties of one domain.
///
/// Property names are unique within a domain; storing `None` removes the
/// mapping. Reads and writes may happen concurrently from any thread.
///
/// # Examples
///
/// ```rust
/// use modwire::domain::Value;
/// use modwire::service::ConfigDomain;
///
/// let domain = ConfigDomain::new("app");
/// domain.set("port", Some(Value::from(8080)));
/// assert_eq!(domain.get("port"), Some(Value::from(8080)));
///
/// domain.set("port", None);
/// assert!(domain.get("port").is_none());
/// ```
#[derive(Debug)]
pub struct ConfigDomain {
    name: DomainName,
    properties: DashMap<String, Value>,
}

impl ConfigDomain {
    /// Creates an empty domain.
    pub fn new(name: impl Into<DomainName>) -> Self {
        Self {
            name: name.into(),
            properties: DashMap::new(),
        }
    }

    /// Creates a domain holding string properties, as read from a property file.
    pub fn from_strings(name: impl Into<DomainName>, properties: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
        }
    }

    /// The domain name.
    pub fn name(&self) -> &DomainName {
        &self.name
    }

    /// Looks up a property.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.properties.get(name).map(|v| v.value().clone())
    }

    /// Stores or removes a property, returning the previous value.
    pub fn set(&self, name: impl Into<String>, value: Option<Value>) -> Option<Value> {
        let name = name.into();
        match value {
            Some(v) => self.properties.insert(name, v),
            None => self.properties.remove(&name).map(|(_, v)| v),
        }
    }

    /// Returns `true` if the property exists.
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Property names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.properties.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` when the domain holds no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.properties
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}
