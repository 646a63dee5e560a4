// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory override map.
//!
//! A `PropertyMap` is the ad-hoc property source locators search next to the
//! configuration manager. It is also the overlay handed to per-call override
//! loads.

use crate::domain::{DomainName, DomainSnapshot, Result, Value};
use crate::ports::PropertySource;
use dashmap::DashMap;

/// A concurrent `(domain, name) -> value` map.
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::PropertyMap;
/// use modwire::ports::PropertySource;
///
/// let overrides = PropertyMap::new().with("app", "port", 8080);
/// let port = overrides.get_str("app", "port").unwrap().unwrap();
/// assert_eq!(port.get::<i32>(), Some(8080));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PropertyMap {
    entries: DashMap<(DomainName, String), Value>,
}

impl PropertyMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder style.
    pub fn with(
        self,
        domain: impl Into<DomainName>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.insert(domain, name, value);
        self
    }

    /// Adds or replaces an entry, returning the previous value.
    pub fn insert(
        &self,
        domain: impl Into<DomainName>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.entries
            .insert((domain.into(), name.into()), value.into())
    }

    /// Removes an entry, returning its value.
    pub fn remove(&self, domain: &DomainName, name: &str) -> Option<Value> {
        self.entries
            .remove(&(domain.clone(), name.to_string()))
            .map(|(_, v)| v)
    }

    /// Looks up an entry.
    pub fn get(&self, domain: &DomainName, name: &str) -> Option<Value> {
        self.entries
            .get(&(domain.clone(), name.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Rebuilds a map from an exported snapshot. Every value is a string.
    pub fn from_snapshot(snapshot: &DomainSnapshot) -> Self {
        let map = Self::new();
        for (domain, name, value) in snapshot.iter() {
            map.insert(domain.clone(), name, value);
        }
        map
    }

    /// Exports the entries that have a textual form.
    pub fn snapshot(&self) -> DomainSnapshot {
        let mut snapshot = DomainSnapshot::default();
        for entry in self.entries.iter() {
            let (domain, name) = entry.key();
            if let Some(text) = entry.value().as_text() {
                snapshot.insert(domain.clone(), name.clone(), text);
            }
        }
        snapshot
    }
}

impl PropertySource for PropertyMap {
    fn name(&self) -> &str {
        "property-map"
    }

    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        Ok(self.get(domain, name))
    }

    fn set_property(
        &self,
        domain: &DomainName,
        name: &str,
        value: Option<Value>,
    ) -> Result<Option<Value>> {
        Ok(match value {
            Some(v) => self.insert(domain.clone(), name, v),
            None => self.remove(domain, name),
        })
    }

    fn domains(&self) -> Vec<DomainName> {
        let mut domains: Vec<DomainName> =
            self.entries.iter().map(|e| e.key().0.clone()).collect();
        domains.sort();
        domains.dedup();
        domains
    }
}
