// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serializable export of textual properties.

use crate::domain::domain_name::DomainName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every textual property of a set of domains, sorted by domain and name.
///
/// Values without a textual form (provider instances, built modules) are not
/// part of a snapshot.
///
/// # Examples
///
/// ```
/// use modwire::domain::DomainSnapshot;
///
/// let mut snapshot = DomainSnapshot::default();
/// snapshot.insert("app", "port", "8080");
/// assert_eq!(snapshot.get(&"app".into(), "port"), Some("8080"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSnapshot {
    domains: BTreeMap<DomainName, BTreeMap<String, String>>,
}

impl DomainSnapshot {
    /// Records one property.
    pub fn insert(
        &mut self,
        domain: impl Into<DomainName>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.domains
            .entry(domain.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Looks up one property.
    pub fn get(&self, domain: &DomainName, name: &str) -> Option<&str> {
        self.domains
            .get(domain)
            .and_then(|props| props.get(name))
            .map(String::as_str)
    }

    /// Iterates `(domain, name, value)` triples in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&DomainName, &str, &str)> {
        self.domains.iter().flat_map(|(domain, props)| {
            props
                .iter()
                .map(move |(name, value)| (domain, name.as_str(), value.as_str()))
        })
    }

    /// Number of properties across all domains.
    pub fn len(&self) -> usize {
        self.domains.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` when the snapshot holds no properties.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
