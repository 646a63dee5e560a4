// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static default-property tables.

use crate::domain::domain_name::DomainName;
use crate::domain::metadata::ModuleMetadata;
use crate::domain::value::Value;
use std::collections::HashMap;

/// The default properties declared by a module type, keyed by `(domain, name)`.
///
/// Used by parameter resolution when neither the live configuration nor an
/// override supplies a value.
///
/// # Examples
///
/// ```
/// use modwire::domain::{DefaultProperties, ModuleMetadata, PropertyDecl};
///
/// let metadata = ModuleMetadata {
///     provider: None,
///     defaults: vec![PropertyDecl::new("app", "port", "8080")],
/// };
/// let table = DefaultProperties::from_metadata(&metadata);
/// assert_eq!(table.get(&"app".into(), "port").unwrap().as_text(), Some("8080"));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefaultProperties {
    entries: HashMap<(DomainName, String), Value>,
}

impl DefaultProperties {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from a type's declared default entries.
    ///
    /// A later entry for the same `(domain, name)` replaces an earlier one.
    pub fn from_metadata(metadata: &ModuleMetadata) -> Self {
        let entries = metadata
            .defaults
            .iter()
            .map(|decl| {
                (
                    (decl.domain.clone(), decl.name.clone()),
                    Value::from(decl.default.clone()),
                )
            })
            .collect();
        Self { entries }
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, domain: impl Into<DomainName>, name: impl Into<String>, value: Value) {
        self.entries.insert((domain.into(), name.into()), value);
    }

    /// Looks up an entry.
    pub fn get(&self, domain: &DomainName, name: &str) -> Option<&Value> {
        self.entries.get(&(domain.clone(), name.to_string()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no defaults were declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
