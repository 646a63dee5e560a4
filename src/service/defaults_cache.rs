// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-type cache of static default-property tables.

use super::registry::ModuleRegistry;
use crate::domain::{DefaultProperties, ModuleType};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::trace;

/// Caches each module type's [`DefaultProperties`] after first computation.
///
/// Lookups use an "if absent, compute and insert" pattern without a guarding
/// lock. Two threads may both compute a table for the same type; the first
/// insert wins and the tables are identical anyway.
#[derive(Debug, Default)]
pub struct DefaultsCache {
    tables: DashMap<TypeId, Arc<DefaultProperties>>,
}

impl DefaultsCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table of `module`, computing it from the registered
    /// descriptor on first use. Unregistered types have an empty table.
    pub fn get_or_compute(
        &self,
        registry: &ModuleRegistry,
        module: &ModuleType,
    ) -> Arc<DefaultProperties> {
        if let Some(table) = self.tables.get(&module.id()) {
            trace!("Defaults cache hit for {}", module);
            return Arc::clone(table.value());
        }
        let table = Arc::new(
            registry
                .get(module)
                .map(|d| DefaultProperties::from_metadata(d.metadata()))
                .unwrap_or_default(),
        );
        Arc::clone(self.tables.entry(module.id()).or_insert(table).value())
    }

    /// Returns `true` if a table for `module` has been computed.
    pub fn contains(&self, module: &ModuleType) -> bool {
        self.tables.contains_key(&module.id())
    }

    /// Drops the table of `module` so the next lookup recomputes it.
    pub fn invalidate(&self, module: &ModuleType) {
        self.tables.remove(&module.id());
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` when nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Drops every cached table, e.g. after re-registering descriptors.
    pub fn clear(&self) {
        self.tables.clear();
    }
}
