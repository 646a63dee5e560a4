// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-source locator with a configurable order.

use crate::domain::{DomainName, Result, Value};
use crate::ports::{PropertyLocator, PropertySource};
use std::fmt;
use std::sync::Arc;

/// Which of the two sources a locator consults first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LookupOrder {
    /// Configuration manager first, override map second.
    #[default]
    ConfigFirst,
    /// Override map first, configuration manager second.
    OverridesFirst,
}

/// Searches a configuration source and an override map.
///
/// With [`LookupOrder::ConfigFirst`] (the default locator) a value held by the
/// configuration source always wins over a conflicting override; with
/// [`LookupOrder::OverridesFirst`] (the reverted locator) the override wins.
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::{PropertyMap, SourceLocator};
/// use modwire::ports::PropertyLocator;
/// use std::sync::Arc;
///
/// let config = Arc::new(PropertyMap::new().with("app", "port", 80));
/// let overrides = Arc::new(PropertyMap::new().with("app", "port", 8080));
///
/// let default = SourceLocator::new(config.clone(), overrides.clone());
/// let port = default.get_property(&"app".into(), "port").unwrap().unwrap();
/// assert_eq!(port.get::<i32>(), Some(80));
///
/// let reverted = SourceLocator::reverted(config, overrides);
/// let port = reverted.get_property(&"app".into(), "port").unwrap().unwrap();
/// assert_eq!(port.get::<i32>(), Some(8080));
/// ```
#[derive(Clone)]
pub struct SourceLocator {
    config: Arc<dyn PropertySource>,
    overrides: Arc<dyn PropertySource>,
    order: LookupOrder,
}

impl SourceLocator {
    /// The default locator: configuration first.
    pub fn new(config: Arc<dyn PropertySource>, overrides: Arc<dyn PropertySource>) -> Self {
        Self::with_order(config, overrides, LookupOrder::ConfigFirst)
    }

    /// The reverted locator: overrides first.
    pub fn reverted(config: Arc<dyn PropertySource>, overrides: Arc<dyn PropertySource>) -> Self {
        Self::with_order(config, overrides, LookupOrder::OverridesFirst)
    }

    /// A locator with an explicit order.
    pub fn with_order(
        config: Arc<dyn PropertySource>,
        overrides: Arc<dyn PropertySource>,
        order: LookupOrder,
    ) -> Self {
        Self {
            config,
            overrides,
            order,
        }
    }

    /// The configured order.
    pub fn order(&self) -> LookupOrder {
        self.order
    }

    /// The configuration source.
    pub fn config(&self) -> &Arc<dyn PropertySource> {
        &self.config
    }

    /// The override source.
    pub fn overrides(&self) -> &Arc<dyn PropertySource> {
        &self.overrides
    }

    pub(crate) fn ordered(&self) -> [&dyn PropertySource; 2] {
        search(&*self.config, &*self.overrides, self.order)
    }
}

/// The two sources in search order.
pub(crate) fn search<'a>(
    config: &'a dyn PropertySource,
    overrides: &'a dyn PropertySource,
    order: LookupOrder,
) -> [&'a dyn PropertySource; 2] {
    match order {
        LookupOrder::ConfigFirst => [config, overrides],
        LookupOrder::OverridesFirst => [overrides, config],
    }
}

/// First hit across `sources`.
pub(crate) fn first_hit(
    sources: [&dyn PropertySource; 2],
    domain: &DomainName,
    name: &str,
) -> Result<Option<Value>> {
    for source in sources {
        if let Some(value) = source.get_property(domain, name)? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

impl fmt::Debug for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceLocator")
            .field("config", &self.config.name())
            .field("overrides", &self.overrides.name())
            .field("order", &self.order)
            .finish()
    }
}

impl PropertyLocator for SourceLocator {
    fn name(&self) -> &str {
        match self.order {
            LookupOrder::ConfigFirst => "default",
            LookupOrder::OverridesFirst => "reverted",
        }
    }

    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        first_hit(self.ordered(), domain, name)
    }
}
