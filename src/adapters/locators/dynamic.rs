// SPDX-License-Identifier: MIT OR Apache-2.0

//! Overlay locators for one-off per-call overrides.
//!
//! Both locators consult a fixed overlay map before anything else. For the
//! special lookups the overlay is searched in full (own and global keys) before
//! the underlying sources are, so an overlay entry at any scope wins.

use super::source::{first_hit, search, LookupOrder, SourceLocator};
use crate::adapters::PropertyMap;
use crate::domain::{DomainName, LookupKind, ModuleType, Result, Value};
use crate::ports::{
    find_provider_entry, find_strategy, ModuleLoader, ParameterProvider, PropertyInjector,
    PropertyLocator, PropertySource, ProviderEntry, ValueMapper,
};
use crate::service::Resolution;
use std::fmt;
use std::sync::Arc;

/// An overlay map in front of any inner locator.
///
/// Every lookup first checks the overlay, then delegates entirely to the inner
/// locator, which applies its own order.
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::{DynamicLocator, PropertyMap, SourceLocator};
/// use modwire::ports::PropertyLocator;
/// use std::sync::Arc;
///
/// let base = SourceLocator::new(
///     Arc::new(PropertyMap::new().with("app", "port", 80)),
///     Arc::new(PropertyMap::new()),
/// );
/// let locator = DynamicLocator::new(PropertyMap::new().with("app", "port", 9000), &base);
/// let port = locator.get_property(&"app".into(), "port").unwrap().unwrap();
/// assert_eq!(port.get::<i32>(), Some(9000));
/// ```
pub struct DynamicLocator<'a> {
    overlay: PropertyMap,
    inner: &'a dyn PropertyLocator,
}

impl<'a> DynamicLocator<'a> {
    /// Wraps `inner` with a fixed overlay.
    pub fn new(overlay: PropertyMap, inner: &'a dyn PropertyLocator) -> Self {
        Self { overlay, inner }
    }

    /// The overlay map.
    pub fn overlay(&self) -> &PropertyMap {
        &self.overlay
    }

    /// The wrapped locator.
    pub fn inner(&self) -> &'a dyn PropertyLocator {
        self.inner
    }
}

impl fmt::Debug for DynamicLocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLocator")
            .field("overlay", &self.overlay.len())
            .field("inner", &self.inner.name())
            .finish()
    }
}

impl PropertyLocator for DynamicLocator<'_> {
    fn name(&self) -> &str {
        "dynamic"
    }

    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        match self.overlay.get(domain, name) {
            Some(value) => Ok(Some(value)),
            None => self.inner.get_property(domain, name),
        }
    }

    fn get_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<ProviderEntry>> {
        let overlay = |d: &DomainName, n: &str| self.overlay.get_property(d, n);
        match find_provider_entry(&overlay, res, module)? {
            Some(provider) => Ok(Some(provider)),
            None => self.inner.get_provider(res, module),
        }
    }

    fn get_loader(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ModuleLoader>>> {
        let overlay = |d: &DomainName, n: &str| self.overlay.get_property(d, n);
        match find_strategy(&overlay, res, module, LookupKind::Loader)? {
            Some(loader) => Ok(Some(loader)),
            None => self.inner.get_loader(res, module),
        }
    }

    fn get_parameter_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ParameterProvider>>> {
        let overlay = |d: &DomainName, n: &str| self.overlay.get_property(d, n);
        match find_strategy(&overlay, res, module, LookupKind::ParameterProvider)? {
            Some(provider) => Ok(Some(provider)),
            None => self.inner.get_parameter_provider(res, module),
        }
    }

    fn get_property_injector(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn PropertyInjector>>> {
        let overlay = |d: &DomainName, n: &str| self.overlay.get_property(d, n);
        match find_strategy(&overlay, res, module, LookupKind::PropertyInjector)? {
            Some(injector) => Ok(Some(injector)),
            None => self.inner.get_property_injector(res, module),
        }
    }

    fn get_value_mapper(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ValueMapper>>> {
        let overlay = |d: &DomainName, n: &str| self.overlay.get_property(d, n);
        match find_strategy(&overlay, res, module, LookupKind::ValueMapper)? {
            Some(mapper) => Ok(Some(mapper)),
            None => self.inner.get_value_mapper(res, module),
        }
    }
}

/// [`DynamicLocator`] specialized for a [`SourceLocator`] inner.
///
/// Holds the overlay and both sources directly, so no lookup goes through a
/// second dynamic dispatch. Results are identical to
/// `DynamicLocator::new(overlay, &SourceLocator::with_order(config, overrides, order))`.
#[derive(Clone)]
pub struct FastDynamicLocator {
    overlay: PropertyMap,
    config: Arc<dyn PropertySource>,
    overrides: Arc<dyn PropertySource>,
    order: LookupOrder,
}

impl FastDynamicLocator {
    /// An overlay in front of a configuration source and an override map.
    pub fn new(
        overlay: PropertyMap,
        config: Arc<dyn PropertySource>,
        overrides: Arc<dyn PropertySource>,
        order: LookupOrder,
    ) -> Self {
        Self {
            overlay,
            config,
            overrides,
            order,
        }
    }

    /// An overlay in front of the sources of `base`, in `base`'s order.
    pub fn over(overlay: PropertyMap, base: &SourceLocator) -> Self {
        Self::new(
            overlay,
            Arc::clone(base.config()),
            Arc::clone(base.overrides()),
            base.order(),
        )
    }

    /// The overlay map.
    pub fn overlay(&self) -> &PropertyMap {
        &self.overlay
    }

    fn from_overlay(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        Ok(self.overlay.get(domain, name))
    }

    fn from_sources(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        first_hit(search(&*self.config, &*self.overrides, self.order), domain, name)
    }
}

impl fmt::Debug for FastDynamicLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastDynamicLocator")
            .field("overlay", &self.overlay.len())
            .field("order", &self.order)
            .finish()
    }
}

impl PropertyLocator for FastDynamicLocator {
    fn name(&self) -> &str {
        "fast-dynamic"
    }

    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        match self.from_overlay(domain, name)? {
            Some(value) => Ok(Some(value)),
            None => self.from_sources(domain, name),
        }
    }

    fn get_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<ProviderEntry>> {
        let overlay = |d: &DomainName, n: &str| self.from_overlay(d, n);
        let sources = |d: &DomainName, n: &str| self.from_sources(d, n);
        match find_provider_entry(&overlay, res, module)? {
            Some(provider) => Ok(Some(provider)),
            None => find_provider_entry(&sources, res, module),
        }
    }

    fn get_loader(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ModuleLoader>>> {
        self.layered(res, module, LookupKind::Loader)
    }

    fn get_parameter_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ParameterProvider>>> {
        self.layered(res, module, LookupKind::ParameterProvider)
    }

    fn get_property_injector(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn PropertyInjector>>> {
        self.layered(res, module, LookupKind::PropertyInjector)
    }

    fn get_value_mapper(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ValueMapper>>> {
        self.layered(res, module, LookupKind::ValueMapper)
    }
}

impl FastDynamicLocator {
    fn layered<S>(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        kind: LookupKind,
    ) -> Result<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let overlay = |d: &DomainName, n: &str| self.from_overlay(d, n);
        let sources = |d: &DomainName, n: &str| self.from_sources(d, n);
        match find_strategy::<S>(&overlay, res, module, kind)? {
            Some(found) => Ok(Some(found)),
            None => find_strategy::<S>(&sources, res, module, kind),
        }
    }
}
