// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property locator strategy trait.
//!
//! A locator decides *where and in what order* properties are searched. Besides
//! plain `(domain, name)` lookups it answers the "special" lookups the engine
//! needs for every module type: its provider, provider type, loader, parameter
//! provider, property injector and value mapper.
//!
//! The special lookups are provided methods built on [`PropertyLocator::get_property`]
//! and the free functions in this module, which walk the canonical search order
//! from [`LookupKey::search_order`]. Strategies that layer several sources (for
//! example an overlay in front of an inner locator) override them to keep each
//! layer's search self-contained.

use crate::domain::{DomainName, LookupKey, LookupKind, ModuleType, Result, Value};
use crate::ports::loader::{ModuleLoader, ParameterProvider, PropertyInjector};
use crate::ports::mapper::ValueMapper;
use crate::service::Resolution;
use std::sync::Arc;
use tracing::trace;

/// A property lookup over one or more sources.
pub type Lookup<'a> = &'a dyn Fn(&DomainName, &str) -> Result<Option<Value>>;

/// A search strategy over property sources.
///
/// Every `get_*` method returns `Ok(None)` when nothing is registered; the
/// engine substitutes its default collaborator in that case.
pub trait PropertyLocator: Send + Sync {
    /// Returns the name of this strategy, used in logs.
    fn name(&self) -> &str;

    /// Looks up a plain property.
    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>>;

    /// Looks up the provider registered for `module`, instance or type.
    fn get_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<ProviderEntry>> {
        find_provider_entry(&|d: &DomainName, n: &str| self.get_property(d, n), res, module)
    }

    /// Looks up the loader registered for `module`.
    fn get_loader(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ModuleLoader>>> {
        find_strategy(
            &|d: &DomainName, n: &str| self.get_property(d, n),
            res,
            module,
            LookupKind::Loader,
        )
    }

    /// Looks up the parameter provider registered for `module`.
    fn get_parameter_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ParameterProvider>>> {
        find_strategy(
            &|d: &DomainName, n: &str| self.get_property(d, n),
            res,
            module,
            LookupKind::ParameterProvider,
        )
    }

    /// Looks up the property injector registered for `module`.
    fn get_property_injector(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn PropertyInjector>>> {
        find_strategy(
            &|d: &DomainName, n: &str| self.get_property(d, n),
            res,
            module,
            LookupKind::PropertyInjector,
        )
    }

    /// Looks up the value mapper registered for `module`.
    fn get_value_mapper(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ValueMapper>>> {
        find_strategy(
            &|d: &DomainName, n: &str| self.get_property(d, n),
            res,
            module,
            LookupKind::ValueMapper,
        )
    }
}

/// A provider registered through a locator.
#[derive(Clone, Debug)]
pub enum ProviderEntry {
    /// A ready provider instance
    Instance(Value),
    /// A provider type, built through the engine when used
    Type(ModuleType),
}

/// Walks the four provider keys once and returns the first hit.
///
/// Instance keys yield [`ProviderEntry::Instance`], class keys
/// [`ProviderEntry::Type`].
pub fn find_provider_entry(
    lookup: Lookup<'_>,
    res: &Resolution<'_>,
    module: &ModuleType,
) -> Result<Option<ProviderEntry>> {
    for (key, class) in LookupKey::search_order(module, LookupKind::Provider) {
        let Some(value) = lookup(&key.domain, &key.name)? else {
            continue;
        };
        if class {
            let provider = res.registry().resolve_class(&value)?;
            trace!("Provider type {} for {} found at {}.{}", provider, module, key.domain, key.name);
            return Ok(Some(ProviderEntry::Type(provider)));
        }
        trace!("Provider instance for {} found at {}.{}", module, key.domain, key.name);
        return Ok(Some(ProviderEntry::Instance(value)));
    }
    Ok(None)
}

/// Searches all four keys of a collaborator lookup and converts the match.
///
/// An instance value must hold an `Arc<S>` or be upcastable to one. A class
/// value is loaded through the engine, except that the default loader class
/// reuses the current default loader.
pub fn find_strategy<S>(
    lookup: Lookup<'_>,
    res: &Resolution<'_>,
    module: &ModuleType,
    kind: LookupKind,
) -> Result<Option<Arc<S>>>
where
    S: ?Sized + Send + Sync + 'static,
{
    for (key, class) in LookupKey::search_order(module, kind) {
        let Some(value) = lookup(&key.domain, &key.name)? else {
            continue;
        };
        trace!("{} for {} found at {}.{}", kind, module, key.domain, key.name);
        let instance = if class {
            let ty = res.registry().resolve_class(&value)?;
            if kind == LookupKind::Loader && res.is_default_loader(&ty) {
                Value::new(res.default_loader())
            } else {
                res.load(&ty)?
            }
        } else {
            value
        };
        return res.registry().cast::<S>(&instance).map(Some);
    }
    Ok(None)
}
