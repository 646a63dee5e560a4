// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped override contexts.

use super::config_manager::ConfigManager;
use super::registration::ModuleRegistrar;
use super::registry::ModuleRegistry;
use super::resolution::{Resolution, Runtime};
use crate::adapters::{DynamicLocator, LookupOrder, PropertyMap, SourceLocator};
use crate::domain::{DomainName, ModuleError, ModuleType, Result, Value};
use crate::ports::{
    ModuleLoader, ParameterProvider, PropertyInjector, PropertyLocator, PropertySource,
    ProviderEntry, ValueMapper,
};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, warn};

/// A node in a tree of override scopes.
///
/// A context searches the engine's configuration and its own property source
/// in its [`LookupOrder`]; anything not found there is looked up in the parent
/// context, if the parent is still alive. Writes and registrations go to the
/// context's own source only and never reach the parent.
///
/// Contexts are created by [`Modules::create_context`](crate::service::Modules::create_context).
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::LookupOrder;
/// use modwire::service::Modules;
///
/// let modules = Modules::new();
/// let parent = modules.create_context(LookupOrder::OverridesFirst, None);
/// let child = modules.create_context(LookupOrder::OverridesFirst, Some(&parent));
///
/// parent.set_property("app", "port", 8080);
/// assert_eq!(child.get_property::<i32>("app", "port").unwrap(), Some(8080));
///
/// child.set_property("app", "port", 9090);
/// assert_eq!(child.get_property::<i32>("app", "port").unwrap(), Some(9090));
/// assert_eq!(parent.get_property::<i32>("app", "port").unwrap(), Some(8080));
/// ```
pub struct ModuleContext {
    runtime: Arc<Runtime>,
    source: Arc<PropertyMap>,
    locator: SourceLocator,
    parent: RwLock<Weak<ModuleContext>>,
}

impl ModuleContext {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        config: Arc<ConfigManager>,
        order: LookupOrder,
        parent: Option<&Arc<ModuleContext>>,
    ) -> Arc<Self> {
        let source = Arc::new(PropertyMap::new());
        let locator = SourceLocator::with_order(
            config as Arc<dyn PropertySource>,
            Arc::clone(&source) as Arc<dyn PropertySource>,
            order,
        );
        Arc::new(Self {
            runtime,
            source,
            locator,
            parent: RwLock::new(parent.map(Arc::downgrade).unwrap_or_default()),
        })
    }

    /// The parent context, if set and still alive.
    pub fn parent(&self) -> Option<Arc<ModuleContext>> {
        match self.parent.read() {
            Ok(parent) => parent.upgrade(),
            Err(_) => {
                warn!("Context parent lock poisoned, ignoring parent");
                None
            }
        }
    }

    /// Replaces the parent.
    ///
    /// Fails with [`ModuleError::CyclicResolution`] if this context is an
    /// ancestor of `parent` (or `parent` itself).
    pub fn set_parent(&self, parent: Option<&Arc<ModuleContext>>) -> Result<()> {
        if let Some(parent) = parent {
            let mut chain = vec![ModuleType::of::<ModuleContext>()];
            let mut next = Some(Arc::clone(parent));
            while let Some(node) = next {
                chain.push(ModuleType::of::<ModuleContext>());
                if std::ptr::eq(&*node, self) {
                    return Err(ModuleError::CyclicResolution {
                        module: ModuleType::of::<ModuleContext>(),
                        chain,
                    });
                }
                next = node.parent();
            }
        }
        match self.parent.write() {
            Ok(mut lock) => *lock = parent.map(Arc::downgrade).unwrap_or_default(),
            Err(_) => warn!("Context parent lock poisoned, parent unchanged"),
        }
        Ok(())
    }

    /// The context's own property source.
    pub fn source(&self) -> &Arc<PropertyMap> {
        &self.source
    }

    /// The order between configuration and the own source.
    pub fn order(&self) -> LookupOrder {
        self.locator.order()
    }

    /// Writes a property to this context's own source.
    pub fn set_property(
        &self,
        domain: impl Into<DomainName>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.source.insert(domain, name, value)
    }

    /// Removes a property from this context's own source.
    pub fn remove_property(&self, domain: impl Into<DomainName>, name: &str) -> Option<Value> {
        self.source.remove(&domain.into(), name)
    }

    /// Builds a `T`.
    pub fn load<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.load_type(&ModuleType::of::<T>())?.expect_arc::<T>()
    }

    /// Builds a module of the given type.
    pub fn load_type(&self, module: &ModuleType) -> Result<Value> {
        debug!("Loading {} in context", module);
        self.runtime.load(self, module)
    }

    /// Builds a `T` using `provider`.
    pub fn load_with_provider<T: Any + Send + Sync>(&self, provider: &ModuleType) -> Result<Arc<T>> {
        self.load_type_with_provider(&ModuleType::of::<T>(), provider)?
            .expect_arc::<T>()
    }

    /// Builds `module` using `provider`.
    pub fn load_type_with_provider(&self, module: &ModuleType, provider: &ModuleType) -> Result<Value> {
        self.runtime.load_with_provider(self, module, provider)
    }

    /// Builds a `T` with one-off overrides in front of this context.
    pub fn load_with_overrides<T: Any + Send + Sync>(&self, overrides: PropertyMap) -> Result<Arc<T>> {
        self.load_type_with_overrides(&ModuleType::of::<T>(), overrides)?
            .expect_arc::<T>()
    }

    /// Builds `module` with one-off overrides in front of this context.
    pub fn load_type_with_overrides(&self, module: &ModuleType, overrides: PropertyMap) -> Result<Value> {
        let locator = DynamicLocator::new(overrides, self);
        self.runtime.load(&locator, module)
    }

    /// Populates the injectable fields of `instance`.
    pub fn inject(&self, instance: &Value) -> Result<()> {
        self.runtime.inject(self, instance)
    }

    /// Reads a property as a `T`, searching this context, then its parents.
    pub fn get_property<T: Any + Clone>(
        &self,
        domain: impl Into<DomainName>,
        name: &str,
    ) -> Result<Option<T>> {
        let target = ModuleType::of::<T>();
        match self.runtime.property(self, &domain.into(), name, &target)? {
            None => Ok(None),
            Some(value) => value.get::<T>().map(Some).ok_or_else(|| ModuleError::TypeMismatch {
                expected: target.name().to_string(),
                actual: value.type_info().name().to_string(),
            }),
        }
    }

    /// Reads a property coerced to `target`.
    pub fn get_property_value(
        &self,
        domain: &DomainName,
        name: &str,
        target: &ModuleType,
    ) -> Result<Option<Value>> {
        self.runtime.property(self, domain, name, target)
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("order", &self.locator.order())
            .field("properties", &self.source.len())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

impl PropertyLocator for ModuleContext {
    fn name(&self) -> &str {
        "context"
    }

    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        if let Some(value) = self.locator.get_property(domain, name)? {
            return Ok(Some(value));
        }
        match self.parent() {
            Some(parent) => PropertyLocator::get_property(&*parent, domain, name),
            None => Ok(None),
        }
    }

    fn get_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<ProviderEntry>> {
        if let Some(provider) = self.locator.get_provider(res, module)? {
            return Ok(Some(provider));
        }
        match self.parent() {
            Some(parent) => parent.get_provider(res, module),
            None => Ok(None),
        }
    }

    fn get_loader(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ModuleLoader>>> {
        if let Some(loader) = self.locator.get_loader(res, module)? {
            return Ok(Some(loader));
        }
        match self.parent() {
            Some(parent) => parent.get_loader(res, module),
            None => Ok(None),
        }
    }

    fn get_parameter_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ParameterProvider>>> {
        if let Some(provider) = self.locator.get_parameter_provider(res, module)? {
            return Ok(Some(provider));
        }
        match self.parent() {
            Some(parent) => parent.get_parameter_provider(res, module),
            None => Ok(None),
        }
    }

    fn get_property_injector(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn PropertyInjector>>> {
        if let Some(injector) = self.locator.get_property_injector(res, module)? {
            return Ok(Some(injector));
        }
        match self.parent() {
            Some(parent) => parent.get_property_injector(res, module),
            None => Ok(None),
        }
    }

    fn get_value_mapper(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
    ) -> Result<Option<Arc<dyn ValueMapper>>> {
        if let Some(mapper) = self.locator.get_value_mapper(res, module)? {
            return Ok(Some(mapper));
        }
        match self.parent() {
            Some(parent) => parent.get_value_mapper(res, module),
            None => Ok(None),
        }
    }
}

impl ModuleRegistrar for ModuleContext {
    fn registration_source(&self) -> &dyn PropertySource {
        &*self.source
    }

    fn type_registry(&self) -> &ModuleRegistry {
        self.runtime.registry()
    }
}
