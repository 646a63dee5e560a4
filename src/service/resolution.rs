// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine runtime and the per-call resolution environment.
//!
//! A [`Runtime`] is created once with the engine and owns everything that
//! outlives a single `load`: the descriptor registry, the defaults cache, the
//! default loader and the fallback value mapper.
//!
//! A [`Resolution`] is created for every top-level call. It pairs the runtime
//! with the active [`PropertyLocator`] and carries the stack of modules whose
//! construction is in progress. Every nested load goes through
//! [`Resolution::load`], which refuses to re-enter a module already on the
//! stack and bounds the stack depth.

use super::defaults_cache::DefaultsCache;
use super::loader::DefaultModuleLoader;
use super::parameter_provider::coerce;
use super::registry::ModuleRegistry;
use crate::adapters::DefaultValueMapper;
use crate::domain::{
    DefaultProperties, DomainName, InjectionPoint, ModuleError, ModuleType, Result, Value,
};
use crate::ports::{
    ModuleLoader, ParameterProvider, PropertyInjector, PropertyLocator, ValueMapper,
};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Default maximum nesting of module loads within one call.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// State shared by every resolution of one engine.
pub struct Runtime {
    registry: Arc<ModuleRegistry>,
    defaults: DefaultsCache,
    default_loader: Arc<DefaultModuleLoader>,
    mapper: Arc<dyn ValueMapper>,
    max_depth: usize,
}

impl Runtime {
    /// Creates a runtime over `registry`, registering the built-in
    /// collaborators in it.
    pub fn new(registry: Arc<ModuleRegistry>, mapper: Arc<dyn ValueMapper>, max_depth: usize) -> Self {
        registry.register_builtins();
        Self {
            registry,
            defaults: DefaultsCache::new(),
            default_loader: Arc::new(DefaultModuleLoader::new()),
            mapper,
            max_depth: max_depth.max(1),
        }
    }

    /// The descriptor registry.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// The per-type default-property cache.
    pub fn defaults(&self) -> &DefaultsCache {
        &self.defaults
    }

    /// The loader used when no other is registered.
    pub fn default_loader(&self) -> &Arc<DefaultModuleLoader> {
        &self.default_loader
    }

    /// The value mapper used when no other is registered.
    pub fn mapper(&self) -> &Arc<dyn ValueMapper> {
        &self.mapper
    }

    /// Maximum nesting of module loads within one call.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Builds `module`, searching collaborators through `locator`.
    pub fn load(&self, locator: &dyn PropertyLocator, module: &ModuleType) -> Result<Value> {
        Resolution::new(self, locator).load(module)
    }

    /// Builds `module` with an explicit provider type.
    pub fn load_with_provider(
        &self,
        locator: &dyn PropertyLocator,
        module: &ModuleType,
        provider: &ModuleType,
    ) -> Result<Value> {
        Resolution::new(self, locator).load_with_provider(module, provider)
    }

    /// Populates the injectable fields of `instance`.
    pub fn inject(&self, locator: &dyn PropertyLocator, instance: &Value) -> Result<()> {
        Resolution::new(self, locator).inject(instance)
    }

    /// Reads a property through `locator` and coerces it to `target`.
    pub fn property(
        &self,
        locator: &dyn PropertyLocator,
        domain: &DomainName,
        name: &str,
        target: &ModuleType,
    ) -> Result<Option<Value>> {
        match locator.get_property(domain, name)? {
            None => Ok(None),
            Some(value) => {
                let key = format!("{}.{}", domain, name);
                coerce(&self.registry, &*self.mapper, &key, &value, target).map(Some)
            }
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(
            Arc::new(ModuleRegistry::new()),
            Arc::new(DefaultValueMapper::new()),
            DEFAULT_MAX_DEPTH,
        )
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .field("cached_defaults", &self.defaults.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// The environment of one top-level call.
///
/// Not shared between threads: each caller creates its own.
pub struct Resolution<'a> {
    runtime: &'a Runtime,
    locator: &'a dyn PropertyLocator,
    stack: RefCell<Vec<ModuleType>>,
}

/// Marks a module as in progress until dropped.
struct Frame<'r> {
    stack: &'r RefCell<Vec<ModuleType>>,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

impl<'a> Resolution<'a> {
    /// Starts a resolution against `locator`.
    pub fn new(runtime: &'a Runtime, locator: &'a dyn PropertyLocator) -> Self {
        Self {
            runtime,
            locator,
            stack: RefCell::new(Vec::new()),
        }
    }

    /// The engine runtime.
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    /// The active locator.
    pub fn locator(&self) -> &'a dyn PropertyLocator {
        self.locator
    }

    /// The descriptor registry.
    pub fn registry(&self) -> &'a ModuleRegistry {
        &self.runtime.registry
    }

    /// Number of modules currently being built.
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// The modules currently being built, outermost first.
    pub fn chain(&self) -> Vec<ModuleType> {
        self.stack.borrow().clone()
    }

    /// The static default-property table of `module`.
    pub fn defaults_for(&self, module: &ModuleType) -> Arc<DefaultProperties> {
        self.runtime.defaults.get_or_compute(&self.runtime.registry, module)
    }

    /// Whether `module` is the engine's own default loader type.
    pub fn is_default_loader(&self, module: &ModuleType) -> bool {
        module.is::<DefaultModuleLoader>()
    }

    /// The engine's default loader.
    pub fn default_loader(&self) -> Arc<dyn ModuleLoader> {
        Arc::clone(&self.runtime.default_loader) as Arc<dyn ModuleLoader>
    }

    fn enter(&self, module: &ModuleType) -> Result<Frame<'_>> {
        let mut stack = self.stack.borrow_mut();
        if stack.contains(module) {
            let mut chain = stack.clone();
            chain.push(*module);
            debug!("Cycle detected while resolving {}", module);
            return Err(ModuleError::CyclicResolution {
                module: *module,
                chain,
            });
        }
        if stack.len() >= self.runtime.max_depth {
            return Err(ModuleError::RecursionLimit {
                module: *module,
                depth: self.runtime.max_depth,
            });
        }
        stack.push(*module);
        Ok(Frame { stack: &self.stack })
    }

    /// Builds `module` with the loader registered for it.
    ///
    /// The result is upcast to `module` if the loader produced a subtype.
    pub fn load(&self, module: &ModuleType) -> Result<Value> {
        let _frame = self.enter(module)?;
        trace!("Loading {} at depth {}", module, self.depth());
        let loader = self.loader_for(module)?;
        let value = loader.load(self, module)?;
        self.registry().upcast(&value, module)
    }

    /// Builds `module` using `provider`, skipping provider discovery.
    pub fn load_with_provider(&self, module: &ModuleType, provider: &ModuleType) -> Result<Value> {
        let _frame = self.enter(module)?;
        let loader = self.loader_for(module)?;
        let value = loader.load_with_provider(self, module, provider)?;
        self.registry().upcast(&value, module)
    }

    /// Populates the injectable fields of `instance`.
    pub fn inject(&self, instance: &Value) -> Result<()> {
        let injector = self.property_injector_for(&instance.type_info())?;
        injector.inject(self, instance)
    }

    /// Resolves one injection point of `module`.
    pub fn resolve(
        &self,
        module: &ModuleType,
        point: &InjectionPoint,
        defaults: &DefaultProperties,
    ) -> Result<Option<Value>> {
        let provider = self.parameter_provider_for(module)?;
        provider.resolve(self, module, point, defaults)
    }

    /// The loader for `module`, or the default loader.
    pub fn loader_for(&self, module: &ModuleType) -> Result<Arc<dyn ModuleLoader>> {
        match self.locator.get_loader(self, module)? {
            Some(loader) => Ok(loader),
            None => Ok(self.default_loader()),
        }
    }

    /// The parameter provider for `module`, or the default one.
    pub fn parameter_provider_for(&self, module: &ModuleType) -> Result<Arc<dyn ParameterProvider>> {
        match self.locator.get_parameter_provider(self, module)? {
            Some(provider) => Ok(provider),
            None => Ok(self.runtime.default_loader.parameter_provider()),
        }
    }

    /// The property injector for `module`, or the default one.
    pub fn property_injector_for(&self, module: &ModuleType) -> Result<Arc<dyn PropertyInjector>> {
        match self.locator.get_property_injector(self, module)? {
            Some(injector) => Ok(injector),
            None => Ok(self.runtime.default_loader.property_injector()),
        }
    }

    /// The value mapper for `module`, or the runtime's mapper.
    pub fn value_mapper_for(&self, module: &ModuleType) -> Result<Arc<dyn ValueMapper>> {
        match self.locator.get_value_mapper(self, module)? {
            Some(mapper) => Ok(mapper),
            None => Ok(Arc::clone(&self.runtime.mapper)),
        }
    }
}

impl fmt::Debug for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("locator", &self.locator.name())
            .field("chain", &*self.stack.borrow())
            .finish()
    }
}
