// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine façade.

use super::config_manager::ConfigManager;
use super::context::ModuleContext;
use super::registration::ModuleRegistrar;
use super::registry::ModuleRegistry;
use super::resolution::{Runtime, DEFAULT_MAX_DEPTH};
use crate::adapters::{DynamicLocator, FastDynamicLocator, LookupOrder, PropertyMap, SourceLocator};
use crate::domain::{DomainName, ModuleDescriptor, ModuleError, ModuleType, Result, Value};
use crate::ports::{PropertyLocator, PropertySource, ValueMapper};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Builds modules from registered descriptors and live configuration.
///
/// `Modules` searches a [`ConfigManager`] and an override [`PropertyMap`] in
/// the configured [`LookupOrder`]. Registrations made through
/// [`ModuleRegistrar`] are written to the config manager. Cloning is cheap and
/// clones share all state.
///
/// # Examples
///
/// ```rust
/// use modwire::domain::{InjectionPoint, ModuleDescriptor};
/// use modwire::service::Modules;
///
/// struct Server {
///     port: u16,
/// }
///
/// let modules = Modules::builder()
///     .register(
///         ModuleDescriptor::builder::<Server>()
///             .builder_constructor(
///                 vec![InjectionPoint::of::<u16>("port").property("app", "port", "80")],
///                 |args| Ok(Server { port: args.get(0)? }),
///             )
///             .build(),
///     )
///     .build();
///
/// assert_eq!(modules.load::<Server>().unwrap().port, 80);
///
/// modules.config().set("app", "port", "8080").unwrap();
/// assert_eq!(modules.load::<Server>().unwrap().port, 8080);
/// ```
#[derive(Clone)]
pub struct Modules {
    runtime: Arc<Runtime>,
    config: Arc<ConfigManager>,
    overrides: Arc<PropertyMap>,
    base: SourceLocator,
    custom: Option<Arc<dyn PropertyLocator>>,
}

impl Modules {
    /// An engine with an in-memory config manager and default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new engine builder.
    pub fn builder() -> ModulesBuilder {
        ModulesBuilder::new()
    }

    /// The configuration manager.
    pub fn config(&self) -> &Arc<ConfigManager> {
        &self.config
    }

    /// The override map searched alongside the configuration.
    pub fn overrides(&self) -> &Arc<PropertyMap> {
        &self.overrides
    }

    /// The descriptor registry.
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        self.runtime.registry()
    }

    /// The engine runtime.
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// The order between configuration and overrides.
    pub fn order(&self) -> LookupOrder {
        self.base.order()
    }

    /// The active locator: the custom one if configured, else the
    /// configuration/override locator.
    pub fn locator(&self) -> &dyn PropertyLocator {
        match &self.custom {
            Some(custom) => &**custom,
            None => &self.base,
        }
    }

    /// Registers a descriptor, dropping any cached defaults of its type.
    pub fn register(&self, descriptor: ModuleDescriptor) {
        let module = *descriptor.module();
        self.runtime.registry().register(descriptor);
        self.runtime.defaults().invalidate(&module);
    }

    /// Builds a `T`.
    pub fn load<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.load_type(&ModuleType::of::<T>())?.expect_arc::<T>()
    }

    /// Builds a module registered under `Arc<S>`, typically a trait object.
    pub fn load_shared<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>> {
        let value = self.load_type(&ModuleType::of::<Arc<S>>())?;
        self.runtime.registry().cast::<S>(&value)
    }

    /// Builds a module of the given type.
    pub fn load_type(&self, module: &ModuleType) -> Result<Value> {
        debug!("Loading {} via {} locator", module, self.locator().name());
        self.runtime.load(self.locator(), module)
    }

    /// Builds a `T` using provider `P`, skipping provider discovery.
    pub fn load_with_provider<T: Any + Send + Sync>(&self, provider: &ModuleType) -> Result<Arc<T>> {
        self.load_type_with_provider(&ModuleType::of::<T>(), provider)?
            .expect_arc::<T>()
    }

    /// Builds `module` using `provider`.
    pub fn load_type_with_provider(&self, module: &ModuleType, provider: &ModuleType) -> Result<Value> {
        debug!("Loading {} with provider {}", module, provider);
        self.runtime.load_with_provider(self.locator(), module, provider)
    }

    /// Builds a `T` with one-off overrides searched before everything else.
    ///
    /// The overrides apply to this call only, including every nested load.
    pub fn load_with_overrides<T: Any + Send + Sync>(&self, overrides: PropertyMap) -> Result<Arc<T>> {
        self.load_type_with_overrides(&ModuleType::of::<T>(), overrides)?
            .expect_arc::<T>()
    }

    /// Builds `module` with one-off overrides.
    pub fn load_type_with_overrides(&self, module: &ModuleType, overrides: PropertyMap) -> Result<Value> {
        debug!("Loading {} with {} override(s)", module, overrides.len());
        match &self.custom {
            Some(custom) => {
                let locator = DynamicLocator::new(overrides, &**custom);
                self.runtime.load(&locator, module)
            }
            None => {
                let locator = FastDynamicLocator::over(overrides, &self.base);
                self.runtime.load(&locator, module)
            }
        }
    }

    /// Populates the injectable fields of `instance`.
    pub fn inject(&self, instance: &Value) -> Result<()> {
        self.runtime.inject(self.locator(), instance)
    }

    /// Populates the injectable fields of a shared instance in place.
    pub fn inject_arc<T: Any + Send + Sync>(&self, instance: &Arc<T>) -> Result<()> {
        self.inject(&Value::from_arc(Arc::clone(instance)))
    }

    /// Reads a property as a `T`, coercing it if stored as another type.
    pub fn get_property<T: Any + Clone>(
        &self,
        domain: impl Into<DomainName>,
        name: &str,
    ) -> Result<Option<T>> {
        let target = ModuleType::of::<T>();
        match self.get_property_value(&domain.into(), name, &target)? {
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
        self.runtime.property(self.locator(), domain, name, target)
    }

    /// Creates a context over this engine's configuration.
    ///
    /// The context searches the configuration and its own override source in
    /// `order`, then `parent` if one is given. It holds only a weak reference
    /// to the parent.
    pub fn create_context(
        &self,
        order: LookupOrder,
        parent: Option<&Arc<ModuleContext>>,
    ) -> Arc<ModuleContext> {
        ModuleContext::new(
            Arc::clone(&self.runtime),
            Arc::clone(&self.config),
            order,
            parent,
        )
    }
}

impl Default for Modules {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Modules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modules")
            .field("runtime", &self.runtime)
            .field("config", &self.config)
            .field("overrides", &self.overrides.len())
            .field("locator", &self.locator().name())
            .finish()
    }
}

impl ModuleRegistrar for Modules {
    fn registration_source(&self) -> &dyn PropertySource {
        &*self.config
    }

    fn type_registry(&self) -> &ModuleRegistry {
        self.runtime.registry()
    }
}

/// Builder for constructing [`Modules`].
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::{LookupOrder, PropertyMap};
/// use modwire::service::Modules;
///
/// let modules = Modules::builder()
///     .with_order(LookupOrder::OverridesFirst)
///     .with_overrides(PropertyMap::new().with("app", "port", 8080))
///     .with_max_depth(16)
///     .build();
///
/// modules.config().set("app", "port", 80).unwrap();
/// let port: Option<i32> = modules.get_property("app", "port").unwrap();
/// assert_eq!(port, Some(8080));
/// ```
pub struct ModulesBuilder {
    config: Option<Arc<ConfigManager>>,
    registry: Option<Arc<ModuleRegistry>>,
    descriptors: Vec<ModuleDescriptor>,
    mapper: Option<Arc<dyn ValueMapper>>,
    order: LookupOrder,
    max_depth: usize,
    overrides: PropertyMap,
    locator: Option<Arc<dyn PropertyLocator>>,
}

impl ModulesBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            registry: None,
            descriptors: Vec::new(),
            mapper: None,
            order: LookupOrder::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            overrides: PropertyMap::new(),
            locator: None,
        }
    }

    /// Uses an existing configuration manager.
    pub fn with_config(mut self, config: Arc<ConfigManager>) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses an existing descriptor registry.
    pub fn with_registry(mut self, registry: Arc<ModuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Registers a descriptor.
    pub fn register(mut self, descriptor: ModuleDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Uses `mapper` when no value mapper is registered for a module.
    ///
    /// Defaults to the config manager's mapper.
    pub fn with_value_mapper(mut self, mapper: Arc<dyn ValueMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Sets the order between configuration and overrides.
    pub fn with_order(mut self, order: LookupOrder) -> Self {
        self.order = order;
        self
    }

    /// Searches overrides before configuration.
    pub fn reverted(self) -> Self {
        self.with_order(LookupOrder::OverridesFirst)
    }

    /// Limits how deeply module loads may nest within one call.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Seeds the override map.
    pub fn with_overrides(mut self, overrides: PropertyMap) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the configuration/override locator with a custom strategy.
    pub fn with_locator(mut self, locator: Arc<dyn PropertyLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Builds the engine.
    pub fn build(self) -> Modules {
        let config = self.config.unwrap_or_else(|| Arc::new(ConfigManager::new()));
        let registry = self.registry.unwrap_or_default();
        for descriptor in self.descriptors {
            registry.register(descriptor);
        }
        let mapper = self
            .mapper
            .unwrap_or_else(|| Arc::clone(config.mapper()));
        let runtime = Arc::new(Runtime::new(registry, mapper, self.max_depth));
        let overrides = Arc::new(self.overrides);
        let base = SourceLocator::with_order(
            Arc::clone(&config) as Arc<dyn PropertySource>,
            Arc::clone(&overrides) as Arc<dyn PropertySource>,
            self.order,
        );
        Modules {
            runtime,
            config,
            overrides,
            base,
            custom: self.locator,
        }
    }
}

impl Default for ModulesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
