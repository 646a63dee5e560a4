// SPDX-License-Identifier: MIT OR Apache-2.0

//! The default module loader.

use super::injector::DefaultPropertyInjector;
use super::parameter_provider::DefaultParameterProvider;
use super::resolution::Resolution;
use crate::domain::{
    Args, BuilderMethod, DefaultProperties, InjectionPoint, ModuleDescriptor, ModuleError,
    ModuleType, Receiver, Result, Value,
};
use crate::ports::{ModuleLoader, ParameterProvider, PropertyInjector, ProviderEntry};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Chooses and invokes a construction recipe for a module type.
///
/// Provider discovery runs in this order:
///
/// 1. the first provider registered through the locator, instance or type,
///    in the order own instance, own class, global instance, global class;
/// 2. the provider type declared in the module's metadata;
/// 3. the module's own constructors: the designated builder, else the
///    zero-argument constructor.
///
/// For a provider, an instance builder method is preferred over a static one.
/// Among builder methods, the first whose declared return type equals the
/// module wins; otherwise the first whose return type is assignable to it.
/// A provider with no such method that is itself assignable to the module is
/// returned as the module.
///
/// Instances built from the module's own constructors are passed through the
/// property injector before being returned.
///
/// The loader also owns the default parameter provider and property injector.
/// Both are created on first use and then shared.
#[derive(Default)]
pub struct DefaultModuleLoader {
    parameter_provider: OnceCell<Arc<dyn ParameterProvider>>,
    property_injector: OnceCell<Arc<dyn PropertyInjector>>,
}

impl DefaultModuleLoader {
    /// Creates a loader with no cached collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default parameter provider, created on first use.
    pub fn parameter_provider(&self) -> Arc<dyn ParameterProvider> {
        Arc::clone(
            self.parameter_provider
                .get_or_init(|| Arc::new(DefaultParameterProvider::new())),
        )
    }

    /// The default property injector, created on first use.
    pub fn property_injector(&self) -> Arc<dyn PropertyInjector> {
        Arc::clone(
            self.property_injector
                .get_or_init(|| Arc::new(DefaultPropertyInjector::new())),
        )
    }

    fn build_with_instance(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        provider: &Value,
        defaults: &DefaultProperties,
    ) -> Result<Value> {
        let provider_type = provider.type_info();
        if let Some(descriptor) = res.registry().get(&provider_type) {
            if let Some(method) = find_builder(res, &descriptor, Receiver::Instance, module) {
                debug!("Building {} with {}::{}", module, provider_type, method.name());
                return self.invoke_builder(res, module, method, Some(provider), defaults);
            }
            if let Some(method) = find_builder(res, &descriptor, Receiver::Static, module) {
                debug!("Building {} with static {}::{}", module, provider_type, method.name());
                return self.invoke_builder(res, module, method, None, defaults);
            }
        }
        if res.registry().is_assignable(&provider_type, module) {
            debug!("Provider instance {} is the module {}", provider_type, module);
            return Ok(provider.clone());
        }
        Err(ModuleError::IncompatibleProvider {
            module: *module,
            provider: provider_type,
        })
    }

    fn build_with_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        provider: &ModuleType,
        defaults: &DefaultProperties,
    ) -> Result<Value> {
        let descriptor = res.registry().descriptor(provider)?;
        if provider == module {
            // A module naming itself can only be built statically.
            if let Some(method) = find_builder(res, &descriptor, Receiver::Static, module) {
                debug!("Building {} with static {}", module, method.name());
                return self.invoke_builder(res, module, method, None, defaults);
            }
            return self.construct(res, &descriptor, defaults);
        }
        if let Some(method) = find_builder(res, &descriptor, Receiver::Instance, module) {
            debug!("Building {} with {}::{}", module, provider, method.name());
            let instance = res.load(provider)?;
            return self.invoke_builder(res, module, method, Some(&instance), defaults);
        }
        if let Some(method) = find_builder(res, &descriptor, Receiver::Static, module) {
            debug!("Building {} with static {}::{}", module, provider, method.name());
            return self.invoke_builder(res, module, method, None, defaults);
        }
        if res.registry().is_assignable(provider, module) {
            debug!("Provider {} is the module {}", provider, module);
            return res.load(provider);
        }
        Err(ModuleError::IncompatibleProvider {
            module: *module,
            provider: *provider,
        })
    }

    fn construct(
        &self,
        res: &Resolution<'_>,
        descriptor: &ModuleDescriptor,
        defaults: &DefaultProperties,
    ) -> Result<Value> {
        let module = descriptor.module();
        let constructors = descriptor.constructors();
        let constructor = constructors
            .iter()
            .find(|c| c.is_designated())
            .or_else(|| constructors.iter().find(|c| c.params().is_empty()))
            .ok_or(ModuleError::NoBuildableConstructor { module: *module })?;
        trace!(
            "Constructing {} with {} parameter(s)",
            module,
            constructor.params().len()
        );
        let args = resolve_args(res, module, constructor.params(), defaults)?;
        let instance = constructor.invoke(module, &args)?;
        res.inject(&instance)?;
        Ok(instance)
    }

    fn invoke_builder(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        method: &BuilderMethod,
        receiver: Option<&Value>,
        defaults: &DefaultProperties,
    ) -> Result<Value> {
        let args = resolve_args(res, module, method.params(), defaults)?;
        method.invoke(module, receiver, &args)
    }
}

impl ModuleLoader for DefaultModuleLoader {
    fn load(&self, res: &Resolution<'_>, module: &ModuleType) -> Result<Value> {
        let defaults = res.defaults_for(module);
        let locator = res.locator();

        match locator.get_provider(res, module)? {
            Some(ProviderEntry::Instance(provider)) => {
                return self.build_with_instance(res, module, &provider, &defaults);
            }
            Some(ProviderEntry::Type(provider)) => {
                trace!("Provider type {} registered for {}", provider, module);
                return self.build_with_provider(res, module, &provider, &defaults);
            }
            None => {}
        }

        let descriptor = res.registry().descriptor(module)?;
        match descriptor.metadata().provider {
            Some(provider) => {
                trace!("Provider type {} declared by {}", provider, module);
                self.build_with_provider(res, module, &provider, &defaults)
            }
            None => self.construct(res, &descriptor, &defaults),
        }
    }

    fn load_with_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        provider: &ModuleType,
    ) -> Result<Value> {
        let defaults = res.defaults_for(module);
        self.build_with_provider(res, module, provider, &defaults)
    }
}

impl fmt::Debug for DefaultModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultModuleLoader")
            .field("parameter_provider", &self.parameter_provider.get().is_some())
            .field("property_injector", &self.property_injector.get().is_some())
            .finish()
    }
}

/// Exact return type first, otherwise the first assignable one.
fn find_builder<'d>(
    res: &Resolution<'_>,
    descriptor: &'d ModuleDescriptor,
    receiver: Receiver,
    module: &ModuleType,
) -> Option<&'d BuilderMethod> {
    let mut fallback = None;
    for method in descriptor
        .builders()
        .iter()
        .filter(|m| m.receiver() == receiver)
    {
        if method.returns() == module {
            return Some(method);
        }
        if fallback.is_none() && res.registry().is_assignable(method.returns(), module) {
            fallback = Some(method);
        }
    }
    fallback
}

fn resolve_args(
    res: &Resolution<'_>,
    module: &ModuleType,
    params: &[InjectionPoint],
    defaults: &DefaultProperties,
) -> Result<Args> {
    params
        .iter()
        .map(|point| res.resolve(module, point, defaults))
        .collect::<Result<Vec<_>>>()
        .map(Args::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{PropertyMap, SourceLocator};
    use crate::domain::{LookupKey, LookupKind, Scope};
    use crate::service::{ModuleRegistry, Runtime};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Engine: Send + Sync {
        fn power(&self) -> u32;
    }

    #[derive(Default)]
    struct Diesel;

    impl Engine for Diesel {
        fn power(&self) -> u32 {
            150
        }
    }

    struct Car {
        engine: Arc<dyn Engine>,
    }

    #[derive(Default)]
    struct Garage;

    struct Bare(#[allow(dead_code)] u8);

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Counted;

    fn runtime() -> Runtime {
        let runtime = Runtime::default();
        let registry = runtime.registry();
        registry.register(
            ModuleDescriptor::builder::<Diesel>()
                .default_constructor()
                .assignable_to::<Arc<dyn Engine>, _>(|d| d as Arc<dyn Engine>)
                .build(),
        );
        registry.register(
            ModuleDescriptor::builder::<Car>()
                .provider::<Garage>()
                .build(),
        );
        registry.register(
            ModuleDescriptor::builder::<Garage>()
                .default_constructor()
                .instance_builder::<Car, _>(
                    "assemble",
                    vec![InjectionPoint::of::<Diesel>("engine")],
                    |_, args| {
                        let engine: Arc<dyn Engine> = args.arc::<Diesel>(0)?;
                        Ok(Car { engine })
                    },
                )
                .build(),
        );
        registry.register(
            ModuleDescriptor::builder::<Bare>()
                .constructor(vec![InjectionPoint::of::<u8>("n")], |args| {
                    Ok(Bare(args.get(0)?))
                })
                .build(),
        );
        registry.register(
            ModuleDescriptor::builder::<Counted>()
                .constructor(vec![], |_| {
                    BUILT.fetch_add(1, Ordering::SeqCst);
                    Ok(Counted)
                })
                .build(),
        );
        runtime
    }

    fn empty() -> SourceLocator {
        SourceLocator::new(Arc::new(PropertyMap::new()), Arc::new(PropertyMap::new()))
    }

    #[test]
    fn test_declared_provider_instance_builder() {
        let runtime = runtime();
        let car = runtime
            .load(&empty(), &ModuleType::of::<Car>())
            .unwrap()
            .expect_arc::<Car>()
            .unwrap();
        assert_eq!(car.engine.power(), 150);
    }

    #[test]
    fn test_no_buildable_constructor() {
        let runtime = runtime();
        let err = runtime
            .load(&empty(), &ModuleType::of::<Bare>())
            .unwrap_err();
        assert!(matches!(err, ModuleError::NoBuildableConstructor { .. }));
    }

    #[test]
    fn test_zero_arg_constructor_is_not_cached() {
        let runtime = runtime();
        let locator = empty();
        let before = BUILT.load(Ordering::SeqCst);
        let a = runtime.load(&locator, &ModuleType::of::<Counted>()).unwrap();
        let b = runtime.load(&locator, &ModuleType::of::<Counted>()).unwrap();
        assert!(!a.ptr_eq(&b));
        assert!(BUILT.load(Ordering::SeqCst) >= before + 2);
    }

    #[test]
    fn test_provider_type_assignable_to_module() {
        let runtime = runtime();
        let module = ModuleType::of::<Arc<dyn Engine>>();
        let key = LookupKey::new(&module, LookupKind::Provider, Scope::Module, true);
        let config = PropertyMap::new().with(
            key.domain,
            key.name,
            Value::of_type(ModuleType::of::<Diesel>()),
        );
        let locator = SourceLocator::new(Arc::new(config), Arc::new(PropertyMap::new()));
        let engine = runtime
            .load(&locator, &module)
            .unwrap()
            .get::<Arc<dyn Engine>>()
            .unwrap();
        assert_eq!(engine.power(), 150);
    }

    #[test]
    fn test_provider_instance_is_the_module() {
        let runtime = runtime();
        let module = ModuleType::of::<Arc<dyn Engine>>();
        let key = LookupKey::new(&module, LookupKind::Provider, Scope::Global, false);
        let diesel: Arc<dyn Engine> = Arc::new(Diesel);
        let overrides = PropertyMap::new().with(key.domain, key.name, Value::new(diesel));
        let locator = SourceLocator::new(Arc::new(PropertyMap::new()), Arc::new(overrides));
        let value = runtime.load(&locator, &module).unwrap();
        assert_eq!(value.get::<Arc<dyn Engine>>().unwrap().power(), 150);
    }

    #[test]
    fn test_incompatible_provider() {
        let runtime = runtime();
        let err = runtime
            .load_with_provider(&empty(), &ModuleType::of::<Car>(), &ModuleType::of::<Diesel>())
            .unwrap_err();
        assert!(matches!(err, ModuleError::IncompatibleProvider { .. }));
    }

    #[test]
    fn test_unregistered_provider_is_unknown() {
        let runtime = runtime();
        let err = runtime
            .load_with_provider(&empty(), &ModuleType::of::<Car>(), &ModuleType::of::<u64>())
            .unwrap_err();
        assert!(matches!(err, ModuleError::UnknownModule { .. }));
    }

    #[test]
    fn test_exact_return_type_preferred() {
        struct Multi;
        let registry = ModuleRegistry::new();
        registry.register(
            ModuleDescriptor::builder::<Diesel>()
                .default_constructor()
                .assignable_to::<Arc<dyn Engine>, _>(|d| d as Arc<dyn Engine>)
                .build(),
        );
        let descriptor = ModuleDescriptor::builder::<Multi>()
            .static_builder::<Diesel, _>("diesel", vec![], |_| Ok(Diesel))
            .static_builder::<Arc<dyn Engine>, _>("engine", vec![], |_| {
                Ok(Arc::new(Diesel) as Arc<dyn Engine>)
            })
            .build();
        let runtime = Runtime::new(
            Arc::new(registry),
            Arc::new(crate::adapters::DefaultValueMapper::new()),
            8,
        );
        let locator = empty();
        let res = Resolution::new(&runtime, &locator);
        let module = ModuleType::of::<Arc<dyn Engine>>();
        let found = find_builder(&res, &descriptor, Receiver::Static, &module).unwrap();
        assert_eq!(found.name(), "engine");
        let fallback =
            find_builder(&res, &descriptor, Receiver::Static, &ModuleType::of::<Diesel>()).unwrap();
        assert_eq!(fallback.name(), "diesel");
        assert!(find_builder(&res, &descriptor, Receiver::Instance, &module).is_none());
    }

    #[test]
    fn test_cached_collaborators_are_shared() {
        let loader = DefaultModuleLoader::new();
        assert!(Arc::ptr_eq(
            &loader.parameter_provider(),
            &loader.parameter_provider()
        ));
        assert!(Arc::ptr_eq(
            &loader.property_injector(),
            &loader.property_injector()
        ));
    }
}
