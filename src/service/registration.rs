// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration of per-module collaborators.
//!
//! Registrations are ordinary properties stored under the canonical lookup
//! keys, so they are found by every locator without special handling.

use super::registry::ModuleRegistry;
use crate::domain::{LookupKey, LookupKind, ModuleError, ModuleType, Result, Scope, Value};
use crate::ports::{ModuleLoader, ParameterProvider, PropertyInjector, PropertySource, ValueMapper};
use std::sync::Arc;
use tracing::debug;

/// Installs providers, loaders, parameter providers, property injectors and
/// value mappers for module types.
///
/// Instance registrations are stored as values; type registrations are stored
/// under the `.class` key and validated against the registry first.
///
/// # Examples
///
/// ```rust
/// use modwire::domain::{ModuleDescriptor, ModuleType, Scope};
/// use modwire::service::{ModuleRegistrar, Modules};
///
/// #[derive(Default)]
/// struct Widget;
///
/// let modules = Modules::new();
/// modules.register(ModuleDescriptor::default_constructible::<Widget>());
///
/// // a type is always a valid provider of itself
/// let ty = ModuleType::of::<Widget>();
/// modules.set_provider_type(&ty, ty, Scope::Global).unwrap();
/// assert!(modules.load::<Widget>().is_ok());
/// ```
pub trait ModuleRegistrar {
    /// Where registrations are written.
    fn registration_source(&self) -> &dyn PropertySource;

    /// The registry used to validate type registrations.
    fn type_registry(&self) -> &ModuleRegistry;

    /// Registers a provider instance for `module`.
    ///
    /// The instance must be assignable to `module` or expose a builder method
    /// returning something assignable to it.
    fn set_provider(&self, module: &ModuleType, provider: Value, scope: Scope) -> Result<()> {
        check_provider(self.type_registry(), module, &provider.type_info())?;
        store(self, module, LookupKind::Provider, scope, false, provider)
    }

    /// Registers a provider type for `module`.
    fn set_provider_type(&self, module: &ModuleType, provider: ModuleType, scope: Scope) -> Result<()> {
        check_provider(self.type_registry(), module, &provider)?;
        store(self, module, LookupKind::Provider, scope, true, Value::of_type(provider))
    }

    /// Registers a loader instance for `module`.
    fn set_loader(&self, module: &ModuleType, loader: Arc<dyn ModuleLoader>, scope: Scope) -> Result<()> {
        store(self, module, LookupKind::Loader, scope, false, Value::new(loader))
    }

    /// Registers a loader type for `module`.
    fn set_loader_type(&self, module: &ModuleType, loader: ModuleType, scope: Scope) -> Result<()> {
        check_strategy::<dyn ModuleLoader>(self.type_registry(), &loader)?;
        store(self, module, LookupKind::Loader, scope, true, Value::of_type(loader))
    }

    /// Registers a parameter provider instance for `module`.
    fn set_parameter_provider(
        &self,
        module: &ModuleType,
        provider: Arc<dyn ParameterProvider>,
        scope: Scope,
    ) -> Result<()> {
        store(self, module, LookupKind::ParameterProvider, scope, false, Value::new(provider))
    }

    /// Registers a parameter provider type for `module`.
    fn set_parameter_provider_type(
        &self,
        module: &ModuleType,
        provider: ModuleType,
        scope: Scope,
    ) -> Result<()> {
        check_strategy::<dyn ParameterProvider>(self.type_registry(), &provider)?;
        store(self, module, LookupKind::ParameterProvider, scope, true, Value::of_type(provider))
    }

    /// Registers a property injector instance for `module`.
    fn set_property_injector(
        &self,
        module: &ModuleType,
        injector: Arc<dyn PropertyInjector>,
        scope: Scope,
    ) -> Result<()> {
        store(self, module, LookupKind::PropertyInjector, scope, false, Value::new(injector))
    }

    /// Registers a property injector type for `module`.
    fn set_property_injector_type(
        &self,
        module: &ModuleType,
        injector: ModuleType,
        scope: Scope,
    ) -> Result<()> {
        check_strategy::<dyn PropertyInjector>(self.type_registry(), &injector)?;
        store(self, module, LookupKind::PropertyInjector, scope, true, Value::of_type(injector))
    }

    /// Registers a value mapper instance for `module`.
    fn set_value_mapper(&self, module: &ModuleType, mapper: Arc<dyn ValueMapper>, scope: Scope) -> Result<()> {
        store(self, module, LookupKind::ValueMapper, scope, false, Value::new(mapper))
    }

    /// Registers a value mapper type for `module`.
    fn set_value_mapper_type(&self, module: &ModuleType, mapper: ModuleType, scope: Scope) -> Result<()> {
        check_strategy::<dyn ValueMapper>(self.type_registry(), &mapper)?;
        store(self, module, LookupKind::ValueMapper, scope, true, Value::of_type(mapper))
    }

    /// Removes both the instance and the type registration of `kind`.
    fn unset(&self, module: &ModuleType, kind: LookupKind, scope: Scope) -> Result<()> {
        let source = self.registration_source();
        for class in [false, true] {
            let key = LookupKey::new(module, kind, scope, class);
            source.set_property(&key.domain, &key.name, None)?;
        }
        debug!("Unset {} of {} at {:?} scope", kind, module, scope);
        Ok(())
    }
}

fn store<R: ModuleRegistrar + ?Sized>(
    registrar: &R,
    module: &ModuleType,
    kind: LookupKind,
    scope: Scope,
    class: bool,
    value: Value,
) -> Result<()> {
    let key = LookupKey::new(module, kind, scope, class);
    debug!("Registering {} of {} at {}.{}", kind, module, key.domain, key.name);
    registrar
        .registration_source()
        .set_property(&key.domain, &key.name, Some(value))?;
    Ok(())
}

/// A provider is valid if it is assignable to the module or has a builder
/// method whose return type is.
fn check_provider(registry: &ModuleRegistry, module: &ModuleType, provider: &ModuleType) -> Result<()> {
    if registry.is_assignable(provider, module) {
        return Ok(());
    }
    let builds_module = registry
        .get(provider)
        .map(|d| {
            d.builders()
                .iter()
                .any(|m| registry.is_assignable(m.returns(), module))
        })
        .unwrap_or(false);
    if builds_module {
        Ok(())
    } else {
        Err(ModuleError::NotASubtype {
            expected: module.name().to_string(),
            candidate: provider.name().to_string(),
        })
    }
}

fn check_strategy<S: ?Sized + Send + Sync + 'static>(
    registry: &ModuleRegistry,
    candidate: &ModuleType,
) -> Result<()> {
    let expected = ModuleType::of::<Arc<S>>();
    if registry.is_assignable(candidate, &expected) {
        Ok(())
    } else {
        Err(ModuleError::NotASubtype {
            expected: expected.name().to_string(),
            candidate: candidate.name().to_string(),
        })
    }
}
