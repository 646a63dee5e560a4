// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of module descriptors.
//!
//! The registry replaces runtime type introspection: every type the engine
//! builds, and every type a registration names, is described here once at
//! startup.

use super::injector::DefaultPropertyInjector;
use super::loader::DefaultModuleLoader;
use super::parameter_provider::DefaultParameterProvider;
use crate::adapters::DefaultValueMapper;
use crate::domain::{ModuleDescriptor, ModuleError, ModuleType, Result, Value};
use crate::ports::{ModuleLoader, ParameterProvider, PropertyInjector, ValueMapper};
use dashmap::DashMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe descriptor registry using DashMap.
///
/// # Examples
///
/// ```rust
/// use modwire::domain::{ModuleDescriptor, ModuleType};
/// use modwire::service::ModuleRegistry;
///
/// #[derive(Default)]
/// struct Widget;
///
/// let registry = ModuleRegistry::new();
/// registry.register(ModuleDescriptor::default_constructible::<Widget>());
///
/// let ty = ModuleType::of::<Widget>();
/// assert!(registry.contains(&ty));
/// assert_eq!(registry.find_by_name("Widget"), Some(ty));
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    descriptors: DashMap<TypeId, Arc<ModuleDescriptor>>,
    /// Full type name to type
    names: DashMap<&'static str, ModuleType>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, replacing any previous one for the same type.
    pub fn register(&self, descriptor: ModuleDescriptor) -> Option<Arc<ModuleDescriptor>> {
        let module = *descriptor.module();
        debug!("Registering module {}", module);
        self.names.insert(module.name(), module);
        self.descriptors.insert(module.id(), Arc::new(descriptor))
    }

    /// Registers a descriptor unless one exists for the type.
    pub fn register_if_absent(&self, descriptor: ModuleDescriptor) {
        let module = *descriptor.module();
        if !self.contains(&module) {
            self.register(descriptor);
        }
    }

    /// Registers the engine's own collaborators so they can be named by type.
    pub fn register_builtins(&self) {
        self.register_if_absent(
            ModuleDescriptor::builder::<DefaultModuleLoader>()
                .default_constructor()
                .assignable_to::<Arc<dyn ModuleLoader>, _>(|l| l as Arc<dyn ModuleLoader>)
                .build(),
        );
        self.register_if_absent(
            ModuleDescriptor::builder::<DefaultParameterProvider>()
                .default_constructor()
                .assignable_to::<Arc<dyn ParameterProvider>, _>(|p| p as Arc<dyn ParameterProvider>)
                .build(),
        );
        self.register_if_absent(
            ModuleDescriptor::builder::<DefaultPropertyInjector>()
                .default_constructor()
                .assignable_to::<Arc<dyn PropertyInjector>, _>(|i| i as Arc<dyn PropertyInjector>)
                .build(),
        );
        self.register_if_absent(
            ModuleDescriptor::builder::<DefaultValueMapper>()
                .default_constructor()
                .assignable_to::<Arc<dyn ValueMapper>, _>(|m| m as Arc<dyn ValueMapper>)
                .build(),
        );
    }

    /// Returns the descriptor of a type, if registered.
    pub fn get(&self, module: &ModuleType) -> Option<Arc<ModuleDescriptor>> {
        self.descriptors
            .get(&module.id())
            .map(|d| Arc::clone(d.value()))
    }

    /// Returns the descriptor of a type or fails with [`ModuleError::UnknownModule`].
    pub fn descriptor(&self, module: &ModuleType) -> Result<Arc<ModuleDescriptor>> {
        self.get(module).ok_or_else(|| ModuleError::UnknownModule {
            name: module.name().to_string(),
        })
    }

    /// Returns `true` if the type is registered.
    pub fn contains(&self, module: &ModuleType) -> bool {
        self.descriptors.contains_key(&module.id())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Finds a registered type by its full type name, or by its last path
    /// segment when exactly one registered type has that short name.
    pub fn find_by_name(&self, name: &str) -> Option<ModuleType> {
        if let Some(module) = self.names.get(name) {
            return Some(*module.value());
        }
        let mut matches = self
            .names
            .iter()
            .filter(|e| short_name(e.key()) == name)
            .map(|e| *e.value());
        match (matches.next(), matches.next()) {
            (Some(module), None) => Some(module),
            _ => None,
        }
    }

    /// Interprets a "class" property value.
    ///
    /// The value may hold a [`ModuleType`] directly, or text naming a
    /// registered type.
    pub fn resolve_class(&self, value: &Value) -> Result<ModuleType> {
        if let Some(module) = value.as_module_type() {
            return Ok(module);
        }
        match value.as_text() {
            Some(name) => self
                .find_by_name(name.trim())
                .ok_or_else(|| ModuleError::UnknownModule {
                    name: name.to_string(),
                }),
            None => Err(ModuleError::TypeMismatch {
                expected: "module type or type name".to_string(),
                actual: value.type_info().name().to_string(),
            }),
        }
    }

    /// Whether a `candidate` value may stand in for a `target` value.
    pub fn is_assignable(&self, candidate: &ModuleType, target: &ModuleType) -> bool {
        candidate == target
            || self
                .get(candidate)
                .map(|d| d.is_assignable_to(target))
                .unwrap_or(false)
    }

    /// Converts `value` into a value of type `target`.
    ///
    /// Fails with [`ModuleError::NotASubtype`] if the value's type does not
    /// declare `target` as a supertype.
    pub fn upcast(&self, value: &Value, target: &ModuleType) -> Result<Value> {
        if value.is_type(target) {
            return Ok(value.clone());
        }
        self.get(&value.type_info())
            .and_then(|d| d.upcast(value, target))
            .unwrap_or_else(|| {
                Err(ModuleError::NotASubtype {
                    expected: target.name().to_string(),
                    candidate: value.type_info().name().to_string(),
                })
            })
    }

    /// Extracts a shared `S` from `value`, upcasting to `Arc<S>` if needed.
    pub fn cast<S>(&self, value: &Value) -> Result<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        if let Some(shared) = value.get::<Arc<S>>() {
            return Ok(shared);
        }
        let target = ModuleType::of::<Arc<S>>();
        let upcast = self.upcast(value, &target)?;
        upcast.get::<Arc<S>>().ok_or_else(|| ModuleError::TypeMismatch {
            expected: target.name().to_string(),
            actual: upcast.type_info().name().to_string(),
        })
    }
}

fn short_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(at) => &full[at + 2..],
        None => full,
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names.iter().map(|e| *e.key()).collect();
        names.sort_unstable();
        f.debug_struct("ModuleRegistry").field("modules", &names).finish()
    }
}
