// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction strategy traits.
//!
//! The three collaborators that turn a module type into an instance: the
//! [`ModuleLoader`] chooses and invokes a construction recipe, the
//! [`ParameterProvider`] resolves one injection point, and the
//! [`PropertyInjector`] populates fields after construction.
//!
//! Each of them is itself a module: a registration may name an implementing
//! type, which the engine then loads like any other module. All methods take
//! the [`Resolution`] of the current call, through which nested loads,
//! collaborator lookups and the active locator are reached.

use crate::domain::{DefaultProperties, InjectionPoint, ModuleType, Result, Value};
use crate::service::Resolution;
use std::sync::Arc;

/// Builds module instances.
pub trait ModuleLoader: Send + Sync {
    /// Builds an instance of `module`, discovering its provider through the
    /// active locator.
    ///
    /// The returned value is assignable to `module`.
    fn load(&self, res: &Resolution<'_>, module: &ModuleType) -> Result<Value>;

    /// Builds an instance of `module` using `provider`, skipping provider
    /// discovery.
    fn load_with_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        provider: &ModuleType,
    ) -> Result<Value>;
}

/// Resolves the value of a single constructor parameter, builder parameter or
/// field.
pub trait ParameterProvider: Send + Sync {
    /// Resolves `point` for the module being built.
    ///
    /// `defaults` is the module's static default-property table. `Ok(None)`
    /// means the point resolved to no value.
    fn resolve(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        point: &InjectionPoint,
        defaults: &DefaultProperties,
    ) -> Result<Option<Value>>;
}

/// Populates the injectable fields of an already constructed instance.
pub trait PropertyInjector: Send + Sync {
    /// Injects every field of `instance` that carries metadata.
    fn inject(&self, res: &Resolution<'_>, instance: &Value) -> Result<()>;
}

/// Shared handle to a loader.
pub type SharedLoader = Arc<dyn ModuleLoader>;

/// Shared handle to a parameter provider.
pub type SharedParameterProvider = Arc<dyn ParameterProvider>;

/// Shared handle to a property injector.
pub type SharedPropertyInjector = Arc<dyn PropertyInjector>;
