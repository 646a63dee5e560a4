// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the configuration store and the resolution engine.
//!
//! [`ConfigManager`] owns the configuration domains. [`Modules`] is the engine
//! façade: it holds the [`Runtime`] (registry, defaults cache, default
//! collaborators) and builds modules through a [`Resolution`] per call.
//! [`ModuleContext`] adds nested override scopes on top of the same runtime.

pub mod config_domain;
pub mod config_manager;
pub mod context;
pub mod defaults_cache;
pub mod injector;
pub mod loader;
pub mod modules;
pub mod parameter_provider;
pub mod registration;
pub mod registry;
pub mod resolution;

// Re-export commonly used types
pub use config_domain::ConfigDomain;
pub use config_manager::{ConfigManager, ConfigManagerBuilder};
pub use context::ModuleContext;
pub use defaults_cache::DefaultsCache;
pub use injector::DefaultPropertyInjector;
pub use loader::DefaultModuleLoader;
pub use modules::{Modules, ModulesBuilder};
pub use parameter_provider::DefaultParameterProvider;
pub use registration::ModuleRegistrar;
pub use registry::ModuleRegistry;
pub use resolution::{Resolution, Runtime, DEFAULT_MAX_DEPTH};
