// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the traits at the seams of the engine: property
//! sources and file parsers, change listeners, value mappers, locator
//! strategies, and the loader, parameter provider and injector collaborators.
//! Adapters and the service layer provide the implementations.

pub mod listener;
pub mod loader;
pub mod locator;
pub mod mapper;
pub mod parser;
pub mod source;

// Re-export commonly used types
pub use listener::{ChangeCallback, PropertyChange};
pub use loader::{
    ModuleLoader, ParameterProvider, PropertyInjector, SharedLoader, SharedParameterProvider,
    SharedPropertyInjector,
};
pub use locator::{
    find_provider_entry, find_strategy, Lookup, PropertyLocator, ProviderEntry,
};
pub use mapper::{SharedValueMapper, ValueMapper};
pub use parser::PropertyParser;
pub use source::PropertySource;
