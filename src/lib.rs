// SPDX-License-Identifier: MIT OR Apache-2.0

//! A runtime module construction engine.
//!
//! Given the descriptor of a type (a "module"), this crate produces a fully
//! initialized instance by resolving its dependencies, configuration values and
//! construction recipe, without the caller writing wiring code.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`ModuleType`, `Value`, metadata, descriptors, errors)
//! - **Ports**: Trait definitions at the seams (`PropertySource`, `PropertyLocator`,
//!   `ModuleLoader`, `ParameterProvider`, `PropertyInjector`, `ValueMapper`)
//! - **Adapters**: Override maps, property files, the default value mapper and the
//!   locator strategies
//! - **Service**: The configuration manager, the descriptor registry and the
//!   resolution engine
//!
//! # Resolution
//!
//! Loading a module `T` proceeds as follows:
//!
//! 1. a provider instance or provider type registered for `T` through the
//!    active locator, or the provider type declared in `T`'s metadata, builds
//!    `T` with one of its builder methods (or is `T` itself);
//! 2. otherwise `T`'s designated builder constructor, or its zero-argument
//!    constructor, is invoked and the result's fields are injected.
//!
//! Every constructor or builder parameter is resolved from live configuration,
//! from `T`'s default properties, or from its declared default literal. The
//! literals [`NULL_SENTINEL`](domain::NULL_SENTINEL) and
//! [`LOAD_SENTINEL`](domain::LOAD_SENTINEL) resolve to no value and to a
//! nested load respectively.
//!
//! Cyclic configurations fail fast with
//! [`ModuleError::CyclicResolution`](domain::ModuleError::CyclicResolution).
//!
//! # Feature Flags
//!
//! - `files`: Resolve the OS-default property directory with `directories` (default)
//!
//! # Quick Start
//!
//! ```rust
//! use modwire::prelude::*;
//!
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! # fn main() -> modwire::domain::Result<()> {
//! let modules = Modules::builder()
//!     .register(
//!         ModuleDescriptor::builder::<Server>()
//!             .builder_constructor(
//!                 vec![
//!                     InjectionPoint::of::<String>("host").property("server", "host", "localhost"),
//!                     InjectionPoint::of::<u16>("port").property("server", "port", "8080"),
//!                 ],
//!                 |args| {
//!                     Ok(Server {
//!                         host: args.get(0)?,
//!                         port: args.get(1)?,
//!                     })
//!                 },
//!             )
//!             .build(),
//!     )
//!     .build();
//!
//! modules.config().set("server", "port", "9000")?;
//!
//! let server = modules.load::<Server>()?;
//! assert_eq!(server.host, "localhost");
//! assert_eq!(server.port, 9000);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::adapters::{LookupOrder, PropertyMap};
    pub use crate::domain::{
        Args, DomainName, FieldSpec, InjectionPoint, ModuleDescriptor, ModuleError, ModuleType,
        Result, Scope, Value, LOAD_SENTINEL, NULL_SENTINEL,
    };
    pub use crate::ports::{
        ModuleLoader, ParameterProvider, PropertyInjector, PropertyLocator, PropertySource,
        ValueMapper,
    };
    pub use crate::service::{ConfigManager, ModuleContext, ModuleRegistrar, Modules};
}
