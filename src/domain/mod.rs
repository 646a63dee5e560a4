// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module contains the types the resolution engine works with: domain
//! names, module types, untyped values, declarative metadata, construction
//! descriptors, lookup naming and the error taxonomy. It is independent of any
//! property source or strategy implementation.

pub mod defaults;
pub mod descriptor;
pub mod domain_name;
pub mod errors;
pub mod lookup;
pub mod metadata;
pub mod snapshot;
pub mod type_info;
pub mod value;

// Re-export commonly used types
pub use defaults::DefaultProperties;
pub use descriptor::{
    AccessGuard, Args, BuilderMethod, Constructor, DescriptorBuilder, Field, FieldSpec,
    ModuleDescriptor, Receiver,
};
pub use domain_name::DomainName;
pub use errors::{BoxError, ModuleError, Result};
pub use lookup::{LookupKey, LookupKind, Scope, CLASS_SUFFIX, GLOBAL_DOMAIN};
pub use metadata::{
    DefaultLiteral, InjectionPoint, ModuleMetadata, PropertyDecl, LOAD_SENTINEL, NULL_SENTINEL,
};
pub use snapshot::DomainSnapshot;
pub use type_info::ModuleType;
pub use value::Value;
