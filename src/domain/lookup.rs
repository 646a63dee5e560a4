// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical property names for "special" lookups.
//!
//! Every collaborator the engine needs for a module type (its provider, loader,
//! parameter provider, property injector and value mapper) is itself stored as
//! a property. This module fixes where those properties live.

use crate::domain::domain_name::DomainName;
use crate::domain::type_info::ModuleType;
use std::fmt;

/// The engine-wide fallback domain shared by all module types.
pub const GLOBAL_DOMAIN: &str = "modwire.defaults";

/// Suffix of the "class" variant of a lookup property.
pub const CLASS_SUFFIX: &str = ".class";

/// The kind of collaborator being looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Who builds the module
    Provider,
    /// The loader orchestrating construction
    Loader,
    /// Resolves individual parameters and fields
    ParameterProvider,
    /// Populates fields after construction
    PropertyInjector,
    /// Converts property values between types
    ValueMapper,
}

impl LookupKind {
    /// All kinds, in declaration order.
    pub const ALL: [LookupKind; 5] = [
        LookupKind::Provider,
        LookupKind::Loader,
        LookupKind::ParameterProvider,
        LookupKind::PropertyInjector,
        LookupKind::ValueMapper,
    ];

    /// The canonical property name of this kind.
    pub fn property_name(&self) -> &'static str {
        match self {
            LookupKind::Provider => "provider",
            LookupKind::Loader => "loader",
            LookupKind::ParameterProvider => "parameter-provider",
            LookupKind::PropertyInjector => "property-injector",
            LookupKind::ValueMapper => "value-mapper",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.property_name())
    }
}

/// Where a registration is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The module type's own domain.
    Module,
    /// The engine-wide [`GLOBAL_DOMAIN`], with a type-qualified name.
    Global,
}

/// A `(domain, name)` pair naming a lookup property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LookupKey {
    /// The domain to search
    pub domain: DomainName,
    /// The property name within the domain
    pub name: String,
}

impl LookupKey {
    /// The property for `kind` of `module` at `scope`, instance or class variant.
    ///
    /// # Examples
    ///
    /// ```
    /// use modwire::domain::{LookupKey, LookupKind, ModuleType, Scope, GLOBAL_DOMAIN};
    ///
    /// let ty = ModuleType::of::<u8>();
    /// let own = LookupKey::new(&ty, LookupKind::Loader, Scope::Module, false);
    /// assert_eq!(own.domain.as_str(), "u8");
    /// assert_eq!(own.name, "loader");
    ///
    /// let global = LookupKey::new(&ty, LookupKind::Loader, Scope::Global, true);
    /// assert_eq!(global.domain.as_str(), GLOBAL_DOMAIN);
    /// assert_eq!(global.name, "u8.loader.class");
    /// ```
    pub fn new(module: &ModuleType, kind: LookupKind, scope: Scope, class: bool) -> Self {
        let suffix = if class { CLASS_SUFFIX } else { "" };
        match scope {
            Scope::Module => Self {
                domain: module.domain(),
                name: format!("{}{}", kind.property_name(), suffix),
            },
            Scope::Global => Self {
                domain: DomainName::from(GLOBAL_DOMAIN),
                name: format!("{}.{}{}", module.name(), kind.property_name(), suffix),
            },
        }
    }

    /// The canonical search order for `kind`: own instance, own class, global
    /// instance, global class. The flag is `true` for class variants.
    pub fn search_order(module: &ModuleType, kind: LookupKind) -> [(LookupKey, bool); 4] {
        [
            (Self::new(module, kind, Scope::Module, false), false),
            (Self::new(module, kind, Scope::Module, true), true),
            (Self::new(module, kind, Scope::Global, false), false),
            (Self::new(module, kind, Scope::Global, true), true),
        ]
    }
}
