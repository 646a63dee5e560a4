// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime identity of module types.

use crate::domain::domain_name::DomainName;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a Rust type participating in module construction.
///
/// Two `ModuleType`s are equal when their [`TypeId`]s are equal; the name is
/// carried for diagnostics, for naming the type's configuration domain, and for
/// looking types up from textual configuration.
///
/// # Examples
///
/// ```
/// use modwire::domain::ModuleType;
///
/// struct Widget;
///
/// let ty = ModuleType::of::<Widget>();
/// assert_eq!(ty, ModuleType::of::<Widget>());
/// assert!(ty.name().ends_with("Widget"));
/// ```
#[derive(Clone, Copy)]
pub struct ModuleType {
    id: TypeId,
    name: &'static str,
}

impl ModuleType {
    /// Returns the module type of `T`.
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The fully-qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this is the type of `T`.
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The configuration domain named after this type.
    pub fn domain(&self) -> DomainName {
        DomainName::from(self.name)
    }
}

impl PartialEq for ModuleType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModuleType {}

impl Hash for ModuleType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleType({})", self.name)
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Widget;
    struct Gadget;

    #[test]
    fn test_module_type_equality() {
        assert_eq!(ModuleType::of::<Widget>(), ModuleType::of::<Widget>());
        assert_ne!(ModuleType::of::<Widget>(), ModuleType::of::<Gadget>());
    }

    #[test]
    fn test_module_type_is() {
        let ty = ModuleType::of::<Widget>();
        assert!(ty.is::<Widget>());
        assert!(!ty.is::<Gadget>());
    }

    #[test]
    fn test_module_type_domain_uses_type_name() {
        let ty = ModuleType::of::<u32>();
        assert_eq!(ty.domain().as_str(), "u32");
    }

    #[test]
    fn test_module_type_hash() {
        let mut set = HashSet::new();
        set.insert(ModuleType::of::<Widget>());
        set.insert(ModuleType::of::<Widget>());
        set.insert(ModuleType::of::<Gadget>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_module_type_unsized() {
        let ty = ModuleType::of::<dyn std::fmt::Debug>();
        assert!(ty.name().contains("Debug"));
    }
}
