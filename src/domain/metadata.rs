// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative construction metadata.
//!
//! Metadata is attached to module types (a provider type and default property
//! entries) and to injection points (a constructor or builder parameter, or a
//! field). It is consumed, never produced, by the resolution engine.

use crate::domain::domain_name::DomainName;
use crate::domain::type_info::ModuleType;
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Default literal meaning "resolve to no value".
pub const NULL_SENTINEL: &str = "@@null@@";

/// Default literal meaning "load the declared type as a nested module".
pub const LOAD_SENTINEL: &str = "@@load@@";

/// A `(domain, name, default)` property declaration.
///
/// # Examples
///
/// ```
/// use modwire::domain::{DefaultLiteral, PropertyDecl};
///
/// let decl = PropertyDecl::new("app", "port", "8080");
/// assert_eq!(decl.domain.as_str(), "app");
/// assert_eq!(decl.literal(), DefaultLiteral::Literal("8080"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// The domain holding the property
    pub domain: DomainName,
    /// The property name within the domain
    pub name: String,
    /// The default literal, possibly a sentinel
    #[serde(default)]
    pub default: String,
}

impl PropertyDecl {
    /// Creates a new property declaration.
    pub fn new(
        domain: impl Into<DomainName>,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            default: default.into(),
        }
    }

    /// Interprets the declared default.
    pub fn literal(&self) -> DefaultLiteral<'_> {
        DefaultLiteral::parse(&self.default)
    }

    /// `domain.name`, used in diagnostics.
    pub fn key(&self) -> String {
        format!("{}.{}", self.domain, self.name)
    }
}

/// The meaning of a default-string literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefaultLiteral<'a> {
    /// No literal was declared.
    Empty,
    /// [`NULL_SENTINEL`]: resolve to no value.
    Null,
    /// [`LOAD_SENTINEL`]: load the target type as a nested module.
    Load,
    /// Any other text, converted to the target type.
    Literal(&'a str),
}

impl<'a> DefaultLiteral<'a> {
    /// Classifies a default-string literal.
    pub fn parse(literal: &'a str) -> Self {
        match literal {
            "" => DefaultLiteral::Empty,
            NULL_SENTINEL => DefaultLiteral::Null,
            LOAD_SENTINEL => DefaultLiteral::Load,
            other => DefaultLiteral::Literal(other),
        }
    }
}

/// A constructor/builder parameter or a field that receives a resolved value.
///
/// An injection point without metadata is resolved by loading its target type
/// as a nested module. More than one metadata block is a configuration error
/// reported at resolution time.
#[derive(Clone, Debug)]
pub struct InjectionPoint {
    label: String,
    target: ModuleType,
    metadata: Vec<PropertyDecl>,
}

impl InjectionPoint {
    /// An injection point receiving a `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use modwire::domain::InjectionPoint;
    ///
    /// let port = InjectionPoint::of::<u16>("port").property("app", "port", "8080");
    /// assert_eq!(port.metadata().len(), 1);
    ///
    /// let nested = InjectionPoint::of::<String>("name");
    /// assert!(nested.metadata().is_empty());
    /// ```
    pub fn of<T: Any>(label: impl Into<String>) -> Self {
        Self::for_type(label, ModuleType::of::<T>())
    }

    /// An injection point receiving a value of the given type.
    pub fn for_type(label: impl Into<String>, target: ModuleType) -> Self {
        Self {
            label: label.into(),
            target,
            metadata: Vec::new(),
        }
    }

    /// Attaches a property declaration.
    pub fn property(
        mut self,
        domain: impl Into<DomainName>,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.metadata.push(PropertyDecl::new(domain, name, default));
        self
    }

    /// Attaches an already built declaration.
    pub fn with_decl(mut self, decl: PropertyDecl) -> Self {
        self.metadata.push(decl);
        self
    }

    /// The parameter or field name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The declared type of the injection point.
    pub fn target(&self) -> &ModuleType {
        &self.target
    }

    /// All attached declarations.
    pub fn metadata(&self) -> &[PropertyDecl] {
        &self.metadata
    }
}

/// Per-type construction metadata.
#[derive(Clone, Debug, Default)]
pub struct ModuleMetadata {
    /// The type that builds this module, if declared
    pub provider: Option<ModuleType>,
    /// Defaults used when no live configuration exists
    pub defaults: Vec<PropertyDecl>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_literal_classification() {
        assert_eq!(DefaultLiteral::parse(""), DefaultLiteral::Empty);
        assert_eq!(DefaultLiteral::parse(NULL_SENTINEL), DefaultLiteral::Null);
        assert_eq!(DefaultLiteral::parse(LOAD_SENTINEL), DefaultLiteral::Load);
        assert_eq!(DefaultLiteral::parse("5"), DefaultLiteral::Literal("5"));
    }

    #[test]
    fn test_property_decl_key() {
        let decl = PropertyDecl::new("x", "y", "5");
        assert_eq!(decl.key(), "x.y");
    }

    #[test]
    fn test_injection_point_accumulates_metadata() {
        let point = InjectionPoint::of::<i32>("count")
            .property("a", "b", "1")
            .property("c", "d", "2");
        assert_eq!(point.label(), "count");
        assert_eq!(point.target(), &ModuleType::of::<i32>());
        assert_eq!(point.metadata().len(), 2);
    }

    #[test]
    fn test_property_decl_serde_default() {
        let decl: PropertyDecl =
            serde_json::from_str(r#"{"domain":"app","name":"port"}"#).unwrap();
        assert_eq!(decl.literal(), DefaultLiteral::Empty);
    }
}
