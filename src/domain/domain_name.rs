// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain name newtype for type-safe namespace handling.
//!
//! A domain groups related properties. By convention a domain is named after the
//! fully-qualified name of the type whose properties it holds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A type-safe wrapper for configuration domain names.
///
/// # Examples
///
/// ```
/// use modwire::domain::DomainName;
///
/// let domain = DomainName::from("app");
/// assert_eq!(domain.as_str(), "app");
///
/// let typed = DomainName::of::<u16>();
/// assert_eq!(typed.as_str(), "u16");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    /// Creates a new `DomainName` from a `String`.
    pub fn new(name: String) -> Self {
        DomainName(name)
    }

    /// Returns the domain named after the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        DomainName(std::any::type_name::<T>().to_string())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the `DomainName` into its inner `String`.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for DomainName {
    fn from(s: String) -> Self {
        DomainName(s)
    }
}

impl From<&str> for DomainName {
    fn from(s: &str) -> Self {
        DomainName(s.to_string())
    }
}

impl From<&DomainName> for DomainName {
    fn from(d: &DomainName) -> Self {
        d.clone()
    }
}

impl From<DomainName> for String {
    fn from(name: DomainName) -> Self {
        name.0
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
