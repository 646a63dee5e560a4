// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the module construction engine.
//!
//! This module defines every error that can be raised while reading configuration
//! domains, resolving a module's construction recipe, or invoking it. All errors
//! use `thiserror` and are propagated synchronously to the caller of the
//! top-level `load`/`inject`/`get_property` operation.

use crate::domain::type_info::ModuleType;
use std::num::{ParseFloatError, ParseIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// Boxed error raised by user supplied factories, builder methods and setters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for the engine.
///
/// The variants fall into three groups:
///
/// - **configuration-domain** errors: duplicate domains, missing or unreadable
///   property files, parse failures;
/// - **resolution** errors: nothing buildable, ambiguous metadata, unresolvable
///   parameters, conversion failures, non-subtype registrations, cycles;
/// - **invocation** errors: a factory itself failed ([`ModuleError::ConstructionFailed`]).
///
/// It is marked as `#[non_exhaustive]` to allow for future additions without
/// breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use modwire::domain::errors::ModuleError;
///
/// fn create() -> Result<(), ModuleError> {
///     Err(ModuleError::DuplicateDomain {
///         domain: "app".to_string(),
///     })
/// }
/// assert!(create().is_err());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModuleError {
    /// A domain was explicitly created twice.
    #[error("Configuration domain already exists: {domain}")]
    DuplicateDomain {
        /// The domain name
        domain: String,
    },

    /// No property file exists for the domain in the configured directory.
    #[error("No property file for domain '{domain}' in {directory}")]
    PropertyFileNotFound {
        /// The domain name
        domain: String,
        /// The directory that was searched
        directory: String,
    },

    /// A property source failed.
    #[error("Property source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// A property file could not be parsed.
    #[error("Failed to parse properties: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<BoxError>,
    },

    /// The module has neither a designated builder constructor nor a zero-argument one.
    #[error("No buildable constructor for module {module}")]
    NoBuildableConstructor {
        /// The module being built
        module: ModuleType,
    },

    /// The provider exposes no builder compatible with the module and is not a subtype of it.
    #[error("Provider {provider} does not expose a compatible builder for module {module}")]
    IncompatibleProvider {
        /// The module being built
        module: ModuleType,
        /// The provider that was found
        provider: ModuleType,
    },

    /// An injection point carries more than one metadata block.
    #[error("Ambiguous metadata on '{point}' of module {module}: {count} property declarations")]
    AmbiguousMetadata {
        /// The module being built
        module: ModuleType,
        /// The injection point label
        point: String,
        /// Number of declarations found
        count: usize,
    },

    /// No value, default or sentinel could resolve an injection point.
    #[error("Cannot resolve parameter '{point}' of module {module}")]
    UnresolvableParameter {
        /// The module being built
        module: ModuleType,
        /// The injection point label
        point: String,
    },

    /// Converting a value to the requested type failed.
    #[error("Failed to convert value for '{key}' to type {target_type}: {source}")]
    TypeConversionError {
        /// The property or injection point being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: BoxError,
    },

    /// No value mapper knows how to convert between the two types.
    #[error("No conversion for '{key}' from {from} to {to}")]
    NoConversion {
        /// The property or injection point being converted
        key: String,
        /// The stored type
        from: String,
        /// The requested type
        to: String,
    },

    /// A registered collaborator or provider is not assignable to the expected type.
    #[error("{candidate} is not assignable to {expected}")]
    NotASubtype {
        /// The type that was required
        expected: String,
        /// The type that was supplied
        candidate: String,
    },

    /// A type was referenced by name but is not in the registry.
    #[error("Unknown module type: {name}")]
    UnknownModule {
        /// The name that was looked up
        name: String,
    },

    /// A value did not hold the expected type.
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// The expected type name
        expected: String,
        /// The actual type name
        actual: String,
    },

    /// The module is already being resolved further up the call stack.
    #[error("Cyclic resolution of {module} through {}", format_chain(.chain))]
    CyclicResolution {
        /// The module that was re-entered
        module: ModuleType,
        /// The in-progress resolution stack, outermost first
        chain: Vec<ModuleType>,
    },

    /// Nested resolution exceeded the configured depth.
    #[error("Resolution of {module} exceeded the maximum depth of {depth}")]
    RecursionLimit {
        /// The module that would have exceeded the limit
        module: ModuleType,
        /// The configured maximum depth
        depth: usize,
    },

    /// A non-public field was assigned without an access guard.
    #[error("Field '{field}' of {module} is not accessible")]
    IllegalAccess {
        /// The owning module
        module: ModuleType,
        /// The field name
        field: String,
    },

    /// The underlying construction call raised an error.
    #[error("Construction of {module} failed: {source}")]
    ConstructionFailed {
        /// The module being built
        module: ModuleType,
        /// The original cause
        source: BoxError,
    },

    /// An I/O error occurred while reading property files.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_chain(chain: &[ModuleType]) -> String {
    chain
        .iter()
        .map(|m| m.name())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ModuleError {
    /// Creates a TypeConversionError from a ParseIntError.
    pub fn from_parse_int_error(key: String, err: ParseIntError) -> Self {
        ModuleError::TypeConversionError {
            key,
            target_type: "integer".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseFloatError.
    pub fn from_parse_float_error(key: String, err: ParseFloatError) -> Self {
        ModuleError::TypeConversionError {
            key,
            target_type: "float".to_string(),
            source: Box::new(err),
        }
    }

    /// Creates a TypeConversionError from a ParseBoolError.
    pub fn from_parse_bool_error(key: String, err: ParseBoolError) -> Self {
        ModuleError::TypeConversionError {
            key,
            target_type: "boolean".to_string(),
            source: Box::new(err),
        }
    }

    /// Wraps an error raised by a user factory.
    ///
    /// Errors that already are a [`ModuleError`] (for example a typed argument
    /// mismatch detected by [`Args`](crate::domain::Args)) pass through unchanged.
    pub fn construction(module: &ModuleType, err: BoxError) -> Self {
        match err.downcast::<ModuleError>() {
            Ok(inner) => *inner,
            Err(source) => ModuleError::ConstructionFailed {
                module: module.clone(),
                source,
            },
        }
    }

    /// Returns `true` for the errors raised by cycle or depth protection.
    pub fn is_recursion(&self) -> bool {
        matches!(
            self,
            ModuleError::CyclicResolution { .. } | ModuleError::RecursionLimit { .. }
        )
    }
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, ModuleError>;
