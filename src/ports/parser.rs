// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property file parser trait definition.
//!
//! This module defines the `PropertyParser` trait, which turns the raw content
//! of one domain's property file into a flat key-value map.

use crate::domain::Result;
use std::collections::HashMap;

/// A trait for parsing property files.
///
/// # Examples
///
/// ```rust
/// use modwire::ports::PropertyParser;
/// use modwire::domain::Result;
/// use std::collections::HashMap;
///
/// struct LineParser;
///
/// impl PropertyParser for LineParser {
///     fn parse(&self, content: &str) -> Result<HashMap<String, String>> {
///         Ok(content
///             .lines()
///             .filter_map(|l| l.split_once('='))
///             .map(|(k, v)| (k.to_string(), v.to_string()))
///             .collect())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["lines"]
///     }
/// }
///
/// let parsed = LineParser.parse("a=1\nb=2").unwrap();
/// assert_eq!(parsed.get("b"), Some(&"2".to_string()));
/// ```
pub trait PropertyParser: Send + Sync {
    /// Parses file content into property name/value pairs.
    fn parse(&self, content: &str) -> Result<HashMap<String, String>>;

    /// Returns the file extensions (without the leading dot) this parser reads,
    /// in resolution order after the bare domain name.
    fn supported_extensions(&self) -> &[&str];
}
