// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value mapper trait definition.
//!
//! A value mapper coerces a stored [`Value`] into a requested type, and parses
//! default-string literals declared in metadata.

use crate::domain::{ModuleType, Result, Value};
use std::sync::Arc;

/// Converts values between types.
///
/// Both methods return `Ok(None)` when this mapper does not know how to produce
/// the target type at all, and an error when it knows how but the input is
/// malformed.
pub trait ValueMapper: Send + Sync {
    /// Converts `value` into a value of type `target`.
    ///
    /// `key` names the property being converted and is used in errors.
    fn map(&self, key: &str, value: &Value, target: &ModuleType) -> Result<Option<Value>>;

    /// Parses `literal` into a value of type `target`.
    fn parse(&self, key: &str, literal: &str, target: &ModuleType) -> Result<Option<Value>>;
}

/// Shared handle to a value mapper.
pub type SharedValueMapper = Arc<dyn ValueMapper>;

#[cfg(test)]
mod tests {
    use super::*;

    // Upper-cases strings; knows nothing else.
    struct UpperMapper;

    impl ValueMapper for UpperMapper {
        fn map(&self, key: &str, value: &Value, target: &ModuleType) -> Result<Option<Value>> {
            match value.as_text() {
                Some(text) => self.parse(key, text, target),
                None => Ok(None),
            }
        }

        fn parse(&self, _key: &str, literal: &str, target: &ModuleType) -> Result<Option<Value>> {
            if target.is::<String>() {
                Ok(Some(Value::from(literal.to_uppercase())))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn test_mapper_known_target() {
        let mapper: SharedValueMapper = Arc::new(UpperMapper);
        let out = mapper
            .map("k", &Value::from("abc"), &ModuleType::of::<String>())
            .unwrap();
        assert_eq!(out, Some(Value::from("ABC")));
    }

    #[test]
    fn test_mapper_unknown_target() {
        let mapper = UpperMapper;
        let out = mapper.parse("k", "1", &ModuleType::of::<i32>()).unwrap();
        assert!(out.is_none());
    }
}
