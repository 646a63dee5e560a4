// SPDX-License-Identifier: MIT OR Apache-2.0

//! Untyped property and instance values.
//!
//! Properties are untyped at rest: a [`Value`] can hold a string, a number, a
//! reference to a [`ModuleType`], a provider instance, or a fully-built module.
//! Callers request a target type and may receive a coerced value.

use crate::domain::errors::{ModuleError, Result};
use crate::domain::type_info::ModuleType;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared, dynamically typed value.
///
/// `Value` wraps an `Arc<dyn Any + Send + Sync>` together with the
/// [`ModuleType`] of the wrapped data. Values built from strings, numbers,
/// booleans, chars and module types also keep their textual form, which is what
/// value mappers parse when a value of one type is requested as another.
///
/// Cloning a `Value` is cheap and shares the underlying allocation.
///
/// # Equality
///
/// Two values are equal when they share the same allocation, or when they hold
/// the same type and have equal textual forms. Values without a textual form
/// compare by identity only.
///
/// # Examples
///
/// ```
/// use modwire::domain::Value;
///
/// let port = Value::from(8080);
/// assert_eq!(port.get::<i32>(), Some(8080));
/// assert_eq!(port.as_text(), Some("8080"));
/// ```
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_info: ModuleType,
    text: Option<Arc<str>>,
}

impl Value {
    /// Wraps an arbitrary value. No textual form is recorded.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_info: ModuleType::of::<T>(),
            text: None,
        }
    }

    /// Wraps a value and records its `Display` form as its text.
    pub fn textual<T: Any + Send + Sync + fmt::Display>(value: T) -> Self {
        let text: Arc<str> = Arc::from(value.to_string());
        Self {
            inner: Arc::new(value),
            type_info: ModuleType::of::<T>(),
            text: Some(text),
        }
    }

    /// Wraps a reference to a module type (a "class" value).
    pub fn of_type(module: ModuleType) -> Self {
        Self::textual(module)
    }

    /// The type of the wrapped data.
    pub fn type_info(&self) -> ModuleType {
        self.type_info
    }

    /// Returns `true` if the wrapped data is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_info.is::<T>()
    }

    /// Returns `true` if the wrapped data has the given type.
    pub fn is_type(&self, module: &ModuleType) -> bool {
        self.type_info == *module
    }

    /// Borrows the wrapped data as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns the shared wrapped data as an `Arc<T>`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Returns a clone of the wrapped data as a `T`.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Like [`Value::downcast`], but reports a [`ModuleError::TypeMismatch`].
    pub fn expect_arc<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.downcast::<T>().ok_or_else(|| ModuleError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: self.type_info.name().to_string(),
        })
    }

    /// The textual form, if one was recorded.
    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The module type this value refers to, if it is a class value.
    pub fn as_module_type(&self) -> Option<ModuleType> {
        self.get::<ModuleType>()
    }

    /// Returns `true` if both values share the same allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn text_for(&self, key: &str, target: &str) -> Result<&str> {
        self.as_text().ok_or_else(|| ModuleError::NoConversion {
            key: key.to_string(),
            from: self.type_info.name().to_string(),
            to: target.to_string(),
        })
    }

    /// Converts the value to a boolean.
    ///
    /// Recognizes the following textual values (case-insensitive):
    /// - `true`: "true", "yes", "1", "on"
    /// - `false`: "false", "no", "0", "off"
    ///
    /// # Examples
    ///
    /// ```
    /// use modwire::domain::Value;
    ///
    /// assert!(Value::from("yes").as_bool("app.debug").unwrap());
    /// assert!(!Value::from(false).as_bool("app.debug").unwrap());
    /// ```
    pub fn as_bool(&self, key: &str) -> Result<bool> {
        if let Some(b) = self.downcast_ref::<bool>() {
            return Ok(*b);
        }
        let text = self.text_for(key, "bool")?;
        match text.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => text
                .parse::<bool>()
                .map_err(|e| ModuleError::from_parse_bool_error(key.to_string(), e)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (&self.text, &other.text) {
            (Some(a), Some(b)) => self.type_info == other.type_info && a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Value");
        s.field("type", &self.type_info.name());
        if let Some(text) = &self.text {
            s.field("text", &&**text);
        }
        s.finish()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::textual(s.to_string())
    }
}

impl From<ModuleType> for Value {
    fn from(module: ModuleType) -> Self {
        Value::of_type(module)
    }
}

macro_rules! textual_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::textual(v)
                }
            }
        )*
    };
}

textual_from!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);
