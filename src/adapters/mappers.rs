// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default value mapper.
//!
//! Converts textual values to scalar Rust types. Additional target types can be
//! registered with [`DefaultValueMapper::with_parser`].

use crate::domain::{ModuleError, ModuleType, Result, Value};
use crate::ports::ValueMapper;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

type ParseFn = Arc<dyn Fn(&str, &str) -> Result<Value> + Send + Sync>;

/// Type-directed string conversion.
///
/// Out of the box the mapper produces `String`, `bool`, `char`, every integer
/// type and both float types. Booleans accept `true`/`yes`/`1`/`on` and
/// `false`/`no`/`0`/`off`, case-insensitively.
///
/// # Examples
///
/// ```rust
/// use modwire::adapters::DefaultValueMapper;
/// use modwire::domain::{ModuleType, Value};
/// use modwire::ports::ValueMapper;
///
/// let mapper = DefaultValueMapper::new();
/// let port = mapper
///     .map("app.port", &Value::from("8080"), &ModuleType::of::<u16>())
///     .unwrap()
///     .unwrap();
/// assert_eq!(port.get::<u16>(), Some(8080));
/// ```
#[derive(Clone)]
pub struct DefaultValueMapper {
    parsers: HashMap<TypeId, ParseFn>,
}

fn parse_int<T>(key: &str, text: &str) -> Result<Value>
where
    T: FromStr<Err = std::num::ParseIntError> + Into<Value>,
{
    text.trim()
        .parse::<T>()
        .map(Into::into)
        .map_err(|e| ModuleError::from_parse_int_error(key.to_string(), e))
}

fn parse_float<T>(key: &str, text: &str) -> Result<Value>
where
    T: FromStr<Err = std::num::ParseFloatError> + Into<Value>,
{
    text.trim()
        .parse::<T>()
        .map(Into::into)
        .map_err(|e| ModuleError::from_parse_float_error(key.to_string(), e))
}

impl DefaultValueMapper {
    /// Creates a mapper with the built-in scalar conversions.
    pub fn new() -> Self {
        let mut mapper = Self {
            parsers: HashMap::new(),
        };
        mapper.register::<String>(|_, text| Ok(Value::from(text)));
        mapper.register::<bool>(|key, text| Value::from(text).as_bool(key).map(Value::from));
        mapper.register::<char>(|key, text| {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::from(c)),
                _ => Err(ModuleError::TypeConversionError {
                    key: key.to_string(),
                    target_type: "char".to_string(),
                    source: format!("expected exactly one character, got {:?}", text).into(),
                }),
            }
        });
        mapper.register::<i8>(parse_int::<i8>);
        mapper.register::<i16>(parse_int::<i16>);
        mapper.register::<i32>(parse_int::<i32>);
        mapper.register::<i64>(parse_int::<i64>);
        mapper.register::<i128>(parse_int::<i128>);
        mapper.register::<isize>(parse_int::<isize>);
        mapper.register::<u8>(parse_int::<u8>);
        mapper.register::<u16>(parse_int::<u16>);
        mapper.register::<u32>(parse_int::<u32>);
        mapper.register::<u64>(parse_int::<u64>);
        mapper.register::<u128>(parse_int::<u128>);
        mapper.register::<usize>(parse_int::<usize>);
        mapper.register::<f32>(parse_float::<f32>);
        mapper.register::<f64>(parse_float::<f64>);
        mapper
    }

    fn register<T: Any>(
        &mut self,
        f: impl Fn(&str, &str) -> Result<Value> + Send + Sync + 'static,
    ) {
        self.parsers.insert(TypeId::of::<T>(), Arc::new(f));
    }

    /// Adds a conversion to any `FromStr` type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modwire::adapters::DefaultValueMapper;
    /// use modwire::domain::ModuleType;
    /// use modwire::ports::ValueMapper;
    /// use std::net::IpAddr;
    ///
    /// let mapper = DefaultValueMapper::new().with_parser::<IpAddr>();
    /// let ip = mapper
    ///     .parse("net.bind", "127.0.0.1", &ModuleType::of::<IpAddr>())
    ///     .unwrap()
    ///     .unwrap();
    /// assert!(ip.get::<IpAddr>().unwrap().is_loopback());
    /// ```
    pub fn with_parser<T>(mut self) -> Self
    where
        T: FromStr + fmt::Display + Any + Send + Sync,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.register::<T>(|key, text| {
            text.trim()
                .parse::<T>()
                .map(Value::textual)
                .map_err(|e| ModuleError::TypeConversionError {
                    key: key.to_string(),
                    target_type: std::any::type_name::<T>().to_string(),
                    source: Box::new(e),
                })
        });
        self
    }

    /// Returns `true` if the mapper can produce `target` from text.
    pub fn supports(&self, target: &ModuleType) -> bool {
        self.parsers.contains_key(&target.id())
    }
}

impl Default for DefaultValueMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultValueMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultValueMapper")
            .field("targets", &self.parsers.len())
            .finish()
    }
}

impl ValueMapper for DefaultValueMapper {
    fn map(&self, key: &str, value: &Value, target: &ModuleType) -> Result<Option<Value>> {
        if value.is_type(target) {
            return Ok(Some(value.clone()));
        }
        match value.as_text() {
            Some(text) => self.parse(key, text, target),
            None => Ok(None),
        }
    }

    fn parse(&self, key: &str, literal: &str, target: &ModuleType) -> Result<Option<Value>> {
        match self.parsers.get(&target.id()) {
            Some(parse) => parse(key, literal).map(Some),
            None => Ok(None),
        }
    }
}
