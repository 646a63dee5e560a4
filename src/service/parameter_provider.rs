// SPDX-License-Identifier: MIT OR Apache-2.0

//! The default parameter provider.

use super::registry::ModuleRegistry;
use super::resolution::Resolution;
use crate::domain::{
    DefaultLiteral, DefaultProperties, InjectionPoint, ModuleError, ModuleType, Result, Value,
    LOAD_SENTINEL, NULL_SENTINEL,
};
use crate::ports::{ParameterProvider, ValueMapper};
use tracing::trace;

/// Resolves injection points from configuration, defaults and sentinels.
///
/// For a point with one property declaration `(domain, name, default)`:
///
/// 1. a value found through the active locator, coerced to the point's type;
/// 2. else an entry for `(domain, name)` in the module's default table,
///    returned as-is when it already has the point's type, or used as the
///    default literal otherwise;
/// 3. else the declared default literal: [`NULL_SENTINEL`] resolves to no
///    value, [`LOAD_SENTINEL`] loads the point's type as a nested module, any
///    other text is parsed by the value mapper.
///
/// A point with no declaration is loaded as a nested module. A point with more
/// than one declaration fails with [`ModuleError::AmbiguousMetadata`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultParameterProvider;

impl DefaultParameterProvider {
    /// Creates the provider.
    pub fn new() -> Self {
        Self
    }
}

impl ParameterProvider for DefaultParameterProvider {
    fn resolve(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        point: &InjectionPoint,
        defaults: &DefaultProperties,
    ) -> Result<Option<Value>> {
        let target = point.target();
        let decl = match point.metadata() {
            [] => {
                trace!("{} of {} is a nested module", point.label(), module);
                return res.load(target).map(Some);
            }
            [decl] => decl,
            many => {
                return Err(ModuleError::AmbiguousMetadata {
                    module: *module,
                    point: point.label().to_string(),
                    count: many.len(),
                })
            }
        };

        let key = decl.key();
        let mapper = res.value_mapper_for(module)?;
        if let Some(value) = res.locator().get_property(&decl.domain, &decl.name)? {
            trace!("{} of {} found at {}", point.label(), module, key);
            return coerce(res.registry(), &*mapper, &key, &value, target).map(Some);
        }

        let literal = match defaults.get(&decl.domain, &decl.name) {
            Some(value) if value.is_type(target) && !is_sentinel(value) => {
                return Ok(Some(value.clone()));
            }
            Some(value) => value.as_text().unwrap_or(decl.default.as_str()),
            None => decl.default.as_str(),
        };

        match DefaultLiteral::parse(literal) {
            DefaultLiteral::Null => Ok(None),
            DefaultLiteral::Load => res.load(target).map(Some),
            DefaultLiteral::Literal(text) => mapper
                .parse(&key, text, target)?
                .map(Some)
                .ok_or_else(|| ModuleError::NoConversion {
                    key: key.clone(),
                    from: "string literal".to_string(),
                    to: target.name().to_string(),
                }),
            DefaultLiteral::Empty => Err(ModuleError::UnresolvableParameter {
                module: *module,
                point: point.label().to_string(),
            }),
        }
    }
}

fn is_sentinel(value: &Value) -> bool {
    matches!(value.as_text(), Some(NULL_SENTINEL) | Some(LOAD_SENTINEL))
}

/// Converts a found value to `target`: unchanged if the type matches, upcast
/// if the registry declares the relation, else through `mapper`.
pub(crate) fn coerce(
    registry: &ModuleRegistry,
    mapper: &dyn ValueMapper,
    key: &str,
    value: &Value,
    target: &ModuleType,
) -> Result<Value> {
    if value.is_type(target) {
        return Ok(value.clone());
    }
    if registry.is_assignable(&value.type_info(), target) {
        return registry.upcast(value, target);
    }
    mapper
        .map(key, value, target)?
        .ok_or_else(|| ModuleError::NoConversion {
            key: key.to_string(),
            from: value.type_info().name().to_string(),
            to: target.name().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DefaultValueMapper, PropertyMap, SourceLocator};
    use crate::domain::ModuleDescriptor;
    use crate::service::Runtime;
    use std::sync::Arc;

    #[derive(Default)]
    struct Nested;

    struct Owner;

    fn runtime() -> Runtime {
        let runtime = Runtime::default();
        runtime
            .registry()
            .register(ModuleDescriptor::default_constructible::<Nested>());
        runtime
    }

    fn resolve(
        config: PropertyMap,
        point: InjectionPoint,
        defaults: &DefaultProperties,
    ) -> Result<Option<Value>> {
        let runtime = runtime();
        let locator = SourceLocator::new(Arc::new(config), Arc::new(PropertyMap::new()));
        let res = Resolution::new(&runtime, &locator);
        DefaultParameterProvider.resolve(&res, &ModuleType::of::<Owner>(), &point, defaults)
    }

    #[test]
    fn test_configured_value_is_coerced() {
        let point = InjectionPoint::of::<u16>("port").property("app", "port", "80");
        let config = PropertyMap::new().with("app", "port", "8080");
        let value = resolve(config, point, &DefaultProperties::new()).unwrap().unwrap();
        assert_eq!(value.get::<u16>(), Some(8080));
    }

    #[test]
    fn test_literal_default() {
        let point = InjectionPoint::of::<i32>("y").property("x", "y", "5");
        let value = resolve(PropertyMap::new(), point, &DefaultProperties::new())
            .unwrap()
            .unwrap();
        assert_eq!(value.get::<i32>(), Some(5));
    }

    #[test]
    fn test_null_sentinel() {
        let point = InjectionPoint::of::<String>("name").property("app", "name", NULL_SENTINEL);
        assert!(resolve(PropertyMap::new(), point, &DefaultProperties::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_sentinel_and_missing_metadata() {
        let sentinel = InjectionPoint::of::<Nested>("n").property("app", "n", LOAD_SENTINEL);
        let value = resolve(PropertyMap::new(), sentinel, &DefaultProperties::new())
            .unwrap()
            .unwrap();
        assert!(value.is::<Nested>());

        let bare = InjectionPoint::of::<Nested>("n");
        let value = resolve(PropertyMap::new(), bare, &DefaultProperties::new())
            .unwrap()
            .unwrap();
        assert!(value.is::<Nested>());
    }

    #[test]
    fn test_ambiguous_metadata() {
        let point = InjectionPoint::of::<i32>("n")
            .property("a", "n", "1")
            .property("b", "n", "2");
        let err = resolve(PropertyMap::new(), point, &DefaultProperties::new()).unwrap_err();
        assert!(matches!(err, ModuleError::AmbiguousMetadata { count: 2, .. }));
    }

    #[test]
    fn test_empty_default_is_unresolvable() {
        let point = InjectionPoint::of::<i32>("n").property("a", "n", "");
        let err = resolve(PropertyMap::new(), point, &DefaultProperties::new()).unwrap_err();
        assert!(matches!(err, ModuleError::UnresolvableParameter { .. }));
    }

    #[test]
    fn test_bad_literal_is_a_conversion_error() {
        let point = InjectionPoint::of::<i32>("n").property("a", "n", "five");
        let err = resolve(PropertyMap::new(), point, &DefaultProperties::new()).unwrap_err();
        assert!(matches!(err, ModuleError::TypeConversionError { .. }));
    }

    #[test]
    fn test_defaults_table() {
        let mut defaults = DefaultProperties::new();
        defaults.insert("app", "port", Value::from(9000u16));
        defaults.insert("app", "retries", Value::from("3"));
        defaults.insert("app", "name", Value::from(NULL_SENTINEL));

        let typed = InjectionPoint::of::<u16>("port").property("app", "port", "80");
        let value = resolve(PropertyMap::new(), typed, &defaults).unwrap().unwrap();
        assert_eq!(value.get::<u16>(), Some(9000));

        // a string entry becomes the literal for a non-string point
        let parsed = InjectionPoint::of::<u8>("retries").property("app", "retries", "1");
        let value = resolve(PropertyMap::new(), parsed, &defaults).unwrap().unwrap();
        assert_eq!(value.get::<u8>(), Some(3));

        let sentinel = InjectionPoint::of::<String>("name").property("app", "name", "anon");
        assert!(resolve(PropertyMap::new(), sentinel, &defaults).unwrap().is_none());
    }

    #[test]
    fn test_coerce_without_conversion() {
        let registry = ModuleRegistry::new();
        let mapper = DefaultValueMapper::new();
        let err = coerce(
            &registry,
            &mapper,
            "app.n",
            &Value::new(Nested),
            &ModuleType::of::<i32>(),
        )
        .unwrap_err();
        assert!(matches!(err, ModuleError::NoConversion { .. }));
    }
}
