// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit construction recipes for module types.
//!
//! Rust has no runtime reflection, so every type the engine builds is described
//! by a [`ModuleDescriptor`]: its metadata, its constructors, the builder
//! methods it exposes when acting as a provider, its injectable fields, and the
//! types it may be upcast to. Descriptors are registered once at startup in a
//! [`ModuleRegistry`](crate::service::ModuleRegistry).

use crate::domain::errors::{BoxError, ModuleError, Result};
use crate::domain::metadata::{InjectionPoint, ModuleMetadata, PropertyDecl};
use crate::domain::type_info::ModuleType;
use crate::domain::value::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type FactoryFn = Arc<dyn Fn(&Args) -> std::result::Result<Value, BoxError> + Send + Sync>;
type MethodFn =
    Arc<dyn Fn(Option<&Value>, &Args) -> std::result::Result<Value, BoxError> + Send + Sync>;
type SetterFn = Arc<dyn Fn(&Value, Option<Value>) -> std::result::Result<(), BoxError> + Send + Sync>;
type UpcastFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Resolved arguments handed to a factory, builder method or setter.
///
/// Each position holds the value resolved for the matching injection point, or
/// `None` when the point resolved to null.
///
/// # Examples
///
/// ```
/// use modwire::domain::{Args, Value};
///
/// let args = Args::new(vec![Some(Value::from(8080u16)), None]);
/// assert_eq!(args.get::<u16>(0).unwrap(), 8080);
/// assert_eq!(args.opt::<String>(1).unwrap(), None);
/// assert!(args.get::<String>(1).is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Args {
    values: Vec<Option<Value>>,
}

impl Args {
    /// Wraps resolved values.
    pub fn new(values: Vec<Option<Value>>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value at `index`.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    fn missing<T>(&self, index: usize) -> ModuleError {
        ModuleError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: format!("null at argument {}", index),
        }
    }

    /// The shared value at `index`; null is an error.
    pub fn arc<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        match self.value(index) {
            Some(v) => v.expect_arc::<T>(),
            None => Err(self.missing::<T>(index)),
        }
    }

    /// A clone of the value at `index`; null is an error.
    pub fn get<T: Any + Clone>(&self, index: usize) -> Result<T> {
        self.opt::<T>(index)?
            .ok_or_else(|| self.missing::<T>(index))
    }

    /// A clone of the value at `index`, or `None` if it resolved to null.
    pub fn opt<T: Any + Clone>(&self, index: usize) -> Result<Option<T>> {
        match self.value(index) {
            None => Ok(None),
            Some(v) => v
                .get::<T>()
                .map(Some)
                .ok_or_else(|| ModuleError::TypeMismatch {
                    expected: std::any::type_name::<T>().to_string(),
                    actual: v.type_info().name().to_string(),
                }),
        }
    }
}

/// A constructor of a module type.
#[derive(Clone)]
pub struct Constructor {
    designated: bool,
    params: Vec<InjectionPoint>,
    factory: FactoryFn,
}

impl Constructor {
    /// Whether this constructor is tagged as the designated builder.
    pub fn is_designated(&self) -> bool {
        self.designated
    }

    /// The constructor's parameters.
    pub fn params(&self) -> &[InjectionPoint] {
        &self.params
    }

    /// Invokes the constructor, wrapping factory failures.
    pub fn invoke(&self, module: &ModuleType, args: &Args) -> Result<Value> {
        (self.factory)(args).map_err(|e| ModuleError::construction(module, e))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("designated", &self.designated)
            .field("params", &self.params)
            .finish()
    }
}

/// Whether a builder method needs a provider instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receiver {
    /// Invoked on an instance of the provider.
    Instance,
    /// Invoked without a provider instance.
    Static,
}

/// A method tagged as the module-building operation of a provider.
#[derive(Clone)]
pub struct BuilderMethod {
    name: String,
    receiver: Receiver,
    returns: ModuleType,
    params: Vec<InjectionPoint>,
    invoke: MethodFn,
}

impl BuilderMethod {
    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance or static.
    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    /// The declared return type.
    pub fn returns(&self) -> &ModuleType {
        &self.returns
    }

    /// The method's parameters.
    pub fn params(&self) -> &[InjectionPoint] {
        &self.params
    }

    /// Invokes the method, wrapping failures.
    ///
    /// `receiver` must be a provider instance for [`Receiver::Instance`] methods
    /// and is ignored for static ones.
    pub fn invoke(
        &self,
        module: &ModuleType,
        receiver: Option<&Value>,
        args: &Args,
    ) -> Result<Value> {
        (self.invoke)(receiver, args).map_err(|e| ModuleError::construction(module, e))
    }
}

impl fmt::Debug for BuilderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderMethod")
            .field("name", &self.name)
            .field("receiver", &self.receiver)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Declaration of an injectable field.
///
/// Fields are private unless marked [`FieldSpec::public`]; private fields can
/// only be assigned while an [`AccessGuard`] is held.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    name: String,
    point: InjectionPoint,
    is_static: bool,
    is_final: bool,
    public: bool,
}

impl FieldSpec {
    /// A private, non-static, non-final field.
    pub fn new(name: impl Into<String>, point: InjectionPoint) -> Self {
        Self {
            name: name.into(),
            point,
            is_static: false,
            is_final: false,
            public: false,
        }
    }

    /// Marks the field as publicly assignable.
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Marks the field as belonging to the type rather than the instance.
    pub fn static_field(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the field as assign-once.
    pub fn final_field(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// An injectable field of a module type.
pub struct Field {
    spec: FieldSpec,
    grants: AtomicUsize,
    setter: SetterFn,
}

impl Field {
    /// The field name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The field's injection point.
    pub fn point(&self) -> &InjectionPoint {
        &self.spec.point
    }

    /// Whether the field is static.
    pub fn is_static(&self) -> bool {
        self.spec.is_static
    }

    /// Whether the field is final.
    pub fn is_final(&self) -> bool {
        self.spec.is_final
    }

    /// Whether the field was declared public.
    pub fn is_public(&self) -> bool {
        self.spec.public
    }

    /// Non-static, non-final and tagged with metadata.
    pub fn is_injectable(&self) -> bool {
        !self.spec.is_static && !self.spec.is_final && !self.spec.point.metadata().is_empty()
    }

    /// Whether the field can currently be assigned.
    pub fn is_accessible(&self) -> bool {
        self.spec.public || self.grants.load(Ordering::Acquire) > 0
    }

    /// Relaxes accessibility until the returned guard is dropped.
    pub fn grant_access(&self) -> AccessGuard<'_> {
        let granted = !self.spec.public;
        if granted {
            self.grants.fetch_add(1, Ordering::AcqRel);
        }
        AccessGuard {
            field: self,
            granted,
        }
    }

    /// Assigns `value` to the field of `instance`.
    pub fn assign(&self, owner: &ModuleType, instance: &Value, value: Option<Value>) -> Result<()> {
        if !self.is_accessible() {
            return Err(ModuleError::IllegalAccess {
                module: *owner,
                field: self.spec.name.clone(),
            });
        }
        (self.setter)(instance, value).map_err(|e| ModuleError::construction(owner, e))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("spec", &self.spec)
            .field("accessible", &self.is_accessible())
            .finish()
    }
}

/// Scoped access to a private field; restores the original accessibility on drop.
pub struct AccessGuard<'a> {
    field: &'a Field,
    granted: bool,
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        if self.granted {
            self.field.grants.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Everything the engine knows about one module type.
pub struct ModuleDescriptor {
    module: ModuleType,
    metadata: ModuleMetadata,
    constructors: Vec<Constructor>,
    builders: Vec<BuilderMethod>,
    fields: Vec<Field>,
    upcasts: Vec<(ModuleType, UpcastFn)>,
}

impl ModuleDescriptor {
    /// Starts describing `T`.
    pub fn builder<T: Any + Send + Sync>() -> DescriptorBuilder<T> {
        DescriptorBuilder::new()
    }

    /// Describes a `T` built by `T::default()` with no other metadata.
    pub fn default_constructible<T: Any + Send + Sync + Default>() -> Self {
        Self::builder::<T>().default_constructor().build()
    }

    /// The described type.
    pub fn module(&self) -> &ModuleType {
        &self.module
    }

    /// Provider type and default properties.
    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    /// All constructors, in declaration order.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// All builder methods, in declaration order.
    pub fn builders(&self) -> &[BuilderMethod] {
        &self.builders
    }

    /// Fields declared directly on this type.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The types this one may be upcast to (excluding itself).
    pub fn supertypes(&self) -> impl Iterator<Item = &ModuleType> {
        self.upcasts.iter().map(|(ty, _)| ty)
    }

    /// Whether a `module` value may stand in for a `target` value.
    pub fn is_assignable_to(&self, target: &ModuleType) -> bool {
        self.module == *target || self.upcasts.iter().any(|(ty, _)| ty == target)
    }

    /// Converts an instance of this type into an instance of `target`.
    ///
    /// Returns `None` if `target` is not a declared supertype.
    pub fn upcast(&self, value: &Value, target: &ModuleType) -> Option<Result<Value>> {
        if self.module == *target {
            return Some(Ok(value.clone()));
        }
        self.upcasts
            .iter()
            .find(|(ty, _)| ty == target)
            .map(|(_, f)| f(value))
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("module", &self.module)
            .field("metadata", &self.metadata)
            .field("constructors", &self.constructors)
            .field("builders", &self.builders)
            .field("fields", &self.fields)
            .field("supertypes", &self.supertypes().collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent builder for a [`ModuleDescriptor`].
///
/// # Examples
///
/// ```
/// use modwire::domain::{InjectionPoint, ModuleDescriptor};
///
/// struct Server {
///     port: u16,
/// }
///
/// let descriptor = ModuleDescriptor::builder::<Server>()
///     .default_property("app", "port", "8080")
///     .builder_constructor(
///         vec![InjectionPoint::of::<u16>("port").property("app", "port", "")],
///         |args| Ok(Server { port: args.get(0)? }),
///     )
///     .build();
///
/// assert_eq!(descriptor.constructors().len(), 1);
/// assert!(descriptor.constructors()[0].is_designated());
/// ```
pub struct DescriptorBuilder<T> {
    descriptor: ModuleDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> DescriptorBuilder<T> {
    fn new() -> Self {
        Self {
            descriptor: ModuleDescriptor {
                module: ModuleType::of::<T>(),
                metadata: ModuleMetadata::default(),
                constructors: Vec::new(),
                builders: Vec::new(),
                fields: Vec::new(),
                upcasts: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Declares `P` as the provider of this module.
    pub fn provider<P: Any + ?Sized>(self) -> Self {
        self.provider_type(ModuleType::of::<P>())
    }

    /// Declares the provider of this module by type.
    pub fn provider_type(mut self, provider: ModuleType) -> Self {
        self.descriptor.metadata.provider = Some(provider);
        self
    }

    /// Adds a default property entry.
    pub fn default_property(
        mut self,
        domain: impl Into<crate::domain::DomainName>,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.descriptor
            .metadata
            .defaults
            .push(PropertyDecl::new(domain, name, default));
        self
    }

    fn push_constructor<F>(mut self, designated: bool, params: Vec<InjectionPoint>, f: F) -> Self
    where
        F: Fn(&Args) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |args: &Args| f(args).map(Value::new));
        self.descriptor.constructors.push(Constructor {
            designated,
            params,
            factory,
        });
        self
    }

    /// Adds an ordinary constructor.
    pub fn constructor<F>(self, params: Vec<InjectionPoint>, f: F) -> Self
    where
        F: Fn(&Args) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(false, params, f)
    }

    /// Adds the constructor tagged as the designated builder.
    pub fn builder_constructor<F>(self, params: Vec<InjectionPoint>, f: F) -> Self
    where
        F: Fn(&Args) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.push_constructor(true, params, f)
    }

    /// Adds a zero-argument constructor backed by `T::default()`.
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.push_constructor(false, Vec::new(), |_| Ok(T::default()))
    }

    /// Adds an instance builder method producing an `R`.
    pub fn instance_builder<R, F>(
        mut self,
        name: impl Into<String>,
        params: Vec<InjectionPoint>,
        f: F,
    ) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&T, &Args) -> std::result::Result<R, BoxError> + Send + Sync + 'static,
    {
        let name = name.into();
        let method = name.clone();
        let invoke: MethodFn = Arc::new(move |receiver: Option<&Value>, args: &Args| {
            let receiver = receiver.ok_or_else(|| ModuleError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: format!("no receiver for instance builder '{}'", method),
            })?;
            let this = receiver.expect_arc::<T>()?;
            f(&*this, args).map(Value::new)
        });
        self.descriptor.builders.push(BuilderMethod {
            name,
            receiver: Receiver::Instance,
            returns: ModuleType::of::<R>(),
            params,
            invoke,
        });
        self
    }

    /// Adds a static builder method producing an `R`.
    pub fn static_builder<R, F>(
        mut self,
        name: impl Into<String>,
        params: Vec<InjectionPoint>,
        f: F,
    ) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&Args) -> std::result::Result<R, BoxError> + Send + Sync + 'static,
    {
        let invoke: MethodFn =
            Arc::new(move |_: Option<&Value>, args: &Args| f(args).map(Value::new));
        self.descriptor.builders.push(BuilderMethod {
            name: name.into(),
            receiver: Receiver::Static,
            returns: ModuleType::of::<R>(),
            params,
            invoke,
        });
        self
    }

    /// Adds an injectable field receiving a `V`.
    ///
    /// `T` needs interior mutability for the setter to store the value.
    pub fn field<V, F>(mut self, spec: FieldSpec, setter: F) -> Self
    where
        V: Any + Clone,
        F: Fn(&T, Option<V>) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        let setter: SetterFn = Arc::new(move |instance: &Value, value: Option<Value>| {
            let this = instance.expect_arc::<T>()?;
            let value = match value {
                None => None,
                Some(v) => Some(v.get::<V>().ok_or_else(|| ModuleError::TypeMismatch {
                    expected: std::any::type_name::<V>().to_string(),
                    actual: v.type_info().name().to_string(),
                })?),
            };
            setter(&*this, value)
        });
        self.descriptor.fields.push(Field {
            spec,
            grants: AtomicUsize::new(0),
            setter,
        });
        self
    }

    /// Declares that a `T` can stand in for an `S`, converting with `f`.
    pub fn assignable_to<S, F>(mut self, f: F) -> Self
    where
        S: Any + Send + Sync,
        F: Fn(Arc<T>) -> S + Send + Sync + 'static,
    {
        let upcast: UpcastFn = Arc::new(move |value: &Value| {
            let this = value.expect_arc::<T>()?;
            Ok(Value::new(f(this)))
        });
        self.descriptor
            .upcasts
            .push((ModuleType::of::<S>(), upcast));
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> ModuleDescriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Default)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[derive(Default)]
    struct Counter {
        count: Mutex<Option<i32>>,
    }

    #[test]
    fn test_default_constructible() {
        let descriptor = ModuleDescriptor::default_constructible::<English>();
        assert_eq!(descriptor.module(), &ModuleType::of::<English>());
        assert_eq!(descriptor.constructors().len(), 1);
        assert!(descriptor.constructors()[0].params().is_empty());
        assert!(!descriptor.constructors()[0].is_designated());

        let value = descriptor.constructors()[0]
            .invoke(descriptor.module(), &Args::default())
            .unwrap();
        assert!(value.is::<English>());
    }

    #[test]
    fn test_upcast_to_declared_supertype() {
        let descriptor = ModuleDescriptor::builder::<English>()
            .default_constructor()
            .assignable_to::<Arc<dyn Greeter>, _>(|e| e as Arc<dyn Greeter>)
            .build();

        let target = ModuleType::of::<Arc<dyn Greeter>>();
        assert!(descriptor.is_assignable_to(&target));

        let value = Value::new(English);
        let upcast = descriptor.upcast(&value, &target).unwrap().unwrap();
        let greeter = upcast.get::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "hello");

        assert!(descriptor.upcast(&value, &ModuleType::of::<u8>()).is_none());
    }

    #[test]
    fn test_instance_builder_requires_receiver() {
        let descriptor = ModuleDescriptor::builder::<English>()
            .instance_builder::<String, _>("name", vec![], |e, _| Ok(e.greet()))
            .build();
        let method = &descriptor.builders()[0];
        assert_eq!(method.receiver(), Receiver::Instance);
        assert_eq!(method.returns(), &ModuleType::of::<String>());

        let err = method
            .invoke(descriptor.module(), None, &Args::default())
            .unwrap_err();
        assert!(matches!(err, ModuleError::TypeMismatch { .. }));

        let receiver = Value::new(English);
        let out = method
            .invoke(descriptor.module(), Some(&receiver), &Args::default())
            .unwrap();
        assert_eq!(out.get::<String>(), Some("hello".to_string()));
    }

    #[test]
    fn test_factory_error_is_wrapped() {
        let descriptor = ModuleDescriptor::builder::<English>()
            .constructor(vec![], |_| Err("broken".into()))
            .build();
        let err = descriptor.constructors()[0]
            .invoke(descriptor.module(), &Args::default())
            .unwrap_err();
        assert!(matches!(err, ModuleError::ConstructionFailed { .. }));
    }

    #[test]
    fn test_private_field_needs_guard() {
        let descriptor = ModuleDescriptor::builder::<Counter>()
            .default_constructor()
            .field::<i32, _>(
                FieldSpec::new("count", InjectionPoint::of::<i32>("count").property("x", "y", "5")),
                |c, v| {
                    *c.count.lock().map_err(|e| e.to_string())? = v;
                    Ok(())
                },
            )
            .build();
        let owner = *descriptor.module();
        let field = &descriptor.fields()[0];
        let instance = Value::new(Counter::default());

        assert!(field.is_injectable());
        assert!(!field.is_accessible());
        let err = field
            .assign(&owner, &instance, Some(Value::from(1)))
            .unwrap_err();
        assert!(matches!(err, ModuleError::IllegalAccess { .. }));

        {
            let _guard = field.grant_access();
            assert!(field.is_accessible());
            field.assign(&owner, &instance, Some(Value::from(5))).unwrap();
        }
        assert!(!field.is_accessible());

        let counter = instance.downcast::<Counter>().unwrap();
        assert_eq!(*counter.count.lock().unwrap(), Some(5));
    }

    #[test]
    fn test_static_and_final_fields_are_not_injectable() {
        let point = InjectionPoint::of::<i32>("n").property("x", "n", "1");
        let descriptor = ModuleDescriptor::builder::<Counter>()
            .field::<i32, _>(FieldSpec::new("a", point.clone()).static_field(), |_, _| Ok(()))
            .field::<i32, _>(FieldSpec::new("b", point).final_field(), |_, _| Ok(()))
            .field::<i32, _>(
                FieldSpec::new("c", InjectionPoint::of::<i32>("c")).public(),
                |_, _| Ok(()),
            )
            .build();
        assert!(descriptor.fields().iter().all(|f| !f.is_injectable()));
        assert!(descriptor.fields()[2].is_accessible());
    }

    #[test]
    fn test_args_accessors() {
        let args = Args::new(vec![Some(Value::from("abc")), None]);
        assert_eq!(args.len(), 2);
        assert_eq!(args.get::<String>(0).unwrap(), "abc");
        assert!(args.get::<i32>(0).is_err());
        assert!(args.arc::<String>(1).is_err());
        assert_eq!(args.opt::<String>(5).unwrap(), None);
    }
}
