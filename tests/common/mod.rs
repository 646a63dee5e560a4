// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use modwire::domain::{
    FieldSpec, InjectionPoint, ModuleDescriptor, ModuleType, Result, Value, LOAD_SENTINEL,
    NULL_SENTINEL,
};
use modwire::ports::ModuleLoader;
use modwire::service::{DefaultModuleLoader, Modules, ModulesBuilder, Resolution};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Installs a test-friendly tracing subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Built by [`WidgetFactory::create`].
#[derive(Debug)]
pub struct Widget {
    pub made_by: &'static str,
}

/// Exposes a static builder for [`Widget`].
pub struct WidgetFactory;

/// Plain type with only a zero-argument constructor.
#[derive(Debug, Default)]
pub struct Gadget;

/// Bean with one private injectable field.
#[derive(Debug, Default)]
pub struct Bean {
    pub y: Mutex<Option<i32>>,
}

impl Bean {
    pub fn y(&self) -> Option<i32> {
        self.y.lock().ok().and_then(|y| *y)
    }
}

/// Server configured from the `app` domain.
#[derive(Debug)]
pub struct Server {
    pub host: String,
    pub port: i32,
}

/// Holds an optional name and a nested gadget resolved through sentinels.
#[derive(Debug)]
pub struct Holder {
    pub name: Option<String>,
    pub gadget: Arc<Gadget>,
}

/// Carries two property declarations on a single parameter.
#[derive(Debug)]
pub struct Ambiguous;

/// Declares [`Beta`] as its provider; [`Beta`] declares it back.
#[derive(Debug, Default)]
pub struct Alpha;

/// See [`Alpha`].
#[derive(Debug, Default)]
pub struct Beta;

/// A loader that counts its invocations and delegates to the default loader.
#[derive(Debug, Default)]
pub struct CountingLoader {
    pub loads: AtomicUsize,
    inner: DefaultModuleLoader,
}

impl ModuleLoader for CountingLoader {
    fn load(&self, res: &Resolution<'_>, module: &ModuleType) -> Result<Value> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(res, module)
    }

    fn load_with_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        provider: &ModuleType,
    ) -> Result<Value> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_with_provider(res, module, provider)
    }
}

pub fn descriptors() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::builder::<Widget>()
            .provider::<WidgetFactory>()
            .build(),
        ModuleDescriptor::builder::<WidgetFactory>()
            .static_builder::<Widget, _>("create", vec![], |_| Ok(Widget { made_by: "factory" }))
            .build(),
        ModuleDescriptor::default_constructible::<Gadget>(),
        ModuleDescriptor::builder::<Bean>()
            .default_constructor()
            .field::<i32, _>(
                FieldSpec::new("y", InjectionPoint::of::<i32>("y").property("x", "y", "5")),
                |bean, value| {
                    *bean.y.lock().map_err(|e| e.to_string())? = value;
                    Ok(())
                },
            )
            .build(),
        ModuleDescriptor::builder::<Server>()
            .builder_constructor(
                vec![
                    InjectionPoint::of::<String>("host").property("app", "host", "localhost"),
                    InjectionPoint::of::<i32>("port").property("app", "port", "80"),
                ],
                |args| {
                    Ok(Server {
                        host: args.get(0)?,
                        port: args.get(1)?,
                    })
                },
            )
            .build(),
        ModuleDescriptor::builder::<Holder>()
            .builder_constructor(
                vec![
                    InjectionPoint::of::<String>("name").property("holder", "name", NULL_SENTINEL),
                    InjectionPoint::of::<Gadget>("gadget").property(
                        "holder",
                        "gadget",
                        LOAD_SENTINEL,
                    ),
                ],
                |args| {
                    Ok(Holder {
                        name: args.opt(0)?,
                        gadget: args.arc(1)?,
                    })
                },
            )
            .build(),
        ModuleDescriptor::builder::<Ambiguous>()
            .builder_constructor(
                vec![InjectionPoint::of::<i32>("n")
                    .property("a", "n", "1")
                    .property("b", "n", "2")],
                |_| Ok(Ambiguous),
            )
            .build(),
        ModuleDescriptor::builder::<Alpha>()
            .provider::<Beta>()
            .default_constructor()
            .instance_builder::<Beta, _>("beta", vec![], |_, _| Ok(Beta))
            .build(),
        ModuleDescriptor::builder::<Beta>()
            .provider::<Alpha>()
            .default_constructor()
            .instance_builder::<Alpha, _>("alpha", vec![], |_, _| Ok(Alpha))
            .build(),
        ModuleDescriptor::builder::<CountingLoader>()
            .default_constructor()
            .assignable_to::<Arc<dyn ModuleLoader>, _>(|l| l as Arc<dyn ModuleLoader>)
            .build(),
    ]
}

/// A builder with every fixture registered.
pub fn builder() -> ModulesBuilder {
    descriptors()
        .into_iter()
        .fold(Modules::builder(), |builder, d| builder.register(d))
}

/// An engine with every fixture registered.
pub fn modules() -> Modules {
    builder().build()
}
