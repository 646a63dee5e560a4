// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the order in which providers and loaders are discovered.
//!
//! Every collaborator is searched under four keys: own instance, own class,
//! global instance, global class. The first hit wins.

mod common;

use common::*;
use modwire::domain::{LookupKey, LookupKind};
use modwire::prelude::*;
use modwire::service::Resolution;
use std::sync::Arc;

/// Builds widgets labelled "own class".
struct OwnFactory;

/// Builds widgets labelled "global class".
struct GlobalFactory;

/// A loader instance that labels every widget it builds.
struct TaggedLoader(&'static str);

impl ModuleLoader for TaggedLoader {
    fn load(&self, _res: &Resolution<'_>, _module: &ModuleType) -> Result<Value> {
        Ok(Value::new(Widget { made_by: self.0 }))
    }

    fn load_with_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        _provider: &ModuleType,
    ) -> Result<Value> {
        self.load(res, module)
    }
}

#[derive(Default)]
struct OwnClassLoader;

#[derive(Default)]
struct GlobalClassLoader;

impl ModuleLoader for OwnClassLoader {
    fn load(&self, res: &Resolution<'_>, module: &ModuleType) -> Result<Value> {
        TaggedLoader("own class").load(res, module)
    }

    fn load_with_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        _provider: &ModuleType,
    ) -> Result<Value> {
        self.load(res, module)
    }
}

impl ModuleLoader for GlobalClassLoader {
    fn load(&self, res: &Resolution<'_>, module: &ModuleType) -> Result<Value> {
        TaggedLoader("global class").load(res, module)
    }

    fn load_with_provider(
        &self,
        res: &Resolution<'_>,
        module: &ModuleType,
        _provider: &ModuleType,
    ) -> Result<Value> {
        self.load(res, module)
    }
}

fn engine() -> Modules {
    builder()
        .register(
            ModuleDescriptor::builder::<OwnFactory>()
                .static_builder::<Widget, _>("create", vec![], |_| {
                    Ok(Widget { made_by: "own class" })
                })
                .build(),
        )
        .register(
            ModuleDescriptor::builder::<GlobalFactory>()
                .static_builder::<Widget, _>("create", vec![], |_| {
                    Ok(Widget { made_by: "global class" })
                })
                .build(),
        )
        .register(
            ModuleDescriptor::builder::<OwnClassLoader>()
                .default_constructor()
                .assignable_to::<Arc<dyn ModuleLoader>, _>(|l| l as Arc<dyn ModuleLoader>)
                .build(),
        )
        .register(
            ModuleDescriptor::builder::<GlobalClassLoader>()
                .default_constructor()
                .assignable_to::<Arc<dyn ModuleLoader>, _>(|l| l as Arc<dyn ModuleLoader>)
                .build(),
        )
        .build()
}

/// The four keys in search order, each with the label its registration yields.
const STEPS: [(Scope, bool, &str); 4] = [
    (Scope::Module, false, "own instance"),
    (Scope::Module, true, "own class"),
    (Scope::Global, false, "global instance"),
    (Scope::Global, true, "global class"),
];

/// Asserts each step's winner, then deletes that step's key.
fn assert_steps(modules: &Modules, kind: LookupKind) {
    let widget = ModuleType::of::<Widget>();
    for (scope, class, expected) in STEPS {
        assert_eq!(
            modules.load::<Widget>().unwrap().made_by,
            expected,
            "{kind} at {scope:?} scope, class={class}"
        );
        let key = LookupKey::new(&widget, kind, scope, class);
        assert!(modules.config().remove(key.domain.clone(), &key.name).unwrap().is_some());
    }
}

#[test]
fn test_provider_search_order() {
    init_tracing();
    let modules = engine();
    let widget = ModuleType::of::<Widget>();
    modules
        .set_provider(&widget, Value::new(Widget { made_by: "own instance" }), Scope::Module)
        .unwrap();
    modules
        .set_provider_type(&widget, ModuleType::of::<OwnFactory>(), Scope::Module)
        .unwrap();
    modules
        .set_provider(&widget, Value::new(Widget { made_by: "global instance" }), Scope::Global)
        .unwrap();
    modules
        .set_provider_type(&widget, ModuleType::of::<GlobalFactory>(), Scope::Global)
        .unwrap();

    assert_steps(&modules, LookupKind::Provider);
    // the declared metadata provider is the last resort
    assert_eq!(modules.load::<Widget>().unwrap().made_by, "factory");
}

#[test]
fn test_loader_search_order() {
    let modules = engine();
    let widget = ModuleType::of::<Widget>();
    modules
        .set_loader(&widget, Arc::new(TaggedLoader("own instance")), Scope::Module)
        .unwrap();
    modules
        .set_loader_type(&widget, ModuleType::of::<OwnClassLoader>(), Scope::Module)
        .unwrap();
    modules
        .set_loader(&widget, Arc::new(TaggedLoader("global instance")), Scope::Global)
        .unwrap();
    modules
        .set_loader_type(&widget, ModuleType::of::<GlobalClassLoader>(), Scope::Global)
        .unwrap();

    assert_steps(&modules, LookupKind::Loader);
    assert_eq!(modules.load::<Widget>().unwrap().made_by, "factory");
}

#[test]
fn test_own_provider_type_beats_global_provider_instance() {
    let modules = modules();
    let widget = ModuleType::of::<Widget>();
    modules
        .set_provider(&widget, Value::new(Widget { made_by: "global" }), Scope::Global)
        .unwrap();
    modules
        .set_provider_type(&widget, ModuleType::of::<WidgetFactory>(), Scope::Module)
        .unwrap();

    assert_eq!(modules.load::<Widget>().unwrap().made_by, "factory");
}

#[test]
fn test_own_provider_type_beats_global_instance_in_overlay() {
    let modules = modules();
    let widget = ModuleType::of::<Widget>();
    let own_class = LookupKey::new(&widget, LookupKind::Provider, Scope::Module, true);
    let global = LookupKey::new(&widget, LookupKind::Provider, Scope::Global, false);

    let overlay = PropertyMap::new()
        .with(
            global.domain,
            &global.name,
            Value::new(Widget { made_by: "global" }),
        )
        .with(
            own_class.domain,
            &own_class.name,
            Value::of_type(ModuleType::of::<WidgetFactory>()),
        );
    let loaded = modules.load_with_overrides::<Widget>(overlay).unwrap();
    assert_eq!(loaded.made_by, "factory");
}

#[test]
fn test_own_provider_type_beats_global_instance_in_context() {
    let modules = modules();
    let widget = ModuleType::of::<Widget>();
    let context = modules.create_context(LookupOrder::OverridesFirst, None);
    context
        .set_provider(&widget, Value::new(Widget { made_by: "global" }), Scope::Global)
        .unwrap();
    context
        .set_provider_type(&widget, ModuleType::of::<WidgetFactory>(), Scope::Module)
        .unwrap();

    assert_eq!(context.load::<Widget>().unwrap().made_by, "factory");
}
