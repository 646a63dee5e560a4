// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for lookup order, per-call overrides and custom locators.

mod common;

use common::*;
use modwire::adapters::SourceLocator;
use modwire::prelude::*;
use std::sync::Arc;

/// Answers plain lookups from a fixed map.
struct FixedLocator(PropertyMap);

impl PropertyLocator for FixedLocator {
    fn name(&self) -> &str {
        "fixed"
    }

    fn get_property(&self, domain: &DomainName, name: &str) -> Result<Option<Value>> {
        Ok(self.0.get(domain, name))
    }
}

#[test]
fn test_config_wins_in_default_order() {
    let modules = builder()
        .with_overrides(PropertyMap::new().with("app", "port", 2))
        .build();
    modules.config().set("app", "port", 1).unwrap();

    assert_eq!(modules.load::<Server>().unwrap().port, 1);
}

#[test]
fn test_override_wins_in_reverted_order() {
    let modules = builder()
        .with_overrides(PropertyMap::new().with("app", "port", 2))
        .reverted()
        .build();
    modules.config().set("app", "port", 1).unwrap();

    assert_eq!(modules.order(), LookupOrder::OverridesFirst);
    assert_eq!(modules.load::<Server>().unwrap().port, 2);
}

#[test]
fn test_override_only_value_visible_in_both_orders() {
    let overrides = PropertyMap::new().with("app", "port", 8080);

    let default = builder().with_overrides(overrides.clone()).build();
    let reverted = builder().with_overrides(overrides).reverted().build();

    assert_eq!(default.get_property::<i32>("app", "port").unwrap(), Some(8080));
    assert_eq!(reverted.get_property::<i32>("app", "port").unwrap(), Some(8080));
    assert_eq!(default.load::<Server>().unwrap().port, 8080);
    assert_eq!(reverted.load::<Server>().unwrap().port, 8080);
}

#[test]
fn test_shared_override_map_is_live() {
    let modules = modules();
    modules.overrides().insert("app", "host", "override.local");

    assert_eq!(modules.load::<Server>().unwrap().host, "override.local");
    modules.overrides().clear();
    assert_eq!(modules.load::<Server>().unwrap().host, "localhost");
}

#[test]
fn test_per_call_overrides_beat_config() {
    let modules = modules();
    modules.config().set("app", "port", 1).unwrap();

    let overlay = PropertyMap::new().with("app", "port", 3);
    let server = modules.load_with_overrides::<Server>(overlay).unwrap();
    assert_eq!(server.port, 3);
    assert_eq!(modules.load::<Server>().unwrap().port, 1);
}

#[test]
fn test_per_call_overrides_reach_nested_loads() {
    let modules = modules();

    let overlay = PropertyMap::new()
        .with("holder", "name", "nested")
        .with("x", "y", 42);
    let holder = modules.load_with_overrides::<Holder>(overlay.clone()).unwrap();
    assert_eq!(holder.name.as_deref(), Some("nested"));

    let bean = modules.load_with_overrides::<Bean>(overlay).unwrap();
    assert_eq!(bean.y(), Some(42));
}

#[test]
fn test_per_call_provider_override() {
    let modules = modules();
    let widget = ModuleType::of::<Widget>();

    let overlay = PropertyMap::new().with(
        widget.domain(),
        "provider",
        Value::new(Widget { made_by: "overlay" }),
    );
    let loaded = modules.load_with_overrides::<Widget>(overlay).unwrap();
    assert_eq!(loaded.made_by, "overlay");
    assert_eq!(modules.load::<Widget>().unwrap().made_by, "factory");
}

#[test]
fn test_custom_locator() {
    let fixed = PropertyMap::new()
        .with("app", "host", "fixed.local")
        .with("app", "port", 6000);
    let modules = builder()
        .with_locator(Arc::new(FixedLocator(fixed)))
        .build();
    modules.config().set("app", "port", 1).unwrap();

    let server = modules.load::<Server>().unwrap();
    assert_eq!(server.host, "fixed.local");
    assert_eq!(server.port, 6000);
    assert_eq!(modules.locator().name(), "fixed");

    let overlay = PropertyMap::new().with("app", "port", 7000);
    assert_eq!(modules.load_with_overrides::<Server>(overlay).unwrap().port, 7000);
}

#[test]
fn test_source_locator_lookups() {
    let config = Arc::new(PropertyMap::new().with("app", "port", 1));
    let overrides = Arc::new(PropertyMap::new().with("app", "host", "h"));
    let locator = SourceLocator::new(config, overrides);

    let app = DomainName::from("app");
    assert!(locator.get_property(&app, "port").unwrap().is_some());
    assert!(locator.get_property(&app, "host").unwrap().is_some());
    assert!(locator.get_property(&app, "missing").unwrap().is_none());
}
