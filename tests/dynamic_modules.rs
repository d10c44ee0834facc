mod common;

use common::{counter_module, path, store_from, store_with};
use modstore::{ModuleConfig, RegisterOptions, StoreError, StoreOptions, WatchOptions};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

fn settable() -> ModuleConfig {
    ModuleConfig::new()
        .namespaced(true)
        .state_fn(|| json!({ "v": 0 }))
        .mutation("set", |state, payload| state["v"] = payload)
        .getter("v", |scope| scope.state["v"].clone())
}

#[test]
fn register_commit_unregister_roundtrip() {
    let (store, _) = store_from(ModuleConfig::new());

    store
        .register_module(&["x"], settable(), RegisterOptions::default())
        .unwrap();
    store.commit("x/set", json!(5)).unwrap();
    assert_eq!(store.state()["x"]["v"], json!(5));
    assert_eq!(store.getters().get("x/v"), Some(json!(5)));
    assert!(store.has_module(&["x"]));

    store.unregister_module(&["x"]).unwrap();
    assert!(store.state().get("x").is_none());
    assert!(!store.has_module(&["x"]));
    assert_eq!(store.getters().get("x/v"), None);
    assert!(store.commit("x/set", json!(1)).is_err());
}

#[test]
fn nested_registration_under_existing_module() {
    let (store, _) = store_from(ModuleConfig::new().module("parent", ModuleConfig::new().namespaced(true)));
    store
        .register_module(&["parent", "child"], settable(), RegisterOptions::default())
        .unwrap();
    store.commit("parent/child/set", json!("deep")).unwrap();
    assert_eq!(store.state()["parent"]["child"]["v"], json!("deep"));
    assert_eq!(
        store.module_namespace_path("parent/child/"),
        Some(path(&["parent", "child"]))
    );
}

#[test]
fn registering_root_is_refused() {
    let (store, _) = store_from(ModuleConfig::new());
    let empty: [&str; 0] = [];
    let result = store.register_module(&empty, settable(), RegisterOptions::default());
    assert!(matches!(result, Err(StoreError::RootRegistration)));
}

#[test]
fn registering_under_missing_parent_fails() {
    let (store, reporter) = store_from(ModuleConfig::new());
    let result = store.register_module(&["a", "b"], settable(), RegisterOptions::default());
    assert!(matches!(result, Err(StoreError::ModuleNotFound { .. })));
    assert!(reporter.contains("module not found at path \"a\""));
}

#[test]
fn preserve_state_keeps_existing_subtree() {
    let (store, _) = store_from(ModuleConfig::new().state(json!({ "x": { "v": 9 } })));
    store
        .register_module(&["x"], settable(), RegisterOptions { preserve_state: true })
        .unwrap();
    assert_eq!(store.state()["x"]["v"], json!(9));
    store.commit("x/set", json!(10)).unwrap();
    assert_eq!(store.state()["x"]["v"], json!(10));
}

#[test]
fn overriding_state_field_is_a_warning() {
    let (store, reporter) = store_from(ModuleConfig::new().state(json!({ "x": 1 })));
    store
        .register_module(&["x"], settable(), RegisterOptions::default())
        .unwrap();
    assert!(reporter.contains("state field \"x\" was overridden"));
    assert_eq!(store.state()["x"]["v"], json!(0));
}

#[test]
fn static_modules_cannot_be_unregistered() {
    let (store, _) = store_from(ModuleConfig::new().module("fixed", counter_module().namespaced(true)));
    store.unregister_module(&["fixed"]).unwrap();
    assert!(store.has_module(&["fixed"]));
    assert_eq!(store.state()["fixed"]["count"], json!(0));
    store.commit("fixed/inc", json!(1)).unwrap();
}

#[test]
fn unregistering_unknown_module_is_reported() {
    let (store, reporter) = store_from(ModuleConfig::new());
    assert!(store.unregister_module(&["ghost"]).is_err());
    assert!(reporter.contains("module not found"));
}

#[test]
fn registration_does_not_trip_strict_mode() {
    let (store, reporter) = store_with(StoreOptions::new(ModuleConfig::new()).strict(true));
    store
        .register_module(&["x"], settable(), RegisterOptions::default())
        .unwrap();
    store.unregister_module(&["x"]).unwrap();
    assert_eq!(reporter.count(), 0);
}

#[test]
fn each_registration_gets_fresh_state() {
    let (store, _) = store_from(ModuleConfig::new());
    let shared = settable().state(json!({ "v": 0 }));
    store
        .register_module(&["a"], shared.clone(), RegisterOptions::default())
        .unwrap();
    store
        .register_module(&["b"], shared, RegisterOptions::default())
        .unwrap();
    store.commit("a/set", json!(1)).unwrap();
    assert_eq!(store.state()["b"]["v"], json!(0));
}

#[test]
fn hot_update_swaps_handlers_and_keeps_state() {
    let (store, _) = store_from(ModuleConfig::new().module("counter", counter_module().namespaced(true)));
    store.commit("counter/inc", json!(2)).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _unwatch = store.watch(
        |_: &Value, getters| getters.get("counter/double").unwrap_or_default(),
        move |new: &Value, _: &Value| sink.lock().push(new.clone()),
        WatchOptions::default(),
    );

    let replacement = ModuleConfig::new().module(
        "counter",
        ModuleConfig::new()
            .namespaced(true)
            .mutation("inc", |state, _| {
                let count = state["count"].as_i64().unwrap_or(0);
                state["count"] = json!(count + 100);
            })
            .getter("double", |scope| {
                json!(scope.state["count"].as_i64().unwrap_or(0) * 3)
            }),
    );
    store.hot_update(replacement);

    assert_eq!(store.state()["counter"]["count"], json!(2));
    assert_eq!(store.getters().get("counter/double"), Some(json!(6)));
    assert_eq!(*seen.lock(), vec![json!(6)]);

    store.commit("counter/inc", Value::Null).unwrap();
    assert_eq!(store.state()["counter"]["count"], json!(102));
    assert!(store.commit("counter/set", json!(0)).is_err());
}

#[test]
fn hot_update_rejects_new_modules() {
    let (store, reporter) = store_from(ModuleConfig::new().module("a", counter_module()));
    let before = store.state();

    store.hot_update(
        ModuleConfig::new()
            .module("a", counter_module())
            .module("b", counter_module()),
    );

    assert!(reporter.contains("trying to add a new module 'b' on hot reloading"));
    assert!(!store.has_module(&["b"]));
    assert_eq!(store.state(), before);
}

#[test]
fn hot_update_can_toggle_namespacing() {
    let (store, _) = store_from(ModuleConfig::new().module("a", counter_module()));
    store.commit("inc", json!(1)).unwrap();

    store.hot_update(ModuleConfig::new().module("a", counter_module().namespaced(true)));

    store.commit("a/inc", json!(1)).unwrap();
    assert_eq!(store.state()["a"]["count"], json!(2));
    assert_eq!(store.module_namespace_path("a/"), Some(path(&["a"])));
}
