mod common;

use common::{counter_module, store_from, store_with};
use modstore::{ModuleConfig, StoreOptions, WatchOptions};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn getter_reads_local_state() {
    let (store, _) = store_from(ModuleConfig::new().module("counter", counter_module()));
    store.commit("set", json!(21)).unwrap();
    assert_eq!(store.getters().get("double"), Some(json!(42)));
}

#[test]
fn getter_is_cached_until_state_changes() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let root = counter_module().getter("tracked", move |scope| {
        counter.fetch_add(1, Ordering::SeqCst);
        scope.state["count"].clone()
    });
    let (store, _) = store_from(root);

    let getters = store.getters();
    assert_eq!(getters.get("tracked"), Some(json!(0)));
    assert_eq!(getters.get("tracked"), Some(json!(0)));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    store.commit("inc", json!(1)).unwrap();
    assert_eq!(getters.get("tracked"), Some(json!(1)));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn namespaced_getters_are_prefixed_and_locally_rekeyed() {
    let module = counter_module()
        .namespaced(true)
        .getter("quad", |scope| {
            let double = scope.getters.get("double").unwrap_or_default();
            json!(double.as_i64().unwrap_or(0) * 2)
        });
    let (store, _) = store_from(ModuleConfig::new().module("ns", module));
    store.commit("ns/set", json!(3)).unwrap();

    let getters = store.getters();
    assert_eq!(getters.get("ns/double"), Some(json!(6)));
    assert_eq!(getters.get("ns/quad"), Some(json!(12)));
    assert_eq!(getters.get("double"), None);
    assert_eq!(getters.keys(), vec!["ns/double", "ns/quad"]);
}

#[test]
fn getter_sees_root_state_and_root_getters() {
    let root = ModuleConfig::new()
        .state(json!({ "factor": 10 }))
        .getter("factor", |scope| scope.state["factor"].clone())
        .module(
            "ns",
            counter_module().namespaced(true).getter("scaled", |scope| {
                let factor = scope.root_getters.get("factor").unwrap_or_default();
                let count = scope.state["count"].as_i64().unwrap_or(0);
                json!({
                    "scaled": count * factor.as_i64().unwrap_or(0),
                    "rootFactor": scope.root_state["factor"],
                })
            }),
        );
    let (store, _) = store_from(root);
    store.commit("ns/set", json!(2)).unwrap();

    assert_eq!(
        store.getters().get("ns/scaled"),
        Some(json!({ "scaled": 20, "rootFactor": 10 }))
    );
}

#[test]
fn duplicate_getter_is_reported_and_first_wins() {
    let root = ModuleConfig::new()
        .getter("value", |_| json!("root"))
        .module("child", ModuleConfig::new().getter("value", |_| json!("child")));
    let (store, reporter) = store_from(root);

    assert!(reporter.contains("duplicate getter key: value"));
    assert_eq!(store.getters().get("value"), Some(json!("root")));
}

#[test]
fn duplicate_namespace_is_reported() {
    let root = ModuleConfig::new()
        .module("a", ModuleConfig::new().namespaced(true))
        .module(
            "b",
            ModuleConfig::new().module("a", ModuleConfig::new().namespaced(true)),
        );
    let (store, reporter) = store_from(root);

    assert!(reporter.contains("duplicate namespace a/ for the namespaced module b.a"));
    assert_eq!(store.module_namespace_path("a/"), Some(vec!["b".to_string(), "a".to_string()]));
}

#[test]
fn watch_fires_only_on_change() {
    let (store, _) = store_from(counter_module().state(json!({ "count": 0, "other": 0 })));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let unwatch = store.watch(
        |state: &Value, _| state["count"].clone(),
        move |new: &Value, old: &Value| sink.lock().push((new.clone(), old.clone())),
        WatchOptions::default(),
    );

    store.commit("inc", json!(1)).unwrap();
    store.state_tree().write(|state| state["other"] = json!(5));
    store.commit("inc", json!(1)).unwrap();
    unwatch();
    store.commit("inc", json!(1)).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![(json!(1), json!(0)), (json!(2), json!(1))]
    );
}

#[test]
fn immediate_watch_fires_right_away() {
    let (store, _) = store_from(counter_module());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let _unwatch = store.watch(
        |_: &Value, getters| getters.get("double").unwrap_or_default(),
        move |new: &Value, old: &Value| sink.lock().push((new.clone(), old.clone())),
        WatchOptions { immediate: true },
    );
    store.commit("set", json!(2)).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![(json!(0), Value::Null), (json!(4), json!(0))]
    );
}

#[test]
fn watch_callback_writes_are_audited_in_strict_mode() {
    let (store, reporter) = store_with(StoreOptions::new(counter_module()).strict(true));
    let handle = store.clone();
    let committing = Arc::new(Mutex::new(Vec::new()));
    let seen = committing.clone();

    let unwatch = store.watch(
        |state: &Value, _| state["count"].clone(),
        move |_: &Value, _: &Value| {
            seen.lock().push(handle.state_tree().is_committing());
            handle.state_tree().write(|state| state["shadow"] = json!(true));
        },
        WatchOptions::default(),
    );

    store.commit("inc", json!(1)).unwrap();
    unwatch();

    assert_eq!(*committing.lock(), vec![false]);
    assert_eq!(store.state()["shadow"], json!(true));
    assert!(reporter.contains("do not mutate store state outside mutation handlers"));
}
