//! Shared test utilities and fixture modules.

#![allow(dead_code, unused_imports)]

use modstore::diagnostics::Reporter;
use modstore::{Host, ModuleConfig, Store, StoreError, StoreOptions};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Reporter that records every diagnostic as its display string.
#[derive(Default)]
pub struct CaptureReporter {
    messages: Mutex<Vec<String>>,
}

impl CaptureReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(needle))
    }

    pub fn count(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl Reporter for CaptureReporter {
    fn report(&self, error: &StoreError) {
        self.messages.lock().push(error.to_string());
    }
}

/// A host that has already been installed.
pub fn installed_host() -> Host {
    let host = Host::new();
    host.install().expect("fresh host installs");
    host
}

/// Build a store with a capturing reporter.
pub fn store_with(options: StoreOptions) -> (Store, Arc<CaptureReporter>) {
    let reporter = CaptureReporter::new();
    let store = Store::new(&installed_host(), options.reporter(reporter.clone()))
        .expect("store builds");
    (store, reporter)
}

pub fn store_from(root: ModuleConfig) -> (Store, Arc<CaptureReporter>) {
    store_with(StoreOptions::new(root))
}

/// `{ count }` module with `inc`/`set` mutations and a `double` getter.
pub fn counter_module() -> ModuleConfig {
    ModuleConfig::new()
        .state(json!({ "count": 0 }))
        .mutation("inc", |state, payload| {
            let by = payload.as_i64().unwrap_or(1);
            let current = state["count"].as_i64().unwrap_or(0);
            state["count"] = json!(current + by);
        })
        .mutation("set", |state, payload| {
            state["count"] = payload;
        })
        .getter("double", |scope| {
            json!(scope.state["count"].as_i64().unwrap_or(0) * 2)
        })
}

pub fn path(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}
