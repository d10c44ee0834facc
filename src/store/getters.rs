//! Cached, lazily evaluated getter views.
//!
//! A [`GetterView`] is built from the registry's getter table on every module
//! (un)registration and hot update. Values are cached against the state
//! version they were computed at, so a getter re-runs only after the state
//! changed. Replacing the view discards every cache at once; handles to the
//! previous view stay valid until their holders drop them.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use crate::state::nested;
use crate::store::registry::WrappedGetter;
use crate::store::StoreInner;

static NULL: Value = Value::Null;

/// Arguments handed to a getter function.
pub struct GetterScope<'a> {
    /// State of the module that declared the getter.
    pub state: &'a Value,
    /// Getters of that module's namespace, keyed without the prefix.
    pub getters: &'a Getters,
    pub root_state: &'a Value,
    pub root_getters: &'a Getters,
}

struct Cached {
    version: u64,
    value: Value,
}

pub(crate) struct GetterView {
    entries: HashMap<String, WrappedGetter>,
    cache: Mutex<HashMap<String, Cached>>,
    local_keys: Mutex<HashMap<String, Arc<[String]>>>,
    store: Weak<StoreInner>,
}

impl GetterView {
    pub(crate) fn new(entries: HashMap<String, WrappedGetter>, store: Weak<StoreInner>) -> Self {
        Self {
            entries,
            cache: Mutex::new(HashMap::new()),
            local_keys: Mutex::new(HashMap::new()),
            store,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn evaluate(self: &Arc<Self>, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        let inner = self.store.upgrade()?;
        let version = inner.state.version();

        if let Some(hit) = self.cache.lock().get(key) {
            if hit.version == version {
                return Some(hit.value.clone());
            }
        }

        let root_getters = Getters::new(self.clone(), String::new());
        let namespace = entry.context.namespace();
        let local_getters = if namespace.is_empty() {
            root_getters.clone()
        } else {
            root_getters.scoped(namespace)
        };

        let value = inner.state.read(|root| {
            let local = nested(root, entry.context.path()).unwrap_or(&NULL);
            (entry.getter)(&GetterScope {
                state: local,
                getters: &local_getters,
                root_state: root,
                root_getters: &root_getters,
            })
        });

        self.cache.lock().insert(
            key.to_string(),
            Cached {
                version,
                value: value.clone(),
            },
        );
        Some(value)
    }

    /// Keys under `namespace` with the prefix stripped, computed once per view.
    fn keys_under(&self, namespace: &str) -> Arc<[String]> {
        if let Some(keys) = self.local_keys.lock().get(namespace) {
            return keys.clone();
        }

        let mut keys: Vec<String> = self
            .entries
            .keys()
            .filter_map(|key| key.strip_prefix(namespace))
            .map(str::to_string)
            .collect();
        keys.sort();
        let keys: Arc<[String]> = keys.into();

        self.local_keys
            .lock()
            .insert(namespace.to_string(), keys.clone());
        keys
    }
}

/// Read-only handle over the store's getters, optionally scoped to a
/// namespace.
#[derive(Clone)]
pub struct Getters {
    view: Arc<GetterView>,
    namespace: String,
}

impl Getters {
    pub(crate) fn new(view: Arc<GetterView>, namespace: String) -> Self {
        Self { view, namespace }
    }

    /// Same view, narrowed to `namespace` (appended to the current scope).
    pub(crate) fn scoped(&self, namespace: &str) -> Self {
        Self::new(self.view.clone(), format!("{}{}", self.namespace, namespace))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Evaluate (or fetch the cached value of) the getter at `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.view.evaluate(&format!("{}{}", self.namespace, key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.view
            .entries
            .contains_key(&format!("{}{}", self.namespace, key))
    }

    /// Visible keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.view.keys_under(&self.namespace).to_vec()
    }
}

impl std::fmt::Debug for Getters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Getters")
            .field("namespace", &self.namespace)
            .field("keys", &self.keys())
            .finish()
    }
}
