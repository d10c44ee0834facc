//! Call normalization and per-module scoping of commit/dispatch.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;

use crate::error::StoreError;
use crate::state::nested;
use crate::store::{DispatchResult, Getters, Store};

/// Options accepted by commit/dispatch calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Skip namespace prefixing when called through a local context.
    pub root: bool,
}

/// A normalized commit or dispatch request.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: String,
    pub payload: Value,
    pub options: CallOptions,
}

impl Call {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
            options: CallOptions::default(),
        }
    }

    /// Object style: `{ "type": "...", ...payload }`. The whole object is the
    /// payload.
    pub fn from_object(object: Value) -> Result<Self, StoreError> {
        let kind = match object.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => {
                return Err(StoreError::InvalidCall {
                    found: type_name(other).to_string(),
                })
            }
            None => {
                return Err(StoreError::InvalidCall {
                    found: type_name(&object).to_string(),
                })
            }
        };
        Ok(Self::new(kind, object))
    }

    /// Route past the local namespace.
    pub fn root(mut self) -> Self {
        self.options.root = true;
        self
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Namespace and path of one installed module.
///
/// Every handler registered from a module is bound to that module's context;
/// it decides how local types are prefixed and where local state lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalContext {
    namespace: String,
    path: Vec<String>,
}

impl LocalContext {
    pub(crate) fn new(namespace: String, path: Vec<String>) -> Self {
        Self { namespace, path }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Local state, read live from the root state on every call.
    pub fn state(&self, store: &Store) -> Value {
        store
            .state_tree()
            .read(|root| nested(root, &self.path).cloned())
            .unwrap_or_default()
    }

    /// Getters under this namespace, keyed without the prefix. Unnamespaced
    /// modules see the root getters.
    pub fn getters(&self, store: &Store) -> Getters {
        let root = store.getters();
        if self.namespace.is_empty() {
            root
        } else {
            root.scoped(&self.namespace)
        }
    }

    pub fn commit(&self, store: &Store, mut call: Call) -> Result<(), StoreError> {
        if self.namespace.is_empty() || call.options.root {
            return store.commit_call(call);
        }

        let global = format!("{}{}", self.namespace, call.kind);
        if !store.has_mutation(&global) {
            let error = StoreError::UnknownLocalMutation {
                local: call.kind,
                global,
            };
            store.report(&error);
            return Err(error);
        }

        call.kind = global;
        store.commit_call(call)
    }

    pub fn dispatch(&self, store: &Store, mut call: Call) -> BoxFuture<'static, DispatchResult> {
        if self.namespace.is_empty() || call.options.root {
            return store.dispatch_call(call);
        }

        let global = format!("{}{}", self.namespace, call.kind);
        if !store.has_action(&global) {
            store.report(&StoreError::UnknownLocalAction {
                local: call.kind,
                global,
            });
            return futures::future::ready(Ok(None)).boxed();
        }

        call.kind = global;
        store.dispatch_call(call)
    }
}

/// What an action handler receives: local commit/dispatch plus local and
/// root views of state and getters.
#[derive(Clone)]
pub struct ActionContext {
    store: Store,
    local: Arc<LocalContext>,
}

impl ActionContext {
    pub(crate) fn new(store: Store, local: Arc<LocalContext>) -> Self {
        Self { store, local }
    }

    pub fn commit(&self, kind: &str, payload: Value) -> Result<(), StoreError> {
        self.commit_call(Call::new(kind, payload))
    }

    pub fn commit_call(&self, call: Call) -> Result<(), StoreError> {
        self.local.commit(&self.store, call)
    }

    pub fn dispatch(&self, kind: &str, payload: Value) -> BoxFuture<'static, DispatchResult> {
        self.dispatch_call(Call::new(kind, payload))
    }

    pub fn dispatch_call(&self, call: Call) -> BoxFuture<'static, DispatchResult> {
        self.local.dispatch(&self.store, call)
    }

    pub fn state(&self) -> Value {
        self.local.state(&self.store)
    }

    pub fn getters(&self) -> Getters {
        self.local.getters(&self.store)
    }

    pub fn root_state(&self) -> Value {
        self.store.state()
    }

    pub fn root_getters(&self) -> Getters {
        self.store.getters()
    }

    pub fn local(&self) -> &LocalContext {
        &self.local
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
