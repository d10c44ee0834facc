use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};

use crate::config::loader::StoreSettings;
use crate::devtools::DevtoolHook;
use crate::diagnostics::Reporter;
use crate::store::{ActionContext, GetterScope, Store};

/// Produces a fresh state object for one module instance.
pub type StateFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Synchronous state change: `(local_state, payload)`.
pub type MutationFn = Arc<dyn Fn(&mut Value, Value) + Send + Sync>;

/// Future returned by every action handler.
pub type ActionFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// Action handler: `(context, payload) -> future result`.
pub type ActionFn = Arc<dyn Fn(ActionContext, Value) -> ActionFuture + Send + Sync>;

/// Derived read view over local and root state.
pub type GetterFn = Arc<dyn Fn(&GetterScope<'_>) -> Value + Send + Sync>;

/// Called once with the freshly built store.
pub type Plugin = Arc<dyn Fn(&Store) + Send + Sync>;

/// Action declaration: the handler plus whether it registers outside the
/// module's namespace.
#[derive(Clone)]
pub struct ActionConfig {
    pub handler: ActionFn,
    /// Register under the bare key even inside a namespaced module.
    pub root: bool,
}

impl ActionConfig {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |ctx, payload| handler(ctx, payload).boxed()),
            root: false,
        }
    }

    /// Wrap a synchronous handler; its return value is normalized into a
    /// ready future.
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(move |ctx, payload| futures::future::ready(handler(ctx, payload)).boxed()),
            root: false,
        }
    }

    pub fn root(mut self, root: bool) -> Self {
        self.root = root;
        self
    }
}

/// Raw, user-authored module configuration.
///
/// Handler maps keep declaration order; declaring the same key twice replaces
/// the earlier entry in place.
#[derive(Clone, Default)]
pub struct ModuleConfig {
    pub state: Option<StateFactory>,
    pub namespaced: bool,
    pub mutations: Vec<(String, MutationFn)>,
    pub actions: Vec<(String, ActionConfig)>,
    pub getters: Vec<(String, GetterFn)>,
    pub modules: Vec<(String, ModuleConfig)>,
}

impl ModuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `state` as a template; every module instance gets its own clone.
    pub fn state(mut self, state: Value) -> Self {
        self.state = Some(Arc::new(move || state.clone()));
        self
    }

    pub fn state_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.state = Some(Arc::new(factory));
        self
    }

    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    pub fn mutation<F>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Value, Value) + Send + Sync + 'static,
    {
        upsert(&mut self.mutations, key.into(), Arc::new(handler) as MutationFn);
        self
    }

    pub fn action<F, Fut>(self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.action_config(key, ActionConfig::new(handler))
    }

    pub fn action_sync<F>(self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.action_config(key, ActionConfig::sync(handler))
    }

    /// Action registered under its bare key regardless of namespacing.
    pub fn root_action<F, Fut>(self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.action_config(key, ActionConfig::new(handler).root(true))
    }

    pub fn action_config(mut self, key: impl Into<String>, action: ActionConfig) -> Self {
        upsert(&mut self.actions, key.into(), action);
        self
    }

    pub fn getter<F>(mut self, key: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&GetterScope<'_>) -> Value + Send + Sync + 'static,
    {
        upsert(&mut self.getters, key.into(), Arc::new(getter) as GetterFn);
        self
    }

    pub fn module(mut self, key: impl Into<String>, module: ModuleConfig) -> Self {
        upsert(&mut self.modules, key.into(), module);
        self
    }

    /// Build a fresh state object for a new module instance.
    pub(crate) fn instantiate_state(&self) -> Value {
        match &self.state {
            Some(factory) => factory(),
            None => json!({}),
        }
    }
}

impl std::fmt::Debug for ModuleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("namespaced", &self.namespaced)
            .field("has_state", &self.state.is_some())
            .field("mutations", &self.mutations.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("actions", &self.actions.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("getters", &self.getters.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("modules", &self.modules)
            .finish()
    }
}

fn upsert<T>(entries: &mut Vec<(String, T)>, key: String, value: T) {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

/// Everything needed to construct a [`Store`].
#[derive(Clone, Default)]
pub struct StoreOptions {
    /// Root module: state, handlers and nested modules.
    pub root: ModuleConfig,
    /// Audit every state change made outside a mutation.
    pub strict: bool,
    pub plugins: Vec<Plugin>,
    /// Overrides the host's devtools default when set.
    pub devtools: Option<bool>,
    pub devtool_hook: Option<Arc<dyn DevtoolHook>>,
    /// Error channel; defaults to [`TracingReporter`](crate::diagnostics::TracingReporter).
    pub reporter: Option<Arc<dyn Reporter>>,
}

impl StoreOptions {
    pub fn new(root: ModuleConfig) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn plugin<F>(mut self, plugin: F) -> Self
    where
        F: Fn(&Store) + Send + Sync + 'static,
    {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn devtools(mut self, enabled: bool) -> Self {
        self.devtools = Some(enabled);
        self
    }

    pub fn devtool_hook(mut self, hook: Arc<dyn DevtoolHook>) -> Self {
        self.devtool_hook = Some(hook);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Apply flags loaded from a settings file.
    pub fn with_settings(mut self, settings: &StoreSettings) -> Self {
        self.strict = settings.strict;
        if settings.devtools.is_some() {
            self.devtools = settings.devtools;
        }
        self
    }
}
