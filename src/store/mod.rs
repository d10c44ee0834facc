//! The store handle.
//!
//! A [`Store`] is a cheap, clonable handle over one shared [`StoreInner`]:
//! the observed state tree, the module tree, the flattened handler tables and
//! the current getter view. Locks are never held while user code runs; the
//! installer gathers what it needs first and registers afterwards.

mod context;
mod dispatch;
mod getters;
mod install;
mod registry;
mod subscription;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::config::{ModuleConfig, StoreOptions};
use crate::devtools::{self, DevtoolHook};
use crate::diagnostics::{Reporter, TracingReporter};
use crate::error::StoreError;
use crate::host::Host;
use crate::module::ModuleCollection;
use crate::state::StateTree;

pub use context::{ActionContext, Call, CallOptions, LocalContext};
pub use dispatch::DispatchResult;
pub use getters::{GetterScope, Getters};
pub use subscription::{
    ActionHook, ActionRecord, ActionSubscriber, MutationRecord, MutationSubscriber, Unsubscribe,
    Unwatch, WatchOptions,
};

use getters::GetterView;
use registry::Registry;

/// Options for [`Store::register_module`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// The state tree already holds this module's state; do not graft it.
    pub preserve_state: bool,
}

pub(crate) struct StoreInner {
    pub(crate) state: StateTree,
    pub(crate) modules: RwLock<ModuleCollection>,
    pub(crate) registry: RwLock<Registry>,
    pub(crate) view: RwLock<Arc<GetterView>>,
    pub(crate) subscribers: Arc<Mutex<Vec<MutationSubscriber>>>,
    pub(crate) action_subscribers: Arc<Mutex<Vec<Arc<ActionSubscriber>>>>,
    pub(crate) reporter: Arc<dyn Reporter>,
    pub(crate) devtool_hook: Option<Arc<dyn DevtoolHook>>,
}

#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

impl Store {
    /// Build a store from `options`.
    ///
    /// The only fatal failure is an unbound host.
    pub fn new(host: &Host, options: StoreOptions) -> Result<Store, StoreError> {
        if !host.is_installed() {
            return Err(StoreError::HostNotInstalled);
        }

        let StoreOptions {
            root,
            strict,
            plugins,
            devtools,
            devtool_hook,
            reporter,
        } = options;

        let reporter = reporter.unwrap_or_else(|| Arc::new(TracingReporter));
        let devtools_enabled = devtools.unwrap_or_else(|| host.devtools());
        let devtool_hook = devtool_hook.filter(|_| devtools_enabled);

        let mut modules = ModuleCollection::new(root, reporter.clone());
        let root_state = modules.root_mut().take_state();

        let inner = Arc::new_cyclic(|weak| StoreInner {
            state: StateTree::new(root_state, strict, reporter.clone()),
            modules: RwLock::new(modules),
            registry: RwLock::new(Registry::default()),
            view: RwLock::new(Arc::new(GetterView::new(HashMap::new(), weak.clone()))),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            action_subscribers: Arc::new(Mutex::new(Vec::new())),
            reporter,
            devtool_hook,
        });
        let store = Store { inner };

        store.install(&[], true);
        store.reset_view(false);

        for plugin in &plugins {
            plugin(&store);
        }
        if let Some(hook) = store.inner.devtool_hook.clone() {
            devtools::attach(&store, hook);
        }

        tracing::info!(
            strict,
            devtools = devtools_enabled,
            plugins = plugins.len(),
            "store created"
        );
        Ok(store)
    }

    /// Snapshot of the whole state tree.
    pub fn state(&self) -> Value {
        self.inner.state.snapshot()
    }

    /// The observed state carrier. Writes through it outside a mutation are
    /// reported in strict mode.
    pub fn state_tree(&self) -> &StateTree {
        &self.inner.state
    }

    pub fn getters(&self) -> Getters {
        Getters::new(self.inner.view.read().clone(), String::new())
    }

    pub fn is_strict(&self) -> bool {
        self.inner.state.is_strict()
    }

    /// True when both handles point at the same store.
    pub fn same_store(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn report(&self, error: &StoreError) {
        self.inner.reporter.report(error);
    }

    pub(crate) fn has_mutation(&self, kind: &str) -> bool {
        self.inner.registry.read().mutations.contains_key(kind)
    }

    pub(crate) fn has_action(&self, kind: &str) -> bool {
        self.inner.registry.read().actions.contains_key(kind)
    }

    /// Swap the entire state tree.
    pub fn replace_state(&self, state: Value) {
        self.inner.state.replace(state);
    }

    /// Module path registered for a namespace such as `"a/b/"`.
    pub fn module_namespace_path(&self, namespace: &str) -> Option<Vec<String>> {
        self.inner.registry.read().namespaces.get(namespace).cloned()
    }

    pub fn has_module<P: AsRef<str>>(&self, path: &[P]) -> bool {
        self.inner.modules.read().get(&to_path(path)).is_some()
    }

    /// Attach a module (and its nested modules) at `path` at runtime.
    pub fn register_module<P: AsRef<str>>(
        &self,
        path: &[P],
        config: ModuleConfig,
        options: RegisterOptions,
    ) -> Result<(), StoreError> {
        let path = to_path(path);
        if path.is_empty() {
            return Err(StoreError::RootRegistration);
        }

        let registered = self.inner.modules.write().register(&path, config, true);
        if let Err(error) = registered {
            self.report(&error);
            return Err(error);
        }

        tracing::debug!(path = %path.join("/"), preserve_state = options.preserve_state, "module registered");
        self.install(&path, !options.preserve_state);
        self.reset_view(false);
        Ok(())
    }

    /// Detach a module registered with [`register_module`](Self::register_module)
    /// and drop its state. Modules from the initial configuration are left alone.
    pub fn unregister_module<P: AsRef<str>>(&self, path: &[P]) -> Result<(), StoreError> {
        let path = to_path(path);

        let removed = self.inner.modules.write().unregister(&path);
        match removed {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(path = %path.join("/"), "refusing to unregister a static module");
                return Ok(());
            }
            Err(error) => {
                self.report(&error);
                return Err(error);
            }
        }

        if let Some((key, parent)) = path.split_last() {
            self.inner.state.delete_property(parent, key);
        }
        tracing::debug!(path = %path.join("/"), "module unregistered");
        self.reset_store(false);
        Ok(())
    }

    /// Swap in new handler definitions while keeping the current state.
    pub fn hot_update(&self, config: ModuleConfig) {
        self.inner.modules.write().update(&config);
        tracing::info!("hot update applied");
        self.reset_store(true);
    }

    /// Rebuild every lookup table from the module tree.
    fn reset_store(&self, hot: bool) {
        *self.inner.registry.write() = Registry::default();
        self.install(&[], false);
        self.reset_view(hot);
    }

    /// Replace the getter view. On a hot rebuild the state version is bumped
    /// so every watcher re-evaluates against the new definitions.
    fn reset_view(&self, hot: bool) {
        let entries = self.inner.registry.read().getters.clone();
        let view = Arc::new(GetterView::new(entries, Arc::downgrade(&self.inner)));
        tracing::debug!(getters = view.len(), hot, "getter view rebuilt");

        // The retired view lives on in any `Getters` handle still holding it.
        *self.inner.view.write() = view;

        if hot {
            self.inner.state.touch();
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("strict", &self.is_strict())
            .field("version", &self.inner.state.version())
            .finish()
    }
}

fn to_path<P: AsRef<str>>(path: &[P]) -> Vec<String> {
    path.iter().map(|key| key.as_ref().to_string()).collect()
}
