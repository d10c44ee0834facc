use std::sync::Arc;

use serde_json::Value;

use crate::config::{ActionConfig, GetterFn, ModuleConfig, MutationFn};
use crate::store::LocalContext;

/// One node of the module tree.
///
/// Holds the raw configuration it was built from, its children, the state
/// instance created for it at registration, and (once installed) its
/// [`LocalContext`].
pub struct Module {
    raw: ModuleConfig,
    runtime: bool,
    children: Vec<(String, Module)>,
    state: Value,
    context: Option<Arc<LocalContext>>,
}

impl Module {
    /// Create a module; its state is instantiated here, fresh per instance.
    pub(crate) fn new(raw: ModuleConfig, runtime: bool) -> Self {
        let state = raw.instantiate_state();
        Self {
            raw,
            runtime,
            children: Vec::new(),
            state,
            context: None,
        }
    }

    pub fn namespaced(&self) -> bool {
        self.raw.namespaced
    }

    /// True for modules registered after the store was built.
    pub fn is_runtime(&self) -> bool {
        self.runtime
    }

    /// Instance state that has not been attached to a store yet.
    pub fn pending_state(&self) -> &Value {
        &self.state
    }

    /// Move the instance state out for attaching to the store's tree.
    pub(crate) fn take_state(&mut self) -> Value {
        std::mem::take(&mut self.state)
    }

    pub fn context(&self) -> Option<&Arc<LocalContext>> {
        self.context.as_ref()
    }

    pub(crate) fn set_context(&mut self, context: Arc<LocalContext>) {
        self.context = Some(context);
    }

    pub fn get_child(&self, key: &str) -> Option<&Module> {
        self.children
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, child)| child)
    }

    pub(crate) fn get_child_mut(&mut self, key: &str) -> Option<&mut Module> {
        self.children
            .iter_mut()
            .find(|(existing, _)| existing == key)
            .map(|(_, child)| child)
    }

    /// Attach `module` under `key`, replacing any previous child with that key.
    pub fn add_child(&mut self, key: impl Into<String>, module: Module) {
        let key = key.into();
        match self.get_child_mut(&key) {
            Some(slot) => *slot = module,
            None => self.children.push((key, module)),
        }
    }

    pub fn remove_child(&mut self, key: &str) -> Option<Module> {
        let index = self.children.iter().position(|(existing, _)| existing == key)?;
        Some(self.children.remove(index).1)
    }

    /// Replace the handler maps and the namespaced flag with those of `raw`.
    ///
    /// State and children are left alone; the collection walks children
    /// itself.
    pub fn update(&mut self, raw: &ModuleConfig) {
        self.raw.namespaced = raw.namespaced;
        self.raw.getters = raw.getters.clone();
        self.raw.mutations = raw.mutations.clone();
        self.raw.actions = raw.actions.clone();
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Module)> + '_ {
        self.children.iter().map(|(key, child)| (key.as_str(), child))
    }

    pub(crate) fn children_mut(&mut self) -> impl Iterator<Item = (&str, &mut Module)> + '_ {
        self.children.iter_mut().map(|(key, child)| (key.as_str(), child))
    }

    pub fn mutations(&self) -> impl Iterator<Item = (&str, &MutationFn)> + '_ {
        self.raw.mutations.iter().map(|(key, handler)| (key.as_str(), handler))
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &ActionConfig)> + '_ {
        self.raw.actions.iter().map(|(key, action)| (key.as_str(), action))
    }

    pub fn getters(&self) -> impl Iterator<Item = (&str, &GetterFn)> + '_ {
        self.raw.getters.iter().map(|(key, getter)| (key.as_str(), getter))
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("namespaced", &self.namespaced())
            .field("runtime", &self.runtime)
            .field("children", &self.children)
            .finish()
    }
}
