//! Walks the module tree and wires every module into the store: state graft,
//! local context, handler registration.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{ActionConfig, GetterFn, MutationFn};
use crate::module::{child_path, Module};
use crate::store::{LocalContext, Store};

/// Everything the store needs from one module, gathered while the module
/// tree is locked so that no user code runs under that lock.
pub(crate) struct Installation {
    pub(crate) path: Vec<String>,
    pub(crate) namespaced: bool,
    pub(crate) context: Arc<LocalContext>,
    /// Present when the module's state still has to be attached.
    pub(crate) state: Option<Value>,
    pub(crate) mutations: Vec<(String, MutationFn)>,
    pub(crate) actions: Vec<(String, ActionConfig)>,
    pub(crate) getters: Vec<(String, GetterFn)>,
}

impl Store {
    /// Install the module at `path` and all of its descendants.
    ///
    /// With `graft` unset the state tree is assumed to already hold the
    /// modules' state (hot reload, `preserve_state`, full reset).
    pub(crate) fn install(&self, path: &[String], graft: bool) {
        let mut plan = {
            let mut modules = self.inner.modules.write();
            let namespace = match modules.get_namespace(path) {
                Ok(namespace) => namespace,
                Err(error) => {
                    drop(modules);
                    self.report(&error);
                    return;
                }
            };
            let Some(module) = modules.get_mut(path) else {
                return;
            };
            let mut plan = Vec::new();
            collect(module, path.to_vec(), namespace, graft, &mut plan);
            plan
        };

        tracing::debug!(
            path = %path.join("/"),
            modules = plan.len(),
            graft,
            "installing modules"
        );

        for module in &mut plan {
            let Some(state) = module.state.take() else {
                continue;
            };
            if let Some((key, parent)) = module.path.split_last() {
                self.inner.state.set_property(parent, key, state);
            }
        }

        let mut problems = Vec::new();
        {
            let mut registry = self.inner.registry.write();
            for module in plan {
                registry.register(module, &mut problems);
            }
        }
        for problem in &problems {
            self.report(problem);
        }
    }
}

fn collect(
    module: &mut Module,
    path: Vec<String>,
    namespace: String,
    graft: bool,
    plan: &mut Vec<Installation>,
) {
    // Keep the existing context when nothing about its scope changed.
    let context = match module.context() {
        Some(context) if context.namespace() == namespace && context.path() == path => {
            context.clone()
        }
        _ => Arc::new(LocalContext::new(namespace.clone(), path.clone())),
    };
    module.set_context(context.clone());

    let state = (graft && !path.is_empty()).then(|| module.take_state());

    plan.push(Installation {
        path: path.clone(),
        namespaced: module.namespaced(),
        context,
        state,
        mutations: module
            .mutations()
            .map(|(key, handler)| (key.to_string(), handler.clone()))
            .collect(),
        actions: module
            .actions()
            .map(|(key, action)| (key.to_string(), action.clone()))
            .collect(),
        getters: module
            .getters()
            .map(|(key, getter)| (key.to_string(), getter.clone()))
            .collect(),
    });

    for (key, child) in module.children_mut() {
        let child_namespace = if child.namespaced() {
            format!("{namespace}{key}/")
        } else {
            namespace.clone()
        };
        collect(child, child_path(&path, key), child_namespace, graft, plan);
    }
}
