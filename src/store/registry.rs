use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ActionFn, GetterFn, MutationFn};
use crate::error::{display_path, StoreError};
use crate::store::install::Installation;
use crate::store::LocalContext;

#[derive(Clone)]
pub(crate) struct WrappedMutation {
    pub(crate) handler: MutationFn,
    pub(crate) context: Arc<LocalContext>,
}

#[derive(Clone)]
pub(crate) struct WrappedAction {
    pub(crate) handler: ActionFn,
    pub(crate) context: Arc<LocalContext>,
}

#[derive(Clone)]
pub(crate) struct WrappedGetter {
    pub(crate) getter: GetterFn,
    pub(crate) context: Arc<LocalContext>,
}

/// Global lookup tables keyed by fully namespaced type.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) mutations: HashMap<String, Vec<WrappedMutation>>,
    pub(crate) actions: HashMap<String, Vec<WrappedAction>>,
    pub(crate) getters: HashMap<String, WrappedGetter>,
    /// Namespace -> module path.
    pub(crate) namespaces: HashMap<String, Vec<String>>,
}

impl Registry {
    /// Register one module's handlers. Duplicate getters and namespaces are
    /// pushed to `problems`; the earlier getter wins.
    pub(crate) fn register(&mut self, module: Installation, problems: &mut Vec<StoreError>) {
        let Installation {
            context,
            namespaced,
            mutations,
            actions,
            getters,
            ..
        } = module;
        let namespace = context.namespace();

        if namespaced {
            if self.namespaces.contains_key(namespace) {
                problems.push(StoreError::DuplicateNamespace {
                    namespace: namespace.to_string(),
                    path: display_path(context.path()),
                });
            }
            self.namespaces
                .insert(namespace.to_string(), context.path().to_vec());
        }

        for (key, handler) in mutations {
            self.mutations
                .entry(format!("{namespace}{key}"))
                .or_default()
                .push(WrappedMutation {
                    handler,
                    context: context.clone(),
                });
        }

        for (key, action) in actions {
            let kind = if action.root {
                key
            } else {
                format!("{namespace}{key}")
            };
            self.actions.entry(kind).or_default().push(WrappedAction {
                handler: action.handler,
                context: context.clone(),
            });
        }

        for (key, getter) in getters {
            let kind = format!("{namespace}{key}");
            if self.getters.contains_key(&kind) {
                problems.push(StoreError::DuplicateGetter { key: kind });
                continue;
            }
            self.getters.insert(
                kind,
                WrappedGetter {
                    getter,
                    context: context.clone(),
                },
            );
        }
    }
}
