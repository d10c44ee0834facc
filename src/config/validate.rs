//! Shape checks for raw module configuration.
//!
//! Handler callability is guaranteed by the types, so what remains is the
//! state shape and key sanity. Only compiled into checks when
//! `debug_assertions` is on.

use serde_json::Value;

use crate::config::ModuleConfig;
use crate::error::{display_path, StoreError};

/// Collect every shape problem in `config` (not its nested modules; the
/// collection validates each node as it registers it).
pub(crate) fn check_raw_module(
    path: &[String],
    config: &ModuleConfig,
    state: Option<&Value>,
) -> Vec<StoreError> {
    if !cfg!(debug_assertions) {
        return Vec::new();
    }

    let mut problems = Vec::new();
    let module_path = display_path(path);

    if state.is_some_and(|state| !state.is_object()) {
        problems.push(StoreError::InvalidModule {
            path: module_path.clone(),
            field: "state",
            key: "<factory>".to_string(),
            expected: "an object",
        });
    }

    let fields: [(&'static str, Vec<&String>); 4] = [
        ("mutations", config.mutations.iter().map(|(k, _)| k).collect()),
        ("actions", config.actions.iter().map(|(k, _)| k).collect()),
        ("getters", config.getters.iter().map(|(k, _)| k).collect()),
        ("modules", config.modules.iter().map(|(k, _)| k).collect()),
    ];

    for (field, keys) in fields {
        for key in keys.into_iter().filter(|key| key.is_empty()) {
            problems.push(StoreError::InvalidModule {
                path: module_path.clone(),
                field,
                key: key.clone(),
                expected: "a non-empty key",
            });
        }
    }

    problems
}
