use std::sync::Arc;

use crate::config::validate::check_raw_module;
use crate::config::ModuleConfig;
use crate::diagnostics::Reporter;
use crate::error::{display_path, StoreError};
use crate::module::Module;

/// The module tree built from the root configuration.
///
/// Paths are sequences of child keys from the root; the empty path is the
/// root itself.
pub struct ModuleCollection {
    root: Module,
    reporter: Arc<dyn Reporter>,
}

impl ModuleCollection {
    /// Build the static tree; none of its modules can be unregistered.
    pub fn new(raw_root: ModuleConfig, reporter: Arc<dyn Reporter>) -> Self {
        let root = build(&[], raw_root, false, reporter.as_ref());
        Self { root, reporter }
    }

    pub fn root(&self) -> &Module {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Module {
        &mut self.root
    }

    pub fn get(&self, path: &[String]) -> Option<&Module> {
        path.iter()
            .try_fold(&self.root, |module, key| module.get_child(key))
    }

    pub(crate) fn get_mut(&mut self, path: &[String]) -> Option<&mut Module> {
        path.iter()
            .try_fold(&mut self.root, |module, key| module.get_child_mut(key))
    }

    /// Concatenate `key/` for every namespaced module from the root down to
    /// `path` (inclusive). The root never contributes a segment.
    pub fn get_namespace(&self, path: &[String]) -> Result<String, StoreError> {
        let mut module = &self.root;
        let mut namespace = String::new();
        for (depth, key) in path.iter().enumerate() {
            module = module
                .get_child(key)
                .ok_or_else(|| StoreError::ModuleNotFound {
                    path: display_path(&path[..=depth]),
                })?;
            if module.namespaced() {
                namespace.push_str(key);
                namespace.push('/');
            }
        }
        Ok(namespace)
    }

    /// Build a module (and its nested modules) from `raw` and attach it at
    /// `path`. An empty path replaces the root.
    pub fn register(
        &mut self,
        path: &[String],
        raw: ModuleConfig,
        runtime: bool,
    ) -> Result<(), StoreError> {
        let Some((key, parent_path)) = path.split_last() else {
            self.root = build(&[], raw, runtime, self.reporter.as_ref());
            return Ok(());
        };

        if self.get(parent_path).is_none() {
            return Err(StoreError::ModuleNotFound {
                path: display_path(parent_path),
            });
        }

        let module = build(path, raw, runtime, self.reporter.as_ref());
        if let Some(parent) = self.get_mut(parent_path) {
            parent.add_child(key.clone(), module);
        }
        Ok(())
    }

    /// Detach the module at `path`.
    ///
    /// Returns `Ok(false)` without touching anything when the module was part
    /// of the initial configuration.
    pub fn unregister(&mut self, path: &[String]) -> Result<bool, StoreError> {
        let Some((key, parent_path)) = path.split_last() else {
            return Ok(false);
        };
        let missing = || StoreError::ModuleNotFound {
            path: display_path(path),
        };

        let parent = self.get_mut(parent_path).ok_or_else(missing)?;
        let child = parent.get_child(key).ok_or_else(missing)?;
        if !child.is_runtime() {
            return Ok(false);
        }

        parent.remove_child(key);
        Ok(true)
    }

    /// Merge a new root configuration into the existing tree in place.
    ///
    /// Only handler maps and namespaced flags change. A module key that did
    /// not exist before is reported and stops the update of that subtree.
    pub fn update(&mut self, raw_root: &ModuleConfig) {
        update(&[], &mut self.root, raw_root, self.reporter.as_ref());
    }
}

fn build(path: &[String], mut raw: ModuleConfig, runtime: bool, reporter: &dyn Reporter) -> Module {
    let nested = std::mem::take(&mut raw.modules);
    let mut module = Module::new(raw.clone(), runtime);
    raw.modules = nested;

    for problem in check_raw_module(path, &raw, Some(module.pending_state())) {
        reporter.report(&problem);
    }

    for (key, child_raw) in raw.modules {
        let child_path = child_path(path, &key);
        module.add_child(key, build(&child_path, child_raw, runtime, reporter));
    }
    module
}

fn update(path: &[String], target: &mut Module, raw: &ModuleConfig, reporter: &dyn Reporter) {
    for problem in check_raw_module(path, raw, None) {
        reporter.report(&problem);
    }

    target.update(raw);

    for (key, child_raw) in &raw.modules {
        let Some(child) = target.get_child_mut(key) else {
            reporter.report(&StoreError::HotReloadNewModule { key: key.clone() });
            return;
        };
        update(&child_path(path, key), child, child_raw, reporter);
    }
}

pub(crate) fn child_path(parent: &[String], key: &str) -> Vec<String> {
    let mut path = parent.to_vec();
    path.push(key.to_string());
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::TracingReporter;

    fn path(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn collection(root: ModuleConfig) -> ModuleCollection {
        ModuleCollection::new(root, Arc::new(TracingReporter))
    }

    #[test]
    fn namespace_skips_plain_modules() {
        let modules = collection(
            ModuleConfig::new().module(
                "p1",
                ModuleConfig::new()
                    .namespaced(true)
                    .module("p2", ModuleConfig::new()),
            ),
        );
        assert_eq!(modules.get_namespace(&path(&["p1", "p2"])).unwrap(), "p1/");
    }

    #[test]
    fn namespace_concatenates_namespaced_ancestors() {
        let modules = collection(
            ModuleConfig::new().module(
                "p1",
                ModuleConfig::new()
                    .namespaced(true)
                    .module("p2", ModuleConfig::new().namespaced(true)),
            ),
        );
        assert_eq!(modules.get_namespace(&path(&["p1", "p2"])).unwrap(), "p1/p2/");
        assert_eq!(modules.get_namespace(&[]).unwrap(), "");
    }

    #[test]
    fn root_is_never_namespaced() {
        let modules = collection(ModuleConfig::new().namespaced(true));
        assert_eq!(modules.get_namespace(&[]).unwrap(), "");
    }

    #[test]
    fn missing_segment_is_a_lookup_error() {
        let modules = collection(ModuleConfig::new());
        assert!(modules.get(&path(&["nope"])).is_none());
        assert!(matches!(
            modules.get_namespace(&path(&["nope"])),
            Err(StoreError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn static_modules_cannot_be_unregistered() {
        let mut modules = collection(ModuleConfig::new().module("fixed", ModuleConfig::new()));
        assert!(!modules.unregister(&path(&["fixed"])).unwrap());
        assert!(modules.get(&path(&["fixed"])).is_some());
    }

    #[test]
    fn runtime_modules_can_be_unregistered() {
        let mut modules = collection(ModuleConfig::new());
        modules
            .register(
                &path(&["dyn"]),
                ModuleConfig::new().module("inner", ModuleConfig::new()),
                true,
            )
            .unwrap();
        assert!(modules.get(&path(&["dyn", "inner"])).unwrap().is_runtime());
        assert!(modules.unregister(&path(&["dyn"])).unwrap());
        assert!(modules.get(&path(&["dyn"])).is_none());
    }

    #[test]
    fn register_under_missing_parent_fails() {
        let mut modules = collection(ModuleConfig::new());
        let result = modules.register(&path(&["a", "b"]), ModuleConfig::new(), true);
        assert!(matches!(result, Err(StoreError::ModuleNotFound { .. })));
    }

    #[test]
    fn update_refuses_new_modules() {
        let mut modules = collection(ModuleConfig::new().module("a", ModuleConfig::new()));
        modules.update(
            &ModuleConfig::new()
                .module("a", ModuleConfig::new().namespaced(true))
                .module("b", ModuleConfig::new()),
        );
        assert!(modules.get(&path(&["a"])).unwrap().namespaced());
        assert!(modules.get(&path(&["b"])).is_none());
    }
}
