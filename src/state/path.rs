use serde_json::Value;

/// Follow `path` from `root` through nested objects.
pub fn nested<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |state, key| state.get(key.as_str()))
}

pub fn nested_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    path.iter()
        .try_fold(root, |state, key| state.get_mut(key.as_str()))
}
