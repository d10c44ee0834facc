//! Error taxonomy for the store.
//!
//! Most variants are *reported* through the [`Reporter`](crate::diagnostics::Reporter)
//! channel and never abort the caller. Only construction against an unbound
//! host is treated as fatal.

use thiserror::Error;

/// Which side of an action a subscriber hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    After,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookPhase::Before => write!(f, "before"),
            HookPhase::After => write!(f, "after"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    // === Host binding ===
    #[error("store host is not installed; call Host::install() before creating a store")]
    HostNotInstalled,

    #[error("store host already installed; install() should be called only once")]
    AlreadyInstalled,

    // === Configuration validation ===
    #[error("{field} should be {expected} but \"{field}.{key}\" in module \"{path}\" is not")]
    InvalidModule {
        path: String,
        field: &'static str,
        key: String,
        expected: &'static str,
    },

    #[error("expects string as the type, but found {found}")]
    InvalidCall { found: String },

    #[error("cannot register the root module by using register_module")]
    RootRegistration,

    // === Routing ===
    #[error("unknown mutation type: {kind}")]
    UnknownMutation { kind: String },

    #[error("unknown action type: {kind}")]
    UnknownAction { kind: String },

    #[error("unknown local mutation type: {local}, global type: {global}")]
    UnknownLocalMutation { local: String, global: String },

    #[error("unknown local action type: {local}, global type: {global}")]
    UnknownLocalAction { local: String, global: String },

    #[error("duplicate getter key: {key}")]
    DuplicateGetter { key: String },

    #[error("duplicate namespace {namespace} for the namespaced module {path}")]
    DuplicateNamespace { namespace: String, path: String },

    #[error("module not found at path \"{path}\"")]
    ModuleNotFound { path: String },

    #[error("no state found for module at path \"{path}\"")]
    MissingState { path: String },

    #[error("state at path \"{path}\" is not an object; cannot attach module state")]
    NotAnObject { path: String },

    #[error("state field \"{field}\" was overridden by a module with the same name at \"{path}\"")]
    StateFieldOverridden { field: String, path: String },

    // === Strict mode ===
    #[error("do not mutate store state outside mutation handlers")]
    StrictModeViolation,

    // === Hot reload ===
    #[error("trying to add a new module '{key}' on hot reloading, manual reload is needed")]
    HotReloadNewModule { key: String },

    // === Subscribers & actions ===
    #[error("error in {phase} action subscribers: {source}")]
    SubscriberFailed {
        phase: HookPhase,
        #[source]
        source: anyhow::Error,
    },

    #[error("action \"{kind}\" failed: {source}")]
    ActionFailed {
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("action \"{kind}\" did not run to completion: {source}")]
    ActionAborted {
        kind: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl StoreError {
    /// Warnings describe recoverable shape problems; everything else is an error.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            StoreError::StateFieldOverridden { .. }
                | StoreError::HotReloadNewModule { .. }
                | StoreError::SubscriberFailed { .. }
        )
    }
}

/// Render a module path the way diagnostics print it (`a.b.c`).
pub(crate) fn display_path(path: &[String]) -> String {
    path.join(".")
}
