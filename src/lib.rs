//! Centralized state store built from a tree of modules.
//!
//! State changes go through synchronous, named mutations; asynchronous work
//! goes through actions; derived values are exposed as cached getters.
//! Modules may be namespaced, registered at runtime and hot-reloaded.

pub mod config;
pub mod devtools;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod module;
pub mod state;
pub mod store;

pub use config::{ActionConfig, ModuleConfig, StoreOptions, StoreSettings};
pub use error::StoreError;
pub use host::Host;
pub use store::{Call, RegisterOptions, Store, WatchOptions};
