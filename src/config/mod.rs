//! Store configuration: raw module declarations, store options and
//! file-backed settings.

mod loader;
mod types;
pub(crate) mod validate;

pub use loader::{ConfigError, StoreSettings};
pub use types::{
    ActionConfig, ActionFn, ActionFuture, GetterFn, ModuleConfig, MutationFn, Plugin, StateFactory,
    StoreOptions,
};
