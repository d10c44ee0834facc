//! Host binding and store injection.
//!
//! [`Host`] stands in for the UI framework the store plugs into. It is passed
//! to [`Store::new`] explicitly; there is no process-wide singleton.
//! [`Component`] models how a store reaches components by tree position.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::StoreError;
use crate::store::Store;

#[derive(Debug, Default)]
pub struct Host {
    devtools: bool,
    installed: AtomicBool,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose stores enable devtools unless their options say otherwise.
    pub fn with_devtools(devtools: bool) -> Self {
        Self {
            devtools,
            installed: AtomicBool::new(false),
        }
    }

    /// Bind the host. A second call is reported and refused.
    pub fn install(&self) -> Result<(), StoreError> {
        if self.installed.swap(true, Ordering::SeqCst) {
            let error = StoreError::AlreadyInstalled;
            tracing::error!(error = %error, "host install");
            return Err(error);
        }
        tracing::debug!(devtools = self.devtools, "host installed");
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    pub fn devtools(&self) -> bool {
        self.devtools
    }
}

/// Where a component gets its own store from.
#[derive(Clone)]
pub enum StoreSource {
    Shared(Store),
    /// Called once when the component mounts.
    Factory(Arc<dyn Fn() -> Store + Send + Sync>),
}

#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub store: Option<StoreSource>,
}

impl ComponentOptions {
    pub fn with_store(store: Store) -> Self {
        Self {
            store: Some(StoreSource::Shared(store)),
        }
    }

    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Store + Send + Sync + 'static,
    {
        Self {
            store: Some(StoreSource::Factory(Arc::new(factory))),
        }
    }
}

/// A mounted component instance.
#[derive(Debug, Clone, Default)]
pub struct Component {
    store: Option<Store>,
}

impl Component {
    /// Resolve the component's store: its own when supplied, otherwise the
    /// nearest ancestor's.
    pub fn mount(options: ComponentOptions, parent: Option<&Component>) -> Self {
        let store = match options.store {
            Some(StoreSource::Shared(store)) => Some(store),
            Some(StoreSource::Factory(factory)) => Some(factory()),
            None => parent.and_then(|parent| parent.store.clone()),
        };
        Self { store }
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }
}
