//! Devtools bridge.
//!
//! A [`DevtoolHook`] sees the initial state, every committed mutation and
//! every failing action handler.

use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;
use crate::store::{MutationRecord, Store};

#[derive(Debug)]
pub enum DevtoolEvent<'a> {
    Init(&'a Value),
    Mutation(&'a MutationRecord, &'a Value),
    Error(&'a StoreError),
}

pub trait DevtoolHook: Send + Sync {
    fn emit(&self, event: DevtoolEvent<'_>);
}

/// Announce the store and forward its mutations to `hook`.
pub(crate) fn attach(store: &Store, hook: Arc<dyn DevtoolHook>) {
    hook.emit(DevtoolEvent::Init(&store.state()));

    // The subscription lives as long as the store.
    let _ = store.subscribe(Arc::new(move |record: &MutationRecord, state: &Value| {
        hook.emit(DevtoolEvent::Mutation(record, state));
    }));
    tracing::debug!("devtools attached");
}
