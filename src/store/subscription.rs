use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::store::{Getters, Store};

/// A committed mutation as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub kind: String,
    pub payload: Value,
}

/// A dispatched action as seen by action subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub kind: String,
    pub payload: Value,
}

/// Runs after every commit with the record and a snapshot of the new state.
pub type MutationSubscriber = Arc<dyn Fn(&MutationRecord, &Value) + Send + Sync>;

/// Action hook; an `Err` is reported and does not interrupt the dispatch.
pub type ActionHook = Arc<dyn Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync>;

/// Removes exactly the entry it was returned for.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Stops a [`Store::watch`].
pub type Unwatch = Unsubscribe;

/// Hooks run around every dispatched action.
#[derive(Clone, Default)]
pub struct ActionSubscriber {
    pub before: Option<ActionHook>,
    pub after: Option<ActionHook>,
}

impl ActionSubscriber {
    /// The plain-callable form: runs before the handlers.
    pub fn before<F>(hook: F) -> Self
    where
        F: Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            before: Some(Arc::new(hook)),
            after: None,
        }
    }

    pub fn after<F>(hook: F) -> Self
    where
        F: Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            before: None,
            after: Some(Arc::new(hook)),
        }
    }

    pub fn with_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ActionRecord, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Call the callback once right away with `(current, null)`.
    pub immediate: bool,
}

/// Push `entry` unless the same allocation is already subscribed.
pub(crate) fn generic_subscribe<T>(list: &Arc<Mutex<Vec<Arc<T>>>>, entry: Arc<T>) -> Unsubscribe
where
    T: ?Sized + Send + Sync + 'static,
{
    {
        let mut subscribers = list.lock();
        if !subscribers.iter().any(|existing| same(existing, &entry)) {
            subscribers.push(entry.clone());
        }
    }

    let list = Arc::downgrade(list);
    Box::new(move || {
        if let Some(list) = list.upgrade() {
            let mut subscribers = list.lock();
            if let Some(index) = subscribers.iter().position(|existing| same(existing, &entry)) {
                subscribers.remove(index);
            }
        }
    })
}

fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

impl Store {
    /// Subscribe to committed mutations.
    pub fn subscribe(&self, subscriber: MutationSubscriber) -> Unsubscribe {
        generic_subscribe(&self.inner.subscribers, subscriber)
    }

    /// Subscribe to dispatched actions.
    pub fn subscribe_action(&self, subscriber: Arc<ActionSubscriber>) -> Unsubscribe {
        generic_subscribe(&self.inner.action_subscribers, subscriber)
    }

    /// Watch a value derived from `(state, getters)`.
    ///
    /// The getter is re-evaluated synchronously after every state change;
    /// `callback(new, old)` runs only when the value actually differs.
    pub fn watch<G, C>(&self, getter: G, callback: C, options: WatchOptions) -> Unwatch
    where
        G: Fn(&Value, &Getters) -> Value + Send + Sync + 'static,
        C: Fn(&Value, &Value) + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(&self.inner);
        let evaluate = move || -> Option<Value> {
            let inner = weak.upgrade()?;
            let getters = Store { inner: inner.clone() }.getters();
            Some(inner.state.read(|state| getter(state, &getters)))
        };

        let initial = evaluate().unwrap_or_default();
        if options.immediate {
            callback(&initial, &Value::Null);
        }

        let last = Mutex::new(initial);
        let id = self.inner.state.observe(Arc::new(move |_version| {
            let Some(current) = evaluate() else {
                return;
            };
            let previous = {
                let mut last = last.lock();
                if *last == current {
                    return;
                }
                std::mem::replace(&mut *last, current.clone())
            };
            callback(&current, &previous);
        }));

        let weak = Arc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.state.unobserve(id);
            }
        })
    }
}
