//! The observed state carrier.
//!
//! A [`StateTree`] owns the whole JSON state of a store. Every write bumps a
//! version counter (the dependency signal cached getters compare against)
//! and is pushed synchronously to deep-change observers once the write lock
//! has been released. In strict mode, writes that do not go through a commit
//! are reported.

mod path;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::diagnostics::Reporter;
use crate::error::{display_path, StoreError};

pub use path::{nested, nested_mut};

/// Callback run after every state change with the new version.
pub(crate) type Observer = Arc<dyn Fn(u64) + Send + Sync>;

pub struct StateTree {
    root: RwLock<Value>,
    version: AtomicU64,
    committing: AtomicBool,
    strict: bool,
    reporter: Arc<dyn Reporter>,
    observers: Mutex<Vec<(u64, Observer)>>,
    next_observer: AtomicU64,
}

impl StateTree {
    pub(crate) fn new(root: Value, strict: bool, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            root: RwLock::new(root),
            version: AtomicU64::new(0),
            committing: AtomicBool::new(false),
            strict,
            reporter,
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(0),
        }
    }

    /// Monotonic change counter.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// True only while a mutation (or an internal state graft) is running.
    pub fn is_committing(&self) -> bool {
        self.committing.load(Ordering::SeqCst)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Borrow the state. Re-entrant: a getter may read while another read is
    /// in progress further up the stack.
    pub fn read<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let guard = self.root.read_recursive();
        f(&guard)
    }

    pub fn snapshot(&self) -> Value {
        self.read(Value::clone)
    }

    /// Mutate the state in place from outside a mutation.
    ///
    /// In strict mode every such write is reported as a
    /// [`StoreError::StrictModeViolation`].
    pub fn write<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let (out, version) = {
            let mut guard = self.root.write();
            let out = f(&mut guard);
            (out, self.bump())
        };
        if self.strict {
            self.reporter.report(&StoreError::StrictModeViolation);
        }
        self.notify(version);
        out
    }

    /// Sanctioned write: the committing flag is raised and lowered while the
    /// write lock is held, so concurrent commits never see each other's flag.
    /// Observers run once the lock is released and the flag is down.
    pub(crate) fn commit<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let (out, version) = {
            let mut guard = self.root.write();
            self.committing.store(true, Ordering::SeqCst);
            let _lower = scopeguard::guard((), |()| {
                self.committing.store(false, Ordering::SeqCst);
            });
            let out = f(&mut guard);
            (out, self.bump())
        };
        self.notify(version);
        out
    }

    /// Signal a change without touching any value; forces every observer
    /// to re-evaluate.
    pub(crate) fn touch(&self) {
        let version = {
            let _guard = self.root.write();
            self.bump()
        };
        self.notify(version);
    }

    /// Attach `value` as `key` under the object at `parent`, reporting when an
    /// existing field is overwritten. Runs inside the committing scope.
    pub(crate) fn set_property(&self, parent: &[String], key: &str, value: Value) {
        let problem = self.commit(|root| {
            let Some(target) = nested_mut(root, parent).and_then(Value::as_object_mut) else {
                return Some(StoreError::NotAnObject {
                    path: display_path(parent),
                });
            };
            let overwritten = target.insert(key.to_string(), value).is_some();
            overwritten.then(|| StoreError::StateFieldOverridden {
                field: key.to_string(),
                path: display_path(&join(parent, key)),
            })
        });
        if let Some(problem) = problem {
            self.reporter.report(&problem);
        }
    }

    /// Remove `key` from the object at `parent` inside the committing scope.
    pub(crate) fn delete_property(&self, parent: &[String], key: &str) {
        self.commit(|root| {
            if let Some(target) = nested_mut(root, parent).and_then(Value::as_object_mut) {
                target.remove(key);
            }
        });
    }

    /// Swap the entire tree inside the committing scope.
    pub(crate) fn replace(&self, state: Value) {
        self.commit(|root| *root = state);
    }

    pub(crate) fn observe(&self, observer: Observer) -> u64 {
        let id = self.next_observer.fetch_add(1, Ordering::SeqCst);
        self.observers.lock().push((id, observer));
        id
    }

    pub(crate) fn unobserve(&self, id: u64) {
        self.observers.lock().retain(|(existing, _)| *existing != id);
    }

    /// Called with the write lock held.
    fn bump(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn notify(&self, version: u64) {
        // Snapshot so observers may unsubscribe while being notified.
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(version);
        }
    }
}

fn join(parent: &[String], key: &str) -> Vec<String> {
    let mut path = parent.to_vec();
    path.push(key.to_string());
    path
}
