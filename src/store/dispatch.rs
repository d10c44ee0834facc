//! Commit and dispatch routing.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::devtools::DevtoolEvent;
use crate::error::{display_path, HookPhase, StoreError};
use crate::state::nested_mut;
use crate::store::{ActionContext, ActionRecord, ActionSubscriber, Call, MutationRecord, Store};

/// Outcome of a dispatch: `Ok(None)` when no handler is registered for the
/// type, otherwise the handler's value (an array of values when several
/// modules handle the same type).
pub type DispatchResult = Result<Option<Value>, StoreError>;

impl Store {
    pub fn commit(&self, kind: &str, payload: Value) -> Result<(), StoreError> {
        self.commit_call(Call::new(kind, payload))
    }

    /// Run every handler registered for `call.kind`, in registration order,
    /// inside the committing scope, then notify subscribers.
    pub fn commit_call(&self, call: Call) -> Result<(), StoreError> {
        let Call { kind, payload, .. } = call;

        let handlers = self.inner.registry.read().mutations.get(&kind).cloned();
        let Some(handlers) = handlers.filter(|handlers| !handlers.is_empty()) else {
            let error = StoreError::UnknownMutation { kind };
            self.report(&error);
            return Err(error);
        };

        tracing::trace!(kind = %kind, handlers = handlers.len(), "commit");

        let state = &self.inner.state;
        let missing = state.commit(|root| {
            let mut missing = Vec::new();
            for mutation in &handlers {
                match nested_mut(root, mutation.context.path()) {
                    Some(local) => (mutation.handler)(local, payload.clone()),
                    None => missing.push(StoreError::MissingState {
                        path: display_path(mutation.context.path()),
                    }),
                }
            }
            missing
        });
        for problem in &missing {
            self.report(problem);
        }

        let record = MutationRecord { kind, payload };
        // Snapshot so a subscriber may unsubscribe from inside its callback.
        let subscribers = self.inner.subscribers.lock().clone();
        if !subscribers.is_empty() {
            let snapshot = state.snapshot();
            for subscriber in subscribers {
                subscriber(&record, &snapshot);
            }
        }

        Ok(())
    }

    pub fn dispatch(&self, kind: &str, payload: Value) -> BoxFuture<'static, DispatchResult> {
        self.dispatch_call(Call::new(kind, payload))
    }

    /// Route an action.
    ///
    /// Routing, the `before` hooks and the start of every handler happen
    /// before this returns; handlers run as Tokio tasks and finish even if
    /// the returned future is dropped. Must be called within a Tokio runtime.
    pub fn dispatch_call(&self, call: Call) -> BoxFuture<'static, DispatchResult> {
        let Call { kind, payload, .. } = call;

        let handlers = self.inner.registry.read().actions.get(&kind).cloned();
        let Some(handlers) = handlers.filter(|handlers| !handlers.is_empty()) else {
            self.report(&StoreError::UnknownAction { kind });
            return futures::future::ready(Ok(None)).boxed();
        };

        tracing::trace!(kind = %kind, handlers = handlers.len(), "dispatch");

        let record = ActionRecord {
            kind: kind.clone(),
            payload: payload.clone(),
        };
        self.run_action_hooks(HookPhase::Before, &record);

        let tasks: Vec<JoinHandle<anyhow::Result<Value>>> = handlers
            .into_iter()
            .map(|action| {
                let context = ActionContext::new(self.clone(), action.context.clone());
                tokio::spawn((action.handler)(context, payload.clone()))
            })
            .collect();

        let store = self.clone();
        async move {
            let value = store.settle(&kind, tasks).await?;
            store.run_action_hooks(HookPhase::After, &record);
            Ok(Some(value))
        }
        .boxed()
    }

    /// Wait for every handler; the first failure wins.
    async fn settle(
        &self,
        kind: &str,
        tasks: Vec<JoinHandle<anyhow::Result<Value>>>,
    ) -> Result<Value, StoreError> {
        let single = tasks.len() == 1;
        let pending = tasks.into_iter().map(|task| {
            let store = self.clone();
            let kind = kind.to_string();
            async move {
                let error = match task.await {
                    Ok(Ok(value)) => return Ok(value),
                    Ok(Err(source)) => StoreError::ActionFailed { kind, source },
                    Err(source) => StoreError::ActionAborted { kind, source },
                };
                if let Some(hook) = &store.inner.devtool_hook {
                    hook.emit(DevtoolEvent::Error(&error));
                }
                Err(error)
            }
        });

        let mut values = futures::future::try_join_all(pending).await?;
        if single {
            Ok(values.pop().unwrap_or_default())
        } else {
            Ok(Value::Array(values))
        }
    }

    fn run_action_hooks(&self, phase: HookPhase, record: &ActionRecord) {
        let subscribers: Vec<Arc<ActionSubscriber>> = self.inner.action_subscribers.lock().clone();
        let hooks: Vec<_> = subscribers
            .iter()
            .filter_map(|subscriber| match phase {
                HookPhase::Before => subscriber.before.clone(),
                HookPhase::After => subscriber.after.clone(),
            })
            .collect();
        if hooks.is_empty() {
            return;
        }

        let snapshot = self.inner.state.snapshot();
        for hook in hooks {
            if let Err(source) = hook(record, &snapshot) {
                self.report(&StoreError::SubscriberFailed { phase, source });
            }
        }
    }
}
