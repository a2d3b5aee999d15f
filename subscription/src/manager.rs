//! View registry and notification batching.

use lectern_core::ChangeSet;
use lectern_parser::{Operation, Variables};
use lectern_query::{QueryExecutor, QueryResult, Resolution};
use lectern_store::RecordStore;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Handle identifying one subscribed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewToken(pub u64);

impl fmt::Display for ViewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// A view whose resolved data changed during a flush.
#[derive(Debug, Clone, PartialEq)]
pub struct Rerender {
    pub token: ViewToken,
    pub resolution: Resolution,
}

/// An attached view: its shape, variables and last resolution.
#[derive(Debug)]
struct View {
    operation: Operation,
    variables: Variables,
    last: Resolution,
}

/// Subscription manager.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    next_token: u64,
    views: BTreeMap<ViewToken, View>,
    /// Changed ids accumulated since the last flush.
    pending: ChangeSet,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a view, returning its token and initial resolution.
    pub fn subscribe(
        &mut self,
        operation: Operation,
        variables: Variables,
        store: &RecordStore,
    ) -> QueryResult<(ViewToken, Resolution)> {
        let variables = operation.with_defaults(&variables);
        let resolution = QueryExecutor::new(store).resolve(&operation, &variables)?;

        self.next_token += 1;
        let token = ViewToken(self.next_token);
        debug!(
            token = %token,
            dependencies = resolution.dependencies.len(),
            complete = resolution.is_complete(),
            "Attached view"
        );

        self.views.insert(
            token,
            View {
                operation,
                variables,
                last: resolution.clone(),
            },
        );
        Ok((token, resolution))
    }

    /// Detach a view. Safe to call at any time, including twice.
    pub fn unsubscribe(&mut self, token: ViewToken) -> bool {
        let removed = self.views.remove(&token).is_some();
        if removed {
            debug!(token = %token, "Detached view");
        }
        removed
    }

    /// Record changed ids for the next flush. Never resolves anything.
    pub fn notify(&mut self, changed: &ChangeSet) {
        self.pending.extend(changed.iter().cloned());
    }

    /// Check if a flush has work to do.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Re-resolve every view whose dependencies intersect the pending batch.
    ///
    /// Each affected view is resolved once and takes its fresh dependency
    /// set. A rerender is produced only when the resolved data or its
    /// completeness differs from the last one delivered.
    pub fn flush(&mut self, store: &RecordStore) -> Vec<Rerender> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let changed = std::mem::take(&mut self.pending);
        let executor = QueryExecutor::new(store);

        let mut rerenders = Vec::new();
        let mut resolved = 0;
        for (token, view) in self.views.iter_mut() {
            if view.last.dependencies.is_disjoint(&changed) {
                continue;
            }
            resolved += 1;

            let resolution = match executor.resolve(&view.operation, &view.variables) {
                Ok(resolution) => resolution,
                Err(error) => {
                    warn!(token = %token, error = %error, "Failed to re-resolve view");
                    continue;
                }
            };

            let rerender = resolution.data != view.last.data
                || resolution.is_complete() != view.last.is_complete();
            view.last = resolution;

            if rerender {
                rerenders.push(Rerender {
                    token: *token,
                    resolution: view.last.clone(),
                });
            }
        }

        debug!(
            changed = changed.len(),
            resolved,
            rerendered = rerenders.len(),
            "Flushed notifications"
        );
        rerenders
    }

    /// Last resolution delivered to a view.
    pub fn resolution(&self, token: ViewToken) -> Option<&Resolution> {
        self.views.get(&token).map(|view| &view.last)
    }

    /// The operation and variables a view was attached with.
    pub fn request(&self, token: ViewToken) -> Option<(&Operation, &Variables)> {
        self.views.get(&token).map(|view| (&view.operation, &view.variables))
    }

    pub fn is_attached(&self, token: ViewToken) -> bool {
        self.views.contains_key(&token)
    }

    /// Number of attached views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Detach every view and drop pending changes.
    pub fn clear(&mut self) {
        self.views.clear();
        self.pending.clear();
    }
}
