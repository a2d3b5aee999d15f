//! The cache facade.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use lectern_core::ChangeSet;
use lectern_mutation::StoreHandle;
use lectern_network::{NetworkError, NetworkExecutor, Transport};
use lectern_parser::{Operation, Variables};
use lectern_query::{QueryError, QueryExecutor, Resolution};
use lectern_store::{Keying, RecordStore, Snapshot};
use lectern_subscription::{SubscriptionManager, ViewToken};
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, FetchPolicy};
use crate::error::{CacheError, CacheResult};
use crate::mutation::Mutation;
use crate::view::ViewHandle;

type ViewCallback = Rc<dyn Fn(&Resolution)>;

/// State shared by every clone of a cache.
pub(crate) struct Shared {
    pub(crate) store: RefCell<RecordStore>,
    subscriptions: RefCell<SubscriptionManager>,
    callbacks: RefCell<HashMap<ViewToken, ViewCallback>>,
    /// Set while callbacks run; nested publishes only queue their changes.
    delivering: Cell<bool>,
    pub(crate) network: NetworkExecutor,
    pub(crate) keying: Box<dyn Keying>,
    config: CacheConfig,
}

/// A normalized object cache.
///
/// Cloning is cheap and yields a handle onto the same state. The cache is
/// single-threaded: store borrows are never held across a network await,
/// and view callbacks run only after every borrow is released.
#[derive(Clone)]
pub struct Cache {
    pub(crate) shared: Rc<Shared>,
}

impl Cache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig, keying: impl Keying + 'static, transport: Rc<dyn Transport>) -> Self {
        Self::with_snapshot(config, keying, transport, Snapshot::default())
    }

    /// Create a cache seeded from a snapshot.
    pub fn with_snapshot(
        config: CacheConfig,
        keying: impl Keying + 'static,
        transport: Rc<dyn Transport>,
        snapshot: Snapshot,
    ) -> Self {
        let store = RecordStore::from_snapshot(snapshot);
        info!(records = store.len(), "Created cache");
        Self {
            shared: Rc::new(Shared {
                store: RefCell::new(store),
                subscriptions: RefCell::new(SubscriptionManager::new()),
                callbacks: RefCell::new(HashMap::new()),
                delivering: Cell::new(false),
                network: NetworkExecutor::new(transport),
                keying: Box::new(keying),
                config,
            }),
        }
    }

    /// Create a cache over HTTP with default keying, both taken from `config`.
    pub fn from_config(config: CacheConfig) -> CacheResult<Self> {
        let transport = Rc::new(config.transport()?);
        let keying = config.keying();
        Ok(Self::new(config, keying, transport))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Read-only access to the store. Do not hold it across an await.
    pub fn store(&self) -> Ref<'_, RecordStore> {
        self.shared.store.borrow()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.store.borrow().snapshot()
    }

    /// Drop every view and clear the store.
    pub fn dispose(&self) {
        self.shared.subscriptions.borrow_mut().clear();
        self.shared.callbacks.borrow_mut().clear();
        *self.shared.store.borrow_mut() = RecordStore::new();
        info!("Disposed cache");
    }

    // ==================== VIEWS ====================

    /// Attach a view resolved from the cache only.
    ///
    /// `on_update` runs after each batch that changed the view's data. A view
    /// whose resolution is incomplete should call `ViewHandle::refetch`.
    pub fn watch<F>(&self, operation: &Operation, variables: Variables, on_update: F) -> CacheResult<ViewHandle>
    where
        F: Fn(&Resolution) + 'static,
    {
        if operation.is_mutation() {
            return Err(QueryError::not_a_query(operation.name.as_deref()).into());
        }

        let (token, _) = {
            let store = self.shared.store.borrow();
            self.shared
                .subscriptions
                .borrow_mut()
                .subscribe(operation.clone(), variables, &store)?
        };
        self.shared.callbacks.borrow_mut().insert(token, Rc::new(on_update));

        Ok(ViewHandle::new(self.clone(), token))
    }

    /// Detach a view. Safe while a fetch for it is in flight.
    pub fn unsubscribe(&self, token: ViewToken) -> bool {
        self.shared.callbacks.borrow_mut().remove(&token);
        self.shared.subscriptions.borrow_mut().unsubscribe(token)
    }

    /// Last resolution delivered to a view.
    pub fn view_data(&self, token: ViewToken) -> Option<Resolution> {
        self.shared.subscriptions.borrow().resolution(token).cloned()
    }

    /// Fetch a view's operation and merge the result.
    ///
    /// If the view unsubscribes while the request is in flight, the result is
    /// still normalized but nothing is delivered to it.
    pub async fn refetch_view(&self, token: ViewToken) -> CacheResult<Resolution> {
        let (operation, variables) = self
            .shared
            .subscriptions
            .borrow()
            .request(token)
            .map(|(operation, variables)| (operation.clone(), variables.clone()))
            .ok_or(CacheError::UnknownView(token))?;

        debug!(token = %token, "Refetching view");
        self.fetch(&operation, &variables).await
    }

    // ==================== READS ====================

    /// One-shot read honouring `policy`.
    pub async fn query(&self, operation: &Operation, variables: &Variables, policy: FetchPolicy) -> CacheResult<Resolution> {
        if operation.is_mutation() {
            return Err(QueryError::not_a_query(operation.name.as_deref()).into());
        }

        match policy {
            FetchPolicy::CacheOnly => self.resolve(operation, variables),
            FetchPolicy::NetworkOnly => self.fetch(operation, variables).await,
            FetchPolicy::CacheFirst => {
                let cached = self.resolve(operation, variables)?;
                if cached.is_complete() {
                    debug!(operation = operation.name.as_deref().unwrap_or("<anonymous>"), "Cache hit");
                    return Ok(cached);
                }
                self.fetch(operation, variables).await
            }
        }
    }

    /// Read with the configured default policy.
    pub async fn query_default(&self, operation: &Operation, variables: &Variables) -> CacheResult<Resolution> {
        self.query(operation, variables, self.shared.config.fetch_policy).await
    }

    fn resolve(&self, operation: &Operation, variables: &Variables) -> CacheResult<Resolution> {
        let store = self.shared.store.borrow();
        Ok(QueryExecutor::new(&store).resolve(operation, variables)?)
    }

    /// Send, normalize, notify, then answer from the store.
    ///
    /// Entities the response could not store come back as `warnings`.
    async fn fetch(&self, operation: &Operation, variables: &Variables) -> CacheResult<Resolution> {
        let variables = operation.with_defaults(variables);
        if let Some(name) = operation.missing_variables(&variables).next() {
            return Err(QueryError::missing_variable(name).into());
        }

        let response = self.shared.network.execute(operation, &variables).await;

        let (data, failure) = match response {
            Ok(data) => (Some(data), None),
            Err(NetworkError::Graph { errors, data }) => (data, Some(NetworkError::Graph { errors, data: None })),
            Err(error) => (None, Some(error)),
        };

        let mut warnings = Vec::new();
        if let Some(data) = data.filter(|data| !data.is_null()) {
            let outcome = {
                let mut store = self.shared.store.borrow_mut();
                store.write_operation(operation, &variables, &data, self.shared.keying.as_ref())
            };
            if !outcome.is_clean() {
                warn!(
                    operation = operation.name.as_deref().unwrap_or("<anonymous>"),
                    warnings = outcome.errors.len(),
                    "Response stored with warnings"
                );
            }
            self.publish(&outcome.changed);
            warnings = outcome.errors;
        }

        if let Some(error) = failure {
            return Err(error.into());
        }
        let mut resolution = self.resolve(operation, &variables)?;
        resolution.warnings = warnings;
        Ok(resolution)
    }

    // ==================== WRITES ====================

    /// Start a mutation.
    pub fn mutation(&self, operation: &Operation) -> Mutation {
        Mutation::new(self.clone(), operation.clone())
    }

    /// Edit the store outside a mutation. Views are notified once afterwards.
    pub fn write<R>(&self, edit: impl FnOnce(&mut StoreHandle<'_>) -> R) -> R {
        let (result, changed) = {
            let mut store = self.shared.store.borrow_mut();
            let mut handle = StoreHandle::new(&mut store);
            let result = edit(&mut handle);
            (result, handle.into_changed())
        };
        self.publish(&changed);
        result
    }

    /// Collect unreachable records.
    pub fn gc(&self) -> ChangeSet {
        let removed = self.shared.store.borrow_mut().gc();
        self.publish(&removed);
        removed
    }

    // ==================== NOTIFICATION ====================

    /// Notify, then flush and deliver until no changes are pending.
    ///
    /// A callback that writes to the cache lands here re-entrantly. Its changes
    /// are queued and drained by the outer call once the current batch is
    /// delivered, so every view's last delivery is its latest resolution.
    pub(crate) fn publish(&self, changed: &ChangeSet) {
        if changed.is_empty() {
            return;
        }
        self.shared.subscriptions.borrow_mut().notify(changed);
        if self.shared.delivering.replace(true) {
            debug!(changed = changed.len(), "Queued changes from a view callback");
            return;
        }

        loop {
            let rerenders = {
                let store = self.shared.store.borrow();
                self.shared.subscriptions.borrow_mut().flush(&store)
            };
            if rerenders.is_empty() {
                break;
            }

            for rerender in rerenders {
                // Skip views detached by an earlier callback in this batch
                let callback = self.shared.callbacks.borrow().get(&rerender.token).cloned();
                if let Some(callback) = callback {
                    callback(&rerender.resolution);
                }
            }
        }

        self.shared.delivering.set(false);
    }
}
