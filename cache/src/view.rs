//! View handles.

use crate::cache::Cache;
use crate::error::CacheResult;
use lectern_query::Resolution;
use lectern_subscription::ViewToken;

/// A live view. Dropping it unsubscribes.
pub struct ViewHandle {
    cache: Cache,
    token: ViewToken,
}

impl ViewHandle {
    pub(crate) fn new(cache: Cache, token: ViewToken) -> Self {
        Self { cache, token }
    }

    pub fn token(&self) -> ViewToken {
        self.token
    }

    /// Last data delivered to this view; None once unsubscribed.
    pub fn data(&self) -> Option<Resolution> {
        self.cache.view_data(self.token)
    }

    /// Fetch this view's operation from the network.
    pub async fn refetch(&self) -> CacheResult<Resolution> {
        self.cache.refetch_view(self.token).await
    }

    pub fn unsubscribe(&self) -> bool {
        self.cache.unsubscribe(self.token)
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        self.cache.unsubscribe(self.token);
    }
}
