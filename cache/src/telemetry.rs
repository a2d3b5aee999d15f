//! Logging setup.

use crate::error::{CacheError, CacheResult};
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber. `RUST_LOG` wins over `default_filter` when set.
///
/// Fails if a global subscriber is already installed.
pub fn init(default_filter: &str) -> CacheResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| CacheError::config(format!("invalid log filter {default_filter:?}: {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| CacheError::config(format!("failed to install subscriber: {e}")))
}
