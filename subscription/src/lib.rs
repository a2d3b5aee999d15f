//! Lectern Subscription Manager
//!
//! Tracks live views and their dependency sets. Store changes are
//! accumulated with `notify` and re-resolved in one batch by `flush`, so each
//! affected view is resolved at most once per batch and only views whose
//! resolved data changed are re-rendered.

mod manager;

pub use manager::{Rerender, SubscriptionManager, ViewToken};
