//! Records view callbacks.

use lectern_cache::Resolution;
use std::cell::RefCell;
use std::rc::Rc;

/// Collects every resolution delivered to a view.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Rc<RefCell<Vec<Resolution>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback to pass to `Cache::watch`.
    pub fn callback(&self) -> impl Fn(&Resolution) + 'static {
        let seen = self.seen.clone();
        move |resolution: &Resolution| seen.borrow_mut().push(resolution.clone())
    }

    /// Number of deliveries.
    pub fn count(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn last(&self) -> Option<Resolution> {
        self.seen.borrow().last().cloned()
    }

    /// Data of the last delivery as JSON, or null if none.
    pub fn last_json(&self) -> serde_json::Value {
        self.last()
            .map(|resolution| resolution.data.to_json())
            .unwrap_or(serde_json::Value::Null)
    }
}
