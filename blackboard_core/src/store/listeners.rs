//! Change listeners - per-key subscriptions and the any-change broadcast.

use log::error;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use uuid::Uuid;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) type KeyCallback = Rc<dyn Fn()>;
pub(crate) type AnyCallback = Rc<dyn Fn(&str)>;

/// Registered callbacks of one store, in registration order.
#[derive(Default)]
pub(crate) struct ListenerTable {
    by_key: HashMap<String, Vec<(ListenerId, KeyCallback)>>,
    any: Vec<(ListenerId, AnyCallback)>,
}

impl ListenerTable {
    pub fn subscribe(&mut self, key: &str, callback: KeyCallback) -> ListenerId {
        let id = ListenerId::new();
        self.by_key
            .entry(key.to_owned())
            .or_default()
            .push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, key: &str, id: ListenerId) -> bool {
        let Some(callbacks) = self.by_key.get_mut(key) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            self.by_key.remove(key);
        }
        removed
    }

    /// Drop every subscription for a key.
    pub fn drop_key(&mut self, key: &str) {
        self.by_key.remove(key);
    }

    /// Drop every per-key subscription. Any-change listeners stay.
    pub fn clear_keys(&mut self) {
        self.by_key.clear();
    }

    pub fn count(&self, key: &str) -> usize {
        self.by_key.get(key).map_or(0, Vec::len)
    }

    /// Snapshot of the callbacks for a key.
    ///
    /// Taken before invoking so callbacks may subscribe or unsubscribe
    /// while a notification is running.
    pub fn key_callbacks(&self, key: &str) -> Vec<KeyCallback> {
        self.by_key
            .get(key)
            .map(|callbacks| callbacks.iter().map(|(_, cb)| Rc::clone(cb)).collect())
            .unwrap_or_default()
    }

    pub fn add_any(&mut self, callback: AnyCallback) -> ListenerId {
        let id = ListenerId::new();
        self.any.push((id, callback));
        id
    }

    pub fn remove_any(&mut self, id: ListenerId) -> bool {
        let before = self.any.len();
        self.any.retain(|(existing, _)| *existing != id);
        self.any.len() != before
    }

    pub fn any_callbacks(&self) -> Vec<AnyCallback> {
        self.any.iter().map(|(_, cb)| Rc::clone(cb)).collect()
    }
}

/// Run one callback, containing a panic so later callbacks still run.
///
/// Returns false if the callback panicked.
pub(crate) fn invoke_isolated(key: &str, callback: impl FnOnce()) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(()) => true,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!("Change listener for '{}' failed: {}", key, message);
            false
        }
    }
}
