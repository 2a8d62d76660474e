//! The runtime blackboard store.
//!
//! A [`Blackboard`] holds the locally defined values of one node, its
//! change listeners, and a non-owning link to an optional parent node.
//! Reads and writes are synchronous: a write that changes a value invokes
//! every matching listener before returning.

mod entries;
mod listeners;

pub use entries::*;
pub use listeners::ListenerId;

use blackboard_types::{BlackboardType, Entry, TypeRegistry, Value};
use log::{error, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use uuid::Uuid;

use crate::config::{Reentrancy, StoreConfig};
use crate::error::{BlackboardError, Result};
use listeners::{invoke_isolated, ListenerTable};

/// Unique identifier for a store, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(pub Uuid);

impl StoreId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) struct StoreInner {
    id: StoreId,
    registry: Rc<TypeRegistry>,
    config: StoreConfig,
    values: RefCell<HashMap<String, Value>>,
    pub(crate) parent: RefCell<Option<Weak<StoreInner>>>,
    listeners: RefCell<ListenerTable>,
    /// Keys whose notification is currently running, innermost last.
    notifying: RefCell<Vec<String>>,
}

/// Handle to a blackboard node.
///
/// Cloning the handle shares the node. The node lives as long as a strong
/// handle does; parents are held through [`WeakBlackboard`] only, so children
/// never keep an ancestor alive. Listeners that need to read the store should
/// capture a [`WeakBlackboard`] for the same reason.
#[derive(Clone)]
pub struct Blackboard {
    pub(crate) inner: Rc<StoreInner>,
}

/// Non-owning handle to a blackboard node.
#[derive(Clone, Default)]
pub struct WeakBlackboard {
    inner: Weak<StoreInner>,
}

impl WeakBlackboard {
    /// Get a strong handle if the node is still alive.
    pub fn upgrade(&self) -> Option<Blackboard> {
        self.inner.upgrade().map(|inner| Blackboard { inner })
    }
}

impl std::fmt::Debug for WeakBlackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.upgrade() {
            Some(store) => write!(f, "WeakBlackboard({})", store.id()),
            None => f.write_str("WeakBlackboard(dropped)"),
        }
    }
}

impl Blackboard {
    /// Create an empty store backed by the shared built-in registry.
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::shared_builtins())
    }

    /// Create an empty store with an explicit registry.
    pub fn with_registry(registry: Rc<TypeRegistry>) -> Self {
        Self::with_config(registry, StoreConfig::default())
    }

    /// Create an empty store with an explicit registry and configuration.
    pub fn with_config(registry: Rc<TypeRegistry>, config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                id: StoreId::new(),
                registry,
                config,
                values: RefCell::new(HashMap::new()),
                parent: RefCell::new(None),
                listeners: RefCell::new(ListenerTable::default()),
                notifying: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Identifier used in diagnostics.
    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    /// Registry deciding which value types this store accepts.
    pub fn registry(&self) -> &Rc<TypeRegistry> {
        &self.inner.registry
    }

    /// Behavior switches this store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Non-owning handle to this store.
    pub fn downgrade(&self) -> WeakBlackboard {
        WeakBlackboard {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Check whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Blackboard) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get a locally defined value stored with exactly type `T`.
    ///
    /// Never consults the parent and never converts between kinds.
    pub fn try_get_local<T: BlackboardType>(&self, key: &str) -> Option<T> {
        self.inner.values.borrow().get(key).and_then(T::from_value)
    }

    /// Check whether `key` is locally defined with exactly type `T`.
    pub fn has_key_local<T: BlackboardType>(&self, key: &str) -> bool {
        self.inner
            .values
            .borrow()
            .get(key)
            .map_or(false, |value| value.value_type() == T::value_type())
    }

    /// Check whether `key` is locally defined with any type.
    pub fn contains_key_local(&self, key: &str) -> bool {
        self.inner.values.borrow().contains_key(key)
    }

    /// Get a locally defined value without type filtering.
    pub fn value_local(&self, key: &str) -> Option<Value> {
        self.inner.values.borrow().get(key).cloned()
    }

    /// Number of locally defined keys.
    pub fn key_count(&self) -> usize {
        self.inner.values.borrow().len()
    }

    /// Locally defined keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.values.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Lazy sequence of every locally defined entry, in key order.
    ///
    /// Values are read as the sequence advances; keys removed in the meantime
    /// are skipped. Clone the sequence (or call again) to restart.
    pub fn entries(&self) -> Entries {
        Entries::new(self.clone(), self.keys())
    }

    /// Insert or overwrite `key` with a value of type `T`.
    ///
    /// Returns whether the stored value changed. Listeners run only on a
    /// change. Fails if `T` is not registered with this store's registry, or
    /// on a rejected re-entrant write.
    pub fn set<T: BlackboardType>(&self, key: &str, value: T) -> Result<bool> {
        self.set_value(key, value.into_value())
    }

    /// Untyped form of [`Blackboard::set`], for tooling.
    pub fn set_value(&self, key: &str, value: Value) -> Result<bool> {
        let value_type = value.value_type();
        if !self.inner.registry.supports(&value_type) {
            error!(
                "Blackboard {}: cannot store '{}', type '{}' is not registered",
                self.id(),
                key,
                value_type
            );
            return Err(BlackboardError::UnsupportedType {
                type_name: value_type.type_name(),
            });
        }

        let unchanged = self
            .inner
            .values
            .borrow()
            .get(key)
            .map_or(false, |existing| existing.same_as(&value));
        if unchanged {
            return Ok(false);
        }

        self.check_reentrancy(key)?;
        self.inner
            .values
            .borrow_mut()
            .insert(key.to_owned(), value);

        trace!("Blackboard {}: '{}' changed", self.id(), key);
        self.notify(key);
        Ok(true)
    }

    /// Remove `key` if it is locally defined with exactly type `T`.
    ///
    /// Inherited keys are never touched. On removal the key's subscriptions
    /// are dropped and the any-change broadcast fires.
    pub fn remove<T: BlackboardType>(&self, key: &str) -> bool {
        let removed = {
            let mut values = self.inner.values.borrow_mut();
            let matches = values
                .get(key)
                .map_or(false, |value| value.value_type() == T::value_type());
            if matches {
                values.remove(key);
            }
            matches
        };

        if removed {
            self.inner.listeners.borrow_mut().drop_key(key);
            self.broadcast_any(key);
        }
        removed
    }

    /// Remove every local value and every per-key subscription.
    ///
    /// Nothing is notified; any-change listeners stay registered.
    pub fn clear_all(&self) {
        self.inner.values.borrow_mut().clear();
        self.inner.listeners.borrow_mut().clear_keys();
    }

    /// Run `callback` after every change to `key`.
    ///
    /// Subscribers of one key run in registration order. A panicking
    /// subscriber is logged and the rest still run.
    pub fn subscribe<F>(&self, key: &str, callback: F) -> ListenerId
    where
        F: Fn() + 'static,
    {
        self.inner
            .listeners
            .borrow_mut()
            .subscribe(key, Rc::new(callback))
    }

    /// Returns whether a subscription was removed.
    pub fn unsubscribe(&self, key: &str, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().unsubscribe(key, id)
    }

    /// Number of subscriptions for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.inner.listeners.borrow().count(key)
    }

    /// Run `callback` with the key after every local change or removal.
    pub fn on_any_value_changed<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&str) + 'static,
    {
        self.inner.listeners.borrow_mut().add_any(Rc::new(callback))
    }

    /// Remove an any-change listener. Returns whether one was removed.
    pub fn remove_any_value_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove_any(id)
    }

    /// Notify subscribers of `key`, then the any-change broadcast.
    ///
    /// No store borrow is held while callbacks run, so callbacks may read
    /// and write this store.
    pub(crate) fn notify(&self, key: &str) {
        let callbacks = self.inner.listeners.borrow().key_callbacks(key);
        let _guard = NotifyGuard::enter(self, key);
        for callback in callbacks {
            invoke_isolated(key, || callback());
        }
        self.broadcast_any(key);
    }

    fn broadcast_any(&self, key: &str) {
        let callbacks = self.inner.listeners.borrow().any_callbacks();
        for callback in callbacks {
            invoke_isolated(key, || callback(key));
        }
    }

    /// Whether a notification for `key` is running anywhere on the current
    /// notification stack.
    pub(crate) fn is_notifying(&self, key: &str) -> bool {
        self.inner.notifying.borrow().iter().any(|k| k == key)
    }

    /// Refuse a change to `key` while a notification for `key` is running,
    /// unless the store allows re-entrant writes.
    pub(crate) fn check_reentrancy(&self, key: &str) -> Result<()> {
        if self.inner.config.reentrancy == Reentrancy::Reject && self.is_notifying(key) {
            error!(
                "Blackboard {}: write to '{}' from inside its own notification rejected",
                self.id(),
                key
            );
            return Err(BlackboardError::ReentrantWrite {
                key: key.to_owned(),
            });
        }
        Ok(())
    }

    /// Write a value without change detection or notification.
    pub(crate) fn write_silently(&self, key: &str, value: Value) {
        self.inner
            .values
            .borrow_mut()
            .insert(key.to_owned(), value);
    }

    /// Swap in a whole new value map, keeping listeners.
    pub(crate) fn replace_values(&self, values: HashMap<String, Value>) {
        *self.inner.values.borrow_mut() = values;
    }

    pub(crate) fn entry_for(&self, key: &str) -> Option<Entry> {
        self.value_local(key).map(|value| Entry::new(key, value))
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blackboard")
            .field("id", &self.id())
            .field("keys", &self.keys())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}

/// Marks a key as being notified for the guard's lifetime.
struct NotifyGuard<'a> {
    store: &'a Blackboard,
}

impl<'a> NotifyGuard<'a> {
    fn enter(store: &'a Blackboard, key: &str) -> Self {
        store.inner.notifying.borrow_mut().push(key.to_owned());
        Self { store }
    }
}

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.store.inner.notifying.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackboard_types::{List, ObjectRef, ValueType, Vector3};
    use std::cell::{Cell, RefCell};

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    fn counting(count: &Rc<Cell<u32>>) -> impl Fn() + 'static {
        let count = Rc::clone(count);
        move || count.set(count.get() + 1)
    }

    #[test]
    fn test_set_then_get() {
        let store = Blackboard::new();
        store.set("Health", 100).unwrap();
        assert_eq!(store.get("Health", -1), 100);
    }

    #[test]
    fn test_try_get_missing_key() {
        let store = Blackboard::new();
        assert_eq!(store.try_get_local::<f32>("NonExistent"), None);
        assert_eq!(store.get("Missing", 99), 99);
    }

    #[test]
    fn test_try_get_wrong_type_misses() {
        let store = Blackboard::new();
        store.set("Speed", 3.7_f32).unwrap();

        assert_eq!(store.try_get_local::<i32>("Speed"), None);
        assert!(!store.has_key_local::<i32>("Speed"));
        assert!(store.has_key_local::<f32>("Speed"));
    }

    #[test]
    fn test_multiple_types() {
        let store = Blackboard::new();
        store.set("Int", 10).unwrap();
        store.set("Float", 3.14_f32).unwrap();
        store.set("String", "Test".to_string()).unwrap();
        store.set("Target", Vector3::new(5.0, 10.0, 15.0)).unwrap();
        let enemy = ObjectRef::new();
        store.set("Enemy", enemy).unwrap();

        assert_eq!(store.get("Int", 0), 10);
        assert!((store.get("Float", 0.0_f32) - 3.14).abs() < 0.001);
        assert_eq!(store.get("String", String::new()), "Test");
        assert_eq!(store.get("Target", Vector3::ZERO), Vector3::new(5.0, 10.0, 15.0));
        assert_eq!(store.try_get_local::<ObjectRef>("Enemy"), Some(enemy));
        assert_eq!(store.key_count(), 5);
    }

    #[test]
    fn test_overwrite_updates_value() {
        let store = Blackboard::new();
        assert!(store.set("Counter", 1).unwrap());
        assert!(store.set("Counter", 2).unwrap());
        assert!(store.set("Counter", 3).unwrap());
        assert_eq!(store.get("Counter", 0), 3);
        assert_eq!(store.key_count(), 1);
    }

    #[test]
    fn test_overwrite_with_other_type_replaces_tag() {
        let store = Blackboard::new();
        store.set("Mode", 1).unwrap();
        assert!(store.set("Mode", "patrol".to_string()).unwrap());

        assert!(!store.has_key_local::<i32>("Mode"));
        assert!(store.has_key_local::<String>("Mode"));
        assert_eq!(store.key_count(), 1);
    }

    #[test]
    fn test_lists() {
        let store = Blackboard::new();
        let list: List<i32> = Rc::new(vec![1, 2, 3, 4, 5]);
        store.set("IntList", Rc::clone(&list)).unwrap();

        let result = store.try_get_local::<List<i32>>("IntList").unwrap();
        assert_eq!(*result, vec![1, 2, 3, 4, 5]);
        assert!(Rc::ptr_eq(&result, &list));

        store.set("EmptyList", List::<String>::default()).unwrap();
        assert!(store.try_get_local::<List<String>>("EmptyList").unwrap().is_empty());
        assert!(!store.has_key_local::<List<i32>>("EmptyList"));
    }

    #[test]
    fn test_list_change_detection_is_by_identity() {
        let store = Blackboard::new();
        let count = counter();
        store.subscribe("Waypoints", counting(&count));

        let list: List<Vector3> = Rc::new(vec![Vector3::ZERO]);
        store.set("Waypoints", Rc::clone(&list)).unwrap();
        assert!(!store.set("Waypoints", Rc::clone(&list)).unwrap());
        assert!(store.set("Waypoints", Rc::new(vec![Vector3::ZERO])).unwrap());

        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_has_key() {
        let store = Blackboard::new();
        store.set("Exists", 100).unwrap();
        assert!(store.has_key_local::<i32>("Exists"));
        assert!(!store.has_key_local::<i32>("DoesNotExist"));
    }

    #[test]
    fn test_remove() {
        let store = Blackboard::new();
        store.set("ToRemove", 123).unwrap();

        assert!(!store.remove::<f32>("ToRemove"));
        assert!(store.remove::<i32>("ToRemove"));
        assert!(!store.has_key_local::<i32>("ToRemove"));
        assert!(!store.remove::<i32>("ToRemove"));
        assert!(!store.remove::<i32>("NonExistent"));
    }

    #[test]
    fn test_remove_drops_subscriptions_and_broadcasts() {
        let store = Blackboard::new();
        let count = counter();
        let changed = Rc::new(RefCell::new(Vec::new()));
        store.set("Target", 1).unwrap();
        store.subscribe("Target", counting(&count));
        {
            let changed = Rc::clone(&changed);
            store.on_any_value_changed(move |key| changed.borrow_mut().push(key.to_string()));
        }

        assert!(store.remove::<i32>("Target"));
        assert_eq!(store.listener_count("Target"), 0);
        assert_eq!(*changed.borrow(), vec!["Target".to_string()]);

        store.set("Target", 2).unwrap();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_clear_all() {
        let store = Blackboard::new();
        let any = counter();
        store.set("Key1", 1).unwrap();
        store.set("Key2", "Two".to_string()).unwrap();
        store.subscribe("Key1", || {});
        {
            let any = Rc::clone(&any);
            store.on_any_value_changed(move |_| any.set(any.get() + 1));
        }

        store.clear_all();

        assert!(!store.has_key_local::<i32>("Key1"));
        assert!(!store.has_key_local::<String>("Key2"));
        assert_eq!(store.key_count(), 0);
        assert_eq!(store.listener_count("Key1"), 0);
        assert_eq!(any.get(), 0);

        store.set("Key3", true).unwrap();
        assert_eq!(any.get(), 1);
    }

    #[test]
    fn test_key_count() {
        let store = Blackboard::new();
        assert_eq!(store.key_count(), 0);
        store.set("Key1", 1).unwrap();
        assert_eq!(store.key_count(), 1);
        store.set("Key2", 2).unwrap();
        assert_eq!(store.key_count(), 2);
        store.remove::<i32>("Key1");
        assert_eq!(store.key_count(), 1);
    }

    #[test]
    fn test_subscribe_notification_flow() {
        let store = Blackboard::new();
        let count = counter();
        let id = store.subscribe("Counter", counting(&count));

        store.set("Counter", 1).unwrap();
        assert_eq!(count.get(), 1);

        store.set("Counter", 1).unwrap();
        assert_eq!(count.get(), 1);

        assert!(store.unsubscribe("Counter", id));
        store.set("Counter", 2).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscriber_reads_new_value() {
        let store = Blackboard::new();
        let seen = Rc::new(Cell::new(0));
        {
            let weak = store.downgrade();
            let seen = Rc::clone(&seen);
            store.subscribe("Observable", move || {
                if let Some(store) = weak.upgrade() {
                    seen.set(store.get("Observable", -1));
                }
            });
        }

        store.set("Observable", 42).unwrap();
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn test_multiple_subscribers_all_invoked_in_order() {
        let store = Blackboard::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 1..=3 {
            let order = Rc::clone(&order);
            store.subscribe("Multi", move || order.borrow_mut().push(i));
        }

        store.set("Multi", 100).unwrap();
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let store = Blackboard::new();
        let count = counter();
        store.subscribe("Fragile", || panic!("subscriber failure"));
        store.subscribe("Fragile", counting(&count));

        assert!(store.set("Fragile", 1).unwrap());
        assert_eq!(count.get(), 1);
        assert_eq!(store.get("Fragile", 0), 1);
    }

    #[test]
    fn test_any_value_changed() {
        let store = Blackboard::new();
        let changed = Rc::new(RefCell::new(Vec::new()));
        store.set("TestKey", 42).unwrap();
        let id = {
            let changed = Rc::clone(&changed);
            store.on_any_value_changed(move |key| changed.borrow_mut().push(key.to_string()))
        };

        store.set("TestKey", 42).unwrap();
        assert!(changed.borrow().is_empty());

        store.set("Key1", 1).unwrap();
        store.set("Key2", "test".to_string()).unwrap();
        store.set("Key3", true).unwrap();
        assert_eq!(*changed.borrow(), vec!["Key1", "Key2", "Key3"]);

        assert!(store.remove_any_value_listener(id));
        store.set("Key4", 4).unwrap();
        assert_eq!(changed.borrow().len(), 3);
    }

    #[test]
    fn test_subscriber_may_write_other_key() {
        let store = Blackboard::new();
        {
            let weak = store.downgrade();
            store.subscribe("Health", move || {
                if let Some(store) = weak.upgrade() {
                    let low = store.get("Health", 0) < 20;
                    store.set("LowHealth", low).unwrap();
                }
            });
        }

        store.set("Health", 10).unwrap();
        assert!(store.get("LowHealth", false));
        store.set("Health", 80).unwrap();
        assert!(!store.get("LowHealth", true));
    }

    #[test]
    fn test_same_key_reentrant_write_rejected() {
        let store = Blackboard::new();
        let outcome = Rc::new(RefCell::new(None));
        {
            let weak = store.downgrade();
            let outcome = Rc::clone(&outcome);
            store.subscribe("Echo", move || {
                if let Some(store) = weak.upgrade() {
                    *outcome.borrow_mut() = Some(store.set("Echo", 99));
                }
            });
        }

        store.set("Echo", 1).unwrap();
        assert!(matches!(
            *outcome.borrow(),
            Some(Err(BlackboardError::ReentrantWrite { ref key })) if key == "Echo"
        ));
        assert_eq!(store.get("Echo", 0), 1);
    }

    #[test]
    fn test_same_key_reentrant_write_allowed_by_config() {
        let config = StoreConfig::default().with_reentrancy(Reentrancy::Allow);
        let store = Blackboard::with_config(TypeRegistry::shared_builtins(), config);
        let count = counter();
        {
            let weak = store.downgrade();
            let count = Rc::clone(&count);
            store.subscribe("Clamp", move || {
                count.set(count.get() + 1);
                if let Some(store) = weak.upgrade() {
                    let value = store.get("Clamp", 0);
                    if value > 10 {
                        store.set("Clamp", 10).unwrap();
                    }
                }
            });
        }

        store.set("Clamp", 50).unwrap();
        assert_eq!(store.get("Clamp", 0), 10);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_reentrant_write_of_same_value_is_noop() {
        let store = Blackboard::new();
        let outcome = Rc::new(RefCell::new(None));
        {
            let weak = store.downgrade();
            let outcome = Rc::clone(&outcome);
            store.subscribe("Clamp", move || {
                if let Some(store) = weak.upgrade() {
                    let value = store.get("Clamp", 0);
                    *outcome.borrow_mut() = Some(store.set("Clamp", value.min(10)));
                }
            });
        }

        store.set("Clamp", 5).unwrap();
        assert!(matches!(*outcome.borrow(), Some(Ok(false))));
        assert_eq!(store.get("Clamp", 0), 5);
    }

    #[test]
    fn test_cascade_back_to_notifying_key_rejected() {
        let store = Blackboard::new();
        let outcome = Rc::new(RefCell::new(None));
        {
            let weak = store.downgrade();
            store.subscribe("A", move || {
                if let Some(store) = weak.upgrade() {
                    let a = store.get("A", 0);
                    store.set("B", a + 1).unwrap();
                }
            });
        }
        {
            let weak = store.downgrade();
            let outcome = Rc::clone(&outcome);
            store.subscribe("B", move || {
                if let Some(store) = weak.upgrade() {
                    let b = store.get("B", 0);
                    *outcome.borrow_mut() = Some(store.set("A", b + 1));
                }
            });
        }

        store.set("A", 1).unwrap();
        assert!(matches!(
            *outcome.borrow(),
            Some(Err(BlackboardError::ReentrantWrite { ref key })) if key == "A"
        ));
        assert_eq!(store.get("A", 0), 1);
        assert_eq!(store.get("B", 0), 2);
    }

    #[test]
    fn test_reentrant_single_edit_rejected() {
        let mut entries = vec![Entry::new("Echo", 1)];
        let store = crate::persistence::load(&entries, None).unwrap();
        let shared = Rc::new(RefCell::new(entries.clone()));
        let count = counter();
        let outcome = Rc::new(RefCell::new(None));
        {
            let weak = store.downgrade();
            let shared = Rc::clone(&shared);
            let count = Rc::clone(&count);
            let outcome = Rc::clone(&outcome);
            store.subscribe("Echo", move || {
                count.set(count.get() + 1);
                if let Some(store) = weak.upgrade() {
                    let result = crate::persistence::apply_single_edit(
                        &mut shared.borrow_mut(),
                        &store,
                        "Echo",
                        Value::Int(99),
                        false,
                    );
                    *outcome.borrow_mut() = Some(result);
                }
            });
        }

        crate::persistence::apply_single_edit(&mut entries, &store, "Echo", Value::Int(2), false)
            .unwrap();

        assert!(matches!(
            *outcome.borrow(),
            Some(Err(BlackboardError::ReentrantWrite { ref key })) if key == "Echo"
        ));
        assert_eq!(count.get(), 1);
        assert_eq!(*shared.borrow(), vec![Entry::new("Echo", 1)]);
        assert_eq!(store.get("Echo", 0), 2);
    }

    #[test]
    fn test_resync_from_subscriber_skips_notifying_key() {
        let entries = vec![Entry::new("Echo", 1)];
        let store = crate::persistence::load(&entries, None).unwrap();
        let count = counter();
        {
            let weak = store.downgrade();
            let count = Rc::clone(&count);
            store.subscribe("Echo", move || {
                count.set(count.get() + 1);
                if let Some(store) = weak.upgrade() {
                    crate::persistence::resync(&store, &[Entry::new("Echo", 1)], true);
                }
            });
        }

        store.set("Echo", 2).unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(store.get("Echo", 0), 1);
    }

    #[test]
    fn test_panicking_any_listener_is_isolated() {
        let store = Blackboard::new();
        let count = counter();
        store.on_any_value_changed(|_| panic!("listener failure"));
        {
            let count = Rc::clone(&count);
            store.on_any_value_changed(move |_| count.set(count.get() + 1));
        }

        assert!(store.set("Fragile", 1).unwrap());
        assert_eq!(count.get(), 1);
        assert_eq!(store.get("Fragile", 0), 1);

        assert!(store.set("Fragile", 2).unwrap());
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_any_broadcast_runs_after_subscriber_panic() {
        let store = Blackboard::new();
        let changed = Rc::new(RefCell::new(Vec::new()));
        store.subscribe("Fragile", || panic!("subscriber failure"));
        {
            let changed = Rc::clone(&changed);
            store.on_any_value_changed(move |key| changed.borrow_mut().push(key.to_string()));
        }

        assert!(store.set("Fragile", 1).unwrap());
        assert_eq!(*changed.borrow(), vec!["Fragile".to_string()]);
    }

    #[test]
    fn test_unsupported_type_is_rejected() {
        let store = Blackboard::with_registry(Rc::new(TypeRegistry::new()));
        let result = store.set("Health", 100);

        assert!(matches!(
            result,
            Err(BlackboardError::UnsupportedType { type_name: "int" })
        ));
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn test_set_value_untyped() {
        let store = Blackboard::new();
        assert!(store.set_value("Alert", Value::Bool(true)).unwrap());
        assert!(!store.set_value("Alert", Value::Bool(true)).unwrap());
        assert_eq!(store.value_local("Alert"), Some(Value::Bool(true)));
        assert_eq!(
            store.value_local("Alert").map(|v| v.value_type()),
            Some(ValueType::Bool)
        );
    }

    #[test]
    fn test_separate_stores_are_independent() {
        let a = Blackboard::new();
        let b = Blackboard::new();
        a.set("Value", 1).unwrap();
        b.set("Value", 2).unwrap();

        assert!(!a.ptr_eq(&b));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.get("Value", 0), 1);
        assert_eq!(b.get("Value", 0), 2);
    }
}
