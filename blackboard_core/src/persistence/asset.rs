//! Blackboard assets - a durable entry list paired with its live store.

use blackboard_types::{Entry, TypeRegistry, Value};
use log::{debug, error};
use std::cell::OnceCell;
use std::rc::Rc;

use super::{apply_single_edit, load_into, resync, save, AssetSnapshot, SyncReport};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::store::{Blackboard, WeakBlackboard};

/// Durable blackboard state plus the runtime store built from it.
///
/// The runtime store is built on first access and is the same instance for
/// the asset's lifetime. The parent link points at another asset's runtime
/// store and does not keep it alive.
pub struct BlackboardAsset {
    entries: Vec<Entry>,
    parent: Option<WeakBlackboard>,
    registry: Rc<TypeRegistry>,
    config: StoreConfig,
    runtime: OnceCell<Blackboard>,
}

impl BlackboardAsset {
    /// Create an empty asset using the shared built-in registry.
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::shared_builtins())
    }

    /// Create an empty asset with an explicit registry.
    pub fn with_registry(registry: Rc<TypeRegistry>) -> Self {
        Self::with_config(registry, StoreConfig::default())
    }

    /// Create an empty asset whose runtime uses `config`.
    pub fn with_config(registry: Rc<TypeRegistry>, config: StoreConfig) -> Self {
        Self {
            entries: Vec::new(),
            parent: None,
            registry,
            config,
            runtime: OnceCell::new(),
        }
    }

    /// Create an asset holding `entries`.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut asset = Self::new();
        asset.entries = entries;
        asset
    }

    /// Create an asset from a decoded snapshot.
    pub fn from_snapshot(
        snapshot: &AssetSnapshot,
        registry: Rc<TypeRegistry>,
    ) -> (Self, SyncReport) {
        let (entries, report) = snapshot.decode(&registry);
        let mut asset = Self::with_registry(registry);
        asset.entries = entries;
        (asset, report)
    }

    /// Sync from the runtime, then encode the entry list.
    pub fn to_snapshot(&mut self) -> (AssetSnapshot, SyncReport) {
        self.sync_from_runtime();
        AssetSnapshot::encode(&self.entries, &self.registry)
    }

    /// The durable entry list.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Registry shared by the entries and the runtime.
    pub fn registry(&self) -> &Rc<TypeRegistry> {
        &self.registry
    }

    /// The runtime store, built from the entries on first access.
    pub fn runtime(&self) -> &Blackboard {
        self.runtime.get_or_init(|| self.build_runtime())
    }

    /// The parent asset's runtime store, if set and still alive.
    pub fn parent_runtime(&self) -> Option<Blackboard> {
        self.parent.as_ref().and_then(WeakBlackboard::upgrade)
    }

    /// Set or clear the parent asset.
    ///
    /// A rejected assignment leaves the previous parent in place.
    pub fn set_parent(&mut self, parent: Option<&BlackboardAsset>) -> Result<()> {
        let parent_runtime = parent.map(BlackboardAsset::runtime);
        self.runtime().set_parent(parent_runtime)?;
        self.parent = parent_runtime.map(Blackboard::downgrade);
        Ok(())
    }

    /// Write runtime values back into the entry list.
    ///
    /// Existing entries keep their order, keys new to the runtime are
    /// appended in key order, and keys the runtime no longer has are
    /// dropped. Does nothing if the runtime was never built.
    pub fn sync_from_runtime(&mut self) {
        let Some(runtime) = self.runtime.get() else {
            return;
        };

        let mut synced = Vec::with_capacity(runtime.key_count());
        for mut entry in self.entries.drain(..) {
            let Some(value) = runtime.value_local(entry.key()) else {
                continue;
            };
            if entry.replace_value(value.clone()).is_err() {
                entry = Entry::new(entry.key(), value);
            }
            synced.push(entry);
        }
        for entry in runtime.entries() {
            if !synced.iter().any(|existing| existing.key() == entry.key()) {
                synced.push(entry);
            }
        }
        self.entries = synced;
    }

    /// Rewrite the entry list wholesale from the runtime, in key order.
    pub fn save_runtime_to_entries(&mut self) {
        if let Some(runtime) = self.runtime.get() {
            self.entries = save(runtime);
        }
    }

    /// Rebuild the runtime values from the entry list in place.
    ///
    /// Subscribers stay registered and the parent link is re-attached. With
    /// `notify`, keys present before and after are notified.
    pub fn resync(&self, notify: bool) -> SyncReport {
        let runtime = self.runtime();
        let report = resync(runtime, &self.entries, notify);
        self.attach_parent(runtime);
        report
    }

    /// Replace the entry list and resync the runtime.
    pub fn replace_entries(&mut self, entries: Vec<Entry>, notify: bool) -> SyncReport {
        self.entries = entries;
        self.resync(notify)
    }

    /// Edit one key of the entry list and push it to the runtime.
    ///
    /// See [`apply_single_edit`](super::apply_single_edit).
    pub fn apply_edit(
        &mut self,
        key: &str,
        value: Value,
        check_parent_conflict: bool,
    ) -> Result<bool> {
        let runtime = self.runtime().clone();
        apply_single_edit(&mut self.entries, &runtime, key, value, check_parent_conflict)
    }

    fn build_runtime(&self) -> Blackboard {
        let store = Blackboard::with_config(Rc::clone(&self.registry), self.config.clone());
        let report = load_into(&store, &self.entries);
        debug!(
            "Blackboard {}: built runtime from {} entries ({} skipped)",
            store.id(),
            report.loaded,
            report.skipped.len()
        );
        self.attach_parent(&store);
        store
    }

    fn attach_parent(&self, store: &Blackboard) {
        let parent = self.parent_runtime();
        if let Err(err) = store.set_parent(parent.as_ref()) {
            error!("Blackboard {}: failed to attach parent: {}", store.id(), err);
        }
    }
}

impl Default for BlackboardAsset {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlackboardAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlackboardAsset")
            .field("entries", &self.entries)
            .field("parent", &self.parent)
            .field("runtime", &self.runtime.get().map(Blackboard::id))
            .finish()
    }
}
