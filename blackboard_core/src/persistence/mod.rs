//! Persistence bridge - moves state between durable entry lists and live
//! stores.
//!
//! Loading and resyncing skip entries whose type the store's registry does
//! not know, with a warning. Single-key edits go through the same change
//! detection as [`Blackboard::set`] and notify only the edited key.

mod asset;
mod snapshot;

pub use asset::*;
pub use snapshot::*;

use blackboard_types::{Entry, TypeRegistry, Value};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::error::{BlackboardError, Result};
use crate::store::Blackboard;

/// Outcome of moving a batch of entries across the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries applied.
    pub loaded: usize,
    /// Keys of entries that were skipped.
    pub skipped: Vec<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, key: &str) {
        self.skipped.push(key.to_owned());
    }
}

/// Build a store from entries using the shared built-in registry.
pub fn load(entries: &[Entry], parent: Option<&Blackboard>) -> Result<Blackboard> {
    load_with(
        TypeRegistry::shared_builtins(),
        StoreConfig::default(),
        entries,
        parent,
    )
}

/// Build a store from entries with an explicit registry and configuration.
pub fn load_with(
    registry: Rc<TypeRegistry>,
    config: StoreConfig,
    entries: &[Entry],
    parent: Option<&Blackboard>,
) -> Result<Blackboard> {
    let store = Blackboard::with_config(registry, config);
    load_into(&store, entries);
    store.set_parent(parent)?;
    Ok(store)
}

/// Replace a store's values with `entries`, without notifying.
///
/// Listeners and the parent link are kept. When a key appears more than
/// once the last entry wins.
pub fn load_into(store: &Blackboard, entries: &[Entry]) -> SyncReport {
    let (values, report) = collect_values(store, entries);
    store.replace_values(values);
    report
}

/// Produce one entry per locally defined key, in key order.
pub fn save(store: &Blackboard) -> Vec<Entry> {
    store
        .entries()
        .filter(|entry| {
            let supported = store.registry().supports(&entry.value_type());
            if !supported {
                warn!(
                    "Blackboard {}: skipping '{}' on save, type '{}' is not registered",
                    store.id(),
                    entry.key(),
                    entry.value_type()
                );
            }
            supported
        })
        .collect()
}

/// Apply one externally made edit to a durable entry list and its live store.
///
/// Returns whether anything changed. The change check runs before either
/// side is touched; an unchanged value notifies no one. An entry whose type
/// changes is replaced rather than patched. With `check_parent_conflict` set,
/// a key already defined by an ancestor of `store` is refused, as is a
/// change made from inside a notification for the same key unless the store
/// allows re-entrant writes.
pub fn apply_single_edit(
    entries: &mut Vec<Entry>,
    store: &Blackboard,
    key: &str,
    value: Value,
    check_parent_conflict: bool,
) -> Result<bool> {
    if check_parent_conflict && store.is_key_in_ancestors(key) {
        error!(
            "Cannot create key '{}': key already exists in parent blackboard hierarchy",
            key
        );
        return Err(BlackboardError::ParentKeyConflict {
            key: key.to_owned(),
        });
    }

    let value_type = value.value_type();
    if !store.registry().supports(&value_type) {
        error!(
            "Blackboard {}: cannot edit '{}', type '{}' is not registered",
            store.id(),
            key,
            value_type
        );
        return Err(BlackboardError::UnsupportedType {
            type_name: value_type.type_name(),
        });
    }

    // Loading keeps the last of duplicate keys, so edit that one.
    let position = entries.iter().rposition(|entry| entry.key() == key);
    let changed = position.map_or(true, |index| !entries[index].value().same_as(&value));
    if !changed {
        return Ok(false);
    }
    store.check_reentrancy(key)?;

    match position {
        Some(index) if entries[index].value_type() == value_type => {
            entries[index].replace_value(value.clone())?;
        }
        Some(index) => entries[index] = Entry::new(key, value.clone()),
        None => entries.push(Entry::new(key, value.clone())),
    }

    debug!("Blackboard {}: applied edit to '{}'", store.id(), key);
    store.write_silently(key, value);
    store.notify(key);
    Ok(true)
}

/// Rebuild a store's values from `entries` in place.
///
/// With `notify_on_load`, every key present both before and after is
/// notified whether or not its value changed. Under
/// [`Reentrancy::Reject`](crate::Reentrancy::Reject), a key whose
/// notification is already running is not notified again.
pub fn resync(store: &Blackboard, entries: &[Entry], notify_on_load: bool) -> SyncReport {
    let previous = store.keys();
    let report = load_into(store, entries);
    debug!(
        "Blackboard {}: resynced {} entries ({} skipped)",
        store.id(),
        report.loaded,
        report.skipped.len()
    );

    if notify_on_load {
        for key in previous.iter().filter(|key| store.contains_key_local(key)) {
            if store.check_reentrancy(key).is_err() {
                continue;
            }
            store.notify(key);
        }
    }
    report
}

fn collect_values(store: &Blackboard, entries: &[Entry]) -> (HashMap<String, Value>, SyncReport) {
    let mut values = HashMap::with_capacity(entries.len());
    let mut report = SyncReport::default();

    for entry in entries {
        let value_type = entry.value_type();
        if !store.registry().supports(&value_type) {
            warn!(
                "Blackboard {}: skipping '{}', type '{}' is not registered",
                store.id(),
                entry.key(),
                value_type
            );
            report.skip(entry.key());
            continue;
        }
        if values
            .insert(entry.key().to_owned(), entry.value().clone())
            .is_some()
        {
            warn!(
                "Blackboard {}: duplicate entry '{}', keeping the last one",
                store.id(),
                entry.key()
            );
        }
        report.loaded += 1;
    }
    (values, report)
}
