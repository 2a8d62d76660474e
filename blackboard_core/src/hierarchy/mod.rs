//! Hierarchy resolver - parent links and lookups that fall through to
//! ancestors.
//!
//! A store's parent is held weakly. Walks are iterative and bounded by the
//! starting store's `max_chain_depth`; a parent that has been dropped ends
//! the chain.

use blackboard_types::{BlackboardType, Entry, Value};
use log::{debug, error, warn};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use crate::config::Shadowing;
use crate::error::{BlackboardError, Result};
use crate::store::{Blackboard, Entries};

impl Blackboard {
    /// The parent store, if one is set and still alive.
    pub fn parent(&self) -> Option<Blackboard> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Blackboard { inner })
    }

    /// Set or clear the parent.
    ///
    /// Self-parenting and assignments that would close a cycle are rejected
    /// and logged; the previous parent stays in place.
    pub fn set_parent(&self, parent: Option<&Blackboard>) -> Result<()> {
        let Some(candidate) = parent else {
            self.clear_parent();
            return Ok(());
        };

        if candidate.ptr_eq(self) {
            error!("Blackboard {}: cannot be its own parent", self.id());
            return Err(BlackboardError::SelfParent);
        }

        if self.is_ancestor_or_self_of(candidate) {
            error!(
                "Blackboard {}: cannot set parent {}, would create circular reference",
                self.id(),
                candidate.id()
            );
            return Err(BlackboardError::ParentCycle);
        }

        *self.inner.parent.borrow_mut() = Some(Rc::downgrade(&candidate.inner));
        debug!("Blackboard {}: parent set to {}", self.id(), candidate.id());
        Ok(())
    }

    /// Detach from the parent. Never fails.
    pub fn clear_parent(&self) {
        self.inner.parent.borrow_mut().take();
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors::new(self.parent(), self.config().max_chain_depth)
    }

    /// This store followed by its ancestors.
    pub fn self_and_ancestors(&self) -> Ancestors {
        Ancestors::new(
            Some(self.clone()),
            self.config().max_chain_depth.saturating_add(1),
        )
    }

    // Unbounded: parent chains are acyclic.
    fn is_ancestor_or_self_of(&self, other: &Blackboard) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if node.ptr_eq(self) {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    /// Get a value of type `T`, consulting ancestors on a local miss.
    ///
    /// With [`Shadowing::PerType`] each level is checked for `T` only. With
    /// [`Shadowing::ByName`] the nearest level defining `key` decides.
    pub fn try_get<T: BlackboardType>(&self, key: &str) -> Option<T> {
        match self.config().shadowing {
            Shadowing::PerType => self
                .self_and_ancestors()
                .find_map(|node| node.try_get_local::<T>(key)),
            Shadowing::ByName => self
                .defining_node(key)
                .and_then(|node| node.try_get_local::<T>(key)),
        }
    }

    /// [`Blackboard::try_get`] with a fallback.
    pub fn get<T: BlackboardType>(&self, key: &str, default: T) -> T {
        self.try_get(key).unwrap_or(default)
    }

    /// Check whether `key` resolves to a value of type `T`.
    pub fn has_key<T: BlackboardType>(&self, key: &str) -> bool {
        match self.config().shadowing {
            Shadowing::PerType => self
                .self_and_ancestors()
                .any(|node| node.has_key_local::<T>(key)),
            Shadowing::ByName => self
                .defining_node(key)
                .map_or(false, |node| node.has_key_local::<T>(key)),
        }
    }

    /// Nearest value stored under `key`, of any type.
    pub fn resolve_value(&self, key: &str) -> Option<Value> {
        self.self_and_ancestors()
            .find_map(|node| node.value_local(key))
    }

    /// Check whether any ancestor defines `key`, with any type.
    pub fn is_key_in_ancestors(&self, key: &str) -> bool {
        self.ancestors().any(|node| node.contains_key_local(key))
    }

    /// Lazy sequence of local entries followed by inherited ones.
    ///
    /// A key name yielded from a closer store hides the same name further up,
    /// whatever the types.
    pub fn entries_with_inherited(&self) -> InheritedEntries {
        InheritedEntries {
            chain: self.self_and_ancestors(),
            current: None,
            seen: HashSet::new(),
        }
    }

    fn defining_node(&self, key: &str) -> Option<Blackboard> {
        self.self_and_ancestors()
            .find(|node| node.contains_key_local(key))
    }
}

/// Iterator over a parent chain.
#[derive(Clone)]
pub struct Ancestors {
    next: Option<Blackboard>,
    remaining: usize,
}

impl Ancestors {
    fn new(start: Option<Blackboard>, limit: usize) -> Self {
        Self {
            next: start,
            remaining: limit,
        }
    }
}

impl Iterator for Ancestors {
    type Item = Blackboard;

    fn next(&mut self) -> Option<Blackboard> {
        let current = self.next.take()?;
        if self.remaining == 0 {
            warn!(
                "Parent chain walk stopped at blackboard {}: depth limit reached",
                current.id()
            );
            return None;
        }
        self.remaining -= 1;
        self.next = current.parent();
        Some(current)
    }
}

/// Lazy sequence returned by [`Blackboard::entries_with_inherited`].
#[derive(Clone)]
pub struct InheritedEntries {
    chain: Ancestors,
    current: Option<Entries>,
    seen: HashSet<String>,
}

impl Iterator for InheritedEntries {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            if let Some(entries) = self.current.as_mut() {
                for entry in entries.by_ref() {
                    if self.seen.insert(entry.key().to_owned()) {
                        return Some(entry);
                    }
                }
            }
            self.current = Some(self.chain.next()?.entries());
        }
    }
}
