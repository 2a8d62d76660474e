//! Lazy enumeration of a store's local entries.

use blackboard_types::Entry;

use super::Blackboard;

/// Lazy, restartable sequence of a store's local entries.
///
/// The key list is captured up front; each value is read when its key is
/// reached. A key removed before it is reached is skipped.
#[derive(Clone)]
pub struct Entries {
    store: Blackboard,
    keys: std::vec::IntoIter<String>,
}

impl Entries {
    pub(crate) fn new(store: Blackboard, keys: Vec<String>) -> Self {
        Self {
            store,
            keys: keys.into_iter(),
        }
    }
}

impl Iterator for Entries {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        for key in self.keys.by_ref() {
            if let Some(entry) = self.store.entry_for(&key) {
                return Some(entry);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.keys.len()))
    }
}
