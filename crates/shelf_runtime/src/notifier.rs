//! Pinned-set change detection between the shelf and the shared pinned list.

use shelf_contract::AppIdentity;
use tracing::debug;

use crate::entry_store::EntryStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Remembers the pinned list last exchanged with the shared model and decides when a save or a
/// rebuild is needed.
pub struct ChangeNotifier {
    last_persisted: Vec<AppIdentity>,
}

impl ChangeNotifier {
    /// Creates a notifier that considers `apps` already persisted.
    pub fn new(apps: Vec<AppIdentity>) -> Self {
        Self {
            last_persisted: apps,
        }
    }

    /// Returns the last persisted pinned list.
    pub fn last_persisted(&self) -> &[AppIdentity] {
        &self.last_persisted
    }

    /// Records `apps` as persisted without comparing.
    pub fn mark_persisted(&mut self, apps: Vec<AppIdentity>) {
        self.last_persisted = apps;
    }

    /// Returns the pinned list to save when the store's pinned block differs from what was last
    /// persisted.
    pub fn on_pinned_set_changed(&mut self, store: &EntryStore) -> Option<Vec<AppIdentity>> {
        let current = store.pinned_subset();
        if current == self.last_persisted {
            return None;
        }
        debug!(pinned = current.len(), "pinned set changed locally");
        self.last_persisted = current.clone();
        Some(current)
    }

    /// Accepts a pinned list published by another shelf. Returns whether the store must be rebuilt
    /// from `new_set`.
    pub fn on_external_pinned_set_changed(
        &mut self,
        store: &EntryStore,
        new_set: &[AppIdentity],
    ) -> bool {
        self.last_persisted = new_set.to_vec();
        let rebuild = store.pinned_subset() != new_set;
        debug!(rebuild, "pinned set changed elsewhere");
        rebuild
    }
}
